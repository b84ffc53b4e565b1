//! Callback handling: code exchange, profile fetch, and normalization.
//!
//! A callback runs strictly in sequence. The exchange happens first, then the response shape
//! is classified, the raw profile is fetched, `users.info` enrichment runs unless skipped or
//! identity-scoped, and the normalized [`AuthHash`] is returned. Nothing is retried.

// self
use crate::{
	_prelude::*,
	adapter::{ResponseAdapter, ResponseShape},
	auth::AccessToken,
	http::SlackHttpClient,
	identity::{AuthHash, IdentityNormalizer},
	oauth::{ExchangeFacade, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	strategy::{AuthorizationRequest, SlackStrategy},
};

impl<C, M> SlackStrategy<C, M>
where
	C: ?Sized + SlackHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Exchanges the authorization `code` through `oauth.v2.access`.
	pub async fn exchange_code(&self, request: &AuthorizationRequest, code: &str) -> Result<AccessToken> {
		const KIND: FlowKind = FlowKind::TokenExchange;

		let span = FlowSpan::new(KIND, "exchange_code");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let facade: ExchangeFacade<C, M> = ExchangeFacade::from_descriptor(
					&self.descriptor,
					&self.client_id,
					self.client_secret.as_deref(),
					self.http_client.clone(),
					self.transport_mapper.clone(),
				)?;

				facade.exchange_code(self.classifier.as_ref(), code, &request.redirect_uri).await
			})
			.await;

		record(KIND, &result);

		result
	}

	/// Resolves and normalizes the identity behind an exchanged token.
	pub async fn authenticate(&self, access_token: &AccessToken) -> Result<AuthHash> {
		let shape = ResponseShape::classify(&self.options);
		let kind = shape.flow_kind();
		let span = FlowSpan::new(kind, "authenticate");

		obs::record_flow_outcome(kind, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let adapter = ResponseAdapter::new(self.api(), shape, access_token);

				IdentityNormalizer::new(adapter, &self.options).auth_hash().await
			})
			.await;

		record(kind, &result);

		result
	}

	/// Full callback: validates `returned_state`, exchanges `code`, and authenticates.
	pub async fn callback(
		&self,
		request: &AuthorizationRequest,
		returned_state: &str,
		code: &str,
	) -> Result<AuthHash> {
		request.validate_state(returned_state)?;

		let access_token = self.exchange_code(request, code).await?;

		self.authenticate(&access_token).await
	}
}

fn record<T>(kind: FlowKind, result: &Result<T>) {
	match result {
		Ok(_) => obs::record_flow_outcome(kind, FlowOutcome::Success),
		Err(_) => obs::record_flow_outcome(kind, FlowOutcome::Failure),
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::{_preludet::*, error::TransportError, options::SlackOptions};

	const TOKEN_BODY: &str = r#"{"ok":true,"access_token":"xoxb-1","token_type":"bot","scope":"commands","team":{"id":"T1","name":"Acme"},"bot":{"bot_user_id":"UB1"},"authed_user":{"id":"U1","access_token":"xoxp-1","token_type":"user"}}"#;

	fn strategy(
		client: &Arc<RecordingHttpClient>,
		options: SlackOptions,
	) -> SlackStrategy<RecordingHttpClient, RecordingErrorMapper> {
		SlackStrategy::with_http_client(
			test_descriptor(),
			options,
			"client-1",
			client.clone(),
			RecordingErrorMapper,
		)
		.with_client_secret("secret-1")
	}

	fn request() -> AuthorizationRequest {
		AuthorizationRequest {
			state: "state-1".into(),
			redirect_uri: Url::parse("https://app.example.com/auth/slack/callback")
				.expect("Redirect fixture should parse."),
			authorize_url: Url::parse("https://slack.com/oauth/v2/authorize")
				.expect("Authorize fixture should parse."),
		}
	}

	#[tokio::test]
	async fn callback_runs_standard_flow_in_order() {
		let client = Arc::new(
			RecordingHttpClient::default()
				.with_json("/api/oauth.v2.access", TOKEN_BODY)
				.with_json("/api/auth.test", r#"{"ok":true,"user":"ada","team":"Acme","user_id":"U1","team_id":"T1"}"#)
				.with_json("/api/users.info", r#"{"ok":true,"user":{"id":"U1","profile":{"email":"ada@acme.test"}}}"#),
		);
		let hash = strategy(&client, SlackOptions::default())
			.callback(&request(), "state-1", "code-1")
			.await
			.expect("Callback should succeed.");
		let paths = client.calls().iter().map(|call| call.path().to_owned()).collect::<Vec<_>>();

		assert_eq!(paths, ["/api/oauth.v2.access", "/api/auth.test", "/api/users.info"]);
		assert_eq!(hash.uid, "U1");
		assert_eq!(hash.credentials.token, "xoxb-1");
		assert!(!hash.credentials.expires);
		assert_eq!(
			hash.info.extended.as_ref().and_then(|extended| extended.email.as_deref()),
			Some("ada@acme.test")
		);
		assert_eq!(
			hash.extra.bot_info.as_ref().and_then(|bot| bot.get("bot_user_id")),
			Some(&json!("UB1"))
		);

		let exchange = &client.calls()[0];

		assert_eq!(exchange.method, "POST");
		assert!(exchange.body.contains("code=code-1"));
		assert!(exchange.body.contains("grant_type=authorization_code"));
		assert!(exchange.authorization.as_deref().is_some_and(|value| value.starts_with("Basic ")));
	}

	#[tokio::test]
	async fn callback_runs_identity_flow_with_authed_user_token() {
		let client = Arc::new(
			RecordingHttpClient::default().with_json("/api/oauth.v2.access", TOKEN_BODY).with_json(
				"/api/users.identity",
				r#"{"ok":true,"user":{"id":"U1","name":"Ada"},"team":{"id":"T1","name":"Acme"}}"#,
			),
		);
		let hash = strategy(&client, SlackOptions::default().with_user_scope("identity.basic"))
			.callback(&request(), "state-1", "code-1")
			.await
			.expect("Identity callback should succeed.");
		let calls = client.calls();

		assert_eq!(calls.len(), 2);
		assert_eq!(calls[1].path(), "/api/users.identity");
		assert_eq!(calls[1].authorization.as_deref(), Some("Bearer xoxp-1"));
		assert_eq!(hash.uid, "U1");
		assert_eq!(hash.info.team.as_deref(), Some("Acme"));
	}

	#[tokio::test]
	async fn state_mismatch_stops_before_exchange() {
		let client = Arc::new(RecordingHttpClient::default());
		let err = strategy(&client, SlackOptions::default())
			.callback(&request(), "forged", "code-1")
			.await
			.expect_err("Forged state should fail.");

		assert!(matches!(err, Error::InvalidGrant { .. }));
		assert!(client.calls().is_empty());
	}

	#[tokio::test]
	async fn rejected_exchange_is_classified() {
		let client = Arc::new(
			RecordingHttpClient::default()
				.with_json("/api/oauth.v2.access", r#"{"ok":false,"error":"invalid_code"}"#),
		);
		let err = strategy(&client, SlackOptions::default())
			.exchange_code(&request(), "stale")
			.await
			.expect_err("invalid_code should fail.");

		assert!(matches!(err, Error::InvalidGrant { .. }));
	}

	#[tokio::test]
	async fn profile_status_error_aborts_authentication() {
		let client = Arc::new(
			RecordingHttpClient::default().with_response("/api/auth.test", 429, "slow down"),
		);
		let err = strategy(&client, SlackOptions::default())
			.authenticate(&AccessToken::new("xoxb-1"))
			.await
			.expect_err("HTTP 429 should abort.");

		assert!(matches!(err, Error::Transport(TransportError::Status { status: 429, .. })));
		assert_eq!(client.calls_to("/api/users.info"), 0);
	}
}
