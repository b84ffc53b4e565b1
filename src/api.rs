//! Authenticated Slack Web API GETs used to resolve and enrich the identity.
//!
//! Every call is a single request with no retries. A non-success HTTP status aborts the
//! callback, while a body that is not a JSON object, or that answers `"ok": false`, degrades
//! to an empty object so optional enrichment never blocks sign-in.

// crates.io
use oauth2::{
	AsyncHttpClient,
	http::{Method, Request, header},
};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, TransportError},
	http::{ResponseMetadataSlot, SlackHttpClient},
	oauth::TransportErrorMapper,
	obs,
	provider::{ProviderDescriptor, SlackMethod},
};

/// Slack Web API client bound to one descriptor, transport, and error mapper.
pub struct SlackApi<C, M>
where
	C: ?Sized + SlackHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	descriptor: ProviderDescriptor,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> SlackApi<C, M>
where
	C: ?Sized + SlackHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client that resolves method paths against `descriptor.site`.
	pub fn new(descriptor: ProviderDescriptor, http_client: Arc<C>, error_mapper: Arc<M>) -> Self {
		Self { descriptor, http_client, error_mapper }
	}

	/// Descriptor the client resolves methods against.
	pub fn descriptor(&self) -> &ProviderDescriptor {
		&self.descriptor
	}

	/// Issues `GET /api/{method}` with `Authorization: Bearer {token}`.
	///
	/// `query` pairs are encoded with `application/x-www-form-urlencoded` rules.
	pub async fn get(
		&self,
		method: SlackMethod,
		token: &TokenSecret,
		query: &[(&str, &str)],
	) -> Result<JsonObject> {
		let mut url = self.descriptor.method_url(method)?;

		if !query.is_empty() {
			url.query_pairs_mut().extend_pairs(query);
		}

		let request = Request::builder()
			.method(Method::GET)
			.uri(url.as_str())
			.header(header::AUTHORIZATION, token.bearer())
			.header(header::ACCEPT, "application/json")
			.body(Vec::new())
			.map_err(ConfigError::from)?;
		let meta = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(meta.clone());
		let response = handle.call(request).await.map_err(|err| {
			self.error_mapper.map_transport_error(method, meta.take().as_ref(), err)
		})?;
		let status = response.status();

		if !status.is_success() {
			let retry_after = meta.take().and_then(|value| value.retry_after);

			return Err(TransportError::Status { method, status: status.as_u16(), retry_after }.into());
		}

		Ok(decode_body(method, response.body()))
	}
}
impl<C, M> Debug for SlackApi<C, M>
where
	C: ?Sized + SlackHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SlackApi").field("site", &self.descriptor.site.as_str()).finish()
	}
}

/// Decodes a Web API body, degrading unusable answers to an empty object.
pub(crate) fn decode_body(method: SlackMethod, body: &[u8]) -> JsonObject {
	let object = match serde_json::from_slice::<Value>(body) {
		Ok(Value::Object(object)) => object,
		Ok(_) => {
			obs::record_degraded_response(method, "body is not a JSON object");

			return JsonObject::new();
		},
		Err(_) => {
			obs::record_degraded_response(method, "body is not valid JSON");

			return JsonObject::new();
		},
	};

	if object.get("ok").and_then(Value::as_bool) == Some(false) {
		let reason = object.get("error").and_then(Value::as_str).unwrap_or("ok=false");

		obs::record_degraded_response(method, reason);

		return JsonObject::new();
	}

	object
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::*;

	fn api(client: &Arc<RecordingHttpClient>) -> SlackApi<RecordingHttpClient, RecordingErrorMapper> {
		SlackApi::new(test_descriptor(), client.clone(), Arc::new(RecordingErrorMapper))
	}

	#[test]
	fn decode_body_degrades_unusable_answers() {
		assert!(decode_body(SlackMethod::AuthTest, b"not json").is_empty());
		assert!(decode_body(SlackMethod::AuthTest, b"[1,2]").is_empty());
		assert!(decode_body(SlackMethod::AuthTest, br#"{"ok":false,"error":"invalid_auth"}"#).is_empty());
		assert_eq!(
			decode_body(SlackMethod::AuthTest, br#"{"ok":true,"user_id":"U1"}"#)
				.get("user_id")
				.and_then(Value::as_str),
			Some("U1")
		);
	}

	#[tokio::test]
	async fn get_sends_bearer_and_escapes_query() {
		let client = Arc::new(RecordingHttpClient::default().with_json(
			"/api/users.info",
			r#"{"ok":true,"user":{"id":"U123"}}"#,
		));
		let body = api(&client)
			.get(SlackMethod::UsersInfo, &TokenSecret::new("xoxb-1"), &[("user", "../haxx?U123#abc")])
			.await
			.expect("Recorded call should succeed.");
		let calls = client.calls();

		assert_eq!(calls.len(), 1);
		assert_eq!(calls[0].method, "GET");
		assert_eq!(calls[0].path_and_query, "/api/users.info?user=..%2Fhaxx%3FU123%23abc");
		assert_eq!(calls[0].authorization.as_deref(), Some("Bearer xoxb-1"));
		assert!(body.contains_key("user"));
	}

	#[tokio::test]
	async fn non_success_status_aborts() {
		let client = Arc::new(
			RecordingHttpClient::default().with_response("/api/auth.test", 503, "unavailable"),
		);
		let err = api(&client)
			.get(SlackMethod::AuthTest, &TokenSecret::new("xoxb-1"), &[])
			.await
			.expect_err("HTTP 503 should abort.");

		assert!(matches!(
			err,
			Error::Transport(TransportError::Status { method: SlackMethod::AuthTest, status: 503, .. })
		));
	}

	#[tokio::test]
	async fn unknown_paths_answer_not_found() {
		let client = Arc::new(RecordingHttpClient::default());
		let err = api(&client)
			.get(SlackMethod::UsersIdentity, &TokenSecret::new("xoxp-1"), &[])
			.await
			.expect_err("Unrouted call should fail.");

		assert!(matches!(err, Error::Transport(TransportError::Status { status: 404, .. })));
		assert_eq!(client.calls_to("/api/users.identity"), 1);
	}
}
