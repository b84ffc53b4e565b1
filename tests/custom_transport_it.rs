// std
use std::{
	collections::HashMap,
	error::Error as StdError,
	fmt::{Display, Formatter, Result as FmtResult},
	future::{self, Future},
	pin::Pin,
	sync::{Arc, Mutex},
};
// self
use slack_identity::{
	auth::AccessToken,
	error::{Error, TransientError, TransportError},
	http::{ResponseMetadata, ResponseMetadataSlot, SlackHttpClient},
	oauth::{
		TransportErrorMapper,
		oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse, http::StatusCode},
	},
	options::SlackOptions,
	provider::{ProviderDescriptor, SlackMethod},
	strategy::{AuthorizationRequest, SlackStrategy},
	url::Url,
};

#[derive(Debug)]
enum FakeTransportError {
	Unreachable,
}
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Unreachable => write!(f, "Slack is unreachable."),
		}
	}
}
impl StdError for FakeTransportError {}

/// Serves canned bodies per path; unknown paths fail at the transport level.
#[derive(Clone, Default)]
struct FakeHttpClient {
	routes: Arc<HashMap<&'static str, (u16, &'static str)>>,
	seen: Arc<Mutex<Vec<String>>>,
}
impl FakeHttpClient {
	fn new(routes: impl IntoIterator<Item = (&'static str, (u16, &'static str))>) -> Self {
		Self { routes: Arc::new(routes.into_iter().collect()), seen: Default::default() }
	}

	fn seen(&self) -> Vec<String> {
		self.seen.lock().expect("Fake transport lock should not be poisoned.").clone()
	}
}
impl SlackHttpClient for FakeHttpClient {
	type Handle = FakeHttpHandle;
	type TransportError = FakeTransportError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		FakeHttpHandle { client: self.clone(), slot }
	}
}

struct FakeHttpHandle {
	client: FakeHttpClient,
	slot: ResponseMetadataSlot,
}
impl<'a> AsyncHttpClient<'a> for FakeHttpHandle {
	type Error = HttpClientError<FakeTransportError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'a + Send + Sync>>;

	fn call(&'a self, request: HttpRequest) -> Self::Future {
		assert!(
			self.slot.take().is_none(),
			"ResponseMetadataSlot must be clear before dispatching a request."
		);

		let path = request.uri().path().to_owned();

		self.client.seen.lock().expect("Fake transport lock should not be poisoned.").push(path.clone());

		let outcome = match self.client.routes.get(path.as_str()) {
			Some((status, body)) => {
				let mut response = HttpResponse::new(body.as_bytes().to_vec());

				*response.status_mut() =
					StatusCode::from_u16(*status).expect("Canned status should be valid.");
				response.headers_mut().insert(
					"content-type",
					"application/json".parse().expect("Header value should parse."),
				);
				self.slot.store(ResponseMetadata { status: Some(*status), retry_after: None });

				Ok(response)
			},
			None => Err(HttpClientError::Reqwest(Box::new(FakeTransportError::Unreachable))),
		};

		Box::pin(future::ready(outcome))
	}
}

#[derive(Clone, Default)]
struct RecordingTransportErrorMapper {
	methods: Arc<Mutex<Vec<SlackMethod>>>,
}
impl TransportErrorMapper<FakeTransportError> for RecordingTransportErrorMapper {
	fn map_transport_error(
		&self,
		method: SlackMethod,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<FakeTransportError>,
	) -> Error {
		self.methods.lock().expect("Mapper lock should not be poisoned.").push(method);

		match err {
			HttpClientError::Reqwest(inner) => TransportError::network(*inner).into(),
			other => TransientError::TokenEndpoint {
				message: format!("Unhandled fake transport error while calling {method}: {other}"),
				status: meta.and_then(|value| value.status),
				retry_after: None,
			}
			.into(),
		}
	}
}

fn build_strategy(
	client: FakeHttpClient,
	mapper: RecordingTransportErrorMapper,
	options: SlackOptions,
) -> SlackStrategy<FakeHttpClient, RecordingTransportErrorMapper> {
	SlackStrategy::with_http_client(
		ProviderDescriptor::slack().expect("Production descriptor should validate."),
		options,
		"fake-client",
		client,
		mapper,
	)
	.with_client_secret("fake-secret")
}

fn request() -> AuthorizationRequest {
	AuthorizationRequest {
		state: "fake-state".into(),
		redirect_uri: Url::parse("https://app.example.com/auth/slack/callback")
			.expect("Redirect URI should parse successfully."),
		authorize_url: Url::parse("https://slack.com/oauth/v2/authorize")
			.expect("Authorize URL should parse successfully."),
	}
}

#[tokio::test]
async fn user_only_install_promotes_authed_user_token() {
	let client = FakeHttpClient::new([
		(
			"/api/oauth.v2.access",
			(
				200,
				"{\"ok\":true,\"authed_user\":{\"id\":\"U7\",\"scope\":\"identity.basic\",\"access_token\":\"xoxp-7\",\"token_type\":\"user\",\"refresh_token\":\"xoxe-1-7\",\"expires_in\":43200},\"team\":{\"id\":\"T7\"}}",
			),
		),
		(
			"/api/users.identity",
			(200, "{\"ok\":true,\"user\":{\"id\":\"U7\",\"name\":\"Grace\"},\"team\":{\"id\":\"T7\",\"name\":\"Navy\"}}"),
		),
	]);
	let strategy = build_strategy(
		client.clone(),
		RecordingTransportErrorMapper::default(),
		SlackOptions::default().with_user_scope("identity.basic"),
	);
	let hash = strategy
		.callback(&request(), "fake-state", "fake-code")
		.await
		.expect("User-only install should authenticate.");

	assert_eq!(client.seen(), ["/api/oauth.v2.access", "/api/users.identity"]);
	assert_eq!(hash.uid, "U7");
	assert_eq!(hash.credentials.token, "xoxp-7");
	assert!(hash.credentials.expires);
	assert!(hash.credentials.expires_at.is_some());
	assert_eq!(hash.credentials.refresh_token.as_deref(), Some("xoxe-1-7"));
}

#[tokio::test]
async fn transport_failures_pass_through_the_mapper() {
	let client = FakeHttpClient::new([(
		"/api/auth.test",
		(200, "{\"ok\":true,\"user_id\":\"U1\",\"team_id\":\"T1\"}"),
	)]);
	let mapper = RecordingTransportErrorMapper::default();
	let strategy = build_strategy(client, mapper.clone(), SlackOptions::default());
	let err = strategy
		.authenticate(&AccessToken::new("xoxb-1"))
		.await
		.expect_err("Unreachable users.info should abort.");

	assert!(matches!(err, Error::Transport(TransportError::Network { .. })), "Unexpected error: {err:?}.");
	assert_eq!(
		*mapper.methods.lock().expect("Mapper lock should not be poisoned."),
		[SlackMethod::UsersInfo]
	);
}

#[tokio::test]
async fn degraded_profile_surfaces_missing_uid() {
	let client = FakeHttpClient::new([("/api/auth.test", (200, "<html>maintenance</html>"))]);
	let strategy = build_strategy(
		client.clone(),
		RecordingTransportErrorMapper::default(),
		SlackOptions::default(),
	);
	let err = strategy
		.authenticate(&AccessToken::new("xoxb-1"))
		.await
		.expect_err("An unusable profile should not yield an identity.");

	assert!(matches!(err, Error::MissingField { path: "user_id" }));
	assert_eq!(client.seen(), ["/api/auth.test"]);
}
