//! Sign-in façade tying the authorize redirect, the code exchange, and normalization together.

pub mod authorize;

mod callback;

pub use authorize::*;

// self
use crate::{
	_prelude::*,
	adapter::ResponseShape,
	api::SlackApi,
	error::ConfigError,
	http::SlackHttpClient,
	oauth::TransportErrorMapper,
	options::SlackOptions,
	provider::{DefaultErrorClassifier, ErrorClassifier, ProviderDescriptor},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Strategy specialized for the crate's default reqwest transport stack.
pub type ReqwestSlackStrategy = SlackStrategy<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Slack sign-in strategy.
///
/// The strategy is immutable once built and may serve any number of concurrent callbacks;
/// all memoization lives on the per-request adapter and normalizer it creates.
pub struct SlackStrategy<C, M>
where
	C: ?Sized + SlackHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Provider descriptor that defines the Slack endpoints.
	pub descriptor: ProviderDescriptor,
	/// Strategy options.
	pub options: SlackOptions,
	/// OAuth client identifier.
	pub client_id: String,
	/// Optional client secret.
	pub client_secret: Option<String>,
	/// HTTP client wrapper used for every outbound Slack request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Classifier applied to rejected exchanges.
	pub classifier: Arc<dyn ErrorClassifier>,
	api: SlackApi<C, M>,
}
impl<C, M> SlackStrategy<C, M>
where
	C: ?Sized + SlackHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a strategy that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		descriptor: ProviderDescriptor,
		options: SlackOptions,
		client_id: impl Into<String>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		let http_client = http_client.into();
		let transport_mapper = mapper.into();
		let api = SlackApi::new(descriptor.clone(), http_client.clone(), transport_mapper.clone());

		Self {
			descriptor,
			options,
			client_id: client_id.into(),
			client_secret: None,
			http_client,
			transport_mapper,
			classifier: Arc::new(DefaultErrorClassifier),
			api,
		}
	}

	/// Sets or replaces the client secret.
	pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(secret.into());

		self
	}

	/// Replaces the classifier applied to rejected exchanges.
	pub fn with_classifier(mut self, classifier: Arc<dyn ErrorClassifier>) -> Self {
		self.classifier = classifier;

		self
	}

	/// Web API client bound to this strategy's descriptor and transport.
	pub fn api(&self) -> &SlackApi<C, M> {
		&self.api
	}

	/// True when callbacks resolve the identity through `users.identity`.
	pub fn identity_scoped(&self) -> bool {
		matches!(ResponseShape::classify(&self.options), ResponseShape::IdentityScoped)
	}

	/// Callback path: the configured override or `{path_prefix}/slack/callback`.
	pub fn callback_path(&self) -> String {
		self.options.callback_path()
	}

	/// Callback URL on the origin of `request_url`.
	pub fn callback_url(&self, request_url: &Url) -> Result<Url> {
		let path = self.callback_path();

		request_url
			.join(&path)
			.map_err(|source| ConfigError::InvalidCallbackPath { path, source }.into())
	}
}
#[cfg(feature = "reqwest")]
impl SlackStrategy<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a strategy backed by a default reqwest client.
	pub fn new(
		descriptor: ProviderDescriptor,
		options: SlackOptions,
		client_id: impl Into<String>,
	) -> Self {
		Self::with_http_client(
			descriptor,
			options,
			client_id,
			ReqwestHttpClient::default(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}
}
impl<C, M> Debug for SlackStrategy<C, M>
where
	C: ?Sized + SlackHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SlackStrategy")
			.field("descriptor", &self.descriptor)
			.field("options", &self.options)
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::*, options::AuthorizeOption};

	fn strategy(options: SlackOptions) -> SlackStrategy<RecordingHttpClient, RecordingErrorMapper> {
		SlackStrategy::with_http_client(
			test_descriptor(),
			options,
			"client-1",
			RecordingHttpClient::default(),
			RecordingErrorMapper,
		)
	}

	#[test]
	fn identity_scoped_requires_forwarded_user_scope() {
		let identity = SlackOptions::default().with_user_scope("identity.email, identity.basic");

		assert!(strategy(identity.clone()).identity_scoped());
		assert!(
			!strategy(identity.with_authorize_options([AuthorizeOption::Scope, AuthorizeOption::Team]))
				.identity_scoped()
		);
		assert!(!strategy(SlackOptions::default().with_user_scope("identity.basics")).identity_scoped());
	}

	#[test]
	fn callback_url_uses_request_origin() {
		let request = Url::parse("https://example.com:8443/some/page?x=1#frag")
			.expect("Request URL fixture should parse.");

		assert_eq!(
			strategy(SlackOptions::default())
				.callback_url(&request)
				.expect("Default callback URL should resolve.")
				.as_str(),
			"https://example.com:8443/auth/slack/callback"
		);
		assert_eq!(
			strategy(SlackOptions::default().with_callback_path("/interface/callback"))
				.callback_url(&request)
				.expect("Custom callback URL should resolve.")
				.as_str(),
			"https://example.com:8443/interface/callback"
		);
	}

	#[test]
	fn debug_hides_client_secret() {
		let rendered = format!("{:?}", strategy(SlackOptions::default()).with_client_secret("s3cr3t"));

		assert!(!rendered.contains("s3cr3t"));
		assert!(rendered.contains("client_secret_set: true"));
	}
}
