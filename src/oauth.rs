//! `oauth.v2.access` exchange built on the `oauth2` crate, plus transport error mapping.
//!
//! Slack's token response is not a plain RFC 6749 body: it answers failures with HTTP 200
//! and `{"ok": false, "error": ...}`, uses `token_type: "bot"`, and a user-only install
//! carries its token under `authed_user` with no top-level `access_token`. The
//! [`SlackTokenResponse`] type reconciles those quirks before `oauth2` sees the body.

pub use oauth2;

// std
use std::borrow::Cow;
// crates.io
use oauth2::{
	AuthType, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, RedirectUrl, RefreshToken, RequestTokenError, Scope,
	StandardRevocableToken, TokenResponse, TokenUrl,
	basic::{
		BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
		BasicTokenType,
	},
};
use serde::Serializer;
// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	error::{ConfigError, TransientError},
	http::{ResponseMetadata, ResponseMetadataSlot, SlackHttpClient},
	provider::{
		ClientAuthMethod, ErrorClassifier, ProviderDescriptor, ProviderErrorContext,
		ProviderErrorKind, SlackMethod,
	},
};
#[cfg(feature = "reqwest")] use crate::error::TransportError;

type SlackOAuthClient<HasTokenUrl> = oauth2::Client<
	BasicErrorResponse,
	SlackTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	HasTokenUrl,
>;

/// Maps HTTP transport failures into crate [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted while calling `method` into a crate error.
	fn map_transport_error(
		&self,
		method: SlackMethod,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		method: SlackMethod,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(method, meta, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => map_generic_transport_error(method, meta, message),
			_ => map_unknown_transport_error(method, meta),
		}
	}
}

/// Failures detected while reconciling a raw `oauth.v2.access` body.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum TokenResponseError {
	/// Slack answered `ok: false`.
	#[error("Slack rejected the exchange: {error}")]
	Rejected {
		/// Slack error code.
		error: String,
	},
	/// Neither the body nor `authed_user` carries an access token.
	#[error("Token response carries no access_token")]
	MissingAccessToken,
}

/// Reconciled `oauth.v2.access` body understood by the `oauth2` crate.
///
/// The full (normalized) body is retained so the exchange can hand every member on to
/// [`AccessToken::from_params`].
#[derive(Clone, Deserialize)]
#[serde(try_from = "JsonObject")]
pub struct SlackTokenResponse {
	access_token: oauth2::AccessToken,
	token_type: BasicTokenType,
	expires_in: Option<u64>,
	refresh_token: Option<RefreshToken>,
	raw: JsonObject,
}
impl SlackTokenResponse {
	/// Consumes the response, returning the normalized body.
	pub fn into_params(self) -> JsonObject {
		self.raw
	}
}
impl TryFrom<JsonObject> for SlackTokenResponse {
	type Error = TokenResponseError;

	fn try_from(mut raw: JsonObject) -> Result<Self, Self::Error> {
		if raw.get("ok").and_then(Value::as_bool) == Some(false) {
			let error = raw.get("error").and_then(Value::as_str).unwrap_or("unknown_error");

			return Err(TokenResponseError::Rejected { error: error.to_owned() });
		}
		if !raw.get("access_token").is_some_and(Value::is_string) {
			let authed_user = raw
				.get("authed_user")
				.and_then(Value::as_object)
				.filter(|user| user.get("access_token").is_some_and(Value::is_string))
				.cloned()
				.ok_or(TokenResponseError::MissingAccessToken)?;

			for key in ["access_token", "token_type", "refresh_token", "expires_in"] {
				if let Some(value) = authed_user.get(key) {
					raw.entry(key).or_insert_with(|| value.clone());
				}
			}
		}

		let access_token = raw
			.get("access_token")
			.and_then(Value::as_str)
			.map(|token| oauth2::AccessToken::new(token.to_owned()))
			.ok_or(TokenResponseError::MissingAccessToken)?;
		let token_type = match raw.get("token_type").and_then(Value::as_str) {
			None => BasicTokenType::Bearer,
			Some(kind) if kind.eq_ignore_ascii_case("bearer") => BasicTokenType::Bearer,
			Some(kind) if kind.eq_ignore_ascii_case("mac") => BasicTokenType::Mac,
			Some(kind) => BasicTokenType::Extension(kind.to_owned()),
		};
		let expires_in = raw.get("expires_in").and_then(|value| match value {
			Value::Number(number) => number.as_u64(),
			Value::String(text) => text.trim().parse().ok(),
			_ => None,
		});
		let refresh_token = raw
			.get("refresh_token")
			.and_then(Value::as_str)
			.map(|token| RefreshToken::new(token.to_owned()));

		Ok(Self { access_token, token_type, expires_in, refresh_token, raw })
	}
}
impl Serialize for SlackTokenResponse {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		self.raw.serialize(serializer)
	}
}
impl Debug for SlackTokenResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SlackTokenResponse")
			.field("token_type", &self.token_type)
			.field("expires_in", &self.expires_in)
			.field("refresh_token_set", &self.refresh_token.is_some())
			.field("members", &self.raw.keys().collect::<Vec<_>>())
			.finish()
	}
}
impl TokenResponse for SlackTokenResponse {
	type TokenType = BasicTokenType;

	fn access_token(&self) -> &oauth2::AccessToken {
		&self.access_token
	}

	fn token_type(&self) -> &Self::TokenType {
		&self.token_type
	}

	fn expires_in(&self) -> Option<std::time::Duration> {
		self.expires_in.map(std::time::Duration::from_secs)
	}

	fn refresh_token(&self) -> Option<&RefreshToken> {
		self.refresh_token.as_ref()
	}

	fn scopes(&self) -> Option<&Vec<Scope>> {
		None
	}
}

/// Code-exchange facade configured from a [`ProviderDescriptor`].
pub(crate) struct ExchangeFacade<C, M>
where
	C: ?Sized + SlackHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: SlackOAuthClient<EndpointSet>,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> ExchangeFacade<C, M>
where
	C: ?Sized + SlackHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn from_descriptor(
		descriptor: &ProviderDescriptor,
		client_id: &str,
		client_secret: Option<&str>,
		http_client: Arc<C>,
		error_mapper: Arc<M>,
	) -> Result<Self> {
		let token_url = TokenUrl::new(descriptor.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let mut oauth_client =
			<SlackOAuthClient<EndpointNotSet>>::new(ClientId::new(client_id.to_owned()))
				.set_token_uri(token_url);

		if let Some(secret) = client_secret {
			oauth_client = oauth_client.set_client_secret(ClientSecret::new(secret.to_owned()));
		}
		if matches!(descriptor.preferred_client_auth_method, ClientAuthMethod::ClientSecretPost) {
			oauth_client = oauth_client.set_auth_type(AuthType::RequestBody);
		}

		Ok(Self { oauth_client, http_client, error_mapper })
	}

	/// Exchanges an authorization code, returning the reconciled access token.
	pub(crate) async fn exchange_code(
		&self,
		classifier: &dyn ErrorClassifier,
		code: &str,
		redirect_uri: &Url,
	) -> Result<AccessToken> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.with_metadata(meta.clone());
		let redirect_url = RedirectUrl::new(redirect_uri.to_string())
			.map_err(|source| ConfigError::InvalidRedirect { source })?;
		let response = self
			.oauth_client
			.exchange_code(AuthorizationCode::new(code.to_owned()))
			.set_redirect_uri(Cow::Owned(redirect_url))
			.request_async(&instrumented)
			.await
			.map_err(|err| {
				map_request_error(classifier, meta.take(), err, self.error_mapper.as_ref())
			})?;

		AccessToken::from_params(response.into_params(), OffsetDateTime::now_utc())
	}
}

fn map_request_error<E, M>(
	classifier: &dyn ErrorClassifier,
	meta: Option<ResponseMetadata>,
	err: RequestTokenError<HttpClientError<E>, BasicErrorResponse>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) =>
			map_server_response_error(classifier, response, meta_ref),
		RequestTokenError::Request(error) =>
			mapper.map_transport_error(SlackMethod::OAuthV2Access, meta_ref, error),
		RequestTokenError::Parse(error, body) => map_parse_error(classifier, error, &body, meta_ref),
		RequestTokenError::Other(message) => TransientError::TokenEndpoint {
			message,
			status: meta_status(meta_ref),
			retry_after: meta_retry_after(meta_ref),
		}
		.into(),
	}
}

fn map_server_response_error(
	classifier: &dyn ErrorClassifier,
	response: BasicErrorResponse,
	meta: Option<&ResponseMetadata>,
) -> Error {
	let mut ctx = ProviderErrorContext::new(SlackMethod::OAuthV2Access)
		.with_error(response.error().as_ref().to_string());

	if let Some(description) = response.error_description() {
		ctx = ctx.with_error_description(description.clone());
	}
	if let Some(status) = meta_status(meta) {
		ctx = ctx.with_http_status(status);
	}

	let message = match response.error_description() {
		Some(description) => format!("Token endpoint returned an OAuth error: {description}"),
		None => format!("Token endpoint returned an OAuth error: {}", response.error().as_ref()),
	};

	classified_error(classifier.classify(&ctx), message, meta)
}

fn map_parse_error(
	classifier: &dyn ErrorClassifier,
	error: serde_path_to_error::Error<serde_json::Error>,
	body: &[u8],
	meta: Option<&ResponseMetadata>,
) -> Error {
	let rejected = serde_json::from_slice::<JsonObject>(body).ok().and_then(|body| {
		if body.get("ok").and_then(Value::as_bool) == Some(false) {
			Some(body.get("error").and_then(Value::as_str).unwrap_or("unknown_error").to_owned())
		} else {
			None
		}
	});

	if let Some(code) = rejected {
		let mut ctx = ProviderErrorContext::new(SlackMethod::OAuthV2Access).with_error(code.clone());

		if let Some(status) = meta_status(meta) {
			ctx = ctx.with_http_status(status);
		}

		return classified_error(
			classifier.classify(&ctx),
			format!("Slack rejected the exchange with `{code}`"),
			meta,
		);
	}

	let mut ctx = ProviderErrorContext::new(SlackMethod::OAuthV2Access)
		.with_body_preview(String::from_utf8_lossy(body));

	if let Some(status) = meta_status(meta) {
		ctx = ctx.with_http_status(status);
	}

	match classifier.classify(&ctx) {
		ProviderErrorKind::Transient =>
			TransientError::TokenResponseParse { source: error, status: meta_status(meta) }.into(),
		kind => classified_error(
			kind,
			format!(
				"Token endpoint returned an unparsable body: {}",
				ctx.body_preview.as_deref().unwrap_or_default()
			),
			meta,
		),
	}
}

fn classified_error(kind: ProviderErrorKind, message: String, meta: Option<&ResponseMetadata>) -> Error {
	match kind {
		ProviderErrorKind::InvalidGrant => Error::InvalidGrant { reason: message },
		ProviderErrorKind::InvalidClient => Error::InvalidClient { reason: message },
		ProviderErrorKind::InsufficientScope => Error::InsufficientScope { reason: message },
		ProviderErrorKind::Transient => TransientError::TokenEndpoint {
			message,
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(method: SlackMethod, meta: Option<&ResponseMetadata>, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransientError::TokenEndpoint {
			message: format!("Request timed out while calling {method}"),
			status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
			retry_after: meta_retry_after(meta),
		}
		.into();
	}

	TransportError::from(err).into()
}

#[cfg(feature = "reqwest")]
fn map_generic_transport_error(
	method: SlackMethod,
	meta: Option<&ResponseMetadata>,
	message: impl Display,
) -> Error {
	TransientError::TokenEndpoint {
		message: format!("HTTP client error occurred while calling {method}: {message}"),
		status: meta_status(meta),
		retry_after: meta_retry_after(meta),
	}
	.into()
}

#[cfg(feature = "reqwest")]
fn map_unknown_transport_error(method: SlackMethod, meta: Option<&ResponseMetadata>) -> Error {
	TransientError::TokenEndpoint {
		message: format!("HTTP client error occurred while calling {method}"),
		status: meta_status(meta),
		retry_after: meta_retry_after(meta),
	}
	.into()
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn meta_retry_after(meta: Option<&ResponseMetadata>) -> Option<Duration> {
	meta.and_then(|value| value.retry_after)
}
