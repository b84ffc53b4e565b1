//! Provider descriptor data structures shared by the exchange and the API client.
//!
//! The module exposes validated endpoint metadata plus the builder used to assemble it, so
//! tests can point the whole integration at a local mock server without touching flows.

/// Builder API for assembling provider descriptors.
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, error::ConfigError, provider::SlackMethod};

/// Preferred client authentication modes for token endpoint calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	#[default]
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
}

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Authorization endpoint end-users are redirected to.
	pub authorization: Url,
	/// Token endpoint used for the code exchange.
	pub token: Url,
}

/// Immutable provider descriptor consumed by the strategy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Site every Web API path is resolved against.
	pub site: Url,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Preferred client authentication mechanism.
	pub preferred_client_auth_method: ClientAuthMethod,
}
impl ProviderDescriptor {
	/// Production Slack site.
	pub const DEFAULT_SITE: &'static str = "https://slack.com";
	/// Authorization path relative to the site.
	pub const DEFAULT_AUTHORIZE_PATH: &'static str = "/oauth/v2/authorize";

	/// Creates a new builder seeded with Slack's production endpoints.
	pub fn builder() -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new()
	}

	/// Builds the production Slack descriptor.
	pub fn slack() -> Result<Self, ProviderDescriptorError> {
		Self::builder().build()
	}

	/// Resolves the URL of a Slack Web API method against the site.
	pub fn method_url(&self, method: SlackMethod) -> Result<Url> {
		self.site
			.join(method.path())
			.map_err(|source| ConfigError::InvalidDescriptor { source }.into())
	}
}
