// self
use crate::{
	_prelude::*,
	provider::{ClientAuthMethod, ProviderDescriptor, ProviderEndpoints, SlackMethod},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ProviderDescriptorError {
	/// A site or endpoint could not be parsed.
	#[error("The {endpoint} endpoint is not a valid URL.")]
	InvalidUrl {
		/// Which endpoint failed to parse.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoints must use HTTPS (loopback hosts excepted).
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
}

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug)]
pub struct ProviderDescriptorBuilder {
	/// Site override; defaults to [`ProviderDescriptor::DEFAULT_SITE`].
	pub site: Option<Url>,
	/// Authorization path resolved against the site.
	pub authorize_path: String,
	/// Token path resolved against the site.
	pub token_path: String,
	/// Preferred client authentication method for the token endpoint.
	pub preferred_client_auth_method: ClientAuthMethod,
}
impl ProviderDescriptorBuilder {
	/// Creates a new builder seeded with Slack's production paths.
	pub fn new() -> Self {
		Self {
			site: None,
			authorize_path: ProviderDescriptor::DEFAULT_AUTHORIZE_PATH.into(),
			token_path: SlackMethod::OAuthV2Access.path().into(),
			preferred_client_auth_method: ClientAuthMethod::default(),
		}
	}

	/// Overrides the site (e.g., a mock server or an Enterprise Grid host).
	pub fn site(mut self, url: Url) -> Self {
		self.site = Some(url);

		self
	}

	/// Overrides the authorization path.
	pub fn authorize_path(mut self, path: impl Into<String>) -> Self {
		self.authorize_path = path.into();

		self
	}

	/// Overrides the token path.
	pub fn token_path(mut self, path: impl Into<String>) -> Self {
		self.token_path = path.into();

		self
	}

	/// Overrides the preferred client authentication method.
	pub fn preferred_client_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.preferred_client_auth_method = method;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let site = match self.site {
			Some(site) => site,
			None => Url::parse(ProviderDescriptor::DEFAULT_SITE)
				.map_err(|source| ProviderDescriptorError::InvalidUrl { endpoint: "site", source })?,
		};
		let authorization = site.join(&self.authorize_path).map_err(|source| {
			ProviderDescriptorError::InvalidUrl { endpoint: "authorization", source }
		})?;
		let token = site
			.join(&self.token_path)
			.map_err(|source| ProviderDescriptorError::InvalidUrl { endpoint: "token", source })?;
		let descriptor = ProviderDescriptor {
			site,
			endpoints: ProviderEndpoints { authorization, token },
			preferred_client_auth_method: self.preferred_client_auth_method,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}
impl Default for ProviderDescriptorBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ProviderDescriptor {
	/// Validates invariants for the descriptor.
	fn validate(&self) -> Result<(), ProviderDescriptorError> {
		validate_endpoint("site", &self.site)?;
		validate_endpoint("authorization", &self.endpoints.authorization)?;
		validate_endpoint("token", &self.endpoints.token)?;

		Ok(())
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	let loopback = match url.host() {
		Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(url::Host::Ipv4(addr)) => addr.is_loopback(),
		Some(url::Host::Ipv6(addr)) => addr.is_loopback(),
		None => false,
	};

	if url.scheme() == "https" || (loopback && url.scheme() == "http") {
		Ok(())
	} else {
		Err(ProviderDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	}
}
