//! Authorize redirect construction and state round-trip checks.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	http::SlackHttpClient,
	oauth::TransportErrorMapper,
	obs::{FlowKind, FlowSpan},
	strategy::SlackStrategy,
};

const STATE_LEN: usize = 32;

/// Authorize redirect metadata returned by [`SlackStrategy::start_authorization`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationRequest {
	/// Opaque state value that must round-trip via the redirect handler.
	pub state: String,
	/// Redirect URI supplied when constructing the authorize URL.
	pub redirect_uri: Url,
	/// Fully-formed authorize URL that callers should send end-users to.
	pub authorize_url: Url,
}
impl AuthorizationRequest {
	/// Validates the returned `state` parameter after the authorization redirect.
	pub fn validate_state(&self, returned_state: &str) -> Result<()> {
		if returned_state == self.state {
			Ok(())
		} else {
			Err(Error::InvalidGrant { reason: "Authorization state mismatch.".into() })
		}
	}
}

impl<C, M> SlackStrategy<C, M>
where
	C: ?Sized + SlackHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Builds the authorize redirect for `redirect_uri` with a fresh state value.
	pub fn start_authorization(&self, redirect_uri: Url) -> AuthorizationRequest {
		let _guard = FlowSpan::new(FlowKind::TokenExchange, "start_authorization").entered();
		let state = random_string(STATE_LEN);
		let authorize_url = self.build_authorize_url(&redirect_uri, &state);

		AuthorizationRequest { state, redirect_uri, authorize_url }
	}

	fn build_authorize_url(&self, redirect_uri: &Url, state: &str) -> Url {
		let mut url = self.descriptor.endpoints.authorization.clone();
		let mut pairs = url.query_pairs_mut();

		pairs.append_pair("client_id", &self.client_id);
		pairs.append_pair("redirect_uri", redirect_uri.as_str());
		pairs.append_pair("response_type", "code");

		for (name, value) in self.options.authorize_params() {
			pairs.append_pair(name, &value);
		}

		pairs.append_pair("state", state);

		drop(pairs);

		url
	}
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}
