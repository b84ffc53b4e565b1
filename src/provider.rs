//! Provider-facing descriptors (data), Slack method catalog, and error classification (behavior).
//!
//! `descriptor` exposes validated endpoint metadata (`ProviderDescriptor`) covering the
//! Slack site, the authorize/token endpoints, and the client authentication preference.
//! `method` names every Slack Web API call this crate issues so paths stay byte-exact.
//! `classifier` defines [`ErrorClassifier`], an HTTP-client-agnostic hook used by the token
//! exchange to map Slack `error` codes into the crate error taxonomy.

pub mod classifier;
pub mod descriptor;
pub mod method;

pub use classifier::*;
pub use descriptor::*;
pub use method::*;
