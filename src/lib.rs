//! Slack sign-in for Rust: exchange OAuth codes, reconcile identity-scoped and workspace-install
//! token shapes, and hand back one normalized identity record.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod adapter;
pub mod api;
pub mod auth;
pub mod error;
pub mod http;
pub mod identity;
pub mod oauth;
pub mod obs;
pub mod options;
pub mod provider;
pub mod strategy;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and a recording transport for tests; enabled via `cfg(test)` or
	//! the `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::{collections::HashMap, pin::Pin};
	// crates.io
	use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse, http::StatusCode};
	// self
	use crate::{
		http::{ResponseMetadata, ResponseMetadataSlot, SlackHttpClient},
		oauth::TransportErrorMapper,
		provider::{ProviderDescriptor, SlackMethod},
	};

	/// One request observed by [`RecordingHttpClient`].
	#[derive(Clone, Debug, PartialEq, Eq)]
	pub struct RecordedCall {
		/// HTTP method.
		pub method: String,
		/// Request path plus query string.
		pub path_and_query: String,
		/// `Authorization` header, if any.
		pub authorization: Option<String>,
		/// Request body decoded as UTF-8.
		pub body: String,
	}
	impl RecordedCall {
		/// Path without the query string.
		pub fn path(&self) -> &str {
			self.path_and_query.split_once('?').map_or(self.path_and_query.as_str(), |(path, _)| path)
		}
	}

	/// Failure raised by the recording transport when a request cannot be inspected.
	#[derive(Debug, ThisError)]
	#[error("Recording transport failed: {0}.")]
	pub struct RecordingError(pub String);

	/// In-memory transport serving canned bodies per path and recording every request.
	///
	/// Unrouted paths answer HTTP 404 with an empty body.
	#[derive(Clone, Debug, Default)]
	pub struct RecordingHttpClient {
		routes: Arc<Mutex<HashMap<String, (u16, Vec<u8>)>>>,
		calls: Arc<Mutex<Vec<RecordedCall>>>,
	}
	impl RecordingHttpClient {
		/// Serves `body` with HTTP 200 for `path`.
		pub fn with_json(self, path: &str, body: &str) -> Self {
			self.with_response(path, 200, body)
		}

		/// Serves `body` with `status` for `path`.
		pub fn with_response(self, path: &str, status: u16, body: &str) -> Self {
			self.routes.lock().insert(path.to_owned(), (status, body.as_bytes().to_vec()));

			self
		}

		/// Every request observed so far, in order.
		pub fn calls(&self) -> Vec<RecordedCall> {
			self.calls.lock().clone()
		}

		/// Number of requests whose path equals `path`.
		pub fn calls_to(&self, path: &str) -> usize {
			self.calls.lock().iter().filter(|call| call.path() == path).count()
		}

		fn respond(&self, request: &HttpRequest) -> Result<HttpResponse, RecordingError> {
			let path_and_query = request
				.uri()
				.path_and_query()
				.map(|value| value.as_str().to_owned())
				.unwrap_or_default();
			let authorization = request
				.headers()
				.get(oauth2::http::header::AUTHORIZATION)
				.and_then(|value| value.to_str().ok())
				.map(str::to_owned);
			let call = RecordedCall {
				method: request.method().as_str().to_owned(),
				path_and_query,
				authorization,
				body: String::from_utf8_lossy(request.body()).into_owned(),
			};
			let (status, body) =
				self.routes.lock().get(call.path()).cloned().unwrap_or((404, Vec::new()));

			self.calls.lock().push(call);

			let mut response = HttpResponse::new(body);

			*response.status_mut() = StatusCode::from_u16(status)
				.map_err(|err| RecordingError(format!("Invalid canned status: {err}")))?;
			response.headers_mut().insert(
				oauth2::http::header::CONTENT_TYPE,
				oauth2::http::HeaderValue::from_static("application/json"),
			);

			Ok(response)
		}
	}
	impl SlackHttpClient for RecordingHttpClient {
		type Handle = RecordingHandle;
		type TransportError = RecordingError;

		fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
			RecordingHandle { client: self.clone(), slot }
		}
	}

	/// Handle returned by [`RecordingHttpClient`].
	#[derive(Debug)]
	pub struct RecordingHandle {
		client: RecordingHttpClient,
		slot: ResponseMetadataSlot,
	}
	impl<'c> AsyncHttpClient<'c> for RecordingHandle {
		type Error = HttpClientError<RecordingError>;
		type Future =
			Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

		fn call(&'c self, request: HttpRequest) -> Self::Future {
			self.slot.take();

			let outcome = self.client.respond(&request).map_err(|err| HttpClientError::Reqwest(Box::new(err)));

			if let Ok(response) = &outcome {
				self.slot.store(ResponseMetadata {
					status: Some(response.status().as_u16()),
					retry_after: None,
				});
			}

			Box::pin(std::future::ready(outcome))
		}
	}

	/// Mapper pairing with [`RecordingHttpClient`]; every transport failure becomes
	/// [`TransportError::Network`](crate::error::TransportError::Network).
	#[derive(Clone, Copy, Debug, Default)]
	pub struct RecordingErrorMapper;
	impl TransportErrorMapper<RecordingError> for RecordingErrorMapper {
		fn map_transport_error(
			&self,
			method: SlackMethod,
			_metadata: Option<&ResponseMetadata>,
			error: HttpClientError<RecordingError>,
		) -> Error {
			crate::error::TransportError::network(RecordingError(format!("{method}: {error}"))).into()
		}
	}

	/// Production Slack descriptor; the recording transport routes by path only.
	pub fn test_descriptor() -> ProviderDescriptor {
		ProviderDescriptor::slack().expect("Production descriptor should always validate.")
	}

	/// Unwraps a `json!` object literal.
	pub fn object(value: Value) -> JsonObject {
		match value {
			Value::Object(map) => map,
			_ => panic!("Fixture must be a JSON object."),
		}
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		str::FromStr,
		sync::{Arc, OnceLock},
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Map, Value};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};

	/// Decoded JSON object as returned by Slack.
	pub type JsonObject = Map<String, Value>;
}

pub use _prelude::JsonObject;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
