//! Transport primitives for discovery requests and authorization code exchanges.
//!
//! The module exposes [`OidcHttpClient`] alongside [`ResponseMetadata`] and
//! [`ResponseMetadataSlot`] so callers can plug in any HTTP stack while the flows keep access to
//! response details the `oauth2` crate does not surface. Implementations call
//! [`ResponseMetadataSlot::take`] before dispatching a request and
//! [`ResponseMetadataSlot::store`] once the HTTP status and headers are known, which is how the
//! callback detects `WWW-Authenticate` challenges on the token endpoint.

#[cfg(any(test, feature = "test"))] pub mod stub;

#[cfg(any(test, feature = "test"))] pub use stub::*;

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
use oauth2::{
	AsyncHttpClient, HttpClientError,
	http::{HeaderMap, StatusCode, header::WWW_AUTHENTICATE},
};
#[cfg(feature = "reqwest")] use oauth2::{HttpRequest, HttpResponse};
// self
use crate::_prelude::*;

/// Abstraction over HTTP transports used by both halves of the PKCE flow.
///
/// The trait is the crate's only dependency on an HTTP stack. Callers provide an
/// implementation and the flows request short-lived [`AsyncHttpClient`] handles that each carry
/// a clone of a [`ResponseMetadataSlot`]. Request futures are not required to be `Send`, so
/// single-threaded browser transports fit as well as native ones.
pub trait OidcHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle tied to a [`ResponseMetadataSlot`].
	type Handle: for<'c> AsyncHttpClient<'c, Error = HttpClientError<Self::TransportError>>
		+ 'static
		+ Send
		+ Sync;

	/// Builds an [`AsyncHttpClient`] handle that records outcomes in `slot`.
	///
	/// # Metadata Contract
	///
	/// - Call [`ResponseMetadataSlot::take`] before submitting the HTTP request so stale
	///   information never leaks across requests.
	/// - Once an HTTP response (successful or erroneous) is available, save its status and
	///   challenges with [`ResponseMetadataSlot::store`].
	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle;
}

/// Captures metadata from the most recent HTTP response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
	/// HTTP status code, if available.
	pub status: Option<u16>,
	/// Raw `WWW-Authenticate` header values, in response order.
	pub www_authenticate: Vec<String>,
}
impl ResponseMetadata {
	/// Extracts the metadata the flows care about from a response head.
	pub fn capture(status: StatusCode, headers: &HeaderMap) -> Self {
		let www_authenticate = headers
			.get_all(WWW_AUTHENTICATE)
			.iter()
			.filter_map(|value| value.to_str().ok())
			.map(str::trim)
			.filter(|value| !value.is_empty())
			.map(str::to_owned)
			.collect();

		Self { status: Some(status.as_u16()), www_authenticate }
	}
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and flow layers.
///
/// The flows create a fresh slot for each request and read the captured metadata immediately
/// after the request resolves.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Discovery and token endpoints answer directly, so configure any custom [`ReqwestClient`] to
/// disable redirect following.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl OidcHttpClient for ReqwestHttpClient {
	type Handle = InstrumentedHandle;
	type TransportError = ReqwestError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		InstrumentedHandle { client: self.0.clone(), slot }
	}
}

// reqwest futures on wasm32 wrap JavaScript promises and are neither `Send` nor `Sync`.
#[cfg(all(feature = "reqwest", not(target_arch = "wasm32")))]
type HandleFuture<'c, E> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, E>> + 'c + Send + Sync>>;
#[cfg(all(feature = "reqwest", target_arch = "wasm32"))]
type HandleFuture<'c, E> = Pin<Box<dyn Future<Output = Result<HttpResponse, E>> + 'c>>;

/// Handle returned by [`ReqwestHttpClient`] that records response metadata.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct InstrumentedHandle {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for InstrumentedHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future = HandleFuture<'c, Self::Error>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			self.slot.take();

			let response =
				self.client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();

			self.slot.store(ResponseMetadata::capture(status, &headers));

			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::http::HeaderValue;
	// self
	use super::*;

	#[test]
	fn capture_collects_every_challenge() {
		let mut headers = HeaderMap::new();

		headers.append(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer error=\"invalid_token\""));
		headers.append(WWW_AUTHENTICATE, HeaderValue::from_static("DPoP algs=\"ES256\""));
		headers.append(WWW_AUTHENTICATE, HeaderValue::from_static("  "));

		let meta = ResponseMetadata::capture(StatusCode::UNAUTHORIZED, &headers);

		assert_eq!(meta.status, Some(401));
		assert_eq!(meta.www_authenticate, vec![
			"Bearer error=\"invalid_token\"".to_owned(),
			"DPoP algs=\"ES256\"".to_owned(),
		]);
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn native_reqwest_handles_yield_send_futures() {
		fn assert_send_sync<T: Send + Sync>(_: &T) {}

		let handle =
			ReqwestHttpClient::default().with_metadata(ResponseMetadataSlot::default());
		let request = oauth2::http::Request::builder()
			.uri("https://idp.example/.well-known/openid-configuration")
			.body(Vec::new())
			.expect("Request fixture should build.");

		assert_send_sync(&handle.call(request));
	}

	#[test]
	fn slot_take_clears_previous_metadata() {
		let slot = ResponseMetadataSlot::default();

		slot.store(ResponseMetadata { status: Some(200), www_authenticate: Vec::new() });

		assert_eq!(slot.take().and_then(|meta| meta.status), Some(200));
		assert!(slot.take().is_none());
	}
}
