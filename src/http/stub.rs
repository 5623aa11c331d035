//! In-memory [`OidcHttpClient`] serving canned responses for tests and demos.

// crates.io
use oauth2::{
	AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
	http::Response,
};
// self
use crate::{
	_prelude::*,
	http::{OidcHttpClient, ResponseMetadata, ResponseMetadataSlot},
};

type Responder = Arc<dyn Fn(&RecordedRequest) -> StubResponse + Send + Sync>;

/// Error raised when a request targets a URL without a registered route.
#[derive(Debug, ThisError)]
#[error("No stub route registered for {method} {url}.")]
pub struct UnroutedRequest {
	/// HTTP method of the unrouted request.
	pub method: String,
	/// Target URL of the unrouted request.
	pub url: String,
}

/// Canned HTTP response served by [`StubHttpClient`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StubResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers, in order.
	pub headers: Vec<(String, String)>,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl StubResponse {
	/// JSON response with the provided status and body.
	pub fn json(status: u16, body: impl Into<String>) -> Self {
		Self {
			status,
			headers: vec![("content-type".into(), "application/json".into())],
			body: body.into().into_bytes(),
		}
	}

	/// Appends a response header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}
}

/// Request observed by [`StubHttpClient`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRequest {
	/// HTTP method.
	pub method: String,
	/// Full target URL.
	pub url: String,
	/// Request headers, lower-cased names.
	pub headers: Vec<(String, String)>,
	/// Raw request body decoded as UTF-8 (lossy).
	pub body: String,
}
impl RecordedRequest {
	/// Decodes an `application/x-www-form-urlencoded` body.
	pub fn form(&self) -> HashMap<String, String> {
		url::form_urlencoded::parse(self.body.as_bytes()).into_owned().collect()
	}

	/// Returns the first header value with the provided (case-insensitive) name.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}
}

#[derive(Default)]
struct StubState {
	routes: RwLock<HashMap<String, Responder>>,
	requests: Mutex<Vec<RecordedRequest>>,
}

/// Transport that answers from registered routes and records every request.
///
/// Routes match the full request URL (query string included). Requests to unknown URLs fail
/// with [`UnroutedRequest`] at the transport layer.
#[derive(Clone, Default)]
pub struct StubHttpClient(Arc<StubState>);
impl StubHttpClient {
	/// Serves `response` for every request to `url`.
	pub fn route(&self, url: &str, response: StubResponse) -> &Self {
		self.route_with(url, move |_| response.clone())
	}

	/// Serves the response computed by `responder` for every request to `url`.
	pub fn route_with<F>(&self, url: &str, responder: F) -> &Self
	where
		F: 'static + Send + Sync + Fn(&RecordedRequest) -> StubResponse,
	{
		self.0.routes.write().insert(url.to_owned(), Arc::new(responder));

		self
	}

	/// Returns every request observed so far.
	pub fn requests(&self) -> Vec<RecordedRequest> {
		self.0.requests.lock().clone()
	}

	/// Returns the requests observed for `url`.
	pub fn requests_to(&self, url: &str) -> Vec<RecordedRequest> {
		self.0.requests.lock().iter().filter(|request| request.url == url).cloned().collect()
	}

	fn respond(
		&self,
		request: HttpRequest,
	) -> Result<HttpResponse, HttpClientError<UnroutedRequest>> {
		let recorded = RecordedRequest {
			method: request.method().to_string(),
			url: request.uri().to_string(),
			headers: request
				.headers()
				.iter()
				.map(|(name, value)| {
					(name.as_str().to_owned(), String::from_utf8_lossy(value.as_bytes()).into_owned())
				})
				.collect(),
			body: String::from_utf8_lossy(request.body()).into_owned(),
		};

		self.0.requests.lock().push(recorded.clone());

		let responder = self.0.routes.read().get(&recorded.url).cloned().ok_or_else(|| {
			HttpClientError::Reqwest(Box::new(UnroutedRequest {
				method: recorded.method.clone(),
				url: recorded.url.clone(),
			}))
		})?;
		let stub = responder(&recorded);
		let mut builder = Response::builder().status(stub.status);

		for (name, value) in &stub.headers {
			builder = builder.header(name.as_str(), value.as_str());
		}

		Ok(builder.body(stub.body)?)
	}
}
impl Debug for StubHttpClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StubHttpClient")
			.field("routes", &self.0.routes.read().len())
			.field("requests", &self.0.requests.lock().len())
			.finish()
	}
}
impl OidcHttpClient for StubHttpClient {
	type Handle = StubHandle;
	type TransportError = UnroutedRequest;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		StubHandle { client: self.clone(), slot }
	}
}

/// Handle returned by [`StubHttpClient`].
#[derive(Clone, Debug)]
pub struct StubHandle {
	client: StubHttpClient,
	slot: ResponseMetadataSlot,
}
impl<'c> AsyncHttpClient<'c> for StubHandle {
	type Error = HttpClientError<UnroutedRequest>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			self.slot.take();

			let response = self.client.respond(request)?;

			self.slot.store(ResponseMetadata::capture(response.status(), response.headers()));

			Ok(response)
		})
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::http::{Method, Request};
	// self
	use super::*;

	#[tokio::test]
	async fn routes_answer_and_requests_are_recorded() {
		let stub = StubHttpClient::default();

		stub.route(
			"https://idp.example/token",
			StubResponse::json(401, "{}").with_header("www-authenticate", "Bearer"),
		);

		let slot = ResponseMetadataSlot::default();
		let handle = stub.with_metadata(slot.clone());
		let request = Request::builder()
			.method(Method::POST)
			.uri("https://idp.example/token")
			.body(b"code=abc".to_vec())
			.expect("Request fixture should build.");
		let response = handle.call(request).await.expect("Routed request should succeed.");

		assert_eq!(response.status().as_u16(), 401);
		assert_eq!(
			slot.take().map(|meta| meta.www_authenticate),
			Some(vec!["Bearer".to_owned()])
		);
		assert_eq!(stub.requests_to("https://idp.example/token")[0].form()["code"], "abc");
	}

	#[tokio::test]
	async fn unrouted_requests_fail_at_the_transport_layer() {
		let stub = StubHttpClient::default();
		let handle = stub.with_metadata(ResponseMetadataSlot::default());
		let request = Request::builder()
			.uri("https://idp.example/missing")
			.body(Vec::new())
			.expect("Request fixture should build.");
		let err = handle.call(request).await.expect_err("Unrouted request should fail.");

		assert!(matches!(err, HttpClientError::Reqwest(_)));
		assert_eq!(stub.requests().len(), 1);
	}
}
