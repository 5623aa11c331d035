#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use pkce_login::{
	_preludet::*,
	error::DiscoveryError,
	flows::{PkceFlow, ReqwestPkceFlow},
	http::ReqwestHttpClient,
};

const CLIENT_ID: &str = "client-it";
const REDIRECT_URI: &str = "https://app.example/pkce/verify";

fn flow(browser: &TestBrowser) -> ReqwestPkceFlow {
	PkceFlow::with_http_client(
		browser.storage.clone(),
		browser.cookies.clone(),
		browser.navigator.clone(),
		test_reqwest_http_client(),
	)
}

async fn mock_discovery(server: &MockServer, issuer: &Url) {
	let document = discovery_document(issuer).to_string();

	server
		.mock_async(|when, then| {
			when.method(GET).path("/.well-known/openid-configuration");
			then.status(200).header("content-type", "application/json").body(document);
		})
		.await;
}

#[tokio::test]
async fn login_and_callback_over_http() {
	let server = MockServer::start_async().await;
	let issuer = url(&server.url("/"));
	let config = oidc_config(issuer.as_str(), CLIENT_ID, &["openid", "email"]);

	mock_discovery(&server, &issuer).await;

	let browser = TestBrowser::open("https://app.example/applications?project=default");
	let flow = flow(&browser);
	let authorize_url =
		flow.login(Some(&config), &url(REDIRECT_URI)).await.expect("Login should succeed.");

	assert_eq!(authorize_url.path(), "/authorize");

	let id_token = encode_id_token(&id_token_claims(&issuer, CLIENT_ID));
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.header("content-type", "application/x-www-form-urlencoded");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body(Some(&id_token)));
		})
		.await;
	let target = flow
		.callback("code=xyz&state=", Some(&config), &url(REDIRECT_URI))
		.await
		.expect("Callback should succeed.");

	token_mock.assert_async().await;

	assert_eq!(target, "/applications?project=default");
	assert_eq!(
		browser.cookies.get("argocd.token").map(|cookie| cookie.header_value()),
		Some(format!("argocd.token={id_token}; path=/"))
	);
}

#[tokio::test]
async fn www_authenticate_on_the_token_endpoint_is_a_challenge() {
	let server = MockServer::start_async().await;
	let issuer = url(&server.url("/"));
	let browser = TestBrowser::open("https://app.example/pkce/verify");

	mock_discovery(&server, &issuer).await;
	flow(&browser).verifiers().set("v1").expect("Seeding should succeed.");
	server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(401)
				.header("content-type", "application/json")
				.header("www-authenticate", "Basic realm=\"idp\"")
				.body("{\"error\":\"invalid_client\"}");
		})
		.await;

	let config = oidc_config(issuer.as_str(), CLIENT_ID, &[]);
	let err = flow(&browser)
		.callback("code=xyz", Some(&config), &url(REDIRECT_URI))
		.await
		.expect_err("Challenged exchange should fail.");

	assert!(matches!(
		err,
		Error::AuthChallenge { ref challenges } if challenges == &["Basic realm=\"idp\""]
	));
}

#[tokio::test]
async fn discovery_rejects_metadata_for_another_issuer() {
	let server = MockServer::start_async().await;
	let issuer = url(&server.url("/"));

	mock_discovery(&server, &url("https://evil.example/")).await;

	let browser = TestBrowser::open("https://app.example/applications");
	let err = flow(&browser)
		.login(Some(&oidc_config(issuer.as_str(), CLIENT_ID, &[])), &url(REDIRECT_URI))
		.await
		.expect_err("Foreign metadata should fail discovery.");

	assert!(matches!(
		err,
		Error::DiscoveryFailed(DiscoveryError::IssuerMismatch { ref actual, .. })
			if actual == "https://evil.example/"
	));
	assert!(browser.storage.is_empty());
}

#[tokio::test]
async fn custom_reqwest_clients_are_accepted() {
	let server = MockServer::start_async().await;
	let issuer = url(&server.url("/"));

	mock_discovery(&server, &issuer).await;

	let client = ReqwestHttpClient::with_client(
		reqwest::Client::builder()
			.redirect(reqwest::redirect::Policy::none())
			.danger_accept_invalid_certs(true)
			.build()
			.expect("Reqwest client should build."),
	);
	let server_metadata = pkce_login::discovery::discover(&client, &issuer)
		.await
		.expect("Discovery should succeed.");

	assert_eq!(server_metadata.issuer, issuer.as_str());
}
