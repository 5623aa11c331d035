//! Browser-side OpenID Connect login via the Authorization Code + PKCE flow.
//!
//! [`flows::PkceFlow::login`] discovers the identity provider, stores a fresh code verifier, and
//! redirects to the authorization endpoint. [`flows::PkceFlow::callback`] runs on the page the
//! provider redirects back to: it takes the verifier, redeems the code, and stores the ID token in
//! a cookie before sending the user back to where they started.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod browser;
pub mod config;
pub mod discovery;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod store;
pub mod token;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and fixtures for tests and demos; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// crates.io
	use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
	// self
	use crate::{
		browser::{MemoryCookieJar, MemoryNavigator},
		config::OidcConfig,
		flows::PkceFlow,
		http::{OidcHttpClient, StubHttpClient, StubResponse},
		store::MemorySessionStorage,
	};
	#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

	/// In-memory browser capabilities backing a test flow.
	#[derive(Clone, Debug)]
	pub struct TestBrowser {
		/// Session storage shared by both halves of the flow.
		pub storage: Arc<MemorySessionStorage>,
		/// Cookie jar receiving the ID token cookie.
		pub cookies: Arc<MemoryCookieJar>,
		/// Navigator recording every redirect.
		pub navigator: Arc<MemoryNavigator>,
	}
	impl TestBrowser {
		/// Opens a fresh browser tab on `current_url`.
		pub fn open(current_url: &str) -> Self {
			let url = Url::parse(current_url).expect("Test browser URL should parse.");

			Self {
				storage: Arc::new(MemorySessionStorage::default()),
				cookies: Arc::new(MemoryCookieJar::default()),
				navigator: Arc::new(MemoryNavigator::new(url)),
			}
		}

		/// Builds a flow wired to this tab's storage, cookies, and navigator.
		pub fn flow<C>(&self, http_client: C) -> PkceFlow<C>
		where
			C: OidcHttpClient,
		{
			PkceFlow::with_http_client(
				self.storage.clone(),
				self.cookies.clone(),
				self.navigator.clone(),
				http_client,
			)
		}
	}

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	#[cfg(feature = "reqwest")]
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Parses a URL fixture.
	pub fn url(value: &str) -> Url {
		Url::parse(value).expect("URL fixture should parse.")
	}

	/// OIDC configuration fixture.
	pub fn oidc_config(issuer: &str, client_id: &str, scopes: &[&str]) -> OidcConfig {
		OidcConfig::new(issuer, client_id).with_scopes(scopes.iter().copied())
	}

	/// Discovery document advertising `authorize` and `token` endpoints under `issuer`.
	pub fn discovery_document(issuer: &Url) -> serde_json::Value {
		let endpoint = |path: &str| {
			issuer.join(path).expect("Discovery endpoint fixture should join.").to_string()
		};

		serde_json::json!({
			"issuer": issuer.as_str(),
			"authorization_endpoint": endpoint("authorize"),
			"token_endpoint": endpoint("token"),
			"jwks_uri": endpoint("keys"),
			"response_types_supported": ["code"],
			"code_challenge_methods_supported": ["S256"],
		})
	}

	/// Stub transport that already serves the discovery document for `issuer`.
	pub fn stub_provider(issuer: &Url) -> StubHttpClient {
		let stub = StubHttpClient::default();

		stub.route(
			crate::discovery::discovery_url(issuer).as_str(),
			StubResponse::json(200, discovery_document(issuer).to_string()),
		);

		stub
	}

	/// Valid ID token claims for `issuer` and `client_id`.
	pub fn id_token_claims(issuer: &Url, client_id: &str) -> serde_json::Value {
		serde_json::json!({
			"iss": issuer.as_str(),
			"sub": "user-123",
			"aud": client_id,
			"iat": 1_700_000_000_i64,
			"exp": 4_102_444_800_i64,
		})
	}

	/// Encodes `claims` as a compact JWS with a placeholder signature.
	pub fn encode_id_token(claims: &serde_json::Value) -> String {
		let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
		let payload = URL_SAFE_NO_PAD.encode(claims.to_string());

		format!("{header}.{payload}.c2lnbmF0dXJl")
	}

	/// Token endpoint body carrying `id_token`.
	pub fn token_body(id_token: Option<&str>) -> String {
		let mut body = serde_json::json!({
			"access_token": "access-123",
			"token_type": "Bearer",
			"expires_in": 3600,
		});

		if let Some(id_token) = id_token {
			body["id_token"] = serde_json::Value::String(id_token.to_owned());
		}

		body.to_string()
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
