//! Authorization server metadata discovery.
//!
//! Metadata is fetched fresh for every flow half from the issuer's
//! `/.well-known/openid-configuration` document and accepted only when it was issued for the very
//! issuer the discovery ran against. Nothing is cached, so repeating a discovery is always safe.

// crates.io
use oauth2::{
	AsyncHttpClient, HttpResponse,
	http::{Method, Request, StatusCode, header::ACCEPT},
};
// self
use crate::{
	_prelude::*,
	error::{DiscoveryError, TransportError},
	http::{OidcHttpClient, ResponseMetadataSlot},
};

const WELL_KNOWN_PATH: &str = "/.well-known/openid-configuration";

/// Authorization server metadata (OpenID Connect Discovery 1.0 / RFC 8414 subset).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationServer {
	/// Issuer identifier the metadata was issued for.
	pub issuer: String,
	/// Authorization endpoint; required to start a login.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub authorization_endpoint: Option<Url>,
	/// Token endpoint; required to finish a login.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_endpoint: Option<Url>,
	/// JSON Web Key Set location.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub jwks_uri: Option<Url>,
	/// UserInfo endpoint.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub userinfo_endpoint: Option<Url>,
	/// Advertised scopes.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub scopes_supported: Vec<String>,
	/// Advertised `response_type` values.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub response_types_supported: Vec<String>,
	/// Advertised PKCE challenge methods.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub code_challenge_methods_supported: Vec<String>,
	/// Whether authorization responses always carry an `iss` parameter (RFC 9207).
	#[serde(default)]
	pub authorization_response_iss_parameter_supported: bool,
}

/// Derives the well-known discovery URL for `issuer`.
///
/// The issuer path is kept (minus a trailing `/`) so multi-tenant issuers such as
/// `https://idp.example/realms/acme` resolve under their own path.
pub fn discovery_url(issuer: &Url) -> Url {
	let mut url = issuer.clone();
	let path = format!("{}{WELL_KNOWN_PATH}", issuer.path().trim_end_matches('/'));

	url.set_path(&path);
	url.set_query(None);
	url.set_fragment(None);

	url
}

/// Fetches and validates the metadata published for `issuer`.
pub async fn discover<C>(
	http_client: &C,
	issuer: &Url,
) -> Result<AuthorizationServer, DiscoveryError>
where
	C: ?Sized + OidcHttpClient,
{
	let request = Request::builder()
		.method(Method::GET)
		.uri(discovery_url(issuer).as_str())
		.header(ACCEPT, "application/json")
		.body(Vec::new())?;
	let handle = http_client.with_metadata(ResponseMetadataSlot::default());
	let response = handle.call(request).await.map_err(TransportError::network)?;

	process_discovery_response(issuer, &response)
}

/// Validates a raw discovery response against the expected issuer.
///
/// Issuers are compared in their parsed form, so `https://idp.example` and
/// `https://idp.example/` name the same issuer while any other difference still fails.
pub fn process_discovery_response(
	issuer: &Url,
	response: &HttpResponse,
) -> Result<AuthorizationServer, DiscoveryError> {
	if response.status() != StatusCode::OK {
		return Err(DiscoveryError::UnexpectedStatus { status: response.status().as_u16() });
	}

	let deserializer = &mut serde_json::Deserializer::from_slice(response.body());
	let server: AuthorizationServer = serde_path_to_error::deserialize(deserializer)
		.map_err(|source| DiscoveryError::Parse { source })?;

	if Url::parse(&server.issuer).ok().as_ref() != Some(issuer) {
		return Err(DiscoveryError::IssuerMismatch {
			expected: issuer.to_string(),
			actual: server.issuer,
		});
	}

	Ok(server)
}
