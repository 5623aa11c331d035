//! OIDC configuration, validation, and base-path resolution.

// self
use crate::{_prelude::*, discovery::AuthorizationServer};

/// OIDC settings published by the server's auth-settings endpoint.
///
/// The JSON shape follows the `oidcConfig` object (`clientID` keeps its historical casing).
/// The value is immutable for the duration of a flow.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OidcConfig {
	/// Display name of the identity provider.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Issuer URL the metadata is discovered from.
	#[serde(default)]
	pub issuer: String,
	/// Public client identifier registered with the identity provider.
	#[serde(rename = "clientID", default)]
	pub client_id: String,
	/// Requested scopes, in order.
	#[serde(default)]
	pub scopes: Vec<String>,
}
impl OidcConfig {
	/// Creates a configuration without scopes.
	pub fn new(issuer: impl Into<String>, client_id: impl Into<String>) -> Self {
		Self { name: None, issuer: issuer.into(), client_id: client_id.into(), scopes: Vec::new() }
	}

	/// Replaces the requested scopes, keeping their order.
	pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes = scopes.into_iter().map(Into::into).collect();

		self
	}

	/// Space-joined `scope` parameter value.
	pub fn scope_param(&self) -> String {
		self.scopes.join(" ")
	}
}

/// Configuration that passed the local checks and can be used for discovery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckedConfig {
	/// Parsed issuer URL.
	pub issuer_url: Url,
	/// Non-empty client identifier.
	pub client_id: String,
	/// Requested scopes, in order.
	pub scopes: Vec<String>,
}
impl CheckedConfig {
	/// Attaches the metadata discovered for [`CheckedConfig::issuer_url`].
	pub fn with_server(self, authorization_server: AuthorizationServer) -> ValidatedOidc {
		let Self { issuer_url, client_id, scopes } = self;

		ValidatedOidc { issuer_url, authorization_server, client_id, scopes }
	}
}

/// Fully validated configuration: local checks passed and the issuer was discovered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedOidc {
	/// Parsed issuer URL.
	pub issuer_url: Url,
	/// Metadata discovered for the issuer.
	pub authorization_server: AuthorizationServer,
	/// Non-empty client identifier.
	pub client_id: String,
	/// Requested scopes, in order.
	pub scopes: Vec<String>,
}

/// Runs the network-free validation gates in order; the first violation wins.
pub fn check(config: Option<&OidcConfig>) -> Result<CheckedConfig> {
	let config = config.ok_or(Error::ConfigMissing)?;
	let issuer_url = Url::parse(&config.issuer)
		.map_err(|source| Error::InvalidIssuer { issuer: config.issuer.clone(), source })?;

	if config.client_id.is_empty() {
		return Err(Error::MissingClientId);
	}

	Ok(CheckedConfig {
		issuer_url,
		client_id: config.client_id.clone(),
		scopes: config.scopes.clone(),
	})
}

/// Application base path (`<base href>`), stored without surrounding slashes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct BasePath(String);
impl BasePath {
	/// Login page path, relative to the base path.
	pub const LOGIN_PATH: &str = "/login";
	/// Default post-login destination, relative to the base path.
	pub const LANDING_PATH: &str = "/applications";
	/// Callback route the identity provider redirects back to, relative to the base path.
	pub const CALLBACK_PATH: &str = "/pkce/verify";

	/// Normalizes a base href such as `/`, `/argo/`, or `argo`.
	pub fn new(href: impl AsRef<str>) -> Self {
		Self(href.as_ref().trim_matches('/').to_owned())
	}

	/// Maps an application-relative path to an absolute path under the base path.
	pub fn to_abs_url(&self, path: &str) -> String {
		let relative = path.trim_start_matches('/');

		if self.0.is_empty() { format!("/{relative}") } else { format!("/{}/{relative}", self.0) }
	}

	/// Cookie path covering the whole application.
	pub fn cookie_path(&self) -> String {
		format!("/{}", self.to_abs_url("").trim_matches('/'))
	}

	/// Whether `path` points at (or below) the login page.
	pub fn is_login_path(&self, path: &str) -> bool {
		path.starts_with(&self.to_abs_url(Self::LOGIN_PATH))
	}

	/// Absolute default post-login destination.
	pub fn landing_path(&self) -> String {
		self.to_abs_url(Self::LANDING_PATH)
	}

	/// Callback redirect URI for an application served from `origin`.
	pub fn redirect_uri(&self, origin: &Url) -> Url {
		let mut url = origin.clone();

		url.set_path(&self.to_abs_url(Self::CALLBACK_PATH));
		url.set_query(None);
		url.set_fragment(None);

		url
	}
}
impl From<String> for BasePath {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}
impl From<BasePath> for String {
	fn from(value: BasePath) -> Self {
		value.0
	}
}
impl Display for BasePath {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "/{}", self.0)
	}
}
