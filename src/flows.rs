//! Flow orchestrators for both halves of the PKCE login.
//!
//! [`PkceFlow::login`] and [`PkceFlow::callback`] run in unrelated page loads. The flow value
//! itself holds no per-login state: everything that must survive the redirect goes through the
//! injected [`SessionStorage`].

pub mod pkce;

mod callback;
mod login;

pub use pkce::*;

// self
use crate::{
	_prelude::*,
	browser::{CookieJar, Navigator},
	config::{self, BasePath, OidcConfig, ValidatedOidc},
	discovery,
	http::OidcHttpClient,
	store::{ReturnPathStore, SessionStorage, VerifierStore},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Cookie carrying the ID token once the callback completes.
pub const DEFAULT_COOKIE_NAME: &str = "argocd.token";

#[cfg(feature = "reqwest")]
/// Flow specialized for the crate's default reqwest transport.
pub type ReqwestPkceFlow = PkceFlow<ReqwestHttpClient>;

/// Runs the Authorization Code + PKCE login against injected browser capabilities.
///
/// The flow owns the HTTP transport, session storage, cookie jar, and navigator handles so the
/// login and callback halves only differ in the steps they run. Every call validates the OIDC
/// configuration and rediscovers the issuer; nothing is cached between calls.
#[derive(Clone)]
pub struct PkceFlow<C>
where
	C: ?Sized + OidcHttpClient,
{
	/// HTTP client used for discovery and the token exchange.
	pub http_client: Arc<C>,
	/// Session storage bridging the redirect.
	pub storage: Arc<dyn SessionStorage>,
	/// Cookie jar receiving the ID token.
	pub cookies: Arc<dyn CookieJar>,
	/// Top-level navigation.
	pub navigator: Arc<dyn Navigator>,
	/// Application base path used for loop prevention, the cookie path, and the landing page.
	pub base_path: BasePath,
	/// Name of the ID token cookie.
	pub cookie_name: String,
}
impl<C> PkceFlow<C>
where
	C: ?Sized + OidcHttpClient,
{
	/// Creates a flow that reuses the caller-provided transport.
	pub fn with_http_client(
		storage: Arc<dyn SessionStorage>,
		cookies: Arc<dyn CookieJar>,
		navigator: Arc<dyn Navigator>,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			storage,
			cookies,
			navigator,
			base_path: BasePath::default(),
			cookie_name: DEFAULT_COOKIE_NAME.into(),
		}
	}

	/// Serves the application under `base_path` instead of `/`.
	pub fn with_base_path(mut self, base_path: BasePath) -> Self {
		self.base_path = base_path;

		self
	}

	/// Renames the ID token cookie.
	pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
		self.cookie_name = name.into();

		self
	}

	/// Verifier entry of the injected storage.
	pub fn verifiers(&self) -> VerifierStore {
		VerifierStore::new(self.storage.clone())
	}

	/// Return path entry of the injected storage.
	pub fn return_paths(&self) -> ReturnPathStore {
		ReturnPathStore::new(self.storage.clone())
	}

	/// Runs the local configuration gates, then discovers the issuer.
	pub async fn validate_and_discover(&self, config: Option<&OidcConfig>) -> Result<ValidatedOidc> {
		let checked = config::check(config)?;
		let server = discovery::discover(self.http_client.as_ref(), &checked.issuer_url).await?;

		Ok(checked.with_server(server))
	}
}
#[cfg(feature = "reqwest")]
impl PkceFlow<ReqwestHttpClient> {
	/// Creates a flow that provisions its own reqwest-backed transport.
	pub fn new(
		storage: Arc<dyn SessionStorage>,
		cookies: Arc<dyn CookieJar>,
		navigator: Arc<dyn Navigator>,
	) -> Self {
		Self::with_http_client(storage, cookies, navigator, ReqwestHttpClient::default())
	}
}
impl<C> Debug for PkceFlow<C>
where
	C: ?Sized + OidcHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PkceFlow")
			.field("base_path", &self.base_path)
			.field("cookie_name", &self.cookie_name)
			.finish()
	}
}
