//! Login half: build the authorization request and leave for the identity provider.

// self
use crate::{
	_prelude::*,
	config::OidcConfig,
	flows::{PkceFlow, pkce::PkcePair},
	http::OidcHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl<C> PkceFlow<C>
where
	C: ?Sized + OidcHttpClient,
{
	/// Starts the login and navigates to the identity provider, replacing the current history
	/// entry.
	///
	/// The current page (pathname plus search) becomes the return path unless it already sits
	/// under the login page. The return path and the verifier are only written once every gate
	/// has passed, so a failed login leaves storage untouched. Returns the authorization URL the
	/// browser was sent to.
	pub async fn login(&self, config: Option<&OidcConfig>, redirect_uri: &Url) -> Result<Url> {
		const KIND: FlowKind = FlowKind::Login;

		let span = FlowSpan::new(KIND, "login");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let oidc = self.validate_and_discover(config).await?;
				let current = self.navigator.current_url()?;
				let return_path = (!self.base_path.is_login_path(current.path()))
					.then(|| format!("{}{}", current.path(), search(&current)));
				let authorization_endpoint = oidc
					.authorization_server
					.authorization_endpoint
					.as_ref()
					.ok_or(Error::MissingAuthEndpoint)?;
				let pkce = PkcePair::generate();
				let scope = oidc.scopes.join(" ");
				let authorize_url = build_authorize_url(authorization_endpoint, [
					("client_id", oidc.client_id.as_str()),
					("code_challenge", pkce.challenge.as_str()),
					("code_challenge_method", pkce.method.as_str()),
					("redirect_uri", redirect_uri.as_str()),
					("response_type", "code"),
					("scope", scope.as_str()),
				]);

				if let Some(path) = return_path {
					self.return_paths().set(&path)?;
				}

				self.verifiers().set(&pkce.verifier)?;
				self.navigator.replace(authorize_url.as_str())?;

				Ok(authorize_url)
			})
			.await;

		obs::observe(KIND, result)
	}
}

fn search(url: &Url) -> String {
	url.query()
		.filter(|query| !query.is_empty())
		.map(|query| format!("?{query}"))
		.unwrap_or_default()
}

/// Sets each parameter on `endpoint`: the first same-named pair is overwritten in place, later
/// duplicates are dropped, and new names are appended.
fn build_authorize_url<const N: usize>(endpoint: &Url, params: [(&str, &str); N]) -> Url {
	let mut pairs = endpoint.query_pairs().into_owned().collect::<Vec<_>>();

	for (name, value) in params {
		match pairs.iter().position(|(key, _)| key == name) {
			Some(first) => {
				pairs[first].1 = value.to_owned();

				let mut index = 0;

				pairs.retain(|(key, _)| {
					index += 1;

					index - 1 <= first || key != name
				});
			},
			None => pairs.push((name.to_owned(), value.to_owned())),
		}
	}

	let mut url = endpoint.clone();

	url.query_pairs_mut().clear().extend_pairs(&pairs);

	url
}
