//! Callback half: redeem the authorization code and hand the ID token to the application.

// self
use crate::{
	_prelude::*,
	browser::Cookie,
	config::OidcConfig,
	flows::PkceFlow,
	http::OidcHttpClient,
	oauth::{self, CallbackParams},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl<C> PkceFlow<C>
where
	C: ?Sized + OidcHttpClient,
{
	/// Completes the login after the identity provider redirected back with `query`.
	///
	/// The verifier is taken from storage before anything else, so it is gone whether the
	/// callback succeeds or fails. On success the ID token cookie is set at the application's
	/// cookie path and the browser is sent to the stored return path, or to the landing page when
	/// none was stored. Returns the navigation target.
	pub async fn callback(
		&self,
		query: &str,
		config: Option<&OidcConfig>,
		redirect_uri: &Url,
	) -> Result<String> {
		const KIND: FlowKind = FlowKind::Callback;

		let span = FlowSpan::new(KIND, "callback");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let verifier = self
					.verifiers()
					.take()?
					.filter(|verifier| !verifier.is_empty())
					.ok_or(Error::MissingVerifier)?;
				let mut params = CallbackParams::parse(query)?;

				if params.first("code").is_none_or(str::is_empty) {
					return Err(Error::MissingCode);
				}

				params.normalize_empty_state();

				let oidc = self.validate_and_discover(config).await?;
				let response = oauth::validate_auth_response(&oidc.authorization_server, &params)?;
				let tokens = oauth::exchange_authorization_code(
					self.http_client.as_ref(),
					&oidc,
					&response,
					redirect_uri,
					&verifier,
				)
				.await?;
				let id_token = tokens.id_token.ok_or(Error::MissingIdToken)?;

				self.cookies.set(&Cookie {
					name: self.cookie_name.clone(),
					value: id_token,
					path: self.base_path.cookie_path(),
				})?;

				let target =
					self.return_paths().take()?.unwrap_or_else(|| self.base_path.landing_path());

				self.navigator.replace(&target)?;

				Ok(target)
			})
			.await;

		obs::observe(KIND, result)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		_preludet::*,
		config::BasePath,
		http::{StubHttpClient, StubResponse},
		store::VerifierStore,
	};

	const REDIRECT_URI: &str = "https://app.example/argo/pkce/verify";

	fn token_url(issuer: &Url) -> String {
		issuer.join("token").expect("Token URL should join.").to_string()
	}

	fn provider(issuer: &Url, token_response: StubResponse) -> StubHttpClient {
		let stub = stub_provider(issuer);

		stub.route(&token_url(issuer), token_response);

		stub
	}

	#[tokio::test]
	async fn success_sets_the_cookie_at_the_base_path() {
		let issuer = url("https://idp.example/");
		let id_token = encode_id_token(&id_token_claims(&issuer, "abc"));
		let browser = TestBrowser::open("https://app.example/argo/pkce/verify?code=xyz");
		let flow = browser
			.flow(provider(&issuer, StubResponse::json(200, token_body(Some(&id_token)))))
			.with_base_path(BasePath::new("/argo/"));

		VerifierStore::new(browser.storage.clone()).set("v1").expect("Seeding should succeed.");

		let config = oidc_config(issuer.as_str(), "abc", &["openid"]);
		let target = flow
			.callback("?code=xyz", Some(&config), &url(REDIRECT_URI))
			.await
			.expect("Callback should succeed.");
		let cookie = browser.cookies.get("argocd.token").expect("Cookie should be set.");

		assert_eq!(target, "/argo/applications");
		assert_eq!(cookie.header_value(), format!("argocd.token={id_token}; path=/argo"));
		assert!(browser.storage.is_empty());
	}

	#[tokio::test]
	async fn missing_code_fails_before_discovery() {
		let issuer = url("https://idp.example/");
		let stub = stub_provider(&issuer);
		let browser = TestBrowser::open("https://app.example/pkce/verify");
		let config = oidc_config(issuer.as_str(), "abc", &[]);

		for query in ["state=abc", "code="] {
			VerifierStore::new(browser.storage.clone()).set("v1").expect("Seeding should succeed.");

			let err = browser
				.flow(stub.clone())
				.callback(query, Some(&config), &url(REDIRECT_URI))
				.await
				.expect_err("Callback without a code should fail.");

			assert!(matches!(err, Error::MissingCode), "{query}");
		}

		assert!(stub.requests().is_empty());
		assert!(browser.storage.is_empty());
	}

	#[tokio::test]
	async fn provider_errors_are_auth_response_failures() {
		let issuer = url("https://idp.example/");
		let browser = TestBrowser::open("https://app.example/pkce/verify");

		VerifierStore::new(browser.storage.clone()).set("v1").expect("Seeding should succeed.");

		let err = browser
			.flow(stub_provider(&issuer))
			.callback(
				"code=xyz&error=access_denied",
				Some(&oidc_config(issuer.as_str(), "abc", &[])),
				&url(REDIRECT_URI),
			)
			.await
			.expect_err("Provider errors should fail the callback.");

		assert!(matches!(err, Error::AuthResponseInvalid(_)));
		assert!(browser.cookies.cookies().is_empty());
	}
}
