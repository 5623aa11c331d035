//! Walks through both halves of the PKCE login against an in-process identity provider: the login
//! page redirects to the authorization endpoint, then the callback page redeems the code.

// crates.io
use color_eyre::Result;
// self
use pkce_login::{
	_preludet::*,
	config::BasePath,
	http::{StubHttpClient, StubResponse},
};

const CLIENT_ID: &str = "argo-cd-cli";

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let issuer = Url::parse("https://idp.example.com/")?;
	let config = oidc_config(issuer.as_str(), CLIENT_ID, &["openid", "profile", "email"]);
	let idp: StubHttpClient = stub_provider(&issuer);
	let browser =
		TestBrowser::open("https://argo.example.com/argo/applications/guestbook?view=tree");
	let flow = browser.flow(idp.clone()).with_base_path(BasePath::new("/argo/"));
	let redirect_uri = flow.base_path.redirect_uri(&Url::parse("https://argo.example.com")?);
	let authorize_url = flow.login(Some(&config), &redirect_uri).await?;

	println!("Login redirected to {authorize_url}.");

	let id_token = encode_id_token(&id_token_claims(&issuer, CLIENT_ID));

	idp.route(issuer.join("token")?.as_str(), StubResponse::json(200, token_body(Some(&id_token))));
	// The provider sends the user back with a one-time code.
	browser.navigator.visit(Url::parse(&format!("{redirect_uri}?code=demo-code&state="))?);

	let target = flow.callback("?code=demo-code&state=", Some(&config), &redirect_uri).await?;
	let cookie = browser.cookies.get(&flow.cookie_name).ok_or_else(|| {
		color_eyre::eyre::eyre!("The callback did not set the `{}` cookie.", flow.cookie_name)
	})?;

	println!("Cookie set for path {}.", cookie.path);
	println!("Callback sent the user back to {target}.");

	Ok(())
}
