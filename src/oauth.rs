//! OAuth client facade: authorization response validation and the PKCE code exchange.

pub mod id_token;
pub mod response;

pub use oauth2;
pub use response::*;

// std
use std::borrow::Cow;
// crates.io
use oauth2::{
	AuthType, AuthorizationCode, Client, ClientId, EndpointNotSet, EndpointSet, ExtraTokenFields,
	HttpClientError, PkceCodeVerifier, RedirectUrl, RequestTokenError, StandardRevocableToken,
	StandardTokenResponse, TokenResponse, TokenUrl,
	basic::{
		BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
		BasicTokenType,
	},
};
// self
use crate::{
	_prelude::*,
	config::ValidatedOidc,
	error::TransportError,
	http::{OidcHttpClient, ResponseMetadata, ResponseMetadataSlot},
	token::{TokenResult, TokenSecret},
};

/// Token response fields OpenID Connect adds on top of OAuth 2.0.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdTokenFields {
	/// Raw ID token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id_token: Option<String>,
}
impl ExtraTokenFields for IdTokenFields {}

/// Token endpoint response carrying [`IdTokenFields`].
pub type OidcTokenResponse = StandardTokenResponse<IdTokenFields, BasicTokenType>;

type OidcClient = Client<
	BasicErrorResponse,
	OidcTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointSet,
>;
type OidcRequestTokenError<E> = RequestTokenError<HttpClientError<E>, BasicErrorResponse>;

/// Builds the public client (`token_endpoint_auth_method = none`): no secret, `client_id` sent
/// in the request body.
fn public_client(client_id: &str, token_endpoint: Url) -> OidcClient {
	Client::new(ClientId::new(client_id.to_owned()))
		.set_token_uri(TokenUrl::from_url(token_endpoint))
		.set_auth_type(AuthType::RequestBody)
}

/// Redeems `response.code` at the token endpoint, presenting `code_verifier`.
///
/// A `WWW-Authenticate` challenge on the token response wins over every other outcome. The
/// response is then validated as an OpenID Connect response; an empty `id_token` counts as
/// absent, and requiring one is left to the caller.
pub async fn exchange_authorization_code<C>(
	http_client: &C,
	oidc: &ValidatedOidc,
	response: &AuthorizationResponse,
	redirect_uri: &Url,
	code_verifier: &str,
) -> Result<TokenResult>
where
	C: ?Sized + OidcHttpClient,
{
	let token_endpoint =
		oidc.authorization_server.token_endpoint.clone().ok_or(Error::MissingTokenEndpoint)?;
	let redirect_url = RedirectUrl::new(redirect_uri.to_string())
		.map_err(|source| Error::InvalidRedirect { source })?;
	let client = public_client(&oidc.client_id, token_endpoint);
	let meta = ResponseMetadataSlot::default();
	let instrumented = http_client.with_metadata(meta.clone());
	let outcome = client
		.exchange_code(AuthorizationCode::new(response.code.clone()))
		.set_pkce_verifier(PkceCodeVerifier::new(code_verifier.to_owned()))
		.set_redirect_uri(Cow::Owned(redirect_url))
		.request_async(&instrumented)
		.await;
	let meta = meta.take();

	if let Some(challenges) =
		meta.as_ref().map(|meta| &meta.www_authenticate).filter(|challenges| !challenges.is_empty())
	{
		return Err(Error::AuthChallenge { challenges: challenges.clone() });
	}

	let token_response = outcome.map_err(|e| map_request_error(meta.as_ref(), e))?;

	process_openid_response(oidc, token_response, OffsetDateTime::now_utc())
}

/// Validates a successful token response as an OpenID Connect response.
pub fn process_openid_response(
	oidc: &ValidatedOidc,
	token_response: OidcTokenResponse,
	now: OffsetDateTime,
) -> Result<TokenResult> {
	let access_token = TokenSecret::new(token_response.access_token().secret().as_str());
	let Some(raw) = token_response.extra_fields().id_token.clone().filter(|raw| !raw.is_empty())
	else {
		return Ok(TokenResult { access_token, id_token: None, claims: None });
	};
	let claims =
		id_token::validate(&raw, &oidc.authorization_server.issuer, &oidc.client_id, now)?;

	Ok(TokenResult { access_token, id_token: Some(TokenSecret::new(raw)), claims: Some(claims) })
}

fn map_request_error<E>(meta: Option<&ResponseMetadata>, err: OidcRequestTokenError<E>) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		RequestTokenError::ServerResponse(response) => Error::TokenExchange {
			description: response
				.error_description()
				.cloned()
				.unwrap_or_else(|| response.error().as_ref().to_owned()),
		},
		RequestTokenError::Request(error) => TransportError::network(error).into(),
		RequestTokenError::Parse(error, _body) => Error::TokenExchange {
			description: match meta.and_then(|meta| meta.status) {
				Some(status) => format!("(unparsable response with HTTP status {status}: {error})"),
				None => format!("(unparsable response: {error})"),
			},
		},
		RequestTokenError::Other(message) => Error::TokenExchange { description: message },
	}
}
