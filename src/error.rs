//! Login-level error types shared by both halves of the PKCE flow.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical login error surfaced to the page-level controller.
///
/// Every gate in [`login`](crate::flows::PkceFlow::login) and
/// [`callback`](crate::flows::PkceFlow::callback) fails with exactly one of these variants, and
/// the `Display` output is meant to be shown to the end user as-is.
#[derive(Debug, ThisError)]
pub enum Error {
	/// No OIDC configuration was supplied.
	#[error("No OIDC Config found.")]
	ConfigMissing,
	/// The configured issuer is not an absolute URL.
	#[error("Invalid OIDC issuer {issuer}.")]
	InvalidIssuer {
		/// Raw issuer string taken from the configuration.
		issuer: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The configured client identifier is empty.
	#[error("No OIDC Client Id found.")]
	MissingClientId,
	/// Authorization server metadata could not be discovered.
	#[error("{0}")]
	DiscoveryFailed(
		#[from]
		#[source]
		DiscoveryError,
	),
	/// The discovered metadata does not declare an `authorization_endpoint`.
	#[error("No Authorization Server endpoint found.")]
	MissingAuthEndpoint,
	/// The discovered metadata does not declare a `token_endpoint`.
	#[error("No token endpoint found in the authorization server metadata.")]
	MissingTokenEndpoint,
	/// No code verifier was persisted by a prior login.
	#[error("No code verifier found in session.")]
	MissingVerifier,
	/// The callback query string is malformed.
	#[error("Invalid query parameters: {reason}.")]
	InvalidQueryParams {
		/// What made the query string unusable.
		reason: String,
	},
	/// The callback query string carries no `code`.
	#[error("No code in query parameters.")]
	MissingCode,
	/// The authorization response failed protocol validation.
	#[error("Error validating auth response: {0}")]
	AuthResponseInvalid(#[from] AuthResponseError),
	/// The token endpoint answered with a `WWW-Authenticate` challenge.
	#[error("Error parsing authentication challenge: {}.", .challenges.join(", "))]
	AuthChallenge {
		/// Raw challenge header values.
		challenges: Vec<String>,
	},
	/// The token endpoint rejected the exchange or returned an invalid OpenID response.
	#[error("Error getting token {description}.")]
	TokenExchange {
		/// Provider-supplied description, or a summary of the violated rule.
		description: String,
	},
	/// The token response carries no `id_token`.
	#[error("No token in response.")]
	MissingIdToken,
	/// Redirect URI rejected while building the token request.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Session storage failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Cookie or navigation capability failure.
	#[error("{0}")]
	Browser(
		#[from]
		#[source]
		crate::browser::BrowserError,
	),
	/// Transport failure (DNS, TCP, TLS) while calling the token endpoint.
	#[error(transparent)]
	Transport(#[from] TransportError),
}

/// Failures raised while discovering authorization server metadata.
#[derive(Debug, ThisError)]
pub enum DiscoveryError {
	/// Discovery request could not be constructed.
	#[error("Discovery request could not be built.")]
	Request(#[from] oauth2::http::Error),
	/// Discovery request failed at the transport layer.
	#[error("Discovery request failed.")]
	Transport(#[from] TransportError),
	/// Metadata endpoint answered with a non-200 status.
	#[error("Discovery endpoint returned HTTP status {status}.")]
	UnexpectedStatus {
		/// HTTP status code returned by the metadata endpoint.
		status: u16,
	},
	/// Metadata document is not a valid JSON object.
	#[error("Discovery endpoint returned malformed metadata.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Metadata was issued for a different issuer.
	#[error("Discovered issuer `{actual}` does not match the expected issuer `{expected}`.")]
	IssuerMismatch {
		/// Issuer the discovery was performed for.
		expected: String,
		/// Issuer declared by the metadata document.
		actual: String,
	},
}

/// Protocol violations detected in the authorization response.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum AuthResponseError {
	/// A parameter that must be unique appeared more than once.
	#[error("parameter `{name}` must be provided only once.")]
	DuplicateParameter {
		/// Parameter name.
		name: &'static str,
	},
	/// A `state` parameter was returned although none was sent.
	#[error("unexpected `state` parameter.")]
	UnexpectedState,
	/// The server advertises `iss` responses but none was returned.
	#[error("response parameter `iss` missing.")]
	MissingIssuer,
	/// The returned `iss` does not match the discovered issuer.
	#[error("unexpected `iss` parameter value `{actual}`.")]
	IssuerMismatch {
		/// Issuer reported in the callback.
		actual: String,
	},
	/// The response carries no authorization `code`.
	#[error("response parameter `code` missing.")]
	MissingCode,
	/// A JARM `response` parameter was returned.
	#[error("JWT secured authorization responses are not supported.")]
	UnsupportedResponseMode,
	/// Implicit or hybrid artifacts were returned alongside the code.
	#[error("implicit and hybrid flow artifacts (`{name}`) are not supported.")]
	UnsupportedResponseType {
		/// Offending parameter name.
		name: &'static str,
	},
	/// The provider reported an OAuth error.
	#[error("provider returned `{error}`{}.", .description.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
	Provider {
		/// OAuth `error` code.
		error: String,
		/// Optional `error_description`.
		description: Option<String>,
	},
}

/// ID token claim violations found while validating the OpenID token response.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum IdTokenError {
	/// The token is not a compact JWS or its segments do not decode.
	#[error("ID token is malformed: {reason}")]
	Malformed {
		/// What failed to decode.
		reason: String,
	},
	/// The JOSE header declares an unsecured token.
	#[error("ID token uses the unsupported `{alg}` algorithm")]
	UnsupportedAlgorithm {
		/// Declared `alg` header value.
		alg: String,
	},
	/// `iss` differs from the discovered issuer.
	#[error("unexpected ID token `iss` claim value `{actual}`")]
	IssuerMismatch {
		/// Issuer reported by the token.
		actual: String,
	},
	/// `aud` does not include the client.
	#[error("ID token `aud` claim does not include the client")]
	AudienceMismatch,
	/// `azp` is missing although several audiences are listed, or names another party.
	#[error("unexpected ID token `azp` claim value")]
	AuthorizedPartyMismatch,
	/// `exp` lies in the past.
	#[error("ID token expired at {exp}")]
	Expired {
		/// Expiry, seconds since the Unix epoch.
		exp: i64,
	},
	/// `iat` lies in the future.
	#[error("ID token was issued in the future ({iat})")]
	IssuedInFuture {
		/// Issue time, seconds since the Unix epoch.
		iat: i64,
	},
	/// A `nonce` came back although the authorization request carried none.
	#[error("unexpected ID token `nonce` claim")]
	UnexpectedNonce,
}
impl From<IdTokenError> for Error {
	fn from(e: IdTokenError) -> Self {
		Error::TokenExchange { description: e.to_string() }
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the authorization server.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn discovery_errors_keep_their_cause() {
		let err: Error = DiscoveryError::UnexpectedStatus { status: 503 }.into();

		assert!(matches!(err, Error::DiscoveryFailed(_)));
		assert_eq!(err.to_string(), "Discovery endpoint returned HTTP status 503.");

		let source = StdError::source(&err).expect("Discovery failures should expose a source.");

		assert_eq!(source.to_string(), err.to_string());
	}

	#[test]
	fn provider_errors_render_optional_descriptions() {
		let bare = AuthResponseError::Provider { error: "access_denied".into(), description: None };
		let described = AuthResponseError::Provider {
			error: "access_denied".into(),
			description: Some("user cancelled".into()),
		};

		assert_eq!(bare.to_string(), "provider returned `access_denied`.");
		assert_eq!(described.to_string(), "provider returned `access_denied`: user cancelled.");
	}
}
