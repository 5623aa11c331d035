//! Token models: redacted secrets, ID token claims, and the token endpoint result.

// self
use crate::_prelude::*;

/// Redacted secret wrapper keeping token material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// `aud` claim, which is either a single string or an array.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
	/// Single audience.
	Single(String),
	/// Several audiences.
	Multiple(Vec<String>),
}
impl Audience {
	/// Whether `client_id` is one of the audiences.
	pub fn contains(&self, client_id: &str) -> bool {
		match self {
			Audience::Single(aud) => aud == client_id,
			Audience::Multiple(auds) => auds.iter().any(|aud| aud == client_id),
		}
	}

	/// Number of audiences.
	pub fn len(&self) -> usize {
		match self {
			Audience::Single(_) => 1,
			Audience::Multiple(auds) => auds.len(),
		}
	}

	/// Whether the claim lists no audience at all.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Registered ID token claims checked after the code exchange.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdTokenClaims {
	/// Issuer.
	pub iss: String,
	/// Subject.
	pub sub: String,
	/// Audience.
	pub aud: Audience,
	/// Expiry, seconds since the Unix epoch.
	pub exp: i64,
	/// Issue time, seconds since the Unix epoch.
	pub iat: i64,
	/// Authorized party.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub azp: Option<String>,
	/// Replay-protection nonce.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub nonce: Option<String>,
	/// Time of the end-user authentication.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub auth_time: Option<i64>,
}

/// Validated token endpoint result.
///
/// The flow projects the ID token into the session cookie and drops the rest right away.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenResult {
	/// Access token issued alongside the ID token.
	pub access_token: TokenSecret,
	/// Raw ID token, when the provider returned one.
	pub id_token: Option<TokenSecret>,
	/// Claims decoded from [`TokenResult::id_token`].
	pub claims: Option<IdTokenClaims>,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("eyJhbGciOi.payload.sig");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
		assert_eq!(secret.expose(), "eyJhbGciOi.payload.sig");
	}

	#[test]
	fn audience_accepts_strings_and_arrays() {
		let single: Audience = serde_json::from_str("\"abc\"").expect("String audience.");
		let many: Audience = serde_json::from_str("[\"abc\",\"other\"]").expect("Array audience.");

		assert!(single.contains("abc"));
		assert_eq!(single.len(), 1);
		assert!(many.contains("other"));
		assert!(!many.contains("nobody"));
		assert_eq!(many.len(), 2);
	}
}
