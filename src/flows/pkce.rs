//! PKCE verifier generation and S256 challenge derivation (RFC 7636).

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

const PKCE_VERIFIER_LEN: usize = 64;

/// Supported PKCE challenge methods; only `S256` is ever sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PkceCodeChallengeMethod {
	/// SHA-256 based PKCE (RFC 7636 S256).
	S256,
}
impl PkceCodeChallengeMethod {
	/// Returns the RFC 7636 identifier for the challenge method.
	pub fn as_str(self) -> &'static str {
		match self {
			PkceCodeChallengeMethod::S256 => "S256",
		}
	}
}

/// Freshly generated verifier and its derived challenge.
#[derive(Clone)]
pub struct PkcePair {
	/// Secret verifier; persisted until the callback redeems the code.
	pub verifier: String,
	/// Challenge sent with the authorization request.
	pub challenge: String,
	/// Challenge method.
	pub method: PkceCodeChallengeMethod,
}
impl PkcePair {
	/// Generates a 64-character alphanumeric verifier and its S256 challenge.
	pub fn generate() -> Self {
		let verifier: String =
			rand::rng().sample_iter(Alphanumeric).take(PKCE_VERIFIER_LEN).map(char::from).collect();
		let challenge = code_challenge(&verifier);

		Self { verifier, challenge, method: PkceCodeChallengeMethod::S256 }
	}
}
impl Debug for PkcePair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PkcePair")
			.field("verifier", &"<redacted>")
			.field("challenge", &self.challenge)
			.field("method", &self.method)
			.finish()
	}
}

/// `BASE64URL-NOPAD(SHA-256(verifier))`.
pub fn code_challenge(verifier: &str) -> String {
	URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn challenge_matches_rfc_7636_appendix_b() {
		assert_eq!(
			code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
			"E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
		);
	}

	#[test]
	fn generated_pairs_are_fresh_and_consistent() {
		let first = PkcePair::generate();
		let second = PkcePair::generate();

		assert_eq!(first.verifier.len(), 64);
		assert!(first.verifier.chars().all(|c| c.is_ascii_alphanumeric()));
		assert_ne!(first.verifier, second.verifier);
		assert_eq!(first.challenge, code_challenge(&first.verifier));
		assert_eq!(first.method.as_str(), "S256");
		assert!(!format!("{first:?}").contains(&first.verifier));
	}
}
