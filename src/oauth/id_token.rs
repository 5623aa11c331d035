//! ID token claim checks applied to the token endpoint response.
//!
//! The token arrives over TLS straight from the token endpoint, so the signature is not
//! verified here; the claims are decoded and checked against the discovered issuer and the
//! public client instead.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::{_prelude::*, error::IdTokenError, token::IdTokenClaims};

/// Allowed clock skew, in seconds, for `exp` and `iat`.
pub const CLOCK_TOLERANCE_SECS: i64 = 30;

#[derive(Deserialize)]
struct JoseHeader {
	alg: String,
}

/// Decodes the JOSE header and claims of a compact JWS without verifying its signature.
pub fn decode_claims(id_token: &str) -> Result<IdTokenClaims, IdTokenError> {
	let segments = id_token.split('.').collect::<Vec<_>>();
	let [header, payload, _signature] = segments.as_slice() else {
		return Err(IdTokenError::Malformed {
			reason: format!("expected 3 segments, found {}", segments.len()),
		});
	};
	let header: JoseHeader = decode_segment(header, "header")?;

	if header.alg.eq_ignore_ascii_case("none") {
		return Err(IdTokenError::UnsupportedAlgorithm { alg: header.alg });
	}

	decode_segment(payload, "payload")
}

/// Checks registered claims for a public client that sent no `nonce`.
pub fn validate_claims(
	claims: &IdTokenClaims,
	issuer: &str,
	client_id: &str,
	now: OffsetDateTime,
) -> Result<(), IdTokenError> {
	let now = now.unix_timestamp();

	if claims.iss != issuer {
		return Err(IdTokenError::IssuerMismatch { actual: claims.iss.clone() });
	}
	if !claims.aud.contains(client_id) {
		return Err(IdTokenError::AudienceMismatch);
	}

	match claims.azp.as_deref() {
		Some(azp) if azp != client_id => return Err(IdTokenError::AuthorizedPartyMismatch),
		None if claims.aud.len() > 1 => return Err(IdTokenError::AuthorizedPartyMismatch),
		_ => (),
	}

	if claims.exp <= now - CLOCK_TOLERANCE_SECS {
		return Err(IdTokenError::Expired { exp: claims.exp });
	}
	if claims.iat > now + CLOCK_TOLERANCE_SECS {
		return Err(IdTokenError::IssuedInFuture { iat: claims.iat });
	}
	if claims.nonce.is_some() {
		return Err(IdTokenError::UnexpectedNonce);
	}

	Ok(())
}

/// Decodes `id_token` and validates its claims.
pub fn validate(
	id_token: &str,
	issuer: &str,
	client_id: &str,
	now: OffsetDateTime,
) -> Result<IdTokenClaims, IdTokenError> {
	let claims = decode_claims(id_token)?;

	validate_claims(&claims, issuer, client_id, now)?;

	Ok(claims)
}

fn decode_segment<T>(segment: &str, what: &str) -> Result<T, IdTokenError>
where
	T: for<'de> Deserialize<'de>,
{
	let bytes = URL_SAFE_NO_PAD
		.decode(segment)
		.map_err(|e| IdTokenError::Malformed { reason: format!("{what} is not base64url: {e}") })?;

	serde_json::from_slice(&bytes)
		.map_err(|e| IdTokenError::Malformed { reason: format!("{what} is not valid JSON: {e}") })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::{encode_id_token, id_token_claims, url};

	const CLIENT_ID: &str = "abc";

	fn now() -> OffsetDateTime {
		OffsetDateTime::from_unix_timestamp(1_700_000_100).expect("Timestamp fixture is valid.")
	}

	fn claims_with(patch: serde_json::Value) -> IdTokenClaims {
		let mut claims = id_token_claims(&url("https://idp.example/"), CLIENT_ID);

		if let (Some(target), Some(patch)) = (claims.as_object_mut(), patch.as_object()) {
			target.extend(patch.clone());
		}

		serde_json::from_value(claims).expect("Claims fixture should deserialize.")
	}

	#[test]
	fn accepts_well_formed_tokens() {
		let token = encode_id_token(&id_token_claims(&url("https://idp.example/"), CLIENT_ID));
		let claims = validate(&token, "https://idp.example/", CLIENT_ID, now())
			.expect("Fixture token should validate.");

		assert_eq!(claims.sub, "user-123");
	}

	#[test]
	fn rejects_unsecured_and_truncated_tokens() {
		let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
		let payload = URL_SAFE_NO_PAD.encode(b"{}");

		assert!(matches!(
			decode_claims(&format!("{header}.{payload}.")),
			Err(IdTokenError::UnsupportedAlgorithm { .. })
		));
		assert!(matches!(decode_claims("a.b"), Err(IdTokenError::Malformed { .. })));
		assert!(matches!(decode_claims("!!.??.sig"), Err(IdTokenError::Malformed { .. })));
	}

	#[test]
	fn claim_rules_are_enforced() {
		let issuer = "https://idp.example/";
		let cases = [
			(serde_json::json!({ "iss": "https://evil.example/" }), "iss"),
			(serde_json::json!({ "aud": "other" }), "aud"),
			(serde_json::json!({ "aud": ["abc", "other"] }), "azp required"),
			(serde_json::json!({ "azp": "other" }), "azp"),
			(serde_json::json!({ "exp": 1_700_000_000_i64 }), "exp"),
			(serde_json::json!({ "iat": 1_800_000_000_i64 }), "iat"),
			(serde_json::json!({ "nonce": "n" }), "nonce"),
		];

		for (patch, rule) in cases {
			let claims = claims_with(patch);

			assert!(validate_claims(&claims, issuer, CLIENT_ID, now()).is_err(), "{rule}");
		}

		let multi = claims_with(serde_json::json!({ "aud": ["abc", "other"], "azp": "abc" }));

		assert!(validate_claims(&multi, issuer, CLIENT_ID, now()).is_ok());

		let skewed = claims_with(serde_json::json!({ "exp": 1_700_000_080_i64 }));

		assert!(validate_claims(&skewed, issuer, CLIENT_ID, now()).is_ok());
	}
}
