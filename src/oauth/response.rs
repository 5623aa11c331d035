//! Callback query parsing and authorization response validation.
//!
//! The flow never sends `state`, so validation always runs in the "expect no state" mode: a
//! returned `state` is a protocol violation rather than something to compare.

// crates.io
use percent_encoding::percent_decode_str;
// self
use crate::{_prelude::*, discovery::AuthorizationServer, error::AuthResponseError};

const SINGLE_VALUED: [&str; 4] = ["code", "state", "iss", "error"];
const IMPLICIT_ARTIFACTS: [&str; 2] = ["id_token", "access_token"];

/// Ordered key/value pairs decoded from the callback query string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallbackParams(Vec<(String, String)>);
impl CallbackParams {
	/// Decodes `application/x-www-form-urlencoded` pairs; a leading `?` is ignored.
	///
	/// Percent escapes must be complete and the decoded bytes must be UTF-8.
	pub fn parse(query: &str) -> Result<Self> {
		let query = query.strip_prefix('?').unwrap_or(query);
		let pairs = query
			.split('&')
			.filter(|segment| !segment.is_empty())
			.map(|segment| {
				let (name, value) = segment.split_once('=').unwrap_or((segment, ""));

				Ok((decode_component(name)?, decode_component(value)?))
			})
			.collect::<Result<_>>()?;

		Ok(Self(pairs))
	}

	/// First value of `name`.
	pub fn first(&self, name: &str) -> Option<&str> {
		self.all(name).next()
	}

	/// Every value of `name`, in query order.
	pub fn all<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> {
		self.0.iter().filter(move |(key, _)| key == name).map(|(_, value)| value.as_str())
	}

	/// Whether `name` appears at all.
	pub fn contains(&self, name: &str) -> bool {
		self.all(name).next().is_some()
	}

	/// Removes every occurrence of `name`.
	pub fn remove(&mut self, name: &str) {
		self.0.retain(|(key, _)| key != name);
	}

	/// Drops `state` when its first value is empty, since an empty `state` means none was sent.
	pub fn normalize_empty_state(&mut self) {
		if self.first("state") == Some("") {
			self.remove("state");
		}
	}

	/// Pairs in query order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
	}
}

/// Authorization response that passed validation.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizationResponse {
	/// Authorization code to redeem.
	pub code: String,
	/// Issuer reported by the provider (RFC 9207), when present.
	pub iss: Option<String>,
}
impl Debug for AuthorizationResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationResponse")
			.field("code", &"<redacted>")
			.field("iss", &self.iss)
			.finish()
	}
}

/// Validates callback parameters against the discovered authorization server.
pub fn validate_auth_response(
	server: &AuthorizationServer,
	params: &CallbackParams,
) -> Result<AuthorizationResponse, AuthResponseError> {
	if params.contains("response") {
		return Err(AuthResponseError::UnsupportedResponseMode);
	}
	if let Some(name) = SINGLE_VALUED.into_iter().find(|name| params.all(name).nth(1).is_some()) {
		return Err(AuthResponseError::DuplicateParameter { name });
	}

	let iss = params.first("iss");

	match iss {
		None if server.authorization_response_iss_parameter_supported =>
			return Err(AuthResponseError::MissingIssuer),
		Some(actual) if actual != server.issuer =>
			return Err(AuthResponseError::IssuerMismatch { actual: actual.to_owned() }),
		_ => (),
	}

	if params.contains("state") {
		return Err(AuthResponseError::UnexpectedState);
	}
	if let Some(error) = params.first("error") {
		return Err(AuthResponseError::Provider {
			error: error.to_owned(),
			description: params.first("error_description").map(str::to_owned),
		});
	}
	if let Some(name) = IMPLICIT_ARTIFACTS.into_iter().find(|name| params.contains(name)) {
		return Err(AuthResponseError::UnsupportedResponseType { name });
	}

	let code = params
		.first("code")
		.filter(|code| !code.is_empty())
		.ok_or(AuthResponseError::MissingCode)?;

	Ok(AuthorizationResponse { code: code.to_owned(), iss: iss.map(str::to_owned) })
}

fn decode_component(raw: &str) -> Result<String> {
	let malformed = raw.match_indices('%').any(|(i, _)| {
		raw.as_bytes().get(i + 1..i + 3).is_none_or(|hex| !hex.iter().all(u8::is_ascii_hexdigit))
	});

	if malformed {
		return Err(Error::InvalidQueryParams {
			reason: format!("malformed percent escape in `{raw}`"),
		});
	}

	let plus_decoded = raw.replace('+', " ");

	percent_decode_str(&plus_decoded).decode_utf8().map(Into::into).map_err(|_| {
		Error::InvalidQueryParams { reason: format!("`{raw}` does not decode to UTF-8") }
	})
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::{discovery_document, url};

	fn server() -> AuthorizationServer {
		serde_json::from_value(discovery_document(&url("https://idp.example/")))
			.expect("Discovery fixture should deserialize.")
	}

	fn params(query: &str) -> CallbackParams {
		CallbackParams::parse(query).expect("Query fixture should parse.")
	}

	#[test]
	fn parse_decodes_form_encoding() {
		let parsed = params("?code=a%2Fb+c&scope=openid&flag");

		assert_eq!(parsed.first("code"), Some("a/b c"));
		assert_eq!(parsed.first("flag"), Some(""));
		assert_eq!(parsed.iter().count(), 3);
	}

	#[test]
	fn lookups_do_not_borrow_the_name() {
		let parsed = params("code=a%2Bb&next=%E2%9C%93");
		let code = {
			let name = String::from("code");

			parsed.first(&name)
		};

		assert_eq!(code, Some("a+b"));
		assert_eq!(parsed.first("next"), Some("\u{2713}"));
	}

	#[test]
	fn parse_rejects_malformed_escapes() {
		for query in ["code=%zz", "code=abc%2", "code=%+1", "code=%ff"] {
			let err = CallbackParams::parse(query).expect_err("Malformed query should fail.");

			assert!(matches!(err, Error::InvalidQueryParams { .. }), "{query}");
		}
	}

	#[test]
	fn empty_state_is_normalized_away() {
		let mut with_empty = params("code=xyz&state=");
		let absent = params("code=xyz");

		with_empty.normalize_empty_state();

		assert_eq!(with_empty, absent);

		let mut with_value = params("code=xyz&state=abc");

		with_value.normalize_empty_state();

		assert_eq!(with_value.first("state"), Some("abc"));
	}

	#[test]
	fn validation_accepts_plain_code_responses() {
		let query = params("code=xyz&iss=https%3A%2F%2Fidp.example%2F");
		let response =
			validate_auth_response(&server(), &query).expect("Valid response should pass.");

		assert_eq!(response.code, "xyz");
		assert_eq!(response.iss.as_deref(), Some("https://idp.example/"));
		assert!(!format!("{response:?}").contains("xyz"));
	}

	#[test]
	fn validation_rejects_protocol_violations() {
		let server = server();
		let cases = [
			("code=xyz&state=abc", AuthResponseError::UnexpectedState),
			("code=a&code=b", AuthResponseError::DuplicateParameter { name: "code" }),
			("code=xyz&response=eyJ", AuthResponseError::UnsupportedResponseMode),
			(
				"code=xyz&iss=https%3A%2F%2Fevil.example%2F",
				AuthResponseError::IssuerMismatch { actual: "https://evil.example/".into() },
			),
			(
				"code=xyz&id_token=abc",
				AuthResponseError::UnsupportedResponseType { name: "id_token" },
			),
			(
				"error=access_denied&error_description=nope",
				AuthResponseError::Provider {
					error: "access_denied".into(),
					description: Some("nope".into()),
				},
			),
			("scope=openid", AuthResponseError::MissingCode),
		];

		for (query, expected) in cases {
			assert_eq!(validate_auth_response(&server, &params(query)), Err(expected), "{query}");
		}
	}

	#[test]
	fn iss_is_required_when_advertised() {
		let mut server = server();

		server.authorization_response_iss_parameter_supported = true;

		assert_eq!(
			validate_auth_response(&server, &params("code=xyz")),
			Err(AuthResponseError::MissingIssuer)
		);
	}
}
