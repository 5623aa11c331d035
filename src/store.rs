//! Session storage contracts and the two entries that bridge the login redirect.
//!
//! The login half and the callback half run in unrelated page loads, so the only state they
//! share lives in session storage: the PKCE code verifier (written once by login, taken once by
//! the callback) and an optional return path.

pub mod file;
pub mod memory;

pub use file::FileSessionStorage;
pub use memory::MemorySessionStorage;

// std
use std::sync::OnceLock;
// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
// self
use crate::_prelude::*;

const VERIFIER_KEY_NAME: &str = "code_verifier";
const RETURN_PATH_KEY: &str = "return_url";

/// String-only key/value storage scoped to one browser tab (or equivalent session).
pub trait SessionStorage
where
	Self: Send + Sync,
{
	/// Returns the value stored under `key`, if any.
	fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

	/// Stores `value` under `key`, replacing any previous value.
	fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

	/// Removes `key`; removing an absent key is not an error.
	fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Error type produced by [`SessionStorage`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Persists the PKCE code verifier across the redirect.
///
/// The key is the base64 encoding of `code_verifier`. The encoding only keeps the entry from
/// standing out when someone browses the storage; it is not a security boundary.
#[derive(Clone)]
pub struct VerifierStore {
	storage: Arc<dyn SessionStorage>,
}
impl VerifierStore {
	/// Wraps a storage backend.
	pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
		Self { storage }
	}

	/// Storage key holding the verifier.
	pub fn key() -> &'static str {
		static KEY: OnceLock<String> = OnceLock::new();

		KEY.get_or_init(|| STANDARD.encode(VERIFIER_KEY_NAME))
	}

	/// Returns the persisted verifier, if any.
	pub fn get(&self) -> Result<Option<String>, StoreError> {
		self.storage.get(Self::key())
	}

	/// Persists `verifier`, replacing a stale one.
	pub fn set(&self, verifier: &str) -> Result<(), StoreError> {
		self.storage.set(Self::key(), verifier)
	}

	/// Erases the persisted verifier.
	pub fn unset(&self) -> Result<(), StoreError> {
		self.storage.remove(Self::key())
	}

	/// Reads the verifier and erases it in the same step.
	pub fn take(&self) -> Result<Option<String>, StoreError> {
		let verifier = self.get()?;

		if verifier.is_some() {
			self.unset()?;
		}

		Ok(verifier)
	}
}
impl Debug for VerifierStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("VerifierStore").field("key", &Self::key()).finish()
	}
}

/// Persists the page the user was on before login.
#[derive(Clone)]
pub struct ReturnPathStore {
	storage: Arc<dyn SessionStorage>,
}
impl ReturnPathStore {
	/// Wraps a storage backend.
	pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
		Self { storage }
	}

	/// Storage key holding the return path.
	pub fn key() -> &'static str {
		RETURN_PATH_KEY
	}

	/// Returns the stored return path, if any.
	pub fn get(&self) -> Result<Option<String>, StoreError> {
		self.storage.get(RETURN_PATH_KEY)
	}

	/// Stores `path` (pathname plus search).
	pub fn set(&self, path: &str) -> Result<(), StoreError> {
		self.storage.set(RETURN_PATH_KEY, path)
	}

	/// Consumes the stored return path; empty values count as absent.
	pub fn take(&self) -> Result<Option<String>, StoreError> {
		let Some(path) = self.get()? else {
			return Ok(None);
		};

		self.storage.remove(RETURN_PATH_KEY)?;

		Ok(Some(path).filter(|path| !path.is_empty()))
	}
}
impl Debug for ReturnPathStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ReturnPathStore").field("key", &RETURN_PATH_KEY).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn storage() -> Arc<MemorySessionStorage> {
		Arc::new(MemorySessionStorage::default())
	}

	#[test]
	fn verifier_key_is_base64_obfuscated() {
		assert_eq!(VerifierStore::key(), "Y29kZV92ZXJpZmllcg==");
	}

	#[test]
	fn verifier_take_reads_once() {
		let backend = storage();
		let verifiers = VerifierStore::new(backend.clone());

		verifiers.set("v1").expect("Setting the verifier should succeed.");

		assert_eq!(backend.snapshot().get("Y29kZV92ZXJpZmllcg==").map(String::as_str), Some("v1"));
		assert_eq!(verifiers.take().expect("Take should succeed."), Some("v1".into()));
		assert_eq!(verifiers.take().expect("Take should succeed."), None);
		assert!(backend.is_empty());
	}

	#[test]
	fn verifier_set_replaces_stale_values() {
		let verifiers = VerifierStore::new(storage());

		verifiers.set("stale").expect("Setting the verifier should succeed.");
		verifiers.set("fresh").expect("Replacing the verifier should succeed.");

		assert_eq!(verifiers.get().expect("Get should succeed."), Some("fresh".into()));

		verifiers.unset().expect("Unset should succeed.");
		verifiers.unset().expect("Unsetting twice should be harmless.");

		assert_eq!(verifiers.get().expect("Get should succeed."), None);
	}

	#[test]
	fn return_path_take_treats_empty_as_absent() {
		let backend = storage();
		let paths = ReturnPathStore::new(backend.clone());

		paths.set("").expect("Setting the return path should succeed.");

		assert_eq!(paths.take().expect("Take should succeed."), None);
		assert!(backend.is_empty());

		paths.set("/applications/guestbook?view=tree").expect("Set should succeed.");

		assert_eq!(
			paths.take().expect("Take should succeed."),
			Some("/applications/guestbook?view=tree".into())
		);
		assert!(backend.is_empty());
	}

	#[test]
	fn store_error_converts_into_login_error_with_source() {
		let store_error = StoreError::Backend { message: "quota exceeded".into() };
		let login_error: Error = store_error.clone().into();

		assert!(matches!(login_error, Error::Storage(_)));
		assert!(login_error.to_string().contains("quota exceeded"));

		let source = StdError::source(&login_error)
			.expect("Login error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}
}
