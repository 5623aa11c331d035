//! Thread-safe in-memory [`SessionStorage`] for local development and tests.

// self
use crate::{
	_prelude::*,
	store::{SessionStorage, StoreError},
};

type StoreMap = Arc<RwLock<HashMap<String, String>>>;

/// Storage backend that keeps entries in-process, like a tab's `sessionStorage`.
#[derive(Clone, Debug, Default)]
pub struct MemorySessionStorage(StoreMap);
impl MemorySessionStorage {
	/// Copies the current entries.
	pub fn snapshot(&self) -> HashMap<String, String> {
		self.0.read().clone()
	}

	/// Whether the storage holds no entries.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	/// Drops every entry, as closing the tab would.
	pub fn clear(&self) {
		self.0.write().clear();
	}
}
impl SessionStorage for MemorySessionStorage {
	fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
		Ok(self.0.read().get(key).cloned())
	}

	fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
		self.0.write().insert(key.to_owned(), value.to_owned());

		Ok(())
	}

	fn remove(&self, key: &str) -> Result<(), StoreError> {
		self.0.write().remove(key);

		Ok(())
	}
}
