//! In-process browser capabilities for tests, demos, and native hosts.

// self
use crate::{
	_prelude::*,
	browser::{BrowserError, Cookie, CookieJar, Navigator},
};

/// Cookie jar keeping cookies in memory, keyed by name and path.
#[derive(Debug, Default)]
pub struct MemoryCookieJar(RwLock<Vec<Cookie>>);
impl MemoryCookieJar {
	/// Returns the first cookie named `name`.
	pub fn get(&self, name: &str) -> Option<Cookie> {
		self.0.read().iter().find(|cookie| cookie.name == name).cloned()
	}

	/// Returns every stored cookie in insertion order.
	pub fn cookies(&self) -> Vec<Cookie> {
		self.0.read().clone()
	}
}
impl CookieJar for MemoryCookieJar {
	fn set(&self, cookie: &Cookie) -> Result<(), BrowserError> {
		let mut cookies = self.0.write();

		match cookies.iter_mut().find(|c| c.name == cookie.name && c.path == cookie.path) {
			Some(existing) => *existing = cookie.clone(),
			None => cookies.push(cookie.clone()),
		}

		Ok(())
	}
}

#[derive(Debug)]
struct NavigatorState {
	current: Url,
	replacements: Vec<Url>,
}

/// Navigator that tracks the current URL and records every replacement.
#[derive(Debug)]
pub struct MemoryNavigator(Mutex<NavigatorState>);
impl MemoryNavigator {
	/// Starts on `current`.
	pub fn new(current: Url) -> Self {
		Self(Mutex::new(NavigatorState { current, replacements: Vec::new() }))
	}

	/// Every navigation performed so far, resolved against the page it started from.
	pub fn replacements(&self) -> Vec<Url> {
		self.0.lock().replacements.clone()
	}

	/// Most recent navigation target.
	pub fn last(&self) -> Option<Url> {
		self.0.lock().replacements.last().cloned()
	}

	/// Moves to `url` without recording a navigation, as a provider redirect would.
	pub fn visit(&self, url: Url) {
		self.0.lock().current = url;
	}
}
impl Navigator for MemoryNavigator {
	fn current_url(&self) -> Result<Url, BrowserError> {
		Ok(self.0.lock().current.clone())
	}

	fn replace(&self, target: &str) -> Result<(), BrowserError> {
		let mut state = self.0.lock();
		let next = state
			.current
			.join(target)
			.map_err(|e| BrowserError::Rejected { message: format!("invalid target: {e}") })?;

		state.replacements.push(next.clone());
		state.current = next;

		Ok(())
	}
}
