//! Browser capabilities the flow depends on: the cookie jar and top-level navigation.
//!
//! Both are injected so the flow never reaches for ambient globals. [`memory`] provides
//! in-process fakes; the `web` feature adds `web-sys` backed implementations for wasm32 hosts.

pub mod memory;
#[cfg(feature = "web")] pub mod web;

pub use memory::*;
#[cfg(feature = "web")] pub use web::*;

// self
use crate::{_prelude::*, token::TokenSecret};

/// Failures raised by browser capabilities.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum BrowserError {
	/// The host does not expose the capability (no window, no document).
	#[error("Browser capability `{capability}` is unavailable.")]
	Unavailable {
		/// Capability name.
		capability: &'static str,
	},
	/// The host rejected the operation.
	#[error("Browser rejected the operation: {message}.")]
	Rejected {
		/// Host-provided description.
		message: String,
	},
}

/// Cookie written once the callback completes.
#[derive(Clone, PartialEq, Eq)]
pub struct Cookie {
	/// Cookie name.
	pub name: String,
	/// Cookie value, the raw ID token.
	pub value: TokenSecret,
	/// Path the cookie is scoped to.
	pub path: String,
}
impl Cookie {
	/// Serializes the cookie the way `document.cookie` expects it.
	pub fn header_value(&self) -> String {
		format!("{}={}; path={}", self.name, self.value.expose(), self.path)
	}
}
impl Debug for Cookie {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Cookie")
			.field("name", &self.name)
			.field("value", &self.value)
			.field("path", &self.path)
			.finish()
	}
}

/// Writes cookies for the application origin.
pub trait CookieJar
where
	Self: Send + Sync,
{
	/// Stores `cookie`, replacing any cookie with the same name and path.
	fn set(&self, cookie: &Cookie) -> Result<(), BrowserError>;
}

/// Reads and replaces the top-level location.
pub trait Navigator
where
	Self: Send + Sync,
{
	/// Returns the current page URL.
	fn current_url(&self) -> Result<Url, BrowserError>;

	/// Performs a full-page navigation to `target`, replacing the current history entry.
	///
	/// `target` is either an absolute URL or a path on the current origin.
	fn replace(&self, target: &str) -> Result<(), BrowserError>;
}
