//! `web-sys` backed capabilities for wasm32 hosts.
//!
//! The handles are zero-sized; each call looks up `window` again, so they stay `Send + Sync`
//! even though the underlying JavaScript objects are not.

// crates.io
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{HtmlDocument, Storage, Window};
// self
use crate::{
	_prelude::*,
	browser::{BrowserError, Cookie, CookieJar, Navigator},
	store::{SessionStorage, StoreError},
};

fn window() -> Result<Window, BrowserError> {
	web_sys::window().ok_or(BrowserError::Unavailable { capability: "window" })
}

fn describe(value: JsValue) -> String {
	value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

fn rejected(value: JsValue) -> BrowserError {
	BrowserError::Rejected { message: describe(value) }
}

/// `window.sessionStorage`.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebSessionStorage;
impl WebSessionStorage {
	fn storage() -> Result<Storage, StoreError> {
		let backend = |message: String| StoreError::Backend { message };

		window()
			.map_err(|e| backend(e.to_string()))?
			.session_storage()
			.map_err(|e| backend(describe(e)))?
			.ok_or_else(|| backend("sessionStorage is unavailable".into()))
	}
}
impl SessionStorage for WebSessionStorage {
	fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
		Self::storage()?.get_item(key).map_err(|e| StoreError::Backend { message: describe(e) })
	}

	fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
		Self::storage()?
			.set_item(key, value)
			.map_err(|e| StoreError::Backend { message: describe(e) })
	}

	fn remove(&self, key: &str) -> Result<(), StoreError> {
		Self::storage()?.remove_item(key).map_err(|e| StoreError::Backend { message: describe(e) })
	}
}

/// `document.cookie`.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebCookieJar;
impl CookieJar for WebCookieJar {
	fn set(&self, cookie: &Cookie) -> Result<(), BrowserError> {
		let document = window()?
			.document()
			.ok_or(BrowserError::Unavailable { capability: "document" })?
			.dyn_into::<HtmlDocument>()
			.map_err(|_| BrowserError::Unavailable { capability: "document.cookie" })?;

		document.set_cookie(&cookie.header_value()).map_err(rejected)
	}
}

/// `window.location`.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebNavigator;
impl Navigator for WebNavigator {
	fn current_url(&self) -> Result<Url, BrowserError> {
		let href = window()?.location().href().map_err(rejected)?;

		Url::parse(&href).map_err(|e| BrowserError::Rejected { message: e.to_string() })
	}

	fn replace(&self, target: &str) -> Result<(), BrowserError> {
		window()?.location().replace(target).map_err(rejected)
	}
}
