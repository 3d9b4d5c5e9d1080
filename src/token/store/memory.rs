//! In-process [`TokenStore`] for tests and short-lived tools.

// self
use crate::{
	_prelude::*,
	token::{
		TokenSecret,
		store::{StoreFuture, TokenStore},
	},
};

/// Keeps the token in memory; clones share the same slot.
#[derive(Clone, Debug, Default)]
pub struct MemoryTokenStore(Arc<Mutex<Option<TokenSecret>>>);
impl MemoryTokenStore {
	/// Creates a store pre-seeded with `token`.
	pub fn with_token(token: impl Into<TokenSecret>) -> Self {
		Self(Arc::new(Mutex::new(Some(token.into()))))
	}

	/// Current value without going through the async contract.
	pub fn snapshot(&self) -> Option<TokenSecret> {
		self.0.lock().clone()
	}
}
impl TokenStore for MemoryTokenStore {
	fn load(&self) -> StoreFuture<'_, Option<TokenSecret>> {
		let value = self.snapshot();

		Box::pin(async move { Ok(value) })
	}

	fn save<'a>(&'a self, token: &'a TokenSecret) -> StoreFuture<'a, ()> {
		*self.0.lock() = Some(token.clone());

		Box::pin(async { Ok(()) })
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		self.0.lock().take();

		Box::pin(async { Ok(()) })
	}
}
