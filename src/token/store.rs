//! Storage contracts and built-in backends for the cached bearer token.

pub mod file;
pub mod memory;

pub use file::FileTokenStore;
pub use memory::MemoryTokenStore;

// self
use crate::{_prelude::*, token::TokenSecret};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Durable home for the single bearer token a client runs with.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Returns the cached token, or `None` when nothing usable is stored.
	fn load(&self) -> StoreFuture<'_, Option<TokenSecret>>;

	/// Persists `token`, replacing any previous value.
	fn save<'a>(&'a self, token: &'a TokenSecret) -> StoreFuture<'a, ()>;

	/// Removes the cached token so the next lookup misses.
	fn clear(&self) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum StoreError {
	/// Backend-level failure for the storage medium.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
