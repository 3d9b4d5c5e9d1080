//! Bearer token acquisition: cached secrets, durable stores, and the OAuth exchange.

pub mod secret;
pub mod store;

mod manager;
mod supplier;

pub use manager::*;
pub use secret::TokenSecret;
pub use store::{FileTokenStore, MemoryTokenStore, StoreError, StoreFuture, TokenStore};
pub use supplier::*;

// self
use crate::_prelude::*;

/// Boxed future returned by [`TokenProvider::token`].
pub type TokenFuture<'a> = Pin<Box<dyn Future<Output = Result<TokenSecret>> + 'a + Send>>;

/// Anything able to hand out the bearer token used for API calls.
pub trait TokenProvider
where
	Self: Send + Sync,
{
	/// Returns the token, acquiring it first when necessary.
	fn token(&self) -> TokenFuture<'_>;
}

/// Provider that always yields the same, already known token.
#[derive(Clone, Debug)]
pub struct StaticTokenProvider(TokenSecret);
impl StaticTokenProvider {
	/// Wraps a known token.
	pub fn new(token: impl Into<TokenSecret>) -> Self {
		Self(token.into())
	}
}
impl TokenProvider for StaticTokenProvider {
	fn token(&self) -> TokenFuture<'_> {
		let token = self.0.clone();

		Box::pin(async move { Ok(token) })
	}
}
