//! OAuth token manager: memo, durable cache, then the interactive code exchange.

// self
use crate::{
	_prelude::*,
	clock::{Clock, SystemClock},
	config::OAuthConfig,
	error::TokenExchangeError,
	executor,
	http::{ApiHttpClient, HttpRequest, Method},
	obs::{self, CallKind, CallOutcome, CallSpan},
	token::{AuthorizationCodeSupplier, TokenFuture, TokenProvider, TokenSecret, TokenStore},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Token manager specialized for the crate's default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestTokenManager = OAuthTokenManager<ReqwestHttpClient>;

#[derive(Deserialize)]
struct TokenResponse {
	#[serde(default)]
	access_token: Option<Value>,
}

/// Resolves the bearer token from memory, the token store, or a fresh authorization exchange.
///
/// Lookups are singleflighted: concurrent callers wait for the first one, so the operator is
/// asked for an authorization code at most once per manager.
pub struct OAuthTokenManager<C>
where
	C: ?Sized + ApiHttpClient,
{
	config: OAuthConfig,
	store: Arc<dyn TokenStore>,
	supplier: Arc<dyn AuthorizationCodeSupplier>,
	http_client: Arc<C>,
	clock: Arc<dyn Clock>,
	memo: Mutex<Option<TokenSecret>>,
	flight: AsyncMutex<()>,
}
impl<C> OAuthTokenManager<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates a manager over a caller-provided transport and the system clock.
	pub fn with_http_client(
		config: OAuthConfig,
		store: Arc<dyn TokenStore>,
		supplier: Arc<dyn AuthorizationCodeSupplier>,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self::with_parts(config, store, supplier, http_client, Arc::new(SystemClock))
	}

	/// Creates a manager over a caller-provided transport and clock.
	pub fn with_parts(
		config: OAuthConfig,
		store: Arc<dyn TokenStore>,
		supplier: Arc<dyn AuthorizationCodeSupplier>,
		http_client: impl Into<Arc<C>>,
		clock: Arc<dyn Clock>,
	) -> Self {
		Self {
			config,
			store,
			supplier,
			http_client: http_client.into(),
			clock,
			memo: Mutex::new(None),
			flight: AsyncMutex::new(()),
		}
	}

	/// OAuth settings in use.
	pub fn config(&self) -> &OAuthConfig {
		&self.config
	}

	/// Returns the bearer token, running the authorization exchange only when neither the
	/// process memo nor the store holds one.
	///
	/// A store that fails to load is logged and treated as empty. A newly exchanged token is
	/// saved to the store before it is memoized.
	pub async fn get_token(&self) -> Result<TokenSecret> {
		if let Some(token) = self.memoized() {
			obs::log_token_source("memory");

			return Ok(token);
		}

		let _flight = self.flight.lock().await;

		if let Some(token) = self.memoized() {
			obs::log_token_source("memory");

			return Ok(token);
		}

		match self.store.load().await {
			Ok(Some(token)) => {
				obs::log_token_source("store");
				self.memoize(&token);

				return Ok(token);
			},
			Ok(None) => (),
			Err(e) => obs::log_store_fallback(&e),
		}

		let authorization_url = self.config.authorization_url()?;
		let code = self.supplier.supply(&authorization_url).await?;
		let token = self.exchange(&code).await?;

		self.store.save(&token).await?;
		self.memoize(&token);
		obs::log_token_source("exchange");

		Ok(token)
	}

	/// Trades an authorization code for an access token.
	///
	/// The call is retried on timeouts and retryable statuses using the configured policy. The
	/// result is neither stored nor memoized.
	pub async fn exchange(&self, code: &str) -> Result<TokenSecret> {
		const KIND: CallKind = CallKind::TokenExchange;

		let span = CallSpan::new(KIND, "exchange");
		let result = span.instrument(self.exchange_once(code)).await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(e) => {
				obs::log_failure(KIND, e);
				obs::record_call_outcome(KIND, CallOutcome::Failure);
			},
		}

		result
	}

	/// Drops the memoized token and clears the store, forcing the next lookup to exchange.
	pub async fn invalidate(&self) -> Result<()> {
		let _flight = self.flight.lock().await;

		self.memo.lock().take();
		self.store.clear().await?;

		Ok(())
	}

	async fn exchange_once(&self, code: &str) -> Result<TokenSecret> {
		const KIND: CallKind = CallKind::TokenExchange;

		let endpoint = self.config.token_endpoint.as_str();
		let mut url = self.config.token_url()?;

		url.query_pairs_mut()
			.append_pair("client_id", &self.config.client_id)
			.append_pair("client_secret", self.config.client_secret.expose())
			.append_pair("code", code)
			.append_pair("redirect_uri", &self.config.redirect_uri);

		let request = HttpRequest {
			method: Method::Post,
			url,
			headers: vec![("Accept".into(), "application/json".into())],
			body: None,
			timeout: self.config.timeout,
		};

		obs::log_intent(KIND, Method::Post.as_str(), endpoint);

		let (response, _) = executor::send_with_retry(
			self.http_client.as_ref(),
			self.clock.as_ref(),
			self.config.retry,
			KIND,
			endpoint,
			request,
			|outcome| obs::record_call_outcome(KIND, outcome),
		)
		.await
		.map_err(|e| TokenExchangeError::Request(Box::new(e)))?;

		Ok(parse_token_response(&response.body)?)
	}

	fn memoized(&self) -> Option<TokenSecret> {
		self.memo.lock().clone()
	}

	fn memoize(&self, token: &TokenSecret) {
		*self.memo.lock() = Some(token.clone());
	}
}
#[cfg(feature = "reqwest")]
impl OAuthTokenManager<ReqwestHttpClient> {
	/// Creates a manager with its own reqwest transport and the system clock.
	pub fn new(
		config: OAuthConfig,
		store: Arc<dyn TokenStore>,
		supplier: Arc<dyn AuthorizationCodeSupplier>,
	) -> Self {
		Self::with_http_client(config, store, supplier, ReqwestHttpClient::default())
	}
}
impl<C> TokenProvider for OAuthTokenManager<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn token(&self) -> TokenFuture<'_> {
		Box::pin(self.get_token())
	}
}
impl<C> Debug for OAuthTokenManager<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuthTokenManager")
			.field("client_id", &self.config.client_id)
			.field("token_endpoint", &self.config.token_endpoint)
			.field("memoized", &self.memo.lock().is_some())
			.finish()
	}
}

/// Extracts a non-blank string `access_token` from the exchange response.
fn parse_token_response(body: &[u8]) -> Result<TokenSecret, TokenExchangeError> {
	let mut de = serde_json::Deserializer::from_slice(body);
	let response: TokenResponse = serde_path_to_error::deserialize(&mut de)
		.map_err(|source| TokenExchangeError::MalformedResponse { source })?;

	response
		.access_token
		.as_ref()
		.and_then(Value::as_str)
		.and_then(TokenSecret::from_cached)
		.ok_or(TokenExchangeError::MissingAccessToken)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn token_response_requires_string_access_token() {
		let token = parse_token_response(br#"{"access_token":"tok-1","token_type":"Bearer"}"#)
			.expect("Response with an access token should parse.");

		assert_eq!(token.expose(), "tok-1");

		let bodies: [&[u8]; 4] = [
			br#"{}"#,
			br#"{"access_token":null}"#,
			br#"{"access_token":42}"#,
			br#"{"access_token":"  "}"#,
		];

		for body in bodies {
			assert!(matches!(
				parse_token_response(body),
				Err(TokenExchangeError::MissingAccessToken)
			));
		}
	}

	#[test]
	fn token_response_rejects_non_json() {
		assert!(matches!(
			parse_token_response(b"<html>oops</html>"),
			Err(TokenExchangeError::MalformedResponse { .. })
		));
	}
}
