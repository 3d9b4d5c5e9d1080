//! Client, retry, and OAuth configuration.

// self
use crate::{_prelude::*, error::ConfigError, token::TokenSecret};

/// Default ClickUp REST base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.clickup.com/api/v2";
/// Default ClickUp authorization page.
pub const DEFAULT_AUTHORIZATION_ENDPOINT: &str = "https://app.clickup.com/api";
/// Default ClickUp token exchange endpoint.
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://api.clickup.com/api/v2/oauth/token";
/// Redirect URI registered for the default OAuth application.
pub const DEFAULT_REDIRECT_URI: &str = "localhost";

/// Bounded retry schedule shared by the request executor and the token exchange.
///
/// Attempt `i` (0-indexed) that fails transiently is followed by a sleep of
/// `backoff_factor * 2^i` seconds, as long as another attempt remains.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
	/// Total attempts, including the first one.
	pub attempts: u32,
	/// Backoff multiplier in seconds.
	pub backoff_factor: f64,
}
impl RetryPolicy {
	/// Default total attempts.
	pub const DEFAULT_ATTEMPTS: u32 = 3;
	/// Default backoff multiplier in seconds.
	pub const DEFAULT_BACKOFF_FACTOR: f64 = 1.5;

	/// Creates a policy with explicit limits.
	pub const fn new(attempts: u32, backoff_factor: f64) -> Self {
		Self { attempts, backoff_factor }
	}

	/// Delay to wait after the failed attempt `attempt` (0-indexed).
	pub fn delay_for(&self, attempt: u32) -> Duration {
		let exp = attempt.min(30) as i32;
		let secs = self.backoff_factor * 2_f64.powi(exp);

		Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
	}

	/// Whether another attempt is allowed after the 0-indexed `attempt` failed.
	pub fn has_remaining(&self, attempt: u32) -> bool {
		attempt.saturating_add(1) < self.attempts
	}

	/// Checks the policy invariants.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.attempts == 0 {
			return Err(ConfigError::ZeroRetries);
		}
		if !self.backoff_factor.is_finite() || self.backoff_factor < 0.0 {
			return Err(ConfigError::InvalidBackoff { factor: self.backoff_factor });
		}

		Ok(())
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self::new(Self::DEFAULT_ATTEMPTS, Self::DEFAULT_BACKOFF_FACTOR)
	}
}

/// Immutable settings for one [`RequestExecutor`](crate::executor::RequestExecutor).
#[derive(Clone, Debug)]
pub struct ClientConfig {
	/// API base URL; endpoints are appended verbatim.
	pub base_url: String,
	/// Bearer token sent as the raw `Authorization` header value.
	pub token: TokenSecret,
	/// Successful requests allowed per sliding window.
	pub rate_limit: usize,
	/// Retry schedule for transient failures.
	pub retry: RetryPolicy,
	/// Per-attempt HTTP timeout.
	pub timeout: Duration,
}
impl ClientConfig {
	/// Default successful requests per minute.
	pub const DEFAULT_RATE_LIMIT: usize = 100;
	/// Default per-attempt HTTP timeout.
	pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

	/// Creates a configuration for the default ClickUp base URL.
	pub fn new(token: impl Into<TokenSecret>) -> Self {
		Self {
			base_url: DEFAULT_BASE_URL.into(),
			token: token.into(),
			rate_limit: Self::DEFAULT_RATE_LIMIT,
			retry: RetryPolicy::default(),
			timeout: Self::DEFAULT_TIMEOUT,
		}
	}

	/// Overrides the base URL.
	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into();

		self
	}

	/// Overrides the request limit per window.
	pub fn with_rate_limit(mut self, limit: usize) -> Self {
		self.rate_limit = limit;

		self
	}

	/// Overrides the total attempt count.
	pub fn with_retries(mut self, attempts: u32) -> Self {
		self.retry.attempts = attempts;

		self
	}

	/// Overrides the backoff multiplier (seconds).
	pub fn with_backoff_factor(mut self, factor: f64) -> Self {
		self.retry.backoff_factor = factor;

		self
	}

	/// Overrides the per-attempt HTTP timeout.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Checks every invariant and returns the parsed base URL.
	pub fn validate(&self) -> Result<Url, ConfigError> {
		if self.rate_limit == 0 {
			return Err(ConfigError::ZeroRateLimit);
		}

		self.retry.validate()?;

		Url::parse(self.base_url.trim_end_matches('/'))
			.map_err(|e| ConfigError::invalid_url(&self.base_url, e))
	}
}

/// OAuth application settings for the authorize-and-exchange flow.
#[derive(Clone, Debug)]
pub struct OAuthConfig {
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: TokenSecret,
	/// Redirect URI registered with the application, sent verbatim.
	pub redirect_uri: String,
	/// Browser-facing authorization page.
	pub authorization_endpoint: String,
	/// Code-for-token exchange endpoint.
	pub token_endpoint: String,
	/// Retry schedule for the exchange call.
	pub retry: RetryPolicy,
	/// Per-attempt HTTP timeout for the exchange call.
	pub timeout: Duration,
}
impl OAuthConfig {
	/// Default exchange timeout.
	pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
	/// Environment variable holding the client identifier.
	pub const ENV_CLIENT_ID: &'static str = "CLICKUP_CLIENT_ID";
	/// Environment variable holding the client secret.
	pub const ENV_CLIENT_SECRET: &'static str = "CLICKUP_CLIENT_SECRET";
	/// Optional environment variable overriding the redirect URI.
	pub const ENV_REDIRECT_URI: &'static str = "CLICKUP_REDIRECT_URI";

	/// Creates a configuration targeting ClickUp's public endpoints.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<TokenSecret>) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: client_secret.into(),
			redirect_uri: DEFAULT_REDIRECT_URI.into(),
			authorization_endpoint: DEFAULT_AUTHORIZATION_ENDPOINT.into(),
			token_endpoint: DEFAULT_TOKEN_ENDPOINT.into(),
			retry: RetryPolicy::default(),
			timeout: Self::DEFAULT_TIMEOUT,
		}
	}

	/// Reads `CLICKUP_CLIENT_ID`, `CLICKUP_CLIENT_SECRET`, and optionally
	/// `CLICKUP_REDIRECT_URI` from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Same as [`OAuthConfig::from_env`] with a caller-provided variable lookup.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let required = |name: &'static str| {
			lookup(name)
				.map(|value| value.trim().to_owned())
				.filter(|value| !value.is_empty())
				.ok_or(ConfigError::MissingEnv { name })
		};
		let mut config = Self::new(required(Self::ENV_CLIENT_ID)?, required(Self::ENV_CLIENT_SECRET)?);

		if let Some(redirect) =
			lookup(Self::ENV_REDIRECT_URI).filter(|value| !value.trim().is_empty())
		{
			config.redirect_uri = redirect.trim().to_owned();
		}

		Ok(config)
	}

	/// Overrides the redirect URI.
	pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
		self.redirect_uri = redirect_uri.into();

		self
	}

	/// Overrides the authorization page URL.
	pub fn with_authorization_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.authorization_endpoint = endpoint.into();

		self
	}

	/// Overrides the token exchange URL.
	pub fn with_token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.token_endpoint = endpoint.into();

		self
	}

	/// Overrides the exchange retry schedule.
	pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
		self.retry = retry;

		self
	}

	/// Overrides the exchange timeout.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Builds `{authorization_endpoint}?client_id=..&redirect_uri=..`.
	pub fn authorization_url(&self) -> Result<Url, ConfigError> {
		let mut url = Url::parse(&self.authorization_endpoint)
			.map_err(|e| ConfigError::invalid_url(&self.authorization_endpoint, e))?;

		url.query_pairs_mut()
			.append_pair("client_id", &self.client_id)
			.append_pair("redirect_uri", &self.redirect_uri);

		Ok(url)
	}

	/// Parses the token exchange endpoint.
	pub fn token_url(&self) -> Result<Url, ConfigError> {
		Url::parse(&self.token_endpoint)
			.map_err(|e| ConfigError::invalid_url(&self.token_endpoint, e))
	}
}
