//! Client-level error types shared across the executor, resource facade, and token flow.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error used for opaque transport causes.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
///
/// Callers match on the variant to pick a recovery strategy: back off on
/// [`Error::RateLimitExceeded`], inspect [`HttpError`] for exhausted retries, and treat the
/// remaining variants as terminal.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Token storage failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::token::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token acquisition failed.
	#[error(transparent)]
	TokenExchange(#[from] TokenExchangeError),

	/// The sliding request window is full; no request was sent.
	#[error("Rate limit of {limit} requests per minute exceeded for `{endpoint}`.")]
	RateLimitExceeded {
		/// Endpoint the rejected call targeted.
		endpoint: String,
		/// Configured request limit per window.
		limit: usize,
		/// Time until the oldest recorded request leaves the window.
		retry_after: Duration,
	},
	/// HTTP status or timeout failure, surfaced after retries stopped.
	#[error("Request to `{endpoint}` failed after {attempts} attempt(s).")]
	Http {
		/// Endpoint of the failing call.
		endpoint: String,
		/// Number of attempts made, including the last one.
		attempts: u32,
		/// Final failure.
		#[source]
		source: HttpError,
	},
	/// Success response whose body was not valid JSON.
	#[error("Response from `{endpoint}` (HTTP {status}) is not valid JSON.")]
	Decode {
		/// Endpoint of the failing call.
		endpoint: String,
		/// Number of attempts made, including the one that returned the body.
		attempts: u32,
		/// HTTP status of the malformed response.
		status: u16,
		/// JSON syntax failure.
		#[source]
		source: serde_json::Error,
	},
	/// Connection-level failure (DNS, refused connection, TLS).
	#[error("Transport failure while calling `{endpoint}` on attempt {attempts}.")]
	Transport {
		/// Endpoint of the failing call.
		endpoint: String,
		/// Number of attempts made, including the failing one.
		attempts: u32,
		/// Underlying transport failure.
		#[source]
		source: TransportError,
	},
}
impl Error {
	/// Endpoint associated with the failure, when the failure came from a pipeline call.
	pub fn endpoint(&self) -> Option<&str> {
		match self {
			Self::RateLimitExceeded { endpoint, .. }
			| Self::Http { endpoint, .. }
			| Self::Decode { endpoint, .. }
			| Self::Transport { endpoint, .. } => Some(endpoint),
			_ => None,
		}
	}

	/// Number of attempts made before the failure surfaced.
	///
	/// Rate-limit rejections report zero attempts since nothing was sent.
	pub fn attempts(&self) -> Option<u32> {
		match self {
			Self::RateLimitExceeded { .. } => Some(0),
			Self::Http { attempts, .. }
			| Self::Decode { attempts, .. }
			| Self::Transport { attempts, .. } => Some(*attempts),
			_ => None,
		}
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A configured or derived URL failed to parse.
	#[error("URL `{value}` is invalid.")]
	InvalidUrl {
		/// Offending URL text.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	Body(#[from] serde_json::Error),
	/// Rate limit must admit at least one request per window.
	#[error("Rate limit must be at least 1 request per window.")]
	ZeroRateLimit,
	/// Retry budget must allow at least one attempt.
	#[error("Retry attempts must be at least 1.")]
	ZeroRetries,
	/// Backoff multiplier must be finite and non-negative.
	#[error("Backoff factor {factor} must be finite and non-negative.")]
	InvalidBackoff {
		/// Offending multiplier.
		factor: f64,
	},
	/// A required environment variable is absent or blank.
	#[error("Environment variable `{name}` is missing or empty.")]
	MissingEnv {
		/// Variable name.
		name: &'static str,
	},
	/// Resource identifier failed validation.
	#[error(transparent)]
	InvalidIdentifier(#[from] crate::id::IdentifierError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}

	pub(crate) fn invalid_url(value: impl Into<String>, source: url::ParseError) -> Self {
		Self::InvalidUrl { value: value.into(), source }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// HTTP status or timeout failures; see [`HttpError::is_retryable`].
#[derive(Debug, ThisError)]
pub enum HttpError {
	/// Upstream answered with a non-success status.
	#[error("Upstream returned HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Raw response body, lossily decoded.
		body: String,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// The call exceeded its timeout.
	#[error("Request timed out.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
}
impl HttpError {
	/// Whether the failure is transient under the client's retry policy.
	///
	/// Timeouts, 408, 429, and 5xx statuses are retried; every other status fails fast.
	pub fn is_retryable(&self) -> bool {
		match self {
			Self::Timeout { .. } => true,
			Self::Status { status, .. } => is_retryable_status(*status),
		}
	}

	/// HTTP status code, when the failure carried one.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			Self::Timeout { .. } => None,
		}
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while contacting the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while contacting the API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}

/// Failures of the authorize-and-exchange flow.
#[derive(Debug, ThisError)]
pub enum TokenExchangeError {
	/// The pasted callback URL could not be parsed.
	#[error("Callback URL `{value}` is invalid.")]
	InvalidCallback {
		/// Callback text supplied by the operator.
		value: String,
	},
	/// The callback URL carried no `code` parameter.
	#[error("Callback URL does not contain an authorization code.")]
	MissingCode,
	/// Reading the operator's input failed.
	#[error("Failed to read the callback URL from the operator.")]
	Prompt(#[source] std::io::Error),
	/// The token endpoint kept failing until retries ran out.
	#[error("Token endpoint request failed.")]
	Request(#[source] Box<Error>),
	/// The token endpoint answered with a body that is not the expected JSON shape.
	#[error("Token endpoint returned malformed JSON.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// The token endpoint answered without an access token.
	#[error("Token endpoint response did not include an access token.")]
	MissingAccessToken,
}

pub(crate) fn is_retryable_status(status: u16) -> bool {
	matches!(status, 408 | 429) || (500..=599).contains(&status)
}
