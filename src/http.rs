//! Transport primitives for API calls.
//!
//! [`ApiHttpClient`] is the crate's only dependency on an HTTP stack: it performs exactly one
//! exchange and reports failures as a [`TransportFailure`] so the executor can tell timeouts
//! (retried) from connection-level errors (fatal). Non-success statuses are not failures at
//! this layer; they come back as an [`HttpResponse`] with [`ResponseMetadata`] attached.

// crates.io
#[cfg(feature = "reqwest")] use reqwest::header::{HeaderMap, RETRY_AFTER};
use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::BoxError};

/// Boxed future returned by [`ApiHttpClient::send`].
pub type HttpFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportFailure>> + 'a + Send>>;

/// Abstraction over HTTP transports able to execute one API exchange.
///
/// Implementations must be `Send + Sync + 'static` so executors can share them behind an
/// `Arc`, and must honor [`HttpRequest::timeout`], reporting its expiry as
/// [`TransportFailure::Timeout`].
pub trait ApiHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves with whatever status the server answered.
	fn send(&self, request: HttpRequest) -> HttpFuture<'_>;
}

/// HTTP verbs used by the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
	/// `GET`.
	Get,
	/// `POST`.
	Post,
	/// `PUT`.
	Put,
	/// `PATCH`.
	Patch,
	/// `DELETE`.
	Delete,
}
impl Method {
	/// Upper-case wire name.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Fully-resolved outbound request.
#[derive(Clone, Debug)]
pub struct HttpRequest {
	/// HTTP verb.
	pub method: Method,
	/// Absolute URL, query string included.
	pub url: Url,
	/// Header name/value pairs, sent in order.
	pub headers: Vec<(String, String)>,
	/// Serialized request body.
	pub body: Option<Vec<u8>>,
	/// Deadline for the whole exchange.
	pub timeout: Duration,
}
impl HttpRequest {
	/// First header value whose name matches case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}
}

/// Metadata captured from a response for error reporting.
///
/// Additional metadata fields may be added in future releases, so downstream code
/// should construct values using field names instead of struct update syntax.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
	/// HTTP status code returned by the server.
	pub status: u16,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}

/// Response returned by an [`ApiHttpClient`].
#[derive(Clone, Debug)]
pub struct HttpResponse {
	/// Status and hints.
	pub metadata: ResponseMetadata,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl HttpResponse {
	/// Creates a response without a Retry-After hint.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { metadata: ResponseMetadata { status, retry_after: None }, body: body.into() }
	}

	/// Attaches a Retry-After hint.
	pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
		self.metadata.retry_after = Some(retry_after);

		self
	}

	/// Status code shortcut.
	pub fn status(&self) -> u16 {
		self.metadata.status
	}

	/// Whether the status is in the 2xx range.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.metadata.status)
	}

	/// Body decoded lossily as UTF-8, for error messages.
	pub fn body_text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}

/// Failure to complete an exchange at all.
#[derive(Debug, ThisError)]
pub enum TransportFailure {
	/// The request deadline passed.
	#[error("Request timed out.")]
	Timeout(#[source] BoxError),
	/// The connection could not be established (DNS, refused, TLS).
	#[error("Connection failed.")]
	Connect(#[source] BoxError),
	/// Any other transport problem.
	#[error("Transport failed.")]
	Other(#[source] BoxError),
}
impl TransportFailure {
	/// Wraps a timeout cause.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout(Box::new(src))
	}

	/// Wraps a connection cause.
	pub fn connect(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Connect(Box::new(src))
	}

	/// Wraps any other cause.
	pub fn other(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Other(Box::new(src))
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl Debug for ReqwestHttpClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("ReqwestHttpClient(..)")
	}
}
#[cfg(feature = "reqwest")]
impl ApiHttpClient for ReqwestHttpClient {
	fn send(&self, request: HttpRequest) -> HttpFuture<'_> {
		Box::pin(async move {
			let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
				.map_err(TransportFailure::other)?;
			let mut builder = self.0.request(method, request.url).timeout(request.timeout);

			for (name, value) in &request.headers {
				builder = builder.header(name.as_str(), value.as_str());
			}
			if let Some(body) = request.body {
				builder = builder.body(body);
			}

			let response = builder.send().await.map_err(classify_reqwest_error)?;
			let status = response.status().as_u16();
			let retry_after = retry_after_header(response.headers());
			let body = response.bytes().await.map_err(classify_reqwest_error)?.to_vec();

			Ok(HttpResponse { metadata: ResponseMetadata { status, retry_after }, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn classify_reqwest_error(err: ReqwestError) -> TransportFailure {
	if err.is_timeout() {
		TransportFailure::timeout(err)
	} else if err.is_connect() {
		TransportFailure::connect(err)
	} else {
		TransportFailure::other(err)
	}
}

#[cfg(feature = "reqwest")]
fn retry_after_header(headers: &HeaderMap) -> Option<Duration> {
	parse_retry_after(headers.get(RETRY_AFTER)?.to_str().ok()?)
}

/// Parses a `Retry-After` value given as delta-seconds or an RFC 2822 date.
///
/// Dates in the past yield `None`.
pub fn parse_retry_after(raw: &str) -> Option<Duration> {
	let raw = raw.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::from_secs(secs));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Duration::try_from(delta).ok();
		}
	}

	None
}
