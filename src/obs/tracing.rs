// self
use crate::{_prelude::*, obs::CallKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// A span builder used by pipeline calls.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a new span tagged with the provided call kind + stage.
	pub fn new(kind: CallKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("clickwrap.call", call = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs the intent to send a request.
pub fn log_intent(kind: CallKind, method: &str, endpoint: &str) {
	#[cfg(feature = "tracing")]
	tracing::debug!(call = kind.as_str(), method, endpoint, "sending request");
	#[cfg(not(feature = "tracing"))]
	let _ = (kind, method, endpoint);
}

/// Logs a scheduled retry and its delay.
pub fn log_retry(
	kind: CallKind,
	endpoint: &str,
	attempt: u32,
	delay: Duration,
	cause: &dyn Display,
) {
	#[cfg(feature = "tracing")]
	tracing::debug!(
		call = kind.as_str(),
		endpoint,
		attempt,
		delay_secs = delay.as_secs_f64(),
		%cause,
		"retrying after transient failure"
	);
	#[cfg(not(feature = "tracing"))]
	let _ = (kind, endpoint, attempt, delay, cause);
}

/// Logs a rate-limit rejection.
pub fn log_rejected(endpoint: &str, limit: usize, retry_after: Duration) {
	#[cfg(feature = "tracing")]
	tracing::warn!(
		endpoint,
		limit,
		retry_after_secs = retry_after.as_secs_f64(),
		"request window is full"
	);
	#[cfg(not(feature = "tracing"))]
	let _ = (endpoint, limit, retry_after);
}

/// Logs a token store read failure that is being treated as a cache miss.
pub fn log_store_fallback(error: &dyn Display) {
	#[cfg(feature = "tracing")]
	tracing::warn!(error = %error, "token store unreadable, falling back to exchange");
	#[cfg(not(feature = "tracing"))]
	let _ = error;
}

/// Logs where a bearer token came from (`memory`, `store`, or `exchange`).
pub fn log_token_source(source: &'static str) {
	#[cfg(feature = "tracing")]
	tracing::debug!(source, "bearer token resolved");
	#[cfg(not(feature = "tracing"))]
	let _ = source;
}

/// Logs a failure surfaced to the caller.
pub fn log_failure(kind: CallKind, error: &Error) {
	#[cfg(feature = "tracing")]
	tracing::error!(call = kind.as_str(), error = %error, "call failed");
	#[cfg(not(feature = "tracing"))]
	let _ = (kind, error);
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = CallSpan::new(CallKind::Request, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}

	#[test]
	fn log_helpers_accept_every_event() {
		let err = Error::RateLimitExceeded {
			endpoint: "/space/1/folder".into(),
			limit: 1,
			retry_after: Duration::from_secs(1),
		};

		log_intent(CallKind::Request, "POST", "/space/1/folder");
		log_retry(CallKind::TokenExchange, "/oauth/token", 0, Duration::from_millis(1500), &"503");
		log_rejected("/space/1/folder", 1, Duration::from_secs(1));
		log_store_fallback(&"permission denied");
		log_token_source("store");
		log_failure(CallKind::Request, &err);
	}
}
