//! Rate-limited, retrying request pipeline.
//!
//! [`RequestExecutor::execute`] gates each call on the sliding window, injects the mandatory
//! headers, and loops over attempts. Timeouts and 408/429/5xx statuses sleep
//! `backoff_factor * 2^attempt` seconds and try again while the budget lasts; connection-level
//! failures, other statuses, and malformed success bodies end the call immediately. Only a
//! successful call leaves a timestamp in the window.
//!
//! Calls on one executor are serialized: an async dispatch guard is held from admission to
//! the final outcome, so two calls can never both observe spare capacity.

// self
use crate::{
	_prelude::*,
	clock::{Clock, SystemClock},
	config::{ClientConfig, RetryPolicy},
	error::{ConfigError, HttpError, TransportError},
	http::{ApiHttpClient, HttpRequest, HttpResponse, Method, TransportFailure},
	obs::{self, CallKind, CallOutcome, CallSpan, ExecutorMetrics},
	rate_limit::SlidingWindow,
	token::TokenSecret,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Executor specialized for the crate's default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestExecutor = RequestExecutor<ReqwestHttpClient>;

/// One logical API call: endpoint, verb, and optional headers, body, and query.
#[derive(Clone, Debug)]
pub struct ApiCall {
	/// Path appended to the base URL, e.g. `/list/123/task`.
	pub endpoint: String,
	/// HTTP verb.
	pub method: Method,
	/// Caller headers; `Authorization` and `Content-Type` are always overridden.
	pub headers: Vec<(String, String)>,
	/// JSON body.
	pub body: Option<Value>,
	/// Query parameters.
	pub query: Vec<(String, String)>,
}
impl ApiCall {
	/// Creates a call without headers, body, or query.
	pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
		Self {
			endpoint: endpoint.into(),
			method,
			headers: Vec::new(),
			body: None,
			query: Vec::new(),
		}
	}

	/// Shorthand for a `GET` call.
	pub fn get(endpoint: impl Into<String>) -> Self {
		Self::new(Method::Get, endpoint)
	}

	/// Shorthand for a `POST` call.
	pub fn post(endpoint: impl Into<String>) -> Self {
		Self::new(Method::Post, endpoint)
	}

	/// Adds a caller header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Sets the JSON body.
	pub fn with_body(mut self, body: Value) -> Self {
		self.body = Some(body);

		self
	}

	/// Adds a query parameter.
	pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((name.into(), value.into()));

		self
	}
}

/// Shared request pipeline: admission window, header injection, retries, classification.
pub struct RequestExecutor<C>
where
	C: ?Sized + ApiHttpClient,
{
	http_client: Arc<C>,
	clock: Arc<dyn Clock>,
	base_url: Url,
	token: TokenSecret,
	rate_limit: usize,
	retry: RetryPolicy,
	timeout: Duration,
	window: Mutex<SlidingWindow>,
	dispatch: AsyncMutex<()>,
	metrics: ExecutorMetrics,
}
impl<C> RequestExecutor<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates an executor over a caller-provided transport and the system clock.
	pub fn with_http_client(
		config: ClientConfig,
		http_client: impl Into<Arc<C>>,
	) -> Result<Self> {
		Self::with_parts(config, http_client, Arc::new(SystemClock))
	}

	/// Creates an executor over a caller-provided transport and clock.
	pub fn with_parts(
		config: ClientConfig,
		http_client: impl Into<Arc<C>>,
		clock: Arc<dyn Clock>,
	) -> Result<Self> {
		let base_url = config.validate()?;

		Ok(Self {
			http_client: http_client.into(),
			clock,
			base_url,
			token: config.token,
			rate_limit: config.rate_limit,
			retry: config.retry,
			timeout: config.timeout,
			window: Mutex::new(SlidingWindow::new(config.rate_limit)),
			dispatch: AsyncMutex::new(()),
			metrics: ExecutorMetrics::default(),
		})
	}

	/// Runs one call through the pipeline and returns the parsed JSON body.
	pub async fn execute(&self, call: ApiCall) -> Result<Value> {
		const KIND: CallKind = CallKind::Request;

		let span = CallSpan::new(KIND, "execute");
		let result = span
			.instrument(async {
				let _dispatch = self.dispatch.lock().await;

				self.admit(&call.endpoint)?;
				obs::log_intent(KIND, call.method.as_str(), &call.endpoint);

				let request = self.build_request(&call)?;

				self.send_and_decode(&call.endpoint, request).await
			})
			.await;

		match &result {
			Ok(_) => self.metrics.record(CallOutcome::Success),
			Err(Error::RateLimitExceeded { .. }) => self.metrics.record(CallOutcome::Rejected),
			Err(err) => {
				obs::log_failure(KIND, err);
				self.metrics.record(CallOutcome::Failure);
			},
		}

		result
	}

	/// Window entries currently retained.
	pub fn window_len(&self) -> usize {
		self.window.lock().len()
	}

	/// In-process counters for this executor.
	pub fn metrics(&self) -> &ExecutorMetrics {
		&self.metrics
	}

	/// Parsed base URL.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	fn admit(&self, endpoint: &str) -> Result<()> {
		let now = self.clock.now();
		let mut window = self.window.lock();

		if window.admit(now) {
			return Ok(());
		}

		let retry_after = window.retry_after(now);

		obs::log_rejected(endpoint, self.rate_limit, retry_after);

		Err(Error::RateLimitExceeded {
			endpoint: endpoint.to_owned(),
			limit: self.rate_limit,
			retry_after,
		})
	}

	fn build_request(&self, call: &ApiCall) -> Result<HttpRequest> {
		let url = endpoint_url(&self.base_url, &call.endpoint, &call.query)?;
		let mut headers: Vec<(String, String)> = call
			.headers
			.iter()
			.filter(|(name, _)| {
				!name.eq_ignore_ascii_case("authorization")
					&& !name.eq_ignore_ascii_case("content-type")
			})
			.cloned()
			.collect();

		headers.push(("Authorization".into(), self.token.expose().to_owned()));
		headers.push(("Content-Type".into(), "application/json".into()));

		let body = call
			.body
			.as_ref()
			.map(serde_json::to_vec)
			.transpose()
			.map_err(ConfigError::from)?;

		Ok(HttpRequest { method: call.method, url, headers, body, timeout: self.timeout })
	}

	async fn send_and_decode(&self, endpoint: &str, request: HttpRequest) -> Result<Value> {
		let (response, attempts) = send_with_retry(
			self.http_client.as_ref(),
			self.clock.as_ref(),
			self.retry,
			CallKind::Request,
			endpoint,
			request,
			|outcome| self.metrics.record(outcome),
		)
		.await?;
		let value = decode_body(endpoint, attempts, &response)?;

		self.window.lock().record(self.clock.now());

		Ok(value)
	}
}
#[cfg(feature = "reqwest")]
impl RequestExecutor<ReqwestHttpClient> {
	/// Creates an executor with its own reqwest transport and the system clock.
	pub fn new(config: ClientConfig) -> Result<Self> {
		Self::with_http_client(config, ReqwestHttpClient::default())
	}
}
impl<C> Debug for RequestExecutor<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestExecutor")
			.field("base_url", &self.base_url.as_str())
			.field("token", &self.token)
			.field("rate_limit", &self.rate_limit)
			.field("retry", &self.retry)
			.field("timeout", &self.timeout)
			.finish()
	}
}

/// Sends `request` until it returns a 2xx response or retrying stops.
///
/// The success response comes back with the number of attempts it took.
/// Timeouts and retryable statuses sleep on `clock` between attempts while `retry` has budget
/// left; connection-level failures return at once. `observe` sees every attempt and retry.
pub(crate) async fn send_with_retry<C, F>(
	http_client: &C,
	clock: &dyn Clock,
	retry: RetryPolicy,
	kind: CallKind,
	endpoint: &str,
	request: HttpRequest,
	observe: F,
) -> Result<(HttpResponse, u32)>
where
	C: ?Sized + ApiHttpClient,
	F: Fn(CallOutcome),
{
	let mut attempt = 0_u32;

	loop {
		observe(CallOutcome::Attempt);

		let failure = match http_client.send(request.clone()).await {
			Ok(response) if response.is_success() => return Ok((response, attempt + 1)),
			Ok(response) => HttpError::Status {
				status: response.status(),
				body: response.body_text(),
				retry_after: response.metadata.retry_after,
			},
			Err(TransportFailure::Timeout(source)) => HttpError::Timeout { source },
			Err(TransportFailure::Connect(source) | TransportFailure::Other(source)) =>
				return Err(Error::Transport {
					endpoint: endpoint.to_owned(),
					attempts: attempt + 1,
					source: TransportError::Network { source },
				}),
		};

		if failure.is_retryable() && retry.has_remaining(attempt) {
			let delay = retry.delay_for(attempt);

			obs::log_retry(kind, endpoint, attempt, delay, &failure);
			observe(CallOutcome::Retry);
			clock.sleep(delay).await;

			attempt += 1;

			continue;
		}

		return Err(Error::Http {
			endpoint: endpoint.to_owned(),
			attempts: attempt + 1,
			source: failure,
		});
	}
}

/// Appends `endpoint` to the base path and encodes `query`.
pub(crate) fn endpoint_url(base: &Url, endpoint: &str, query: &[(String, String)]) -> Result<Url> {
	let base = base.as_str().trim_end_matches('/');
	let raw = if endpoint.starts_with('/') {
		format!("{base}{endpoint}")
	} else {
		format!("{base}/{endpoint}")
	};
	let mut url = Url::parse(&raw).map_err(|e| ConfigError::invalid_url(&raw, e))?;

	if !query.is_empty() {
		let mut pairs = url.query_pairs_mut();

		for (name, value) in query {
			pairs.append_pair(name, value);
		}
	}

	Ok(url)
}

/// Parses a success body as JSON.
pub(crate) fn decode_body(endpoint: &str, attempts: u32, response: &HttpResponse) -> Result<Value> {
	serde_json::from_slice(&response.body).map_err(|source| Error::Decode {
		endpoint: endpoint.to_owned(),
		attempts,
		status: response.status(),
		source,
	})
}
