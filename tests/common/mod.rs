//! Scripted transport shared by the integration tests.

#![allow(dead_code)]

// std
use std::{
	collections::VecDeque,
	error::Error as StdError,
	fmt::{Display, Formatter, Result as FmtResult},
	sync::Arc,
};
// crates.io
use parking_lot::Mutex;
// self
use clickwrap::http::{ApiHttpClient, HttpFuture, HttpRequest, HttpResponse, TransportFailure};

/// One canned outcome for [`ScriptedHttpClient`].
#[derive(Clone, Debug)]
pub enum Scripted {
	Respond(u16, &'static str),
	Timeout,
	Connect,
}

#[derive(Debug)]
pub struct FakeFailure(pub &'static str);
impl Display for FakeFailure {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.0)
	}
}
impl StdError for FakeFailure {}

/// Replays scripted outcomes in order and records every request it sees.
///
/// Each exchange yields to the runtime once before answering, so concurrent callers interleave.
/// Once the script runs out, every further exchange answers `200 {}`.
#[derive(Clone, Debug, Default)]
pub struct ScriptedHttpClient {
	script: Arc<Mutex<VecDeque<Scripted>>>,
	requests: Arc<Mutex<Vec<HttpRequest>>>,
}
impl ScriptedHttpClient {
	pub fn new(script: impl IntoIterator<Item = Scripted>) -> Self {
		Self {
			script: Arc::new(Mutex::new(script.into_iter().collect())),
			requests: Default::default(),
		}
	}

	pub fn requests(&self) -> Vec<HttpRequest> {
		self.requests.lock().clone()
	}

	pub fn calls(&self) -> usize {
		self.requests.lock().len()
	}
}
impl ApiHttpClient for ScriptedHttpClient {
	fn send(&self, request: HttpRequest) -> HttpFuture<'_> {
		self.requests.lock().push(request);

		let next = self.script.lock().pop_front();

		Box::pin(async move {
			tokio::task::yield_now().await;

			match next {
				Some(Scripted::Respond(status, body)) => Ok(HttpResponse::new(status, body)),
				Some(Scripted::Timeout) =>
					Err(TransportFailure::timeout(FakeFailure("Scripted timeout."))),
				Some(Scripted::Connect) =>
					Err(TransportFailure::connect(FakeFailure("Scripted connection refusal."))),
				None => Ok(HttpResponse::new(200, "{}")),
			}
		})
	}
}
