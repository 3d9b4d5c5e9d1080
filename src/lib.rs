//! Rate-limited, retrying ClickUp API client with OAuth token caching.
//!
//! Every outbound call flows through one [`executor::RequestExecutor`]: a sliding one-minute
//! admission window, exponential-backoff retries for transient failures, and a tagged
//! [`error::Error`] for everything else. [`resource::ClickUpApi`] shapes the create-resource
//! payloads on top of it, and [`token::OAuthTokenManager`] produces the bearer token from a
//! file cache or an interactive authorization exchange.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod clock;
pub mod config;
pub mod error;
pub mod executor;
pub mod http;
pub mod id;
pub mod obs;
pub mod rate_limit;
pub mod resource;
pub mod token;

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::{Duration, Instant},
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Map, Value};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use serde_json;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
