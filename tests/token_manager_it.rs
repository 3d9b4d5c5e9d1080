mod common;

// std
use std::{
	fs,
	path::PathBuf,
	sync::Arc,
	time::{Duration, Instant},
};
#[cfg(feature = "reqwest")] use std::sync::atomic::{AtomicUsize, Ordering};
// crates.io
#[cfg(feature = "reqwest")] use httpmock::prelude::*;
// self
#[cfg(feature = "reqwest")] use clickwrap::http::ReqwestHttpClient;
use clickwrap::{
	clock::ManualClock,
	config::{OAuthConfig, RetryPolicy},
	error::{Error, HttpError, TokenExchangeError},
	token::{
		AuthorizationCodeSupplier, FileTokenStore, MemoryTokenStore, OAuthTokenManager,
		StoreError, StoreFuture, TokenProvider, TokenSecret, TokenStore,
	},
	url::Url,
};
use common::{Scripted, ScriptedHttpClient};

fn temp_token_path(tag: &str) -> PathBuf {
	let dir = std::env::temp_dir().join(format!("clickwrap-it-{tag}-{}", std::process::id()));

	fs::create_dir_all(&dir).expect("Temporary test directory should be creatable.");

	let path = dir.join(FileTokenStore::DEFAULT_FILE_NAME);
	let _ = fs::remove_file(&path);

	path
}

fn fixed_code(code: &'static str) -> Arc<dyn AuthorizationCodeSupplier> {
	Arc::new(move |_: &Url| -> Result<String, TokenExchangeError> { Ok(code.into()) })
}

fn never_prompt() -> Arc<dyn AuthorizationCodeSupplier> {
	Arc::new(|_: &Url| -> Result<String, TokenExchangeError> {
		panic!("The operator must not be prompted when a token is cached.")
	})
}

/// Reads always fail; writes land in memory.
#[derive(Default)]
struct UnreadableStore(MemoryTokenStore);
impl TokenStore for UnreadableStore {
	fn load(&self) -> StoreFuture<'_, Option<TokenSecret>> {
		Box::pin(async { Err(StoreError::Backend { message: "permission denied".into() }) })
	}

	fn save<'a>(&'a self, token: &'a TokenSecret) -> StoreFuture<'a, ()> {
		self.0.save(token)
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		self.0.clear()
	}
}

#[tokio::test]
async fn cached_file_token_is_returned_without_network() {
	let path = temp_token_path("cached");

	fs::write(&path, "tok-abc\n").expect("Token fixture should be writable.");

	let client = ScriptedHttpClient::default();
	let manager: OAuthTokenManager<ScriptedHttpClient> = OAuthTokenManager::with_http_client(
		OAuthConfig::new("client", "secret"),
		Arc::new(FileTokenStore::new(&path)),
		never_prompt(),
		client.clone(),
	);
	let token = manager.token().await.expect("Cached token should be returned.");

	assert_eq!(token.expose(), "tok-abc");

	fs::remove_file(&path).expect("Token fixture should be removable.");

	let again = manager.get_token().await.expect("Memoized token should be returned.");

	assert_eq!(again.expose(), "tok-abc");
	assert_eq!(client.calls(), 0);
}

#[cfg(feature = "reqwest")]
#[tokio::test]
async fn exchange_persists_token_and_prompts_once() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/v2/oauth/token")
				.query_param("client_id", "client-it")
				.query_param("client_secret", "secret-it")
				.query_param("code", "code-123")
				.query_param("redirect_uri", "localhost");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"tok-fresh\",\"token_type\":\"Bearer\"}");
		})
		.await;
	let path = temp_token_path("exchange");
	let prompts = Arc::new(AtomicUsize::new(0));
	let seen = prompts.clone();
	let supplier = Arc::new(move |url: &Url| -> Result<String, TokenExchangeError> {
		seen.fetch_add(1, Ordering::SeqCst);

		assert_eq!(
			url.as_str(),
			"https://app.clickup.com/api?client_id=client-it&redirect_uri=localhost"
		);

		Ok("code-123".into())
	});
	let config = OAuthConfig::new("client-it", "secret-it")
		.with_token_endpoint(server.url("/api/v2/oauth/token"));
	let manager: OAuthTokenManager<ReqwestHttpClient> =
		OAuthTokenManager::new(config, Arc::new(FileTokenStore::new(&path)), supplier);
	let token = manager.get_token().await.expect("Exchange should produce a token.");

	mock.assert_async().await;

	assert_eq!(token.expose(), "tok-fresh");
	assert_eq!(
		fs::read_to_string(&path).expect("Exchanged token should be persisted."),
		"tok-fresh"
	);

	let again = manager.get_token().await.expect("Memoized token should be returned.");

	assert_eq!(again.expose(), "tok-fresh");
	assert_eq!(prompts.load(Ordering::SeqCst), 1);
}

#[cfg(feature = "reqwest")]
#[tokio::test]
async fn missing_access_token_is_an_error_and_nothing_is_stored() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_code\"}");
		})
		.await;
	let store = Arc::new(MemoryTokenStore::default());
	let config =
		OAuthConfig::new("client", "secret").with_token_endpoint(server.url("/oauth/token"));
	let manager: OAuthTokenManager<ReqwestHttpClient> =
		OAuthTokenManager::new(config, store.clone(), fixed_code("stale"));
	let err = manager.get_token().await.expect_err("A response without a token should fail.");

	mock.assert_async().await;

	assert!(matches!(err, Error::TokenExchange(TokenExchangeError::MissingAccessToken)));
	assert!(store.snapshot().is_none());
}

#[tokio::test]
async fn exchange_retries_server_errors_with_backoff() {
	let client = ScriptedHttpClient::new([
		Scripted::Respond(500, "oops"),
		Scripted::Respond(200, "{\"access_token\":\"tok-retried\"}"),
	]);
	let clock = ManualClock::new(Instant::now());
	let store = Arc::new(MemoryTokenStore::default());
	let manager: OAuthTokenManager<ScriptedHttpClient> = OAuthTokenManager::with_parts(
		OAuthConfig::new("client", "secret"),
		store.clone(),
		fixed_code("code-9"),
		client.clone(),
		Arc::new(clock.clone()),
	);
	let token = manager.get_token().await.expect("Second exchange attempt should succeed.");

	assert_eq!(token.expose(), "tok-retried");
	assert_eq!(client.calls(), 2);
	assert_eq!(clock.sleeps(), vec![Duration::from_millis(1500)]);
	assert_eq!(store.snapshot(), Some(TokenSecret::new("tok-retried")));

	let requests = client.requests();

	assert_eq!(requests[0].url.path(), "/api/v2/oauth/token");
	assert!(requests[0].url.query_pairs().any(|(k, v)| k == "code" && v == "code-9"));
	assert_eq!(requests[0].timeout, OAuthConfig::DEFAULT_TIMEOUT);
}

#[tokio::test]
async fn exchange_gives_up_after_retry_budget() {
	let client = ScriptedHttpClient::new([Scripted::Timeout, Scripted::Respond(503, "down")]);
	let clock = ManualClock::new(Instant::now());
	let store = Arc::new(MemoryTokenStore::default());
	let manager: OAuthTokenManager<ScriptedHttpClient> = OAuthTokenManager::with_parts(
		OAuthConfig::new("client", "secret").with_retry(RetryPolicy::new(2, 1.0)),
		store.clone(),
		fixed_code("code"),
		client.clone(),
		Arc::new(clock.clone()),
	);
	let err = manager.get_token().await.expect_err("Exhausted exchanges should fail.");

	match err {
		Error::TokenExchange(TokenExchangeError::Request(inner)) => assert!(matches!(
			*inner,
			Error::Http { attempts: 2, source: HttpError::Status { status: 503, .. }, .. }
		)),
		other => panic!("Unexpected error: {other:?}."),
	}

	assert_eq!(clock.sleeps(), vec![Duration::from_secs(1)]);
	assert!(store.snapshot().is_none());
}

#[tokio::test]
async fn unreadable_store_falls_back_to_exchange() {
	let client = ScriptedHttpClient::new([Scripted::Respond(200, "{\"access_token\":\"tok-new\"}")]);
	let store = Arc::new(UnreadableStore::default());
	let manager: OAuthTokenManager<ScriptedHttpClient> = OAuthTokenManager::with_parts(
		OAuthConfig::new("client", "secret"),
		store.clone(),
		fixed_code("code"),
		client.clone(),
		Arc::new(ManualClock::default()),
	);
	let token = manager.get_token().await.expect("Exchange should run when the store fails.");

	assert_eq!(token.expose(), "tok-new");
	assert_eq!(client.calls(), 1);
	assert_eq!(store.0.snapshot(), Some(TokenSecret::new("tok-new")));
}

#[tokio::test]
async fn invalidate_forces_a_new_exchange() {
	let client = ScriptedHttpClient::new([
		Scripted::Respond(200, "{\"access_token\":\"tok-1\"}"),
		Scripted::Respond(200, "{\"access_token\":\"tok-2\"}"),
	]);
	let store = Arc::new(MemoryTokenStore::default());
	let manager: OAuthTokenManager<ScriptedHttpClient> = OAuthTokenManager::with_parts(
		OAuthConfig::new("client", "secret"),
		store.clone(),
		fixed_code("code"),
		client.clone(),
		Arc::new(ManualClock::default()),
	);

	assert_eq!(manager.get_token().await.expect("First exchange should succeed.").expose(), "tok-1");

	manager.invalidate().await.expect("Invalidation should clear the store.");

	assert!(store.snapshot().is_none());
	assert_eq!(manager.get_token().await.expect("Second exchange should succeed.").expose(), "tok-2");
	assert_eq!(client.calls(), 2);
}
