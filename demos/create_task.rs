//! Demonstrates the full client path against a mock ClickUp server:
//!
//! 1. Resolve a bearer token with [`OAuthTokenManager`], feeding it a pasted callback URL.
//! 2. Persist the token to a [`FileTokenStore`] so the next run skips the exchange.
//! 3. Create a task and a subtask through [`ClickUpApi`].

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::{Map, json};
// self
use clickwrap::{
	config::{ClientConfig, OAuthConfig},
	error::TokenExchangeError,
	id::{ListId, TaskId},
	resource::ClickUpApi,
	token::{
		FileTokenStore, OAuthTokenManager, TokenProvider, TokenStore, extract_authorization_code,
	},
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v2/oauth/token").query_param("code", "demo-code");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"demo-token\"}");
		})
		.await;
	let task_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/v2/list/demo-list/task")
				.header("authorization", "demo-token")
				.json_body(json!({ "name": "Write release notes", "priority": 2 }));
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":\"task-1\",\"name\":\"Write release notes\"}");
		})
		.await;
	let subtask_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/v2/list/demo-list/task")
				.json_body(json!({ "name": "Draft", "parent": "task-1" }));
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":\"task-2\",\"parent\":\"task-1\"}");
		})
		.await;
	let oauth = OAuthConfig::new("demo-client", "demo-secret")
		.with_authorization_endpoint(server.url("/api"))
		.with_token_endpoint(server.url("/api/v2/oauth/token"));
	let store = FileTokenStore::new(
		std::env::temp_dir().join("clickwrap-demo").join(FileTokenStore::DEFAULT_FILE_NAME),
	);

	// Start from an empty cache so the exchange runs.
	store.clear().await?;

	let supplier = |url: &Url| -> Result<String, TokenExchangeError> {
		println!("Authorize at: {url}");

		extract_authorization_code("localhost/?code=demo-code")
	};
	let manager = OAuthTokenManager::new(oauth, Arc::new(store.clone()), Arc::new(supplier));
	let token = manager.token().await?;

	println!("Token cached at {}.", store.path().display());

	let api = ClickUpApi::new(ClientConfig::new(token).with_base_url(server.url("/api/v2")))?;
	let list = ListId::new("demo-list")?;
	let mut extra = Map::new();

	extra.insert("priority".into(), json!(2));

	let task = api.create_task(&list, "Write release notes", extra).await?;

	println!("Created task: {task}");

	let parent: TaskId = task["id"].as_str().unwrap_or_default().parse()?;
	let subtask = api.create_subtask(&parent, &list, "Draft").await?;

	println!("Created subtask: {subtask}");

	token_mock.assert_async().await;
	task_mock.assert_async().await;
	subtask_mock.assert_async().await;

	Ok(())
}
