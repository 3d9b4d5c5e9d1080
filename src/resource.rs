//! ClickUp resource facade: folders, lists, tasks, and subtasks.
//!
//! Each operation builds a `{"name": ...}` payload, merges caller-supplied fields on top, and
//! posts it through the shared [`RequestExecutor`], so every call inherits the rate limit and
//! retry policy. Response bodies are returned unchanged.

// self
use crate::{
	_prelude::*,
	clock::Clock,
	config::ClientConfig,
	executor::{ApiCall, RequestExecutor},
	http::ApiHttpClient,
	id::{FolderId, ListId, SpaceId, TaskId},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Resource facade specialized for the crate's default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestClickUpApi = ClickUpApi<ReqwestHttpClient>;

/// Typed entry points for creating ClickUp resources.
pub struct ClickUpApi<C>
where
	C: ?Sized + ApiHttpClient,
{
	executor: RequestExecutor<C>,
}
impl<C> ClickUpApi<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Wraps an existing executor.
	pub fn from_executor(executor: RequestExecutor<C>) -> Self {
		Self { executor }
	}

	/// Creates a facade over a caller-provided transport and the system clock.
	pub fn with_http_client(
		config: ClientConfig,
		http_client: impl Into<Arc<C>>,
	) -> Result<Self> {
		RequestExecutor::with_http_client(config, http_client).map(Self::from_executor)
	}

	/// Creates a facade over a caller-provided transport and clock.
	pub fn with_parts(
		config: ClientConfig,
		http_client: impl Into<Arc<C>>,
		clock: Arc<dyn Clock>,
	) -> Result<Self> {
		RequestExecutor::with_parts(config, http_client, clock).map(Self::from_executor)
	}

	/// Underlying executor, for raw calls and diagnostics.
	pub fn executor(&self) -> &RequestExecutor<C> {
		&self.executor
	}

	/// Creates a folder in `space_id`.
	pub async fn create_folder(&self, space_id: &SpaceId, name: &str) -> Result<Value> {
		self.create_resource(&format!("/space/{space_id}/folder"), name, Map::new()).await
	}

	/// Creates a list in `folder_id`; `extra` fields are merged into the payload.
	pub async fn create_list(
		&self,
		folder_id: &FolderId,
		name: &str,
		extra: Map<String, Value>,
	) -> Result<Value> {
		self.create_resource(&format!("/folder/{folder_id}/list"), name, extra).await
	}

	/// Creates a task in `list_id`; `extra` fields are merged into the payload.
	pub async fn create_task(
		&self,
		list_id: &ListId,
		name: &str,
		extra: Map<String, Value>,
	) -> Result<Value> {
		self.create_resource(&format!("/list/{list_id}/task"), name, extra).await
	}

	/// Creates a task in `list_id` nested under `parent`.
	pub async fn create_subtask(
		&self,
		parent: &TaskId,
		list_id: &ListId,
		name: &str,
	) -> Result<Value> {
		let mut extra = Map::new();

		extra.insert("parent".into(), Value::String(parent.to_string()));

		self.create_task(list_id, name, extra).await
	}

	/// Posts `{"name": name}` plus `extra` to `endpoint`.
	///
	/// Keys in `extra` override `name` when they collide.
	pub async fn create_resource(
		&self,
		endpoint: &str,
		name: &str,
		extra: Map<String, Value>,
	) -> Result<Value> {
		let call = ApiCall::post(endpoint).with_body(resource_payload(name, extra));

		self.executor.execute(call).await
	}
}
#[cfg(feature = "reqwest")]
impl ClickUpApi<ReqwestHttpClient> {
	/// Creates a facade with its own reqwest transport and the system clock.
	pub fn new(config: ClientConfig) -> Result<Self> {
		RequestExecutor::new(config).map(Self::from_executor)
	}
}
impl<C> Debug for ClickUpApi<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClickUpApi").field("executor", &self.executor).finish()
	}
}

fn resource_payload(name: &str, extra: Map<String, Value>) -> Value {
	let mut payload = Map::new();

	payload.insert("name".into(), Value::String(name.to_owned()));
	payload.extend(extra);

	Value::Object(payload)
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn payload_starts_from_name_and_applies_extras() {
		let mut extra = Map::new();

		extra.insert("priority".into(), json!(2));
		extra.insert("parent".into(), json!("task1"));

		assert_eq!(
			resource_payload("Sub A", extra),
			json!({ "name": "Sub A", "priority": 2, "parent": "task1" })
		);
		assert_eq!(resource_payload("My Folder", Map::new()), json!({ "name": "My Folder" }));
	}

	#[test]
	fn extras_override_name() {
		let mut extra = Map::new();

		extra.insert("name".into(), json!("Renamed"));

		assert_eq!(resource_payload("Original", extra), json!({ "name": "Renamed" }));
	}
}
