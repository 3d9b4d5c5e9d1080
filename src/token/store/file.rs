//! Plain-text file [`TokenStore`]: the file holds exactly the token string.

// std
use std::{
	fs::{self, File},
	io::{ErrorKind, Write},
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	token::{
		TokenSecret,
		store::{StoreError, StoreFuture, TokenStore},
	},
};

/// Persists the bearer token to a file after each exchange.
///
/// A missing or blank file counts as "no cached token". Writes land in a sibling `.tmp` file
/// first and are renamed into place.
#[derive(Clone, Debug)]
pub struct FileTokenStore {
	path: PathBuf,
}
impl FileTokenStore {
	/// Conventional file name used when no path is configured.
	pub const DEFAULT_FILE_NAME: &'static str = "token.txt";

	/// Creates a store bound to `path`. Nothing is read until [`TokenStore::load`].
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// Location of the token file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn read_now(&self) -> Result<Option<TokenSecret>, StoreError> {
		match fs::read_to_string(&self.path) {
			Ok(content) => Ok(TokenSecret::from_cached(&content)),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
			Err(e) => Err(StoreError::Backend {
				message: format!("Failed to read {}: {e}", self.path.display()),
			}),
		}
	}

	fn write_now(&self, token: &TokenSecret) -> Result<(), StoreError> {
		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create token directory {}: {e}", parent.display()),
			})?;
		}

		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(token.expose().as_bytes()).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}

	fn remove_now(&self) -> Result<(), StoreError> {
		match fs::remove_file(&self.path) {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StoreError::Backend {
				message: format!("Failed to remove {}: {e}", self.path.display()),
			}),
		}
	}
}
impl Default for FileTokenStore {
	fn default() -> Self {
		Self::new(Self::DEFAULT_FILE_NAME)
	}
}
impl TokenStore for FileTokenStore {
	fn load(&self) -> StoreFuture<'_, Option<TokenSecret>> {
		Box::pin(async move { self.read_now() })
	}

	fn save<'a>(&'a self, token: &'a TokenSecret) -> StoreFuture<'a, ()> {
		Box::pin(async move { self.write_now(token) })
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		Box::pin(async move { self.remove_now() })
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// self
	use super::*;

	fn temp_path(tag: &str) -> PathBuf {
		let unique = format!(
			"clickwrap_token_{tag}_{}_{}.txt",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	#[tokio::test]
	async fn missing_file_is_a_cache_miss() {
		let store = FileTokenStore::new(temp_path("missing"));

		assert!(store.load().await.expect("Missing file should not be an error.").is_none());
	}

	#[tokio::test]
	async fn existing_file_content_is_returned_trimmed() {
		let path = temp_path("existing");

		fs::write(&path, "tok-abc\n").expect("Failed to seed the token file.");

		let store = FileTokenStore::new(&path);
		let token = store
			.load()
			.await
			.expect("Reading the seeded token should succeed.")
			.expect("Seeded token should be present.");

		assert_eq!(token.expose(), "tok-abc");

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary token file {}: {e}", path.display())
		});
	}

	#[tokio::test]
	async fn save_overwrites_and_clear_removes() {
		let path = temp_path("overwrite");
		let store = FileTokenStore::new(&path);

		store.save(&TokenSecret::new("first")).await.expect("First save should succeed.");
		store.save(&TokenSecret::new("second")).await.expect("Second save should succeed.");

		assert_eq!(fs::read_to_string(&path).expect("Token file should exist."), "second");

		store.clear().await.expect("Clearing should succeed.");

		assert!(!path.exists());
		assert!(store.load().await.expect("Load after clear should succeed.").is_none());
		store.clear().await.expect("Clearing an absent file should be a no-op.");
	}
}
