//! Durable persistence for the access/refresh credential pair.
//!
//! The pair is written as one JSON document, so the two tokens can only ever
//! be present or absent together. The store is the single source of truth
//! for "is there a remembered session"; the session manager never caches a
//! pair beyond the request it is serving.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;
use vox_protocol::CredentialPair;

use crate::error::{Error, Result};

/// File-backed store for the credential pair.
#[derive(Debug, Clone)]
pub struct CredentialStore {
	path: PathBuf,
}

impl CredentialStore {
	/// Store at the per-user config directory
	/// (`$XDG_CONFIG_HOME/voxlens/credentials.json`, HOME fallback).
	pub fn new() -> Self {
		Self {
			path: default_store_path(),
		}
	}

	/// Store at an explicit path. Used by tests and embedders that manage
	/// their own state directory.
	pub fn at_path(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Overwrites any existing pair with a durable write.
	pub fn save(&self, pair: &CredentialPair) -> Result<()> {
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent).map_err(storage_error)?;
		}
		let json = serde_json::to_string_pretty(pair).map_err(|err| Error::Storage(err.to_string()))?;
		fs::write(&self.path, json).map_err(storage_error)?;
		debug!(target = "vox.store", path = %self.path.display(), "credential pair saved");
		Ok(())
	}

	/// Returns the persisted pair, or `None` if never saved, cleared, or
	/// unreadable. Unparseable content counts as absent rather than an error.
	pub fn load(&self) -> Option<CredentialPair> {
		fs::read_to_string(&self.path)
			.ok()
			.and_then(|content| serde_json::from_str(&content).ok())
	}

	/// Removes both tokens. Clearing an empty store is a no-op.
	pub fn clear(&self) -> Result<()> {
		match fs::remove_file(&self.path) {
			Ok(()) => {
				debug!(target = "vox.store", path = %self.path.display(), "credential pair cleared");
				Ok(())
			}
			Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
			Err(err) => Err(storage_error(err)),
		}
	}
}

impl Default for CredentialStore {
	fn default() -> Self {
		Self::new()
	}
}

fn storage_error(err: std::io::Error) -> Error {
	Error::Storage(err.to_string())
}

fn default_store_path() -> PathBuf {
	std::env::var_os("XDG_CONFIG_HOME")
		.map(PathBuf::from)
		.or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
		.unwrap_or_else(|| PathBuf::from("."))
		.join("voxlens/credentials.json")
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	fn store_in(dir: &TempDir) -> CredentialStore {
		CredentialStore::at_path(dir.path().join("nested/credentials.json"))
	}

	fn pair(access: &str, refresh: &str) -> CredentialPair {
		CredentialPair {
			access_token: access.to_string(),
			refresh_token: refresh.to_string(),
		}
	}

	#[test]
	fn load_after_save_returns_the_pair() {
		let dir = TempDir::new().unwrap();
		let store = store_in(&dir);
		let saved = pair("access-1", "refresh-1");

		store.save(&saved).unwrap();
		assert_eq!(store.load(), Some(saved.clone()));

		let replaced = pair("access-2", "refresh-2");
		store.save(&replaced).unwrap();
		assert_eq!(store.load(), Some(replaced));
	}

	#[test]
	fn load_is_absent_before_any_save() {
		let dir = TempDir::new().unwrap();
		assert_eq!(store_in(&dir).load(), None);
	}

	#[test]
	fn clear_is_idempotent_and_empties_the_store() {
		let dir = TempDir::new().unwrap();
		let store = store_in(&dir);

		store.save(&pair("a", "r")).unwrap();
		store.clear().unwrap();
		assert_eq!(store.load(), None);

		// Second clear on an empty store is a no-op, not an error.
		store.clear().unwrap();
	}

	#[test]
	fn corrupt_content_reads_as_absent() {
		let dir = TempDir::new().unwrap();
		let store = store_in(&dir);
		fs::create_dir_all(store.path().parent().unwrap()).unwrap();
		fs::write(store.path(), "{not json").unwrap();
		assert_eq!(store.load(), None);
	}
}
