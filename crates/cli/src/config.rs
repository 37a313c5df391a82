//! Preference file for the stdio host.
//!
//! Preferences live in `prefs.json`, a flat JSON object using the same keys the
//! extension stores. The file is read again for every registration, so edits take
//! effect on the next session without restarting the host.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use textern::PreferenceStore;

/// Overrides the configuration directory when set and non-empty.
pub const CONFIG_DIR_ENV: &str = "TEXTERN_CONFIG_DIR";
pub const PREFS_FILE: &str = "prefs.json";

/// Resolves the configuration directory: `explicit`, then [`CONFIG_DIR_ENV`],
/// then the platform config dir.
pub fn config_dir(explicit: Option<&Path>) -> Option<PathBuf> {
	explicit
		.map(Path::to_path_buf)
		.or_else(|| {
			std::env::var_os(CONFIG_DIR_ENV)
				.filter(|dir| !dir.is_empty())
				.map(PathBuf::from)
		})
		.or_else(|| dirs::config_dir().map(|dir| dir.join("textern")))
}

#[derive(Debug, Clone)]
pub struct JsonFileStore {
	path: PathBuf,
}

impl JsonFileStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn in_dir(dir: &Path) -> Self {
		Self::new(dir.join(PREFS_FILE))
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Reads the whole file. A missing file is an empty store.
	async fn load(&self) -> textern::Result<Map<String, Value>> {
		let raw = match tokio::fs::read_to_string(&self.path).await {
			Ok(raw) => raw,
			Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Map::new()),
			Err(err) => {
				return Err(textern::Error::Preferences(format!("{}: {err}", self.path.display())));
			}
		};
		match serde_json::from_str(&raw)? {
			Value::Object(map) => Ok(map),
			other => Err(textern::Error::Preferences(format!(
				"{}: expected a JSON object, found {other}",
				self.path.display()
			))),
		}
	}
}

#[async_trait]
impl PreferenceStore for JsonFileStore {
	async fn get(&self, keys: &[&str]) -> textern::Result<Map<String, Value>> {
		let mut stored = self.load().await?;
		Ok(keys
			.iter()
			.filter_map(|&key| stored.remove(key).map(|value| (key.to_string(), value)))
			.collect())
	}
}
