//! Preferences read from the user's key-value store.
//!
//! The store is queried on every registration and nothing is cached. Missing keys,
//! empty strings and values of the wrong JSON type fall back to the defaults.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{Map, Value};
use textern_protocol::NativePrefs;
use tracing::warn;

use crate::error::Result;
use crate::shortcut::KeyChord;

pub const DEFAULT_EDITOR: &str = r#"["gedit"]"#;
pub const DEFAULT_EXTENSION: &str = "txt";
pub const DEFAULT_SHORTCUT: &str = "Ctrl+Shift+D";
pub const DEFAULT_KILL_TIMEOUT_SECS: u32 = 1;

/// Placeholder in the editor command replaced by the file path.
pub const FILE_PLACEHOLDER: &str = "%s";

/// Every key the snapshot reads.
pub const KEYS: [&str; 6] = [
	"editor",
	"extension",
	"backupdir",
	"shortcut",
	"kill_editors_allow",
	"kill_editors_timeout",
];

/// Whether the helper may kill editors that outlive their session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KillPolicy {
	#[serde(rename = "kill_editors_allow")]
	pub allow: bool,
	#[serde(rename = "kill_editors_timeout")]
	pub timeout_secs: u32,
}

impl Default for KillPolicy {
	fn default() -> Self {
		Self {
			allow: false,
			timeout_secs: DEFAULT_KILL_TIMEOUT_SECS,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preferences {
	/// Editor command line as a JSON array string.
	pub editor: String,
	pub extension: String,
	/// Empty disables backups.
	pub backupdir: String,
	pub shortcut: String,
	#[serde(flatten)]
	pub kill: KillPolicy,
}

impl Default for Preferences {
	fn default() -> Self {
		Self {
			editor: DEFAULT_EDITOR.to_string(),
			extension: DEFAULT_EXTENSION.to_string(),
			backupdir: String::new(),
			shortcut: DEFAULT_SHORTCUT.to_string(),
			kill: KillPolicy::default(),
		}
	}
}

impl Preferences {
	/// Reads every key from `store` and merges the result over the defaults.
	pub async fn snapshot(store: &dyn PreferenceStore) -> Result<Self> {
		let stored = store.get(&KEYS).await?;
		Ok(Self::from_stored(&stored))
	}

	pub fn from_stored(stored: &Map<String, Value>) -> Self {
		let defaults = Self::default();
		Self {
			editor: string_or(stored, "editor", defaults.editor),
			extension: string_or(stored, "extension", defaults.extension),
			backupdir: string_or(stored, "backupdir", defaults.backupdir),
			shortcut: string_or(stored, "shortcut", defaults.shortcut),
			kill: KillPolicy {
				allow: bool_or(stored, "kill_editors_allow", defaults.kill.allow),
				timeout_secs: u32_or(stored, "kill_editors_timeout", defaults.kill.timeout_secs),
			},
		}
	}

	/// The subset the helper receives.
	pub fn to_native(&self) -> NativePrefs {
		NativePrefs {
			editor: self.editor.clone(),
			extension: self.extension.clone(),
			backupdir: self.backupdir.clone(),
			kill_editors_allow: self.kill.allow,
			kill_editors_timeout: self.kill.timeout_secs,
		}
	}

	/// Editor command as arguments, with [`FILE_PLACEHOLDER`] appended when the
	/// configured command does not place it.
	pub fn editor_args(&self) -> Result<Vec<String>> {
		let mut args: Vec<String> = serde_json::from_str(&self.editor)?;
		if !args.iter().any(|arg| arg == FILE_PLACEHOLDER) {
			args.push(FILE_PLACEHOLDER.to_string());
		}
		Ok(args)
	}

	pub fn shortcut_chord(&self) -> Result<KeyChord> {
		self.shortcut.parse()
	}
}

fn wrong_type(key: &str, value: &Value) {
	warn!(key, value = %value, "ignoring stored preference of the wrong type");
}

fn string_or(stored: &Map<String, Value>, key: &str, default: String) -> String {
	match stored.get(key) {
		None | Some(Value::Null) => default,
		Some(Value::String(s)) if s.is_empty() => default,
		Some(Value::String(s)) => s.clone(),
		Some(other) => {
			wrong_type(key, other);
			default
		}
	}
}

fn bool_or(stored: &Map<String, Value>, key: &str, default: bool) -> bool {
	match stored.get(key) {
		None | Some(Value::Null) => default,
		Some(Value::Bool(b)) => *b,
		Some(other) => {
			wrong_type(key, other);
			default
		}
	}
}

fn u32_or(stored: &Map<String, Value>, key: &str, default: u32) -> u32 {
	match stored.get(key) {
		None | Some(Value::Null) => default,
		Some(value) => match value.as_u64().and_then(|n| u32::try_from(n).ok()) {
			Some(n) => n,
			None => {
				wrong_type(key, value);
				default
			}
		},
	}
}

/// External key-value store holding the user's preferences.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
	/// Returns the stored values for `keys`. Keys with no stored value are absent
	/// from the result.
	async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>>;
}

/// Store kept in memory, for hosts without persistent storage and for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
	values: RwLock<Map<String, Value>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_values(values: Map<String, Value>) -> Self {
		Self {
			values: RwLock::new(values),
		}
	}

	pub fn set(&self, key: impl Into<String>, value: Value) {
		self.values.write().insert(key.into(), value);
	}
}

#[async_trait]
impl PreferenceStore for MemoryStore {
	async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
		let values = self.values.read();
		Ok(keys
			.iter()
			.filter_map(|&key| values.get(key).map(|value| (key.to_string(), value.clone())))
			.collect())
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[tokio::test]
	async fn empty_store_yields_defaults() {
		let prefs = Preferences::snapshot(&MemoryStore::new()).await.unwrap();
		assert_eq!(prefs, Preferences::default());
		assert_eq!(prefs.editor, r#"["gedit"]"#);
		assert_eq!(prefs.kill.timeout_secs, 1);
	}

	#[tokio::test]
	async fn stored_values_override_defaults() {
		let store = MemoryStore::new();
		store.set("editor", json!(r#"["emacsclient", "-c"]"#));
		store.set("backupdir", json!("/tmp/textern"));
		store.set("kill_editors_allow", json!(true));
		store.set("kill_editors_timeout", json!(5));

		let prefs = Preferences::snapshot(&store).await.unwrap();
		assert_eq!(prefs.extension, "txt");
		assert_eq!(prefs.backupdir, "/tmp/textern");
		assert_eq!(
			prefs.kill,
			KillPolicy {
				allow: true,
				timeout_secs: 5
			}
		);
		assert_eq!(prefs.editor_args().unwrap(), ["emacsclient", "-c", "%s"]);
	}

	#[test]
	fn empty_and_mistyped_values_fall_back() {
		let stored = json!({
			"editor": "",
			"extension": 3,
			"kill_editors_allow": "yes",
			"kill_editors_timeout": -2,
		});
		let prefs = Preferences::from_stored(stored.as_object().unwrap());
		assert_eq!(prefs, Preferences::default());
	}

	#[test]
	fn editor_args_keep_explicit_placeholder() {
		let prefs = Preferences {
			editor: r#"["xterm", "-e", "vim", "%s", "+1"]"#.into(),
			..Preferences::default()
		};
		assert_eq!(prefs.editor_args().unwrap(), ["xterm", "-e", "vim", "%s", "+1"]);
	}

	#[test]
	fn editor_args_reject_non_array() {
		let prefs = Preferences {
			editor: "gedit".into(),
			..Preferences::default()
		};
		assert!(prefs.editor_args().is_err());
	}

	#[test]
	fn serializes_flat() {
		let value = serde_json::to_value(Preferences::default()).unwrap();
		assert_eq!(value["kill_editors_allow"], false);
		assert_eq!(value["kill_editors_timeout"], 1);
		assert_eq!(value["shortcut"], "Ctrl+Shift+D");
	}

	#[test]
	fn native_prefs_leave_out_shortcut() {
		let native = Preferences::default().to_native();
		assert_eq!(native.extension, "txt");
		assert!(!native.kill_editors_allow);
	}
}
