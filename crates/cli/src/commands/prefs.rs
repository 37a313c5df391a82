use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use textern::Preferences;
use tracing::warn;

use crate::cli::PrefsArgs;
use crate::config::{self, JsonFileStore};

pub async fn execute(args: PrefsArgs, config_dir: Option<&Path>) -> Result<()> {
	let dir = config::config_dir(config_dir).context("could not determine the configuration directory")?;
	let store = JsonFileStore::in_dir(&dir);
	let prefs = Preferences::snapshot(&store)
		.await
		.with_context(|| format!("failed to read {}", store.path().display()))?;

	if let Err(err) = prefs.editor_args() {
		warn!(editor = %prefs.editor, error = %err, "editor is not a JSON array of strings");
	}
	if let Err(err) = prefs.shortcut_chord() {
		warn!(error = %err, "shortcut will not bind");
	}

	let mut stdout = std::io::stdout().lock();
	if args.json {
		serde_json::to_writer_pretty(&mut stdout, &prefs)?;
		writeln!(stdout)?;
	} else {
		let value = serde_json::to_value(&prefs)?;
		for (key, value) in value.as_object().into_iter().flatten() {
			writeln!(stdout, "{key} = {value}")?;
		}
	}
	Ok(())
}
