use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use textern::SessionRegistry;
use textern_runtime::{HelperCommand, HelperLauncher};
use tokio::io::BufReader;
use tracing::info;

use crate::cli::ServeArgs;
use crate::config::{self, JsonFileStore};
use crate::host;

pub async fn execute(args: ServeArgs, config_dir: Option<&Path>) -> Result<()> {
	let (program, rest) = args.helper.split_first().context("missing helper command")?;
	let program = which::which(program).with_context(|| format!("helper '{program}' not found"))?;
	let command = HelperCommand::new(program).args(rest.iter().cloned());

	let dir = config::config_dir(config_dir).context("could not determine the configuration directory")?;
	let store = JsonFileStore::in_dir(&dir);
	info!(
		helper = %command.program().display(),
		prefs = %store.path().display(),
		identity = %args.extension_id,
		"starting stdio host"
	);

	let (sink, outputs) = host::output_channel();
	let registry = SessionRegistry::builder(args.extension_id, Arc::new(HelperLauncher::new(command)), sink.clone())
		.preferences(Arc::new(store))
		.notifier(sink.clone())
		.build();
	let writer = tokio::spawn(host::write_outputs(outputs, tokio::io::stdout()));

	let read = host::read_inputs(&registry, &sink, BufReader::new(tokio::io::stdin())).await;

	let dropped = registry.shutdown();
	info!(sessions = dropped, "input closed, shutting down");
	drop(registry);
	drop(sink);

	writer
		.await
		.context("output task failed")?
		.context("failed to write to stdout")?;
	read.context("failed to read from stdin")
}
