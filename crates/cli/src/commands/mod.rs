mod prefs;
mod serve;

use anyhow::Result;

use crate::cli::{Cli, Commands};

pub async fn dispatch(cli: Cli) -> Result<()> {
	let Cli {
		config_dir, command, ..
	} = cli;
	match command {
		Commands::Serve(args) => serve::execute(args, config_dir.as_deref()).await,
		Commands::Prefs(args) => prefs::execute(args, config_dir.as_deref()).await,
	}
}
