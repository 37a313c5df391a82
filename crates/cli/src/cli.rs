use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::styles::cli_styles;

/// Identity of the browser extension the host serves.
pub const DEFAULT_EXTENSION_ID: &str = "textern@jlebon.com";

#[derive(Parser, Debug)]
#[command(name = "textern")]
#[command(about = "Edit browser text fields in an external editor")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Directory holding prefs.json [default: $TEXTERN_CONFIG_DIR, then the user config dir]
	#[arg(long, global = true, value_name = "DIR")]
	pub config_dir: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Run the coordinator over stdio (JSON lines in, JSON lines out)
	Serve(ServeArgs),

	/// Print the preferences a new session would use
	Prefs(PrefsArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
	/// Helper executable followed by its arguments
	#[arg(long, required = true, num_args = 1.., allow_hyphen_values = true, value_name = "CMD")]
	pub helper: Vec<String>,

	/// Extension identity that page messages must carry
	#[arg(long, default_value = DEFAULT_EXTENSION_ID)]
	pub extension_id: String,
}

#[derive(Args, Debug)]
pub struct PrefsArgs {
	/// Print as JSON instead of one `key = value` per line
	#[arg(long)]
	pub json: bool,
}
