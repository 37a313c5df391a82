//! Launching the helper executable.
//!
//! The helper speaks the framed protocol on its stdin/stdout and owns the actual
//! editor processes. Each [`HelperLauncher::open`] spawns a fresh process; the
//! coordinator keeps at most one alive at a time.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use tokio::process::Command;

use crate::bridge::{Bridge, BridgeLauncher, BridgeListener, PipeBridge};
use crate::error::{Error, Result};

/// Program and arguments used to start the helper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperCommand {
	program: PathBuf,
	args: Vec<String>,
}

impl HelperCommand {
	pub fn new(program: impl Into<PathBuf>) -> Self {
		Self {
			program: program.into(),
			args: Vec::new(),
		}
	}

	pub fn arg(mut self, arg: impl Into<String>) -> Self {
		self.args.push(arg.into());
		self
	}

	pub fn args<I, S>(mut self, args: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.args.extend(args.into_iter().map(Into::into));
		self
	}

	pub fn program(&self) -> &std::path::Path {
		&self.program
	}

	pub fn arguments(&self) -> &[String] {
		&self.args
	}
}

/// [`BridgeLauncher`] that spawns the helper as a child process.
#[derive(Debug, Clone)]
pub struct HelperLauncher {
	command: HelperCommand,
}

impl HelperLauncher {
	pub fn new(command: HelperCommand) -> Self {
		Self { command }
	}

	pub fn command(&self) -> &HelperCommand {
		&self.command
	}
}

impl BridgeLauncher for HelperLauncher {
	fn open(&self, listener: Arc<dyn BridgeListener>) -> Result<Arc<dyn Bridge>> {
		let mut cmd = Command::new(&self.command.program);
		cmd.args(&self.command.args)
			.stdin(Stdio::piped())
			.stdout(Stdio::piped())
			.stderr(Stdio::inherit())
			.kill_on_drop(true);

		let mut child = cmd.spawn().map_err(|e| {
			Error::LaunchFailed(format!("{}: {e}", self.command.program.display()))
		})?;

		let stdin = child
			.stdin
			.take()
			.ok_or_else(|| Error::LaunchFailed("helper stdin was not captured".to_string()))?;
		let stdout = child
			.stdout
			.take()
			.ok_or_else(|| Error::LaunchFailed("helper stdout was not captured".to_string()))?;

		tracing::info!(
			program = %self.command.program.display(),
			pid = child.id().unwrap_or_default(),
			"helper launched"
		);

		let bridge: Arc<dyn Bridge> = PipeBridge::start(stdin, stdout, listener, Some(child));
		Ok(bridge)
	}
}
