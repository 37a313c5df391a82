use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;

fn textern(config_dir: &Path, args: &[&str]) -> Output {
	Command::new(env!("CARGO_BIN_EXE_textern"))
		.args(args)
		.env("TEXTERN_CONFIG_DIR", config_dir)
		.env_remove("RUST_LOG")
		.output()
		.expect("failed to run textern")
}

#[test]
fn prefs_json_shows_defaults() {
	let dir = tempfile::tempdir().unwrap();

	let output = textern(dir.path(), &["prefs", "--json"]);

	assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
	let prefs: Value = serde_json::from_slice(&output.stdout).unwrap();
	assert_eq!(prefs["editor"], r#"["gedit"]"#);
	assert_eq!(prefs["extension"], "txt");
	assert_eq!(prefs["backupdir"], "");
	assert_eq!(prefs["shortcut"], "Ctrl+Shift+D");
	assert_eq!(prefs["kill_editors_allow"], false);
	assert_eq!(prefs["kill_editors_timeout"], 1);
}

#[test]
fn prefs_reads_config_file() {
	let dir = tempfile::tempdir().unwrap();
	std::fs::write(
		dir.path().join("prefs.json"),
		r#"{"extension": "md", "kill_editors_timeout": 3}"#,
	)
	.unwrap();

	let output = textern(dir.path(), &["prefs"]);

	assert!(output.status.success());
	let stdout = String::from_utf8(output.stdout).unwrap();
	assert!(stdout.contains("extension = \"md\""), "{stdout}");
	assert!(stdout.contains("kill_editors_timeout = 3"), "{stdout}");
}

#[test]
fn prefs_reports_broken_file() {
	let dir = tempfile::tempdir().unwrap();
	std::fs::write(dir.path().join("prefs.json"), "[]").unwrap();

	let output = textern(dir.path(), &["prefs", "--json"]);

	assert!(!output.status.success());
	assert!(String::from_utf8_lossy(&output.stderr).contains("prefs.json"));
}

#[test]
fn serve_fails_without_helper_on_path() {
	let dir = tempfile::tempdir().unwrap();

	let output = textern(dir.path(), &["serve", "--helper", "textern-helper-that-does-not-exist"]);

	assert!(!output.status.success());
	assert!(String::from_utf8_lossy(&output.stderr).contains("not found"));
}

#[cfg(unix)]
#[test]
fn serve_speaks_json_lines() {
	use std::io::Write;
	use std::process::Stdio;

	let dir = tempfile::tempdir().unwrap();
	let mut child = Command::new(env!("CARGO_BIN_EXE_textern"))
		.args(["serve", "--helper", "cat"])
		.env("TEXTERN_CONFIG_DIR", dir.path())
		.env_remove("RUST_LOG")
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.spawn()
		.expect("failed to start textern serve");

	let register = r#"{"sender":"textern@jlebon.com","context":"7","message":{"type":"register_text","localId":0,"text":"hello","caret":5,"url":"example.com/page"}}"#;
	let foreign = r#"{"sender":"other@example.com","context":"8","message":{"type":"register_text","localId":0,"text":"x","caret":0,"url":"x/"}}"#;
	let input = [register, register, foreign, r#"{"command":"shortcut","context":"9"}"#, r#"{"command":"quit"}"#];
	let mut stdin = child.stdin.take().unwrap();
	for line in input {
		writeln!(stdin, "{line}").unwrap();
	}
	drop(stdin);

	let output = child.wait_with_output().unwrap();
	assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
	let lines: Vec<Value> = String::from_utf8(output.stdout)
		.unwrap()
		.lines()
		.map(|line| serde_json::from_str(line).unwrap())
		.collect();

	assert_eq!(lines[0], serde_json::json!({"registered": "7_0"}));
	assert_eq!(
		lines[1],
		serde_json::json!({"notification": "Error: this text is already being edited."})
	);
	assert!(lines[2]["error"].is_string());
	assert_eq!(
		lines[3],
		serde_json::json!({"context": "9", "message": {"type": "shortcut"}})
	);
	assert_eq!(lines.len(), 4);
}
