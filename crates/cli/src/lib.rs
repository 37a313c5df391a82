//! Command-line host for textern.
//!
//! `textern serve` runs a coordinator that speaks JSON lines on stdio with the
//! browser side and drives a helper process for the editors. `textern prefs`
//! prints the preferences a new session would get.

pub mod cli;
pub mod commands;
pub mod config;
pub mod host;
pub mod logging;
pub mod styles;
