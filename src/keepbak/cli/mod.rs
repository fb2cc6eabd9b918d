//! # CLI Layer
//!
//! One UI client for keepbak, and the only place that knows about stdout, stderr,
//! log subscribers and exit codes.
//!
//! - `setup.rs`: clap argument definitions
//! - `commands.rs`: logging setup, API dispatch
//! - `print.rs`: turns `CmdResult` messages into terminal output

mod commands;
mod print;
mod setup;

pub use commands::run;
