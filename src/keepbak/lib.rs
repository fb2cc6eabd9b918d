//! # Keepbak Architecture
//!
//! Keepbak copies one file or directory into a backup directory under a date-stamped
//! name, then removes older backups of the same source beyond a retention count.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, prints messages, logs, exit codes      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Owns the store and the clock, dispatches to commands     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - transfer, retention, and the backup run that chains them │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - BackupStore trait: FsStore (production), MemStore (test) │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## State
//!
//! There is no state besides the backup directory itself. Each backup is named
//! `{YYYY_MM_DD}_{source base name}.bkp` (see [`naming`]); listing the directory and
//! decoding those names is all retention needs.
//!
//! ## No I/O Assumptions in Core
//!
//! From `api.rs` inward, code never prints, never logs through a global logger, and
//! never exits. Progress is reported as [`commands::CmdMessage`]s in the returned
//! [`commands::CmdResult`]; the date comes from an injected [`clock::Clock`]. Runs are
//! therefore deterministic under `MemStore` + `FixedClock`.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade
//! - [`commands`]: Transfer, retention and the full backup run
//! - [`naming`]: Artifact name encoding and matching
//! - [`store`]: Filesystem abstraction and implementations
//! - [`model`]: `BackupArtifact` and `ArtifactKind`
//! - [`clock`]: Where "today" comes from
//! - [`config`]: Defaults
//! - [`error`]: Error types

pub mod api;
pub mod clock;
pub mod commands;
pub mod config;
pub mod error;
pub mod model;
pub mod naming;
pub mod store;

#[cfg(test)]
mod test_utils;
