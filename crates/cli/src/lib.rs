//! kvsnap command-line support
//!
//! Shared by the `kv-backup` and `kv-restore` binaries:
//! - [`commands`]: clap command trees
//! - [`parse`]: matches → run settings
//! - [`config`]: environment configuration
//! - [`prompt`]: interactive restore confirmation
//! - [`run`]: orchestration and exit codes

pub mod commands;
pub mod config;
pub mod logging;
pub mod parse;
pub mod prompt;
pub mod run;
