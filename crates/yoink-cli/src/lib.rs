//! `yoink` command-line front end.
//!
//! The binary in `main.rs` is the composition root; everything it wires
//! together lives here so it can be tested.

#![deny(unused_crate_dependencies)]

// Used by the binary only.
use anyhow as _;
use tracing_subscriber as _;

#[cfg(test)]
use tempfile as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;

pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::{Commands, GetArgs};
pub use error::CliError;
pub use parser::Cli;
