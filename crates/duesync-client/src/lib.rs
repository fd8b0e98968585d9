//! duesync command-line client.
//!
//! This crate provides the `duesync` binary: configuration loading, the
//! `normalize` and `sync` pipelines, and configuration inspection.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod secret;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
