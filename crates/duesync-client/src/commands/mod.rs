//! Subcommand implementations.

pub mod config;
pub mod normalize;
pub mod sync;
