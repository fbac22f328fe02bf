//! Command line interface
//!
//! One module per admin command group. Each command is a thin adapter:
//! parse arguments, build services, call one service method, print a
//! short summary.

pub mod config;
pub mod content;
pub mod files;
pub mod init;
pub mod publication;
pub mod release;
pub mod stats;

use crate::config::Config;
use crate::error::{Result, StatDeskError};

/// The acting user for mutations: the --actor flag, falling back to the
/// configured default.
pub fn resolve_actor(flag: Option<&str>, config: &Config) -> Result<String> {
    flag.map(str::to_string)
        .or_else(|| config.default_actor.clone())
        .ok_or_else(|| {
            StatDeskError::Internal(anyhow::anyhow!(
                "no acting user; pass --actor or set default_actor in the config"
            ))
        })
}
