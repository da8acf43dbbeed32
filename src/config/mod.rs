//! Configuration system for boxharness.
//!
//! This module provides the configuration structures and CLI definitions for
//! the harness. Merging is handled by the `ortho_config` crate. Precedence:
//! CLI flags override environment variables, which override configuration
//! files, which override defaults.
//!
//! The configuration file is expected at `~/.config/boxharness/config.toml` by
//! default.
//!
//! # Example Configuration
//!
//! ```toml
//! token = "developer-token"
//!
//! [api]
//! base_url = "https://api.box.com/2.0"
//! upload_url = "https://upload.box.com/api/2.0"
//!
//! [workspace]
//! root = "/var/tmp/boxharness"
//!
//! [fixture]
//! container_prefix = "tmp_"
//! root_folder_id = "0"
//! ```

mod cli;
mod loader;
mod types;

#[cfg(test)]
mod tests;

pub use cli::{Cli, Commands, PurgeArgs, RunArgs};
pub use loader::{env_var_names, load_config, load_config_with_env};
pub use types::{ApiConfig, FixtureConfig, HarnessConfig, WorkspaceConfig};
