//! Configuration data types for boxharness.

use std::fmt;

use camino::Utf8PathBuf;
use ortho_config::{OrthoConfig, OrthoResult, PostMergeContext, PostMergeHook};
use serde::{Deserialize, Serialize};

use crate::client::{DEFAULT_API_BASE_URL, DEFAULT_UPLOAD_BASE_URL, SessionToken};
use crate::error::ConfigError;

/// Storage API endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL for metadata operations.
    pub base_url: String,

    /// Base URL for content uploads.
    pub upload_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::from(DEFAULT_API_BASE_URL),
            upload_url: String::from(DEFAULT_UPLOAD_BASE_URL),
        }
    }
}

/// Local workspace configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Directory under which per-scenario workspaces are created.
    pub root: Utf8PathBuf,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: Utf8PathBuf::try_from(std::env::temp_dir())
                .unwrap_or_else(|_| Utf8PathBuf::from("/tmp")),
        }
    }
}

/// Remote fixture configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FixtureConfig {
    /// Prefix for generated container and workspace names.
    pub container_prefix: String,

    /// Folder under which scenario containers are created.
    pub root_folder_id: String,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            container_prefix: String::from("tmp_"),
            root_folder_id: String::from("0"),
        }
    }
}

/// Root harness configuration.
///
/// This structure is loaded from configuration files, environment variables,
/// and command-line arguments with layered precedence. The precedence order
/// (lowest to highest) is: defaults, configuration file, environment variables,
/// command-line arguments.
///
/// Configuration files are discovered in this order:
/// 1. Path specified via `BOXHARNESS_CONFIG_PATH` environment variable
/// 2. `.boxharness.toml` in the current working directory
/// 3. `.boxharness.toml` in the home directory
/// 4. `~/.config/boxharness/config.toml` (XDG default)
#[derive(Clone, Default, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(
    prefix = "BOXHARNESS",
    post_merge_hook,
    discovery(
        app_name = "boxharness",
        env_var = "BOXHARNESS_CONFIG_PATH",
        config_file_name = "config.toml",
        dotfile_name = ".boxharness.toml",
        config_cli_long = "config",
        config_cli_visible = true,
    )
)]
pub struct HarnessConfig {
    /// Session token sent as a bearer credential on every API call.
    pub token: Option<String>,

    /// Storage API endpoints.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub api: ApiConfig,

    /// Local workspace settings.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub workspace: WorkspaceConfig,

    /// Remote fixture settings.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub fixture: FixtureConfig,
}

impl HarnessConfig {
    /// Return the configured session token.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingRequired` if no token is configured or the
    /// configured token is blank.
    pub fn session_token(&self) -> Result<SessionToken, ConfigError> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(SessionToken::new)
            .ok_or_else(|| ConfigError::MissingRequired {
                field: String::from("token"),
            })
    }
}

impl fmt::Debug for HarnessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HarnessConfig")
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("api", &self.api)
            .field("workspace", &self.workspace)
            .field("fixture", &self.fixture)
            .finish()
    }
}

impl PostMergeHook for HarnessConfig {
    fn post_merge(&mut self, _ctx: &PostMergeContext) -> OrthoResult<()> {
        if self
            .token
            .as_deref()
            .is_some_and(|token| token.trim().is_empty())
        {
            self.token = None;
        }
        Ok(())
    }
}
