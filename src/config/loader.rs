//! Configuration loading with layered precedence.
//!
//! Precedence (lowest to highest): application defaults, configuration file,
//! environment variables, command-line arguments.
//!
//! Layers are composed with `MergeComposer` directly rather than through the
//! derived `load()`, because `Cli` owns subcommand dispatch and because typed
//! environment values must fail fast instead of being silently dropped.
//!
//! Environment access goes through `mockable::Env` so tests can supply a
//! `MockEnv` instead of mutating the process environment.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use mockable::{DefaultEnv, Env};
use ortho_config::discovery::ConfigDiscovery;
use ortho_config::serde_json::{self, Map, Value};
use ortho_config::{MergeComposer, toml};
use tracing::debug;

use crate::config::{Cli, HarnessConfig};
use crate::error::ConfigError;

/// The type of value expected from an environment variable.
#[derive(Clone, Copy)]
enum EnvVarType {
    /// String value (always accepted).
    String,
    /// Unsigned 64-bit integer. Invalid values return an error.
    U64,
}

/// Specification for a single environment variable mapping.
struct EnvVarSpec {
    env_var: &'static str,
    path: &'static [&'static str],
    var_type: EnvVarType,
}

const ENV_VAR_SPECS: &[EnvVarSpec] = &[
    EnvVarSpec {
        env_var: "BOXHARNESS_TOKEN",
        path: &["token"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "BOXHARNESS_API_BASE_URL",
        path: &["api", "base_url"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "BOXHARNESS_API_UPLOAD_URL",
        path: &["api", "upload_url"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "BOXHARNESS_WORKSPACE_ROOT",
        path: &["workspace", "root"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "BOXHARNESS_FIXTURE_CONTAINER_PREFIX",
        path: &["fixture", "container_prefix"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "BOXHARNESS_FIXTURE_ROOT_FOLDER_ID",
        path: &["fixture", "root_folder_id"],
        var_type: EnvVarType::U64,
    },
];

/// Returns the list of environment variable names recognised by the config loader.
///
/// Tests use this to clear every `BOXHARNESS_*` variable without keeping a
/// hard-coded copy of the table.
#[must_use]
pub fn env_var_names() -> Vec<&'static str> {
    ENV_VAR_SPECS.iter().map(|spec| spec.env_var).collect()
}

/// Load configuration from the process environment with full layer precedence.
///
/// # Errors
///
/// See [`load_config_with_env`].
pub fn load_config(cli: &Cli) -> Result<HarnessConfig, ConfigError> {
    load_config_with_env(cli, &DefaultEnv::new())
}

/// Load configuration with full layer precedence, reading variables from `env`.
///
/// 1. Application defaults defined in the struct
/// 2. Configuration file (`--config`, `BOXHARNESS_CONFIG_PATH`, or discovery)
/// 3. Environment variables prefixed with `BOXHARNESS_`
/// 4. Command-line arguments (from the provided `Cli`)
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - an explicit `--config` path does not exist
/// - a configuration file cannot be read or parsed
/// - a typed environment variable has an unparseable value
/// - the merged layers do not form a valid `HarnessConfig`
pub fn load_config_with_env(cli: &Cli, env: &impl Env) -> Result<HarnessConfig, ConfigError> {
    let mut composer = MergeComposer::new();

    let defaults =
        serde_json::to_value(HarnessConfig::default()).map_err(|e| ConfigError::ParseError {
            message: format!("failed to serialise defaults: {e}"),
        })?;
    composer.push_defaults(defaults);

    if let Some(path) = resolve_config_path(cli, env)? {
        load_config_file(&path, &mut composer)?;
    }

    let env_values = collect_env_vars(env)?;
    if !env_values.is_null() {
        composer.push_environment(env_values);
    }

    let cli_overrides = build_cli_overrides(cli);
    if !cli_overrides.is_null() {
        composer.push_cli(cli_overrides);
    }

    HarnessConfig::merge_from_layers(composer.layers()).map_err(ConfigError::OrthoConfig)
}

/// Pick the configuration file to load, if any.
///
/// An explicit `--config` path must exist. Otherwise `BOXHARNESS_CONFIG_PATH`
/// is honoured, then the usual discovery candidates.
fn resolve_config_path(cli: &Cli, env: &impl Env) -> Result<Option<Utf8PathBuf>, ConfigError> {
    if let Some(path) = &cli.config {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.as_std_path().to_path_buf(),
            });
        }
        return Ok(Some(path.clone()));
    }

    if let Some(path) = env
        .string("BOXHARNESS_CONFIG_PATH")
        .filter(|value| !value.trim().is_empty())
        .map(Utf8PathBuf::from)
    {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.as_std_path().to_path_buf(),
            });
        }
        return Ok(Some(path));
    }

    let discovery = ConfigDiscovery::builder("boxharness")
        .config_file_name("config.toml")
        .dotfile_name(".boxharness.toml")
        .build();
    Ok(discovery
        .candidates()
        .into_iter()
        .filter(|candidate| candidate.exists())
        .find_map(|candidate| Utf8PathBuf::try_from(candidate).ok()))
}

/// Load a configuration file and push it to the composer.
fn load_config_file(path: &Utf8Path, composer: &mut MergeComposer) -> Result<(), ConfigError> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let file_name = path.file_name().unwrap_or(path.as_str());

    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|e| {
        ConfigError::ParseError {
            message: format!("failed to open directory {parent}: {e}"),
        }
    })?;

    let content = dir
        .read_to_string(file_name)
        .map_err(|e| ConfigError::ParseError {
            message: format!("failed to read {path}: {e}"),
        })?;

    let value =
        toml::from_str::<serde_json::Value>(&content).map_err(|e| ConfigError::ParseError {
            message: format!("failed to parse {path}: {e}"),
        })?;

    debug!(%path, "loaded configuration file");
    composer.push_file(value, Some(path.to_path_buf()));
    Ok(())
}

/// Collect `BOXHARNESS_*` variables into a JSON value.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` if a typed variable has an unparseable
/// value.
fn collect_env_vars(env: &impl Env) -> Result<Value, ConfigError> {
    let mut root = Map::new();

    for spec in ENV_VAR_SPECS {
        let Some(raw_value) = env.string(spec.env_var) else {
            continue;
        };

        let json_value = match spec.var_type {
            EnvVarType::String => Value::String(raw_value),
            // Folder ids are numeric on the wire but stored as strings.
            EnvVarType::U64 => match raw_value.parse::<u64>() {
                Ok(n) => Value::String(n.to_string()),
                Err(_) => {
                    return Err(ConfigError::InvalidValue {
                        field: spec.env_var.to_owned(),
                        reason: format!("expected unsigned integer, got '{raw_value}'"),
                    });
                }
            },
        };

        insert_at_path(&mut root, spec.path, json_value);
    }

    if root.is_empty() {
        Ok(Value::Null)
    } else {
        Ok(Value::Object(root))
    }
}

/// Insert a value at a nested path in a JSON map.
fn insert_at_path(root: &mut Map<String, Value>, path: &[&str], value: Value) {
    let Some((&field, parents)) = path.split_last() else {
        return;
    };

    let mut current = root;
    for &segment in parents {
        let entry = current
            .entry(segment.to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
        let Some(obj) = entry.as_object_mut() else {
            return;
        };
        current = obj;
    }

    current.insert(field.to_owned(), value);
}

/// Build a JSON value containing CLI overrides.
fn build_cli_overrides(cli: &Cli) -> Value {
    let mut overrides = Map::new();

    if let Some(token) = &cli.token {
        overrides.insert(String::from("token"), Value::String(token.clone()));
    }

    if let Some(base_url) = &cli.api_base_url {
        insert_at_path(
            &mut overrides,
            &["api", "base_url"],
            Value::String(base_url.clone()),
        );
    }

    if overrides.is_empty() {
        Value::Null
    } else {
        Value::Object(overrides)
    }
}
