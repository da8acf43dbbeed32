//! Given/when/then steps for configuration scenarios.

use boxharness::config::HarnessConfig;
use ortho_config::MergeComposer;
use ortho_config::serde_json::{Value, json};
use rstest_bdd::Slot;
use rstest_bdd_macros::{given, then, when};

use super::StepResult;
use super::state::ConfigState;

/// Merge `addition` into whatever a layer already holds.
fn extend_layer(layer: &Slot<Value>, addition: Value) {
    let mut merged = layer.get().unwrap_or_else(|| json!({}));
    if let (Some(target), Value::Object(fields)) = (merged.as_object_mut(), addition) {
        for (key, value) in fields {
            match (target.get_mut(&key), value) {
                (Some(Value::Object(existing)), Value::Object(nested)) => existing.extend(nested),
                (_, other) => {
                    target.insert(key, other);
                }
            }
        }
    }
    layer.set(merged);
}

fn merged_config(config_state: &ConfigState) -> StepResult<HarnessConfig> {
    config_state
        .config
        .get()
        .ok_or_else(|| String::from("configuration should be merged"))
}

#[given("no configuration is provided")]
fn no_configuration_provided(config_state: &ConfigState) {
    let _ = config_state;
}

#[given("a configuration file with token {token}")]
fn file_with_token(config_state: &ConfigState, token: String) {
    extend_layer(&config_state.file_layer, json!({ "token": token }));
}

#[given("the environment holds a blank token")]
fn env_blank_token(config_state: &ConfigState) {
    extend_layer(&config_state.env_layer, json!({ "token": "  " }));
}

#[given("the environment sets the token to {token}")]
fn env_token(config_state: &ConfigState, token: String) {
    extend_layer(&config_state.env_layer, json!({ "token": token }));
}

#[given("the environment sets the API base URL to {url}")]
fn env_base_url(config_state: &ConfigState, url: String) {
    extend_layer(&config_state.env_layer, json!({ "api": { "base_url": url } }));
}

#[given("the command line sets the API base URL to {url}")]
fn cli_base_url(config_state: &ConfigState, url: String) {
    extend_layer(&config_state.cli_layer, json!({ "api": { "base_url": url } }));
}

#[when("configuration is merged")]
fn configuration_is_merged(config_state: &ConfigState) -> StepResult<()> {
    let mut composer = MergeComposer::new();
    let defaults = ortho_config::serde_json::to_value(HarnessConfig::default())
        .map_err(|e| format!("defaults should serialise: {e}"))?;
    composer.push_defaults(defaults);
    if let Some(file_layer) = config_state.file_layer.get() {
        composer.push_file(file_layer, None);
    }
    if let Some(env_layer) = config_state.env_layer.get() {
        composer.push_environment(env_layer);
    }
    if let Some(cli_layer) = config_state.cli_layer.get() {
        composer.push_cli(cli_layer);
    }

    let config = HarnessConfig::merge_from_layers(composer.layers())
        .map_err(|e| format!("merge should succeed: {e}"))?;
    config_state.config.set(config);
    Ok(())
}

#[then("the API base URL is {url}")]
fn api_base_url_is(config_state: &ConfigState, url: String) -> StepResult<()> {
    let config = merged_config(config_state)?;
    if config.api.base_url == url {
        Ok(())
    } else {
        Err(format!("expected base URL {url}, got {}", config.api.base_url))
    }
}

#[then("the container prefix is {prefix}")]
fn container_prefix_is(config_state: &ConfigState, prefix: String) -> StepResult<()> {
    let config = merged_config(config_state)?;
    if config.fixture.container_prefix == prefix {
        Ok(())
    } else {
        Err(format!(
            "expected prefix {prefix}, got {}",
            config.fixture.container_prefix
        ))
    }
}

#[then("the root folder is {id}")]
fn root_folder_is(config_state: &ConfigState, id: String) -> StepResult<()> {
    let config = merged_config(config_state)?;
    if config.fixture.root_folder_id == id {
        Ok(())
    } else {
        Err(format!(
            "expected root folder {id}, got {}",
            config.fixture.root_folder_id
        ))
    }
}

#[then("the session token is {token}")]
fn session_token_is(config_state: &ConfigState, token: String) -> StepResult<()> {
    let config = merged_config(config_state)?;
    let session = config
        .session_token()
        .map_err(|e| format!("expected a session token: {e}"))?;
    if session.expose() == token {
        Ok(())
    } else {
        Err(String::from("session token did not match"))
    }
}

#[then("no session token is available")]
fn no_session_token(config_state: &ConfigState) -> StepResult<()> {
    let config = merged_config(config_state)?;
    match config.session_token() {
        Err(_) => Ok(()),
        Ok(_) => Err(String::from("expected the token to be missing")),
    }
}
