//! Scenario state for configuration behavioural tests.

use boxharness::config::HarnessConfig;
use ortho_config::serde_json::Value;
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;

/// Layers collected by the given steps and the merged result.
#[derive(Default, ScenarioState)]
pub(crate) struct ConfigState {
    pub(crate) file_layer: Slot<Value>,
    pub(crate) env_layer: Slot<Value>,
    pub(crate) cli_layer: Slot<Value>,
    pub(crate) config: Slot<HarnessConfig>,
}

#[fixture]
pub(crate) fn config_state() -> ConfigState {
    ConfigState::default()
}
