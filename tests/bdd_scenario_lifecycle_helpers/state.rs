//! Scenario state for lifecycle behavioural tests.

use std::sync::Arc;

use boxharness::error::ScenarioError;
use boxharness::runner::ScenarioVerdict;
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;

use crate::fake_box::Rig;

/// How a scenario under test ended, reduced to what the assertions inspect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Verdict {
    Passed,
    SetupFailed,
    StepFailed(String),
    TeardownFailed,
    StepAndTeardownFailed,
    Unsupported,
}

impl Verdict {
    pub(crate) fn from_error(error: &ScenarioError) -> Self {
        match error {
            ScenarioError::Setup(_) => Self::SetupFailed,
            ScenarioError::Step(step) => Self::StepFailed(step.to_string()),
            ScenarioError::Teardown(_) => Self::TeardownFailed,
            ScenarioError::StepAndTeardown { .. } => Self::StepAndTeardownFailed,
        }
    }

    pub(crate) fn from_runner(verdict: &ScenarioVerdict) -> Self {
        match verdict {
            ScenarioVerdict::Passed => Self::Passed,
            ScenarioVerdict::Failed(error) => Self::from_error(error),
            ScenarioVerdict::Unsupported { .. } => Self::Unsupported,
        }
    }
}

#[derive(Default, ScenarioState)]
pub(crate) struct LifecycleState {
    pub(crate) rig: Slot<Arc<Rig>>,
    pub(crate) verdicts: Slot<Vec<Verdict>>,
}

#[fixture]
pub(crate) fn lifecycle_state() -> LifecycleState {
    LifecycleState::default()
}
