//! Assertion helpers for lifecycle behavioural tests.

use rstest_bdd_macros::then;

use super::StepResult;
use super::state::{LifecycleState, Verdict};

fn single_verdict(lifecycle_state: &LifecycleState) -> StepResult<Verdict> {
    let verdicts = lifecycle_state
        .verdicts
        .get()
        .ok_or_else(|| String::from("verdicts should be set"))?;
    match verdicts.as_slice() {
        [verdict] => Ok(verdict.clone()),
        other => Err(format!("expected one scenario, got {}", other.len())),
    }
}

#[then("every scenario passes")]
fn every_scenario_passes(lifecycle_state: &LifecycleState) -> StepResult<()> {
    let verdicts = lifecycle_state
        .verdicts
        .get()
        .ok_or_else(|| String::from("verdicts should be set"))?;
    if verdicts.is_empty() {
        return Err(String::from("no scenarios ran"));
    }
    match verdicts.iter().find(|verdict| **verdict != Verdict::Passed) {
        None => Ok(()),
        Some(failed) => Err(format!("expected every scenario to pass, got {failed:?}")),
    }
}

#[then("the scenario fails with a conflict")]
fn scenario_fails_with_conflict(lifecycle_state: &LifecycleState) -> StepResult<()> {
    match single_verdict(lifecycle_state)? {
        Verdict::StepFailed(message) if message.starts_with("conflict:") => Ok(()),
        other => Err(format!("expected a conflict, got {other:?}")),
    }
}

#[then("the scenario fails during setup")]
fn scenario_fails_during_setup(lifecycle_state: &LifecycleState) -> StepResult<()> {
    match single_verdict(lifecycle_state)? {
        Verdict::SetupFailed => Ok(()),
        other => Err(format!("expected a setup failure, got {other:?}")),
    }
}

#[then("the steps pass but teardown fails")]
fn steps_pass_but_teardown_fails(lifecycle_state: &LifecycleState) -> StepResult<()> {
    match single_verdict(lifecycle_state)? {
        Verdict::TeardownFailed => Ok(()),
        other => Err(format!("expected a teardown-only failure, got {other:?}")),
    }
}

#[then("no remote items remain")]
fn no_remote_items_remain(lifecycle_state: &LifecycleState) -> StepResult<()> {
    let rig = lifecycle_state
        .rig
        .get()
        .ok_or_else(|| String::from("fake storage service should be started"))?;
    let leftovers = rig.remote_leftovers();
    if leftovers.is_empty() {
        Ok(())
    } else {
        Err(format!("remote items left behind: {leftovers:?}"))
    }
}

#[then("no local workspaces remain")]
fn no_local_workspaces_remain(lifecycle_state: &LifecycleState) -> StepResult<()> {
    let rig = lifecycle_state
        .rig
        .get()
        .ok_or_else(|| String::from("fake storage service should be started"))?;
    match rig.local_leftovers() {
        0 => Ok(()),
        count => Err(format!("{count} local workspaces left behind")),
    }
}
