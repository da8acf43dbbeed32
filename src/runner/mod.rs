//! Gherkin feature-file runner.
//!
//! Each scenario becomes an ordered list of step texts: the feature
//! `Background` first, then a rule's `Background`, then the scenario's own
//! steps. Every scenario runs in a fresh fixture through
//! [`Harness::run_scenario`], so one scenario's failure never leaks into the
//! next. Scenario outlines are reported as unsupported.


use std::path::PathBuf;

use camino::Utf8Path;
use gherkin::{Feature, GherkinEnv, Scenario, Step};
use tracing::{info, warn};

use crate::error::{HarnessError, ScenarioError};
use crate::fixture::Harness;
use crate::steps::StepRegistry;

/// A scenario flattened into the step texts it will run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedScenario {
    /// The scenario title.
    pub name: String,
    /// Step texts without keywords, background steps first.
    pub steps: Vec<String>,
    /// Whether the scenario is an outline with examples.
    pub outline: bool,
}

/// How a single scenario ended.
#[derive(Debug)]
pub enum ScenarioVerdict {
    /// Every step passed and teardown succeeded.
    Passed,
    /// Setup, a step, or teardown failed.
    Failed(ScenarioError),
    /// The scenario uses a construct the runner does not execute.
    Unsupported {
        /// Why the scenario was not run.
        reason: String,
    },
}

/// Outcome of one scenario.
#[derive(Debug)]
pub struct ScenarioOutcome {
    /// The scenario title.
    pub name: String,
    /// What happened.
    pub verdict: ScenarioVerdict,
}

impl ScenarioOutcome {
    /// Whether the scenario passed.
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self.verdict, ScenarioVerdict::Passed)
    }
}

/// Per-scenario outcomes of one feature file.
#[derive(Debug)]
pub struct FeatureReport {
    /// The feature title.
    pub name: String,
    /// Scenario outcomes in file order.
    pub scenarios: Vec<ScenarioOutcome>,
}

impl FeatureReport {
    /// Number of passing scenarios.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.scenarios.iter().filter(|outcome| outcome.passed()).count()
    }

    /// Number of failing or unsupported scenarios.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.scenarios.len().saturating_sub(self.passed())
    }

    /// Whether every scenario passed. Unsupported scenarios count as failures.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Flatten a parsed feature into runnable scenarios, in file order.
#[must_use]
pub fn plan(feature: &Feature) -> Vec<PlannedScenario> {
    let feature_background = feature
        .background
        .as_ref()
        .map(|background| background.steps.as_slice())
        .unwrap_or_default();

    let top_level = feature
        .scenarios
        .iter()
        .map(|scenario| planned(scenario, &[feature_background]));
    let ruled = feature.rules.iter().flat_map(|rule| {
        let rule_background = rule
            .background
            .as_ref()
            .map(|background| background.steps.as_slice())
            .unwrap_or_default();
        rule.scenarios
            .iter()
            .map(move |scenario| planned(scenario, &[feature_background, rule_background]))
    });
    top_level.chain(ruled).collect()
}

fn planned(scenario: &Scenario, backgrounds: &[&[Step]]) -> PlannedScenario {
    let steps = backgrounds
        .iter()
        .flat_map(|steps| steps.iter())
        .chain(scenario.steps.iter())
        .map(|step| step.value.trim().to_owned())
        .collect();
    PlannedScenario {
        name: scenario.name.clone(),
        steps,
        outline: !scenario.examples.is_empty(),
    }
}

/// Runs feature files against a harness with a fixed step registry.
#[derive(Clone, Copy)]
pub struct FeatureRunner<'a> {
    harness: &'a Harness,
    registry: &'a StepRegistry,
}

impl<'a> FeatureRunner<'a> {
    /// Build a runner.
    #[must_use]
    pub const fn new(harness: &'a Harness, registry: &'a StepRegistry) -> Self {
        Self { harness, registry }
    }

    /// Parse and run the feature file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::Feature` if the file cannot be read or parsed.
    /// Scenario failures are reported in the returned [`FeatureReport`].
    pub fn run_path(&self, path: &Utf8Path) -> Result<FeatureReport, HarnessError> {
        let feature = Feature::parse_path(path, GherkinEnv::default()).map_err(|e| {
            HarnessError::Feature {
                path: path.as_std_path().to_path_buf(),
                message: e.to_string(),
            }
        })?;
        Ok(self.run_feature(&feature))
    }

    /// Parse and run feature source text. `origin` names it in errors.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::Feature` if the text cannot be parsed.
    pub fn run_source(&self, source: &str, origin: &str) -> Result<FeatureReport, HarnessError> {
        let feature = Feature::parse(source, GherkinEnv::default()).map_err(|e| {
            HarnessError::Feature {
                path: PathBuf::from(origin),
                message: e.to_string(),
            }
        })?;
        Ok(self.run_feature(&feature))
    }

    /// Run every scenario of an already parsed feature.
    #[must_use]
    pub fn run_feature(&self, feature: &Feature) -> FeatureReport {
        info!(feature = %feature.name, "running feature");
        let scenarios = plan(feature)
            .into_iter()
            .map(|scenario| self.run_planned(scenario))
            .collect();
        FeatureReport {
            name: feature.name.clone(),
            scenarios,
        }
    }

    fn run_planned(&self, scenario: PlannedScenario) -> ScenarioOutcome {
        if scenario.outline {
            warn!(scenario = %scenario.name, "scenario outlines are not supported");
            return ScenarioOutcome {
                name: scenario.name,
                verdict: ScenarioVerdict::Unsupported {
                    reason: String::from("scenario outlines are not supported"),
                },
            };
        }

        info!(scenario = %scenario.name, steps = scenario.steps.len(), "running scenario");
        let registry = self.registry;
        let result = self.harness.run_scenario(|context| {
            scenario
                .steps
                .iter()
                .try_for_each(|step| registry.execute(context, step))
        });
        let verdict = match result {
            Ok(_) => ScenarioVerdict::Passed,
            Err(error) => ScenarioVerdict::Failed(error),
        };
        ScenarioOutcome {
            name: scenario.name,
            verdict,
        }
    }
}
