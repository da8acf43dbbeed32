//! `boxharness` application entry point.
//!
//! Runs Gherkin feature files against the configured storage API. It uses
//! `eyre` for opaque error handling at the application boundary, converting
//! domain-specific errors into human-readable reports.
//!
//! Configuration is loaded with layered precedence via `OrthoConfig`:
//! 1. Application defaults
//! 2. Configuration file (`~/.config/boxharness/config.toml` or path from `BOXHARNESS_CONFIG_PATH`)
//! 3. Environment variables (`BOXHARNESS_*`)
//! 4. Command-line arguments

use boxharness::client::ContainerLifecycle;
use boxharness::config::{Cli, Commands, HarnessConfig, PurgeArgs, RunArgs, load_config};
use boxharness::error::Result as HarnessResult;
use boxharness::fixture::Harness;
use boxharness::runner::{FeatureReport, FeatureRunner, ScenarioVerdict};
use boxharness::steps::StepRegistry;
use clap::Parser;
use eyre::{Report, Result as EyreResult, bail};
use tracing_subscriber::EnvFilter;

/// Application entry point.
///
/// Installs logging, loads configuration, then dispatches to the subcommand
/// handler. Exits non-zero when any scenario fails.
fn main() -> EyreResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = load_config(&cli).map_err(Report::from)?;

    let failed = run(&cli, &config).map_err(Report::from)?;
    if failed > 0 {
        bail!("{failed} scenario(s) did not pass");
    }
    Ok(())
}

/// Install the global subscriber. `RUST_LOG` overrides the `info` default.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Execute the CLI command, returning the number of scenarios that did not
/// pass.
///
/// Keeps semantic errors inside the run loop so the CLI boundary owns
/// conversion to `eyre::Report`.
fn run(cli: &Cli, config: &HarnessConfig) -> HarnessResult<usize> {
    match &cli.command {
        Commands::Run(args) => run_features(config, args),
        Commands::Steps => list_steps().map(|()| 0),
        Commands::Purge(args) => purge(config, args).map(|()| 0),
    }
}

/// Run every feature file and print a summary per scenario.
fn run_features(config: &HarnessConfig, args: &RunArgs) -> HarnessResult<usize> {
    let harness = Harness::from_config(config)?;
    let registry = StepRegistry::storage()?;
    let runner = FeatureRunner::new(&harness, &registry);

    let mut failed = 0;
    for path in &args.features {
        let report = runner.run_path(path)?;
        print_report(&report);
        failed += report.failed();
    }
    Ok(failed)
}

#[expect(clippy::print_stdout, reason = "CLI output is the intended behaviour")]
fn print_report(report: &FeatureReport) {
    println!("Feature: {}", report.name);
    for outcome in &report.scenarios {
        match &outcome.verdict {
            ScenarioVerdict::Passed => println!("  ok      {}", outcome.name),
            ScenarioVerdict::Failed(error) => println!("  FAILED  {}: {error}", outcome.name),
            ScenarioVerdict::Unsupported { reason } => {
                println!("  SKIPPED {}: {reason}", outcome.name);
            }
        }
    }
    println!(
        "  {} passed, {} not passed",
        report.passed(),
        report.failed()
    );
}

/// Print the registered phrases in match order.
#[expect(clippy::print_stdout, reason = "CLI output is the intended behaviour")]
fn list_steps() -> HarnessResult<()> {
    for definition in StepRegistry::storage()?.definitions() {
        println!("{:<5} {}", definition.keyword(), definition.phrase());
    }
    Ok(())
}

/// Force-delete a leaked container folder.
#[expect(clippy::print_stdout, reason = "CLI output is the intended behaviour")]
fn purge(config: &HarnessConfig, args: &PurgeArgs) -> HarnessResult<()> {
    let harness = Harness::from_config(config)?;
    harness.runtime().block_on(
        harness
            .client()
            .destroy_container(harness.token(), &args.folder_id),
    )?;
    println!("Deleted folder {}", args.folder_id);
    Ok(())
}
