//! Per-scenario fixture lifecycle.
//!
//! Every scenario gets a fresh remote container folder and a fresh local
//! workspace. [`ScenarioFixture`] owns both and moves through
//! `Uninitialized -> Provisioned -> TornDown`. Teardown runs exactly once:
//! explicitly through [`ScenarioFixture::teardown`], or from `Drop` when a
//! scenario body unwinds past it.
//!
//! [`Harness`] ties a client, a session token, and a runtime together and
//! runs scenario bodies with a guaranteed finaliser. Teardown failures never
//! mask step failures; see [`conclude`].
//!
//! The async client is driven through a dedicated tokio runtime, so fixture
//! calls block and must not be made from inside an async context.


use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use camino::Utf8PathBuf;
use tokio::runtime::{Handle, Runtime};
use tracing::{debug, info, warn};

use crate::client::{BoxClient, ContainerLifecycle, Resource, SessionToken};
use crate::config::HarnessConfig;
use crate::error::{FixtureError, HarnessError, ScenarioError, StepError};
use crate::steps::ScenarioContext;
use crate::workspace::{self, LocalWorkspace, RemovalReport, remove_workspace_recursive};

/// Lifecycle state of a [`ScenarioFixture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureState {
    /// Nothing has been created yet.
    Uninitialized,
    /// The remote container and local workspace both exist.
    Provisioned,
    /// Release has run; nothing is held any more.
    TornDown,
}

/// Where fixtures are created and how they are named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureSettings {
    /// Folder under which remote containers are created.
    pub root_folder_id: String,
    /// Prefix for container and workspace names.
    pub name_prefix: String,
    /// Directory under which local workspaces are created.
    pub workspace_root: Utf8PathBuf,
}

impl FixtureSettings {
    /// Derive fixture settings from the resolved configuration.
    #[must_use]
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self {
            root_folder_id: config.fixture.root_folder_id.clone(),
            name_prefix: config.fixture.container_prefix.clone(),
            workspace_root: config.workspace.root.clone(),
        }
    }
}

/// What teardown released.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// Identifier of the deleted remote container, if one was held.
    pub container_id: Option<String>,
    /// Result of the local workspace removal, if one was held.
    pub workspace: Option<RemovalReport>,
}

/// The remote container and local workspace of one scenario.
pub struct ScenarioFixture {
    lifecycle: Arc<dyn ContainerLifecycle>,
    token: SessionToken,
    runtime: Arc<Runtime>,
    settings: FixtureSettings,
    state: FixtureState,
    container: Option<Resource>,
    workspace: Option<LocalWorkspace>,
}

impl std::fmt::Debug for ScenarioFixture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioFixture")
            .field("state", &self.state)
            .field("container", &self.container.as_ref().map(|c| &c.id))
            .field("workspace", &self.workspace.as_ref().map(LocalWorkspace::path))
            .finish_non_exhaustive()
    }
}

impl ScenarioFixture {
    /// Create an uninitialized fixture.
    #[must_use]
    pub fn new(
        lifecycle: Arc<dyn ContainerLifecycle>,
        token: SessionToken,
        runtime: Arc<Runtime>,
        settings: FixtureSettings,
    ) -> Self {
        Self {
            lifecycle,
            token,
            runtime,
            settings,
            state: FixtureState::Uninitialized,
            container: None,
            workspace: None,
        }
    }

    /// The current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> FixtureState {
        self.state
    }

    /// The remote container, while provisioned.
    #[must_use]
    pub const fn container(&self) -> Option<&Resource> {
        self.container.as_ref()
    }

    /// The remote container identifier, while provisioned.
    #[must_use]
    pub fn container_id(&self) -> Option<&str> {
        self.container.as_ref().map(|container| container.id.as_str())
    }

    /// The local workspace, while provisioned.
    #[must_use]
    pub const fn workspace(&self) -> Option<&LocalWorkspace> {
        self.workspace.as_ref()
    }

    /// The session token used for fixture calls.
    #[must_use]
    pub const fn token(&self) -> &SessionToken {
        &self.token
    }

    /// The runtime that drives async client calls for this scenario.
    #[must_use]
    pub const fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    /// Create the remote container, then the local workspace.
    ///
    /// If the workspace cannot be created the container is destroyed again
    /// before the error is returned, so a failed provision holds nothing.
    ///
    /// # Errors
    ///
    /// Returns `FixtureError::ProvisionFailed` if either resource cannot be
    /// created, `FixtureError::RuntimeUnavailable` if called from inside an
    /// async context, and `FixtureError::ProvisionFailed` if the fixture was
    /// already provisioned.
    pub fn provision(&mut self) -> Result<(), FixtureError> {
        if self.state != FixtureState::Uninitialized {
            return Err(FixtureError::ProvisionFailed {
                resource: "scenario fixture",
                message: format!("cannot provision from state {:?}", self.state),
            });
        }
        ensure_blocking_context()?;

        let name = workspace::unique_name(&self.settings.name_prefix);
        let lifecycle = Arc::clone(&self.lifecycle);
        let container = self
            .runtime
            .block_on(lifecycle.create_container(
                &self.token,
                &name,
                &self.settings.root_folder_id,
            ))
            .map_err(|error| FixtureError::ProvisionFailed {
                resource: "remote container",
                message: error.to_string(),
            })?;

        let local = match LocalWorkspace::create(
            &self.settings.workspace_root,
            &self.settings.name_prefix,
        ) {
            Ok(local) => local,
            Err(error) => {
                if let Err(cleanup) = self
                    .runtime
                    .block_on(lifecycle.destroy_container(&self.token, &container.id))
                {
                    warn!(
                        container_id = %container.id,
                        error = %cleanup,
                        "failed to release container after workspace creation failed"
                    );
                }
                return Err(FixtureError::ProvisionFailed {
                    resource: "local workspace",
                    message: error.to_string(),
                });
            }
        };

        info!(
            container_id = %container.id,
            workspace = %local.path(),
            "provisioned scenario fixture"
        );
        self.container = Some(container);
        self.workspace = Some(local);
        self.state = FixtureState::Provisioned;
        Ok(())
    }

    /// Release the remote container and the local workspace.
    ///
    /// Both releases are attempted even if the first fails. Calling this on a
    /// fixture that is not provisioned is a no-op, so release happens at most
    /// once.
    ///
    /// # Errors
    ///
    /// Returns `FixtureError::TeardownFailed` naming every release that failed,
    /// or `FixtureError::RuntimeUnavailable` if called from an async context.
    pub fn teardown(&mut self) -> Result<TeardownReport, FixtureError> {
        if self.state != FixtureState::Provisioned {
            debug!(state = ?self.state, "teardown skipped");
            return Ok(TeardownReport::default());
        }
        ensure_blocking_context()?;
        self.state = FixtureState::TornDown;

        let mut report = TeardownReport::default();
        let mut failures = Vec::new();

        if let Some(container) = self.container.take() {
            let lifecycle = Arc::clone(&self.lifecycle);
            match self
                .runtime
                .block_on(lifecycle.destroy_container(&self.token, &container.id))
            {
                Ok(()) => report.container_id = Some(container.id),
                Err(error) => failures.push(format!("remote container {}: {error}", container.id)),
            }
        }

        if let Some(local) = self.workspace.take() {
            let path = local.path().to_path_buf();
            drop(local);
            match remove_workspace_recursive(&path) {
                Ok(removal) => report.workspace = Some(removal),
                Err(error) => failures.push(format!("local workspace: {error}")),
            }
        }

        if failures.is_empty() {
            info!(
                container_id = report.container_id.as_deref().unwrap_or_default(),
                "tore down scenario fixture"
            );
            Ok(report)
        } else {
            Err(FixtureError::TeardownFailed {
                message: failures.join("; "),
            })
        }
    }
}

impl Drop for ScenarioFixture {
    fn drop(&mut self) {
        if self.state != FixtureState::Provisioned {
            return;
        }
        if Handle::try_current().is_ok() {
            warn!(
                container_id = self.container_id().unwrap_or_default(),
                "scenario fixture dropped inside an async context; resources leaked"
            );
            return;
        }
        if let Err(error) = self.teardown() {
            warn!(%error, "teardown from drop failed");
        }
    }
}

/// Apply the failure policy to a finished scenario.
///
/// A step failure is always reported; a teardown failure is carried next to
/// it rather than replacing it. A teardown failure after passing steps is its
/// own verdict.
///
/// # Errors
///
/// Returns the `ScenarioError` matching whichever of the two results failed.
pub fn conclude(
    steps: Result<(), StepError>,
    teardown: Result<TeardownReport, FixtureError>,
) -> Result<TeardownReport, ScenarioError> {
    match (steps, teardown) {
        (Ok(()), Ok(report)) => Ok(report),
        (Err(step), Ok(_)) => Err(ScenarioError::Step(step)),
        (Ok(()), Err(teardown_error)) => Err(ScenarioError::Teardown(teardown_error)),
        (Err(step), Err(teardown_error)) => Err(ScenarioError::StepAndTeardown {
            step,
            teardown: teardown_error,
        }),
    }
}

/// Shared entry point for running scenarios.
///
/// The token and runtime are the only state shared across scenarios; every
/// call to [`Harness::begin_scenario`] yields an independent fixture, so
/// scenarios can run concurrently from different threads.
pub struct Harness {
    client: Arc<BoxClient>,
    lifecycle: Arc<dyn ContainerLifecycle>,
    token: SessionToken,
    runtime: Arc<Runtime>,
    settings: FixtureSettings,
}

impl Harness {
    /// Build a harness whose fixtures are managed by `client` itself.
    #[must_use]
    pub fn new(
        client: BoxClient,
        token: SessionToken,
        settings: FixtureSettings,
        runtime: Arc<Runtime>,
    ) -> Self {
        let shared = Arc::new(client);
        let lifecycle = Arc::clone(&shared) as Arc<dyn ContainerLifecycle>;
        Self::with_lifecycle(shared, lifecycle, token, settings, runtime)
    }

    /// Build a harness with a separate fixture lifecycle implementation.
    #[must_use]
    pub fn with_lifecycle(
        client: Arc<BoxClient>,
        lifecycle: Arc<dyn ContainerLifecycle>,
        token: SessionToken,
        settings: FixtureSettings,
        runtime: Arc<Runtime>,
    ) -> Self {
        Self {
            client,
            lifecycle,
            token,
            runtime,
            settings,
        }
    }

    /// Build a harness from resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingRequired` if no token is configured,
    /// `ApiError::InvalidUrl` for a malformed endpoint, and
    /// `FixtureError::RuntimeUnavailable` if the runtime cannot be created.
    pub fn from_config(config: &HarnessConfig) -> Result<Self, HarnessError> {
        let token = config.session_token()?;
        let client = BoxClient::from_config(&config.api)?;
        let runtime = Runtime::new().map_err(|e| FixtureError::RuntimeUnavailable {
            message: e.to_string(),
        })?;
        Ok(Self::new(
            client,
            token,
            FixtureSettings::from_config(config),
            Arc::new(runtime),
        ))
    }

    /// The shared storage client.
    #[must_use]
    pub const fn client(&self) -> &Arc<BoxClient> {
        &self.client
    }

    /// The session token.
    #[must_use]
    pub const fn token(&self) -> &SessionToken {
        &self.token
    }

    /// The runtime used for blocking calls.
    #[must_use]
    pub const fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    /// Create an unprovisioned fixture for a new scenario.
    #[must_use]
    pub fn begin_scenario(&self) -> ScenarioFixture {
        ScenarioFixture::new(
            Arc::clone(&self.lifecycle),
            self.token.clone(),
            Arc::clone(&self.runtime),
            self.settings.clone(),
        )
    }

    /// Provision a fixture, run `body` against a fresh context, then tear down.
    ///
    /// Teardown runs whether `body` returns an error or panics. A panic is
    /// reported as `StepError::Panicked`.
    ///
    /// # Errors
    ///
    /// Returns `ScenarioError::Setup` if provisioning fails (no step runs),
    /// and otherwise the verdict computed by [`conclude`].
    pub fn run_scenario<F>(&self, body: F) -> Result<TeardownReport, ScenarioError>
    where
        F: FnOnce(&mut ScenarioContext) -> Result<(), StepError>,
    {
        let mut fixture = self.begin_scenario();
        fixture.provision().map_err(ScenarioError::Setup)?;

        let mut context = ScenarioContext::new(fixture, Arc::clone(&self.client));
        let steps = panic::catch_unwind(AssertUnwindSafe(|| body(&mut context)))
            .unwrap_or_else(|payload| {
                Err(StepError::Panicked {
                    message: panic_message(payload.as_ref()),
                })
            });

        let teardown = context.fixture_mut().teardown();
        let verdict = conclude(steps, teardown);
        match &verdict {
            Ok(_) => info!("scenario passed"),
            Err(error) => warn!(%error, "scenario failed"),
        }
        verdict
    }
}

fn ensure_blocking_context() -> Result<(), FixtureError> {
    if Handle::try_current().is_ok() {
        return Err(FixtureError::RuntimeUnavailable {
            message: String::from("called from inside a tokio runtime"),
        });
    }
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| String::from("non-string panic payload"))
}
