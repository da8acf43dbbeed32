//! A harness wired to a fresh fake service and scratch workspace root.

use std::sync::Arc;

use boxharness::client::{BoxClient, SessionToken};
use boxharness::fixture::{FixtureSettings, Harness};
use boxharness::runner::{FeatureReport, FeatureRunner, ScenarioVerdict};
use boxharness::steps::StepRegistry;
use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;
use tokio::runtime::Runtime;

use super::{FakeBox, ROOT_ID, TOKEN};

/// Everything one test needs to run scenarios end to end.
pub(crate) struct Rig {
    fake: FakeBox,
    harness: Harness,
    registry: StepRegistry,
    scratch: TempDir,
}

impl Rig {
    /// Start a fake and build a harness that authenticates with `token`.
    pub(crate) fn with_token(token: &str) -> Self {
        let runtime = Arc::new(Runtime::new().expect("tokio runtime creation should succeed"));
        let fake = runtime.block_on(FakeBox::start());
        let scratch = tempfile::tempdir().expect("tempdir should be created");
        let client =
            BoxClient::new(&fake.api_url(), &fake.upload_url()).expect("client should build");
        let settings = FixtureSettings {
            root_folder_id: ROOT_ID.to_owned(),
            name_prefix: String::from("tmp_"),
            workspace_root: Utf8PathBuf::from_path_buf(scratch.path().to_path_buf())
                .expect("temp path should be UTF-8"),
        };
        let harness = Harness::new(client, SessionToken::new(token), settings, runtime);
        Self {
            fake,
            harness,
            registry: StepRegistry::storage().expect("storage phrases should compile"),
            scratch,
        }
    }

    pub(crate) const fn fake(&self) -> &FakeBox {
        &self.fake
    }

    pub(crate) const fn harness(&self) -> &Harness {
        &self.harness
    }

    /// Run inline feature text.
    pub(crate) fn run_source(&self, source: &str) -> FeatureReport {
        FeatureRunner::new(&self.harness, &self.registry)
            .run_source(source, "inline.feature")
            .expect("inline feature should parse")
    }

    /// Run a file from `tests/features/storage`.
    pub(crate) fn run_storage_feature(&self, file: &str) -> FeatureReport {
        let path = Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/features/storage")
            .join(file);
        FeatureRunner::new(&self.harness, &self.registry)
            .run_path(&path)
            .expect("feature should load")
    }

    fn workspace_root(&self) -> &Utf8Path {
        Utf8Path::from_path(self.scratch.path()).expect("temp path should be UTF-8")
    }

    /// Number of entries left under the workspace root.
    pub(crate) fn local_leftovers(&self) -> usize {
        std::fs::read_dir(self.workspace_root())
            .expect("workspace root should be readable")
            .count()
    }

    /// Names of live remote items left under the root folder.
    pub(crate) fn remote_leftovers(&self) -> Vec<String> {
        self.fake.live_names()
    }

    /// Names of items still in the trash, as the API lists them.
    ///
    /// Lists with the accepted token so rigs built with a rejected one can
    /// still be inspected.
    pub(crate) fn trash_leftovers(&self) -> Vec<String> {
        let folders = self.harness.client().folders();
        let trash = self
            .harness
            .runtime()
            .block_on(folders.get_trash(&SessionToken::new(TOKEN)))
            .expect("trash should be listable");
        trash.names().into_iter().map(str::to_owned).collect()
    }
}

/// One line per scenario that did not pass.
pub(crate) fn failures(report: &FeatureReport) -> Vec<String> {
    report
        .scenarios
        .iter()
        .filter(|outcome| !outcome.passed())
        .map(|outcome| match &outcome.verdict {
            ScenarioVerdict::Failed(error) => format!("{}: {error}", outcome.name),
            ScenarioVerdict::Unsupported { reason } => format!("{}: {reason}", outcome.name),
            ScenarioVerdict::Passed => outcome.name.clone(),
        })
        .collect()
}
