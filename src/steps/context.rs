//! Scenario-scoped state threaded through step handlers.

use std::future::Future;
use std::sync::Arc;

use crate::client::{
    BoxClient, DeleteOptions, ItemCollection, Resource, ResourceUpdate, SharedLinkAccess,
};
use crate::error::{AssertionFailure, StepError};
use crate::fixture::ScenarioFixture;

/// Content written by the local file step.
pub const LOCAL_FILE_CONTENT: &[u8] = b"content";

/// The most recent API response recorded by a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LastResult {
    /// A single folder or file description.
    Item(Resource),
    /// A list of items: folder contents, trash contents, or an upload receipt.
    Collection(ItemCollection),
}

impl LastResult {
    /// The resource that "that folder" or "the file" refers to.
    ///
    /// For a collection this is the first entry, which is how upload receipts
    /// name the uploaded file.
    #[must_use]
    pub fn subject(&self) -> Option<&Resource> {
        match self {
            Self::Item(resource) => Some(resource),
            Self::Collection(collection) => collection.entries.first(),
        }
    }

    /// The single resource, if this result is one.
    #[must_use]
    pub const fn as_item(&self) -> Option<&Resource> {
        match self {
            Self::Item(resource) => Some(resource),
            Self::Collection(_) => None,
        }
    }

    /// The collection, if this result is one.
    #[must_use]
    pub const fn as_collection(&self) -> Option<&ItemCollection> {
        match self {
            Self::Item(_) => None,
            Self::Collection(collection) => Some(collection),
        }
    }
}

/// Everything one scenario's steps share: its fixture, the client, and the
/// last result.
///
/// Each primitive makes at most one client call. Steps that produce a result
/// overwrite the last result; steps that only act on "that folder" leave it
/// alone so a following step can still address the same item.
#[derive(Debug)]
pub struct ScenarioContext {
    fixture: ScenarioFixture,
    client: Arc<BoxClient>,
    last: Option<LastResult>,
}

impl ScenarioContext {
    /// Wrap a provisioned fixture.
    #[must_use]
    pub const fn new(fixture: ScenarioFixture, client: Arc<BoxClient>) -> Self {
        Self {
            fixture,
            client,
            last: None,
        }
    }

    /// The scenario's fixture.
    #[must_use]
    pub const fn fixture(&self) -> &ScenarioFixture {
        &self.fixture
    }

    /// Mutable access to the fixture, used for teardown.
    pub const fn fixture_mut(&mut self) -> &mut ScenarioFixture {
        &mut self.fixture
    }

    /// The most recent recorded result.
    #[must_use]
    pub const fn last_result(&self) -> Option<&LastResult> {
        self.last.as_ref()
    }

    /// Overwrite the last result.
    pub fn record(&mut self, result: LastResult) {
        self.last = Some(result);
    }

    /// The most recent result, or `MissingResult` naming `step`.
    ///
    /// # Errors
    ///
    /// Returns `StepError::MissingResult` if no step has recorded a result.
    pub fn require_result(&self, step: &str) -> Result<&LastResult, StepError> {
        self.last.as_ref().ok_or_else(|| StepError::MissingResult {
            step: step.to_owned(),
        })
    }

    /// Identifier of the scenario's remote container.
    ///
    /// # Errors
    ///
    /// Returns an assertion failure if the fixture is not provisioned.
    pub fn base_id(&self) -> Result<String, StepError> {
        self.fixture
            .container_id()
            .map(str::to_owned)
            .ok_or_else(|| AssertionFailure::new("scenario container is not provisioned").into())
    }

    fn subject_id(&self, step: &str) -> Result<String, StepError> {
        self.require_result(step)?
            .subject()
            .map(|resource| resource.id.clone())
            .ok_or_else(|| StepError::MissingResult {
                step: step.to_owned(),
            })
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.fixture.runtime().block_on(future)
    }

    /// Create folder `name` in the container and record it.
    ///
    /// # Errors
    ///
    /// Returns the client failure, for example a name conflict.
    pub fn create_folder_in_base(&mut self, name: &str) -> Result<(), StepError> {
        let base = self.base_id()?;
        let folders = self.client.folders();
        let folder = self.block_on(folders.create(self.fixture.token(), name, &base))?;
        self.record(LastResult::Item(folder));
        Ok(())
    }

    /// Create folder `name` inside the subject folder without recording it.
    ///
    /// # Errors
    ///
    /// Returns `MissingResult` without a subject, or the client failure.
    pub fn create_folder_in_subject(&mut self, name: &str) -> Result<(), StepError> {
        let parent = self.subject_id("create a folder in that directory")?;
        let folders = self.client.folders();
        self.block_on(folders.create(self.fixture.token(), name, &parent))?;
        Ok(())
    }

    /// Fetch the subject folder and record it.
    ///
    /// # Errors
    ///
    /// Returns `MissingResult` without a subject, or the client failure.
    pub fn get_subject_folder(&mut self) -> Result<(), StepError> {
        let id = self.subject_id("get information about the folder")?;
        let folders = self.client.folders();
        let folder = self.block_on(folders.get(&id, self.fixture.token()))?;
        self.record(LastResult::Item(folder));
        Ok(())
    }

    /// Rename the subject folder.
    ///
    /// # Errors
    ///
    /// Returns `MissingResult` without a subject, or the client failure.
    pub fn rename_subject_folder(&mut self, name: &str) -> Result<(), StepError> {
        let id = self.subject_id("rename the folder")?;
        let folders = self.client.folders();
        self.block_on(folders.update(&id, self.fixture.token(), &ResourceUpdate::rename(name)))?;
        Ok(())
    }

    /// Copy the subject folder into the container as `name` and record the copy.
    ///
    /// # Errors
    ///
    /// Returns `MissingResult` without a subject, or the client failure.
    pub fn copy_subject_folder_to_base(&mut self, name: &str) -> Result<(), StepError> {
        let id = self.subject_id("copy that folder")?;
        let base = self.base_id()?;
        let folders = self.client.folders();
        let copy = self.block_on(folders.copy(&id, self.fixture.token(), name, &base))?;
        self.record(LastResult::Item(copy));
        Ok(())
    }

    /// Create an open shared link on the subject folder.
    ///
    /// # Errors
    ///
    /// Returns `MissingResult` without a subject, or the client failure.
    pub fn share_subject_folder(&mut self) -> Result<(), StepError> {
        let id = self.subject_id("create a shared link for that folder")?;
        let folders = self.client.folders();
        self.block_on(folders.create_shared_link(
            &id,
            self.fixture.token(),
            SharedLinkAccess::Open,
        ))?;
        Ok(())
    }

    /// Remove the shared link from the subject folder.
    ///
    /// # Errors
    ///
    /// Returns `MissingResult` without a subject, or the client failure.
    pub fn unshare_subject_folder(&mut self) -> Result<(), StepError> {
        let id = self.subject_id("delete a shared link for that folder")?;
        let folders = self.client.folders();
        self.block_on(folders.delete_shared_link(&id, self.fixture.token()))?;
        Ok(())
    }

    /// Move the subject folder to the trash.
    ///
    /// # Errors
    ///
    /// Returns `MissingResult` without a subject, or the client failure.
    pub fn trash_subject_folder(&mut self) -> Result<(), StepError> {
        let id = self.subject_id("move that folder to the trash")?;
        let folders = self.client.folders();
        self.block_on(folders.delete(&id, self.fixture.token(), &DeleteOptions::default()))?;
        Ok(())
    }

    /// List the trash and record the listing.
    ///
    /// # Errors
    ///
    /// Returns the client failure.
    pub fn get_trash(&mut self) -> Result<(), StepError> {
        let folders = self.client.folders();
        let trash = self.block_on(folders.get_trash(self.fixture.token()))?;
        self.record(LastResult::Collection(trash));
        Ok(())
    }

    /// Permanently delete the trashed subject folder.
    ///
    /// # Errors
    ///
    /// Returns `MissingResult` without a subject, or `NotFound` if it is not
    /// in the trash.
    pub fn purge_subject_folder(&mut self) -> Result<(), StepError> {
        let id = self.subject_id("delete that folder permanently")?;
        let folders = self.client.folders();
        self.block_on(folders.delete_trashed(&id, self.fixture.token()))?;
        Ok(())
    }

    /// Restore the trashed subject folder into the container as `name`.
    ///
    /// # Errors
    ///
    /// Returns `MissingResult` without a subject, or the client failure.
    pub fn restore_subject_folder(&mut self, name: &str) -> Result<(), StepError> {
        let id = self.subject_id("restore that folder")?;
        let base = self.base_id()?;
        let folders = self.client.folders();
        self.block_on(folders.restore_trashed(&id, self.fixture.token(), name, &base))?;
        Ok(())
    }

    /// List the subject folder's children and record the listing.
    ///
    /// # Errors
    ///
    /// Returns `MissingResult` without a subject, or the client failure.
    pub fn get_subject_folder_items(&mut self) -> Result<(), StepError> {
        let id = self.subject_id("get the items in the folder")?;
        let folders = self.client.folders();
        let items = self.block_on(folders.get_items(&id, self.fixture.token()))?;
        self.record(LastResult::Collection(items));
        Ok(())
    }

    /// Write a local file `name` into the workspace.
    ///
    /// # Errors
    ///
    /// Returns a filesystem error if the workspace is missing or unwritable.
    pub fn write_local_file(&mut self, name: &str) -> Result<(), StepError> {
        let workspace = self
            .fixture
            .workspace()
            .ok_or_else(|| AssertionFailure::new("scenario workspace is not provisioned"))?;
        workspace.write_file(name, LOCAL_FILE_CONTENT)?;
        Ok(())
    }

    /// Upload the local file `name` into the container and record the receipt.
    ///
    /// # Errors
    ///
    /// Returns a filesystem error if the local file is missing, or the client
    /// failure.
    pub fn upload_local_file(&mut self, name: &str) -> Result<(), StepError> {
        let base = self.base_id()?;
        let local_path = self
            .fixture
            .workspace()
            .map(|workspace| workspace.file_path(name))
            .ok_or_else(|| AssertionFailure::new("scenario workspace is not provisioned"))?;
        let files = self.client.files();
        let receipt =
            self.block_on(files.upload(self.fixture.token(), &local_path, name, &base))?;
        self.record(LastResult::Collection(receipt));
        Ok(())
    }

    /// Fetch the subject file and record it.
    ///
    /// # Errors
    ///
    /// Returns `MissingResult` without a subject, or the client failure.
    pub fn get_subject_file(&mut self) -> Result<(), StepError> {
        let id = self.subject_id("get information about the file")?;
        let files = self.client.files();
        let file = self.block_on(files.get(&id, self.fixture.token()))?;
        self.record(LastResult::Item(file));
        Ok(())
    }

    /// Rename the subject file.
    ///
    /// # Errors
    ///
    /// Returns `MissingResult` without a subject, or the client failure.
    pub fn rename_subject_file(&mut self, name: &str) -> Result<(), StepError> {
        let id = self.subject_id("rename the file")?;
        let files = self.client.files();
        self.block_on(files.update(&id, self.fixture.token(), &ResourceUpdate::rename(name)))?;
        Ok(())
    }

    /// Lock the subject file and record the locked file.
    ///
    /// # Errors
    ///
    /// Returns `MissingResult` without a subject, or the client failure.
    pub fn lock_subject_file(&mut self) -> Result<(), StepError> {
        let id = self.subject_id("lock the file")?;
        let files = self.client.files();
        let file = self.block_on(files.lock(&id, self.fixture.token()))?;
        self.record(LastResult::Item(file));
        Ok(())
    }

    /// Unlock the subject file and record the unlocked file.
    ///
    /// # Errors
    ///
    /// Returns `MissingResult` without a subject, or the client failure.
    pub fn unlock_subject_file(&mut self) -> Result<(), StepError> {
        let id = self.subject_id("unlock the file")?;
        let files = self.client.files();
        let file = self.block_on(files.unlock(&id, self.fixture.token()))?;
        self.record(LastResult::Item(file));
        Ok(())
    }
}
