//! Folder and file operation families.
//!
//! Both kinds share the same verbs (get, update, copy, delete, trash, restore,
//! shared links) against different collections, so they are one generic
//! service parameterised by an [`ItemKind`] marker. Kind-specific verbs live
//! in separate `impl` blocks.

use std::marker::PhantomData;

use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use reqwest::multipart::{Form, Part};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

use super::types::PlacementRequest;
use super::{
    BoxClient, DeleteOptions, ItemCollection, Resource, ResourceKind, ResourceUpdate,
    SessionToken, SharedLinkAccess,
};
use crate::error::{ApiError, FilesystemError, StepError};
use crate::workspace::map_io_error;

const LOCK_FIELDS: &str = "type,id,name,parent,lock";

/// Marker describing which API collection an [`ItemService`] addresses.
pub trait ItemKind {
    /// The collection path segment (`folders` or `files`).
    const COLLECTION: &'static str;
    /// The kind of resource the collection holds.
    const KIND: ResourceKind;
}

/// Marker for folder operations.
#[derive(Debug, Clone, Copy)]
pub struct Folders;

impl ItemKind for Folders {
    const COLLECTION: &'static str = "folders";
    const KIND: ResourceKind = ResourceKind::Folder;
}

/// Marker for file operations.
#[derive(Debug, Clone, Copy)]
pub struct Files;

impl ItemKind for Files {
    const COLLECTION: &'static str = "files";
    const KIND: ResourceKind = ResourceKind::File;
}

/// Operations on one kind of item.
#[derive(Debug, Clone, Copy)]
pub struct ItemService<'a, K> {
    client: &'a BoxClient,
    _kind: PhantomData<K>,
}

/// Operations on folders.
pub type FolderService<'a> = ItemService<'a, Folders>;

/// Operations on files.
pub type FileService<'a> = ItemService<'a, Files>;

/// Errors raised by [`FileService::upload`].
#[derive(Debug, Error)]
pub enum UploadError {
    /// The local source file could not be read.
    #[error(transparent)]
    Read(#[from] FilesystemError),

    /// The storage API rejected the upload.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl From<UploadError> for StepError {
    fn from(error: UploadError) -> Self {
        match error {
            UploadError::Read(read) => Self::Filesystem(read),
            UploadError::Api(api) => Self::Api(api),
        }
    }
}

impl<'a, K: ItemKind> ItemService<'a, K> {
    pub(crate) const fn new(client: &'a BoxClient) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }

    fn item_path(id: &str) -> String {
        format!("{}/{id}", K::COLLECTION)
    }

    /// Fetch the description of item `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the item is absent or trashed.
    pub async fn get(&self, id: &str, token: &SessionToken) -> Result<Resource, ApiError> {
        let url = self.client.api_url(&Self::item_path(id))?;
        let request = self.client.http().get(url);
        self.client.execute_json("get", request, token).await
    }

    /// Apply a partial update, such as a rename.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] on malformed fields and
    /// [`ApiError::Conflict`] if a rename collides with a sibling.
    pub async fn update(
        &self,
        id: &str,
        token: &SessionToken,
        fields: &ResourceUpdate,
    ) -> Result<Resource, ApiError> {
        let url = self.client.api_url(&Self::item_path(id))?;
        let request = self.client.http().put(url).json(fields);
        self.client.execute_json("update", request, token).await
    }

    /// Copy item `id` into `dest_parent_id` under `new_name`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Conflict`] if `new_name` is taken in the destination.
    pub async fn copy(
        &self,
        id: &str,
        token: &SessionToken,
        new_name: &str,
        dest_parent_id: &str,
    ) -> Result<Resource, ApiError> {
        let url = self
            .client
            .api_url(&format!("{}/copy", Self::item_path(id)))?;
        let body = PlacementRequest::new(new_name, dest_parent_id);
        let request = self.client.http().post(url).json(&body);
        self.client.execute_json("copy", request, token).await
    }

    /// Move item `id` to the trash, or purge it when `options.permanent` is set.
    ///
    /// Permanent deletion is a soft delete followed by a purge of the trashed
    /// item, so trashed descendants of a folder do not linger.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the item does not exist and
    /// [`ApiError::Validation`] when deleting a non-empty folder without
    /// `recursive`.
    pub async fn delete(
        &self,
        id: &str,
        token: &SessionToken,
        options: &DeleteOptions,
    ) -> Result<(), ApiError> {
        let mut url = self.client.api_url(&Self::item_path(id))?;
        if options.recursive && K::KIND == ResourceKind::Folder {
            url.query_pairs_mut().append_pair("recursive", "true");
        }

        let mut request = self.client.http().delete(url);
        if let Some(etag) = &options.if_match {
            request = request.header(reqwest::header::IF_MATCH, etag.as_str());
        }
        self.client.execute("delete", request, token).await?;

        if options.permanent {
            self.delete_trashed(id, token).await?;
        }

        info!(
            kind = K::KIND.as_str(),
            id,
            permanent = options.permanent,
            "deleted item"
        );
        Ok(())
    }

    /// Permanently delete an item that is already in the trash.
    ///
    /// This is not idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the item is not in the trash.
    pub async fn delete_trashed(&self, id: &str, token: &SessionToken) -> Result<(), ApiError> {
        let url = self
            .client
            .api_url(&format!("{}/trash", Self::item_path(id)))?;
        let request = self.client.http().delete(url);
        self.client
            .execute("delete_trashed", request, token)
            .await
            .map(|_| ())
    }

    /// Restore a trashed item into `dest_parent_id` under `new_name`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the item is not in the trash and
    /// [`ApiError::Conflict`] if `new_name` is taken in the destination.
    pub async fn restore_trashed(
        &self,
        id: &str,
        token: &SessionToken,
        new_name: &str,
        dest_parent_id: &str,
    ) -> Result<Resource, ApiError> {
        let url = self.client.api_url(&Self::item_path(id))?;
        let body = PlacementRequest::new(new_name, dest_parent_id);
        let request = self.client.http().post(url).json(&body);
        self.client.execute_json("restore_trashed", request, token).await
    }

    /// Create or replace the shared link on item `id`.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure.
    pub async fn create_shared_link(
        &self,
        id: &str,
        token: &SessionToken,
        access: SharedLinkAccess,
    ) -> Result<Resource, ApiError> {
        let url = self.client.api_url(&Self::item_path(id))?;
        let body = json!({ "shared_link": { "access": access } });
        let request = self.client.http().put(url).json(&body);
        self.client
            .execute_json("create_shared_link", request, token)
            .await
    }

    /// Remove the shared link from item `id`.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure.
    pub async fn delete_shared_link(
        &self,
        id: &str,
        token: &SessionToken,
    ) -> Result<Resource, ApiError> {
        let url = self.client.api_url(&Self::item_path(id))?;
        let body = json!({ "shared_link": null });
        let request = self.client.http().put(url).json(&body);
        self.client
            .execute_json("delete_shared_link", request, token)
            .await
    }
}

impl ItemService<'_, Folders> {
    /// Create a folder named `name` under `parent_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Conflict`] if the name is taken in the parent and
    /// [`ApiError::NotFound`] if the parent does not exist.
    pub async fn create(
        &self,
        token: &SessionToken,
        name: &str,
        parent_id: &str,
    ) -> Result<Resource, ApiError> {
        let url = self.client.api_url(Folders::COLLECTION)?;
        let body = PlacementRequest::new(name, parent_id);
        let request = self.client.http().post(url).json(&body);
        let folder: Resource = self.client.execute_json("create", request, token).await?;
        debug!(id = %folder.id, name, parent_id, "created folder");
        Ok(folder)
    }

    /// List the direct children of folder `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the folder is absent or trashed.
    pub async fn get_items(
        &self,
        id: &str,
        token: &SessionToken,
    ) -> Result<ItemCollection, ApiError> {
        let url = self
            .client
            .api_url(&format!("{}/items", Self::item_path(id)))?;
        let request = self.client.http().get(url);
        self.client.execute_json("get_items", request, token).await
    }

    /// List the items currently in the trash.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure.
    pub async fn get_trash(&self, token: &SessionToken) -> Result<ItemCollection, ApiError> {
        let url = self.client.api_url("folders/trash/items")?;
        let request = self.client.http().get(url);
        self.client.execute_json("get_trash", request, token).await
    }
}

impl ItemService<'_, Files> {
    /// Upload the local file at `local_path` as `name` into `parent_id`.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::Read`] if the local file cannot be read and
    /// [`UploadError::Api`] if the upload is rejected.
    pub async fn upload(
        &self,
        token: &SessionToken,
        local_path: &Utf8Path,
        name: &str,
        parent_id: &str,
    ) -> Result<ItemCollection, UploadError> {
        let content = read_local_file(local_path)?;
        Ok(self.upload_bytes(token, content, name, parent_id).await?)
    }

    /// Upload `content` as a new file `name` in `parent_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Conflict`] if a file with that name exists.
    pub async fn upload_bytes(
        &self,
        token: &SessionToken,
        content: Vec<u8>,
        name: &str,
        parent_id: &str,
    ) -> Result<ItemCollection, ApiError> {
        let url = self.client.upload_url("files/content")?;
        let attributes = serde_json::to_string(&PlacementRequest::new(name, parent_id))
            .map_err(|error| ApiError::Decode {
                message: format!("upload attributes: {error}"),
            })?;
        let form = Form::new()
            .text("attributes", attributes)
            .part("file", Part::bytes(content).file_name(name.to_owned()));

        let request = self.client.http().post(url).multipart(form);
        let receipt: ItemCollection = self.client.execute_json("upload", request, token).await?;
        debug!(name, parent_id, total_count = receipt.total_count, "uploaded file");
        Ok(receipt)
    }

    /// Lock file `id` against edits by other users.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure.
    pub async fn lock(&self, id: &str, token: &SessionToken) -> Result<Resource, ApiError> {
        self.put_lock(id, token, &json!({ "lock": { "access": "lock" } }), "lock")
            .await
    }

    /// Release the lock on file `id`.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure.
    pub async fn unlock(&self, id: &str, token: &SessionToken) -> Result<Resource, ApiError> {
        self.put_lock(id, token, &json!({ "lock": null }), "unlock")
            .await
    }

    async fn put_lock(
        &self,
        id: &str,
        token: &SessionToken,
        body: &serde_json::Value,
        operation: &'static str,
    ) -> Result<Resource, ApiError> {
        let mut url = self.client.api_url(&Self::item_path(id))?;
        url.query_pairs_mut().append_pair("fields", LOCK_FIELDS);
        let request = self.client.http().put(url).json(body);
        self.client.execute_json(operation, request, token).await
    }
}

/// Read a local file through a capability handle on its parent directory.
fn read_local_file(path: &Utf8Path) -> Result<Vec<u8>, FilesystemError> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let file_name = path.file_name().ok_or_else(|| FilesystemError::IoError {
        path: path.as_std_path().to_path_buf(),
        message: String::from("upload source has no file name"),
    })?;

    let dir = Dir::open_ambient_dir(parent, ambient_authority())
        .map_err(|error| map_io_error(parent, &error))?;
    dir.read(file_name)
        .map_err(|error| map_io_error(path, &error))
}
