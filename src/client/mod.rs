//! Typed client for the cloud file-storage API.
//!
//! [`BoxClient`] is a thin wrapper over `reqwest`. It exposes one operation
//! family per verb for folders ([`FolderService`]) and files
//! ([`FileService`]). The session token is passed explicitly to every call
//! and sent as a bearer token.
//!
//! Nothing is cached and nothing is retried. Non-success statuses surface
//! immediately as classified [`ApiError`] values.
//!
//! The fixture controller does not depend on the full client: it talks to
//! the narrower [`ContainerLifecycle`] seam so its state machine can be
//! tested with a mock.

mod error_mapping;
mod items;
mod types;


use std::fmt;
use std::future::Future;
use std::pin::Pin;

use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::config::ApiConfig;
use crate::error::ApiError;
use error_mapping::{classify_status, transport_error};

pub use items::{FileService, Files, FolderService, Folders, ItemKind, ItemService, UploadError};
pub use types::{
    DeleteOptions, ItemCollection, Lock, ParentRef, Resource, ResourceKind, ResourceUpdate,
    SharedLink, SharedLinkAccess,
};

/// Default endpoint for metadata operations.
pub const DEFAULT_API_BASE_URL: &str = "https://api.box.com/2.0";

/// Default endpoint for content uploads.
pub const DEFAULT_UPLOAD_BASE_URL: &str = "https://upload.box.com/api/2.0";

/// A boxed future for trait methods.
///
/// This alias keeps [`ContainerLifecycle`] object-safe and mockable.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Opaque credential for the storage API.
///
/// The token is immutable once constructed and its `Debug` output is
/// redacted so it never reaches logs.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a raw token string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Return the raw token for use in an `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

/// HTTP client for the storage API.
#[derive(Debug, Clone)]
pub struct BoxClient {
    http: Client,
    api_base: String,
    upload_base: String,
}

impl BoxClient {
    /// Build a client for the given metadata and upload endpoints.
    ///
    /// Trailing slashes are trimmed so endpoint paths can be appended.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] if either endpoint is not an
    /// absolute URL.
    pub fn new(api_base: &str, upload_base: &str) -> Result<Self, ApiError> {
        Ok(Self {
            http: Client::new(),
            api_base: normalize_base_url(api_base)?,
            upload_base: normalize_base_url(upload_base)?,
        })
    }

    /// Build a client from resolved API configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] if a configured endpoint is invalid.
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        Self::new(&config.base_url, &config.upload_url)
    }

    /// Operations on folders.
    #[must_use]
    pub const fn folders(&self) -> FolderService<'_> {
        ItemService::new(self)
    }

    /// Operations on files.
    #[must_use]
    pub const fn files(&self) -> FileService<'_> {
        ItemService::new(self)
    }

    pub(crate) const fn http(&self) -> &Client {
        &self.http
    }

    pub(crate) fn api_url(&self, path: &str) -> Result<Url, ApiError> {
        join_url(&self.api_base, path)
    }

    pub(crate) fn upload_url(&self, path: &str) -> Result<Url, ApiError> {
        join_url(&self.upload_base, path)
    }

    /// Send `request` with the session token and return the success response.
    pub(crate) async fn execute(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        token: &SessionToken,
    ) -> Result<Response, ApiError> {
        let response = request
            .bearer_auth(token.expose())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await
            .map_err(|error| transport_error(&error))?;

        let status = response.status();
        debug!(operation, %status, url = %response.url(), "storage api responded");

        if status.is_success() {
            return Ok(response);
        }

        let headers = response.headers().clone();
        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status, &headers, &body))
    }

    /// Send `request` and decode the JSON body of the success response.
    pub(crate) async fn execute_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        token: &SessionToken,
    ) -> Result<T, ApiError> {
        let response = self.execute(operation, request, token).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|error| transport_error(&error))?;
        serde_json::from_slice(&bytes).map_err(|error| ApiError::Decode {
            message: format!("{operation}: {error}"),
        })
    }
}

/// The remote operations the fixture controller needs.
///
/// Production code uses [`BoxClient`]; fixture tests inject a mock.
pub trait ContainerLifecycle: Send + Sync {
    /// Create a folder named `name` under `parent_id` to hold one scenario's items.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure.
    fn create_container(
        &self,
        token: &SessionToken,
        name: &str,
        parent_id: &str,
    ) -> BoxFuture<'_, Result<Resource, ApiError>>;

    /// Delete the container and everything below it, bypassing the trash.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure.
    fn destroy_container(
        &self,
        token: &SessionToken,
        container_id: &str,
    ) -> BoxFuture<'_, Result<(), ApiError>>;
}

impl ContainerLifecycle for BoxClient {
    fn create_container(
        &self,
        token: &SessionToken,
        name: &str,
        parent_id: &str,
    ) -> BoxFuture<'_, Result<Resource, ApiError>> {
        let token_owned = token.clone();
        let name_owned = name.to_owned();
        let parent_owned = parent_id.to_owned();

        Box::pin(async move {
            self.folders()
                .create(&token_owned, &name_owned, &parent_owned)
                .await
        })
    }

    fn destroy_container(
        &self,
        token: &SessionToken,
        container_id: &str,
    ) -> BoxFuture<'_, Result<(), ApiError>> {
        let token_owned = token.clone();
        let id_owned = container_id.to_owned();

        Box::pin(async move {
            self.folders()
                .delete(&id_owned, &token_owned, &DeleteOptions::forced())
                .await
        })
    }
}

fn normalize_base_url(endpoint: &str) -> Result<String, ApiError> {
    let trimmed = endpoint.trim().trim_end_matches('/');
    Url::parse(trimmed).map_err(|error| ApiError::InvalidUrl {
        url: endpoint.to_owned(),
        message: error.to_string(),
    })?;
    Ok(trimmed.to_owned())
}

fn join_url(base: &str, path: &str) -> Result<Url, ApiError> {
    let full = format!("{base}/{}", path.trim_start_matches('/'));
    Url::parse(&full).map_err(|error| ApiError::InvalidUrl {
        url: full.clone(),
        message: error.to_string(),
    })
}
