//! Wire types for the storage API.

use serde::{Deserialize, Serialize};

/// The kind of item a resource description refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// A folder.
    Folder,
    /// A file.
    File,
    /// A bookmark to an external URL.
    WebLink,
}

impl ResourceKind {
    /// The wire name of the kind, as it appears in the `type` field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::File => "file",
            Self::WebLink => "web_link",
        }
    }
}

/// Reference to a parent folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    /// The parent folder identifier.
    pub id: String,
}

impl ParentRef {
    /// Build a reference to the folder with `id`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// A public link to an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedLink {
    /// The shareable URL.
    pub url: String,
    /// The access level the link was created with.
    #[serde(default)]
    pub access: Option<String>,
}

/// A lock held on a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lock {
    /// The lock identifier.
    #[serde(default)]
    pub id: Option<String>,
    /// The lock type, normally `lock`.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Description of a single folder or file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// The item identifier.
    pub id: String,
    /// Whether the item is a folder, file, or web link.
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    /// The item name. Partial responses may omit it.
    #[serde(default)]
    pub name: String,
    /// The containing folder.
    #[serde(default)]
    pub parent: Option<ParentRef>,
    /// The public link, when one exists.
    #[serde(default)]
    pub shared_link: Option<SharedLink>,
    /// The lock, when the item is a locked file.
    #[serde(default)]
    pub lock: Option<Lock>,
    /// `active`, `trashed`, or `deleted`, when reported.
    #[serde(default)]
    pub item_status: Option<String>,
}

impl Resource {
    /// The identifier of the containing folder, if reported.
    #[must_use]
    pub fn parent_id(&self) -> Option<&str> {
        self.parent.as_ref().map(|parent| parent.id.as_str())
    }
}

/// A list of items: folder contents, trash contents, or an upload receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCollection {
    /// The total number of items available.
    pub total_count: u64,
    /// The items in this page.
    #[serde(default)]
    pub entries: Vec<Resource>,
    /// The page offset, when paginated.
    #[serde(default)]
    pub offset: Option<u64>,
    /// The page size, when paginated.
    #[serde(default)]
    pub limit: Option<u64>,
}

impl ItemCollection {
    /// Whether any entry carries exactly `name`.
    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    /// The entry names, in response order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }
}

/// Who can open a shared link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SharedLinkAccess {
    /// Anyone with the link.
    #[default]
    Open,
    /// Members of the owner's enterprise.
    Company,
    /// Collaborators on the item only.
    Collaborators,
}

/// Partial update of an item. Only populated fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceUpdate {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New parent, which moves the item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentRef>,
}

impl ResourceUpdate {
    /// An update that only renames the item.
    #[must_use]
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Options for deleting an item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    /// Delete non-empty folders together with their contents. Ignored for files.
    pub recursive: bool,
    /// Purge the item from the trash straight after deleting it.
    pub permanent: bool,
    /// Only delete when the item's etag still matches.
    pub if_match: Option<String>,
}

impl DeleteOptions {
    /// Recursive, permanent deletion as used when releasing scenario fixtures.
    #[must_use]
    pub const fn forced() -> Self {
        Self {
            recursive: true,
            permanent: true,
            if_match: None,
        }
    }
}

/// Request body for creating, copying, and restoring items.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct PlacementRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) parent: Option<ParentRef>,
}

impl<'a> PlacementRequest<'a> {
    pub(crate) fn new(name: &'a str, parent_id: &str) -> Self {
        Self {
            name: Some(name),
            parent: Some(ParentRef::new(parent_id)),
        }
    }
}

/// Error payload returned by the API on non-success statuses.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub(crate) code: Option<String>,
    #[serde(default)]
    pub(crate) message: Option<String>,
    #[serde(default)]
    pub(crate) request_id: Option<String>,
}
