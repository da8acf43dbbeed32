//! The fake's item tree and request routing.

use std::collections::BTreeMap;

use serde_json::{Value, json};
use wiremock::{Request, ResponseTemplate};

/// Identifier of the account's root folder.
pub(crate) const ROOT_ID: &str = "0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Folder,
    File,
}

impl Kind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::File => "file",
        }
    }

    fn from_collection(collection: &str) -> Option<Self> {
        match collection {
            "folders" => Some(Self::Folder),
            "files" => Some(Self::File),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Item {
    id: String,
    kind: Kind,
    name: String,
    parent_id: String,
    trashed: bool,
    trash_root: bool,
    shared: bool,
    locked: bool,
}

impl Item {
    fn render(&self) -> Value {
        let shared_link = if self.shared {
            json!({ "url": format!("https://fake.box/s/{}", self.id), "access": "open" })
        } else {
            Value::Null
        };
        let lock = if self.locked {
            json!({ "type": "lock", "id": format!("lock_{}", self.id) })
        } else {
            Value::Null
        };
        json!({
            "type": self.kind.as_str(),
            "id": self.id,
            "name": self.name,
            "parent": { "type": "folder", "id": self.parent_id },
            "item_status": if self.trashed { "trashed" } else { "active" },
            "shared_link": shared_link,
            "lock": lock,
        })
    }
}

/// Render a provider-style error body.
pub(crate) fn error_response(status: u16, code: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "type": "error",
        "status": status,
        "code": code,
        "message": message,
        "request_id": "fake",
    }))
}

fn not_found() -> ResponseTemplate {
    error_response(404, "not_found", "Not Found")
}

fn name_in_use() -> ResponseTemplate {
    error_response(409, "item_name_in_use", "Item with the same name already exists")
}

fn collection(items: &[&Item]) -> Value {
    json!({
        "total_count": items.len(),
        "entries": items.iter().map(|item| item.render()).collect::<Vec<_>>(),
        "offset": 0,
        "limit": 100,
    })
}

/// Name and parent from a create, copy, or restore body.
fn placement(body: &Value) -> (Option<String>, Option<String>) {
    let name = body.get("name").and_then(Value::as_str).map(str::to_owned);
    let parent = body
        .get("parent")
        .and_then(|parent| parent.get("id"))
        .and_then(Value::as_str)
        .map(str::to_owned);
    (name, parent)
}

/// Extract the JSON `attributes` part of a multipart upload.
fn upload_attributes(body: &[u8]) -> Option<Value> {
    let text = String::from_utf8_lossy(body);
    let (_, after_name) = text.split_once("name=\"attributes\"")?;
    let (_, value_start) = after_name.split_once("\r\n\r\n")?;
    let (value, _) = value_start.split_once("\r\n--")?;
    serde_json::from_str(value).ok()
}

#[derive(Debug)]
pub(crate) struct Store {
    items: BTreeMap<String, Item>,
    next_id: u64,
    pub(crate) forced_status: Option<u16>,
}

impl Store {
    pub(crate) fn new() -> Self {
        let root = Item {
            id: ROOT_ID.to_owned(),
            kind: Kind::Folder,
            name: String::from("All Files"),
            parent_id: String::new(),
            trashed: false,
            trash_root: false,
            shared: false,
            locked: false,
        };
        Self {
            items: BTreeMap::from([(ROOT_ID.to_owned(), root)]),
            next_id: 1000,
            forced_status: None,
        }
    }

    fn insert(&mut self, kind: Kind, name: &str, parent_id: &str) -> Item {
        self.next_id += 1;
        let item = Item {
            id: self.next_id.to_string(),
            kind,
            name: name.to_owned(),
            parent_id: parent_id.to_owned(),
            trashed: false,
            trash_root: false,
            shared: false,
            locked: false,
        };
        self.items.insert(item.id.clone(), item.clone());
        item
    }

    pub(crate) fn remove_tree(&mut self, id: &str) {
        for descendant in self.descendant_ids(id) {
            self.items.remove(&descendant);
        }
        self.items.remove(id);
    }

    fn live(&self, id: &str, kind: Kind) -> Option<&Item> {
        self.items
            .get(id)
            .filter(|item| !item.trashed && item.kind == kind)
    }

    pub(crate) fn is_live(&self, id: &str) -> bool {
        self.items.get(id).is_some_and(|item| !item.trashed)
    }

    fn live_children(&self, parent_id: &str) -> Vec<&Item> {
        self.items
            .values()
            .filter(|item| item.parent_id == parent_id && !item.trashed)
            .collect()
    }

    pub(crate) fn live_child_ids(&self, parent_id: &str) -> Vec<String> {
        self.live_children(parent_id)
            .into_iter()
            .map(|item| item.id.clone())
            .collect()
    }

    pub(crate) fn live_descendant_names(&self, id: &str) -> Vec<String> {
        self.live_children(id)
            .into_iter()
            .flat_map(|child| {
                let mut names = vec![child.name.clone()];
                names.extend(self.live_descendant_names(&child.id));
                names
            })
            .collect()
    }

    /// Every descendant of `id`, trashed or not.
    fn descendant_ids(&self, id: &str) -> Vec<String> {
        self.items
            .values()
            .filter(|item| item.parent_id == id && item.id != ROOT_ID)
            .flat_map(|child| {
                let mut ids = vec![child.id.clone()];
                ids.extend(self.descendant_ids(&child.id));
                ids
            })
            .collect()
    }

    fn name_taken(&self, parent_id: &str, name: &str, except: Option<&str>) -> bool {
        self.live_children(parent_id)
            .iter()
            .any(|item| item.name == name && Some(item.id.as_str()) != except)
    }

    pub(crate) fn route(&mut self, request: &Request) -> ResponseTemplate {
        let path = request.url.path().to_owned();
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);

        match (request.method.as_str(), segments.as_slice()) {
            ("POST", ["api", "2.0", "files", "content"]) => self.upload(&request.body),
            ("GET", ["2.0", "folders", "trash", "items"]) => self.trash_listing(),
            ("POST", ["2.0", "folders"]) => self.create_folder(&body),
            (method, ["2.0", collection, id, rest @ ..]) => {
                let Some(kind) = Kind::from_collection(collection) else {
                    return not_found();
                };
                let recursive = request
                    .url
                    .query_pairs()
                    .any(|(key, value)| key == "recursive" && value == "true");
                self.item_route(method, kind, id, rest, &body, recursive)
            }
            _ => not_found(),
        }
    }

    fn item_route(
        &mut self,
        method: &str,
        kind: Kind,
        id: &str,
        rest: &[&str],
        body: &Value,
        recursive: bool,
    ) -> ResponseTemplate {
        match (method, rest) {
            ("GET", []) => self.live(id, kind).map_or_else(not_found, |item| {
                ResponseTemplate::new(200).set_body_json(item.render())
            }),
            ("GET", ["items"]) if kind == Kind::Folder => match self.live(id, kind) {
                Some(_) => ResponseTemplate::new(200).set_body_json(collection(&self.live_children(id))),
                None => not_found(),
            },
            ("PUT", []) => self.update(kind, id, body),
            ("POST", ["copy"]) => self.copy(kind, id, body),
            ("POST", []) => self.restore(kind, id, body),
            ("DELETE", []) => self.trash(kind, id, recursive),
            ("DELETE", ["trash"]) => self.purge(kind, id),
            _ => not_found(),
        }
    }

    fn create_folder(&mut self, body: &Value) -> ResponseTemplate {
        let (Some(name), Some(parent_id)) = placement(body) else {
            return error_response(400, "bad_request", "name and parent are required");
        };
        if self.live(&parent_id, Kind::Folder).is_none() {
            return not_found();
        }
        if self.name_taken(&parent_id, &name, None) {
            return name_in_use();
        }
        let folder = self.insert(Kind::Folder, &name, &parent_id);
        ResponseTemplate::new(201).set_body_json(folder.render())
    }

    fn upload(&mut self, body: &[u8]) -> ResponseTemplate {
        let Some((Some(name), Some(parent_id))) = upload_attributes(body).map(|a| placement(&a))
        else {
            return error_response(400, "bad_request", "missing upload attributes");
        };
        if self.live(&parent_id, Kind::Folder).is_none() {
            return not_found();
        }
        if self.name_taken(&parent_id, &name, None) {
            return name_in_use();
        }
        let file = self.insert(Kind::File, &name, &parent_id);
        ResponseTemplate::new(201).set_body_json(collection(&[&file]))
    }

    fn update(&mut self, kind: Kind, id: &str, body: &Value) -> ResponseTemplate {
        let Some(mut updated) = self.live(id, kind).cloned() else {
            return not_found();
        };
        if let Some(name) = body.get("name").and_then(Value::as_str) {
            if self.name_taken(&updated.parent_id, name, Some(id)) {
                return name_in_use();
            }
            name.clone_into(&mut updated.name);
        }
        if let Some(link) = body.get("shared_link") {
            updated.shared = !link.is_null();
        }
        if let Some(lock) = body.get("lock") {
            if kind != Kind::File {
                return error_response(400, "bad_request", "only files can be locked");
            }
            if !lock.is_null() && lock.get("access").and_then(Value::as_str) != Some("lock") {
                return error_response(400, "bad_request", "lock.access must be 'lock'");
            }
            updated.locked = !lock.is_null();
        }
        let rendered = updated.render();
        self.items.insert(id.to_owned(), updated);
        ResponseTemplate::new(200).set_body_json(rendered)
    }

    fn copy(&mut self, kind: Kind, id: &str, body: &Value) -> ResponseTemplate {
        let Some(source) = self.live(id, kind).cloned() else {
            return not_found();
        };
        let (name, parent) = placement(body);
        let Some(parent_id) = parent else {
            return error_response(400, "bad_request", "parent is required");
        };
        let copy_name = name.unwrap_or(source.name);
        if self.live(&parent_id, Kind::Folder).is_none() {
            return not_found();
        }
        if self.name_taken(&parent_id, &copy_name, None) {
            return name_in_use();
        }
        let copy = self.insert(kind, &copy_name, &parent_id);
        self.copy_children(id, &copy.id);
        ResponseTemplate::new(201).set_body_json(copy.render())
    }

    fn copy_children(&mut self, from: &str, to: &str) {
        let children: Vec<Item> = self.live_children(from).into_iter().cloned().collect();
        for child in children {
            let copied = self.insert(child.kind, &child.name, to);
            self.copy_children(&child.id, &copied.id);
        }
    }

    fn trash(&mut self, kind: Kind, id: &str, recursive: bool) -> ResponseTemplate {
        if id == ROOT_ID || self.live(id, kind).is_none() {
            return not_found();
        }
        if kind == Kind::Folder && !recursive && !self.live_children(id).is_empty() {
            return error_response(400, "folder_not_empty", "Cannot delete - folder not empty");
        }
        for descendant in self.descendant_ids(id) {
            if let Some(item) = self.items.get_mut(&descendant) {
                if !item.trashed {
                    item.trashed = true;
                    item.trash_root = false;
                }
            }
        }
        if let Some(item) = self.items.get_mut(id) {
            item.trashed = true;
            item.trash_root = true;
        }
        ResponseTemplate::new(204)
    }

    fn trashed_root(&self, id: &str, kind: Kind) -> Option<&Item> {
        self.items
            .get(id)
            .filter(|item| item.kind == kind && item.trashed && item.trash_root)
    }

    fn purge(&mut self, kind: Kind, id: &str) -> ResponseTemplate {
        if self.trashed_root(id, kind).is_none() {
            return not_found();
        }
        self.remove_tree(id);
        ResponseTemplate::new(204)
    }

    fn restore(&mut self, kind: Kind, id: &str, body: &Value) -> ResponseTemplate {
        let Some(trashed) = self.trashed_root(id, kind).cloned() else {
            return not_found();
        };
        let (requested_name, requested_parent) = placement(body);
        let name = requested_name.unwrap_or(trashed.name);
        let parent_id = requested_parent.unwrap_or(trashed.parent_id);
        if self.live(&parent_id, Kind::Folder).is_none() {
            return not_found();
        }
        if self.name_taken(&parent_id, &name, None) {
            return name_in_use();
        }
        for descendant in self.descendant_ids(id) {
            if let Some(item) = self.items.get_mut(&descendant) {
                if !item.trash_root {
                    item.trashed = false;
                }
            }
        }
        let Some(item) = self.items.get_mut(id) else {
            return not_found();
        };
        item.trashed = false;
        item.trash_root = false;
        item.name = name;
        item.parent_id = parent_id;
        ResponseTemplate::new(201).set_body_json(item.render())
    }

    fn trash_listing(&self) -> ResponseTemplate {
        let trashed: Vec<&Item> = self
            .items
            .values()
            .filter(|item| item.trashed && item.trash_root)
            .collect();
        ResponseTemplate::new(200).set_body_json(collection(&trashed))
    }
}
