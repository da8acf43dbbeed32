//! Stateful in-process fake of the storage API.
//!
//! A single catch-all `wiremock` mock routes every request to [`FakeResponder`],
//! which keeps a small item tree behind a mutex. It models what the harness
//! relies on: bearer authentication, sibling name conflicts, the trash,
//! recursive deletion, copies, restores, shared links, locks, and multipart
//! uploads.

mod rig;
mod store;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use wiremock::matchers::any;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub(crate) use rig::{Rig, failures};
use store::Store;
pub(crate) use store::{ROOT_ID, error_response};

/// The only bearer token the fake accepts.
pub(crate) const TOKEN: &str = "fake-developer-token";

/// A running fake storage service.
pub(crate) struct FakeBox {
    server: MockServer,
    store: Arc<Mutex<Store>>,
}

impl FakeBox {
    /// Start a fake with an empty root folder.
    pub(crate) async fn start() -> Self {
        let server = MockServer::start().await;
        let store = Arc::new(Mutex::new(Store::new()));
        Mock::given(any())
            .respond_with(FakeResponder {
                store: Arc::clone(&store),
            })
            .mount(&server)
            .await;
        Self { server, store }
    }

    /// Base URL for metadata calls.
    pub(crate) fn api_url(&self) -> String {
        format!("{}/2.0", self.server.uri())
    }

    /// Base URL for content uploads.
    pub(crate) fn upload_url(&self) -> String {
        format!("{}/api/2.0", self.server.uri())
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Names of live items anywhere below the root folder.
    pub(crate) fn live_names(&self) -> Vec<String> {
        self.lock().live_descendant_names(ROOT_ID)
    }

    /// Identifiers of live folders directly under the root folder.
    pub(crate) fn live_root_folders(&self) -> Vec<String> {
        self.lock().live_child_ids(ROOT_ID)
    }

    /// Whether the item exists and is not in the trash.
    pub(crate) fn is_live(&self, id: &str) -> bool {
        self.lock().is_live(id)
    }

    /// Delete an item and its descendants outright, bypassing HTTP.
    pub(crate) fn remove_directly(&self, id: &str) {
        self.lock().remove_tree(id);
    }

    /// Make every later request fail with `status`.
    pub(crate) fn fail_everything_with(&self, status: u16) {
        self.lock().forced_status = Some(status);
    }
}

struct FakeResponder {
    store: Arc<Mutex<Store>>,
}

impl Respond for FakeResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let authorized = request
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value == format!("Bearer {TOKEN}"));
        if !authorized {
            return error_response(401, "unauthorized", "the access token is invalid");
        }

        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(status) = store.forced_status {
            return error_response(status, "forced_failure", "the fake was told to fail");
        }
        store.route(request)
    }
}
