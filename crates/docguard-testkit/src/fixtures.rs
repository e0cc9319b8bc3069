//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::{Arc, Once};

use bytes::Bytes;
use docguard::authz::columns;
use docguard::authz::MemoryDataApi;
use docguard::dom::{DomTree, MemoryDom, NodeId, NodeSpec};
use docguard::identity::resolver::memory::{StaticHostState, StaticLocation};
use docguard::identity::transport::memory::RecordingOutbound;
use docguard::session::ports::memory::{RecordingNavigator, RecordingUi};
use docguard::HostPorts;
use serde_json::{json, Map, Value};

/// A document id that also matches the page path pattern.
pub const DOC_ID: &str = "k3bQx9ZpL2mN";

/// Profile endpoint served by [`authorized_api`].
pub const PROFILE_PATH: &str = "/api/profile/user";

/// Install a test subscriber honouring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Every host port, backed by memory.
pub struct TestHost {
    pub host_state: Arc<StaticHostState>,
    pub location: Arc<StaticLocation>,
    pub data_api: Arc<MemoryDataApi>,
    pub dom: Arc<MemoryDom>,
    pub ui: Arc<RecordingUi>,
    pub navigator: Arc<RecordingNavigator>,
    pub outbound: Arc<RecordingOutbound>,
}

impl TestHost {
    /// A host at `/` exposing no document id.
    pub fn new(data_api: MemoryDataApi) -> Self {
        Self {
            host_state: Arc::new(StaticHostState::empty()),
            location: Arc::new(StaticLocation::new("/")),
            data_api: Arc::new(data_api),
            dom: Arc::new(MemoryDom::new()),
            ui: Arc::new(RecordingUi::new()),
            navigator: Arc::new(RecordingNavigator::new()),
            outbound: Arc::new(RecordingOutbound::new()),
        }
    }

    /// Place the page at `path`.
    pub fn at_path(mut self, path: impl Into<String>) -> Self {
        self.location = Arc::new(StaticLocation::new(path));
        self
    }

    /// Have the host expose `id` in its own state.
    pub fn exposing(self, id: impl Into<String>) -> Self {
        self.host_state.set(id);
        self
    }

    pub fn ports(&self) -> HostPorts {
        HostPorts {
            host_state: self.host_state.clone(),
            location: self.location.clone(),
            data_api: self.data_api.clone(),
            dom: self.dom.clone(),
            ui: self.ui.clone(),
            navigator: self.navigator.clone(),
        }
    }

    /// Render the guarded toolbar and menu into the body.
    pub fn render_guarded_ui(&self) -> GuardedUi {
        let body = self.dom.body();
        let node = |spec: NodeSpec| self.dom.append(body, spec).ok();

        let add_column = node(NodeSpec::new("div").class("mod-add-column"));
        let share = node(NodeSpec::new("div").class("test-tb-share"));
        let download = node(NodeSpec::new("div").class("test-download-section"));
        let menu = node(
            NodeSpec::new("ul")
                .class("menu")
                .child(menu_item("Insert column to the left"))
                .child(menu_item("Insert column to the right"))
                .child(menu_item("Sort A-Z")),
        );

        let items = match menu {
            Some(_) => self.dom.query_all("li").unwrap_or_default(),
            None => Vec::new(),
        };

        GuardedUi {
            add_column: add_column.unwrap_or(body),
            share: share.unwrap_or(body),
            download: download.unwrap_or(body),
            menu_items: items,
        }
    }
}

fn menu_item(label: &str) -> NodeSpec {
    NodeSpec::new("li").child(NodeSpec::new("span").class("test-cmd-name").text(label))
}

/// Node ids of the rendered guarded UI.
#[derive(Debug, Clone)]
pub struct GuardedUi {
    pub add_column: NodeId,
    pub share: NodeId,
    pub download: NodeId,
    /// Insert-left, insert-right, then an unguarded item.
    pub menu_items: Vec<NodeId>,
}

/// One row of the authorization table.
#[derive(Debug, Clone)]
pub struct TableRow {
    pub email: Value,
    pub unlock_structure: Value,
    pub export_data: Value,
    pub timeout_minutes: Value,
}

impl TableRow {
    /// A well-formed row.
    pub fn granted(email: &str, alter: bool, export: bool, timeout_minutes: u32) -> Self {
        Self {
            email: json!(email),
            unlock_structure: json!(alter),
            export_data: json!(export),
            timeout_minutes: json!(timeout_minutes),
        }
    }
}

/// Profile payload for `email`.
pub fn profile_json(email: &str) -> Value {
    json!({ "id": 7, "email": email, "name": "Test User" })
}

/// Columnar table payload for `rows`.
pub fn table_json(rows: &[TableRow]) -> Value {
    let column = |cell: fn(&TableRow) -> Value| Value::Array(rows.iter().map(cell).collect());

    let mut table = Map::new();
    table.insert("id".to_string(), Value::Array((1..=rows.len()).map(|i| json!(i)).collect()));
    table.insert(columns::EMAIL.to_string(), column(|r| r.email.clone()));
    table.insert(columns::UNLOCK_STRUCTURE.to_string(), column(|r| r.unlock_structure.clone()));
    table.insert(columns::EXPORT_DATA.to_string(), column(|r| r.export_data.clone()));
    table.insert(columns::TIMEOUT_MINUTES.to_string(), column(|r| r.timeout_minutes.clone()));
    Value::Object(table)
}

/// Default table endpoint for `doc`.
pub fn table_path(doc: &str) -> String {
    format!("/api/docs/{doc}/tables/SysUsers/data")
}

/// A data API serving a profile for `email` and `rows` for `doc`.
pub fn authorized_api(doc: &str, email: &str, rows: &[TableRow]) -> MemoryDataApi {
    MemoryDataApi::new()
        .with_json(PROFILE_PATH, profile_json(email))
        .with_json(table_path(doc), table_json(rows))
}

/// An `openDoc` frame as the host would send it.
pub fn open_doc_frame(doc: &str) -> Bytes {
    Bytes::from(json!({ "reqId": 1, "method": "openDoc", "args": [doc, null, {}] }).to_string())
}
