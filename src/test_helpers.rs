//! Shared fixtures: a recording transport, a seeded directory, and simple
//! content/component implementations with observable hooks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::component::Component;
use crate::directory::MemoryDirectory;
use crate::identity::{Rank, RoomId, UserId, Viewer};
use crate::page::{Page, PageContent, PageEnv, PageOptions, PageView};
use crate::transport::Transport;

pub const TEST_PAGE_ID: &str = "testpage";

// =============================================================================
// TRANSPORT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Standalone { user: UserId, page_id: String, content: String },
    RetractStandalone { user: UserId, page_id: String },
    Overlay { user: UserId, name: String, content: String },
    RetractOverlay { user: UserId, name: String, notice: String },
}

#[derive(Default)]
pub struct RecordingTransport {
    events: Mutex<Vec<Delivery>>,
}

impl RecordingTransport {
    fn record(&self, delivery: Delivery) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(delivery);
    }

    #[must_use]
    pub fn events(&self) -> Vec<Delivery> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of content deliveries (either channel).
    #[must_use]
    pub fn delivery_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Delivery::Standalone { .. } | Delivery::Overlay { .. }))
            .count()
    }
}

impl Transport for RecordingTransport {
    fn deliver_standalone(&self, viewer: &Viewer, page_id: &str, content: &str) {
        self.record(Delivery::Standalone {
            user: viewer.id.clone(),
            page_id: page_id.into(),
            content: content.into(),
        });
    }

    fn retract_standalone(&self, viewer: &Viewer, page_id: &str) {
        self.record(Delivery::RetractStandalone { user: viewer.id.clone(), page_id: page_id.into() });
    }

    fn deliver_overlay(&self, viewer: &Viewer, name: &str, content: &str) {
        self.record(Delivery::Overlay { user: viewer.id.clone(), name: name.into(), content: content.into() });
    }

    fn retract_overlay(&self, viewer: &Viewer, name: &str, notice: &str) {
        self.record(Delivery::RetractOverlay { user: viewer.id.clone(), name: name.into(), notice: notice.into() });
    }
}

// =============================================================================
// ENVIRONMENT
// =============================================================================

pub struct TestEnv {
    pub env: PageEnv,
    pub transport: Arc<RecordingTransport>,
    pub directory: Arc<MemoryDirectory>,
}

impl TestEnv {
    /// Connect a viewer and return their id.
    pub fn connect(&self, name: &str) -> UserId {
        let viewer = Viewer::new(name);
        let id = viewer.id.clone();
        self.directory.connect(viewer);
        id
    }
}

#[must_use]
pub fn test_room() -> RoomId {
    RoomId::from_name("lobby")
}

#[must_use]
pub fn test_env() -> TestEnv {
    let transport = Arc::new(RecordingTransport::default());
    let directory = Arc::new(MemoryDirectory::new());
    let env = PageEnv {
        transport: Arc::clone(&transport) as Arc<dyn Transport>,
        directory: Arc::clone(&directory) as Arc<dyn crate::identity::Directory>,
        min_staff_rank: Rank::Driver,
    };
    TestEnv { env, transport, directory }
}

#[must_use]
pub fn test_options() -> PageOptions {
    PageOptions {
        command: "/test".into(),
        room: test_room(),
        overlay_name: "test-overlay".into(),
        offer_switch_location: true,
        start_in_overlay: false,
    }
}

// =============================================================================
// CONTENT
// =============================================================================

/// Content that renders `body` plus the page chrome, with hook counters.
pub struct TestContent {
    pub body: String,
    pub allow_send: bool,
    pub sends: usize,
    pub closes: Arc<AtomicUsize>,
}

impl TestContent {
    #[must_use]
    pub fn new(body: &str) -> Self {
        Self { body: body.into(), allow_send: true, sends: 0, closes: Arc::new(AtomicUsize::new(0)) }
    }
}

impl PageContent for TestContent {
    fn render(&self, view: &PageView<'_>, _is_open: bool) -> String {
        format!(
            "{}{}<p>{}</p>{}",
            view.close_button,
            view.switch_location_button,
            self.body,
            view.render_components()
        )
    }

    fn before_send(&self, _is_open: bool) -> bool {
        self.allow_send
    }

    fn on_send(&mut self) {
        self.sends += 1;
    }

    fn on_close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

#[must_use]
pub fn test_page(env: &TestEnv, user: &UserId, body: &str) -> Page<TestContent> {
    Page::new(TEST_PAGE_ID, user.clone(), TestContent::new(body), test_options(), env.env.clone())
}

// =============================================================================
// COMPONENT
// =============================================================================

/// Component that records handled args and its own destruction into a
/// shared log.
pub struct TestComponent {
    pub name: String,
    pub active: bool,
    pub log: Arc<Mutex<Vec<String>>>,
}

impl TestComponent {
    #[must_use]
    pub fn new(name: &str, log: &Arc<Mutex<Vec<String>>>) -> Self {
        Self { name: name.into(), active: true, log: Arc::clone(log) }
    }

    fn push(&self, entry: String) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}

impl Component for TestComponent {
    fn command_name(&self) -> &str {
        &self.name
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn handle(&mut self, args: &str) -> Result<(), String> {
        if args == "fail" {
            return Err(format!("{} refused", self.name));
        }
        self.push(format!("{}:{args}", self.name));
        Ok(())
    }

    fn render(&self, _view: &PageView<'_>) -> String {
        format!("[{}]", self.name)
    }

    fn destroy(&mut self) {
        self.push(format!("destroy:{}", self.name));
    }
}

#[must_use]
pub fn log_entries(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    log.lock().unwrap_or_else(PoisonError::into_inner).clone()
}
