//! Page — a per-user virtual document with a render/send/close lifecycle.
//!
//! ARCHITECTURE
//! ============
//! A `Page<C>` wraps page-type specific content `C: PageContent` with the
//! shared state machine:
//!
//! ```text
//! constructed ──open()──▶ open ──send()──▶ open ──close()──▶ destroyed
//!                          │                 ▲
//!                          └─switch_location─┘
//! ```
//!
//! Every push goes through `send()`, which renders, compares the markup with
//! the last delivery, and only talks to the transport when something changed
//! or a forced send was requested.
//!
//! DELIVERY CHANNELS
//! =================
//! A page is either a standalone document keyed by its page id, or an
//! inline overlay with a name. `switch_location()` moves between the two and
//! retracts whatever presentation was left behind.
//!
//! ERROR HANDLING
//! ==============
//! - Closing a page twice is a lifecycle violation: `PageError::AlreadyClosed`.
//! - A viewer who is no longer reachable, a vetoed send, or unchanged markup
//!   are silent no-ops reported through `SendOutcome`, never errors.
//! - Sub-command failures are `CommandError`s whose messages go back to the
//!   user.

use std::sync::Arc;

use tracing::{debug, info};

use crate::button::{QuietButtonOptions, quiet_button};
use crate::component::Component;
use crate::frame::ErrorCode;
use crate::identity::{Directory, Rank, RoomId, UserId, Viewer};
use crate::transport::Transport;

/// Label of the switch button on an overlay page.
pub const MOVE_TO_STANDALONE_LABEL: &str = "Open as page";

/// Label of the switch button on a standalone page.
pub const MOVE_TO_OVERLAY_LABEL: &str = "Show in chat";

pub const CLOSE_LABEL: &str = "Close";

/// Left in place of an overlay after the page moves to its own document.
pub const MOVED_TO_STANDALONE_NOTICE: &str = "<div class=\"infobox\">This page was moved to its own window.</div>";

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    #[error("page {page_id} for {user_id} is already closed")]
    AlreadyClosed { page_id: String, user_id: UserId },
}

impl ErrorCode for PageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyClosed { .. } => "E_PAGE_CLOSED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown sub-command: {0}")]
    UnknownSubCommand(String),
    #[error("{0}")]
    Rejected(String),
    #[error("this page has been closed")]
    PageClosed,
}

impl ErrorCode for CommandError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownSubCommand(_) => "E_UNKNOWN_SUBCOMMAND",
            Self::Rejected(_) => "E_COMMAND_REJECTED",
            Self::PageClosed => "E_PAGE_CLOSED",
        }
    }
}

// =============================================================================
// TYPES
// =============================================================================

/// Where a page is currently presented. Exactly one at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryChannel {
    Standalone,
    Overlay(String),
}

impl DeliveryChannel {
    #[must_use]
    pub fn is_overlay(&self) -> bool {
        matches!(self, Self::Overlay(_))
    }

    #[must_use]
    pub fn overlay_name(&self) -> Option<&str> {
        match self {
            Self::Standalone => None,
            Self::Overlay(name) => Some(name),
        }
    }
}

/// What a call to `send()` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The page is closed.
    Closed,
    /// `PageContent::before_send` refused.
    Vetoed,
    /// The viewer is no longer reachable.
    ViewerAbsent,
    /// Markup matched the last delivery and no send was forced.
    Unchanged,
    Delivered,
}

/// Collaborators every page of a type shares.
#[derive(Clone)]
pub struct PageEnv {
    pub transport: Arc<dyn Transport>,
    pub directory: Arc<dyn Directory>,
    /// Minimum room rank that counts as staff.
    pub min_staff_rank: Rank,
}

/// Per-page construction options.
#[derive(Debug, Clone)]
pub struct PageOptions {
    /// Command prefix the page's buttons send, e.g. `/profile`.
    pub command: String,
    /// Room whose ranks decide staff status.
    pub room: RoomId,
    /// Overlay name used when the page moves inline.
    pub overlay_name: String,
    /// Show a button that toggles the delivery channel.
    pub offer_switch_location: bool,
    /// Start inline instead of standalone.
    pub start_in_overlay: bool,
}

/// Page-type specific content and lifecycle hooks.
pub trait PageContent: Send {
    /// Render the page body.
    fn render(&self, view: &PageView<'_>, is_open: bool) -> String;

    /// Pre-send guard. Returning `false` skips the send entirely.
    fn before_send(&self, _is_open: bool) -> bool {
        true
    }

    /// Runs after every delivery.
    fn on_send(&mut self) {}

    /// Runs during `close()`, before the page is destroyed.
    fn on_close(&mut self) {}
}

/// Read-only context handed to renderers.
pub struct PageView<'a> {
    pub page_id: &'a str,
    pub viewer: &'a Viewer,
    pub is_staff: bool,
    pub readonly: bool,
    pub channel: &'a DeliveryChannel,
    pub command: &'a str,
    pub close_button: &'a str,
    pub switch_location_button: &'a str,
    pub components: &'a [Box<dyn Component>],
}

impl PageView<'_> {
    /// Same rules as [`Page::build_quiet_button`].
    #[must_use]
    pub fn quiet_button(&self, action: &str, label: &str, options: QuietButtonOptions) -> String {
        quiet_button(self.readonly, action, label, options)
    }

    /// Markup of all active components, in registration order.
    #[must_use]
    pub fn render_components(&self) -> String {
        self.components
            .iter()
            .filter(|c| c.is_active())
            .map(|c| c.render(self))
            .collect()
    }
}

// =============================================================================
// PAGE
// =============================================================================

pub struct Page<C> {
    page_id: String,
    user_id: UserId,
    user_name: String,
    closed: bool,
    readonly: bool,
    is_staff: bool,
    channel: DeliveryChannel,
    last_rendered: Option<String>,
    force_send: bool,
    components: Vec<Box<dyn Component>>,
    close_button: String,
    switch_location_button: String,
    options: PageOptions,
    env: PageEnv,
    content: Option<C>,
}

impl<C: PageContent> Page<C> {
    pub fn new(page_id: impl Into<String>, user_id: UserId, content: C, options: PageOptions, env: PageEnv) -> Self {
        let channel = if options.start_in_overlay {
            DeliveryChannel::Overlay(options.overlay_name.clone())
        } else {
            DeliveryChannel::Standalone
        };
        let mut page = Self {
            page_id: page_id.into(),
            user_name: user_id.to_string(),
            user_id: user_id.clone(),
            closed: false,
            readonly: false,
            is_staff: false,
            channel,
            last_rendered: None,
            force_send: false,
            components: Vec::new(),
            close_button: String::new(),
            switch_location_button: String::new(),
            options,
            env,
            content: Some(content),
        };
        page.set_identity(&user_id);
        page
    }

    #[must_use]
    pub fn with_component(mut self, component: Box<dyn Component>) -> Self {
        self.add_component(component);
        self
    }

    pub fn add_component(&mut self, component: Box<dyn Component>) {
        if !self.closed {
            self.components.push(component);
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn page_id(&self) -> &str {
        &self.page_id
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    #[must_use]
    pub fn is_staff(&self) -> bool {
        self.is_staff
    }

    #[must_use]
    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    #[must_use]
    pub fn channel(&self) -> &DeliveryChannel {
        &self.channel
    }

    #[must_use]
    pub fn last_rendered(&self) -> Option<&str> {
        self.last_rendered.as_deref()
    }

    #[must_use]
    pub fn close_button(&self) -> &str {
        &self.close_button
    }

    #[must_use]
    pub fn switch_location_button(&self) -> &str {
        &self.switch_location_button
    }

    #[must_use]
    pub fn components(&self) -> &[Box<dyn Component>] {
        &self.components
    }

    #[must_use]
    pub fn content(&self) -> Option<&C> {
        self.content.as_ref()
    }

    /// Mutable domain content. `None` once the page is destroyed.
    pub fn content_mut(&mut self) -> Option<&mut C> {
        self.content.as_mut()
    }

    // -------------------------------------------------------------------------
    // Identity
    // -------------------------------------------------------------------------

    /// Bind the page to `user_id` and recompute the display name and staff
    /// flag from the directory.
    ///
    /// Registered pages must be re-keyed through
    /// [`Registry::reconcile_rename`](crate::registry::Registry::reconcile_rename).
    pub(crate) fn set_identity(&mut self, user_id: &UserId) {
        self.user_id = user_id.clone();
        let directory = Arc::clone(&self.env.directory);
        match directory.resolve_viewer(user_id) {
            Some(viewer) => {
                self.is_staff = directory.has_minimum_rank(&self.options.room, &viewer, self.env.min_staff_rank)
                    || directory.is_elevated(&viewer);
                self.user_name = viewer.name;
            }
            None => self.is_staff = false,
        }
        self.rebuild_buttons();
    }

    /// Re-resolve the current identity, e.g. after a display-name change.
    pub fn refresh_identity(&mut self) {
        let user_id = self.user_id.clone();
        self.set_identity(&user_id);
    }

    pub fn set_readonly(&mut self, readonly: bool) {
        if self.closed || self.readonly == readonly {
            return;
        }
        self.readonly = readonly;
        self.force_send = true;
        self.rebuild_buttons();
    }

    // -------------------------------------------------------------------------
    // Buttons
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn build_quiet_button(&self, action: &str, label: &str, options: QuietButtonOptions) -> String {
        quiet_button(self.readonly, action, label, options)
    }

    /// Overlay pages have no close button; leaving the overlay closes them.
    pub fn set_close_button(&mut self, options: QuietButtonOptions) {
        self.close_button = if self.channel.is_overlay() {
            String::new()
        } else {
            let action = format!("{} close", self.options.command);
            self.build_quiet_button(&action, CLOSE_LABEL, options)
        };
    }

    /// The label names the channel the page would move to.
    pub fn set_switch_location_button(&mut self) {
        self.switch_location_button = if self.options.offer_switch_location {
            let action = format!("{} switchlocation", self.options.command);
            let label = if self.channel.is_overlay() { MOVE_TO_STANDALONE_LABEL } else { MOVE_TO_OVERLAY_LABEL };
            self.build_quiet_button(&action, label, QuietButtonOptions { enabled_readonly: true, ..Default::default() })
        } else {
            String::new()
        };
    }

    fn rebuild_buttons(&mut self) {
        self.set_close_button(QuietButtonOptions { enabled_readonly: true, ..Default::default() });
        self.set_switch_location_button();
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// First delivery. Always reaches the transport unless the guard vetoes
    /// or the viewer is gone.
    pub fn open(&mut self) -> SendOutcome {
        self.force_send = true;
        self.send(true)
    }

    /// Render and deliver if the markup changed or a send was forced.
    pub fn send(&mut self, is_open: bool) -> SendOutcome {
        if self.closed {
            return SendOutcome::Closed;
        }
        let Some(content) = self.content.as_ref() else {
            return SendOutcome::Closed;
        };
        if !content.before_send(is_open) {
            debug!(page_id = %self.page_id, user_id = %self.user_id, "page: send vetoed");
            return SendOutcome::Vetoed;
        }
        let Some(viewer) = self.env.directory.resolve_viewer(&self.user_id) else {
            debug!(page_id = %self.page_id, user_id = %self.user_id, "page: viewer absent, send skipped");
            return SendOutcome::ViewerAbsent;
        };

        let view = PageView {
            page_id: &self.page_id,
            viewer: &viewer,
            is_staff: self.is_staff,
            readonly: self.readonly,
            channel: &self.channel,
            command: &self.options.command,
            close_button: &self.close_button,
            switch_location_button: &self.switch_location_button,
            components: &self.components,
        };
        let html = content.render(&view, is_open);

        if !self.force_send && self.last_rendered.as_deref() == Some(html.as_str()) {
            debug!(page_id = %self.page_id, user_id = %self.user_id, "page: unchanged, send skipped");
            return SendOutcome::Unchanged;
        }

        self.force_send = false;
        match &self.channel {
            DeliveryChannel::Standalone => self.env.transport.deliver_standalone(&viewer, &self.page_id, &html),
            DeliveryChannel::Overlay(name) => self.env.transport.deliver_overlay(&viewer, name, &html),
        }
        self.last_rendered = Some(html);

        if let Some(content) = self.content.as_mut() {
            content.on_send();
        }
        SendOutcome::Delivered
    }

    /// Close and destroy the page.
    ///
    /// # Errors
    ///
    /// Returns `PageError::AlreadyClosed` if the page was already closed.
    /// That is a caller bug, not a recoverable condition.
    pub fn close(&mut self) -> Result<(), PageError> {
        if self.closed {
            return Err(PageError::AlreadyClosed { page_id: self.page_id.clone(), user_id: self.user_id.clone() });
        }
        self.close_open_page();
        Ok(())
    }

    /// Close if still open, otherwise do nothing.
    pub fn try_close(&mut self) {
        if !self.closed {
            self.close_open_page();
        }
    }

    fn close_open_page(&mut self) {
        if !self.channel.is_overlay() {
            self.temporarily_close();
        }
        if let Some(content) = self.content.as_mut() {
            content.on_close();
        }
        self.destroy();
    }

    /// Retract the standalone presentation but keep all state.
    pub fn temporarily_close(&self) {
        if self.closed {
            return;
        }
        if let Some(viewer) = self.env.directory.resolve_viewer(&self.user_id) {
            self.env.transport.retract_standalone(&viewer, &self.page_id);
        }
    }

    /// Toggle between standalone and overlay delivery.
    pub fn switch_location(&mut self) -> SendOutcome {
        if self.closed {
            return SendOutcome::Closed;
        }
        let previous = std::mem::replace(&mut self.channel, DeliveryChannel::Standalone);
        if !previous.is_overlay() {
            self.channel = DeliveryChannel::Overlay(self.options.overlay_name.clone());
        }
        info!(page_id = %self.page_id, user_id = %self.user_id, channel = ?self.channel, "page: switched location");

        self.force_send = true;
        self.rebuild_buttons();
        let outcome = self.send(true);

        match previous {
            DeliveryChannel::Overlay(name) => {
                if let Some(viewer) = self.env.directory.resolve_viewer(&self.user_id) {
                    self.env
                        .transport
                        .retract_overlay(&viewer, &name, MOVED_TO_STANDALONE_NOTICE);
                }
            }
            DeliveryChannel::Standalone => self.temporarily_close(),
        }
        outcome
    }

    /// Tear down: destroy components in order, drop content, mark closed.
    ///
    /// Only `page_id`, `user_id` and `user_name` survive for diagnostics.
    pub fn destroy(&mut self) {
        if self.closed {
            return;
        }
        for component in &mut self.components {
            component.destroy();
        }
        self.components.clear();
        self.content = None;
        self.last_rendered = None;
        self.force_send = false;
        self.close_button.clear();
        self.switch_location_button.clear();
        self.closed = true;
        info!(page_id = %self.page_id, user_id = %self.user_id, "page: destroyed");
    }

    // -------------------------------------------------------------------------
    // Components
    // -------------------------------------------------------------------------

    /// Route a sub-command to the first active component that answers to it.
    /// A handled command forces the next send; a rejected one does not.
    ///
    /// # Errors
    ///
    /// `UnknownSubCommand` when no active component matches, `Rejected` with
    /// the component's message when its handler fails, `PageClosed` on a
    /// destroyed page.
    pub fn check_component_command(&mut self, command: &str, args: &str) -> Result<(), CommandError> {
        if self.closed {
            return Err(CommandError::PageClosed);
        }
        let Some(component) = self
            .components
            .iter_mut()
            .find(|c| c.is_active() && c.command_name() == command)
        else {
            return Err(CommandError::UnknownSubCommand(command.to_string()));
        };
        component.handle(args).map_err(CommandError::Rejected)?;
        self.force_send = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "page_test.rs"]
mod tests;
