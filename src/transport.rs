//! Transport — how rendered pages reach a viewer.
//!
//! DESIGN
//! ======
//! Pages talk to the `Transport` trait only. Every call is fire-and-forget:
//! the page never learns whether a delivery arrived, and a failed push is
//! the transport's problem to log.
//!
//! `FrameTransport` is the websocket implementation. Each connected user
//! registers an `mpsc::Sender<Frame>`; deliveries become frames pushed with
//! `try_send` so a slow client can never stall the page engine.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::warn;

use crate::frame::Frame;
use crate::identity::{UserId, Viewer};

/// Delivery sink for page content.
pub trait Transport: Send + Sync {
    /// Push `content` as the standalone page `page_id`.
    fn deliver_standalone(&self, viewer: &Viewer, page_id: &str, content: &str);

    /// Close the standalone page `page_id` on the viewer's client.
    fn retract_standalone(&self, viewer: &Viewer, page_id: &str);

    /// Push `content` inline under the overlay `name`.
    fn deliver_overlay(&self, viewer: &Viewer, name: &str, content: &str);

    /// Replace the overlay `name` with `notice` (empty removes it).
    fn retract_overlay(&self, viewer: &Viewer, name: &str, notice: &str);
}

// =============================================================================
// FRAME TRANSPORT
// =============================================================================

#[derive(Default)]
pub struct FrameTransport {
    clients: Mutex<HashMap<UserId, mpsc::Sender<Frame>>>,
}

impl FrameTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<UserId, mpsc::Sender<Frame>>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Route frames for `id` to `tx`, replacing any previous connection.
    pub fn connect(&self, id: UserId, tx: mpsc::Sender<Frame>) {
        self.lock().insert(id, tx);
    }

    pub fn disconnect(&self, id: &UserId) {
        self.lock().remove(id);
    }

    /// Move a connection to a new identity after a rename.
    pub fn rekey(&self, old: &UserId, new: UserId) {
        let mut clients = self.lock();
        if let Some(tx) = clients.remove(old) {
            clients.insert(new, tx);
        }
    }

    /// Push a frame to a user. Drops the frame if the user is not
    /// connected or their queue is full.
    pub fn push(&self, id: &UserId, frame: Frame) {
        let Some(tx) = self.lock().get(id).cloned() else {
            warn!(user_id = %id, kind = %frame.kind, "transport: no client connected, frame dropped");
            return;
        };
        if let Err(e) = tx.try_send(frame) {
            warn!(user_id = %id, error = %e, "transport: client queue rejected frame");
        }
    }
}

impl Transport for FrameTransport {
    fn deliver_standalone(&self, viewer: &Viewer, page_id: &str, content: &str) {
        let frame = Frame::new("page:deliver")
            .with_data("page_id", page_id)
            .with_content(content);
        self.push(&viewer.id, frame);
    }

    fn retract_standalone(&self, viewer: &Viewer, page_id: &str) {
        self.push(&viewer.id, Frame::new("page:retract").with_data("page_id", page_id));
    }

    fn deliver_overlay(&self, viewer: &Viewer, name: &str, content: &str) {
        let frame = Frame::new("overlay:deliver")
            .with_data("name", name)
            .with_content(content);
        self.push(&viewer.id, frame);
    }

    fn retract_overlay(&self, viewer: &Viewer, name: &str, notice: &str) {
        let frame = Frame::new("overlay:retract")
            .with_data("name", name)
            .with_data("notice", notice);
        self.push(&viewer.id, frame);
    }
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;
