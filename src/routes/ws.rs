//! WebSocket handler — command lines in, page frames out.
//!
//! DESIGN
//! ======
//! On upgrade, the viewer claims their identity in the directory and gets
//! an outbound channel in the transport, then the handler enters a
//! `select!` loop:
//! - Incoming text → one command line → dispatcher → reply or error frame
//! - Frames pushed by pages through the transport → forward to client
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → claim the identity (refused if already connected), send
//!    `session:connected`
//! 2. Client sends command lines → dispatch → reply frame on failure or text
//! 3. Pages push `page:*` / `overlay:*` frames through the transport
//! 4. Close → close the viewer's pages, then disconnect from transport and
//!    directory

use std::collections::HashMap;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::commands::handle_command;
use crate::frame::{ErrorCode, FRAME_CODE, FRAME_MESSAGE, Frame};
use crate::identity::{Directory, UserId, Viewer};
use crate::state::AppState;

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(name) = params.get("name").map(|n| n.trim().to_string()) else {
        return (StatusCode::BAD_REQUEST, "name required").into_response();
    };
    let viewer = Viewer::new(name);
    if viewer.id.is_empty() {
        return (StatusCode::BAD_REQUEST, "name must contain letters or digits").into_response();
    }
    // Fast path only; `open_session` makes the authoritative claim.
    if state.directory.resolve_viewer(&viewer.id).is_some() {
        return (StatusCode::CONFLICT, "name already connected").into_response();
    }

    ws.on_upgrade(move |socket| run_ws(socket, state, viewer))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState, viewer: Viewer) {
    // Per-connection channel for frames pushed by pages.
    let (client_tx, mut client_rx) = mpsc::channel::<Frame>(256);

    let welcome = Frame::new("session:connected")
        .with_data("user_id", viewer.id.as_str())
        .with_data("name", viewer.name.as_str());
    let mut user_id = match open_session(&state, viewer, client_tx) {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, "ws: session refused");
            if send_frame(&mut socket, &Frame::error_from(&e)).await.is_err() {
                warn!("ws: could not report refused session");
            }
            return;
        }
    };

    info!(%user_id, "ws: client connected");

    if send_frame(&mut socket, &welcome).await.is_ok() {
        loop {
            tokio::select! {
                msg = socket.recv() => {
                    let Some(msg) = msg else { break };
                    let Ok(msg) = msg else { break };
                    match msg {
                        Message::Text(text) => {
                            let Some(frame) = process_inbound_text(&state, &mut user_id, &text).await else {
                                continue;
                            };
                            if send_frame(&mut socket, &frame).await.is_err() {
                                break;
                            }
                        }
                        Message::Close(_) => break,
                        _ => {}
                    }
                }
                Some(frame) = client_rx.recv() => {
                    if send_frame(&mut socket, &frame).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    close_session(&state, &user_id).await;
    info!(%user_id, "ws: client disconnected");
}

// =============================================================================
// SESSION
// =============================================================================

#[derive(Debug, thiserror::Error)]
enum SessionError {
    #[error("name already connected: {0}")]
    NameTaken(UserId),
}

impl ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NameTaken(_) => "E_NAME_TAKEN",
        }
    }
}

/// Claim the viewer's identity and register their outbound channel.
fn open_session(state: &AppState, viewer: Viewer, client_tx: mpsc::Sender<Frame>) -> Result<UserId, SessionError> {
    let user_id = viewer.id.clone();
    if !state.directory.try_connect(viewer) {
        return Err(SessionError::NameTaken(user_id));
    }
    state.transport.connect(user_id.clone(), client_tx);
    Ok(user_id)
}

/// Close the viewer's pages, then release their channel and identity.
/// The identity is released last so a reconnect cannot see the old pages.
async fn close_session(state: &AppState, user_id: &UserId) {
    if state.profiles.lock().await.try_close(user_id) {
        info!(%user_id, "ws: profile page closed on disconnect");
    }
    state.transport.disconnect(user_id);
    state.directory.disconnect(user_id);
}

// =============================================================================
// COMMAND DISPATCH
// =============================================================================

/// Run one inbound command line and return the frame for the sender, if any.
/// Page deliveries travel through the transport, not through this return.
async fn process_inbound_text(state: &AppState, user_id: &mut UserId, text: &str) -> Option<Frame> {
    let line = text.trim();
    if line.is_empty() {
        return None;
    }
    info!(%user_id, line, "ws: recv command");
    match handle_command(state, user_id, line).await {
        Ok(Some(message)) => Some(Frame::reply(message)),
        Ok(None) => None,
        Err(e) => Some(Frame::error_from(&e)),
    }
}

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), ()> {
    let json = match serde_json::to_string(frame) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize frame");
            return Err(());
        }
    };
    if frame.data.contains_key(FRAME_CODE) {
        let code = frame.str_data(FRAME_CODE).unwrap_or("-");
        let message = frame.str_data(FRAME_MESSAGE).unwrap_or("-");
        warn!(id = %frame.id, kind = %frame.kind, code, message, "ws: send error frame");
    } else {
        info!(id = %frame.id, kind = %frame.kind, "ws: send frame");
    }
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
