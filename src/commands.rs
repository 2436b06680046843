//! Command dispatcher — turns chat command lines into page operations.
//!
//! DESIGN
//! ======
//! Inbound websocket text is a single command line. The dispatcher owns the
//! syntax and resolves each line to a registry or page operation:
//!
//! ```text
//! /profile [open]              construct, register, open
//! /profile close               close (lifecycle violations propagate)
//! /profile switchlocation      standalone <-> overlay
//! /profile readonly on|off     toggle read-only and re-send
//! /profile <sub> [args]        route to a component, then re-send
//! /nick <name>                 rename + reconcile every registry
//! ```
//!
//! Returns `Ok(Some(msg))` for a plain reply, `Ok(None)` when the page
//! delivery itself is the reply, and `Err` for anything the user should see
//! as an error.

use tracing::{info, warn};

use crate::frame::ErrorCode;
use crate::identity::UserId;
use crate::page::{CommandError, Page, PageError};
use crate::pages::profile::{PROFILE_COMMAND, profile_page};
use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("no profile page is open")]
    NoPage,
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("that name is unavailable")]
    NameUnavailable,
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Page(#[from] PageError),
}

impl ErrorCode for DispatchError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownCommand(_) => "E_UNKNOWN_COMMAND",
            Self::NoPage => "E_NO_PAGE",
            Self::Usage(_) => "E_USAGE",
            Self::NameUnavailable => "E_NAME_UNAVAILABLE",
            Self::Command(e) => e.error_code(),
            Self::Page(e) => e.error_code(),
        }
    }
}

/// Dispatch one command line from `user_id`. A successful `/nick` updates
/// `user_id` in place.
///
/// # Errors
///
/// Returns a `DispatchError` describing why the command was not carried out.
pub async fn handle_command(state: &AppState, user_id: &mut UserId, line: &str) -> Result<Option<String>, DispatchError> {
    let line = line.trim();
    let (command, rest) = split_word(line);
    match command {
        PROFILE_COMMAND => handle_profile(state, user_id, rest).await,
        "/nick" => handle_nick(state, user_id, rest).await,
        _ => Err(DispatchError::UnknownCommand(command.to_string())),
    }
}

fn split_word(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((head, tail)) => (head, tail.trim_start()),
        None => (text, ""),
    }
}

async fn handle_profile(state: &AppState, user_id: &UserId, rest: &str) -> Result<Option<String>, DispatchError> {
    let (sub, args) = split_word(rest);
    let mut profiles = state.profiles.lock().await;
    match sub {
        "" | "open" => {
            let page = profile_page(user_id.clone(), state.config.default_room.clone(), state.page_env());
            if profiles.open(page).is_some() {
                info!(user_id = %user_id, "profile: reopened, prior page replaced");
            }
            Ok(None)
        }
        "close" => {
            profiles
                .with_page(user_id, Page::close)
                .ok_or(DispatchError::NoPage)??;
            Ok(None)
        }
        "switchlocation" => {
            profiles
                .with_page(user_id, Page::switch_location)
                .ok_or(DispatchError::NoPage)?;
            Ok(None)
        }
        "readonly" => {
            let readonly = match args {
                "on" => true,
                "off" => false,
                _ => return Err(DispatchError::Usage("/profile readonly on|off")),
            };
            profiles
                .with_page(user_id, |page| {
                    page.set_readonly(readonly);
                    page.send(false)
                })
                .ok_or(DispatchError::NoPage)?;
            Ok(None)
        }
        _ => {
            profiles
                .with_page(user_id, |page| {
                    page.check_component_command(sub, args)?;
                    page.send(false);
                    Ok::<_, CommandError>(())
                })
                .ok_or(DispatchError::NoPage)?
                .inspect_err(|e| warn!(user_id = %user_id, error = %e, "profile: sub-command failed"))?;
            Ok(None)
        }
    }
}

async fn handle_nick(state: &AppState, user_id: &mut UserId, name: &str) -> Result<Option<String>, DispatchError> {
    if name.is_empty() {
        return Err(DispatchError::Usage("/nick <name>"));
    }
    let viewer = state
        .directory
        .rename(user_id, name)
        .ok_or(DispatchError::NameUnavailable)?;
    state.transport.rekey(user_id, viewer.id.clone());

    let displaced = state
        .profiles
        .lock()
        .await
        .reconcile_rename(user_id, &viewer.id);
    if displaced.is_some() {
        info!(old = %user_id, new = %viewer.id, "nick: stale profile page discarded");
    }

    *user_id = viewer.id;
    Ok(Some(format!("You are now known as {}.", viewer.name)))
}

#[cfg(test)]
#[path = "commands_test.rs"]
mod tests;
