//! Identities, ranks, and the directory that resolves them.
//!
//! DESIGN
//! ======
//! A `UserId` is the normalized identity token pages are keyed by. Display
//! names map onto ids by dropping everything but ASCII alphanumerics and
//! lowercasing, so "Ash K." and "ashk" are the same identity.
//!
//! The `Directory` is a collaborator: pages ask it whether a viewer is
//! still reachable and whether they count as staff, but never own that data.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// IDS
// =============================================================================

/// Normalized identity token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Normalize a display name into an identity token.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self(to_id(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalized room token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(String);

impl RoomId {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self(to_id(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn to_id(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

// =============================================================================
// RANK
// =============================================================================

/// Room authority, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Rank {
    #[default]
    Regular,
    Voice,
    Driver,
    Moderator,
    RoomOwner,
    Admin,
}

impl Rank {
    #[must_use]
    pub fn symbol(self) -> char {
        match self {
            Rank::Regular => ' ',
            Rank::Voice => '+',
            Rank::Driver => '%',
            Rank::Moderator => '@',
            Rank::RoomOwner => '#',
            Rank::Admin => '&',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown rank symbol: {0:?}")]
pub struct ParseRankError(pub String);

impl FromStr for Rank {
    type Err = ParseRankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | " " => Ok(Rank::Regular),
            "+" => Ok(Rank::Voice),
            "%" => Ok(Rank::Driver),
            "@" => Ok(Rank::Moderator),
            "#" => Ok(Rank::RoomOwner),
            "&" => Ok(Rank::Admin),
            other => Err(ParseRankError(other.to_string())),
        }
    }
}

// =============================================================================
// VIEWER + DIRECTORY
// =============================================================================

/// A reachable user, as resolved by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub id: UserId,
    /// Display name, as typed by the user.
    pub name: String,
}

impl Viewer {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self { id: UserId::from_name(&name), name }
    }
}

/// Identity lookup and privilege checks.
pub trait Directory: Send + Sync {
    /// Resolve a currently reachable viewer. `None` means disconnected.
    fn resolve_viewer(&self, id: &UserId) -> Option<Viewer>;

    /// Whether `viewer` holds at least `rank` in `room`.
    fn has_minimum_rank(&self, room: &RoomId, viewer: &Viewer, rank: Rank) -> bool;

    /// Whether `viewer` holds a global elevated role.
    fn is_elevated(&self, viewer: &Viewer) -> bool;
}

#[cfg(test)]
#[path = "identity_test.rs"]
mod tests;
