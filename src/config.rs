//! Server configuration parsed from environment variables.

use std::collections::HashMap;

use crate::frame::ErrorCode;
use crate::identity::{ParseRankError, Rank, RoomId, UserId};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_ROOM: &str = "lobby";
pub const DEFAULT_MIN_STAFF_RANK: Rank = Rank::Driver;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid PORT: {0}")]
    InvalidPort(String),
    #[error("invalid {var}: {source}")]
    InvalidRank { var: &'static str, source: ParseRankError },
    #[error("invalid ROOM_STAFF entry {0:?} (expected name=symbol)")]
    InvalidStaffEntry(String),
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidPort(_) => "E_CONFIG_PORT",
            Self::InvalidRank { .. } => "E_CONFIG_RANK",
            Self::InvalidStaffEntry(_) => "E_CONFIG_STAFF",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// Minimum rank in `default_room` that counts as staff.
    pub min_staff_rank: Rank,
    /// Room pages judge staff status in.
    pub default_room: RoomId,
    /// Ranks seeded into `default_room` at startup.
    pub room_staff: Vec<(UserId, Rank)>,
    /// Users with a global elevated role.
    pub elevated_users: Vec<UserId>,
}

impl ServerConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `MIN_STAFF_RANK`: rank symbol, default `%`
    /// - `DEFAULT_ROOM`: default `lobby`
    /// - `ROOM_STAFF`: comma list of `name=symbol`, e.g. `brock=@,misty=%`
    /// - `ELEVATED_USERS`: comma list of names
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the first variable that fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ServerConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => DEFAULT_PORT,
        };
        let min_staff_rank = match lookup("MIN_STAFF_RANK") {
            Some(raw) => raw
                .trim()
                .parse::<Rank>()
                .map_err(|source| ConfigError::InvalidRank { var: "MIN_STAFF_RANK", source })?,
            None => DEFAULT_MIN_STAFF_RANK,
        };
        let default_room = RoomId::from_name(&lookup("DEFAULT_ROOM").unwrap_or_else(|| DEFAULT_ROOM.into()));
        let room_staff = parse_room_staff(&lookup("ROOM_STAFF").unwrap_or_default())?;
        let elevated_users = split_list(&lookup("ELEVATED_USERS").unwrap_or_default())
            .map(UserId::from_name)
            .collect();

        Ok(Self { port, min_staff_rank, default_room, room_staff, elevated_users })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            min_staff_rank: DEFAULT_MIN_STAFF_RANK,
            default_room: RoomId::from_name(DEFAULT_ROOM),
            room_staff: Vec::new(),
            elevated_users: Vec::new(),
        }
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_room_staff(raw: &str) -> Result<Vec<(UserId, Rank)>, ConfigError> {
    split_list(raw)
        .map(|entry| {
            let Some((name, symbol)) = entry.split_once('=') else {
                return Err(ConfigError::InvalidStaffEntry(entry.to_string()));
            };
            let id = UserId::from_name(name);
            if id.is_empty() {
                return Err(ConfigError::InvalidStaffEntry(entry.to_string()));
            }
            let rank = symbol
                .trim()
                .parse::<Rank>()
                .map_err(|source| ConfigError::InvalidRank { var: "ROOM_STAFF", source })?;
            Ok((id, rank))
        })
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
