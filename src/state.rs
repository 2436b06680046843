//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the directory and transport every page shares, plus one
//! registry per page type. Registries sit behind a `tokio::sync::Mutex`, so
//! commands touching the same page type run one at a time.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::ServerConfig;
use crate::directory::MemoryDirectory;
use crate::identity::Directory;
use crate::page::PageEnv;
use crate::pages::profile::{PROFILE_PAGE_ID, ProfilePage};
use crate::registry::Registry;
use crate::transport::{FrameTransport, Transport};

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub directory: Arc<MemoryDirectory>,
    pub transport: Arc<FrameTransport>,
    pub profiles: Arc<Mutex<Registry<ProfilePage>>>,
}

impl AppState {
    /// Build state and seed configured ranks into the directory.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        let directory = Arc::new(MemoryDirectory::new());
        for (id, rank) in &config.room_staff {
            directory.set_rank(&config.default_room, id, *rank);
        }
        for id in &config.elevated_users {
            directory.set_elevated(id, true);
        }
        Self {
            config: Arc::new(config),
            directory,
            transport: Arc::new(FrameTransport::new()),
            profiles: Arc::new(Mutex::new(Registry::new(PROFILE_PAGE_ID))),
        }
    }

    /// Collaborators handed to every new page.
    #[must_use]
    pub fn page_env(&self) -> PageEnv {
        PageEnv {
            transport: Arc::clone(&self.transport) as Arc<dyn Transport>,
            directory: Arc::clone(&self.directory) as Arc<dyn Directory>,
            min_staff_rank: self.config.min_staff_rank,
        }
    }
}
