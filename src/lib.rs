//! Per-user interactive pages for a chat server.
//!
//! ARCHITECTURE
//! ============
//! ```text
//! routes::ws ──► commands ──► registry ──► page ──► transport ──► client
//!                                            │
//!                                            ├──► directory (who, staff?)
//!                                            └──► components (sub-commands)
//! ```
//!
//! A `Page` is one user's view of a feature. It renders through its
//! `PageContent`, delivers either as a standalone page or inline overlay,
//! and skips re-delivery when the markup has not changed. Each page type
//! keeps a `Registry` holding at most one live page per user.

pub mod button;
pub mod commands;
pub mod component;
pub mod config;
pub mod directory;
pub mod frame;
pub mod identity;
pub mod page;
pub mod pages;
pub mod registry;
pub mod routes;
pub mod state;
pub mod transport;

#[cfg(test)]
mod test_helpers;
