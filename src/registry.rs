//! Page registry — at most one live page per identity, per page type.
//!
//! DESIGN
//! ======
//! One `Registry<C>` exists per page type and owns that type's pages.
//! The map is written in exactly three places:
//! - `register`: destroys any page already held for the identity, then
//!   installs the new one.
//! - `reconcile_rename`: re-keys a page when its owner's identity changes,
//!   or destroys it when the new identity already has a page.
//! - `with_page`: after the caller's closure runs, a page that ended up
//!   closed is dropped from the map.
//!
//! Displaced pages are handed back to the caller already destroyed, so the
//! caller can confirm they are inert but can never reach them through the
//! registry again.

use std::collections::HashMap;

use tracing::info;

use crate::identity::UserId;
use crate::page::{Page, PageContent};

pub struct Registry<C> {
    page_id: String,
    pages: HashMap<UserId, Page<C>>,
}

impl<C: PageContent> Registry<C> {
    pub fn new(page_id: impl Into<String>) -> Self {
        Self { page_id: page_id.into(), pages: HashMap::new() }
    }

    #[must_use]
    pub fn page_id(&self) -> &str {
        &self.page_id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Install `page` under its owner, destroying any page already there.
    /// Returns the displaced page.
    pub fn register(&mut self, page: Page<C>) -> Option<Page<C>> {
        let user_id = page.user_id().clone();
        let displaced = self.pages.remove(&user_id).map(|mut prior| {
            prior.destroy();
            info!(page_id = %self.page_id, user_id = %user_id, "registry: replaced existing page");
            prior
        });
        self.pages.insert(user_id, page);
        displaced
    }

    #[must_use]
    pub fn lookup(&self, user_id: &UserId) -> Option<&Page<C>> {
        self.pages.get(user_id)
    }

    /// Run `f` against the page registered for `user_id`. A page that `f`
    /// closed is removed from the registry afterwards.
    pub fn with_page<R>(&mut self, user_id: &UserId, f: impl FnOnce(&mut Page<C>) -> R) -> Option<R> {
        let page = self.pages.get_mut(user_id)?;
        let result = f(page);
        if page.is_closed() {
            self.pages.remove(user_id);
            info!(page_id = %self.page_id, user_id = %user_id, "registry: page removed");
        }
        Some(result)
    }

    /// Register `page` and perform its first delivery.
    pub fn open(&mut self, page: Page<C>) -> Option<Page<C>> {
        let user_id = page.user_id().clone();
        let displaced = self.register(page);
        self.with_page(&user_id, Page::open);
        displaced
    }

    /// Close the page for `user_id` if one is registered. Returns whether a
    /// page was closed.
    pub fn try_close(&mut self, user_id: &UserId) -> bool {
        self.with_page(user_id, Page::try_close).is_some()
    }

    /// Follow an identity change from `old` to `new`.
    ///
    /// - `old` has no page: nothing happens.
    /// - `old == new` (display name only): the page refreshes its name.
    /// - `new` already has a page: the `old` page is destroyed and returned.
    /// - otherwise the page moves to `new` and re-resolves its identity.
    pub fn reconcile_rename(&mut self, old: &UserId, new: &UserId) -> Option<Page<C>> {
        if old == new {
            if let Some(page) = self.pages.get_mut(old) {
                page.refresh_identity();
            }
            return None;
        }
        let mut page = self.pages.remove(old)?;
        if self.pages.contains_key(new) {
            page.destroy();
            info!(page_id = %self.page_id, old = %old, new = %new, "registry: rename collapsed onto existing page");
            return Some(page);
        }
        page.set_identity(new);
        info!(page_id = %self.page_id, old = %old, new = %new, "registry: page re-keyed");
        self.pages.insert(new.clone(), page);
        None
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
