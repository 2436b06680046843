//! Component — an embeddable sub-widget that owns a slice of a page's
//! command handling.
//!
//! A page only ever looks at a component through this trait: its command
//! name, whether it is active, and its handler. Everything else is private
//! to the component. Components are owned by exactly one page and destroyed
//! with it.

use crate::page::PageView;

pub trait Component: Send {
    /// Sub-command token this component answers to.
    fn command_name(&self) -> &str;

    /// Inactive components are skipped during dispatch even when the name
    /// matches.
    fn is_active(&self) -> bool {
        true
    }

    /// Handle a sub-command. `Err` carries a message for the user.
    fn handle(&mut self, args: &str) -> Result<(), String>;

    /// Markup this component contributes to the page.
    fn render(&self, _view: &PageView<'_>) -> String {
        String::new()
    }

    /// Release resources. Called once, when the owning page is destroyed.
    fn destroy(&mut self) {}
}
