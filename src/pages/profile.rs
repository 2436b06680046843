//! Profile page — the viewer's own card, with tabs and an editable motto.
//!
//! Mostly a demonstration of the page engine: the content renders chrome
//! and identity, while the `TabBar` and `Motto` components own their
//! sub-commands (`/profile tab <name>`, `/profile motto <text>`).

use crate::button::{QuietButtonOptions, escape_html};
use crate::component::Component;
use crate::identity::{RoomId, UserId};
use crate::page::{Page, PageContent, PageEnv, PageOptions, PageView};

pub const PROFILE_PAGE_ID: &str = "profile";
pub const PROFILE_COMMAND: &str = "/profile";

const MAX_MOTTO_CHARS: usize = 100;

/// Build a profile page for `user_id`, with staff status judged in `room`.
#[must_use]
pub fn profile_page(user_id: UserId, room: RoomId, env: PageEnv) -> Page<ProfilePage> {
    let options = PageOptions {
        command: PROFILE_COMMAND.into(),
        room,
        // Overlays are scoped to the viewer's client, so one fixed name
        // stays valid across renames.
        overlay_name: PROFILE_PAGE_ID.into(),
        offer_switch_location: true,
        start_in_overlay: false,
    };
    Page::new(PROFILE_PAGE_ID, user_id, ProfilePage, options, env)
        .with_component(Box::new(TabBar::new(vec![
            Tab { name: "about", label: "About", body: "<p>Trainer card.</p>" },
            Tab { name: "badges", label: "Badges", body: "<p>No badges yet.</p>" },
        ])))
        .with_component(Box::new(Motto::default()))
}

// =============================================================================
// CONTENT
// =============================================================================

pub struct ProfilePage;

impl PageContent for ProfilePage {
    fn render(&self, view: &PageView<'_>, _is_open: bool) -> String {
        let mut html = String::from("<div class=\"pad\">");
        html.push_str(view.close_button);
        html.push_str(view.switch_location_button);
        html.push_str("<h2>");
        html.push_str(&escape_html(&view.viewer.name));
        html.push_str("</h2>");
        if view.is_staff {
            html.push_str("<p><small>Staff</small></p>");
        }
        if view.readonly {
            html.push_str("<p><em>Read-only</em></p>");
        }
        html.push_str(&view.render_components());
        html.push_str("</div>");
        html
    }
}

// =============================================================================
// TAB BAR
// =============================================================================

pub struct Tab {
    pub name: &'static str,
    pub label: &'static str,
    pub body: &'static str,
}

pub struct TabBar {
    tabs: Vec<Tab>,
    selected: usize,
}

impl TabBar {
    #[must_use]
    pub fn new(tabs: Vec<Tab>) -> Self {
        Self { tabs, selected: 0 }
    }

    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.tabs.get(self.selected).map(|t| t.name)
    }
}

impl Component for TabBar {
    fn command_name(&self) -> &str {
        "tab"
    }

    fn is_active(&self) -> bool {
        !self.tabs.is_empty()
    }

    fn handle(&mut self, args: &str) -> Result<(), String> {
        let wanted = args.trim();
        let Some(index) = self.tabs.iter().position(|t| t.name == wanted) else {
            return Err(format!("unknown tab: {wanted}"));
        };
        self.selected = index;
        Ok(())
    }

    fn render(&self, view: &PageView<'_>) -> String {
        let mut html = String::from("<div class=\"tabs\">");
        for (index, tab) in self.tabs.iter().enumerate() {
            let action = format!("{} tab {}", view.command, tab.name);
            let options = QuietButtonOptions {
                selected_and_disabled: index == self.selected,
                enabled_readonly: true,
                ..Default::default()
            };
            html.push_str(&view.quiet_button(&action, tab.label, options));
        }
        html.push_str("</div>");
        if let Some(tab) = self.tabs.get(self.selected) {
            html.push_str(tab.body);
        }
        html
    }
}

// =============================================================================
// MOTTO
// =============================================================================

#[derive(Default)]
pub struct Motto {
    text: Option<String>,
}

impl Component for Motto {
    fn command_name(&self) -> &str {
        "motto"
    }

    fn handle(&mut self, args: &str) -> Result<(), String> {
        let text = args.trim();
        if text.is_empty() {
            self.text = None;
            return Ok(());
        }
        if text.chars().count() > MAX_MOTTO_CHARS {
            return Err(format!("mottos are limited to {MAX_MOTTO_CHARS} characters"));
        }
        self.text = Some(text.to_string());
        Ok(())
    }

    fn render(&self, view: &PageView<'_>) -> String {
        let mut html = String::from("<p class=\"motto\">");
        match &self.text {
            Some(text) => html.push_str(&escape_html(text)),
            None => html.push_str("<em>No motto set.</em>"),
        }
        html.push_str("</p>");
        let clear = format!("{} motto", view.command);
        html.push_str(&view.quiet_button(&clear, "Clear motto", QuietButtonOptions::default()));
        html
    }
}

#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;
