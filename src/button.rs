//! Button builder — clickable affordance markup.
//!
//! DESIGN
//! ======
//! Buttons are plain HTML strings. A click makes the client send the
//! button's `value` back as a chat command, so the action is the only
//! behavior a button carries.
//!
//! Output must be a pure function of the inputs: pages compare rendered
//! markup against their last delivery, and any nondeterminism here would
//! defeat that check.

/// Style applied to selected buttons.
pub const SELECTED_STYLE: &str = "border: 2px solid #59f";

/// Escape text for use inside HTML content or a quoted attribute.
#[must_use]
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Build a button that sends `action` when clicked.
///
/// `label` is trusted markup and is inserted as-is. `action` and `style`
/// are attribute-escaped. An empty `style` omits the attribute entirely.
#[must_use]
pub fn build_button(action: &str, label: &str, disabled: bool, style: &str) -> String {
    let mut html = String::from("<button class=\"button");
    if disabled {
        html.push_str(" disabled");
    }
    html.push_str("\" name=\"send\" value=\"");
    html.push_str(&escape_html(action));
    html.push('"');
    if !style.is_empty() {
        html.push_str(" style=\"");
        html.push_str(&escape_html(style));
        html.push('"');
    }
    if disabled {
        html.push_str(" disabled");
    }
    html.push('>');
    html.push_str(label);
    html.push_str("</button>");
    html
}

// =============================================================================
// QUIET BUTTONS
// =============================================================================

/// Options for a page-owned ("quiet") button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuietButtonOptions {
    /// Always render disabled.
    pub disabled: bool,
    /// Highlight as the current selection.
    pub selected: bool,
    /// Highlight and disable (a selection that cannot be re-chosen).
    pub selected_and_disabled: bool,
    /// Stay enabled even when the page is read-only.
    pub enabled_readonly: bool,
}

impl QuietButtonOptions {
    /// Resolve the `(disabled, style)` pair for a page with the given
    /// read-only flag.
    #[must_use]
    pub fn resolve(self, readonly: bool) -> (bool, &'static str) {
        let disabled = self.disabled || self.selected_and_disabled || (readonly && !self.enabled_readonly);
        let style = if self.selected || self.selected_and_disabled { SELECTED_STYLE } else { "" };
        (disabled, style)
    }
}

/// Build a quiet button for a page with the given read-only flag.
#[must_use]
pub fn quiet_button(readonly: bool, action: &str, label: &str, options: QuietButtonOptions) -> String {
    let (disabled, style) = options.resolve(readonly);
    build_button(action, label, disabled, style)
}

#[cfg(test)]
#[path = "button_test.rs"]
mod tests;
