//! Sidebar visibility state for the mobile/desktop split.
//!
//! A single boolean, toggled by the menu control and cleared by the
//! interactions that dismiss an overlay sidebar. Not persisted; reset to
//! closed on every identity change.

#[derive(Debug, Default)]
pub struct SidebarState {
    open: bool,
}

impl SidebarState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Flip open/closed and return the new state.
    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// A pointer interaction landed somewhere on the page. Closes the
    /// sidebar unless the interaction was inside the sidebar region or on
    /// the menu control itself.
    pub fn on_pointer(&mut self, within_sidebar: bool, within_menu_control: bool) {
        if !within_sidebar && !within_menu_control {
            self.open = false;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
