//! Screen identifiers and UI state shared with rendering.

/// Screen currently shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    /// Operator sign-in.
    Login,
    /// Landing view with the pending count.
    Home,
    /// Pending task list.
    Tasks,
    /// Draft form (free capture or task resolution).
    Capture,
    /// Scan input surface.
    Scanner,
}

/// Question waiting for y/n.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confirm {
    /// Leave the capture form and lose the draft.
    LeaveCapture,
    /// End the session.
    SignOut,
}

/// UI state shared with rendering.
#[derive(Clone, Debug)]
pub struct UiState {
    /// Current screen.
    pub screen: Screen,
    /// Selected row in the task list.
    pub selected: usize,
    /// Recent messages for the info panel.
    pub log: Vec<String>,
    /// Status line text.
    pub status: String,
    /// Error shown in red until the next successful action.
    pub error: Option<String>,
    /// Pending y/n question.
    pub confirm: Option<Confirm>,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            screen: Screen::Login,
            selected: 0,
            log: vec![],
            status: "Ready".into(),
            error: None,
            confirm: None,
        }
    }

    /// Move to `screen` and clear any stale error.
    pub fn go(&mut self, screen: Screen) {
        self.screen = screen;
        self.error = None;
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}
