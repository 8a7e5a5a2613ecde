// Contract between the shell and the embedded browsing surface.
// The shell never looks inside a view; it only calls these primitives and reacts to events.

use serde::{Deserialize, Serialize};

use crate::error::ContentViewError;
use crate::state::{NavButtons, TabSnapshot};

/// An embedded web view owned by a Content tab.
pub trait ContentView: Send {
    fn load_url(&mut self, url: &str);

    fn current_url(&self) -> Result<String, ContentViewError>;

    fn can_go_back(&self) -> bool;

    fn can_go_forward(&self) -> bool;

    fn go_back(&mut self);

    fn go_forward(&mut self);

    /// Shows or hides the view. Exactly one view is visible at a time.
    fn set_visible(&mut self, _visible: bool) {}

    /// Stacking position, kept equal to the owning tab's index in the strip.
    /// Hosts that only ever show one view at a time may ignore it.
    fn set_stack_index(&mut self, _index: usize) {}

    /// Called once, right before the owning tab drops the view.
    fn close(&mut self) {}
}

/// Allocates a view for a newly created (or converted) tab.
pub trait ContentViewFactory: Send {
    fn create(&mut self, tab_id: &str, url: &str) -> Box<dyn ContentView>;
}

/// Events a view emits while it navigates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum ContentViewEvent {
    NavigationStarted,
    NavigationFinished,
    InPageNavigation,
    TitleChanged(String),
    /// `None` means the page declared no favicon.
    IconChanged(Option<String>),
    IconLoadFailed,
}

/// Optional listener for state the shell pushes outward.
pub trait NavigationObserver: Send {
    fn tabs_changed(&mut self, _tabs: &[TabSnapshot], _active_tab_id: Option<&str>) {}

    fn navigation_synced(&mut self, _address_text: &str, _nav: NavButtons) {}
}
