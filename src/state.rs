// Shared state structs to avoid circular dependencies.
// The registry owns `Tab`; everything the front-end sees is one of the snapshot types.

use serde::{Deserialize, Serialize};

use crate::modules::content_view::ContentView;
use crate::modules::drag::{DragVisuals, Rect};
use crate::modules::transition::TabVisual;

pub const HOME_TAB_PREFIX: &str = "home-tab-";
pub const CONTENT_TAB_PREFIX: &str = "tab-";
pub const DEFAULT_GLYPH: &str = "\u{1F310}";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TabKind {
    Home,
    Content,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum TabIcon {
    Glyph(String),
    Uri(String),
}

impl Default for TabIcon {
    fn default() -> Self {
        Self::Glyph(DEFAULT_GLYPH.to_string())
    }
}

/// Marker on the neighbours of the active tab, used to hide the separator seam.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Adjacency {
    None,
    BeforeActive,
    AfterActive,
}

pub struct Tab {
    pub id: String,
    pub kind: TabKind,
    pub title: String,
    pub icon: TabIcon,
    pub loading: bool,
    /// `None` for Home tabs, always `Some` for Content tabs.
    pub view: Option<Box<dyn ContentView>>,
}

impl Tab {
    pub fn is_home(&self) -> bool {
        self.kind == TabKind::Home
    }
}

impl std::fmt::Debug for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tab")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("title", &self.title)
            .field("icon", &self.icon)
            .field("loading", &self.loading)
            .field("has_view", &self.view.is_some())
            .finish()
    }
}

/// Which of the two top-level surfaces is visible.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Surface {
    Landing,
    Browser,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct NavButtons {
    pub back_enabled: bool,
    pub forward_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TabSnapshot {
    pub id: String,
    pub kind: TabKind,
    pub title: String,
    pub icon: TabIcon,
    pub loading: bool,
    pub active: bool,
    pub adjacency: Adjacency,
    /// Transient transition override, `None` when no transition is running.
    pub visual: Option<TabVisual>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DragSnapshot {
    pub tab_id: String,
    pub placeholder_index: usize,
    pub ghost: Rect,
    pub visuals: DragVisuals,
}

/// Everything the rendering layer needs to draw the shell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShellSnapshot {
    pub surface: Surface,
    pub tabs: Vec<TabSnapshot>,
    pub active_tab_id: Option<String>,
    /// Tab whose view is shown mid-transition; equals the active tab otherwise.
    pub visible_tab_id: Option<String>,
    pub address_text: String,
    pub nav: NavButtons,
    pub drag: Option<DragSnapshot>,
    pub transition_generation: Option<u64>,
}
