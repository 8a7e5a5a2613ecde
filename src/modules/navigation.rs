// Pure navigation logic - no Tauri imports allowed.
// Address-bar input classification plus the address/back/forward projection of the active view.

use url::Url;

use crate::modules::content_view::ContentView;
use crate::settings::{SearchEngine, Settings};
use crate::state::NavButtons;

pub const SEARCH_TITLE: &str = "Search";
pub const NEW_TAB_TITLE: &str = "New Tab";

/// Schemes accepted without a `//` authority part.
const OPAQUE_SCHEMES: [&str; 3] = ["about", "data", "file"];

/// What the user meant by a line typed into the address bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressInput {
    Empty,
    Url(String),
    Search(String),
}

/// Classifies address-bar input.
///
/// PRIVACY NOTICE:
/// This function performs purely local string manipulation and heuristics.
/// It does NOT perform any DNS resolution, reachability check or prefetch.
pub fn classify_input(input: &str, settings: &Settings) -> AddressInput {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return AddressInput::Empty;
    }

    // 1. Explicit scheme: kept verbatim
    if has_explicit_scheme(trimmed) {
        return AddressInput::Url(trimmed.to_string());
    }

    // 2. Heuristic: Dot implies domain
    // (Exclude whitespace which implies search)
    if trimmed.contains('.') && !trimmed.contains(char::is_whitespace) {
        return AddressInput::Url(format!("{}://{}", settings.default_scheme(), trimmed));
    }

    // 3. Fallback to search
    AddressInput::Search(trimmed.to_string())
}

fn has_explicit_scheme(input: &str) -> bool {
    if let Some((scheme, _)) = input.split_once("://") {
        return !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.');
    }
    // "google.com" must not be read as scheme "google", so only known opaque schemes count here
    match Url::parse(input) {
        Ok(u) => OPAQUE_SCHEMES.contains(&u.scheme()),
        Err(_) => false,
    }
}

/// Label for a tab created without an explicit title.
pub fn default_title(url: &str) -> &'static str {
    if SearchEngine::ALL.iter().any(|engine| engine.is_results_url(url)) {
        SEARCH_TITLE
    } else {
        NEW_TAB_TITLE
    }
}

/// Shortens a page title to `max_chars` characters, marking the cut with `...`.
pub fn truncate_title(title: &str, max_chars: usize) -> String {
    if title.chars().count() > max_chars {
        let cut: String = title.chars().take(max_chars).collect();
        format!("{}...", cut)
    } else {
        title.to_string()
    }
}

/// Host part of `url` with a leading `www.` removed; the input itself if it does not parse.
pub fn display_domain(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => host.strip_prefix("www.").unwrap_or(host).to_string(),
            None => url.to_string(),
        },
        Err(_) => url.to_string(),
    }
}

/// Address field state. Shows the domain while blurred, the full URL while focused.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressBar {
    text: String,
    full_url: Option<String>,
    focused: bool,
}

impl AddressBar {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn full_url(&self) -> Option<&str> {
        self.full_url.as_deref()
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Reflects the view's current URL. Retrieval failures and `about:blank`
    /// leave the field as it was.
    pub fn sync(&mut self, view: &dyn ContentView) {
        let url = match view.current_url() {
            Ok(url) => url,
            Err(e) => {
                log::warn!("[Navigation] Could not read view url: {}", e);
                return;
            }
        };
        if url.is_empty() || url == "about:blank" {
            return;
        }
        self.text = if self.focused {
            url.clone()
        } else {
            display_domain(&url)
        };
        self.full_url = Some(url);
    }

    pub fn focus(&mut self) {
        self.focused = true;
        if let Some(url) = &self.full_url {
            self.text = url.clone();
        }
    }

    pub fn blur(&mut self) {
        self.focused = false;
        if let Some(url) = &self.full_url {
            self.text = display_domain(url);
        }
    }

    /// User typing. Only the visible text changes.
    pub fn edit(&mut self, text: &str) {
        self.text = text.to_string();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.full_url = None;
    }
}

pub fn nav_buttons(view: Option<&dyn ContentView>) -> NavButtons {
    match view {
        Some(view) => NavButtons {
            back_enabled: view.can_go_back(),
            forward_enabled: view.can_go_forward(),
        },
        None => NavButtons::default(),
    }
}
