use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::BrowserError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum SearchEngine {
    Google,
    DuckDuckGo,
    Bing,
    Brave,
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::Google
    }
}

impl SearchEngine {
    pub const ALL: [SearchEngine; 4] = [
        SearchEngine::Google,
        SearchEngine::DuckDuckGo,
        SearchEngine::Bing,
        SearchEngine::Brave,
    ];

    fn results_prefix(&self) -> &'static str {
        match self {
            Self::Google => "https://www.google.com/search?q=",
            Self::DuckDuckGo => "https://duckduckgo.com/?q=",
            Self::Bing => "https://bing.com/search?q=",
            Self::Brave => "https://search.brave.com/search?q=",
        }
    }

    /// Host + path fragment that identifies a results page, scheme and `www.` agnostic.
    fn results_marker(&self) -> &'static str {
        match self {
            Self::Google => "google.com/search",
            Self::DuckDuckGo => "duckduckgo.com/?q=",
            Self::Bing => "bing.com/search",
            Self::Brave => "search.brave.com/search",
        }
    }

    pub fn query_url(&self, query: &str) -> String {
        let q = urlencoding::encode(query);
        format!("{}{}", self.results_prefix(), q)
    }

    pub fn is_results_url(&self, url: &str) -> bool {
        url.contains(self.results_marker())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TransitionStyle {
    /// Ease-in-out cubic, `min(200 + 50 * steps, 400)` ms.
    #[default]
    Eased,
    /// Critically damped spring, `max(300, 80 * steps)` ms.
    Spring,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuickLink {
    pub label: String,
    pub query: String,
}

impl QuickLink {
    fn new(label: &str, query: &str) -> Self {
        Self {
            label: label.to_string(),
            query: query.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub search_engine: SearchEngine,
    pub https_only: bool,
    /// Page opened by the new-tab button. `None` opens a Home tab instead.
    pub new_tab_url: Option<String>,
    pub transition_style: TransitionStyle,
    pub drag_threshold_px: f64,
    pub title_max_chars: usize,
    pub quick_links: Vec<QuickLink>,
    pub search_server_port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            search_engine: SearchEngine::default(),
            https_only: true,
            new_tab_url: None,
            transition_style: TransitionStyle::default(),
            drag_threshold_px: 5.0,
            title_max_chars: 30,
            quick_links: vec![
                QuickLink::new("News", "latest news"),
                QuickLink::new("Weather", "weather today"),
                QuickLink::new("Maps", "maps"),
                QuickLink::new("Translate", "translate"),
            ],
            search_server_port: 5000,
        }
    }
}

impl Settings {
    pub fn default_scheme(&self) -> &'static str {
        if self.https_only {
            "https"
        } else {
            "http"
        }
    }

    /// Loads settings from `path`, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("[Settings] Failed to parse settings: {}, returning defaults", e);
                Self::default()
            }),
            Err(e) => {
                log::warn!("[Settings] Failed to read file: {}, returning defaults", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), BrowserError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = path.with_extension("tmp");
        let json = serde_json::to_string_pretty(self)?;

        // Write to tmp, then rename, so a crash never leaves a half-written file.
        fs::write(&tmp_path, json)?;
        fs::rename(tmp_path, path)?;
        Ok(())
    }
}
