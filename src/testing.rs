// In-memory collaborators for unit tests.

use std::sync::{Arc, Mutex};

use crate::error::ContentViewError;
use crate::modules::content_view::{ContentView, ContentViewFactory, NavigationObserver};
use crate::state::{NavButtons, TabSnapshot};

#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub history: Vec<String>,
    pub position: usize,
    pub visible: bool,
    pub stack_index: Option<usize>,
    pub closed: bool,
    pub fail_url: bool,
}

pub struct FakeView {
    state: Arc<Mutex<ViewState>>,
}

impl ContentView for FakeView {
    fn load_url(&mut self, url: &str) {
        let mut s = self.state.lock().unwrap();
        if !s.history.is_empty() {
            let keep = s.position + 1;
            s.history.truncate(keep);
        }
        s.history.push(url.to_string());
        s.position = s.history.len() - 1;
    }

    fn current_url(&self) -> Result<String, ContentViewError> {
        let s = self.state.lock().unwrap();
        if s.fail_url {
            return Err(ContentViewError::UrlUnavailable);
        }
        s.history
            .get(s.position)
            .cloned()
            .ok_or(ContentViewError::UrlUnavailable)
    }

    fn can_go_back(&self) -> bool {
        self.state.lock().unwrap().position > 0
    }

    fn can_go_forward(&self) -> bool {
        let s = self.state.lock().unwrap();
        s.position + 1 < s.history.len()
    }

    fn go_back(&mut self) {
        let mut s = self.state.lock().unwrap();
        if s.position > 0 {
            s.position -= 1;
        }
    }

    fn go_forward(&mut self) {
        let mut s = self.state.lock().unwrap();
        if s.position + 1 < s.history.len() {
            s.position += 1;
        }
    }

    fn set_visible(&mut self, visible: bool) {
        self.state.lock().unwrap().visible = visible;
    }

    fn set_stack_index(&mut self, index: usize) {
        self.state.lock().unwrap().stack_index = Some(index);
    }

    fn close(&mut self) {
        self.state.lock().unwrap().closed = true;
    }
}

type ViewEntries = Arc<Mutex<Vec<(String, Arc<Mutex<ViewState>>)>>>;

/// Read side of [`FakeFactory`]: every view it ever created, by tab id.
#[derive(Clone, Default)]
pub struct ViewLog {
    entries: ViewEntries,
}

impl ViewLog {
    pub fn state(&self, tab_id: &str) -> ViewState {
        self.handle(tab_id).lock().unwrap().clone()
    }

    pub fn handle(&self, tab_id: &str) -> Arc<Mutex<ViewState>> {
        let entries = self.entries.lock().unwrap();
        entries
            .iter()
            .rev()
            .find(|(id, _)| id == tab_id)
            .map(|(_, s)| s.clone())
            .unwrap_or_else(|| panic!("no view created for {}", tab_id))
    }

    pub fn created(&self) -> Vec<String> {
        self.entries.lock().unwrap().iter().map(|(id, _)| id.clone()).collect()
    }
}

#[derive(Default)]
pub struct FakeFactory {
    log: ViewLog,
}

impl FakeFactory {
    pub fn new() -> (Self, ViewLog) {
        let factory = Self::default();
        let log = factory.log.clone();
        (factory, log)
    }
}

impl ContentViewFactory for FakeFactory {
    fn create(&mut self, tab_id: &str, url: &str) -> Box<dyn ContentView> {
        let state = Arc::new(Mutex::new(ViewState::default()));
        self.log
            .entries
            .lock()
            .unwrap()
            .push((tab_id.to_string(), state.clone()));
        let mut view = FakeView { state };
        view.load_url(url);
        Box::new(view)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObserverLog {
    pub tab_updates: Vec<(Vec<String>, Option<String>)>,
    pub nav_updates: Vec<(String, NavButtons)>,
}

pub struct RecordingObserver {
    log: Arc<Mutex<ObserverLog>>,
}

impl RecordingObserver {
    pub fn new() -> (Self, Arc<Mutex<ObserverLog>>) {
        let log = Arc::new(Mutex::new(ObserverLog::default()));
        (Self { log: log.clone() }, log)
    }
}

impl NavigationObserver for RecordingObserver {
    fn tabs_changed(&mut self, tabs: &[TabSnapshot], active_tab_id: Option<&str>) {
        let ids = tabs.iter().map(|t| t.id.clone()).collect();
        self.log
            .lock()
            .unwrap()
            .tab_updates
            .push((ids, active_tab_id.map(str::to_string)));
    }

    fn navigation_synced(&mut self, address_text: &str, nav: NavButtons) {
        self.log
            .lock()
            .unwrap()
            .nav_updates
            .push((address_text.to_string(), nav));
    }
}
