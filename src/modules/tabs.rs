// Tab registry - ordered tab records, id allocation and order bookkeeping.
// Pure logic: the registry never touches a window, it only drives `ContentView`s.

use std::collections::HashMap;

use crate::modules::content_view::{ContentView, ContentViewFactory};
use crate::modules::navigation::default_title;
use crate::state::{Adjacency, Tab, TabIcon, TabKind, CONTENT_TAB_PREFIX, HOME_TAB_PREFIX};

pub const HOME_TAB_TITLE: &str = "New Tab";

/// What happened when a tab was closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseOutcome {
    pub was_active: bool,
    /// Tab the caller should activate next. Only set when the closed tab was
    /// active and at least one tab remains.
    pub next_active: Option<String>,
}

pub struct TabRegistry {
    tabs: Vec<Tab>,
    active_id: Option<String>,
    tab_count: u64,
    home_tab_count: u64,
    factory: Box<dyn ContentViewFactory>,
}

impl TabRegistry {
    pub fn new(factory: Box<dyn ContentViewFactory>) -> Self {
        Self {
            tabs: Vec::new(),
            active_id: None,
            tab_count: 0,
            home_tab_count: 0,
            factory,
        }
    }

    fn next_content_id(&mut self) -> String {
        self.tab_count += 1;
        format!("{}{}", CONTENT_TAB_PREFIX, self.tab_count)
    }

    /// Appends a Content tab whose view starts loading `url`.
    pub fn create_tab(&mut self, url: &str, title: Option<String>, icon: Option<TabIcon>) -> String {
        let id = self.next_content_id();
        let view = self.factory.create(&id, url);
        let title = title.unwrap_or_else(|| default_title(url).to_string());

        log::info!("[Tabs] Created {} '{}' -> {}", id, title, url);
        self.tabs.push(Tab {
            id: id.clone(),
            kind: TabKind::Content,
            title,
            icon: icon.unwrap_or_default(),
            loading: true,
            view: Some(view),
        });
        self.restack();
        id
    }

    pub fn create_home_tab(&mut self) -> String {
        self.home_tab_count += 1;
        let id = format!("{}{}", HOME_TAB_PREFIX, self.home_tab_count);

        log::info!("[Tabs] Created home tab {}", id);
        self.tabs.push(Tab {
            id: id.clone(),
            kind: TabKind::Home,
            title: HOME_TAB_TITLE.to_string(),
            icon: TabIcon::default(),
            loading: false,
            view: None,
        });
        id
    }

    /// Turns a Home tab into a Content tab in place. The tab keeps its slot but
    /// gets a fresh content id; returns that id, or `None` if `id` is not a Home tab.
    pub fn convert_home_tab(&mut self, id: &str, url: &str, title: Option<String>) -> Option<String> {
        let index = self.index_of(id)?;
        if !self.tabs[index].is_home() {
            return None;
        }

        let new_id = self.next_content_id();
        let view = self.factory.create(&new_id, url);
        let was_active = self.active_id.as_deref() == Some(id);

        let tab = &mut self.tabs[index];
        tab.id = new_id.clone();
        tab.kind = TabKind::Content;
        tab.title = title.unwrap_or_else(|| default_title(url).to_string());
        tab.loading = true;
        tab.view = Some(view);

        if was_active {
            self.active_id = Some(new_id.clone());
        }
        self.restack();

        log::info!("[Tabs] Converted {} into {} -> {}", id, new_id, url);
        Some(new_id)
    }

    /// Removes a tab and closes its view. Unknown ids return `None`.
    pub fn close_tab(&mut self, id: &str) -> Option<CloseOutcome> {
        let index = self.index_of(id)?;
        let mut tab = self.tabs.remove(index);
        if let Some(view) = tab.view.as_mut() {
            view.close();
        }
        drop(tab);
        self.restack();

        let was_active = self.active_id.as_deref() == Some(id);
        let next_active = if was_active {
            self.active_id = None;
            self.tabs.first().map(|t| t.id.clone())
        } else {
            None
        };

        log::info!("[Tabs] Closed {} (was_active: {}, remaining: {})", id, was_active, self.tabs.len());
        Some(CloseOutcome {
            was_active,
            next_active,
        })
    }

    pub fn find(&self, id: &str) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Tab> {
        self.tabs.iter_mut().find(|t| t.id == id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == id)
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn ids(&self) -> Vec<String> {
        self.tabs.iter().map(|t| t.id.clone()).collect()
    }

    pub fn for_each_view(&mut self, mut f: impl FnMut(&str, &mut dyn ContentView)) {
        for tab in self.tabs.iter_mut() {
            if let Some(view) = tab.view.as_mut() {
                f(&tab.id, view.as_mut());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn active(&self) -> Option<&Tab> {
        self.active_id.as_deref().and_then(|id| self.find(id))
    }

    pub fn active_mut(&mut self) -> Option<&mut Tab> {
        let id = self.active_id.clone()?;
        self.find_mut(&id)
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active_id.as_deref().and_then(|id| self.index_of(id))
    }

    /// Marks `id` as the single active tab, or clears the active tab with `None`.
    /// Unknown ids leave the state untouched and return false.
    pub fn set_active(&mut self, id: Option<&str>) -> bool {
        match id {
            Some(id) if self.index_of(id).is_none() => false,
            Some(id) => {
                self.active_id = Some(id.to_string());
                true
            }
            None => {
                self.active_id = None;
                true
            }
        }
    }

    pub fn adjacency(&self, id: &str) -> Adjacency {
        let (Some(active), Some(index)) = (self.active_index(), self.index_of(id)) else {
            return Adjacency::None;
        };
        if index + 1 == active {
            Adjacency::BeforeActive
        } else if index == active + 1 {
            Adjacency::AfterActive
        } else {
            Adjacency::None
        }
    }

    /// Moves a tab to `new_index` (clamped to the last slot). Returns whether the order changed.
    pub fn reorder(&mut self, id: &str, new_index: usize) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let target = new_index.min(self.tabs.len() - 1);
        if target == index {
            return false;
        }
        let tab = self.tabs.remove(index);
        self.tabs.insert(target, tab);
        self.restack();
        log::debug!("[Tabs] Moved {} from {} to {}", id, index, target);
        true
    }

    /// Commits a complete order, e.g. at the end of a drag.
    /// Returns true if the order changed, false otherwise.
    ///
    /// Algorithm:
    /// 1. Map existing tabs by ID for O(1) lookup
    /// 2. Rebuild vector based on new_order (unknown ids are skipped)
    /// 3. Append any missing tabs so a stale order never loses a tab
    pub fn apply_order(&mut self, new_order: &[String]) -> bool {
        if self.tabs.is_empty() || new_order.is_empty() {
            return false;
        }

        let old_order = self.ids();
        let mut position: HashMap<String, usize> = HashMap::new();
        for (i, tab) in self.tabs.iter().enumerate() {
            position.insert(tab.id.clone(), i);
        }

        let mut slots: Vec<Option<Tab>> = self.tabs.drain(..).map(Some).collect();
        let mut reordered = Vec::with_capacity(slots.len());
        for id in new_order {
            if let Some(tab) = position.get(id).and_then(|&i| slots[i].take()) {
                reordered.push(tab);
            }
        }
        reordered.extend(slots.into_iter().flatten());
        self.tabs = reordered;

        let changed = old_order != self.ids();
        if changed {
            self.restack();
            log::info!("[Tabs] Order committed: {:?}", self.ids());
        }
        changed
    }

    /// Keeps every view's stacking index equal to its tab's index.
    fn restack(&mut self) {
        for (i, tab) in self.tabs.iter_mut().enumerate() {
            if let Some(view) = tab.view.as_mut() {
                view.set_stack_index(i);
            }
        }
    }
}

impl Drop for TabRegistry {
    fn drop(&mut self) {
        for tab in self.tabs.iter_mut() {
            if let Some(view) = tab.view.as_mut() {
                view.close();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeFactory, ViewLog};

    fn registry() -> (TabRegistry, ViewLog) {
        let (factory, log) = FakeFactory::new();
        (TabRegistry::new(Box::new(factory)), log)
    }

    fn ids(reg: &TabRegistry) -> Vec<&str> {
        reg.tabs().iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_ids_are_monotonic_and_never_reused() {
        let (mut reg, _) = registry();
        let a = reg.create_tab("https://a.com", None, None);
        let b = reg.create_tab("https://b.com", None, None);
        reg.close_tab(&b);
        let c = reg.create_tab("https://c.com", None, None);
        let h1 = reg.create_home_tab();
        let h2 = reg.create_home_tab();

        assert_eq!(a, "tab-1");
        assert_eq!(c, "tab-3");
        assert_eq!(h1, "home-tab-1");
        assert_eq!(h2, "home-tab-2");
    }

    #[test]
    fn test_default_titles() {
        let (mut reg, _) = registry();
        let search = reg.create_tab("https://www.google.com/search?q=x", None, None);
        let plain = reg.create_tab("https://example.com", None, None);
        let named = reg.create_tab("https://example.com", Some("Example".into()), None);

        assert_eq!(reg.find(&search).unwrap().title, "Search");
        assert_eq!(reg.find(&plain).unwrap().title, "New Tab");
        assert_eq!(reg.find(&named).unwrap().title, "Example");
    }

    #[test]
    fn test_create_tab_allocates_view_bound_to_url() {
        let (mut reg, log) = registry();
        let id = reg.create_tab("https://example.com", None, None);

        let view = log.state(&id);
        assert_eq!(view.history, vec!["https://example.com"]);
        assert_eq!(view.stack_index, Some(0));
        assert!(reg.find(&id).unwrap().view.is_some());
    }

    #[test]
    fn test_home_tab_has_no_view() {
        let (mut reg, log) = registry();
        let id = reg.create_home_tab();
        let tab = reg.find(&id).unwrap();
        assert!(tab.is_home());
        assert!(tab.view.is_none());
        assert!(log.created().is_empty());
    }

    #[test]
    fn test_close_unknown_tab_is_noop() {
        let (mut reg, _) = registry();
        reg.create_tab("https://a.com", None, None);
        assert_eq!(reg.close_tab("tab-99"), None);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_close_active_tab_names_first_remaining() {
        let (mut reg, log) = registry();
        let a = reg.create_tab("https://a.com", None, None);
        let b = reg.create_tab("https://b.com", None, None);
        let c = reg.create_tab("https://c.com", None, None);
        reg.set_active(Some(&b));

        let outcome = reg.close_tab(&b).unwrap();
        assert!(outcome.was_active);
        assert_eq!(outcome.next_active.as_deref(), Some(a.as_str()));
        assert_eq!(reg.active_id(), None);
        assert!(log.state(&b).closed);
        assert_eq!(log.state(&c).stack_index, Some(1));
    }

    #[test]
    fn test_close_last_tab_has_no_successor() {
        let (mut reg, _) = registry();
        let a = reg.create_tab("https://a.com", None, None);
        reg.set_active(Some(&a));
        let outcome = reg.close_tab(&a).unwrap();
        assert!(outcome.was_active);
        assert_eq!(outcome.next_active, None);
        assert!(reg.is_empty());
    }

    #[test]
    fn test_close_inactive_tab_keeps_active() {
        let (mut reg, _) = registry();
        let a = reg.create_tab("https://a.com", None, None);
        let b = reg.create_tab("https://b.com", None, None);
        reg.set_active(Some(&a));

        let outcome = reg.close_tab(&b).unwrap();
        assert!(!outcome.was_active);
        assert_eq!(outcome.next_active, None);
        assert_eq!(reg.active_id(), Some(a.as_str()));
    }

    #[test]
    fn test_create_then_close_round_trip() {
        let (mut reg, _) = registry();
        let a = reg.create_tab("https://a.com", None, None);
        reg.create_home_tab();
        reg.set_active(Some(&a));
        let before = reg.ids();

        let tmp = reg.create_tab("https://tmp.com", None, None);
        reg.close_tab(&tmp);

        assert_eq!(reg.ids(), before);
        assert_eq!(reg.active_id(), Some(a.as_str()));
    }

    #[test]
    fn test_set_active_unknown_id_is_noop() {
        let (mut reg, _) = registry();
        let a = reg.create_tab("https://a.com", None, None);
        reg.set_active(Some(&a));
        assert!(!reg.set_active(Some("tab-42")));
        assert_eq!(reg.active_id(), Some(a.as_str()));
    }

    #[test]
    fn test_convert_home_tab_keeps_slot_and_reassigns_id() {
        let (mut reg, log) = registry();
        let a = reg.create_tab("https://a.com", None, None);
        let home = reg.create_home_tab();
        let c = reg.create_tab("https://c.com", None, None);
        reg.set_active(Some(&home));

        let new_id = reg
            .convert_home_tab(&home, "https://www.google.com/search?q=x", None)
            .unwrap();

        assert_eq!(new_id, "tab-3");
        assert_eq!(ids(&reg), vec![a.as_str(), "tab-3", c.as_str()]);
        assert_eq!(reg.active_id(), Some("tab-3"));
        assert!(reg.find(&home).is_none());
        let tab = reg.find(&new_id).unwrap();
        assert_eq!(tab.kind, TabKind::Content);
        assert_eq!(tab.title, "Search");
        assert_eq!(log.state(&new_id).stack_index, Some(1));
    }

    #[test]
    fn test_convert_is_one_way() {
        let (mut reg, _) = registry();
        let a = reg.create_tab("https://a.com", None, None);
        assert_eq!(reg.convert_home_tab(&a, "https://b.com", None), None);
        assert_eq!(reg.convert_home_tab("home-tab-9", "https://b.com", None), None);
    }

    #[test]
    fn test_adjacency_markers() {
        let (mut reg, _) = registry();
        let a = reg.create_tab("https://a.com", None, None);
        let b = reg.create_tab("https://b.com", None, None);
        let c = reg.create_tab("https://c.com", None, None);
        let d = reg.create_tab("https://d.com", None, None);
        assert_eq!(reg.adjacency(&a), Adjacency::None);

        reg.set_active(Some(&b));
        assert_eq!(reg.adjacency(&a), Adjacency::BeforeActive);
        assert_eq!(reg.adjacency(&b), Adjacency::None);
        assert_eq!(reg.adjacency(&c), Adjacency::AfterActive);
        assert_eq!(reg.adjacency(&d), Adjacency::None);
    }

    #[test]
    fn test_reorder_moves_and_restacks() {
        let (mut reg, log) = registry();
        let a = reg.create_tab("https://a.com", None, None);
        let b = reg.create_tab("https://b.com", None, None);
        let c = reg.create_tab("https://c.com", None, None);

        assert!(reg.reorder(&a, 2));
        assert_eq!(ids(&reg), vec![b.as_str(), c.as_str(), a.as_str()]);
        assert_eq!(log.state(&a).stack_index, Some(2));
        assert_eq!(log.state(&b).stack_index, Some(0));

        // Already last: clamping leaves it in place
        assert!(!reg.reorder(&a, 99));
        assert!(reg.reorder(&b, 99));
        assert_eq!(ids(&reg), vec![c.as_str(), a.as_str(), b.as_str()]);
        assert_eq!(log.state(&b).stack_index, Some(2));
        assert!(!reg.reorder("tab-99", 0));
    }

    #[test]
    fn test_apply_order() {
        let (mut reg, log) = registry();
        let a = reg.create_tab("https://a.com", None, None);
        let b = reg.create_tab("https://b.com", None, None);
        let c = reg.create_tab("https://c.com", None, None);

        let changed = reg.apply_order(&[c.clone(), a.clone(), b.clone()]);
        assert!(changed);
        assert_eq!(ids(&reg), vec![c.as_str(), a.as_str(), b.as_str()]);
        assert_eq!(log.state(&c).stack_index, Some(0));
    }

    #[test]
    fn test_apply_order_with_missing_id() {
        let (mut reg, _) = registry();
        let a = reg.create_tab("https://a.com", None, None);
        let b = reg.create_tab("https://b.com", None, None);
        let c = reg.create_tab("https://c.com", None, None);

        // Only provide 2 IDs (missing b), plus one unknown
        let changed = reg.apply_order(&[c.clone(), "tab-77".to_string(), a.clone()]);
        assert!(changed);
        assert_eq!(ids(&reg), vec![c.as_str(), a.as_str(), b.as_str()]);
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn test_apply_order_no_change() {
        let (mut reg, _) = registry();
        let a = reg.create_tab("https://a.com", None, None);
        let b = reg.create_tab("https://b.com", None, None);
        assert!(!reg.apply_order(&[a.clone(), b.clone()]));
        assert!(!reg.apply_order(&[]));
        assert_eq!(ids(&reg), vec![a.as_str(), b.as_str()]);
    }

    #[test]
    fn test_drop_closes_views() {
        let (mut reg, log) = registry();
        let a = reg.create_tab("https://a.com", None, None);
        drop(reg);
        assert!(log.state(&a).closed);
    }
}
