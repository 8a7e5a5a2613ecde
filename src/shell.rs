// Application shell: owns every piece of browser state for the lifetime of the process
// and turns user input into registry, animator and drag-controller calls.

use std::time::Instant;

use crate::modules::content_view::{ContentViewEvent, ContentViewFactory, NavigationObserver};
use crate::modules::drag::{DragController, DragRelease, DragUpdate, Point, Rect, StripLayout};
use crate::modules::navigation::{classify_input, nav_buttons, truncate_title, AddressBar, AddressInput};
use crate::modules::tabs::TabRegistry;
use crate::modules::transition::{Animator, FrameOutcome, TransitionFrame};
use crate::settings::Settings;
use crate::state::{DragSnapshot, NavButtons, ShellSnapshot, Surface, Tab, TabIcon, TabKind, TabSnapshot};

pub struct BrowserShell {
    settings: Settings,
    registry: TabRegistry,
    animator: Animator,
    drag: DragController,
    address: AddressBar,
    nav: NavButtons,
    /// Last rendered frame of the running transition.
    frame: Option<TransitionFrame>,
    observer: Option<Box<dyn NavigationObserver>>,
}

impl BrowserShell {
    pub fn new(settings: Settings, factory: Box<dyn ContentViewFactory>) -> Self {
        Self {
            animator: Animator::new(settings.transition_style),
            drag: DragController::new(settings.drag_threshold_px),
            registry: TabRegistry::new(factory),
            address: AddressBar::default(),
            nav: NavButtons::default(),
            frame: None,
            observer: None,
            settings,
        }
    }

    pub fn set_observer(&mut self, observer: Box<dyn NavigationObserver>) {
        self.observer = Some(observer);
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &TabRegistry {
        &self.registry
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn address_text(&self) -> &str {
        self.address.text()
    }

    pub fn full_url(&self) -> Option<&str> {
        self.address.full_url()
    }

    pub fn nav_buttons(&self) -> NavButtons {
        self.nav
    }

    pub fn surface(&self) -> Surface {
        match self.registry.active() {
            Some(tab) if tab.kind == TabKind::Content => Surface::Browser,
            _ => Surface::Landing,
        }
    }

    // --- tab lifecycle ---

    /// Creates a Content tab for `url` and activates it.
    pub fn open_tab(&mut self, url: &str, title: Option<String>, now: Instant) -> String {
        let id = self.registry.create_tab(url, title, None);
        self.activate(&id, now);
        id
    }

    /// New-tab button: the configured page, or a Home tab when none is set.
    pub fn new_tab(&mut self, now: Instant) -> String {
        match self.settings.new_tab_url.clone() {
            Some(url) => self.open_tab(&url, None, now),
            None => {
                let id = self.registry.create_home_tab();
                self.activate(&id, now);
                id
            }
        }
    }

    pub fn close_tab(&mut self, tab_id: &str, now: Instant) {
        self.drag.forget(tab_id);
        let Some(outcome) = self.registry.close_tab(tab_id) else {
            return;
        };

        if self.animator.current().map(|t| t.target_id.as_str()) == Some(tab_id) {
            self.abort_transition();
        }

        if outcome.was_active {
            match outcome.next_active {
                Some(next) => self.activate(&next, now),
                None => self.show_home(),
            }
        } else {
            self.notify_tabs();
        }
    }

    pub fn reorder_tab(&mut self, tab_id: &str, new_index: usize) {
        if self.registry.reorder(tab_id, new_index) {
            self.notify_tabs();
        }
    }

    // --- activation ---

    /// Makes `tab_id` the active tab, animating when switching between two content tabs.
    pub fn activate(&mut self, tab_id: &str, now: Instant) {
        let Some(target_index) = self.registry.index_of(tab_id) else {
            return;
        };
        let target_is_home = self.registry.tabs()[target_index].is_home();

        let current = self
            .registry
            .active()
            .map(|tab| (tab.id.clone(), tab.is_home()));
        let animate = match &current {
            Some((current_id, current_is_home)) => current_id != tab_id && !current_is_home && !target_is_home,
            None => false,
        };

        if !animate {
            self.animator.cancel();
            self.frame = None;
            self.commit_active(tab_id);
            return;
        }

        // Mid-flight: continue from the tab currently on screen
        let in_flight = self
            .frame
            .as_ref()
            .filter(|_| self.animator.is_running())
            .map(|f| f.intermediate_index.min(self.registry.len().saturating_sub(1)));
        let Some(from_index) = in_flight.or_else(|| self.registry.active_index()) else {
            return;
        };
        let generation = self.animator.begin(from_index, target_index, tab_id, now);
        self.frame = None;
        log::debug!("[Shell] Transition #{} toward {}", generation, tab_id);
    }

    /// Generation of the running transition, if any; the frame loop passes it back
    /// to [`BrowserShell::animation_frame`].
    pub fn transition_generation(&self) -> Option<u64> {
        self.animator.current().map(|t| t.generation)
    }

    /// Advances the transition tagged `generation`. Stale generations do nothing.
    pub fn animation_frame(&mut self, generation: u64, now: Instant) -> FrameOutcome {
        if let Some(transition) = self.animator.current() {
            if transition.generation == generation && self.registry.find(&transition.target_id).is_none() {
                self.abort_transition();
                return FrameOutcome::Stale;
            }
        }

        let outcome = self.animator.step(generation, now, self.registry.len());
        match &outcome {
            FrameOutcome::Stale => {}
            FrameOutcome::Frame(frame) => {
                let visible = self.registry.tabs().get(frame.intermediate_index).map(|t| t.id.clone());
                self.show_only_view(visible.as_deref());
                self.frame = Some(frame.clone());
                self.notify_tabs();
            }
            FrameOutcome::Completed { target_id } => {
                self.frame = None;
                self.commit_active(target_id);
            }
        }
        outcome
    }

    fn abort_transition(&mut self) {
        self.animator.cancel();
        self.frame = None;
        let active = self.registry.active_id().map(str::to_string);
        self.show_only_view(active.as_deref());
        self.notify_tabs();
    }

    fn commit_active(&mut self, tab_id: &str) {
        if !self.registry.set_active(Some(tab_id)) {
            return;
        }
        let is_home = self.registry.find(tab_id).map(|t| t.is_home()).unwrap_or(false);
        if is_home {
            // Landing surface: no view, empty address field
            self.show_only_view(None);
            self.address.clear();
            self.nav = NavButtons::default();
            self.notify_navigation();
        } else {
            self.show_only_view(Some(tab_id));
            self.sync_navigation();
        }
        log::debug!("[Shell] Active tab: {}", tab_id);
        self.notify_tabs();
    }

    /// No active tab: back to the landing surface.
    fn show_home(&mut self) {
        self.animator.cancel();
        self.frame = None;
        self.registry.set_active(None);
        self.show_only_view(None);
        self.address.clear();
        self.nav = NavButtons::default();
        self.notify_navigation();
        self.notify_tabs();
    }

    fn show_only_view(&mut self, tab_id: Option<&str>) {
        self.registry
            .for_each_view(|id, view| view.set_visible(Some(id) == tab_id));
    }

    // --- search dispatch ---

    /// Searches for `query` in the active tab, converting a Home tab or opening a new tab as needed.
    pub fn perform_search(&mut self, query: &str, now: Instant) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        let url = self.settings.search_engine.query_url(query);
        let title = format!("Search: {}", query);
        log::info!("[Shell] Search '{}'", query);

        let active = self.registry.active().map(|t| (t.id.clone(), t.kind));
        match active {
            Some((id, TabKind::Home)) => {
                if let Some(new_id) = self.registry.convert_home_tab(&id, &url, Some(title)) {
                    self.commit_active(&new_id);
                }
            }
            Some((_, TabKind::Content)) => {
                if let Some(tab) = self.registry.active_mut() {
                    tab.loading = true;
                    if let Some(view) = tab.view.as_mut() {
                        view.load_url(&url);
                    }
                }
                self.sync_navigation();
                self.notify_tabs();
            }
            None => {
                self.open_tab(&url, Some(title), now);
            }
        }
    }

    /// Landing-page shortcut.
    pub fn quick_search(&mut self, query: &str, now: Instant) {
        self.perform_search(query, now);
    }

    /// Enter pressed in the address bar.
    pub fn handle_address_bar_input(&mut self, text: &str, now: Instant) {
        let input = classify_input(text, &self.settings);
        if input == AddressInput::Empty {
            return;
        }
        self.address.edit("");
        match input {
            AddressInput::Empty => {}
            AddressInput::Search(query) => self.perform_search(&query, now),
            AddressInput::Url(url) => self.navigate_new(&url, now),
        }
    }

    fn navigate_new(&mut self, url: &str, now: Instant) {
        log::info!("[Shell] Navigate to {}", url);
        let active_home = self
            .registry
            .active()
            .filter(|t| t.is_home())
            .map(|t| t.id.clone());
        match active_home {
            Some(home_id) => {
                if let Some(new_id) = self.registry.convert_home_tab(&home_id, url, None) {
                    self.commit_active(&new_id);
                }
            }
            None => {
                self.open_tab(url, None, now);
            }
        }
    }

    // --- address bar & navigation ---

    pub fn focus_address_bar(&mut self) {
        self.address.focus();
    }

    pub fn blur_address_bar(&mut self) {
        self.address.blur();
    }

    pub fn edit_address_bar(&mut self, text: &str) {
        self.address.edit(text);
    }

    pub fn go_back(&mut self) {
        if let Some(view) = self.registry.active_mut().and_then(|t| t.view.as_mut()) {
            if view.can_go_back() {
                view.go_back();
            }
        }
        self.sync_navigation();
    }

    pub fn go_forward(&mut self) {
        if let Some(view) = self.registry.active_mut().and_then(|t| t.view.as_mut()) {
            if view.can_go_forward() {
                view.go_forward();
            }
        }
        self.sync_navigation();
    }

    fn sync_navigation(&mut self) {
        let view = self.registry.active().and_then(|t| t.view.as_deref());
        if let Some(view) = view {
            self.address.sync(view);
        }
        self.nav = nav_buttons(view);
        self.notify_navigation();
    }

    /// Routes an event from a tab's content view.
    pub fn handle_view_event(&mut self, tab_id: &str, event: ContentViewEvent) {
        let max_chars = self.settings.title_max_chars;
        let is_active = self.registry.active_id() == Some(tab_id);
        let Some(tab) = self.registry.find_mut(tab_id) else {
            return;
        };
        if tab.is_home() {
            return;
        }

        match event {
            ContentViewEvent::NavigationStarted => {
                tab.loading = true;
                if is_active {
                    let view = self.registry.active().and_then(|t| t.view.as_deref());
                    self.nav = nav_buttons(view);
                    self.notify_navigation();
                }
            }
            ContentViewEvent::NavigationFinished => {
                tab.loading = false;
                if is_active {
                    self.sync_navigation();
                }
            }
            ContentViewEvent::InPageNavigation => {
                if is_active {
                    self.sync_navigation();
                }
            }
            ContentViewEvent::TitleChanged(title) => {
                if !title.trim().is_empty() {
                    tab.title = truncate_title(title.trim(), max_chars);
                }
            }
            ContentViewEvent::IconChanged(Some(uri)) if !uri.is_empty() => {
                tab.icon = TabIcon::Uri(uri);
            }
            ContentViewEvent::IconChanged(_) | ContentViewEvent::IconLoadFailed => {
                tab.icon = TabIcon::default();
            }
        }
        self.notify_tabs();
    }

    // --- drag reorder ---

    pub fn tab_pointer_down(&mut self, tab_id: &str, pointer: Point, tab_rect: Rect) {
        self.drag.press(tab_id, pointer, self.registry.ids(), tab_rect);
    }

    pub fn pointer_move(&mut self, pointer: Point, layout: &StripLayout) -> DragUpdate {
        let update = self.drag.pointer_move(pointer, layout);
        if matches!(update, DragUpdate::Dragging { .. } | DragUpdate::Cancelled) {
            self.notify_tabs();
        }
        update
    }

    /// Ends the gesture: commits a drag, or treats a short press as a click.
    pub fn pointer_up(&mut self, now: Instant) -> DragRelease {
        let release = self.drag.release();
        match &release {
            DragRelease::None => {}
            DragRelease::Click(tab_id) => self.activate(tab_id, now),
            DragRelease::Reorder(order) => {
                self.registry.apply_order(order);
                self.notify_tabs();
            }
        }
        release
    }

    // --- projection ---

    /// Tabs in strip order. While a drag is live that is the drag's working order.
    pub fn tab_snapshots(&self) -> Vec<TabSnapshot> {
        let active = self.registry.active_id();
        let mut order: Vec<&Tab> = match self.drag.working_order() {
            Some(working) => working.iter().filter_map(|id| self.registry.find(id)).collect(),
            None => self.registry.tabs().iter().collect(),
        };
        for tab in self.registry.tabs() {
            if !order.iter().any(|t| t.id == tab.id) {
                order.push(tab);
            }
        }

        order
            .into_iter()
            .map(|tab| TabSnapshot {
                id: tab.id.clone(),
                kind: tab.kind,
                title: tab.title.clone(),
                icon: tab.icon.clone(),
                loading: tab.loading,
                active: Some(tab.id.as_str()) == active,
                adjacency: self.registry.adjacency(&tab.id),
                visual: self
                    .frame
                    .as_ref()
                    .zip(self.registry.index_of(&tab.id))
                    .and_then(|(f, i)| f.visuals.get(i).copied()),
            })
            .collect()
    }

    pub fn snapshot(&self) -> ShellSnapshot {
        let visible_tab_id = match &self.frame {
            Some(frame) => self.registry.tabs().get(frame.intermediate_index).map(|t| t.id.clone()),
            None => self.registry.active_id().map(str::to_string),
        };
        let drag = match (self.drag.dragged_tab(), self.drag.placeholder_index(), self.drag.ghost()) {
            (Some(tab_id), Some(placeholder_index), Some(ghost)) => Some(DragSnapshot {
                tab_id: tab_id.to_string(),
                placeholder_index,
                ghost,
                visuals: self.drag.visuals().to_vec(),
            }),
            _ => None,
        };
        ShellSnapshot {
            surface: self.surface(),
            tabs: self.tab_snapshots(),
            active_tab_id: self.registry.active_id().map(str::to_string),
            visible_tab_id,
            address_text: self.address.text().to_string(),
            nav: self.nav,
            drag,
            transition_generation: self.transition_generation(),
        }
    }

    fn notify_tabs(&mut self) {
        if self.observer.is_none() {
            return;
        }
        let tabs = self.tab_snapshots();
        let active = self.registry.active_id().map(str::to_string);
        if let Some(observer) = self.observer.as_mut() {
            observer.tabs_changed(&tabs, active.as_deref());
        }
    }

    fn notify_navigation(&mut self) {
        if let Some(observer) = self.observer.as_mut() {
            observer.navigation_synced(self.address.text(), self.nav);
        }
    }
}
