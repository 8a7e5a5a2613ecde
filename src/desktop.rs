// Tauri host: child webviews as content views, commands for the toolbar UI.
// All shell access happens on the main thread; webview callbacks are re-queued there.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use serde_json::json;
use tauri::webview::PageLoadEvent;
use tauri::{
    AppHandle, Emitter, Manager, PhysicalPosition, PhysicalSize, State, WebviewBuilder, WebviewUrl, Window,
};
use tauri_plugin_clipboard_manager::ClipboardExt;
use url::Url;

use crate::error::ContentViewError;
use crate::modules::content_view::{ContentView, ContentViewEvent, ContentViewFactory, NavigationObserver};
use crate::modules::drag::{Point, Rect, StripLayout};
use crate::modules::navigation::display_domain;
use crate::modules::search_server::SearchServer;
use crate::settings::{QuickLink, Settings};
use crate::shell::BrowserShell;
use crate::state::{NavButtons, ShellSnapshot, TabSnapshot};

const TOOLBAR_HEIGHT_LOGICAL: f64 = 56.0 + 36.0;
const CONTENT_LABEL_PREFIX: &str = "content-";

pub struct AppState {
    pub shell: Mutex<BrowserShell>,
}

fn settings_path(app: &AppHandle) -> tauri::Result<PathBuf> {
    let dir = app.path().app_data_dir()?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir.join("settings.json"))
}

fn content_bounds(window: &Window) -> tauri::Result<(PhysicalPosition<i32>, PhysicalSize<u32>)> {
    let size = window.inner_size()?;
    let toolbar = (TOOLBAR_HEIGHT_LOGICAL * window.scale_factor()?) as u32;
    let height = size.height.saturating_sub(toolbar).max(100);
    Ok((PhysicalPosition::new(0, toolbar as i32), PhysicalSize::new(size.width, height)))
}

fn layout_content_views(app: &AppHandle) {
    let Some(window) = app.get_window("main") else {
        return;
    };
    let Ok((position, size)) = content_bounds(&window) else {
        return;
    };
    for (label, webview) in app.webviews() {
        if label.starts_with(CONTENT_LABEL_PREFIX) {
            let _ = webview.set_bounds(tauri::Rect {
                position: tauri::Position::Physical(position),
                size: tauri::Size::Physical(size),
            });
        }
    }
}

/// Queues a view event onto the main thread so it never nests inside a command.
fn dispatch(app: &AppHandle, tab_id: String, event: ContentViewEvent) {
    let handle = app.clone();
    let queued = app.run_on_main_thread(move || {
        let state = handle.state::<AppState>();
        match state.shell.lock() {
            Ok(mut shell) => shell.handle_view_event(&tab_id, event),
            Err(e) => log::error!("[Desktop] Shell lock poisoned: {}", e),
        };
    });
    if let Err(e) = queued {
        log::warn!("[Desktop] Failed to queue view event: {}", e);
    }
}

fn favicon_for(url: &Url) -> Option<String> {
    match url.scheme() {
        "http" | "https" => Some(format!("{}/favicon.ico", url.origin().ascii_serialization())),
        _ => None,
    }
}

// --- content views ---

/// Session history as observed from page loads; webviews don't expose their own.
#[derive(Debug, Default)]
struct NavHistory {
    entries: Vec<String>,
    index: usize,
    pending_step: Option<isize>,
}

impl NavHistory {
    fn record(&mut self, url: &str) {
        if let Some(step) = self.pending_step.take() {
            let target = self.index as isize + step;
            if target >= 0 && self.entries.get(target as usize).map(String::as_str) == Some(url) {
                self.index = target as usize;
                return;
            }
        }
        if self.entries.get(self.index).map(String::as_str) == Some(url) {
            return;
        }
        if !self.entries.is_empty() {
            self.entries.truncate(self.index + 1);
        }
        self.entries.push(url.to_string());
        self.index = self.entries.len() - 1;
    }

    fn can_go_back(&self) -> bool {
        self.index > 0
    }

    fn can_go_forward(&self) -> bool {
        self.index + 1 < self.entries.len()
    }
}

pub struct TauriContentView {
    app: AppHandle,
    label: String,
    history: Arc<Mutex<NavHistory>>,
}

impl TauriContentView {
    fn webview(&self) -> Option<tauri::Webview> {
        self.app.get_webview(&self.label)
    }

    fn traverse(&mut self, step: isize, script: &str) {
        if let Ok(mut history) = self.history.lock() {
            history.pending_step = Some(step);
        }
        if let Some(webview) = self.webview() {
            let _ = webview.eval(script);
        }
    }
}

impl ContentView for TauriContentView {
    fn load_url(&mut self, url: &str) {
        let Some(webview) = self.webview() else {
            return;
        };
        match Url::parse(url) {
            Ok(parsed) => {
                if let Err(e) = webview.navigate(parsed) {
                    log::warn!("[Desktop] Navigation to {} failed: {}", url, e);
                }
            }
            Err(e) => log::warn!("[Desktop] Refusing to load {}: {}", url, e),
        }
    }

    fn current_url(&self) -> Result<String, ContentViewError> {
        let webview = self
            .webview()
            .ok_or_else(|| ContentViewError::Detached(self.label.clone()))?;
        webview
            .url()
            .map(|u| u.to_string())
            .map_err(|_| ContentViewError::UrlUnavailable)
    }

    fn can_go_back(&self) -> bool {
        self.history.lock().map(|h| h.can_go_back()).unwrap_or(false)
    }

    fn can_go_forward(&self) -> bool {
        self.history.lock().map(|h| h.can_go_forward()).unwrap_or(false)
    }

    fn go_back(&mut self) {
        self.traverse(-1, "window.history.back()");
    }

    fn go_forward(&mut self) {
        self.traverse(1, "window.history.forward()");
    }

    // Stacking is left at the default: only the visible child webview is ever shown.

    fn set_visible(&mut self, visible: bool) {
        if let Some(webview) = self.webview() {
            let result = if visible { webview.show() } else { webview.hide() };
            if let Err(e) = result {
                log::warn!("[Desktop] Failed to toggle {}: {}", self.label, e);
            }
        }
    }

    fn close(&mut self) {
        if let Some(webview) = self.webview() {
            let _ = webview.close();
        }
    }
}

pub struct TauriViewFactory {
    app: AppHandle,
}

impl TauriViewFactory {
    fn attach(
        &self,
        label: &str,
        tab_id: &str,
        url: &str,
        history: Arc<Mutex<NavHistory>>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let window = self.app.get_window("main").ok_or(tauri::Error::WindowNotFound)?;
        let (position, size) = content_bounds(&window)?;
        let app = self.app.clone();
        let tab_id = tab_id.to_string();

        let builder = WebviewBuilder::new(label, WebviewUrl::External(Url::parse(url)?)).on_page_load(
            move |_webview, payload| match payload.event() {
                PageLoadEvent::Started => dispatch(&app, tab_id.clone(), ContentViewEvent::NavigationStarted),
                PageLoadEvent::Finished => {
                    let url = payload.url();
                    if let Ok(mut history) = history.lock() {
                        history.record(url.as_str());
                    }
                    dispatch(&app, tab_id.clone(), ContentViewEvent::NavigationFinished);
                    // Webviews report no document title; the host name stands in.
                    dispatch(&app, tab_id.clone(), ContentViewEvent::TitleChanged(display_domain(url.as_str())));
                    dispatch(&app, tab_id.clone(), ContentViewEvent::IconChanged(favicon_for(url)));
                }
            },
        );

        let webview = window.add_child(builder, position, size)?;
        // New views stay hidden until the shell shows them.
        webview.hide()?;
        Ok(())
    }
}

impl ContentViewFactory for TauriViewFactory {
    fn create(&mut self, tab_id: &str, url: &str) -> Box<dyn ContentView> {
        let label = format!("{}{}", CONTENT_LABEL_PREFIX, tab_id);
        let history = Arc::new(Mutex::new(NavHistory::default()));
        if let Err(e) = self.attach(&label, tab_id, url, history.clone()) {
            log::error!("[Desktop] Failed to create webview for {}: {}", tab_id, e);
        }
        Box::new(TauriContentView {
            app: self.app.clone(),
            label,
            history,
        })
    }
}

/// Pushes shell updates to the toolbar webview.
struct EventObserver {
    app: AppHandle,
}

impl NavigationObserver for EventObserver {
    fn tabs_changed(&mut self, tabs: &[TabSnapshot], active_tab_id: Option<&str>) {
        let _ = self.app.emit("update-tabs", json!({ "tabs": tabs, "activeTabId": active_tab_id }));
    }

    fn navigation_synced(&mut self, address_text: &str, nav: NavButtons) {
        let _ = self.app.emit("navigation-sync", json!({ "addressText": address_text, "nav": nav }));
    }
}

pub fn setup(app: &mut tauri::App) -> Result<(), Box<dyn std::error::Error>> {
    let handle = app.handle().clone();
    let path = settings_path(&handle)?;
    let settings = Settings::load(&path);
    if !path.exists() {
        // First run: leave an editable copy of the defaults behind.
        if let Err(e) = settings.save(&path) {
            log::warn!("[Desktop] Could not write {}: {}", path.display(), e);
        }
    }

    let addr = format!("127.0.0.1:{}", settings.search_server_port);
    match SearchServer::bind(&addr, settings.search_engine.clone()) {
        Ok(server) => {
            std::thread::spawn(move || server.serve());
            log::info!("[Desktop] Search service on {}", addr);
        }
        Err(e) => log::warn!("[Desktop] Search service unavailable: {}", e),
    }

    let mut shell = BrowserShell::new(settings, Box::new(TauriViewFactory { app: handle.clone() }));
    shell.set_observer(Box::new(EventObserver { app: handle.clone() }));
    app.manage(AppState {
        shell: Mutex::new(shell),
    });

    if let Some(window) = app.get_window("main") {
        let resize_handle = handle.clone();
        window.on_window_event(move |event| {
            if let tauri::WindowEvent::Resized(_) = event {
                layout_content_views(&resize_handle);
            }
        });
    }
    Ok(())
}

// --- commands ---

fn with_shell<F>(state: &State<'_, AppState>, f: F) -> Result<ShellSnapshot, String>
where
    F: FnOnce(&mut BrowserShell),
{
    let mut shell = state.shell.lock().map_err(|e| e.to_string())?;
    f(&mut *shell);
    Ok(shell.snapshot())
}

#[tauri::command]
pub fn get_state(state: State<'_, AppState>) -> Result<ShellSnapshot, String> {
    with_shell(&state, |_| {})
}

#[tauri::command]
pub fn new_tab(state: State<'_, AppState>) -> Result<ShellSnapshot, String> {
    with_shell(&state, |shell| {
        shell.new_tab(Instant::now());
    })
}

#[tauri::command]
pub fn close_tab(state: State<'_, AppState>, tab_id: String) -> Result<ShellSnapshot, String> {
    with_shell(&state, |shell| shell.close_tab(&tab_id, Instant::now()))
}

#[tauri::command]
pub fn activate_tab(state: State<'_, AppState>, tab_id: String) -> Result<ShellSnapshot, String> {
    with_shell(&state, |shell| shell.activate(&tab_id, Instant::now()))
}

#[tauri::command]
pub fn perform_search(state: State<'_, AppState>, query: String) -> Result<ShellSnapshot, String> {
    with_shell(&state, |shell| shell.perform_search(&query, Instant::now()))
}

#[tauri::command]
pub fn quick_search(state: State<'_, AppState>, query: String) -> Result<ShellSnapshot, String> {
    with_shell(&state, |shell| shell.quick_search(&query, Instant::now()))
}

#[tauri::command]
pub fn submit_address(state: State<'_, AppState>, text: String) -> Result<ShellSnapshot, String> {
    with_shell(&state, |shell| shell.handle_address_bar_input(&text, Instant::now()))
}

#[tauri::command]
pub fn address_focus(state: State<'_, AppState>) -> Result<ShellSnapshot, String> {
    with_shell(&state, |shell| shell.focus_address_bar())
}

#[tauri::command]
pub fn address_blur(state: State<'_, AppState>) -> Result<ShellSnapshot, String> {
    with_shell(&state, |shell| shell.blur_address_bar())
}

#[tauri::command]
pub fn go_back(state: State<'_, AppState>) -> Result<ShellSnapshot, String> {
    with_shell(&state, |shell| shell.go_back())
}

#[tauri::command]
pub fn go_forward(state: State<'_, AppState>) -> Result<ShellSnapshot, String> {
    with_shell(&state, |shell| shell.go_forward())
}

#[tauri::command]
pub fn tab_pointer_down(
    state: State<'_, AppState>,
    tab_id: String,
    pointer: Point,
    tab_rect: Rect,
) -> Result<ShellSnapshot, String> {
    with_shell(&state, |shell| shell.tab_pointer_down(&tab_id, pointer, tab_rect))
}

#[tauri::command]
pub fn pointer_move(
    state: State<'_, AppState>,
    pointer: Point,
    layout: StripLayout,
) -> Result<ShellSnapshot, String> {
    with_shell(&state, |shell| {
        shell.pointer_move(pointer, &layout);
    })
}

#[tauri::command]
pub fn pointer_up(state: State<'_, AppState>) -> Result<ShellSnapshot, String> {
    with_shell(&state, |shell| {
        shell.pointer_up(Instant::now());
    })
}

/// Advances the running transition; the UI keeps calling while `transitionGeneration` matches.
#[tauri::command]
pub fn animation_frame(state: State<'_, AppState>, generation: u64) -> Result<ShellSnapshot, String> {
    with_shell(&state, |shell| {
        shell.animation_frame(generation, Instant::now());
    })
}

#[tauri::command]
pub fn quick_links(state: State<'_, AppState>) -> Result<Vec<QuickLink>, String> {
    let shell = state.shell.lock().map_err(|e| e.to_string())?;
    Ok(shell.settings().quick_links.clone())
}

#[tauri::command]
pub fn tab_icon_failed(state: State<'_, AppState>, tab_id: String) -> Result<ShellSnapshot, String> {
    with_shell(&state, |shell| shell.handle_view_event(&tab_id, ContentViewEvent::IconLoadFailed))
}

#[tauri::command]
pub fn copy_current_url(app: AppHandle, state: State<'_, AppState>) -> Result<(), String> {
    let url = {
        let shell = state.shell.lock().map_err(|e| e.to_string())?;
        shell.full_url().map(str::to_string)
    };
    if let Some(url) = url {
        app.clipboard().write_text(url).map_err(|e| e.to_string())?;
    }
    Ok(())
}
