// Nimbus Browser Library Entry Point
// This file exposes all modules so they can be imported by the binaries
// and tested independently.

pub mod error;
pub mod settings;
pub mod shell;

// Shared state
pub mod state;

// Pure logic modules (no Tauri imports)
pub mod modules;

// Tauri host
#[cfg(feature = "desktop")]
pub mod desktop;

#[cfg(test)]
pub(crate) mod testing;

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(
            tauri_plugin_log::Builder::default()
                .level(if cfg!(debug_assertions) {
                    log::LevelFilter::Debug
                } else {
                    log::LevelFilter::Info
                })
                .build(),
        )
        .plugin(tauri_plugin_clipboard_manager::init())
        .setup(|app| {
            desktop::setup(app)?;
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            desktop::get_state,
            desktop::new_tab,
            desktop::close_tab,
            desktop::activate_tab,
            desktop::perform_search,
            desktop::quick_search,
            desktop::quick_links,
            desktop::submit_address,
            desktop::address_focus,
            desktop::address_blur,
            desktop::go_back,
            desktop::go_forward,
            desktop::tab_pointer_down,
            desktop::pointer_move,
            desktop::pointer_up,
            desktop::animation_frame,
            desktop::tab_icon_failed,
            desktop::copy_current_url
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
