// Standalone search redirect service used by the landing page search box.

use std::path::PathBuf;

use nimbus_browser_lib::modules::search_server::SearchServer;
use nimbus_browser_lib::settings::Settings;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = std::env::var("NIMBUS_SETTINGS")
        .map(PathBuf::from)
        .map(|path| Settings::load(&path))
        .unwrap_or_default();
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(settings.search_server_port);

    let addr = format!("0.0.0.0:{}", port);
    let server = match SearchServer::bind(&addr, settings.search_engine.clone()) {
        Ok(server) => server,
        Err(e) => {
            log::error!("[Search] Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    log::info!("[Search] Listening on port {} ({:?})", port, settings.search_engine);
    server.serve();
}
