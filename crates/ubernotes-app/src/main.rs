//! Main application entry point.

fn main() {
    env_logger::init();
    log::info!("Starting UberNotes");

    if let Err(e) = ubernotes_app::App::run(ubernotes_app::AppConfig::default()) {
        log::error!("UberNotes failed: {}", e);
        std::process::exit(1);
    }
}
