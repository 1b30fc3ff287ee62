pub mod game;
pub mod gamepad;
pub mod input;
pub mod settings;
pub mod ui;

use crate::gamepad::CollectorHandle;
use crate::input::SourceArbitrator;
use crate::settings::SettingsPortal;
use crate::ui::PixelpadApp;
use color_eyre::{eyre::eyre, Result};
use eframe::egui;
use tokio::sync::mpsc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    info!("Loading settings");
    let loaded = settings::load_or_create().await?;
    let portal = SettingsPortal::new(loaded);

    // One channel carries every raw input event toward the frame loop
    let (event_tx, event_rx) = mpsc::channel(1000);

    let mut arbitrator = SourceArbitrator::new(portal.pad(), event_tx.clone());

    // A missing or broken gamepad backend leaves the virtual pad as the
    // only source; the game still runs. Controllers already plugged in
    // are seeded before the first setup decision.
    match CollectorHandle::spawn(None, event_tx.clone()) {
        Ok(handle) => {
            info!("Gamepad collector running");
            arbitrator.seed_connected(handle.initial_pads());
        }
        Err(e) => warn!("Continuing without physical controllers: {}", e),
    }

    info!("Starting UI");
    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = egui::ViewportBuilder::default()
        .with_inner_size(egui::vec2(800.0, 600.0))
        .with_title("Pixelpad");

    eframe::run_native(
        "Pixelpad",
        native_options,
        Box::new(move |cc| Ok(Box::new(PixelpadApp::new(cc, event_rx, arbitrator, portal)))),
    )
    .map_err(|e| eyre!("UI terminated with error: {}", e))?;

    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
