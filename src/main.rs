mod app;
mod color;
mod config;
mod data;
mod reports;
mod state;
mod ui;

use app::TrialPulseApp;
use config::DashboardConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = match DashboardConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {e:#}");
            eprintln!("trialpulse: {e:#}");
            std::process::exit(2);
        }
    };
    log::info!("Reading dashboard inputs from {}", config.root.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "TrialPulse – Clinical Trial Analytics",
        options,
        Box::new(move |cc| {
            // Install image loaders so egui can render the png figures.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(TrialPulseApp::new(config)))
        }),
    )
}
