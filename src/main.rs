mod config;
mod engine;
mod model;
mod ui;

use eframe;

fn main() -> eframe::Result<()> {
    env_logger::init();

    let config = config::load_config();
    log::info!("backend: {}", config.backend_url);

    let options = eframe::NativeOptions::default();

    eframe::run_native(
        "The Mind",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(ui::app::MindApp::new(config)))
        }),
    )
}
