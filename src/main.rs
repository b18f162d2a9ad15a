use quick_draw::gui::QuickDrawApp;
use quick_draw::logging;
use quick_draw::settings::{resolve_settings_path, AppSettings};

use eframe::egui;

fn main() -> anyhow::Result<()> {
    let settings_path = resolve_settings_path()?;
    let settings = AppSettings::load_from_path(&settings_path)?;
    logging::init(settings.debug_logging, settings.log_file.clone());
    tracing::debug!(path = %settings_path.display(), "settings loaded");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 560.0])
            .with_min_inner_size([900.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Quick Draw",
        native_options,
        Box::new(move |cc| match QuickDrawApp::new(cc, &settings) {
            Ok(app) => Box::new(app) as Box<dyn eframe::App>,
            Err(err) => {
                tracing::error!("failed to start quick draw: {err:#}");
                std::process::exit(1);
            }
        }),
    )
    .map_err(|err| anyhow::anyhow!("run quick draw window: {err}"))
}
