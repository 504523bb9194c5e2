mod app;
mod editor;
mod history;
mod layers;
mod model;
mod projection;
mod scene;
mod tools;
mod viewport;

use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title("Isometric System Framing Studio"),
        ..Default::default()
    };
    eframe::run_native(
        "Isometric System Framing Studio",
        native_options,
        Box::new(|cc| Ok(Box::new(app::StudioApp::new(cc)))),
    )
}
