use eframe::egui;
use quickshop_dashboard::app::QuickShopApp;
use quickshop_dashboard::config::DashboardConfig;

fn main() -> eframe::Result {
    env_logger::init();

    let config = match DashboardConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e:#}; falling back to defaults");
            DashboardConfig::default()
        }
    };
    log::info!("starting with {config:?}");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size([700.0, 450.0]),
        ..Default::default()
    };

    eframe::run_native(
        "QuickShop Analytics Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(QuickShopApp::new(config)))),
    )
}
