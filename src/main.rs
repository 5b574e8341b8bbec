mod app;
mod color;
mod ui;

use std::path::Path;

use anyhow::{bail, Context, Result};
use app::FlightDelayApp;
use clap::Parser;
use eframe::egui;
use flight_delays::settings::Settings;
use flight_delays::state::AppState;

fn main() -> Result<()> {
    env_logger::init();

    let settings = Settings::parse();
    log::info!("Flight delays v{} starting", env!("CARGO_PKG_VERSION"));

    let state = AppState::from_settings(&settings);

    if let Some(out) = &settings.export {
        return export(&state, out);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Flight Delays",
        options,
        Box::new(|_cc| Ok(Box::new(FlightDelayApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}

/// Headless mode: write the dashboard for the initial selections and exit.
fn export(state: &AppState, out: &Path) -> Result<()> {
    if state.table.is_none() {
        bail!(
            "{}",
            state
                .status_message
                .as_deref()
                .unwrap_or("no data loaded")
        );
    }
    state
        .export(out)
        .with_context(|| format!("exporting dashboard to {}", out.display()))?;
    println!("Wrote dashboard to {}", out.display());
    Ok(())
}
