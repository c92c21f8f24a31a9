//! Application entry point for the road network viewer.
//!
//! This binary sets up eframe/egui and delegates all interactive
//! logic and rendering to [`Viewer`] from the `viewer` module.

mod viewer;

use viewer::Viewer;

/// Starts the native eframe application.
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if eframe fails to create the native window or event loop.
fn main() -> eframe::Result<()> {
    let options = eframe::NativeOptions::default();

    eframe::run_native(
        "Road Network",
        options,
        Box::new(|_cc| Ok(Box::new(Viewer::new()))),
    )
}
