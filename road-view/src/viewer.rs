//! Interactive road network viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns a grown [`RoadNetwork`] over
//! an [`FbmTerrain`] and implements [`eframe::App`] to draw it and expose
//! the growth parameters through an egui UI.

use eframe::App;
use glam::{Vec2, Vec4};
use rand::{Rng, rng};
use road_core::{
    GrowthConfig, Layer, RoadNetwork, TerrainField,
    config::{MAX_HIGHWAY_DENSITY, MAX_HIGHWAY_THRESHOLD, min_street_density},
    instances::LayerInstances,
    terrain::FbmTerrain,
};
use std::time::Instant;

/// Terrain preview resolution, in cells per axis.
const PREVIEW_CELLS: usize = 64;

/// Lowest street density offered; anything at or below
/// [`min_street_density`] is rejected by config validation.
const MIN_STREET_DENSITY: f32 = 0.55;

const WATER: egui::Color32 = egui::Color32::from_rgb(38, 66, 112);

/// Main application state for the viewer.
///
/// ### Fields
/// - `cfg` - Growth parameters used on the next regeneration.
/// - `terrain_seed` - Seed of the fBm terrain.
/// - `network` - Last successfully grown network.
/// - `last_error` - Why the last regeneration failed, if it did.
/// - `preview` - Row-major terrain colors, `PREVIEW_CELLS²` entries.
///
/// - `show_terrain` - Whether the terrain preview is drawn.
/// - `show_streets` - Whether street records are drawn.
/// - `zoom` - Pixels per world unit.
/// - `pan` - Screen-space pan offset in pixels.
///
/// - `last_build_secs` - Wall time of the last regeneration, in seconds.
pub struct Viewer {
    cfg: GrowthConfig,
    terrain_seed: i32,
    network: Option<RoadNetwork<FbmTerrain>>,
    last_error: Option<String>,
    preview: Vec<egui::Color32>,

    show_terrain: bool,
    show_streets: bool,
    zoom: f32,
    pan: egui::Vec2,

    last_build_secs: f64,
}

impl Viewer {
    /// Creates a viewer and grows a network with the default config.
    pub fn new() -> Self {
        Self::with_config(GrowthConfig::default(), 0)
    }

    /// Creates a viewer for `cfg` over the terrain of `terrain_seed`.
    pub fn with_config(cfg: GrowthConfig, terrain_seed: i32) -> Self {
        let mut viewer = Self {
            cfg,
            terrain_seed,
            network: None,
            last_error: None,
            preview: Vec::new(),
            show_terrain: true,
            show_streets: true,
            zoom: 250.0,
            pan: egui::vec2(0.0, 0.0),
            last_build_secs: 0.0,
        };
        viewer.regenerate();
        viewer
    }

    /// Rebuilds terrain and network from the current settings.
    ///
    /// On failure the previous network is dropped and the error is shown
    /// in the status bar.
    fn regenerate(&mut self) {
        let started = Instant::now();

        match RoadNetwork::new(FbmTerrain::new(self.terrain_seed), self.cfg) {
            Ok(mut network) => {
                network.create_network();
                self.preview = terrain_preview(network.terrain());
                self.network = Some(network);
                self.last_error = None;
            }
            Err(err) => {
                self.network = None;
                self.preview.clear();
                self.last_error = Some(err.to_string());
            }
        }

        self.last_build_secs = started.elapsed().as_secs_f64();
    }

    /// Draws fresh terrain and growth seeds.
    fn randomize_seeds(&mut self) {
        let mut rng = rng();
        self.terrain_seed = rng.random();
        self.cfg.seed = rng.random();
    }

    /// Converts a world-space position to screen-space.
    ///
    /// The y-axis is flipped so that positive y goes up in world space.
    fn world_to_screen(&self, p: Vec2, rect: egui::Rect) -> egui::Pos2 {
        let center = rect.center();
        egui::pos2(
            center.x + p.x * self.zoom + self.pan.x,
            center.y - p.y * self.zoom + self.pan.y,
        )
    }

    /// Inverse of [`Viewer::world_to_screen`].
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> Vec2 {
        let center = rect.center();
        let x = (p.x - center.x - self.pan.x) / self.zoom;
        let y = (center.y - p.y + self.pan.y) / self.zoom;
        Vec2::new(x, y)
    }

    fn labeled_drag_usize(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut usize,
        range: std::ops::RangeInclusive<usize>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    fn labeled_drag_f32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f32,
        range: std::ops::RangeInclusive<f32>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Builds the top panel UI (regeneration, layer toggles, zoom).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("⟳ Regenerate").clicked() {
                    self.regenerate();
                }

                if ui.button("🎲 Random seeds").clicked() {
                    self.randomize_seeds();
                    self.regenerate();
                }

                if ui.button("Center").clicked() {
                    self.pan = egui::vec2(0.0, 0.0);
                }

                ui.separator();
                ui.checkbox(&mut self.show_terrain, "Terrain");
                ui.checkbox(&mut self.show_streets, "Streets");

                ui.separator();
                ui.add(
                    egui::Slider::new(&mut self.zoom, 10.0..=5000.0)
                        .text("Zoom")
                        .logarithmic(true),
                );
            });
        });
    }

    /// Builds the bottom status bar (segment counts, build time, errors).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("build = {:.3} s", self.last_build_secs));
                ui.separator();

                if let Some(err) = &self.last_error {
                    ui.colored_label(egui::Color32::LIGHT_RED, err);
                    return;
                }
                let Some(network) = &self.network else {
                    return;
                };

                let instances = network.instances();
                ui.label(format!("highways = {}", instances.highway_count()));
                ui.label(format!("streets = {}", instances.street_count()));
                if let Some(index) = network.index() {
                    ui.label(format!("junctions = {}", index.junction_count(Layer::Street)));
                }
                if let Some(report) = network.report() {
                    ui.label(format!("coastline = {}", report.coastline_segments));
                    ui.label(format!("{:?}", report.termination));
                }
            });
        });
    }

    /// Builds the right-hand panel for growth parameters.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Config");

                ui.separator();
                ui.label("Density");
                Self::labeled_drag_f32(
                    ui,
                    "highway_density:",
                    &mut self.cfg.highway_density,
                    0.25..=MAX_HIGHWAY_DENSITY,
                    0.05,
                );
                Self::labeled_drag_f32(
                    ui,
                    "street_density:",
                    &mut self.cfg.street_density,
                    MIN_STREET_DENSITY..=20.0,
                    0.1,
                );
                Self::labeled_drag_f32(
                    ui,
                    "highway_threshold:",
                    &mut self.cfg.highway_threshold,
                    0.0..=MAX_HIGHWAY_THRESHOLD,
                    0.01,
                );

                ui.separator();
                ui.label("Caps");
                Self::labeled_drag_usize(
                    ui,
                    "street_cap:",
                    &mut self.cfg.street_cap,
                    1..=50_000,
                    10.0,
                );
                Self::labeled_drag_usize(
                    ui,
                    "highway_cap:",
                    &mut self.cfg.highway_cap,
                    1..=50_000,
                    10.0,
                );

                ui.separator();
                ui.label("Streets");
                Self::labeled_drag_f32(
                    ui,
                    "jitter (deg):",
                    &mut self.cfg.street_jitter_degrees,
                    0.0..=89.0,
                    0.5,
                );
                ui.checkbox(&mut self.cfg.checkered, "checkered");
                ui.checkbox(&mut self.cfg.continue_streets, "continue streets");

                ui.separator();
                ui.label("Seeds");
                ui.horizontal(|ui| {
                    ui.label("terrain:");
                    ui.add(egui::DragValue::new(&mut self.terrain_seed));
                });
                ui.horizontal(|ui| {
                    ui.label("growth:");
                    ui.add(egui::DragValue::new(&mut self.cfg.seed));
                });

                ui.separator();
                if ui.button("Reset cfg to default").clicked() {
                    self.cfg = GrowthConfig::default();
                }
            });
    }

    fn draw_terrain(&self, painter: &egui::Painter, rect: egui::Rect) {
        let cell = 2.0 / PREVIEW_CELLS as f32;
        for (n, &color) in self.preview.iter().enumerate() {
            let min = preview_cell_min(n % PREVIEW_CELLS, n / PREVIEW_CELLS);
            let a = self.world_to_screen(min, rect);
            let b = self.world_to_screen(min + Vec2::splat(cell), rect);
            painter.rect_filled(egui::Rect::from_two_pos(a, b), 0.0, color);
        }
    }

    fn draw_layer(
        &self,
        painter: &egui::Painter,
        rect: egui::Rect,
        layer: &LayerInstances,
        min_width: f32,
    ) {
        for record in layer.records() {
            let (start, end) = record.endpoints();
            let width = (record.scale.x * self.zoom).max(min_width);
            painter.line_segment(
                [self.world_to_screen(start, rect), self.world_to_screen(end, rect)],
                egui::Stroke::new(width, to_color32(record.color)),
            );
        }
    }

    /// Builds the central panel where terrain and roads are drawn.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            // Pan with drag.
            if response.dragged() {
                self.pan += response.drag_delta();
            }

            // Zoom around the mouse cursor.
            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let pointer_screen = response.hover_pos().unwrap_or(rect.center());
                let world_before = self.screen_to_world(pointer_screen, rect);

                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(10.0, 5000.0);

                let screen_after = self.world_to_screen(world_before, rect);
                self.pan += pointer_screen - screen_after;
            }

            if self.show_terrain {
                self.draw_terrain(&painter, rect);
            }

            let Some(network) = &self.network else {
                return;
            };

            let instances = network.instances();
            if self.show_streets {
                self.draw_layer(&painter, rect, &instances.street, 1.0);
            }
            self.draw_layer(&painter, rect, &instances.highway, 1.5);

            let root = self.world_to_screen(network.root(), rect);
            painter.circle_filled(root, 4.0, egui::Color32::RED);
        });
    }
}

impl App for Viewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}

/// World-space lower-left corner of preview cell `(i, j)`.
fn preview_cell_min(i: usize, j: usize) -> Vec2 {
    let cell = 2.0 / PREVIEW_CELLS as f32;
    Vec2::new(i as f32 * cell - 1.0, j as f32 * cell - 1.0)
}

/// Samples `terrain` at every preview cell center, row-major from `y = -1`.
fn terrain_preview<T: TerrainField>(terrain: &T) -> Vec<egui::Color32> {
    let half = 1.0 / PREVIEW_CELLS as f32;
    let mut colors = Vec::with_capacity(PREVIEW_CELLS * PREVIEW_CELLS);
    for j in 0..PREVIEW_CELLS {
        for i in 0..PREVIEW_CELLS {
            let center = preview_cell_min(i, j) + Vec2::splat(half);
            colors.push(terrain_color(
                terrain.height_field(center),
                terrain.population_density(center),
            ));
        }
    }
    colors
}

/// Water is blue; land shades from green towards sand as population rises.
fn terrain_color(height: f32, density: f32) -> egui::Color32 {
    if height <= 0.0 {
        return WATER;
    }
    let p = (density / 2.0).clamp(0.0, 1.0);
    egui::Color32::from_rgb(
        (96.0 + 120.0 * p) as u8,
        (150.0 + 40.0 * p) as u8,
        (88.0 + 40.0 * p) as u8,
    )
}

fn to_color32(c: Vec4) -> egui::Color32 {
    let [r, g, b, a] = (c.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round().to_array();
    egui::Color32::from_rgba_unmultiplied(r as u8, g as u8, b as u8, a as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use road_core::terrain::UniformTerrain;

    fn test_rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::Pos2::new(0.0, 0.0), egui::vec2(800.0, 600.0))
    }

    fn small_config() -> GrowthConfig {
        GrowthConfig {
            street_cap: 200,
            highway_cap: 200,
            ..GrowthConfig::default()
        }
    }

    #[test]
    fn world_to_screen_and_back_is_roundtrip() {
        let mut viewer = Viewer::with_config(small_config(), 1);
        viewer.zoom = 320.0;
        viewer.pan = egui::vec2(15.0, -7.0);
        let rect = test_rect();

        for p in [Vec2::ZERO, Vec2::new(0.5, -0.25), Vec2::new(-0.9, 0.8)] {
            let back = viewer.screen_to_world(viewer.world_to_screen(p, rect), rect);
            assert!((back - p).length() < 1e-5, "roundtrip mismatch: p={p:?}, back={back:?}");
        }
    }

    #[test]
    fn regenerate_grows_within_caps() {
        let viewer = Viewer::with_config(small_config(), 3);
        assert!(viewer.last_error.is_none());
        assert_eq!(viewer.preview.len(), PREVIEW_CELLS * PREVIEW_CELLS);

        let network = viewer.network.as_ref().expect("network grown");
        assert!(network.instances().street_count() <= 200);
        assert!(network.instances().highway_count() <= 200);
    }

    #[test]
    fn invalid_config_reports_error_and_drops_network() {
        let mut viewer = Viewer::with_config(small_config(), 3);
        assert!(viewer.network.is_some());

        viewer.cfg.highway_density = 0.0;
        viewer.regenerate();

        assert!(viewer.network.is_none());
        assert!(viewer.preview.is_empty());
        let err = viewer.last_error.as_deref().expect("error recorded");
        assert!(err.contains("highway_density"), "unexpected message: {err}");
    }

    #[test]
    fn config_ranges_only_offer_valid_densities() {
        assert!(MIN_STREET_DENSITY > min_street_density());

        let mut cfg = small_config();
        cfg.street_density = MIN_STREET_DENSITY;
        cfg.highway_density = MAX_HIGHWAY_DENSITY;
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn preview_marks_water_and_land() {
        let water = terrain_preview(&UniformTerrain {
            height: 0.0,
            population: 0.0,
        });
        assert!(water.iter().all(|&c| c == WATER));

        let land = terrain_preview(&UniformTerrain {
            height: 0.5,
            population: 1.0,
        });
        assert!(land.iter().all(|&c| c != WATER));
    }

    #[test]
    fn record_colors_convert_to_bytes() {
        assert_eq!(to_color32(Vec4::ONE), egui::Color32::WHITE);
        assert_eq!(
            to_color32(Vec4::new(0.0, 0.0, 0.0, 1.0)),
            egui::Color32::BLACK
        );
    }
}
