//! Interactive differential line viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns a [`DifferentialLine`] plus
//! the UI-side parameters used to (re)build it, and implements
//! [`eframe::App`] to step and draw the line.

use diffline_core::{
    config::{Config, NodeParam},
    geom::Rect,
    line::DifferentialLine,
    seed,
    types::NodeId,
};
use eframe::App;
use glam::DVec2;
use rand::rng;
use tracing::{error, info};

/// World-space canvas the line lives in, centered on the origin.
const CANVAS: Rect = Rect::new(-500.0, -500.0, 1000.0, 1000.0);

/// Plain numeric parameters edited in the side panel.
///
/// They are copied into the line's [`Config`] every frame, except for the
/// seed settings which only matter when the line is reseeded.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Params {
    max_force: f64,
    max_speed: f64,
    max_node_separation: f64,
    separation_factor: f64,
    cohesion_factor: f64,
    closed: bool,
    fixed_edges: bool,
    seed_count: usize,
    seed_radius: f64,
    seed_jitter: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            max_force: 0.9,
            max_speed: 1.0,
            max_node_separation: 5.0,
            separation_factor: 1.1,
            cohesion_factor: 1.0,
            closed: true,
            fixed_edges: false,
            seed_count: 100,
            seed_radius: 80.0,
            seed_jitter: 0.1,
        }
    }
}

impl Params {
    fn config(&self) -> Config {
        Config::default()
            .with_max_force(self.max_force)
            .with_max_speed(self.max_speed)
            .with_max_node_separation(self.max_node_separation)
            .with_separation_factor(self.separation_factor)
            .with_cohesion_factor(self.cohesion_factor)
            .with_closed(self.closed)
            .with_fixed_edges(self.fixed_edges)
    }

    fn apply_to(&self, cfg: &mut Config) {
        cfg.max_force = NodeParam::Constant(self.max_force);
        cfg.max_speed = NodeParam::Constant(self.max_speed);
        cfg.max_node_separation = NodeParam::Constant(self.max_node_separation);
        cfg.separation_factor = NodeParam::Constant(self.separation_factor);
        cfg.cohesion_factor = NodeParam::Constant(self.cohesion_factor);
        cfg.closed = self.closed;
        cfg.fixed_edges = self.fixed_edges;
    }
}

/// Main application state for the interactive viewer.
///
/// The typical per-frame update is:
/// 1. Handle UI interactions / input.
/// 2. If `running` is `true` and enough time has passed, call [`Viewer::step_once`].
/// 3. Render the line, newly inserted nodes and the optional query overlay.
///
/// ### Fields
/// - `line` - The growing line.
/// - `params` - UI-side parameters mirrored into the line's config.
/// - `rng` - Random number generator used for jittered seeds.
///
/// - `running` - Whether the simulation is currently auto-advancing.
/// - `zoom` - Zoom factor for world-to-screen coordinate mapping.
/// - `pan` - Screen-space pan offset in pixels.
///
/// - `last_new_ids` - Node ids inserted in the last step (for highlighting).
/// - `show_nodes` - Draw individual nodes on top of the polyline.
/// - `show_query` - Draw the separation query window of the first node.
/// - `smoothing` - Moving-average window used when drawing.
///
/// - `step_interval` - Target time between automatic steps (seconds).
/// - `last_step_time` - Time stamp of the last step (egui time).
/// - `last_step_dt` - Actual time delta between the last two steps.
pub struct Viewer {
    line: DifferentialLine,
    params: Params,

    rng: rand::rngs::ThreadRng,

    running: bool,
    zoom: f32,
    pan: egui::Vec2,

    last_new_ids: Vec<NodeId>,
    show_nodes: bool,
    show_query: bool,
    smoothing: usize,

    step_interval: f64,
    last_step_time: f64,
    last_step_dt: f64,
}

impl Viewer {
    /// Creates a new viewer with a jittered ring seeded at the origin.
    ///
    /// ### Errors
    /// Propagates the construction error if the default parameters cannot
    /// build a line.
    pub fn new() -> diffline_core::error::Result<Self> {
        let mut rng = rng();
        let params = Params::default();
        let line = Self::seeded_line(&params, DVec2::ZERO, &mut rng)?;

        Ok(Self {
            line,
            params,
            rng,
            running: false,
            zoom: 1.0,
            pan: egui::vec2(0.0, 0.0),
            last_new_ids: Vec::with_capacity(16),
            show_nodes: false,
            show_query: false,
            smoothing: 3,
            step_interval: 0.02,
            last_step_time: 0.0,
            last_step_dt: 0.0,
        })
    }

    fn seeded_line(
        params: &Params,
        center: DVec2,
        rng: &mut impl rand::Rng,
    ) -> diffline_core::error::Result<DifferentialLine> {
        let points = seed::jittered_ring(
            center,
            params.seed_radius,
            params.seed_count,
            params.seed_jitter,
            rng,
        );
        DifferentialLine::new(points, CANVAS, params.config())
    }

    /// Replaces the line with a fresh ring centered on `center`.
    ///
    /// Keeps the current parameters and camera. On invalid parameters the
    /// old line is kept and the error is logged.
    fn reseed(&mut self, center: DVec2) {
        match Self::seeded_line(&self.params, center, &mut self.rng) {
            Ok(line) => {
                info!(nodes = line.len(), x = center.x, y = center.y, "reseeded line");
                self.line = line;
                self.last_new_ids.clear();
            }
            Err(err) => error!(%err, "could not reseed line"),
        }
    }

    /// Reseeds at the origin and stops auto-running.
    fn reset(&mut self) {
        self.reseed(DVec2::ZERO);
        self.running = false;
    }

    /// Advances the simulation by a single step.
    ///
    /// The ids of nodes inserted in this step are stored in `last_new_ids`
    /// so they can be highlighted in the next frame.
    fn step_once(&mut self) {
        self.params.apply_to(self.line.config_mut());
        self.last_new_ids = self.line.step();
    }

    /// Converts a world-space position to screen-space.
    ///
    /// World coordinates are scaled by `zoom`, offset by `pan`, and then
    /// centered inside the given `rect`. Both spaces have y growing
    /// downward, so a quadrant's compass name matches where it is drawn.
    fn world_to_screen(&self, p: DVec2, rect: egui::Rect) -> egui::Pos2 {
        let center = rect.center();
        egui::pos2(
            center.x + p.x as f32 * self.zoom + self.pan.x,
            center.y + p.y as f32 * self.zoom + self.pan.y,
        )
    }

    /// Converts a screen-space position back to world-space.
    ///
    /// This is the inverse of [`Viewer::world_to_screen`] (up to floating
    /// point rounding).
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> DVec2 {
        let center = rect.center();
        let x = (p.x - center.x - self.pan.x) / self.zoom;
        let y = (p.y - center.y - self.pan.y) / self.zoom;
        DVec2::new(x as f64, y as f64)
    }

    fn rect_outline(&self, r: &Rect, rect: egui::Rect) -> Vec<egui::Pos2> {
        [
            DVec2::new(r.x, r.y),
            DVec2::new(r.right(), r.y),
            DVec2::new(r.right(), r.bottom()),
            DVec2::new(r.x, r.bottom()),
        ]
        .iter()
        .map(|&p| self.world_to_screen(p, rect))
        .collect()
    }

    /// Helper to draw a labeled `usize` [`egui::DragValue`].
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

    /// Helper to draw a labeled `f64` [`egui::DragValue`].
    fn labeled_drag_f64(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f64,
        range: std::ops::RangeInclusive<f64>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Builds the top panel UI (run controls, stepping, zoom).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                }

                ui.add(
                    egui::DragValue::new(&mut self.step_interval)
                        .prefix("dt target = ")
                        .range(0.0..=1.0)
                        .speed(0.01),
                );

                if ui.button("Step").clicked() {
                    let now = ctx.input(|i| i.time);
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = now - self.last_step_time;
                    }
                    self.step_once();
                    self.last_step_time = now;
                }

                if ui.button("Reset").clicked() {
                    self.reset();
                }

                ui.separator();
                ui.add(egui::Slider::new(&mut self.zoom, 0.1..=10.0).text("Zoom"));
            });
        });
    }

    /// Builds the bottom status bar (timing, node count, step count).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("dt target = {:.3} s", self.step_interval));
                ui.label(format!("dt last = {:.3} s", self.last_step_dt));
                ui.separator();
                ui.label(format!("nodes = {}", self.line.len()));
                ui.label(format!("steps = {}", self.line.steps()));
                ui.label(format!("index depth = {}", self.line.index().depth()));
            });
        });
    }

    /// Builds the right-hand configuration panel for simulation parameters.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Config");

                ui.separator();
                ui.label("Forces");
                Self::labeled_drag_f64(
                    ui,
                    "max_force:",
                    &mut self.params.max_force,
                    0.0..=10.0,
                    0.01,
                );
                Self::labeled_drag_f64(
                    ui,
                    "max_speed:",
                    &mut self.params.max_speed,
                    0.0..=10.0,
                    0.01,
                );
                Self::labeled_drag_f64(
                    ui,
                    "separation:",
                    &mut self.params.separation_factor,
                    0.0..=10.0,
                    0.01,
                );
                Self::labeled_drag_f64(
                    ui,
                    "cohesion:",
                    &mut self.params.cohesion_factor,
                    0.0..=10.0,
                    0.01,
                );

                ui.separator();
                ui.label("Growth");
                Self::labeled_drag_f64(
                    ui,
                    "max_node_separation:",
                    &mut self.params.max_node_separation,
                    0.5..=100.0,
                    0.1,
                );
                ui.checkbox(&mut self.params.closed, "closed");
                ui.checkbox(&mut self.params.fixed_edges, "fixed edges");

                ui.separator();
                ui.label("Seeding (click canvas)");
                Self::labeled_drag_usize(ui, "count:", &mut self.params.seed_count, 2..=2000, 1.0);
                Self::labeled_drag_f64(
                    ui,
                    "radius:",
                    &mut self.params.seed_radius,
                    1.0..=400.0,
                    1.0,
                );
                Self::labeled_drag_f64(
                    ui,
                    "jitter:",
                    &mut self.params.seed_jitter,
                    0.0..=0.9,
                    0.01,
                );

                ui.separator();
                ui.label("Display");
                ui.checkbox(&mut self.show_nodes, "show nodes");
                ui.checkbox(&mut self.show_query, "show query window");
                Self::labeled_drag_usize(ui, "smoothing:", &mut self.smoothing, 1..=15, 1.0);

                ui.separator();
                if ui.button("Reset cfg to default").clicked() {
                    self.params = Params::default();
                }
            });
    }

    /// Draws the separation query window of the first node and the nodes it finds.
    fn ui_query_overlay(&self, painter: &egui::Painter, rect: egui::Rect) {
        let Some(first) = self.line.nodes().next() else {
            return;
        };

        let window = self
            .line
            .bounds()
            .scaled(self.line.config().query_scale)
            .centered_at(first.position);
        let outline = self.rect_outline(&window, rect);
        painter.add(egui::Shape::closed_line(
            outline,
            egui::Stroke::new(1.0, egui::Color32::YELLOW),
        ));

        for entry in self.line.index().query(&window) {
            let p = self.world_to_screen(entry.position, rect);
            painter.circle_filled(p, 3.0, egui::Color32::GREEN);
        }
        painter.circle_filled(
            self.world_to_screen(first.position, rect),
            3.0,
            egui::Color32::RED,
        );
    }

    /// Builds the central panel where the line is drawn and interacted with.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            // Pan with drag.
            if response.dragged() {
                self.pan += response.drag_delta();
            }

            let hover_world = response.hover_pos().map(|p| self.screen_to_world(p, rect));

            // Click reseeds a ring at the cursor.
            if response.clicked()
                && let Some(center) = hover_world
            {
                self.reseed(center);
            }

            // Zoom around the mouse cursor.
            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let pointer_screen = response.hover_pos().unwrap_or(rect.center());
                let world_before = self.screen_to_world(pointer_screen, rect);

                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(0.1, 10.0);

                let screen_after = self.world_to_screen(world_before, rect);
                self.pan += pointer_screen - screen_after;
            }

            // Canvas bounds.
            let outline = self.rect_outline(&self.line.bounds(), rect);
            painter.add(egui::Shape::closed_line(
                outline,
                egui::Stroke::new(1.0, egui::Color32::DARK_GRAY),
            ));

            // The line itself.
            let points: Vec<egui::Pos2> = self
                .line
                .smoothed_positions(self.smoothing)
                .into_iter()
                .map(|p| self.world_to_screen(p, rect))
                .collect();
            let stroke = egui::Stroke::new(1.5, egui::Color32::LIGHT_GREEN);
            if self.line.is_closed() {
                painter.add(egui::Shape::closed_line(points, stroke));
            } else {
                painter.add(egui::Shape::line(points, stroke));
            }

            // Nodes, highlighting the ones inserted in the last step.
            if self.show_nodes {
                for &id in self.line.order() {
                    let Some(node) = self.line.node(id) else {
                        continue;
                    };
                    let color = if self.last_new_ids.contains(&id) {
                        egui::Color32::RED
                    } else {
                        egui::Color32::LIGHT_BLUE
                    };
                    painter.circle_filled(self.world_to_screen(node.position, rect), 1.5, color);
                }
            }

            if self.show_query {
                self.ui_query_overlay(&painter, rect);
            }

            // Auto-run simulation if requested.
            if self.running {
                let now = ctx.input(|i| i.time);
                let elapsed = now - self.last_step_time;
                if elapsed >= self.step_interval {
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = elapsed;
                    }
                    self.step_once();
                    self.last_step_time = now;
                }

                ctx.request_repaint();
            }
        });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}
