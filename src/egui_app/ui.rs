//! egui renderer for the training window.

mod controls;
mod history_panel;
mod loss_chart;
mod status_bar;
pub mod style;
mod update;

use crate::egui_app::controller::EguiController;
use eframe::egui::{self, TextureHandle};

/// Smallest window that still fits both columns.
pub const MIN_VIEWPORT_SIZE: egui::Vec2 = egui::vec2(720.0, 480.0);

/// Renders the egui UI using the shared controller state.
pub struct EguiApp {
    controller: EguiController,
    visuals_set: bool,
    /// Prediction preview texture, tagged with the preview revision it shows.
    preview_tex: Option<(u64, TextureHandle)>,
}

impl EguiApp {
    /// Create a new egui app, loading persisted configuration and the models list.
    pub fn new() -> Result<Self, String> {
        let controller = EguiController::from_config()?;
        Ok(Self::with_controller(controller))
    }

    pub fn with_controller(controller: EguiController) -> Self {
        Self {
            controller,
            visuals_set: false,
            preview_tex: None,
        }
    }

    fn apply_visuals(&mut self, ctx: &egui::Context) {
        if self.visuals_set {
            return;
        }
        let mut visuals = egui::Visuals::dark();
        style::apply_visuals(&mut visuals);
        ctx.set_visuals(visuals);
        self.visuals_set = true;
    }
}
