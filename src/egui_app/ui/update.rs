use std::time::Duration;

use eframe::egui::{self, Frame, Margin};

use super::{EguiApp, style};

const ACTIVE_REPAINT: Duration = Duration::from_millis(100);

impl eframe::App for EguiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.apply_visuals(ctx);
        self.controller.poll_background_jobs();
        self.render_ui(ctx);
        // Worker messages arrive without input events.
        if self.controller.session().is_active() {
            ctx.request_repaint_after(ACTIVE_REPAINT);
        }
    }
}

impl EguiApp {
    fn render_ui(&mut self, ctx: &egui::Context) {
        let palette = style::palette();
        self.render_status(ctx);
        egui::SidePanel::left("history_panel")
            .resizable(true)
            .default_width(300.0)
            .min_width(220.0)
            .frame(
                Frame::new()
                    .fill(palette.bg_secondary)
                    .stroke(style::section_stroke())
                    .inner_margin(Margin::same(8)),
            )
            .show(ctx, |ui| self.render_history(ui));
        egui::CentralPanel::default()
            .frame(
                Frame::new()
                    .fill(palette.bg_primary)
                    .inner_margin(Margin::same(8)),
            )
            .show(ctx, |ui| self.render_controls(ui));
    }
}
