use eframe::egui::{self, Frame, Margin, ProgressBar, RichText, StrokeKind};

use super::{EguiApp, style};

impl EguiApp {
    pub(super) fn render_status(&mut self, ctx: &egui::Context) {
        let palette = style::palette();
        egui::TopBottomPanel::bottom("status_bar")
            .frame(
                Frame::new()
                    .fill(palette.bg_primary)
                    .stroke(style::section_stroke())
                    .inner_margin(Margin::symmetric(8, 4)),
            )
            .show(ctx, |ui| {
                let status = &self.controller.ui.status;
                let progress = &self.controller.ui.progress;
                ui.horizontal(|ui| {
                    ui.add_space(6.0);
                    let (badge_rect, _) =
                        ui.allocate_exact_size(egui::vec2(16.0, 16.0), egui::Sense::hover());
                    ui.painter().rect_filled(badge_rect, 0.0, status.badge_color);
                    ui.painter().rect_stroke(
                        badge_rect,
                        0.0,
                        style::inner_border(),
                        StrokeKind::Inside,
                    );
                    ui.add_space(8.0);
                    ui.label(RichText::new(&status.badge_label).color(palette.text_primary));
                    ui.separator();
                    ui.label(RichText::new(&status.text).color(palette.text_primary))
                        .on_hover_text(status.log_text());
                    if progress.visible {
                        ui.with_layout(
                            egui::Layout::right_to_left(egui::Align::Center),
                            |ui| {
                                let fraction = progress.fraction();
                                let pct = (fraction * 100.0).round().clamp(0.0, 100.0);
                                ui.add(
                                    ProgressBar::new(fraction)
                                        .desired_width(180.0)
                                        .text(format!("{pct:.0}%")),
                                );
                                if let Some(detail) = progress.detail.as_deref() {
                                    ui.label(RichText::new(detail).color(palette.text_muted));
                                }
                            },
                        );
                    }
                });
            });
    }
}
