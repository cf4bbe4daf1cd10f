use eframe::egui::{RichText, ScrollArea, TextStyle, Ui};

use super::{EguiApp, style};

impl EguiApp {
    /// Model summary on top, then one row per finished epoch.
    pub(super) fn render_history(&mut self, ui: &mut Ui) {
        let palette = style::palette();
        let training = &self.controller.ui.training;
        ui.label(
            RichText::new(&training.summary)
                .text_style(TextStyle::Monospace)
                .color(palette.text_primary),
        );
        ui.separator();
        ui.label(RichText::new("Epoch: loss  time").color(palette.text_muted));
        ScrollArea::vertical()
            .id_salt("epoch_history")
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for row in &training.history_rows {
                    ui.label(RichText::new(row).text_style(TextStyle::Monospace));
                }
            });
    }
}
