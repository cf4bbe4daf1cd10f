use eframe::egui::{
    self, Button, ColorImage, ComboBox, Image, RichText, TextEdit, TextureOptions, Ui, Vec2,
};

use super::{EguiApp, loss_chart, style};
use crate::egui_app::view_model;
use crate::inference::IMAGE_SIDE;

const PREVIEW_SIZE: f32 = 64.0;
const CHART_HEIGHT_SHARE: f32 = 0.55;

enum PickerAction {
    Select(usize),
    Delete(usize),
}

impl EguiApp {
    pub(super) fn render_controls(&mut self, ui: &mut Ui) {
        let palette = style::palette();
        let chart_size = Vec2::new(
            ui.available_width(),
            (ui.available_height() * CHART_HEIGHT_SHARE).max(120.0),
        );
        loss_chart::render(
            ui,
            &self.controller.ui.training.history,
            self.controller.ui.training.epochs,
            chart_size,
        );
        ui.add_space(8.0);

        ui.horizontal(|ui| {
            let training = &self.controller.ui.training;
            let train = ui.add_enabled(
                training.button_enabled,
                Button::new(training.button_label).min_size(Vec2::new(110.0, 0.0)),
            );
            if train.clicked() {
                self.controller.toggle_training();
            }
            if ui
                .add(Button::new("Predict").min_size(Vec2::new(110.0, 0.0)))
                .clicked()
            {
                self.controller.predict_via_dialog();
            }
        });
        ui.add_space(6.0);

        ui.horizontal(|ui| {
            ui.label(RichText::new("Epoch:").color(palette.text_muted));
            let mut text = self.controller.ui.training.epochs_text.clone();
            let response = ui.add_enabled(
                !self.controller.session().is_active(),
                TextEdit::singleline(&mut text).desired_width(80.0),
            );
            if response.changed() {
                self.controller.set_epochs_text(&text);
            }
        });
        ui.add_space(6.0);

        self.render_model_picker(ui);
        ui.add_space(8.0);
        self.render_prediction(ui);
    }

    fn render_model_picker(&mut self, ui: &mut Ui) {
        let models = &self.controller.ui.models;
        let selected_text = models
            .selected_entry()
            .map(view_model::model_label)
            .unwrap_or_else(|| "No saved models".to_string());
        let mut action = None;
        ComboBox::from_id_salt("model_picker")
            .width(280.0)
            .selected_text(selected_text)
            .show_ui(ui, |ui| {
                for (index, entry) in models.items.iter().enumerate() {
                    ui.horizontal(|ui| {
                        let selected = models.selected == Some(index);
                        if ui
                            .selectable_label(selected, view_model::model_label(entry))
                            .clicked()
                        {
                            action = Some(PickerAction::Select(index));
                        }
                        if ui
                            .small_button("🗑")
                            .on_hover_text("Delete this model")
                            .clicked()
                        {
                            action = Some(PickerAction::Delete(index));
                        }
                    });
                }
            });
        match action {
            Some(PickerAction::Select(index)) => self.controller.select_model(index),
            Some(PickerAction::Delete(index)) => self.controller.delete_model(index),
            None => {}
        }
    }

    fn render_prediction(&mut self, ui: &mut Ui) {
        let palette = style::palette();
        let prediction = &self.controller.ui.prediction;
        let Some(label) = prediction.label.as_deref() else {
            return;
        };
        ui.label(RichText::new(label).size(18.0).color(palette.accent_copper));
        let side = IMAGE_SIDE as usize;
        let Some(pixels) = prediction
            .preview
            .as_deref()
            .filter(|pixels| pixels.len() == side * side)
        else {
            return;
        };
        let stale = self
            .preview_tex
            .as_ref()
            .is_none_or(|(revision, _)| *revision != prediction.revision);
        if stale {
            let image = ColorImage::from_gray([side, side], pixels);
            let texture =
                ui.ctx()
                    .load_texture("prediction_preview", image, TextureOptions::NEAREST);
            self.preview_tex = Some((prediction.revision, texture));
        }
        if let Some((_, texture)) = &self.preview_tex {
            ui.add(
                Image::new(egui::load::SizedTexture::from_handle(texture))
                    .fit_to_exact_size(Vec2::splat(PREVIEW_SIZE)),
            );
        }
    }
}
