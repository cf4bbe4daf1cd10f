use eframe::egui::{Pos2, Rect, Sense, Shape, Ui, Vec2};

use super::style;
use crate::session::EpochRecord;

const FIRST_POINT_RADIUS: f32 = 3.0;

/// Vertical scale: losses above 1.0 stretch the chart instead of clipping.
pub(super) fn loss_scale(history: &[EpochRecord]) -> f32 {
    history
        .iter()
        .map(|record| record.loss)
        .filter(|loss| loss.is_finite())
        .fold(1.0, f32::max)
}

/// Screen position of every record; the last planned epoch lands on the right edge.
pub(super) fn chart_points(history: &[EpochRecord], epochs: usize, rect: Rect) -> Vec<Pos2> {
    let scale = loss_scale(history);
    let span = epochs.saturating_sub(1) as f32;
    history
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let x = if span > 0.0 {
                (i as f32 / span).min(1.0) * rect.width()
            } else {
                0.0
            };
            let loss = if record.loss.is_finite() {
                record.loss.max(0.0)
            } else {
                scale
            };
            let y = rect.height() - rect.height() * loss / scale;
            Pos2::new(rect.left() + x, rect.top() + y)
        })
        .collect()
}

pub(super) fn render(ui: &mut Ui, history: &[EpochRecord], epochs: usize, size: Vec2) {
    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let rect = response.rect;
    painter.rect_filled(rect, 0.0, style::chart_background());
    let points = chart_points(history, epochs, rect);
    if let Some(first) = points.first() {
        painter.circle_filled(*first, FIRST_POINT_RADIUS, style::chart_line().color);
    }
    if points.len() > 1 {
        painter.add(Shape::line(points, style::chart_line()));
    }
}
