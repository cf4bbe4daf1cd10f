/// Progress indicator for the active training run.
#[derive(Clone, Debug, Default)]
pub struct ProgressOverlayState {
    /// Whether the indicator is visible.
    pub visible: bool,
    /// Title text for the indicator.
    pub title: String,
    /// Optional detail text, e.g. the current download.
    pub detail: Option<String>,
    /// Completed steps.
    pub completed: usize,
    /// Total steps.
    pub total: usize,
}

impl ProgressOverlayState {
    /// Create and show a progress indicator with the provided title and total step count.
    pub fn new(title: impl Into<String>, total: usize) -> Self {
        Self {
            visible: true,
            title: title.into(),
            detail: None,
            completed: 0,
            total,
        }
    }

    /// Hide the indicator and clear its counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Return completion in the range `[0.0, 1.0]`.
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            (self.completed as f32 / self.total as f32).clamp(0.0, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ProgressOverlayState;

    #[test]
    fn progress_fraction_handles_zero_total() {
        let progress = ProgressOverlayState::new("Task", 0);
        assert_eq!(progress.fraction(), 0.0);
    }

    #[test]
    fn progress_reset_clears_visibility() {
        let mut progress = ProgressOverlayState::new("Task", 2);
        progress.completed = 3;
        assert_eq!(progress.fraction(), 1.0);
        progress.reset();
        assert!(!progress.visible);
        assert_eq!(progress.completed, 0);
        assert_eq!(progress.total, 0);
    }
}
