//! Training session state machine behind the single train/stop button.
//!
//! The UI thread owns the session. Background training jobs never touch it
//! directly; their messages are applied here after being drained on the UI
//! thread, tagged with the `run_id` they were started with so late messages
//! from an older run are dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use crate::config::{MAX_EPOCHS, MIN_EPOCHS};

/// One finished epoch of the current run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochRecord {
    /// 1-based.
    pub epoch: usize,
    pub loss: f32,
    /// Seconds since the previous epoch ended (or the run started).
    pub elapsed_secs: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainStatus {
    Train,
    Stop,
    Configuring,
    Saving,
}

impl TrainStatus {
    pub fn label(self) -> &'static str {
        match self {
            TrainStatus::Train => "Train",
            TrainStatus::Stop => "Stop",
            TrainStatus::Configuring => "Configuring…",
            TrainStatus::Saving => "Saving…",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("A training run is already active")]
    AlreadyRunning,
}

/// Handed to the background job when a run starts.
#[derive(Debug, Clone)]
pub struct RunTicket {
    pub run_id: u64,
    pub epochs: usize,
    pub cancel: Arc<AtomicBool>,
}

#[derive(Debug)]
struct ActiveRun {
    run_id: u64,
    cancel: Arc<AtomicBool>,
}

#[derive(Debug)]
pub struct TrainingSession {
    epochs: usize,
    status: TrainStatus,
    button_enabled: bool,
    history: Vec<EpochRecord>,
    next_run_id: u64,
    active: Option<ActiveRun>,
}

impl TrainingSession {
    pub fn new(epochs: usize) -> Self {
        Self {
            epochs: epochs.clamp(MIN_EPOCHS, MAX_EPOCHS),
            status: TrainStatus::Train,
            button_enabled: true,
            history: Vec::new(),
            next_run_id: 0,
            active: None,
        }
    }

    /// Start a new run, clearing the previous history.
    pub fn begin_run(&mut self) -> Result<RunTicket, SessionError> {
        if self.active.is_some() {
            return Err(SessionError::AlreadyRunning);
        }
        self.next_run_id = self.next_run_id.wrapping_add(1);
        let cancel = Arc::new(AtomicBool::new(false));
        self.history.clear();
        self.status = TrainStatus::Configuring;
        self.button_enabled = false;
        self.active = Some(ActiveRun {
            run_id: self.next_run_id,
            cancel: Arc::clone(&cancel),
        });
        Ok(RunTicket {
            run_id: self.next_run_id,
            epochs: self.epochs,
            cancel,
        })
    }

    pub fn mark_configured(&mut self, run_id: u64) {
        if self.is_current(run_id) && self.status == TrainStatus::Configuring {
            self.status = TrainStatus::Stop;
            self.button_enabled = true;
        }
    }

    /// Append an epoch record; records from stale runs are ignored.
    pub fn record_epoch(&mut self, run_id: u64, record: EpochRecord) -> bool {
        if !self.is_current(run_id) {
            return false;
        }
        self.history.push(record);
        true
    }

    /// Ignored once stop was requested; that run ends without saving.
    pub fn mark_saving(&mut self, run_id: u64) -> bool {
        if !self.is_current(run_id) || self.cancel_requested() {
            return false;
        }
        self.status = TrainStatus::Saving;
        self.button_enabled = false;
        true
    }

    /// Raise the cancellation token. Only honoured while the button reads "Stop".
    ///
    /// The button stays disabled until the job reports back through [`finish`].
    ///
    /// [`finish`]: TrainingSession::finish
    pub fn request_stop(&mut self) -> bool {
        if self.status != TrainStatus::Stop {
            return false;
        }
        let Some(active) = &self.active else {
            return false;
        };
        active.cancel.store(true, Ordering::Relaxed);
        self.status = TrainStatus::Train;
        self.button_enabled = false;
        true
    }

    pub fn finish(&mut self, run_id: u64) -> bool {
        if !self.is_current(run_id) {
            return false;
        }
        self.active = None;
        self.status = TrainStatus::Train;
        self.button_enabled = true;
        true
    }

    /// Accept a trimmed integer in the configurable range while idle; anything
    /// else is ignored, so the persisted target always reloads unchanged.
    pub fn set_epochs_from_text(&mut self, text: &str) -> bool {
        if self.active.is_some() {
            return false;
        }
        match text.trim().parse::<usize>() {
            Ok(epochs) if (MIN_EPOCHS..=MAX_EPOCHS).contains(&epochs) => {
                self.epochs = epochs;
                true
            }
            _ => false,
        }
    }

    pub fn status(&self) -> TrainStatus {
        self.status
    }

    pub fn button_label(&self) -> &'static str {
        self.status.label()
    }

    pub fn button_enabled(&self) -> bool {
        self.button_enabled
    }

    pub fn history(&self) -> &[EpochRecord] {
        &self.history
    }

    pub fn epochs(&self) -> usize {
        self.epochs
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn current_run_id(&self) -> Option<u64> {
        self.active.as_ref().map(|run| run.run_id)
    }

    pub fn cancel_requested(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|run| run.cancel.load(Ordering::Relaxed))
    }

    /// Completed share of the epoch target, in `[0, 1]`.
    pub fn progress_fraction(&self) -> f32 {
        (self.history.len() as f32 / self.epochs.max(1) as f32).clamp(0.0, 1.0)
    }

    fn is_current(&self, run_id: u64) -> bool {
        self.active.as_ref().is_some_and(|run| run.run_id == run_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(epoch: usize) -> EpochRecord {
        EpochRecord {
            epoch,
            loss: 1.0 / epoch as f32,
            elapsed_secs: 0.5,
        }
    }

    #[test]
    fn new_session_is_idle() {
        let session = TrainingSession::new(20);
        assert_eq!(session.status(), TrainStatus::Train);
        assert_eq!(session.button_label(), "Train");
        assert!(session.button_enabled());
        assert!(session.history().is_empty());
        assert!(!session.is_active());
    }

    #[test]
    fn history_keeps_every_callback_in_order() {
        for n in [0usize, 1, 7, 50] {
            let mut session = TrainingSession::new(n.max(1));
            let ticket = session.begin_run().unwrap();
            session.mark_configured(ticket.run_id);
            for epoch in 1..=n {
                assert!(session.record_epoch(ticket.run_id, record(epoch)));
            }
            assert_eq!(session.history().len(), n);
            assert!(
                session
                    .history()
                    .iter()
                    .enumerate()
                    .all(|(i, r)| r.epoch == i + 1)
            );
        }
    }

    #[test]
    fn second_start_is_rejected_while_active() {
        let mut session = TrainingSession::new(3);
        let first = session.begin_run().unwrap();
        assert_eq!(session.begin_run().unwrap_err(), SessionError::AlreadyRunning);
        session.mark_configured(first.run_id);
        assert_eq!(session.begin_run().unwrap_err(), SessionError::AlreadyRunning);
        assert!(session.finish(first.run_id));
        let second = session.begin_run().unwrap();
        assert!(second.run_id > first.run_id);
    }

    #[test]
    fn status_walks_through_a_full_run() {
        let mut session = TrainingSession::new(2);
        let ticket = session.begin_run().unwrap();
        assert_eq!(ticket.epochs, 2);
        assert_eq!(session.status(), TrainStatus::Configuring);
        assert!(!session.button_enabled());

        session.mark_configured(ticket.run_id);
        assert_eq!(session.button_label(), "Stop");
        assert!(session.button_enabled());

        session.record_epoch(ticket.run_id, record(1));
        assert!((session.progress_fraction() - 0.5).abs() < 1e-6);

        session.mark_saving(ticket.run_id);
        assert_eq!(session.status(), TrainStatus::Saving);
        assert!(!session.button_enabled());

        session.finish(ticket.run_id);
        assert_eq!(session.status(), TrainStatus::Train);
        assert!(session.button_enabled());
        assert!(!session.is_active());
    }

    #[test]
    fn stop_raises_token_and_disables_button_until_finish() {
        let mut session = TrainingSession::new(5);
        let ticket = session.begin_run().unwrap();
        assert!(!session.request_stop(), "stop is ignored while configuring");
        session.mark_configured(ticket.run_id);

        assert!(session.request_stop());
        assert!(ticket.cancel.load(Ordering::Relaxed));
        assert!(session.cancel_requested());
        assert_eq!(session.status(), TrainStatus::Train);
        assert!(!session.button_enabled());
        assert!(session.is_active());
        assert!(session.begin_run().is_err());

        session.finish(ticket.run_id);
        assert!(session.button_enabled());
        assert!(session.begin_run().is_ok());
    }

    #[test]
    fn stale_run_messages_are_ignored() {
        let mut session = TrainingSession::new(5);
        let old = session.begin_run().unwrap();
        session.finish(old.run_id);
        let current = session.begin_run().unwrap();
        session.mark_configured(current.run_id);

        assert!(!session.record_epoch(old.run_id, record(1)));
        session.mark_saving(old.run_id);
        assert!(!session.finish(old.run_id));
        assert_eq!(session.status(), TrainStatus::Stop);
        assert!(session.history().is_empty());
        assert!(session.is_active());
    }

    #[test]
    fn saving_does_not_override_a_requested_stop() {
        let mut session = TrainingSession::new(2);
        let ticket = session.begin_run().unwrap();
        session.mark_configured(ticket.run_id);
        assert!(session.request_stop());

        assert!(!session.mark_saving(ticket.run_id));
        assert_eq!(session.status(), TrainStatus::Train);
        assert!(!session.button_enabled());
    }

    #[test]
    fn new_run_clears_previous_history() {
        let mut session = TrainingSession::new(5);
        let first = session.begin_run().unwrap();
        session.record_epoch(first.run_id, record(1));
        session.finish(first.run_id);
        assert_eq!(session.history().len(), 1);
        session.begin_run().unwrap();
        assert!(session.history().is_empty());
    }

    #[test]
    fn epochs_text_accepts_only_positive_integers_while_idle() {
        let mut session = TrainingSession::new(20);
        assert!(session.set_epochs_from_text(" 35 "));
        assert_eq!(session.epochs(), 35);
        for bad in ["", "0", "-3", "abc", "2.5"] {
            assert!(!session.set_epochs_from_text(bad));
            assert_eq!(session.epochs(), 35);
        }
        assert!(session.set_epochs_from_text(&MAX_EPOCHS.to_string()));
        assert!(!session.set_epochs_from_text(&(MAX_EPOCHS + 1).to_string()));
        assert_eq!(session.epochs(), MAX_EPOCHS);
        assert_eq!(TrainingSession::new(usize::MAX).epochs(), MAX_EPOCHS);
        session.set_epochs_from_text("35");
        session.begin_run().unwrap();
        assert!(!session.set_epochs_from_text("4"));
        assert_eq!(session.epochs(), 35);
    }
}
