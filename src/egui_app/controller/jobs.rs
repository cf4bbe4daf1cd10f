use super::model_training::{TrainingJob, TrainingMessage, run_training};
use std::{
    sync::mpsc::{Receiver, Sender},
    thread,
};

type TryRecvError = std::sync::mpsc::TryRecvError;

pub(crate) enum JobMessage {
    Training(TrainingMessage),
}

pub(crate) struct ControllerJobs {
    message_tx: Sender<JobMessage>,
    message_rx: Receiver<JobMessage>,
    training_in_progress: bool,
}

impl ControllerJobs {
    pub(super) fn new() -> Self {
        let (message_tx, message_rx) = std::sync::mpsc::channel::<JobMessage>();
        Self {
            message_tx,
            message_rx,
            training_in_progress: false,
        }
    }

    pub(super) fn try_recv_message(&self) -> Result<JobMessage, TryRecvError> {
        self.message_rx.try_recv()
    }

    #[cfg(test)]
    pub(super) fn message_sender(&self) -> Sender<JobMessage> {
        self.message_tx.clone()
    }

    pub(super) fn training_in_progress(&self) -> bool {
        self.training_in_progress
    }

    pub(super) fn begin_training(&mut self, job: TrainingJob) {
        self.training_in_progress = true;
        let tx = self.message_tx.clone();
        thread::spawn(move || {
            let run_id = job.run_id;
            let result = run_training(job, &tx);
            let _ = tx.send(JobMessage::Training(TrainingMessage::Finished { run_id, result }));
        });
    }

    pub(super) fn clear_training(&mut self) {
        self.training_in_progress = false;
    }
}
