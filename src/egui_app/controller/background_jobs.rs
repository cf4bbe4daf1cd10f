use super::jobs::JobMessage;
use super::*;

impl EguiController {
    /// Drain every pending job message; call once per frame.
    pub fn poll_background_jobs(&mut self) {
        loop {
            let message = match self.jobs.try_recv_message() {
                Ok(message) => message,
                Err(
                    std::sync::mpsc::TryRecvError::Empty
                    | std::sync::mpsc::TryRecvError::Disconnected,
                ) => {
                    break;
                }
            };

            match message {
                JobMessage::Training(message) => self.apply_training_message(message),
            }
        }
    }
}
