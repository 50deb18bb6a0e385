use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use super::{Host, Prompter};
use crate::event::{PromptKind, PromptRequest, WizardEvent};

/// Forwards shutdown to the front end, which owns the terminal and the
/// process exit
pub struct ChannelHost {
    events: mpsc::UnboundedSender<WizardEvent>,
}

impl ChannelHost {
    pub fn new(events: mpsc::UnboundedSender<WizardEvent>) -> Self {
        Self { events }
    }
}

impl Host for ChannelHost {
    fn shutdown(&self, exit_code: i32, reboot: bool) {
        if self
            .events
            .send(WizardEvent::Shutdown { exit_code, reboot })
            .is_err()
        {
            warn!("Front end gone, shutdown not delivered");
        }
    }
}

/// Asks the front end and blocks the calling thread until it answers.
///
/// Must run outside the async runtime (the controller thread does).
pub struct ChannelPrompter {
    events: mpsc::UnboundedSender<WizardEvent>,
}

impl ChannelPrompter {
    pub fn new(events: mpsc::UnboundedSender<WizardEvent>) -> Self {
        Self { events }
    }

    fn ask(&self, kind: PromptKind, title: &str, message: &str) -> bool {
        let (reply, answer) = oneshot::channel();
        let request = PromptRequest {
            kind,
            title: title.to_string(),
            message: message.to_string(),
            reply,
        };

        if self.events.send(WizardEvent::Prompt(request)).is_err() {
            warn!("Front end gone, treating prompt '{}' as declined", title);
            return false;
        }
        answer.blocking_recv().unwrap_or(false)
    }
}

impl Prompter for ChannelPrompter {
    fn confirm(&self, title: &str, message: &str) -> bool {
        self.ask(PromptKind::Confirm, title, message)
    }

    fn notice(&self, title: &str, message: &str) {
        self.ask(PromptKind::Notice, title, message);
    }
}
