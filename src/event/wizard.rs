use tokio::sync::oneshot;

use crate::navigation::{NavButtons, PanelSnapshot};

/// Notifications from the wizard controller to the front end
#[derive(Debug)]
pub enum WizardEvent {
    /// A request is being processed, input must not be accepted
    GuiBlocked,
    GuiReleased,
    PanelSwitched(PanelSnapshot),
    ButtonsChanged(NavButtons),
    Prompt(PromptRequest),
    /// The wizard is over; the host should exit with this code
    Shutdown { exit_code: i32, reboot: bool },
    /// Unrecoverable controller failure
    Fault(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Yes / no question
    Confirm,
    /// Information, acknowledged with any key
    Notice,
}

/// A question the controller waits on. Dropping the request without
/// answering counts as "no".
#[derive(Debug)]
pub struct PromptRequest {
    pub kind: PromptKind,
    pub title: String,
    pub message: String,
    pub reply: oneshot::Sender<bool>,
}

impl PromptRequest {
    pub fn answer(self, yes: bool) {
        let _ = self.reply.send(yes);
    }
}
