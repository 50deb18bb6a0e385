//! Serialized request queue in front of the navigator.
//!
//! Every request is processed on one blocking thread, in arrival order.
//! Panel hooks, prompts and worker interrupts may block that thread; the
//! front end is told with `GuiBlocked` / `GuiReleased`.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::{Direction, Navigator, Transition};
use crate::error::{Result, WizardError};
use crate::event::WizardEvent;
use crate::lifecycle::{ExitOutcome, InstallLifecycle};
use crate::panel::PanelRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Next,
    Previous,
    Skip(Direction),
    Quit,
    SetVariable { name: String, value: String },
    /// Posted by whoever watches the install worker
    InstallFinished { success: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Started(usize),
    Navigated(Transition),
    Exit(ExitOutcome),
    Done,
}

struct Envelope {
    command: Command,
    reply: Option<oneshot::Sender<Result<Outcome>>>,
}

#[derive(Clone)]
pub struct ControllerHandle {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl ControllerHandle {
    /// Queue a command without waiting for it
    pub fn send(&self, command: Command) -> Result<()> {
        self.tx
            .send(Envelope {
                command,
                reply: None,
            })
            .map_err(|_| WizardError::ControllerClosed)
    }

    /// Queue a command and wait for its outcome
    pub async fn request(&self, command: Command) -> Result<Outcome> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Envelope {
                command,
                reply: Some(reply),
            })
            .map_err(|_| WizardError::ControllerClosed)?;
        rx.await.map_err(|_| WizardError::ControllerClosed)?
    }
}

pub struct Controller {
    navigator: Navigator,
    lifecycle: InstallLifecycle,
    events: mpsc::UnboundedSender<WizardEvent>,
}

impl Controller {
    pub fn new(
        navigator: Navigator,
        lifecycle: InstallLifecycle,
        events: mpsc::UnboundedSender<WizardEvent>,
    ) -> Self {
        Self {
            navigator,
            lifecycle,
            events,
        }
    }

    /// Run the queue on a blocking thread. The task ends after the wizard
    /// shut down, when every handle is dropped, or on an invariant violation.
    pub fn spawn(self) -> (ControllerHandle, JoinHandle<Result<()>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::task::spawn_blocking(move || self.run(rx));
        (ControllerHandle { tx }, task)
    }

    fn run(mut self, mut rx: mpsc::UnboundedReceiver<Envelope>) -> Result<()> {
        while let Some(Envelope { command, reply }) = rx.blocking_recv() {
            debug!("Controller request: {:?}", command);
            let _ = self.events.send(WizardEvent::GuiBlocked);
            let result = self
                .dispatch(command)
                .and_then(|outcome| self.apply_requests().map(|()| outcome));
            let _ = self.events.send(WizardEvent::GuiReleased);

            match result {
                Ok(outcome) => {
                    let finished = matches!(outcome, Outcome::Exit(exit) if exit.is_terminal());
                    if let Some(reply) = reply {
                        let _ = reply.send(Ok(outcome));
                    }
                    if finished {
                        info!("Wizard finished, controller stopping");
                        return Ok(());
                    }
                }
                Err(WizardError::InvariantViolation(msg)) => {
                    error!("Navigation invariant violated: {}", msg);
                    let _ = self.events.send(WizardEvent::Fault(msg.clone()));
                    if let Some(reply) = reply {
                        let _ = reply.send(Err(WizardError::InvariantViolation(msg.clone())));
                    }
                    return Err(WizardError::InvariantViolation(msg));
                }
                Err(e) => {
                    warn!("Request failed: {}", e);
                    if let Some(reply) = reply {
                        let _ = reply.send(Err(e));
                    }
                }
            }
        }

        debug!("All controller handles dropped");
        Ok(())
    }

    fn dispatch(&mut self, command: Command) -> Result<Outcome> {
        match command {
            Command::Start => self.navigator.start().map(Outcome::Started),
            Command::Next => self.navigator.navigate_next().map(Outcome::Navigated),
            Command::Previous => self.navigator.navigate_previous().map(Outcome::Navigated),
            Command::Skip(direction) => self.navigator.skip(direction).map(Outcome::Navigated),
            Command::Quit => {
                let buttons = self.navigator.buttons();
                let outcome = self
                    .lifecycle
                    .request_exit(&buttons, self.navigator.variables());
                Ok(Outcome::Exit(outcome))
            }
            Command::SetVariable { name, value } => {
                self.navigator.set_variable(name, value);
                Ok(Outcome::Done)
            }
            Command::InstallFinished { success } => {
                self.lifecycle.install_finished(success);
                if success {
                    self.navigator.unlock_next();
                }
                Ok(Outcome::Done)
            }
        }
    }

    fn apply_requests(&mut self) -> Result<()> {
        for request in self.navigator.take_requests() {
            match request {
                PanelRequest::StartInstall => {
                    self.lifecycle.start_install(self.navigator.variables());
                }
                PanelRequest::MarkClosable => self.lifecycle.mark_closable(),
                PanelRequest::Skip => {
                    return Err(WizardError::InvariantViolation(
                        "skip request escaped the navigator".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}
