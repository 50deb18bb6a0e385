use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, error};

use crate::config::{FieldConfig, PanelConfig, PanelKind, WizardConfig};
use crate::event::{PromptKind, PromptRequest, WizardEvent};
use crate::lifecycle::InstallProgress;
use crate::navigation::{Command, PanelSnapshot};
use crate::ui::{InputBuffer, Theme};
use crate::variables::VariableStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub is_error: bool,
}

pub struct Field {
    pub config: FieldConfig,
    pub buffer: InputBuffer,
}

/// Front end state. Everything it knows about the wizard arrives as
/// [`WizardEvent`]s; everything it wants goes back as a [`Command`].
pub struct WizardApp {
    pub config: WizardConfig,
    pub theme: Theme,
    pub snapshot: Option<PanelSnapshot>,
    pub fields: Vec<Field>,
    pub focused: usize,
    /// The controller is busy, input is ignored
    pub blocked: bool,
    pub prompt: Option<PromptRequest>,
    pub message: Option<Message>,
    pub show_help: bool,
    /// Files written so far and total
    pub progress: Option<(usize, usize)>,
    /// The install worker is running, quitting is refused
    pub installing: bool,
    install_done: bool,
    pub should_exit: bool,
    /// Exit code and reboot flag handed over by the wizard
    pub shutdown: Option<(i32, bool)>,
}

impl WizardApp {
    pub fn new(config: WizardConfig) -> Self {
        Self {
            config,
            theme: Theme::default(),
            snapshot: None,
            fields: Vec::new(),
            focused: 0,
            blocked: false,
            prompt: None,
            message: None,
            show_help: false,
            progress: None,
            installing: false,
            install_done: false,
            should_exit: false,
            shutdown: None,
        }
    }

    pub fn is_dryrun(&self) -> bool {
        self.config.general.dryrun
    }

    /// Configuration of the panel on screen
    pub fn panel(&self) -> Option<&PanelConfig> {
        self.snapshot
            .as_ref()
            .and_then(|s| self.config.panel(&s.id))
    }

    /// Panel text with variables filled in
    pub fn substitute(&self, text: &str) -> String {
        let Some(ref snapshot) = self.snapshot else {
            return text.to_string();
        };

        VariableStore::from_values(snapshot.variables.clone()).substitute(text)
    }

    pub fn set_error(&mut self, text: String) {
        self.message = Some(Message {
            text,
            is_error: true,
        });
    }

    pub fn set_info(&mut self, text: String) {
        self.message = Some(Message {
            text,
            is_error: false,
        });
    }

    pub fn handle_wizard_event(&mut self, event: WizardEvent) {
        match event {
            WizardEvent::GuiBlocked => self.blocked = true,
            WizardEvent::GuiReleased => self.blocked = false,
            WizardEvent::PanelSwitched(snapshot) => self.show_panel(snapshot),
            WizardEvent::ButtonsChanged(buttons) => {
                if let Some(ref mut snapshot) = self.snapshot {
                    snapshot.buttons = buttons;
                }
            }
            WizardEvent::Prompt(request) => {
                debug!("Prompt: {}", request.title);
                self.prompt = Some(request);
            }
            WizardEvent::Shutdown { exit_code, reboot } => {
                self.shutdown = Some((exit_code, reboot));
                self.should_exit = true;
            }
            WizardEvent::Fault(msg) => {
                error!("Wizard fault: {}", msg);
                self.set_error(msg);
                self.should_exit = true;
            }
        }
    }

    /// Returns the command to post when the install worker finished
    pub fn handle_install(&mut self, progress: InstallProgress) -> Option<Command> {
        match progress {
            InstallProgress::FileWritten { index, total, .. } => {
                self.progress = Some((index + 1, total));
                None
            }
            InstallProgress::Finished { success, message } => {
                self.installing = false;
                self.install_done = true;
                if success {
                    self.set_info(message);
                } else {
                    self.set_error(message);
                }
                Some(Command::InstallFinished { success })
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        if let Some(prompt) = self.prompt.take() {
            self.answer_prompt(prompt, key);
            return None;
        }

        if self.show_help {
            self.show_help = false;
            return None;
        }

        if self.blocked {
            return None;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') | KeyCode::Char('q') => self.quit(),
                KeyCode::Char('n') => Some(Command::Next),
                KeyCode::Char('p') => Some(Command::Previous),
                _ => None,
            };
        }

        match key.code {
            KeyCode::Esc => return self.quit(),
            KeyCode::Enter | KeyCode::PageDown => return Some(Command::Next),
            KeyCode::PageUp => return Some(Command::Previous),
            KeyCode::F(1) => {
                self.toggle_help();
                return None;
            }
            _ => {}
        }

        if self.fields.is_empty() {
            return match key.code {
                KeyCode::Char('n') | KeyCode::Right => Some(Command::Next),
                KeyCode::Char('p') | KeyCode::Left => Some(Command::Previous),
                KeyCode::Char('q') => self.quit(),
                KeyCode::Char('?') => {
                    self.toggle_help();
                    None
                }
                _ => None,
            };
        }

        self.edit_field(key)
    }

    fn quit(&mut self) -> Option<Command> {
        if self.installing {
            self.set_info("Installation in progress, please wait".to_string());
            return None;
        }
        Some(Command::Quit)
    }

    fn answer_prompt(&mut self, prompt: PromptRequest, key: KeyEvent) {
        let kind = prompt.kind;
        match kind {
            PromptKind::Notice => prompt.answer(true),
            PromptKind::Confirm => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => prompt.answer(true),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => prompt.answer(false),
                _ => self.prompt = Some(prompt),
            },
        }
    }

    fn toggle_help(&mut self) {
        let has_help = self.snapshot.as_ref().is_some_and(|s| s.help.is_some());
        self.show_help = has_help && !self.show_help;
    }

    fn edit_field(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Tab | KeyCode::Down => {
                self.focused = (self.focused + 1) % self.fields.len();
                return None;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focused = (self.focused + self.fields.len() - 1) % self.fields.len();
                return None;
            }
            _ => {}
        }

        let field = self.fields.get_mut(self.focused)?;
        let changed = match key.code {
            KeyCode::Char(c) => {
                field.buffer.insert(c);
                true
            }
            KeyCode::Backspace => field.buffer.delete_back(),
            KeyCode::Delete => field.buffer.delete_forward(),
            KeyCode::Left => {
                field.buffer.move_left();
                false
            }
            KeyCode::Right => {
                field.buffer.move_right();
                false
            }
            KeyCode::Home => {
                field.buffer.move_start();
                false
            }
            KeyCode::End => {
                field.buffer.move_end();
                false
            }
            _ => false,
        };

        changed.then(|| Command::SetVariable {
            name: field.config.variable.clone(),
            value: field.buffer.content().to_string(),
        })
    }

    fn show_panel(&mut self, snapshot: PanelSnapshot) {
        let fields: Vec<FieldConfig> = self
            .config
            .panel(&snapshot.id)
            .map(|p| p.fields.clone())
            .unwrap_or_default();

        self.fields = fields
            .into_iter()
            .map(|config| {
                let buffer = if config.secret {
                    InputBuffer::masked()
                } else {
                    InputBuffer::new()
                };
                let value = snapshot
                    .variables
                    .get(&config.variable)
                    .map(String::as_str)
                    .unwrap_or("");
                Field {
                    buffer: buffer.with_value(value),
                    config,
                }
            })
            .collect();

        self.focused = snapshot
            .focus
            .as_ref()
            .and_then(|f| self.fields.iter().position(|field| field.config.variable == f.0))
            .unwrap_or(0);
        self.show_help = false;
        if !self.install_done
            && self
                .config
                .panel(&snapshot.id)
                .is_some_and(|p| p.kind == PanelKind::Install)
        {
            self.installing = true;
        }
        self.snapshot = Some(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::{NavButtons, NavigationState, StepCounter};
    use crate::panel::FocusTarget;
    use std::collections::BTreeMap;
    use tokio::sync::oneshot;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn snapshot(id: &str) -> PanelSnapshot {
        let mut variables = BTreeMap::new();
        variables.insert("INSTALL_PATH".to_string(), "/opt".to_string());
        PanelSnapshot {
            index: 1,
            id: id.to_string(),
            state: NavigationState::default(),
            buttons: NavButtons::default(),
            step: StepCounter { step: 2, total: 4 },
            help: Some("Pick a directory".to_string()),
            focus: Some(FocusTarget("INSTALL_PATH".to_string())),
            variables,
        }
    }

    #[test]
    fn test_typing_posts_variable() {
        let mut app = WizardApp::new(WizardConfig::default());
        app.handle_wizard_event(WizardEvent::PanelSwitched(snapshot("target")));
        assert_eq!(app.fields.len(), 2);
        assert_eq!(app.fields[0].buffer.content(), "/opt");

        let cmd = app.handle_key(key(KeyCode::Char('x')));
        assert_eq!(
            cmd,
            Some(Command::SetVariable {
                name: "INSTALL_PATH".to_string(),
                value: "/optx".to_string()
            })
        );
        assert_eq!(app.handle_key(key(KeyCode::Left)), None);
        assert_eq!(app.handle_key(key(KeyCode::Enter)), Some(Command::Next));
    }

    #[test]
    fn test_blocked_ignores_input() {
        let mut app = WizardApp::new(WizardConfig::default());
        app.handle_wizard_event(WizardEvent::PanelSwitched(snapshot("welcome")));
        app.handle_wizard_event(WizardEvent::GuiBlocked);
        assert_eq!(app.handle_key(key(KeyCode::Enter)), None);
        app.handle_wizard_event(WizardEvent::GuiReleased);
        assert_eq!(app.handle_key(key(KeyCode::Char('n'))), Some(Command::Next));
        assert_eq!(app.handle_key(key(KeyCode::Esc)), Some(Command::Quit));
    }

    #[test]
    fn test_prompt_answers() {
        let mut app = WizardApp::new(WizardConfig::default());
        let (reply, mut answer) = oneshot::channel();
        app.handle_wizard_event(WizardEvent::Prompt(PromptRequest {
            kind: PromptKind::Confirm,
            title: "Quit".to_string(),
            message: "Abort?".to_string(),
            reply,
        }));

        // Unrelated keys keep the prompt open
        assert_eq!(app.handle_key(key(KeyCode::Enter)), None);
        assert!(app.prompt.is_some());

        app.handle_key(key(KeyCode::Char('y')));
        assert!(app.prompt.is_none());
        assert_eq!(answer.try_recv(), Ok(true));
    }

    #[test]
    fn test_help_needs_help_text() {
        let mut app = WizardApp::new(WizardConfig::default());
        app.handle_wizard_event(WizardEvent::PanelSwitched(snapshot("welcome")));
        app.handle_key(key(KeyCode::F(1)));
        assert!(app.show_help);
        app.handle_key(key(KeyCode::Char('x')));
        assert!(!app.show_help);

        let mut plain = snapshot("welcome");
        plain.help = None;
        app.handle_wizard_event(WizardEvent::PanelSwitched(plain));
        app.handle_key(key(KeyCode::F(1)));
        assert!(!app.show_help);
    }

    #[test]
    fn test_install_progress() {
        let mut app = WizardApp::new(WizardConfig::default());
        assert_eq!(
            app.handle_install(InstallProgress::FileWritten {
                path: "/opt/a".into(),
                index: 0,
                total: 3
            }),
            None
        );
        assert_eq!(app.progress, Some((1, 3)));

        let cmd = app.handle_install(InstallProgress::Finished {
            success: false,
            message: "disk full".to_string(),
        });
        assert_eq!(cmd, Some(Command::InstallFinished { success: false }));
        assert!(app.message.as_ref().is_some_and(|m| m.is_error));
    }

    #[test]
    fn test_quit_refused_while_installing() {
        let mut app = WizardApp::new(WizardConfig::default());
        app.handle_wizard_event(WizardEvent::PanelSwitched(snapshot("install")));
        assert!(app.installing);
        assert_eq!(app.handle_key(key(KeyCode::Esc)), None);
        assert!(app.message.as_ref().is_some_and(|m| !m.is_error));

        app.handle_install(InstallProgress::Finished {
            success: true,
            message: "Installed 0 files".to_string(),
        });
        assert!(!app.installing);
        assert_eq!(app.handle_key(key(KeyCode::Esc)), Some(Command::Quit));

        // Coming back to the panel does not block quitting again
        app.handle_wizard_event(WizardEvent::PanelSwitched(snapshot("install")));
        assert!(!app.installing);
    }

    #[test]
    fn test_shutdown_event() {
        let mut app = WizardApp::new(WizardConfig::default());
        app.handle_wizard_event(WizardEvent::Shutdown {
            exit_code: 0,
            reboot: true,
        });
        assert!(app.should_exit);
        assert_eq!(app.shutdown, Some((0, true)));
        assert_eq!(app.substitute("${X}"), "${X}");
    }
}
