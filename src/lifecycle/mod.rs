//! Install start, exit and abort handling.
//!
//! [`InstallLifecycle`] decides what a quit request means: a finished
//! install shuts down (rebooting according to policy), an unfinished one is
//! an abort that interrupts the worker and removes what it wrote.

mod host;
mod uninstall;
mod worker;

pub use host::{ChannelHost, ChannelPrompter};
pub use uninstall::{TomlUninstallWriter, UninstallRecord};
pub use worker::{InstallProgress, InstalledFiles, UnpackWorker};

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::MessagesConfig;
use crate::error::{Result, WizardError};
use crate::navigation::NavButtons;
use crate::variables::VariableStore;

/// Background installation action
pub trait InstallWorker: Send {
    fn start(&mut self, variables: &VariableStore);

    /// Ask every running job to stop and wait up to `timeout`. Returns false
    /// when the worker is still running afterwards.
    fn request_interrupt_all(&mut self, timeout: Duration) -> bool;

    /// True while the worker is inside a window where interrupts are ignored
    fn is_discard_interrupt(&self) -> bool;

    /// Paths written so far, in write order
    fn installed_files(&self) -> Vec<PathBuf>;
}

pub trait UninstallWriter: Send {
    fn write(&self, record: &UninstallRecord) -> Result<()>;
}

/// Process-level exit
pub trait Host: Send {
    fn shutdown(&self, exit_code: i32, reboot: bool);
}

pub trait Prompter: Send {
    /// Yes / no question, true for yes
    fn confirm(&self, title: &str, message: &str) -> bool;

    fn notice(&self, title: &str, message: &str);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RebootPolicy {
    /// Reboot without asking
    Always,
    /// Ask the user
    #[default]
    Ask,
    /// Tell the user to reboot, never reboot
    Notice,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallState {
    /// The installation finished and the wizard may close
    pub can_close: bool,
    pub reboot_required: bool,
    pub reboot_policy: RebootPolicy,
    /// The worker has been started
    pub started: bool,
    /// The worker reported back
    pub finished: bool,
    pub failed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecyclePolicy {
    /// Quit requests refused while interrupts are discarded
    pub max_interrupt_attempts: u32,
    pub interrupt_timeout: Duration,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            max_interrupt_attempts: 3,
            interrupt_timeout: Duration::from_secs(40),
        }
    }
}

/// Result of a quit request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Installation complete, host told to shut down
    Finished { reboot: bool },
    /// Worker is not interruptible right now, try again
    Deferred,
    /// User declined to abort
    Cancelled,
    /// Host told to shut down after an abort
    Aborted { wiped: bool },
}

impl ExitOutcome {
    /// The wizard is over
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExitOutcome::Finished { .. } | ExitOutcome::Aborted { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WipeReport {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ABORTED: i32 = 1;
pub const EXIT_FAILED: i32 = 2;

pub struct InstallLifecycle {
    worker: Box<dyn InstallWorker>,
    uninstall: Box<dyn UninstallWriter>,
    host: Box<dyn Host>,
    prompter: Box<dyn Prompter>,
    state: InstallState,
    policy: LifecyclePolicy,
    messages: MessagesConfig,
    interrupt_count: u32,
}

impl InstallLifecycle {
    pub fn new(
        worker: Box<dyn InstallWorker>,
        uninstall: Box<dyn UninstallWriter>,
        host: Box<dyn Host>,
        prompter: Box<dyn Prompter>,
    ) -> Self {
        Self {
            worker,
            uninstall,
            host,
            prompter,
            state: InstallState::default(),
            policy: LifecyclePolicy::default(),
            messages: MessagesConfig::default(),
            interrupt_count: 1,
        }
    }

    pub fn with_policy(mut self, policy: LifecyclePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_messages(mut self, messages: MessagesConfig) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_reboot(mut self, required: bool, policy: RebootPolicy) -> Self {
        self.state.reboot_required = required;
        self.state.reboot_policy = policy;
        self
    }

    pub fn state(&self) -> InstallState {
        self.state
    }

    /// Start the worker. Later calls do nothing.
    pub fn start_install(&mut self, variables: &VariableStore) -> bool {
        if self.state.started {
            debug!("Install already started");
            return false;
        }
        info!("Starting install worker");
        self.state.started = true;
        self.worker.start(variables);
        true
    }

    pub fn install_finished(&mut self, success: bool) {
        self.state.finished = true;
        if success {
            info!("Install finished");
            self.state.can_close = true;
        } else {
            error!("Install failed");
            self.state.failed = true;
        }
    }

    pub fn mark_closable(&mut self) {
        self.state.can_close = true;
    }

    pub fn set_reboot_required(&mut self, required: bool) {
        self.state.reboot_required = required;
    }

    /// Handle a quit request.
    ///
    /// A closable install, or one where neither previous nor next is usable,
    /// is finalized. Anything else is an abort.
    pub fn request_exit(&mut self, buttons: &NavButtons, variables: &VariableStore) -> ExitOutcome {
        if self.state.can_close || buttons.only_quit() {
            self.finish(variables)
        } else {
            self.abort(variables)
        }
    }

    fn finish(&mut self, variables: &VariableStore) -> ExitOutcome {
        // The writer decides whether there is anything worth keeping
        let record = UninstallRecord::new(
            self.state.reboot_required,
            variables.get("INSTALL_PATH").map(str::to_string),
            self.worker.installed_files(),
        )
        .with_variables(variables.snapshot());
        if let Err(e) = self.uninstall.write(&record) {
            warn!("Failed to write uninstall record: {}", e);
        }

        if self.state.failed && !self.state.can_close {
            warn!("Closing wizard after a failed install");
            self.host.shutdown(EXIT_FAILED, false);
            return ExitOutcome::Finished { reboot: false };
        }

        let reboot = self.state.reboot_required && self.resolve_reboot(variables);
        info!("Finishing wizard (reboot: {})", reboot);
        self.host.shutdown(EXIT_SUCCESS, reboot);
        ExitOutcome::Finished { reboot }
    }

    fn resolve_reboot(&self, variables: &VariableStore) -> bool {
        match self.state.reboot_policy {
            RebootPolicy::Always => true,
            RebootPolicy::Ask => self.prompter.confirm(
                &variables.substitute(&self.messages.reboot_ask_title),
                &variables.substitute(&self.messages.reboot_ask_message),
            ),
            RebootPolicy::Notice => {
                self.prompter.notice(
                    &variables.substitute(&self.messages.reboot_notice_title),
                    &variables.substitute(&self.messages.reboot_notice_message),
                );
                false
            }
        }
    }

    fn abort(&mut self, variables: &VariableStore) -> ExitOutcome {
        if self.worker.is_discard_interrupt()
            && self.interrupt_count < self.policy.max_interrupt_attempts
        {
            self.interrupt_count += 1;
            info!(
                "Install cannot be interrupted right now (attempt {} of {})",
                self.interrupt_count, self.policy.max_interrupt_attempts
            );
            return ExitOutcome::Deferred;
        }

        let confirmed = self.prompter.confirm(
            &variables.substitute(&self.messages.quit_title),
            &variables.substitute(&self.messages.quit_message),
        );
        if !confirmed {
            debug!("Abort cancelled");
            return ExitOutcome::Cancelled;
        }

        let wiped = match self.wipe_aborted() {
            Ok(report) => {
                info!(
                    "Removed {} installed files ({} failed)",
                    report.removed.len(),
                    report.failed.len()
                );
                true
            }
            Err(e) => {
                warn!("Leaving installed files in place: {}", e);
                false
            }
        };

        self.host.shutdown(EXIT_ABORTED, false);
        ExitOutcome::Aborted { wiped }
    }

    /// Stop the worker and delete the files it wrote, in write order.
    ///
    /// Nothing is deleted unless the worker confirmed it stopped.
    pub fn wipe_aborted(&mut self) -> Result<WipeReport> {
        let timeout = self.policy.interrupt_timeout;
        if !self.worker.request_interrupt_all(timeout) {
            return Err(WizardError::InterruptRefused { timeout });
        }

        let mut report = WipeReport::default();
        for path in self.worker.installed_files() {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    debug!("Removed {:?}", path);
                    report.removed.push(path);
                }
                Err(e) => {
                    warn!("Could not remove {:?}: {}", path, e);
                    report.failed.push(path);
                }
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::Button;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Calls {
        shutdown: Option<(i32, bool)>,
        confirms: Vec<String>,
        notices: Vec<String>,
        records: Vec<UninstallRecord>,
        interrupts: u32,
    }

    type Shared = Arc<Mutex<Calls>>;

    struct FakeWorker {
        calls: Shared,
        files: Vec<PathBuf>,
        discard: bool,
        stops: bool,
    }

    impl InstallWorker for FakeWorker {
        fn start(&mut self, _variables: &VariableStore) {}

        fn request_interrupt_all(&mut self, _timeout: Duration) -> bool {
            self.calls.lock().unwrap().interrupts += 1;
            self.stops
        }

        fn is_discard_interrupt(&self) -> bool {
            self.discard
        }

        fn installed_files(&self) -> Vec<PathBuf> {
            self.files.clone()
        }
    }

    struct FakeWriter(Shared);

    impl UninstallWriter for FakeWriter {
        fn write(&self, record: &UninstallRecord) -> Result<()> {
            self.0.lock().unwrap().records.push(record.clone());
            Ok(())
        }
    }

    struct FailingWriter;

    impl UninstallWriter for FailingWriter {
        fn write(&self, _record: &UninstallRecord) -> Result<()> {
            Err(WizardError::Io(std::io::Error::other("disk full")))
        }
    }

    struct FakeHost(Shared);

    impl Host for FakeHost {
        fn shutdown(&self, exit_code: i32, reboot: bool) {
            self.0.lock().unwrap().shutdown = Some((exit_code, reboot));
        }
    }

    struct FakePrompter {
        calls: Shared,
        answer: bool,
    }

    impl Prompter for FakePrompter {
        fn confirm(&self, title: &str, _message: &str) -> bool {
            self.calls.lock().unwrap().confirms.push(title.to_string());
            self.answer
        }

        fn notice(&self, _title: &str, message: &str) {
            self.calls.lock().unwrap().notices.push(message.to_string());
        }
    }

    struct Setup {
        files: Vec<PathBuf>,
        discard: bool,
        stops: bool,
        answer: bool,
    }

    impl Default for Setup {
        fn default() -> Self {
            Self {
                files: Vec::new(),
                discard: false,
                stops: true,
                answer: true,
            }
        }
    }

    fn lifecycle(setup: Setup) -> (InstallLifecycle, Shared) {
        let calls = Shared::default();
        let lifecycle = InstallLifecycle::new(
            Box::new(FakeWorker {
                calls: calls.clone(),
                files: setup.files,
                discard: setup.discard,
                stops: setup.stops,
            }),
            Box::new(FakeWriter(calls.clone())),
            Box::new(FakeHost(calls.clone())),
            Box::new(FakePrompter {
                calls: calls.clone(),
                answer: setup.answer,
            }),
        );
        (lifecycle, calls)
    }

    fn mid_wizard() -> NavButtons {
        NavButtons {
            previous: Button::active(),
            next: Button::active(),
            quit: Button::active(),
        }
    }

    fn vars() -> VariableStore {
        VariableStore::from_values([("APP_NAME", "Acme"), ("INSTALL_PATH", "/opt/acme")])
    }

    #[test]
    fn test_reboot_always_skips_prompt() {
        let (lc, calls) = lifecycle(Setup::default());
        let mut lc = lc.with_reboot(true, RebootPolicy::Always);
        lc.mark_closable();

        assert_eq!(
            lc.request_exit(&mid_wizard(), &vars()),
            ExitOutcome::Finished { reboot: true }
        );
        let calls = calls.lock().unwrap();
        assert!(calls.confirms.is_empty());
        assert_eq!(calls.shutdown, Some((EXIT_SUCCESS, true)));
    }

    #[test]
    fn test_reboot_ask_follows_answer() {
        for answer in [true, false] {
            let (lc, calls) = lifecycle(Setup {
                answer,
                ..Default::default()
            });
            let mut lc = lc.with_reboot(true, RebootPolicy::Ask);
            lc.mark_closable();

            assert_eq!(
                lc.request_exit(&mid_wizard(), &vars()),
                ExitOutcome::Finished { reboot: answer }
            );
            let calls = calls.lock().unwrap();
            assert_eq!(calls.confirms, vec!["Reboot".to_string()]);
            assert_eq!(calls.shutdown, Some((EXIT_SUCCESS, answer)));
        }
    }

    #[test]
    fn test_reboot_notice_never_reboots() {
        let (lc, calls) = lifecycle(Setup::default());
        let mut lc = lc.with_reboot(true, RebootPolicy::Notice);
        lc.mark_closable();

        assert_eq!(
            lc.request_exit(&mid_wizard(), &vars()),
            ExitOutcome::Finished { reboot: false }
        );
        let calls = calls.lock().unwrap();
        assert_eq!(
            calls.notices,
            vec!["Please reboot to finish installing Acme.".to_string()]
        );
        assert_eq!(calls.shutdown, Some((EXIT_SUCCESS, false)));
    }

    #[test]
    fn test_no_reboot_needed_no_prompt() {
        let (lc, calls) = lifecycle(Setup::default());
        let mut lc = lc.with_reboot(false, RebootPolicy::Ask);
        lc.install_finished(true);

        assert_eq!(
            lc.request_exit(&mid_wizard(), &vars()),
            ExitOutcome::Finished { reboot: false }
        );
        assert!(calls.lock().unwrap().confirms.is_empty());
    }

    #[test]
    fn test_only_quit_left_finishes() {
        let (mut lc, calls) = lifecycle(Setup::default());
        let buttons = NavButtons {
            previous: Button::hidden(),
            next: Button::hidden(),
            quit: Button::active(),
        };
        assert_eq!(
            lc.request_exit(&buttons, &vars()),
            ExitOutcome::Finished { reboot: false }
        );
        let calls = calls.lock().unwrap();
        assert_eq!(calls.shutdown, Some((EXIT_SUCCESS, false)));
        // The writer always sees the record, empty or not
        assert_eq!(calls.records.len(), 1);
        assert!(calls.records[0].files.is_empty());
    }

    #[test]
    fn test_finished_install_is_recorded() {
        let (mut lc, calls) = lifecycle(Setup {
            files: vec![PathBuf::from("/opt/acme/bin")],
            ..Default::default()
        });
        assert!(lc.start_install(&vars()));
        assert!(!lc.start_install(&vars()));
        lc.install_finished(true);

        assert_eq!(
            lc.request_exit(&mid_wizard(), &vars()),
            ExitOutcome::Finished { reboot: false }
        );
        let calls = calls.lock().unwrap();
        assert_eq!(calls.records.len(), 1);
        assert_eq!(calls.records[0].install_path.as_deref(), Some("/opt/acme"));
        assert_eq!(calls.records[0].files, vec![PathBuf::from("/opt/acme/bin")]);
        assert_eq!(calls.records[0].variables["APP_NAME"], "Acme");
    }

    #[test]
    fn test_disabled_buttons_finalize_mid_install() {
        let (mut lc, calls) = lifecycle(Setup {
            files: vec![PathBuf::from("/opt/acme/bin")],
            ..Default::default()
        });
        lc.start_install(&vars());
        let locked = NavButtons {
            previous: Button {
                visible: true,
                enabled: false,
            },
            next: Button {
                visible: true,
                enabled: false,
            },
            quit: Button::active(),
        };

        assert_eq!(
            lc.request_exit(&locked, &vars()),
            ExitOutcome::Finished { reboot: false }
        );
        let calls = calls.lock().unwrap();
        assert!(calls.confirms.is_empty());
        assert_eq!(calls.shutdown, Some((EXIT_SUCCESS, false)));
        assert_eq!(calls.records[0].files, vec![PathBuf::from("/opt/acme/bin")]);
    }

    #[test]
    fn test_failed_install_exits_with_failure() {
        let (mut lc, calls) = lifecycle(Setup::default());
        lc.start_install(&vars());
        lc.install_finished(false);

        let locked = NavButtons {
            previous: Button::hidden(),
            next: Button {
                visible: true,
                enabled: false,
            },
            quit: Button::active(),
        };
        assert_eq!(
            lc.request_exit(&locked, &vars()),
            ExitOutcome::Finished { reboot: false }
        );
        assert_eq!(calls.lock().unwrap().shutdown, Some((EXIT_FAILED, false)));
    }

    #[test]
    fn test_uninstall_failure_does_not_block_exit() {
        let calls = Shared::default();
        let mut lc = InstallLifecycle::new(
            Box::new(FakeWorker {
                calls: calls.clone(),
                files: Vec::new(),
                discard: false,
                stops: true,
            }),
            Box::new(FailingWriter),
            Box::new(FakeHost(calls.clone())),
            Box::new(FakePrompter {
                calls: calls.clone(),
                answer: true,
            }),
        );
        lc.start_install(&vars());
        lc.install_finished(true);

        assert_eq!(
            lc.request_exit(&mid_wizard(), &vars()),
            ExitOutcome::Finished { reboot: false }
        );
        assert_eq!(calls.lock().unwrap().shutdown, Some((EXIT_SUCCESS, false)));
    }

    #[test]
    fn test_discarded_interrupts_defer_until_ceiling() {
        let (mut lc, calls) = lifecycle(Setup {
            discard: true,
            answer: false,
            ..Default::default()
        });

        // Counter starts at 1, so two refusals before the prompt
        assert_eq!(lc.request_exit(&mid_wizard(), &vars()), ExitOutcome::Deferred);
        assert_eq!(lc.request_exit(&mid_wizard(), &vars()), ExitOutcome::Deferred);
        assert_eq!(lc.request_exit(&mid_wizard(), &vars()), ExitOutcome::Cancelled);
        let calls = calls.lock().unwrap();
        assert_eq!(calls.confirms, vec!["Quit".to_string()]);
        assert!(calls.shutdown.is_none());
    }

    #[test]
    fn test_interrupt_ceiling_is_configurable() {
        let (lc, _calls) = lifecycle(Setup {
            discard: true,
            answer: false,
            ..Default::default()
        });
        let mut lc = lc.with_policy(LifecyclePolicy {
            max_interrupt_attempts: 1,
            interrupt_timeout: Duration::from_millis(10),
        });
        assert_eq!(lc.request_exit(&mid_wizard(), &vars()), ExitOutcome::Cancelled);
    }

    #[test]
    fn test_abort_wipes_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.txt");
        let second = dir.path().join("b.txt");
        let gone = dir.path().join("never-written.txt");
        std::fs::write(&first, "a").unwrap();
        std::fs::write(&second, "b").unwrap();

        let (mut lc, calls) = lifecycle(Setup {
            files: vec![first.clone(), gone.clone(), second.clone()],
            ..Default::default()
        });
        lc.start_install(&vars());

        assert_eq!(
            lc.request_exit(&mid_wizard(), &vars()),
            ExitOutcome::Aborted { wiped: true }
        );
        assert!(!first.exists());
        assert!(!second.exists());
        let calls = calls.lock().unwrap();
        assert_eq!(calls.shutdown, Some((EXIT_ABORTED, false)));
        // Aborted installs leave no uninstall record
        assert!(calls.records.is_empty());
    }

    #[test]
    fn test_wipe_report_lists_failures() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.txt");
        let missing = dir.path().join("missing.txt");
        std::fs::write(&first, "a").unwrap();

        let (mut lc, _calls) = lifecycle(Setup {
            files: vec![missing.clone(), first.clone()],
            ..Default::default()
        });
        let report = lc.wipe_aborted().unwrap();
        assert_eq!(report.removed, vec![first]);
        assert_eq!(report.failed, vec![missing]);
    }

    #[test]
    fn test_refused_interrupt_preserves_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("payload.bin");
        std::fs::write(&file, "data").unwrap();

        let (mut lc, calls) = lifecycle(Setup {
            files: vec![file.clone()],
            stops: false,
            ..Default::default()
        });
        lc.start_install(&vars());

        assert!(matches!(
            lc.wipe_aborted(),
            Err(WizardError::InterruptRefused { .. })
        ));
        assert!(file.exists());

        assert_eq!(
            lc.request_exit(&mid_wizard(), &vars()),
            ExitOutcome::Aborted { wiped: false }
        );
        assert!(file.exists());
        assert_eq!(calls.lock().unwrap().interrupts, 2);
    }
}
