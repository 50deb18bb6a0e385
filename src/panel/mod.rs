//! Panel capability set and the registry that orders panels.
//!
//! The navigator only talks to panels through [`Panel`]. Hooks receive a
//! [`PanelContext`] that stages button locks and requests; the navigator
//! applies them once the whole hook sequence of a transition has finished.

mod kinds;
mod registry;

pub use kinds::{FinishPanel, InfoPanel, InputPanel, InstallPanel, build_registry};
pub use registry::PanelRegistry;

use crate::variables::VariableStore;

/// Static description of a panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelMetadata {
    pub id: String,
    /// Condition id that decides whether the panel is shown
    pub condition: Option<String>,
    /// Counted in the user facing step indicator
    pub visible: bool,
    /// Help text, the help affordance is offered only when present
    pub help: Option<String>,
}

impl PanelMetadata {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            condition: None,
            visible: true,
            help: None,
        }
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Exclude the panel from the step indicator
    pub fn uncounted(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// Element that should receive focus when a panel is shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusTarget(pub String);

/// Side effects a panel asks for from inside a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelRequest {
    /// Do not show this panel, continue in the direction of travel
    Skip,
    /// Start the background install worker
    StartInstall,
    /// The installation is complete and the wizard may close
    MarkClosable,
}

/// Button locks staged by hooks. `Some(true)` locks, `Some(false)` unlocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonLocks {
    pub next: Option<bool>,
    pub previous: Option<bool>,
}

impl ButtonLocks {
    /// Later changes win
    pub fn merge(&mut self, later: ButtonLocks) {
        if later.next.is_some() {
            self.next = later.next;
        }
        if later.previous.is_some() {
            self.previous = later.previous;
        }
    }

    pub fn locks_next(&self) -> bool {
        self.next == Some(true)
    }
}

/// What a hook may touch while it runs.
pub struct PanelContext<'a> {
    pub variables: &'a mut VariableStore,
    locks: ButtonLocks,
    requests: Vec<PanelRequest>,
}

impl<'a> PanelContext<'a> {
    pub fn new(variables: &'a mut VariableStore) -> Self {
        Self {
            variables,
            locks: ButtonLocks::default(),
            requests: Vec::new(),
        }
    }

    pub fn lock_next(&mut self) {
        self.locks.next = Some(true);
    }

    pub fn unlock_next(&mut self) {
        self.locks.next = Some(false);
    }

    pub fn lock_previous(&mut self) {
        self.locks.previous = Some(true);
    }

    pub fn unlock_previous(&mut self) {
        self.locks.previous = Some(false);
    }

    pub fn request_skip(&mut self) {
        self.request(PanelRequest::Skip);
    }

    pub fn request(&mut self, request: PanelRequest) {
        if !self.requests.contains(&request) {
            self.requests.push(request);
        }
    }

    pub fn into_parts(self) -> (ButtonLocks, Vec<PanelRequest>) {
        (self.locks, self.requests)
    }
}

/// Lifecycle hooks of one wizard step.
///
/// Hooks run on the controller thread and may block.
pub trait Panel: Send {
    fn metadata(&self) -> &PanelMetadata;

    fn activate(&mut self, _ctx: &mut PanelContext<'_>) {}

    fn deactivate(&mut self, _ctx: &mut PanelContext<'_>) {}

    /// Return false to keep the user on this panel
    fn validate(&mut self, _ctx: &mut PanelContext<'_>) -> bool {
        true
    }

    /// Runs before [`Panel::validate`] on every forward attempt, commit field
    /// data to variables here
    fn execute_pre_validation(&mut self, _ctx: &mut PanelContext<'_>) {}

    /// Runs after [`Panel::validate`]; locking next aborts the transition
    fn execute_post_validation(&mut self, _ctx: &mut PanelContext<'_>) {}

    fn initial_focus(&self) -> Option<FocusTarget> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_stages_locks_and_requests() {
        let mut vars = VariableStore::new();
        let mut ctx = PanelContext::new(&mut vars);
        ctx.lock_next();
        ctx.unlock_next();
        ctx.lock_previous();
        ctx.request_skip();
        ctx.request_skip();
        ctx.variables.set("X", "1");

        let (locks, requests) = ctx.into_parts();
        assert_eq!(locks.next, Some(false));
        assert_eq!(locks.previous, Some(true));
        assert_eq!(requests, vec![PanelRequest::Skip]);
        assert_eq!(vars.get("X"), Some("1"));
    }

    #[test]
    fn test_lock_merge() {
        let mut locks = ButtonLocks {
            next: Some(true),
            previous: None,
        };
        locks.merge(ButtonLocks {
            next: None,
            previous: Some(false),
        });
        assert!(locks.locks_next());
        assert_eq!(locks.previous, Some(false));
    }
}
