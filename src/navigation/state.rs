use std::collections::BTreeMap;

use crate::panel::{ButtonLocks, FocusTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// Position of the wizard and what the scans allow from there
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NavigationState {
    pub current: usize,
    /// Direction of the last transition
    pub direction: Direction,
    pub can_go_next: bool,
    pub can_go_previous: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Button {
    pub visible: bool,
    pub enabled: bool,
}

impl Button {
    pub fn active() -> Self {
        Self {
            visible: true,
            enabled: true,
        }
    }

    pub fn hidden() -> Self {
        Self {
            visible: false,
            enabled: false,
        }
    }

    /// Visible and enabled
    pub fn is_usable(&self) -> bool {
        self.visible && self.enabled
    }
}

/// Navigation affordances shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavButtons {
    pub previous: Button,
    pub next: Button,
    pub quit: Button,
}

impl Default for NavButtons {
    fn default() -> Self {
        Self {
            previous: Button::hidden(),
            next: Button::active(),
            quit: Button::active(),
        }
    }
}

impl NavButtons {
    pub fn apply(&mut self, locks: ButtonLocks) {
        if let Some(locked) = locks.next {
            self.next.enabled = !locked;
        }
        if let Some(locked) = locks.previous {
            self.previous.enabled = !locked;
        }
    }

    /// Neither next nor previous can be used, only quit remains
    pub fn only_quit(&self) -> bool {
        !self.next.is_usable() && !self.previous.is_usable()
    }
}

/// "Step x of y" among the counted panels, `step` is 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepCounter {
    pub step: usize,
    pub total: usize,
}

/// Why a navigation request left the wizard where it was
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StayReason {
    ValidationFailed,
    NextLocked,
    PreviousLocked,
    NoReachablePanel,
    /// Already at the first or last registry position
    Boundary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Moved { from: usize, to: usize },
    Stayed { at: usize, reason: StayReason },
}

impl Transition {
    pub fn moved(&self) -> bool {
        matches!(self, Transition::Moved { .. })
    }

    /// Index the wizard ended on
    pub fn position(&self) -> usize {
        match *self {
            Transition::Moved { to, .. } => to,
            Transition::Stayed { at, .. } => at,
        }
    }
}

/// Everything a front end needs to present the current panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelSnapshot {
    pub index: usize,
    pub id: String,
    pub state: NavigationState,
    pub buttons: NavButtons,
    pub step: StepCounter,
    pub help: Option<String>,
    pub focus: Option<FocusTarget>,
    pub variables: BTreeMap<String, String>,
}
