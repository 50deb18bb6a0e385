//! Panel traversal state machine.
//!
//! [`Navigator`] owns the panel registry and the variable store for one
//! wizard run. It decides which panel is current, sequences the panel hooks
//! of every transition and derives the navigation buttons afterwards.
//! [`controller`] serializes requests from the front end onto it.

pub mod controller;
mod state;

pub use controller::{Command, Controller, ControllerHandle, Outcome};
pub use state::{
    Button, Direction, NavButtons, NavigationState, PanelSnapshot, StayReason, StepCounter,
    Transition,
};

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{Result, WizardError};
use crate::event::WizardEvent;
use crate::panel::{ButtonLocks, Panel, PanelContext, PanelRegistry, PanelRequest};
use crate::rules::RuleEvaluator;
use crate::variables::VariableStore;

pub struct Navigator {
    registry: PanelRegistry,
    rules: Arc<dyn RuleEvaluator>,
    variables: VariableStore,
    state: NavigationState,
    buttons: NavButtons,
    started: bool,
    events: mpsc::UnboundedSender<WizardEvent>,
    /// Requests raised by hooks, drained by the controller
    pending: Vec<PanelRequest>,
}

fn stay(at: usize, reason: StayReason) -> Transition {
    Transition::Stayed { at, reason }
}

impl Navigator {
    pub fn new(
        registry: PanelRegistry,
        rules: Arc<dyn RuleEvaluator>,
        variables: VariableStore,
        events: mpsc::UnboundedSender<WizardEvent>,
    ) -> Result<Self> {
        if registry.is_empty() {
            return Err(WizardError::NoReachablePanel);
        }

        Ok(Self {
            registry,
            rules,
            variables,
            state: NavigationState::default(),
            buttons: NavButtons::default(),
            started: false,
            events,
            pending: Vec::new(),
        })
    }

    pub fn state(&self) -> NavigationState {
        self.state
    }

    pub fn current(&self) -> usize {
        self.state.current
    }

    pub fn buttons(&self) -> NavButtons {
        self.buttons
    }

    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    pub fn registry(&self) -> &PanelRegistry {
        &self.registry
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.set(name, value);
    }

    /// Drain the requests panels raised since the last call
    pub fn take_requests(&mut self) -> Vec<PanelRequest> {
        std::mem::take(&mut self.pending)
    }

    /// Whether the panel at `index` may be shown right now
    pub fn can_show(&self, index: usize) -> bool {
        let Some(meta) = self.registry.metadata(index) else {
            return false;
        };

        match meta.condition {
            Some(ref condition) => match self.rules.evaluate(condition, &self.variables) {
                Ok(show) => show,
                Err(e) => {
                    warn!("Panel {} hidden, condition failed: {}", meta.id, e);
                    false
                }
            },
            None => self.rules.panel_is_showable(&meta.id, &self.variables),
        }
    }

    /// First showable panel after `start`, optionally only counted ones
    pub fn has_navigate_next(&self, start: usize, visible_only: bool) -> Option<usize> {
        (start + 1..self.registry.len())
            .find(|&j| (!visible_only || self.registry.is_visible(j)) && self.can_show(j))
    }

    /// Last showable panel before `end`, optionally only counted ones
    pub fn has_navigate_previous(&self, end: usize, visible_only: bool) -> Option<usize> {
        (0..end.min(self.registry.len()))
            .rev()
            .find(|&j| (!visible_only || self.registry.is_visible(j)) && self.can_show(j))
    }

    /// Show the first showable panel
    pub fn start(&mut self) -> Result<usize> {
        if self.started {
            return Err(WizardError::InvariantViolation(
                "wizard already started".to_string(),
            ));
        }

        self.refresh_variables();
        let first = (0..self.registry.len())
            .find(|&i| self.can_show(i))
            .ok_or(WizardError::NoReachablePanel)?;

        info!("Starting wizard at panel {}", first);
        self.started = true;
        self.state.current = first;
        self.state.direction = Direction::Forward;

        let (_, locks, requests) = self.run_hook(first, |panel, ctx| panel.activate(ctx))?;
        self.enter(locks, requests, Direction::Forward)?;
        Ok(self.state.current)
    }

    /// User asked to go forward
    pub fn navigate_next(&mut self) -> Result<Transition> {
        self.ensure_started()?;
        if !self.buttons.next.enabled {
            debug!("Next is locked on panel {}", self.state.current);
            return Ok(stay(self.state.current, StayReason::NextLocked));
        }
        self.advance(self.state.current, true)
    }

    /// Leave `from` forward, running the validation hooks on it first
    pub fn advance(&mut self, from: usize, validate: bool) -> Result<Transition> {
        self.ensure_current(from)?;
        if self.registry.is_last(from) {
            return Ok(stay(from, StayReason::Boundary));
        }

        self.refresh_variables();
        let mut locks = ButtonLocks::default();

        let (_, staged, requests) = self.run_hook(from, |p, ctx| p.execute_pre_validation(ctx))?;
        locks.merge(staged);
        self.queue(requests);

        let mut valid = true;
        if validate {
            let (ok, staged, requests) = self.run_hook(from, |p, ctx| p.validate(ctx))?;
            locks.merge(staged);
            self.queue(requests);
            valid = ok;
        }

        // Post-validation runs on every forward attempt, valid or not
        let (_, staged, requests) = self.run_hook(from, |p, ctx| p.execute_post_validation(ctx))?;
        locks.merge(staged);
        self.queue(requests);
        if locks.locks_next() {
            debug!("Panel {} locked next during post-validation", from);
            self.apply_locks(locks);
            return Ok(stay(from, StayReason::NextLocked));
        }
        if !valid {
            info!("Panel {} did not validate", from);
            self.apply_locks(locks);
            return Ok(stay(from, StayReason::ValidationFailed));
        }

        self.refresh_variables();
        match self.has_navigate_next(from, false) {
            Some(to) => self.switch_panel(from, to, Direction::Forward),
            None => {
                self.apply_locks(locks);
                Ok(stay(from, StayReason::NoReachablePanel))
            }
        }
    }

    /// User asked to go back
    pub fn navigate_previous(&mut self) -> Result<Transition> {
        self.ensure_started()?;
        if !self.buttons.previous.enabled {
            debug!("Previous is locked on panel {}", self.state.current);
            return Ok(stay(self.state.current, StayReason::PreviousLocked));
        }
        self.retreat(self.state.current)
    }

    /// Leave `from` backward. No validation hooks run.
    pub fn retreat(&mut self, from: usize) -> Result<Transition> {
        self.ensure_current(from)?;
        if from == 0 {
            return Ok(stay(from, StayReason::Boundary));
        }

        self.refresh_variables();
        match self.has_navigate_previous(from, false) {
            Some(to) => self.switch_panel(from, to, Direction::Backward),
            None => Ok(stay(from, StayReason::NoReachablePanel)),
        }
    }

    /// Move past the current panel without validating it
    pub fn skip(&mut self, direction: Direction) -> Result<Transition> {
        self.ensure_started()?;
        let from = self.state.current;
        debug!("Skipping panel {} {:?}", from, direction);
        match direction {
            Direction::Forward => self.advance(from, false),
            Direction::Backward => self.retreat(from),
        }
    }

    pub fn lock_next(&mut self) {
        self.buttons.next.enabled = false;
        self.publish_buttons();
    }

    pub fn unlock_next(&mut self) {
        self.buttons.next.enabled = true;
        self.publish_buttons();
    }

    pub fn lock_previous(&mut self) {
        self.buttons.previous.enabled = false;
        self.publish_buttons();
    }

    pub fn unlock_previous(&mut self) {
        self.buttons.previous.enabled = true;
        self.publish_buttons();
    }

    pub fn step_counter(&self) -> StepCounter {
        let current = self.state.current;
        let total = self.registry.visible_count();
        let mut step = self.registry.visibility_number(current);
        if self.registry.is_visible(current) {
            step += 1;
        }
        StepCounter {
            step: step.max(1).min(total),
            total,
        }
    }

    pub fn snapshot(&self) -> PanelSnapshot {
        let index = self.state.current;
        let panel = self.registry.get(index);
        PanelSnapshot {
            index,
            id: panel.map(|p| p.metadata().id.clone()).unwrap_or_default(),
            state: self.state,
            buttons: self.buttons,
            step: self.step_counter(),
            help: panel.and_then(|p| p.metadata().help.clone()),
            focus: panel.and_then(|p| p.initial_focus()),
            variables: self.variables.snapshot(),
        }
    }

    fn switch_panel(&mut self, from: usize, to: usize, direction: Direction) -> Result<Transition> {
        if to == from || to >= self.registry.len() {
            return Err(WizardError::InvariantViolation(format!(
                "cannot switch from panel {} to panel {}",
                from, to
            )));
        }

        let mut locks = ButtonLocks::default();
        let mut requests = Vec::new();

        let (_, staged, raised) = self.run_hook(from, |p, ctx| p.deactivate(ctx))?;
        locks.merge(staged);
        requests.extend(raised);

        info!("Switching panel {} -> {}", from, to);
        self.state.current = to;
        self.state.direction = direction;

        let (_, staged, raised) = self.run_hook(to, |p, ctx| p.activate(ctx))?;
        locks.merge(staged);
        requests.extend(raised);

        self.enter(locks, requests, direction)?;
        Ok(Transition::Moved {
            from,
            to: self.state.current,
        })
    }

    /// Finish entering the current panel once its hooks ran
    fn enter(
        &mut self,
        locks: ButtonLocks,
        requests: Vec<PanelRequest>,
        direction: Direction,
    ) -> Result<()> {
        let current = self.state.current;
        self.state.can_go_next = self.has_navigate_next(current, false).is_some();
        self.state.can_go_previous = self.has_navigate_previous(current, false).is_some();
        self.buttons = self.derive_buttons();
        self.apply_locks(locks);

        let skip = requests.contains(&PanelRequest::Skip);
        self.queue(requests);

        if skip {
            // Nothing to publish if the skip actually moved on
            if self.skip(direction)?.moved() {
                return Ok(());
            }
            warn!("Panel {} asked to be skipped but nowhere to go", current);
        }

        let _ = self.events.send(WizardEvent::PanelSwitched(self.snapshot()));
        Ok(())
    }

    fn derive_buttons(&self) -> NavButtons {
        let current = self.state.current;
        let mut buttons = NavButtons::default();

        if self.registry.first_visible() == Some(current) {
            buttons.previous = Button::hidden();
            buttons.next = Button::active();
        } else if self.registry.is_last(current) {
            buttons.previous = Button::hidden();
            buttons.next = Button::hidden();
        } else {
            buttons.previous = match self.has_navigate_previous(current, true) {
                Some(_) => Button::active(),
                None => Button::hidden(),
            };
            buttons.next = match self.has_navigate_next(current, true) {
                Some(_) => Button::active(),
                None => Button::hidden(),
            };
        }

        buttons.quit = Button::active();
        buttons
    }

    fn run_hook<R, F>(
        &mut self,
        index: usize,
        hook: F,
    ) -> Result<(R, ButtonLocks, Vec<PanelRequest>)>
    where
        F: FnOnce(&mut dyn Panel, &mut PanelContext<'_>) -> R,
    {
        let panel = self.registry.get_mut(index).ok_or_else(|| {
            WizardError::InvariantViolation(format!("no panel at index {}", index))
        })?;
        let mut ctx = PanelContext::new(&mut self.variables);
        let out = hook(panel.as_mut(), &mut ctx);
        let (locks, requests) = ctx.into_parts();
        Ok((out, locks, requests))
    }

    fn apply_locks(&mut self, locks: ButtonLocks) {
        if locks != ButtonLocks::default() {
            self.buttons.apply(locks);
            self.publish_buttons();
        }
    }

    /// Keep everything except skips, which only mean something on activation
    fn queue(&mut self, requests: Vec<PanelRequest>) {
        for request in requests {
            if request != PanelRequest::Skip && !self.pending.contains(&request) {
                self.pending.push(request);
            }
        }
    }

    fn refresh_variables(&mut self) {
        self.variables.refresh_dynamic(self.rules.as_ref());
    }

    fn publish_buttons(&self) {
        let _ = self.events.send(WizardEvent::ButtonsChanged(self.buttons));
    }

    fn ensure_started(&self) -> Result<()> {
        if self.started {
            Ok(())
        } else {
            Err(WizardError::InvariantViolation(
                "wizard has not been started".to_string(),
            ))
        }
    }

    fn ensure_current(&self, index: usize) -> Result<()> {
        self.ensure_started()?;
        if index == self.state.current {
            Ok(())
        } else {
            Err(WizardError::InvariantViolation(format!(
                "panel {} is not current (current is {})",
                index, self.state.current
            )))
        }
    }
}
