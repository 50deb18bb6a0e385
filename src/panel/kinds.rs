use tracing::{debug, info};

use super::{FocusTarget, Panel, PanelContext, PanelMetadata, PanelRegistry, PanelRequest};
use crate::config::{FieldConfig, PanelConfig, PanelKind, WizardConfig};

fn metadata_from(config: &PanelConfig) -> PanelMetadata {
    PanelMetadata {
        id: config.id.clone(),
        condition: config.condition.clone(),
        visible: config.visible,
        help: config.help.clone(),
    }
}

/// Build the panel sequence described by the configuration
pub fn build_registry(config: &WizardConfig) -> PanelRegistry {
    let mut registry = PanelRegistry::default();
    for panel in &config.panels {
        let boxed: Box<dyn Panel> = match panel.kind {
            PanelKind::Info => Box::new(InfoPanel::new(metadata_from(panel))),
            PanelKind::Input => Box::new(
                InputPanel::new(metadata_from(panel), panel.fields.clone())
                    .skip_when_filled(panel.skip_when_filled),
            ),
            PanelKind::Install => Box::new(InstallPanel::new(metadata_from(panel))),
            PanelKind::Finish => Box::new(FinishPanel::new(metadata_from(panel))),
        };
        registry.push(boxed);
    }
    debug!("Built panel registry: {:?}", registry);
    registry
}

/// Text only, always valid
pub struct InfoPanel {
    metadata: PanelMetadata,
}

impl InfoPanel {
    pub fn new(metadata: PanelMetadata) -> Self {
        Self { metadata }
    }
}

impl Panel for InfoPanel {
    fn metadata(&self) -> &PanelMetadata {
        &self.metadata
    }
}

/// Fields bound to variables.
///
/// The front end writes field contents straight into the variable store; the
/// panel normalizes them before validation and refuses to continue while a
/// required field is blank.
pub struct InputPanel {
    metadata: PanelMetadata,
    fields: Vec<FieldConfig>,
    skip_when_filled: bool,
    missing: Vec<String>,
}

impl InputPanel {
    pub fn new(metadata: PanelMetadata, fields: Vec<FieldConfig>) -> Self {
        Self {
            metadata,
            fields,
            skip_when_filled: false,
            missing: Vec::new(),
        }
    }

    pub fn skip_when_filled(mut self, skip: bool) -> Self {
        self.skip_when_filled = skip;
        self
    }

    /// Labels of the required fields that failed the last validation
    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    fn apply_defaults(&self, ctx: &mut PanelContext<'_>) {
        for field in &self.fields {
            if ctx.variables.is_set(&field.variable) {
                continue;
            }
            if let Some(ref default) = field.default {
                let value = ctx.variables.substitute(default);
                ctx.variables.set(field.variable.clone(), value);
            }
        }
    }
}

impl Panel for InputPanel {
    fn metadata(&self) -> &PanelMetadata {
        &self.metadata
    }

    fn activate(&mut self, ctx: &mut PanelContext<'_>) {
        self.apply_defaults(ctx);
        self.missing.clear();

        if self.skip_when_filled && self.fields.iter().all(|f| ctx.variables.is_set(&f.variable)) {
            info!("All fields of {} already set, skipping", self.metadata.id);
            ctx.request_skip();
        }
    }

    fn execute_pre_validation(&mut self, ctx: &mut PanelContext<'_>) {
        for field in &self.fields {
            let trimmed = ctx.variables.get(&field.variable).map(|v| v.trim().to_string());
            if let Some(value) = trimmed {
                ctx.variables.set(field.variable.clone(), value);
            }
        }
        self.apply_defaults(ctx);
    }

    fn validate(&mut self, ctx: &mut PanelContext<'_>) -> bool {
        self.missing = self
            .fields
            .iter()
            .filter(|f| f.required && !ctx.variables.is_set(&f.variable))
            .map(|f| f.label.clone())
            .collect();

        if !self.missing.is_empty() {
            info!("Panel {} missing required fields: {:?}", self.metadata.id, self.missing);
        }
        self.missing.is_empty()
    }

    fn initial_focus(&self) -> Option<FocusTarget> {
        self.fields.first().map(|f| FocusTarget(f.variable.clone()))
    }
}

/// Starts the install worker on first activation and keeps the user here
/// until the worker reports success.
pub struct InstallPanel {
    metadata: PanelMetadata,
    started: bool,
}

impl InstallPanel {
    pub fn new(metadata: PanelMetadata) -> Self {
        Self {
            metadata,
            started: false,
        }
    }
}

impl Panel for InstallPanel {
    fn metadata(&self) -> &PanelMetadata {
        &self.metadata
    }

    fn activate(&mut self, ctx: &mut PanelContext<'_>) {
        // Going back past a running or finished install is never allowed
        ctx.lock_previous();

        if !self.started {
            self.started = true;
            ctx.lock_next();
            ctx.request(PanelRequest::StartInstall);
        }
    }
}

pub struct FinishPanel {
    metadata: PanelMetadata,
}

impl FinishPanel {
    pub fn new(metadata: PanelMetadata) -> Self {
        Self { metadata }
    }
}

impl Panel for FinishPanel {
    fn metadata(&self) -> &PanelMetadata {
        &self.metadata
    }

    fn activate(&mut self, ctx: &mut PanelContext<'_>) {
        ctx.request(PanelRequest::MarkClosable);
    }
}
