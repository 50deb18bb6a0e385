use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::error::Result;
use crate::lifecycle::{LifecyclePolicy, RebootPolicy};
use crate::rules::Condition;
use crate::variables::{DynamicVariable, VariableStore};

const DEFAULT_CONFIG_PATH: &str = "/etc/installwiz/wizard.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    pub general: GeneralConfig,
    pub install: InstallConfig,
    pub messages: MessagesConfig,
    /// Initial variable values
    pub variables: BTreeMap<String, String>,
    pub dynamic_variables: Vec<DynamicVariable>,
    /// Named conditions referenced by panels and dynamic variables
    pub conditions: HashMap<String, Condition>,
    /// Panel id -> conditions that must all hold for the panel to be shown
    pub panel_conditions: HashMap<String, Vec<String>>,
    pub panels: Vec<PanelConfig>,
    /// Files copied by the install step
    pub files: Vec<FileEntry>,
}

impl Default for WizardConfig {
    fn default() -> Self {
        let mut variables = BTreeMap::new();
        variables.insert("APP_NAME".to_string(), "Demo Application".to_string());
        variables.insert("INSTALL_PATH".to_string(), "/tmp/installwiz-demo".to_string());
        variables.insert("INSTALL_DOCS".to_string(), "no".to_string());

        let mut conditions = HashMap::new();
        conditions.insert(
            "wants_docs".to_string(),
            Condition::Variable {
                variable: "INSTALL_DOCS".to_string(),
                value: "yes".to_string(),
            },
        );

        Self {
            general: GeneralConfig::default(),
            install: InstallConfig::default(),
            messages: MessagesConfig::default(),
            variables,
            dynamic_variables: vec![DynamicVariable {
                name: "DOC_PATH".to_string(),
                value: "${INSTALL_PATH}/doc".to_string(),
                condition: Some("wants_docs".to_string()),
            }],
            conditions,
            panel_conditions: HashMap::new(),
            panels: vec![
                PanelConfig::new("welcome", PanelKind::Info)
                    .with_title("Welcome")
                    .with_text("This wizard installs ${APP_NAME} on your system."),
                PanelConfig {
                    fields: vec![
                        FieldConfig::new("INSTALL_PATH", "Install path").required(),
                        FieldConfig::new("INSTALL_DOCS", "Install documentation (yes/no)"),
                    ],
                    ..PanelConfig::new("target", PanelKind::Input)
                        .with_title("Installation target")
                        .with_text("Choose where ${APP_NAME} should be installed.")
                },
                PanelConfig {
                    condition: Some("wants_docs".to_string()),
                    ..PanelConfig::new("docs", PanelKind::Info)
                        .with_title("Documentation")
                        .with_text("Documentation will be placed in ${DOC_PATH}.")
                },
                PanelConfig::new("install", PanelKind::Install)
                    .with_title("Installing")
                    .with_text("Copying files to ${INSTALL_PATH}."),
                PanelConfig::new("finish", PanelKind::Finish)
                    .with_title("Done")
                    .with_text("${APP_NAME} has been installed."),
            ],
            files: Vec::new(),
        }
    }
}

impl WizardConfig {
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: WizardConfig = toml::from_str(&content)?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Variable store seeded with the configured values and dynamic definitions
    pub fn variable_store(&self) -> VariableStore {
        VariableStore::from_values(self.variables.clone()).with_dynamic(self.dynamic_variables.clone())
    }

    pub fn panel(&self, id: &str) -> Option<&PanelConfig> {
        self.panels.iter().find(|p| p.id == id)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub title: String,
    /// Simulate the install step and skip the reboot
    pub dryrun: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            title: "Installer".to_string(),
            dryrun: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// The installed payload needs a reboot before it is usable
    pub reboot_required: bool,
    pub reboot_policy: RebootPolicy,
    /// Quit requests refused while the worker cannot be interrupted
    pub max_interrupt_attempts: u32,
    pub interrupt_timeout_secs: u64,
    /// Where the uninstall record is written
    pub uninstall_record: Option<PathBuf>,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            reboot_required: false,
            reboot_policy: RebootPolicy::default(),
            max_interrupt_attempts: 3,
            interrupt_timeout_secs: 40,
            uninstall_record: None,
        }
    }
}

impl InstallConfig {
    pub fn policy(&self) -> LifecyclePolicy {
        LifecyclePolicy {
            max_interrupt_attempts: self.max_interrupt_attempts,
            interrupt_timeout: Duration::from_secs(self.interrupt_timeout_secs),
        }
    }
}

/// Prompt texts, `${NAME}` references are substituted before display
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MessagesConfig {
    pub quit_title: String,
    pub quit_message: String,
    pub reboot_ask_title: String,
    pub reboot_ask_message: String,
    pub reboot_notice_title: String,
    pub reboot_notice_message: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            quit_title: "Quit".to_string(),
            quit_message: "The installation is not finished. Abort and remove installed files?"
                .to_string(),
            reboot_ask_title: "Reboot".to_string(),
            reboot_ask_message: "${APP_NAME} requires a reboot. Reboot now?".to_string(),
            reboot_notice_title: "Reboot required".to_string(),
            reboot_notice_message: "Please reboot to finish installing ${APP_NAME}.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelKind {
    /// Static text
    Info,
    /// Text fields bound to variables
    Input,
    /// Starts the install worker
    Install,
    /// Marks the installation as closable
    Finish,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PanelConfig {
    pub id: String,
    pub kind: PanelKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub condition: Option<String>,
    /// Counted in the step indicator
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub help: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
    /// Input panels ask to be skipped when every field already has a value
    #[serde(default)]
    pub skip_when_filled: bool,
}

impl PanelConfig {
    pub fn new(id: impl Into<String>, kind: PanelKind) -> Self {
        Self {
            id: id.into(),
            kind,
            title: String::new(),
            text: String::new(),
            condition: None,
            visible: true,
            help: None,
            fields: Vec::new(),
            skip_when_filled: false,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldConfig {
    pub variable: String,
    pub label: String,
    #[serde(default)]
    pub required: bool,
    /// Applied when the variable is blank, may reference other variables
    #[serde(default)]
    pub default: Option<String>,
    /// Masked input
    #[serde(default)]
    pub secret: bool,
}

impl FieldConfig {
    pub fn new(variable: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            label: label.into(),
            required: false,
            default: None,
            secret: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A file copied by the install worker. Both paths may reference variables.
#[derive(Debug, Clone, Deserialize)]
pub struct FileEntry {
    pub source: String,
    pub target: String,
}

fn default_true() -> bool {
    true
}
