use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WizardError {
    #[error("condition not found: {0}")]
    ConditionNotFound(String),

    #[error("condition '{0}' references itself")]
    ConditionCycle(String),

    #[error("no panel can be shown")]
    NoReachablePanel,

    #[error("install worker did not stop within {timeout:?}")]
    InterruptRefused { timeout: Duration },

    #[error("navigation invariant violated: {0}")]
    InvariantViolation(String),

    #[error("wizard controller is no longer running")]
    ControllerClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Terminal error: {0}")]
    Terminal(String),
}

pub type Result<T> = std::result::Result<T, WizardError>;
