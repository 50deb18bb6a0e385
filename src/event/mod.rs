mod handler;
mod wizard;

pub use handler::{Event, EventHandler};
pub use wizard::{PromptKind, PromptRequest, WizardEvent};
