use serde::Deserialize;

/// A named boolean predicate over the variable store.
///
/// Composite variants refer to other conditions by id, so a rule set is a
/// flat table that can be declared in any order.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// Variable equals the given value
    Variable { variable: String, value: String },
    /// Variable is present and not blank
    Exists { variable: String },
    Not { condition: String },
    And { conditions: Vec<String> },
    Or { conditions: Vec<String> },
    /// Alias of another condition
    Ref { condition: String },
}
