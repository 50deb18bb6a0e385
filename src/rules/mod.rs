mod condition;

pub use condition::Condition;

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::config::WizardConfig;
use crate::error::{Result, WizardError};
use crate::variables::VariableStore;

/// Resolves conditions and panel show predicates.
///
/// Implementations must be pure functions of their inputs so that a decision
/// taken after a variable refresh can be repeated with the same result.
pub trait RuleEvaluator: Send + Sync {
    /// Evaluate a named condition. Unknown ids fail with
    /// [`WizardError::ConditionNotFound`].
    fn evaluate(&self, condition_id: &str, variables: &VariableStore) -> Result<bool>;

    /// Whether the rule set allows showing the panel with this id
    fn panel_is_showable(&self, panel_id: &str, variables: &VariableStore) -> bool;
}

/// Table-driven rule evaluator built from the wizard configuration.
#[derive(Debug, Clone, Default)]
pub struct RulesEngine {
    conditions: HashMap<String, Condition>,
    panel_conditions: HashMap<String, Vec<String>>,
}

impl RulesEngine {
    pub fn new(
        conditions: HashMap<String, Condition>,
        panel_conditions: HashMap<String, Vec<String>>,
    ) -> Self {
        Self {
            conditions,
            panel_conditions,
        }
    }

    pub fn from_config(config: &WizardConfig) -> Self {
        Self::new(config.conditions.clone(), config.panel_conditions.clone())
    }

    pub fn has_condition(&self, condition_id: &str) -> bool {
        self.conditions.contains_key(condition_id)
    }

    fn eval(&self, id: &str, vars: &VariableStore, visiting: &mut Vec<String>) -> Result<bool> {
        if visiting.iter().any(|v| v == id) {
            return Err(WizardError::ConditionCycle(id.to_string()));
        }

        let condition = self
            .conditions
            .get(id)
            .ok_or_else(|| WizardError::ConditionNotFound(id.to_string()))?;

        visiting.push(id.to_string());
        let result = match condition {
            Condition::Variable { variable, value } => Ok(vars.get(variable) == Some(value.as_str())),
            Condition::Exists { variable } => Ok(vars.is_set(variable)),
            Condition::Not { condition } => self.eval(condition, vars, visiting).map(|v| !v),
            Condition::Ref { condition } => self.eval(condition, vars, visiting),
            Condition::And { conditions } => {
                let mut all = true;
                for c in conditions {
                    if !self.eval(c, vars, visiting)? {
                        all = false;
                        break;
                    }
                }
                Ok(all)
            }
            Condition::Or { conditions } => {
                let mut any = false;
                for c in conditions {
                    if self.eval(c, vars, visiting)? {
                        any = true;
                        break;
                    }
                }
                Ok(any)
            }
        };
        visiting.pop();
        result
    }
}

impl RuleEvaluator for RulesEngine {
    fn evaluate(&self, condition_id: &str, variables: &VariableStore) -> Result<bool> {
        self.eval(condition_id, variables, &mut Vec::new())
    }

    fn panel_is_showable(&self, panel_id: &str, variables: &VariableStore) -> bool {
        let Some(conditions) = self.panel_conditions.get(panel_id) else {
            return true;
        };

        for id in conditions {
            match self.evaluate(id, variables) {
                Ok(true) => {}
                Ok(false) => {
                    debug!("Panel {} hidden by condition {}", panel_id, id);
                    return false;
                }
                Err(e) => {
                    warn!("Panel {} treated as hidden: {}", panel_id, e);
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(variable: &str, value: &str) -> Condition {
        Condition::Variable {
            variable: variable.to_string(),
            value: value.to_string(),
        }
    }

    fn engine() -> RulesEngine {
        let mut conditions = HashMap::new();
        conditions.insert("docs".to_string(), var("DOCS", "yes"));
        conditions.insert("expert".to_string(), var("MODE", "expert"));
        conditions.insert(
            "no_docs".to_string(),
            Condition::Not {
                condition: "docs".to_string(),
            },
        );
        conditions.insert(
            "expert_docs".to_string(),
            Condition::And {
                conditions: vec!["docs".to_string(), "expert".to_string()],
            },
        );
        conditions.insert(
            "any".to_string(),
            Condition::Or {
                conditions: vec!["docs".to_string(), "expert".to_string()],
            },
        );
        conditions.insert(
            "alias".to_string(),
            Condition::Ref {
                condition: "expert".to_string(),
            },
        );
        conditions.insert(
            "loop_a".to_string(),
            Condition::Ref {
                condition: "loop_b".to_string(),
            },
        );
        conditions.insert(
            "loop_b".to_string(),
            Condition::Not {
                condition: "loop_a".to_string(),
            },
        );

        let mut panel_conditions = HashMap::new();
        panel_conditions.insert("docs_panel".to_string(), vec!["docs".to_string()]);
        panel_conditions.insert("broken_panel".to_string(), vec!["missing".to_string()]);

        RulesEngine::new(conditions, panel_conditions)
    }

    #[test]
    fn test_composite_conditions() {
        let rules = engine();
        let vars = VariableStore::from_values([("DOCS", "yes"), ("MODE", "basic")]);

        assert!(rules.evaluate("docs", &vars).unwrap());
        assert!(!rules.evaluate("no_docs", &vars).unwrap());
        assert!(!rules.evaluate("expert_docs", &vars).unwrap());
        assert!(rules.evaluate("any", &vars).unwrap());
        assert!(!rules.evaluate("alias", &vars).unwrap());
    }

    #[test]
    fn test_unknown_condition() {
        let rules = engine();
        let err = rules.evaluate("missing", &VariableStore::new()).unwrap_err();
        assert!(matches!(err, WizardError::ConditionNotFound(id) if id == "missing"));
    }

    #[test]
    fn test_cycle_is_reported() {
        let rules = engine();
        let err = rules.evaluate("loop_a", &VariableStore::new()).unwrap_err();
        assert!(matches!(err, WizardError::ConditionCycle(_)));
    }

    #[test]
    fn test_panel_is_showable() {
        let rules = engine();
        let mut vars = VariableStore::from_values([("DOCS", "no")]);

        assert!(rules.panel_is_showable("unlisted", &vars));
        assert!(!rules.panel_is_showable("docs_panel", &vars));
        // Lookup errors degrade to hidden instead of failing
        assert!(!rules.panel_is_showable("broken_panel", &vars));

        vars.set("DOCS", "yes");
        assert!(rules.panel_is_showable("docs_panel", &vars));
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let rules = engine();
        let vars = VariableStore::from_values([("DOCS", "yes"), ("MODE", "expert")]);
        let first = rules.evaluate("expert_docs", &vars).unwrap();
        let second = rules.evaluate("expert_docs", &vars).unwrap();
        assert_eq!(first, second);
        assert!(first);
    }
}
