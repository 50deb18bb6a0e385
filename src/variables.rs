use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::rules::RuleEvaluator;

/// A variable whose value is recomputed from a template before every
/// navigation decision.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DynamicVariable {
    pub name: String,
    /// Template, `${NAME}` references are substituted from the store
    pub value: String,
    /// Only assign the value while this condition holds
    #[serde(default)]
    pub condition: Option<String>,
}

/// Name -> value mapping shared by every panel and the rule evaluator.
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    values: BTreeMap<String, String>,
    dynamic: Vec<DynamicVariable>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            dynamic: Vec::new(),
        }
    }

    pub fn with_dynamic(mut self, dynamic: Vec<DynamicVariable>) -> Self {
        self.dynamic = dynamic;
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// True when the variable exists and is not blank
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.trim().is_empty())
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.values.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.values.clone()
    }

    /// Recompute every dynamic variable, in declaration order.
    ///
    /// Later definitions see the values assigned by earlier ones. A definition
    /// whose condition is false or cannot be resolved keeps its previous value.
    pub fn refresh_dynamic(&mut self, rules: &dyn RuleEvaluator) {
        for idx in 0..self.dynamic.len() {
            let (name, value) = {
                let def = &self.dynamic[idx];
                if let Some(ref condition) = def.condition {
                    match rules.evaluate(condition, self) {
                        Ok(true) => {}
                        Ok(false) => continue,
                        Err(e) => {
                            warn!("Dynamic variable {} not refreshed: {}", def.name, e);
                            continue;
                        }
                    }
                }
                (def.name.clone(), self.substitute(&def.value))
            };
            debug!("Dynamic variable {} = {:?}", name, value);
            self.values.insert(name, value);
        }
    }

    /// Replace `${NAME}` references with their values. Unknown references and
    /// unterminated `${` sequences are left untouched.
    pub fn substitute(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find('}') {
                Some(end) => {
                    let name = &after[..end];
                    match self.values.get(name) {
                        Some(value) => out.push_str(value),
                        None => out.push_str(&rest[start..start + end + 3]),
                    }
                    rest = &after[end + 1..];
                }
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }

        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Condition, RulesEngine};
    use std::collections::HashMap;

    #[test]
    fn test_substitute() {
        let vars = VariableStore::from_values([("APP", "demo"), ("DIR", "/opt")]);

        assert_eq!(vars.substitute("${DIR}/${APP}/bin"), "/opt/demo/bin");
        assert_eq!(vars.substitute("no refs"), "no refs");
        assert_eq!(vars.substitute("${MISSING}/x"), "${MISSING}/x");
        assert_eq!(vars.substitute("tail ${DIR"), "tail ${DIR");
    }

    #[test]
    fn test_is_set_ignores_blank() {
        let vars = VariableStore::from_values([("A", "  "), ("B", "x")]);
        assert!(!vars.is_set("A"));
        assert!(vars.is_set("B"));
        assert!(!vars.is_set("C"));
    }

    #[test]
    fn test_refresh_dynamic_in_order() {
        let rules = RulesEngine::default();
        let mut vars = VariableStore::from_values([("INSTALL_PATH", "/opt/app")]).with_dynamic(vec![
            DynamicVariable {
                name: "BIN_DIR".to_string(),
                value: "${INSTALL_PATH}/bin".to_string(),
                condition: None,
            },
            DynamicVariable {
                name: "LAUNCHER".to_string(),
                value: "${BIN_DIR}/run".to_string(),
                condition: None,
            },
        ]);

        vars.refresh_dynamic(&rules);
        assert_eq!(vars.get("LAUNCHER"), Some("/opt/app/bin/run"));

        vars.set("INSTALL_PATH", "/usr/local/app");
        vars.refresh_dynamic(&rules);
        assert_eq!(vars.get("BIN_DIR"), Some("/usr/local/app/bin"));
    }

    #[test]
    fn test_refresh_dynamic_respects_condition() {
        let mut conditions = HashMap::new();
        conditions.insert(
            "docs".to_string(),
            Condition::Variable {
                variable: "WITH_DOCS".to_string(),
                value: "yes".to_string(),
            },
        );
        let rules = RulesEngine::new(conditions, HashMap::new());

        let mut vars = VariableStore::from_values([("WITH_DOCS", "no")]).with_dynamic(vec![
            DynamicVariable {
                name: "DOC_DIR".to_string(),
                value: "/usr/share/doc".to_string(),
                condition: Some("docs".to_string()),
            },
            DynamicVariable {
                name: "BROKEN".to_string(),
                value: "x".to_string(),
                condition: Some("nope".to_string()),
            },
        ]);

        vars.refresh_dynamic(&rules);
        assert_eq!(vars.get("DOC_DIR"), None);
        assert_eq!(vars.get("BROKEN"), None);

        vars.set("WITH_DOCS", "yes");
        vars.refresh_dynamic(&rules);
        assert_eq!(vars.get("DOC_DIR"), Some("/usr/share/doc"));
    }
}
