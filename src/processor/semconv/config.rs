// SPDX-License-Identifier: Apache-2.0

//! Configuration for the semconv processor.

use std::collections::HashSet;

use serde::Deserialize;

use super::error::{Error, Result};
use crate::semconv::misc;

/// Top-level configuration for the processor
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Master switch; when false the processor is a pass-through
    pub enabled: bool,
    /// Enables cardinality tracking metrics
    pub benchmark: bool,
    /// Rules for span operation-name processing
    pub span_processing: SpanProcessingConfig,
}

/// Configuration for span operation-name processing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SpanProcessingConfig {
    /// Enables rule evaluation
    pub enabled: bool,
    /// Whether rule results enrich attributes only or also replace the span name
    pub mode: ProcessingMode,
    /// Attribute key for the generated operation name
    pub operation_name_attribute: String,
    /// Attribute key for the generated operation type
    pub operation_type_attribute: String,
    /// Keep the original span name as an attribute (enforce mode only)
    pub preserve_original_name: bool,
    /// Attribute key for the preserved original span name
    pub original_name_attribute: String,
    /// Rules, evaluated lowest priority first
    pub rules: Vec<RuleConfig>,
}

/// How rule results are applied to a span
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    /// Add the operation name as an attribute, leave the span name untouched
    #[default]
    Enrich,
    /// Add the attribute and replace the span name
    Enforce,
}

impl ProcessingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingMode::Enrich => "enrich",
            ProcessingMode::Enforce => "enforce",
        }
    }
}

/// A single rewrite rule
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Unique identifier, reported in telemetry
    pub id: String,
    /// Evaluation order; lower wins, insertion order breaks ties
    pub priority: i32,
    /// Span kinds the rule applies to; empty matches any kind
    pub span_kind: Vec<String>,
    /// Boolean expression that must hold for the rule to match
    pub condition: String,
    /// Value expression producing the operation name
    pub operation_name: String,
    /// Optional value expression producing the operation type
    pub operation_type: Option<String>,
}

impl Config {
    /// Fills defaults and checks the rule set. Must be called before rule
    /// compilation; all failures here are fatal startup errors.
    pub fn validate(&mut self) -> Result<()> {
        if self.span_processing.enabled {
            self.span_processing.validate()?;
        }
        Ok(())
    }
}

impl SpanProcessingConfig {
    pub fn validate(&mut self) -> Result<()> {
        if self.operation_name_attribute.is_empty() {
            self.operation_name_attribute = misc::OPERATION_NAME.to_string();
        }
        if self.operation_type_attribute.is_empty() {
            self.operation_type_attribute = misc::OPERATION_TYPE.to_string();
        }
        if self.original_name_attribute.is_empty() {
            self.original_name_attribute = misc::NAME_ORIGINAL.to_string();
        }

        if self.rules.is_empty() {
            return Err(Error::Config("at least one rule must be defined".into()));
        }

        let mut seen_ids = HashSet::new();
        for (idx, rule) in self.rules.iter().enumerate() {
            if rule.id.is_empty() {
                return Err(Error::Config(format!("rule at index {} has an empty id", idx)));
            }
            if !seen_ids.insert(rule.id.as_str()) {
                return Err(Error::Config(format!("duplicate rule id: {}", rule.id)));
            }
            if rule.condition.is_empty() {
                return Err(Error::Rule {
                    id: rule.id.clone(),
                    message: "empty condition".into(),
                });
            }
            if rule.operation_name.is_empty() {
                return Err(Error::Rule {
                    id: rule.id.clone(),
                    message: "empty operation_name".into(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_rule(id: &str) -> RuleConfig {
        RuleConfig {
            id: id.to_string(),
            condition: "true".to_string(),
            operation_name: r#""op""#.to_string(),
            ..Default::default()
        }
    }

    fn enabled_config(rules: Vec<RuleConfig>) -> Config {
        Config {
            enabled: true,
            span_processing: SpanProcessingConfig {
                enabled: true,
                rules,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn validate_fills_attribute_defaults() {
        let mut config = enabled_config(vec![minimal_rule("r1")]);
        config.validate().unwrap();

        let sp = &config.span_processing;
        assert_eq!(sp.mode, ProcessingMode::Enrich);
        assert_eq!(sp.operation_name_attribute, "operation.name");
        assert_eq!(sp.operation_type_attribute, "operation.type");
        assert_eq!(sp.original_name_attribute, "name.original");
    }

    #[test]
    fn validate_keeps_custom_attribute_names() {
        let mut config = enabled_config(vec![minimal_rule("r1")]);
        config.span_processing.operation_name_attribute = "op.name".to_string();
        config.validate().unwrap();
        assert_eq!(config.span_processing.operation_name_attribute, "op.name");
    }

    #[test]
    fn validate_rejects_empty_rule_list() {
        let mut config = enabled_config(vec![]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("at least one rule"));
    }

    #[test]
    fn validate_rejects_duplicate_and_empty_ids() {
        let mut config = enabled_config(vec![minimal_rule("dup"), minimal_rule("dup")]);
        assert!(config.validate().unwrap_err().to_string().contains("duplicate rule id"));

        let mut config = enabled_config(vec![minimal_rule("")]);
        assert!(config.validate().unwrap_err().to_string().contains("empty id"));
    }

    #[test]
    fn validate_rejects_empty_expressions() {
        let mut rule = minimal_rule("r1");
        rule.condition = String::new();
        let mut config = enabled_config(vec![rule]);
        assert!(config.validate().unwrap_err().to_string().contains("empty condition"));

        let mut rule = minimal_rule("r1");
        rule.operation_name = String::new();
        let mut config = enabled_config(vec![rule]);
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("empty operation_name"));
    }

    #[test]
    fn validate_skips_rule_checks_when_disabled() {
        let mut config = Config {
            enabled: true,
            ..Default::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn deserializes_from_json() {
        let config: Config = serde_json::from_str(
            r#"{
                "enabled": true,
                "benchmark": true,
                "span_processing": {
                    "enabled": true,
                    "mode": "enforce",
                    "preserve_original_name": true,
                    "rules": [
                        {
                            "id": "http",
                            "priority": 10,
                            "span_kind": ["server"],
                            "condition": "attributes[\"http.route\"] != nil",
                            "operation_name": "attributes[\"http.route\"]",
                            "operation_type": "\"http\""
                        }
                    ]
                }
            }"#,
        )
        .unwrap();

        assert!(config.enabled);
        assert!(config.benchmark);
        assert_eq!(config.span_processing.mode, ProcessingMode::Enforce);
        assert!(config.span_processing.preserve_original_name);
        assert_eq!(config.span_processing.rules.len(), 1);
        assert_eq!(config.span_processing.rules[0].priority, 10);
        assert_eq!(config.span_processing.rules[0].span_kind, vec!["server"]);
    }

    #[test]
    fn rejects_unknown_mode() {
        let result: std::result::Result<Config, _> = serde_json::from_str(
            r#"{"span_processing": {"mode": "rewrite"}}"#,
        );
        assert!(result.is_err());
    }
}
