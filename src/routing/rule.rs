//! Route rule and condition types.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::config::RouteConfig;

/// Part of the request a condition inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    Header,
    Query,
    /// Reserved; always matches.
    Body,
    /// Reserved; always matches.
    #[serde(alias = "sourceIP")]
    SourceIp,
    /// Reserved; always matches.
    #[serde(alias = "userAgent")]
    UserAgent,
}

/// Comparison applied to the inspected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    Contains,
    #[serde(alias = "startsWith")]
    StartsWith,
    #[serde(alias = "endsWith")]
    EndsWith,
    Regex,
}

/// A single request condition attached to a rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RouteCondition {
    #[serde(rename = "type")]
    pub kind: ConditionType,
    pub field: String,
    pub operator: ConditionOperator,
    pub value: String,
}

impl RouteCondition {
    pub fn new(
        kind: ConditionType,
        field: impl Into<String>,
        operator: ConditionOperator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn header(field: impl Into<String>, operator: ConditionOperator, value: impl Into<String>) -> Self {
        Self::new(ConditionType::Header, field, operator, value)
    }

    pub fn query(field: impl Into<String>, operator: ConditionOperator, value: impl Into<String>) -> Self {
        Self::new(ConditionType::Query, field, operator, value)
    }
}

/// A registered routing rule.
#[derive(Debug, Clone, Serialize)]
pub struct RouteRule {
    pub id: String,
    pub name: String,
    pub path_pattern: String,
    pub http_method: String,
    pub target_service_ids: Vec<String>,
    pub priority: i32,
    pub conditions: Vec<RouteCondition>,
    pub active: bool,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl RouteRule {
    pub fn from_config(id: String, config: &RouteConfig, created_at: SystemTime) -> Self {
        let name = if config.name.is_empty() { id.clone() } else { config.name.clone() };
        Self {
            id,
            name,
            path_pattern: config.path.clone(),
            http_method: config.method.clone(),
            target_service_ids: config.targets.clone(),
            priority: config.priority,
            conditions: config.conditions.clone(),
            active: config.active,
            created_at,
            updated_at: created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_aliases() {
        let c: RouteCondition = serde_json::from_value(serde_json::json!({
            "type": "sourceIP",
            "field": "",
            "operator": "startsWith",
            "value": "10."
        }))
        .unwrap();
        assert_eq!(c.kind, ConditionType::SourceIp);
        assert_eq!(c.operator, ConditionOperator::StartsWith);
    }

    #[test]
    fn test_rule_name_defaults_to_id() {
        let mut config = RouteConfig::new("", "/x", "GET", vec!["a".into()]);
        config.name.clear();
        let rule = RouteRule::from_config("generated".into(), &config, SystemTime::now());
        assert_eq!(rule.name, "generated");
        assert_eq!(rule.created_at, rule.updated_at);
    }
}
