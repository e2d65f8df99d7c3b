//! Route matching logic.
//!
//! # Responsibilities
//! - Match HTTP method (case-insensitive)
//! - Match path pattern (exact, or segment-wise with `:param` segments)
//! - Evaluate header/query conditions
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Segment counts must be equal; there is no multi-segment wildcard
//! - Header names are case-insensitive, query keys and values are not
//! - Body, source IP and user-agent conditions are reserved and always match
//! - Regexes are compiled once when the rule is registered

use regex::Regex;
use std::collections::HashMap;

use crate::error::GatewayError;
use crate::routing::rule::{ConditionOperator, ConditionType, RouteCondition, RouteRule};

/// The parts of an inbound request routing looks at.
#[derive(Debug, Clone, Copy)]
pub struct RequestInfo<'a> {
    pub path: &'a str,
    pub method: &'a str,
    pub headers: &'a HashMap<String, String>,
    pub query: &'a HashMap<String, String>,
}

impl<'a> RequestInfo<'a> {
    pub fn new(
        path: &'a str,
        method: &'a str,
        headers: &'a HashMap<String, String>,
        query: &'a HashMap<String, String>,
    ) -> Self {
        Self {
            path,
            method,
            headers,
            query,
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&'a str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, req: &RequestInfo<'_>) -> bool;
}

/// Matches the HTTP method.
#[derive(Debug, Clone)]
pub struct MethodMatcher {
    method: String,
}

impl MethodMatcher {
    pub fn new(method: impl Into<String>) -> Self {
        Self { method: method.into() }
    }
}

impl Matcher for MethodMatcher {
    fn matches(&self, req: &RequestInfo<'_>) -> bool {
        req.method.eq_ignore_ascii_case(&self.method)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param,
}

/// Matches the request path against a pattern like `/users/:id/orders`.
#[derive(Debug, Clone)]
pub struct PathPatternMatcher {
    pattern: String,
    segments: Vec<Segment>,
}

impl PathPatternMatcher {
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let segments = pattern
            .split('/')
            .map(|s| match s.strip_prefix(':') {
                Some(_) => Segment::Param,
                None => Segment::Literal(s.to_string()),
            })
            .collect();
        Self { pattern, segments }
    }
}

impl Matcher for PathPatternMatcher {
    fn matches(&self, req: &RequestInfo<'_>) -> bool {
        if req.path == self.pattern {
            return true;
        }

        let parts: Vec<&str> = req.path.split('/').collect();
        if parts.len() != self.segments.len() {
            return false;
        }

        self.segments.iter().zip(parts).all(|(segment, part)| match segment {
            Segment::Param => true,
            Segment::Literal(lit) => lit == part,
        })
    }
}

#[derive(Debug, Clone)]
enum ValueTest {
    Equals(String),
    Contains(String),
    StartsWith(String),
    EndsWith(String),
    Regex(Regex),
}

impl ValueTest {
    fn test(&self, value: &str) -> bool {
        match self {
            ValueTest::Equals(v) => value == v,
            ValueTest::Contains(v) => value.contains(v.as_str()),
            ValueTest::StartsWith(v) => value.starts_with(v.as_str()),
            ValueTest::EndsWith(v) => value.ends_with(v.as_str()),
            ValueTest::Regex(re) => re.is_match(value),
        }
    }
}

/// A compiled [`RouteCondition`].
#[derive(Debug, Clone)]
pub struct ConditionMatcher {
    kind: ConditionType,
    field: String,
    test: ValueTest,
}

impl ConditionMatcher {
    pub fn compile(condition: &RouteCondition) -> Result<Self, GatewayError> {
        let value = condition.value.clone();
        let test = match condition.operator {
            ConditionOperator::Equals => ValueTest::Equals(value),
            ConditionOperator::Contains => ValueTest::Contains(value),
            ConditionOperator::StartsWith => ValueTest::StartsWith(value),
            ConditionOperator::EndsWith => ValueTest::EndsWith(value),
            ConditionOperator::Regex => {
                let re = Regex::new(&value).map_err(|e| GatewayError::InvalidCondition {
                    field: condition.field.clone(),
                    reason: e.to_string(),
                })?;
                ValueTest::Regex(re)
            }
        };
        Ok(Self {
            kind: condition.kind,
            field: condition.field.clone(),
            test,
        })
    }
}

impl Matcher for ConditionMatcher {
    fn matches(&self, req: &RequestInfo<'_>) -> bool {
        let value = match self.kind {
            ConditionType::Header => req.header(&self.field),
            ConditionType::Query => req.query.get(&self.field).map(String::as_str),
            ConditionType::Body | ConditionType::SourceIp | ConditionType::UserAgent => return true,
        };
        value.map(|v| self.test.test(v)).unwrap_or(false)
    }
}

/// Combines multiple matchers with AND semantics.
#[derive(Debug)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }

    /// Build the full matcher for a rule: method, path, then conditions in order.
    pub fn for_rule(rule: &RouteRule) -> Result<Self, GatewayError> {
        let mut matchers: Vec<Box<dyn Matcher>> = vec![
            Box::new(MethodMatcher::new(rule.http_method.clone())),
            Box::new(PathPatternMatcher::new(rule.path_pattern.clone())),
        ];
        for condition in &rule.conditions {
            matchers.push(Box::new(ConditionMatcher::compile(condition)?));
        }
        Ok(Self::new(matchers))
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, req: &RequestInfo<'_>) -> bool {
        self.matchers.iter().all(|m| m.matches(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_method_matcher() {
        let empty = HashMap::new();
        let matcher = MethodMatcher::new("POST");
        assert!(matcher.matches(&RequestInfo::new("/", "post", &empty, &empty)));
        assert!(!matcher.matches(&RequestInfo::new("/", "GET", &empty, &empty)));
    }

    #[test]
    fn test_path_matcher() {
        let empty = HashMap::new();
        let matcher = PathPatternMatcher::new("/users/:id/orders");
        let req = |p: &'static str| RequestInfo::new(p, "GET", &empty, &empty);

        assert!(matcher.matches(&req("/users/42/orders")));
        assert!(!matcher.matches(&req("/users/42")));
        assert!(!matcher.matches(&req("/users/42/orders/7")));
        assert!(!matcher.matches(&req("/accounts/42/orders")));
    }

    #[test]
    fn test_star_is_not_a_wildcard() {
        let empty = HashMap::new();
        let matcher = PathPatternMatcher::new("/v1/*");
        assert!(!matcher.matches(&RequestInfo::new("/v1/ai/chat", "POST", &empty, &empty)));
        assert!(!matcher.matches(&RequestInfo::new("/v1/ai", "POST", &empty, &empty)));
        assert!(matcher.matches(&RequestInfo::new("/v1/*", "POST", &empty, &empty)));
    }

    #[test]
    fn test_header_condition_case_insensitive_name() {
        let headers = map(&[("X-Tenant", "acme-eu")]);
        let empty = HashMap::new();
        let req = RequestInfo::new("/", "GET", &headers, &empty);

        let cond = |op, v: &str| ConditionMatcher::compile(&RouteCondition::header("x-tenant", op, v)).unwrap();
        assert!(cond(ConditionOperator::Equals, "acme-eu").matches(&req));
        assert!(!cond(ConditionOperator::Equals, "ACME-EU").matches(&req));
        assert!(cond(ConditionOperator::Contains, "me-e").matches(&req));
        assert!(cond(ConditionOperator::StartsWith, "acme").matches(&req));
        assert!(cond(ConditionOperator::EndsWith, "-eu").matches(&req));
        assert!(cond(ConditionOperator::Regex, "^acme-(eu|us)$").matches(&req));
        assert!(!cond(ConditionOperator::Regex, "^acme-us$").matches(&req));
    }

    #[test]
    fn test_query_condition_and_missing_field() {
        let empty = HashMap::new();
        let query = map(&[("version", "2")]);
        let req = RequestInfo::new("/", "GET", &empty, &query);

        let present = ConditionMatcher::compile(&RouteCondition::query("version", ConditionOperator::Equals, "2")).unwrap();
        let missing = ConditionMatcher::compile(&RouteCondition::query("region", ConditionOperator::Equals, "eu")).unwrap();
        assert!(present.matches(&req));
        assert!(!missing.matches(&req));
    }

    #[test]
    fn test_reserved_conditions_always_match() {
        let empty = HashMap::new();
        let req = RequestInfo::new("/", "GET", &empty, &empty);
        for kind in [ConditionType::Body, ConditionType::SourceIp, ConditionType::UserAgent] {
            let cond = RouteCondition::new(kind, "anything", ConditionOperator::Equals, "never");
            assert!(ConditionMatcher::compile(&cond).unwrap().matches(&req));
        }
    }

    #[test]
    fn test_invalid_regex() {
        let cond = RouteCondition::header("x", ConditionOperator::Regex, "(unclosed");
        assert!(matches!(
            ConditionMatcher::compile(&cond),
            Err(GatewayError::InvalidCondition { .. })
        ));
    }
}
