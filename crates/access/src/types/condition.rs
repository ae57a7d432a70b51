//! Search conditions and comparison operators.
//!
//! A [`Condition`] is the caller-facing triple `(property, operator, value)`
//! where both the property name and the operator may be omitted. Expansion
//! turns it into an [`ExpandedCondition`] with every field present.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use regex::Regex;
use serde_json::{Number, Value};

use crate::error::{ConditionError, OperatorError, OperatorResult};

/// Signature of a backend-specific comparison predicate.
///
/// The first argument is the actual property value, the second the value
/// given in the condition.
pub type Predicate = dyn Fn(&Value, &Value) -> OperatorResult<bool> + Send + Sync;

/// A named, backend-specific comparison operator.
#[derive(Clone)]
pub struct CustomOperator {
    name: String,
    predicate: Arc<Predicate>,
}

impl CustomOperator {
    /// Creates a custom operator from a name and a predicate.
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value, &Value) -> OperatorResult<bool> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Returns the operator name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for CustomOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomOperator")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for CustomOperator {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.predicate, &other.predicate)
    }
}

/// Binary predicates over `(actual, expected)`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Operator {
    /// `=` - equality; numbers compare numerically.
    #[default]
    Eq,
    /// `!=` - inequality.
    Ne,
    /// `>` - greater than.
    Gt,
    /// `>=` - greater than or equal.
    Ge,
    /// `<` - less than.
    Lt,
    /// `<=` - less than or equal.
    Le,
    /// `~=` - the actual string matches the expected regular expression.
    Matches,
    /// `~!=` - the actual string does not match the expected regular expression.
    NotMatches,
    /// Backend-specific extension.
    Custom(CustomOperator),
}

/// Operator symbols, longest first so that prefixes never shadow longer symbols.
const SYMBOLS: &[&str] = &["~!=", "~=", "!=", ">=", "<=", "=", ">", "<"];

impl Operator {
    /// Wraps a predicate as a custom operator.
    pub fn custom<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value, &Value) -> OperatorResult<bool> + Send + Sync + 'static,
    {
        Operator::Custom(CustomOperator::new(name, predicate))
    }

    /// Returns the built-in operator for a request symbol.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(Operator::Eq),
            "!=" => Some(Operator::Ne),
            ">" => Some(Operator::Gt),
            ">=" => Some(Operator::Ge),
            "<" => Some(Operator::Lt),
            "<=" => Some(Operator::Le),
            "~=" => Some(Operator::Matches),
            "~!=" => Some(Operator::NotMatches),
            _ => None,
        }
    }

    /// Returns the request symbol (or the custom operator name).
    pub fn symbol(&self) -> &str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Matches => "~=",
            Operator::NotMatches => "~!=",
            Operator::Custom(op) => op.name(),
        }
    }

    /// Applies the operator to an actual property value and an expected value.
    ///
    /// Errors are returned as-is from the comparison; they are never turned
    /// into a non-match.
    pub fn evaluate(&self, actual: &Value, expected: &Value) -> OperatorResult<bool> {
        match self {
            Operator::Eq => Ok(values_equal(actual, expected)),
            Operator::Ne => Ok(!values_equal(actual, expected)),
            Operator::Gt => self.order(actual, expected).map(Ordering::is_gt),
            Operator::Ge => self.order(actual, expected).map(Ordering::is_ge),
            Operator::Lt => self.order(actual, expected).map(Ordering::is_lt),
            Operator::Le => self.order(actual, expected).map(Ordering::is_le),
            Operator::Matches => self.pattern_match(actual, expected),
            Operator::NotMatches => self.pattern_match(actual, expected).map(|m| !m),
            Operator::Custom(op) => (op.predicate)(actual, expected),
        }
    }

    fn order(&self, actual: &Value, expected: &Value) -> OperatorResult<Ordering> {
        let ordering = match (actual, expected) {
            (Value::Number(a), Value::Number(b)) => compare_numbers(a, b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => None,
        };
        ordering.ok_or_else(|| self.incomparable(actual, expected))
    }

    fn pattern_match(&self, actual: &Value, expected: &Value) -> OperatorResult<bool> {
        let (Value::String(text), Value::String(pattern)) = (actual, expected) else {
            return Err(self.incomparable(actual, expected));
        };
        let regex = Regex::new(pattern).map_err(|e| OperatorError::InvalidPattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        Ok(regex.is_match(text))
    }

    fn incomparable(&self, actual: &Value, expected: &Value) -> OperatorError {
        OperatorError::Incomparable {
            operator: self.symbol().to_string(),
            actual: type_name(actual).to_string(),
            expected: type_name(expected).to_string(),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::from_symbol(s).ok_or_else(|| format!("unknown operator: {}", s))
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y) == Some(Ordering::Equal),
        _ => a == b,
    }
}

fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return Some(x.cmp(&y));
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return Some(x.cmp(&y));
    }
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A search condition as supplied by the caller.
///
/// An omitted property name is filled in from the access point's positional
/// property names; an omitted operator defaults to [`Operator::Eq`].
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// The public property name, if given.
    pub property: Option<String>,
    /// The operator, if given.
    pub operator: Option<Operator>,
    /// The value compared against.
    pub value: Value,
}

impl Condition {
    /// Creates a condition from its optional parts.
    pub fn from_parts(
        property: Option<String>,
        operator: Option<Operator>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            property,
            operator,
            value: value.into(),
        }
    }

    /// Creates a fully specified condition.
    pub fn new(property: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self::from_parts(Some(property.into()), Some(operator), value)
    }

    /// Creates a condition with a property name and the default operator.
    pub fn named(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::from_parts(Some(property.into()), None, value)
    }

    /// Creates a condition with neither property name nor operator.
    pub fn value(value: impl Into<Value>) -> Self {
        Self::from_parts(None, None, value)
    }

    /// Sets the operator.
    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.operator = Some(operator);
        self
    }

    /// Returns true if both property name and operator are present.
    pub fn is_fully_specified(&self) -> bool {
        self.property.is_some() && self.operator.is_some()
    }
}

impl FromStr for Condition {
    type Err = ConditionError;

    /// Parses `name<op>value`, `<op>value` or a bare `value`.
    ///
    /// The value is read as JSON when it is valid JSON and as a plain string
    /// otherwise, so `year>=1990` compares numbers and `artist=Nina` strings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let request = s.trim();
        let split = request.char_indices().find_map(|(index, _)| {
            SYMBOLS
                .iter()
                .find(|symbol| request[index..].starts_with(**symbol))
                .and_then(|symbol| Some((index, *symbol, Operator::from_symbol(symbol)?)))
        });

        let Some((index, symbol, operator)) = split else {
            return Ok(Condition::value(parse_value(request)));
        };

        let name = request[..index].trim();
        let value = parse_value(request[index + symbol.len()..].trim());
        if name.chars().any(char::is_whitespace) {
            return Err(ConditionError::InvalidRequest {
                request: s.to_string(),
                message: format!("property name '{}' contains whitespace", name),
            });
        }

        let property = (!name.is_empty()).then(|| name.to_string());
        Ok(Condition::from_parts(property, Some(operator), value))
    }
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Parses a `/`-separated request such as `artist=Nina/year>=1990/3`.
///
/// Empty segments are ignored.
pub fn parse_request(request: &str) -> Result<Vec<Condition>, ConditionError> {
    request
        .split('/')
        .filter(|part| !part.trim().is_empty())
        .map(str::parse)
        .collect()
}

/// A condition with every field present, as produced by expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedCondition {
    /// Property name (public or, after partitioning, storage-native).
    pub property: String,
    /// The operator.
    pub operator: Operator,
    /// The value compared against.
    pub value: Value,
}

impl ExpandedCondition {
    /// Creates an expanded condition.
    pub fn new(property: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            property: property.into(),
            operator,
            value: value.into(),
        }
    }

    /// Evaluates the condition against an actual property value.
    pub fn matches(&self, actual: &Value) -> OperatorResult<bool> {
        self.operator.evaluate(actual, &self.value)
    }

    /// Returns the same condition under another property name.
    pub fn renamed(self, property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            ..self
        }
    }
}

impl From<ExpandedCondition> for Condition {
    fn from(condition: ExpandedCondition) -> Self {
        Condition::new(condition.property, condition.operator, condition.value)
    }
}

impl fmt::Display for ExpandedCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.property, self.operator, self.value)
    }
}
