use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::field::FieldPath;
use super::subject::EvaluationContext;
use super::value::Value;

/// Comparison operators available to pricing conditions.
///
/// The set is fixed. Names that do not match any operator load as
/// [`Operator::Unknown`], which never matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Contains,
    NotContains,
    Unknown(String),
}

impl Operator {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Operator::Eq => "equals",
            Operator::Neq => "not_equals",
            Operator::Gt => "greater_than",
            Operator::Gte => "greater_or_equal",
            Operator::Lt => "less_than",
            Operator::Lte => "less_or_equal",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::Contains => "contains",
            Operator::NotContains => "not_contains",
            Operator::Unknown(name) => name,
        }
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Operator::Unknown(_))
    }

    /// Map an operator name (or symbol) to an operator. Never fails.
    #[must_use]
    pub fn from_name(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "equals" | "eq" | "=" | "==" => Operator::Eq,
            "not_equals" | "neq" | "!=" | "<>" => Operator::Neq,
            "greater_than" | "gt" | ">" => Operator::Gt,
            "greater_or_equal" | "gte" | ">=" => Operator::Gte,
            "less_than" | "lt" | "<" => Operator::Lt,
            "less_or_equal" | "lte" | "<=" => Operator::Lte,
            "in" => Operator::In,
            "not_in" => Operator::NotIn,
            "contains" => Operator::Contains,
            "not_contains" => Operator::NotContains,
            _ => Operator::Unknown(s.to_owned()),
        }
    }
}

impl FromStr for Operator {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Operator::from_name(s))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Eq => write!(f, "=="),
            Operator::Neq => write!(f, "!="),
            Operator::Gt => write!(f, ">"),
            Operator::Gte => write!(f, ">="),
            Operator::Lt => write!(f, "<"),
            Operator::Lte => write!(f, "<="),
            Operator::In => write!(f, "in"),
            Operator::NotIn => write!(f, "not in"),
            Operator::Contains => write!(f, "contains"),
            Operator::NotContains => write!(f, "not contains"),
            Operator::Unknown(name) => write!(f, "?{name}"),
        }
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Operator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Operator::from_name(&name))
    }
}

/// User-facing condition as it arrives from a rule store or the builder API.
/// The field is still a raw dot path; see [`Condition`] for the compiled form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionRecord {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

impl fmt::Display for ConditionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.operator, self.value)
    }
}

/// A condition whose field path has been resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub(crate) field: FieldPath,
    pub(crate) operator: Operator,
    pub(crate) value: Value,
}

impl Condition {
    #[must_use]
    pub fn compile(record: &ConditionRecord) -> Self {
        Self {
            field: FieldPath::parse(&record.field),
            operator: record.operator.clone(),
            value: record.value.clone(),
        }
    }

    #[must_use]
    pub fn field(&self) -> &FieldPath {
        &self.field
    }

    #[must_use]
    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    /// Evaluate against a context. Never panics and never errors: unknown
    /// operators and type mismatches are non-matches.
    #[must_use]
    pub fn evaluate(&self, ctx: &EvaluationContext<'_>) -> bool {
        let resolved = self.field.resolve(ctx);
        compare(resolved.as_ref(), &self.operator, &self.value)
    }
}

/// Compare a resolved field value (or the absent sentinel) with a literal.
#[must_use]
pub fn compare(actual: Option<&Value>, op: &Operator, expected: &Value) -> bool {
    let Some(actual) = actual else {
        return matches!(op, Operator::Neq | Operator::NotIn);
    };
    match op {
        Operator::Eq => actual.loose_eq(expected),
        Operator::Neq => !actual.loose_eq(expected),
        Operator::Gt => actual.partial_cmp_value(expected) == Some(Ordering::Greater),
        Operator::Gte => matches!(
            actual.partial_cmp_value(expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Operator::Lt => actual.partial_cmp_value(expected) == Some(Ordering::Less),
        Operator::Lte => matches!(
            actual.partial_cmp_value(expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Operator::In => in_set(actual, expected),
        Operator::NotIn => !in_set(actual, expected),
        Operator::Contains => contains(actual, expected),
        Operator::NotContains => !contains(actual, expected),
        Operator::Unknown(_) => false,
    }
}

fn in_set(actual: &Value, set: &Value) -> bool {
    match set {
        Value::List(items) => items.iter().any(|item| actual.loose_eq(item)),
        single => actual.loose_eq(single),
    }
}

fn contains(actual: &Value, needle: &Value) -> bool {
    let needle = needle.coerce_to_string();
    match actual {
        Value::List(items) => items.iter().any(|item| item.coerce_to_string() == needle),
        other => other.coerce_to_string().contains(&needle),
    }
}

/// Intermediate builder for conditions.
/// Created by [`field()`]; a comparison method produces the [`ConditionRecord`].
#[derive(Debug, Clone)]
pub struct FieldCondition {
    path: String,
}

impl FieldCondition {
    fn with(self, operator: Operator, value: impl Into<Value>) -> ConditionRecord {
        ConditionRecord {
            field: self.path,
            operator,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn eq(self, value: impl Into<Value>) -> ConditionRecord {
        self.with(Operator::Eq, value)
    }

    #[must_use]
    pub fn neq(self, value: impl Into<Value>) -> ConditionRecord {
        self.with(Operator::Neq, value)
    }

    #[must_use]
    pub fn gt(self, value: impl Into<Value>) -> ConditionRecord {
        self.with(Operator::Gt, value)
    }

    #[must_use]
    pub fn gte(self, value: impl Into<Value>) -> ConditionRecord {
        self.with(Operator::Gte, value)
    }

    #[must_use]
    pub fn lt(self, value: impl Into<Value>) -> ConditionRecord {
        self.with(Operator::Lt, value)
    }

    #[must_use]
    pub fn lte(self, value: impl Into<Value>) -> ConditionRecord {
        self.with(Operator::Lte, value)
    }

    #[must_use]
    pub fn is_in(self, values: impl Into<Value>) -> ConditionRecord {
        self.with(Operator::In, values)
    }

    #[must_use]
    pub fn not_in(self, values: impl Into<Value>) -> ConditionRecord {
        self.with(Operator::NotIn, values)
    }

    #[must_use]
    pub fn contains(self, value: impl Into<Value>) -> ConditionRecord {
        self.with(Operator::Contains, value)
    }

    #[must_use]
    pub fn not_contains(self, value: impl Into<Value>) -> ConditionRecord {
        self.with(Operator::NotContains, value)
    }
}

#[must_use]
pub fn field(path: &str) -> FieldCondition {
    FieldCondition {
        path: path.to_owned(),
    }
}
