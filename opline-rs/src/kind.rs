//! Argument types.
//!
//! A [`Kind`] decodes one raw token into a typed [`Value`], validates the
//! result and offers autocompletion candidates. Every node of a command tree
//! carries exactly one kind; the registry asks each child's kind whether it
//! accepts the next token.
//!
//! New argument types are added by implementing [`Kind`]:
//!
//! ```
//! use opline::kind::{Kind, KindError, Value};
//!
//! struct PortKind;
//!
//! impl Kind for PortKind {
//!     fn label(&self) -> &str {
//!         "port"
//!     }
//!
//!     fn transform(&self, raw: &str) -> Option<Value> {
//!         raw.parse::<u16>().ok().map(|p| Value::Integer(i64::from(p)))
//!     }
//!
//!     fn verify(&self, value: &Value) -> Result<bool, KindError> {
//!         Ok(matches!(value, Value::Integer(p) if (0..=65535).contains(p)))
//!     }
//! }
//!
//! let kind = PortKind;
//! let value = kind.transform("8080").unwrap();
//! assert!(kind.verify(&value).unwrap());
//! assert!(kind.transform("http").is_none());
//! ```

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

/// A decoded argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Number(f64),
    Integer(i64),
    Boolean(bool),
}

impl Value {
    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Integer(_) => "integer",
            Value::Boolean(_) => "boolean",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Number(n) => write!(f, "{}", n),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// Conversion from a decoded [`Value`] into a plain Rust type.
///
/// Used by [`Args::get`](crate::context::Args::get) for typed access inside
/// command implementations.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64()
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

/// Soft verification failure.
///
/// The resolver treats this exactly like `Ok(false)`: the child does not match.
#[derive(Debug, Error)]
pub enum KindError {
    #[error("{0}")]
    Custom(String),
}

/// Pluggable argument type.
///
/// Contract:
/// - `transform` never panics; a mismatch is `None`, which is distinct from
///   any valid falsy value such as `Boolean(false)`.
/// - `verify` answers `Ok(true)` only for values of this kind.
/// - `verify(transform(raw)) == Ok(true)` whenever `transform(raw)` is `Some`.
/// - an empty `suggestions()` means "no constrained candidates": completion
///   echoes the raw input back.
pub trait Kind: Send + Sync {
    /// Name of this kind as displayed to an operator.
    fn label(&self) -> &str;

    /// Decode a raw token.
    fn transform(&self, raw: &str) -> Option<Value>;

    /// Check that `value` belongs to this kind.
    fn verify(&self, value: &Value) -> Result<bool, KindError>;

    /// Autocompletion candidates, in display order.
    fn suggestions(&self) -> Vec<String> {
        Vec::new()
    }
}

// ============================================================================
// Built-in kinds
// ============================================================================

/// Any token, verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringKind;

impl Kind for StringKind {
    fn label(&self) -> &str {
        "string"
    }

    fn transform(&self, raw: &str) -> Option<Value> {
        Some(Value::String(raw.to_string()))
    }

    fn verify(&self, value: &Value) -> Result<bool, KindError> {
        Ok(matches!(value, Value::String(_)))
    }
}

/// Finite floating point numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberKind;

impl Kind for NumberKind {
    fn label(&self) -> &str {
        "number"
    }

    fn transform(&self, raw: &str) -> Option<Value> {
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Value::Number)
    }

    fn verify(&self, value: &Value) -> Result<bool, KindError> {
        Ok(matches!(value, Value::Number(n) if n.is_finite()))
    }
}

/// Signed 64-bit decimal integers.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerKind;

impl Kind for IntegerKind {
    fn label(&self) -> &str {
        "integer"
    }

    fn transform(&self, raw: &str) -> Option<Value> {
        raw.trim().parse::<i64>().ok().map(Value::Integer)
    }

    fn verify(&self, value: &Value) -> Result<bool, KindError> {
        Ok(matches!(value, Value::Integer(_)))
    }
}

const TRUE_TOKENS: [&str; 3] = ["1", "on", "true"];
const FALSE_TOKENS: [&str; 3] = ["0", "off", "false"];

/// `1`, `on`, `true` and `0`, `off`, `false`. Nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanKind;

impl Kind for BooleanKind {
    fn label(&self) -> &str {
        "boolean"
    }

    fn transform(&self, raw: &str) -> Option<Value> {
        if TRUE_TOKENS.contains(&raw) {
            Some(Value::Boolean(true))
        } else if FALSE_TOKENS.contains(&raw) {
            Some(Value::Boolean(false))
        } else {
            None
        }
    }

    fn verify(&self, value: &Value) -> Result<bool, KindError> {
        Ok(matches!(value, Value::Boolean(_)))
    }

    fn suggestions(&self) -> Vec<String> {
        TRUE_TOKENS
            .iter()
            .chain(FALSE_TOKENS.iter())
            .map(|s| s.to_string())
            .collect()
    }
}

/// Exactly one string. Subcommand names are literal kinds.
#[derive(Debug, Clone)]
pub struct LiteralKind {
    literal: String,
    label: String,
}

impl LiteralKind {
    pub fn new(literal: impl Into<String>) -> Self {
        let literal = literal.into();
        let label = format!("\"{}\"", literal);
        Self { literal, label }
    }

    pub fn literal(&self) -> &str {
        &self.literal
    }
}

impl Kind for LiteralKind {
    fn label(&self) -> &str {
        &self.label
    }

    fn transform(&self, raw: &str) -> Option<Value> {
        (raw == self.literal).then(|| Value::String(raw.to_string()))
    }

    fn verify(&self, value: &Value) -> Result<bool, KindError> {
        Ok(matches!(value, Value::String(s) if *s == self.literal))
    }

    fn suggestions(&self) -> Vec<String> {
        vec![self.literal.clone()]
    }
}

/// One string out of a fixed set.
#[derive(Debug, Clone)]
pub struct LiteralUnionKind {
    literals: Vec<String>,
    lookup: BTreeSet<String>,
    label: String,
}

impl LiteralUnionKind {
    pub fn new<I, S>(literals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let literals: Vec<String> = literals.into_iter().map(Into::into).collect();
        let label = format!(
            "[{}]",
            literals
                .iter()
                .map(|l| format!("\"{}\"", l))
                .collect::<Vec<_>>()
                .join(" | ")
        );
        Self {
            lookup: literals.iter().cloned().collect(),
            literals,
            label,
        }
    }

    pub fn literals(&self) -> &[String] {
        &self.literals
    }
}

impl Kind for LiteralUnionKind {
    fn label(&self) -> &str {
        &self.label
    }

    fn transform(&self, raw: &str) -> Option<Value> {
        self.lookup
            .contains(raw)
            .then(|| Value::String(raw.to_string()))
    }

    fn verify(&self, value: &Value) -> Result<bool, KindError> {
        Ok(matches!(value, Value::String(s) if self.lookup.contains(s)))
    }

    fn suggestions(&self) -> Vec<String> {
        self.literals.clone()
    }
}
