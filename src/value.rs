//! Scalar values bound to world-state variables.

use std::fmt;
use std::hash::{Hash, Hasher};

use ordered_float::OrderedFloat;

/// A world-state variable value.
///
/// Numbers compare by value regardless of representation, so `Int(2)` equals
/// `Float(2.0)` and both hash identically. Booleans never equal numbers.
///
/// # Examples
///
/// ```
/// use goap_planner::Value;
///
/// assert_eq!(Value::from(2), Value::from(2.0));
/// assert_ne!(Value::from(true), Value::from(1));
/// assert_eq!(Value::from(3).as_f64(), Some(3.0));
/// ```
#[derive(Debug, Clone, Copy)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
}

/// Hashable numeric identity: integral floats collapse onto their integer.
#[derive(PartialEq, Hash)]
enum NumericKey {
    Int(i64),
    Float(OrderedFloat<f64>),
}

impl Value {
    /// Numeric view of the value, `None` for booleans.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Bool(_) => None,
            Value::Int(i) => Some(i as f64),
            Value::Float(f) => Some(f),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, Value::Bool(_))
    }

    /// Numeric sum. `Int + Int` stays integral; anything else widens to float.
    /// Returns `None` when either side is a boolean or integer addition
    /// overflows.
    pub fn checked_add(self, rhs: Value) -> Option<Value> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => a.checked_add(b).map(Value::Int),
            (a, b) => Some(Value::Float(a.as_f64()? + b.as_f64()?)),
        }
    }

    /// Numeric difference with the same widening rules as [`Value::checked_add`].
    pub fn checked_sub(self, rhs: Value) -> Option<Value> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => a.checked_sub(b).map(Value::Int),
            (a, b) => Some(Value::Float(a.as_f64()? - b.as_f64()?)),
        }
    }

    fn numeric_key(&self) -> Option<NumericKey> {
        match *self {
            Value::Bool(_) => None,
            Value::Int(i) => Some(NumericKey::Int(i)),
            Value::Float(f) => {
                let integral = f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64;
                if integral {
                    Some(NumericKey::Int(f as i64))
                } else {
                    Some(NumericKey::Float(OrderedFloat(f)))
                }
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (a, b) => match (a.numeric_key(), b.numeric_key()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Bool(b) => {
                0u8.hash(state);
                b.hash(state);
            }
            numeric => {
                1u8.hash(state);
                if let Some(key) = numeric.numeric_key() {
                    key.hash(state);
                }
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}
