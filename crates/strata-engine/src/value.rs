//! Dynamic values stored in properties and passed through method calls

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::instance::Instance;

/// A dynamically typed value
///
/// Scalars compare by value. Arrays, records and object instances compare by
/// identity, the same way the host object model would.
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value (reads of unknown or hidden properties)
    #[default]
    Undefined,
    /// Explicit null
    Null,
    /// Boolean
    Bool(bool),
    /// IEEE 754 double
    Number(f64),
    /// Immutable string
    String(Rc<str>),
    /// Mutable, shared array
    Array(Rc<RefCell<Vec<Value>>>),
    /// Mutable, shared key/value record
    Record(Rc<RefCell<BTreeMap<String, Value>>>),
    /// Object instance (public handle)
    Object(Instance),
}

impl Value {
    /// Create an array value
    pub fn array(elements: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(elements)))
    }

    /// Create a record value
    pub fn record<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        let map = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Value::Record(Rc::new(RefCell::new(map)))
    }

    /// Copy used for per-instance property defaults.
    ///
    /// Arrays and records are copied recursively so that no two instances share
    /// mutable default state. Instances are still shared by reference.
    pub fn fresh_copy(&self) -> Value {
        match self {
            Value::Array(items) => {
                let copied = items.borrow().iter().map(Value::fresh_copy).collect();
                Value::array(copied)
            }
            Value::Record(map) => {
                let copied = map
                    .borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.fresh_copy()))
                    .collect();
                Value::Record(Rc::new(RefCell::new(copied)))
            }
            other => other.clone(),
        }
    }

    /// Check for `Undefined`
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Check for `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the boolean payload
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the numeric payload
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the string payload
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the instance payload
    pub fn as_object(&self) -> Option<&Instance> {
        match self {
            Value::Object(inst) => Some(inst),
            _ => None,
        }
    }

    /// Truthiness as the host language defines it
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Record(_) | Value::Object(_) => true,
        }
    }

    /// Human-readable type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Record(_) => "record",
            Value::Object(_) => "object",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Record(a), Value::Record(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Array(items) => f.debug_list().entries(items.borrow().iter()).finish(),
            Value::Record(map) => f.debug_map().entries(map.borrow().iter()).finish(),
            Value::Object(inst) => write!(f, "{:?}", inst),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            other => write!(f, "{:?}", other),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

impl From<Instance> for Value {
    fn from(inst: Instance) -> Self {
        Value::Object(inst)
    }
}
