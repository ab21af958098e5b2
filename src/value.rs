//! In-memory XML-RPC wire nodes.
//!
//! A [`Value`] is what sits inside one `<value>` element. The serializer
//! produces it, the XML writer renders it, the XML reader builds it and the
//! deserializer consumes it.

use crate::grammar;
use chrono::NaiveDateTime;
use serde::de::Unexpected;

/// One XML-RPC value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `<int>` / `<i4>`
    Int(i32),
    /// `<double>`
    Double(f64),
    /// `<boolean>`
    Boolean(bool),
    /// `<string>`, or bare text directly inside `<value>`
    String(String),
    /// `<dateTime.iso8601>`, whole seconds
    DateTime(NaiveDateTime),
    /// `<base64>`
    Base64(Vec<u8>),
    /// `<nil/>`
    Nil,
    /// `<array><data>…</data></array>`
    Array(Vec<Value>),
    /// `<struct>…</struct>`; members in wire order, names not yet checked
    /// for uniqueness
    Struct(Vec<Member>),
}

/// One `<member>` of a `<struct>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub name: String,
    pub value: Value,
}

impl Member {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Member {
            name: name.into(),
            value,
        }
    }
}

impl Value {
    /// The tag this value is written with.
    pub fn tag(&self) -> &'static str {
        match self {
            Value::Int(_) => grammar::INT,
            Value::Double(_) => grammar::DOUBLE,
            Value::Boolean(_) => grammar::BOOLEAN,
            Value::String(_) => grammar::STRING,
            Value::DateTime(_) => grammar::DATE_TIME,
            Value::Base64(_) => grammar::BASE64,
            Value::Nil => grammar::NIL,
            Value::Array(_) => grammar::ARRAY,
            Value::Struct(_) => grammar::STRUCT,
        }
    }

    /// Look up a struct member by name. Returns the first match in wire
    /// order, or `None` for non-struct values.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(members) => members.iter().find(|m| m.name == name).map(|m| &m.value),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Describe this value for a serde `invalid_type` report.
    pub(crate) fn unexpected(&self) -> Unexpected<'_> {
        match self {
            Value::Int(v) => Unexpected::Signed(*v as i64),
            Value::Double(v) => Unexpected::Float(*v),
            Value::Boolean(v) => Unexpected::Bool(*v),
            Value::String(s) => Unexpected::Str(s),
            Value::DateTime(_) => Unexpected::Other("<dateTime.iso8601>"),
            Value::Base64(b) => Unexpected::Bytes(b),
            Value::Nil => Unexpected::Unit,
            Value::Array(_) => Unexpected::Seq,
            Value::Struct(_) => Unexpected::Map,
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<Vec<Member>> for Value {
    fn from(v: Vec<Member>) -> Self {
        Value::Struct(v)
    }
}
