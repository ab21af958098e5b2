use serde::{de, ser};
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while encoding or decoding XML-RPC.
///
/// Decoding never panics: every unexpected shape ends up in one of these
/// variants. Failures inside arrays and structs are wrapped in
/// [`Error::Element`] / [`Error::Member`] so the path to the offending node
/// is preserved.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A custom error message from a user serde impl
    #[error("{0}")]
    Message(String),

    /// The wire node's tag or structure does not match the requested type
    #[error("expected {expected}, found {found}")]
    ShapeMismatch { expected: String, found: String },

    /// Scalar text that does not parse as its tag's textual form
    #[error("invalid {kind} text: {text:?}")]
    ScalarParse { kind: &'static str, text: String },

    /// A struct lacks a member the target type requires
    #[error("missing struct member `{0}`")]
    MissingMember(String),

    /// A struct carries the same member name more than once
    #[error("duplicate struct member `{0}`")]
    DuplicateMember(String),

    /// Decoding the array element at `index` failed
    #[error("array element {index}: {source}")]
    Element { index: usize, source: Box<Error> },

    /// Decoding the struct member `name` failed
    #[error("struct member `{name}`: {source}")]
    Member { name: String, source: Box<Error> },

    /// A `<fault>` branch that cannot be decoded as `{faultCode, faultString}`
    #[error("malformed fault: {0}")]
    MalformedFault(#[source] Box<Error>),

    /// The document is not well-formed XML
    #[error("malformed XML: {0}")]
    Xml(String),

    /// The document nests more elements than the reader accepts
    #[error("document nests more than {0} elements deep")]
    TooDeep(usize),

    /// XML-RPC integers are 32-bit
    #[error("integer {0} does not fit in an XML-RPC int")]
    IntegerOutOfRange(i128),

    /// Struct member names are strings on the wire
    #[error("struct member names must be strings")]
    KeyMustBeString,

    /// XML-RPC has no encoding for this value
    #[error("XML-RPC does not support {0}")]
    Unsupported(&'static str),

    /// An I/O error occurred during writing
    #[error("I/O error: {0}")]
    Io(String),
}

impl Error {
    pub(crate) fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Error::ShapeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub(crate) fn at_element(self, index: usize) -> Self {
        Error::Element {
            index,
            source: Box::new(self),
        }
    }

    pub(crate) fn at_member(self, name: &str) -> Self {
        Error::Member {
            name: name.to_string(),
            source: Box::new(self),
        }
    }

    /// Follow [`Error::Element`] / [`Error::Member`] wrappers down to the
    /// failure that started the chain.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Element { source, .. } | Error::Member { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<roxmltree::Error> for Error {
    fn from(err: roxmltree::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

impl ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }

    fn invalid_type(unexp: de::Unexpected<'_>, exp: &dyn de::Expected) -> Self {
        Error::mismatch(exp.to_string(), unexp.to_string())
    }

    fn invalid_value(unexp: de::Unexpected<'_>, exp: &dyn de::Expected) -> Self {
        Error::mismatch(exp.to_string(), unexp.to_string())
    }

    fn invalid_length(len: usize, exp: &dyn de::Expected) -> Self {
        Error::mismatch(exp.to_string(), format!("{} elements", len))
    }

    fn unknown_variant(variant: &str, expected: &'static [&'static str]) -> Self {
        Error::mismatch(
            format!("one of {:?}", expected),
            format!("variant `{}`", variant),
        )
    }

    fn unknown_field(field: &str, expected: &'static [&'static str]) -> Self {
        Error::mismatch(
            format!("members {:?}", expected),
            format!("member `{}`", field),
        )
    }

    fn missing_field(field: &'static str) -> Self {
        Error::MissingMember(field.to_string())
    }

    fn duplicate_field(field: &'static str) -> Self {
        Error::DuplicateMember(field.to_string())
    }
}
