//! Serde helper module for XML-RPC `dateTime.iso8601` values.
//!
//! serde has no date/time type, so a field opts in with
//! `#[serde(with = "xmlrpc_serde::datetime")]`:
//!
//! ```rust
//! use chrono::NaiveDateTime;
//! use serde::{Deserialize, Serialize};
//! use xmlrpc_serde::{from_value, to_value, Value};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Build {
//!     id: i32,
//!     #[serde(with = "xmlrpc_serde::datetime")]
//!     finished: NaiveDateTime,
//! }
//!
//! let finished = NaiveDateTime::parse_from_str("1998-07-17 14:08:55", "%Y-%m-%d %H:%M:%S").unwrap();
//! let build = Build { id: 7, finished };
//!
//! let value = to_value(&build).unwrap();
//! assert_eq!(value.get("finished"), Some(&Value::DateTime(finished)));
//! assert_eq!(build, from_value(&value).unwrap());
//! ```
//!
//! # Wire format
//!
//! ISO-8601 basic date and extended time, `YYYYMMDDTHH:MM:SS`
//! (`19980717T14:08:55`). Sub-second precision is dropped when encoding and
//! no UTC offset is written; [`DateTime<Utc>`] is written as its UTC wall
//! clock. Decoding accepts exactly this format.
//!
//! The year is always four digits, so only years 0000 through 9999 can be
//! encoded; anything else is [`crate::Error::Unsupported`].
//!
//! # Supported types
//!
//! Any type implementing [`XmlRpcDateTime`]: [`NaiveDateTime`] and
//! [`DateTime<Utc>`].

use crate::grammar::DATE_TIME_FORMAT;
use chrono::{DateTime, Datelike, NaiveDateTime, Timelike, Utc};
use serde::de::{self, Unexpected};
use std::marker::PhantomData;

/// Newtype-struct name that tells this crate's serializer and deserializer
/// the inner string is a `dateTime.iso8601` value.
pub(crate) const DATETIME_TOKEN: &str = "$xmlrpc_serde::dateTime.iso8601";

// ── Sealed trait ──────────────────────────────────────────────────────────

mod private {
    pub trait Sealed {}
}

/// Marker trait for types that can be carried as `dateTime.iso8601`.
///
/// This trait is sealed.
pub trait XmlRpcDateTime: private::Sealed + Sized {
    /// Wall-clock time written on the wire.
    fn to_naive(&self) -> NaiveDateTime;
    /// Rebuild from a decoded wall-clock time.
    fn from_naive(naive: NaiveDateTime) -> Self;
}

impl private::Sealed for NaiveDateTime {}
impl private::Sealed for DateTime<Utc> {}

impl XmlRpcDateTime for NaiveDateTime {
    fn to_naive(&self) -> NaiveDateTime {
        *self
    }
    fn from_naive(naive: NaiveDateTime) -> Self {
        naive
    }
}

impl XmlRpcDateTime for DateTime<Utc> {
    fn to_naive(&self) -> NaiveDateTime {
        self.naive_utc()
    }
    fn from_naive(naive: NaiveDateTime) -> Self {
        naive.and_utc()
    }
}

/// Render `naive` in the wire format, dropping sub-second precision.
pub fn format(naive: &NaiveDateTime) -> String {
    naive.format(DATE_TIME_FORMAT).to_string()
}

/// Parse wire text. `None` unless `text` matches the format exactly.
pub fn parse(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, DATE_TIME_FORMAT).ok()
}

pub(crate) const YEAR_RANGE: &str = "years outside 0000-9999";

/// Whether `naive` fits the four-digit year of the wire format.
pub(crate) fn has_wire_form(naive: &NaiveDateTime) -> bool {
    (0..=9999).contains(&naive.year())
}

/// Drop sub-second precision, the same way encoding does.
pub fn truncate(naive: NaiveDateTime) -> NaiveDateTime {
    naive.with_nanosecond(0).unwrap_or(naive)
}

// ── serde `with` module functions ─────────────────────────────────────────

pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: XmlRpcDateTime,
    S: serde::Serializer,
{
    serializer.serialize_newtype_struct(DATETIME_TOKEN, &format(&value.to_naive()))
}

pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: XmlRpcDateTime,
    D: serde::Deserializer<'de>,
{
    deserializer.deserialize_newtype_struct(DATETIME_TOKEN, DateTimeVisitor::<T>(PhantomData))
}

struct DateTimeVisitor<T>(PhantomData<T>);

impl<'de, T: XmlRpcDateTime> de::Visitor<'de> for DateTimeVisitor<T> {
    type Value = T;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "a dateTime.iso8601 value")
    }

    /// Our deserializer hands over the formatted text as the newtype's
    /// content.
    fn visit_newtype_struct<D: serde::Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> Result<T, D::Error> {
        deserializer.deserialize_str(self)
    }

    // Fallback for self-describing formats that store the text directly.
    fn visit_str<E: de::Error>(self, v: &str) -> Result<T, E> {
        parse(v)
            .map(T::from_naive)
            .ok_or_else(|| E::invalid_value(Unexpected::Str(v), &self))
    }
}
