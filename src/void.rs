//! The "no value" marker.
//!
//! [`Void`] is the only type that encodes to nothing: a request whose
//! parameter is `Void` carries an empty `<params/>`, and a response with an
//! empty `<params>` block decodes only into `Void`. Nested inside another
//! value it behaves like any unit struct and maps to `<nil/>`.

use crate::error::{Error, Result};
use serde::de::{self, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

pub(crate) const VOID_TOKEN: &str = "$xmlrpc_serde::Void";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Void;

impl Serialize for Void {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_unit_struct(VOID_TOKEN)
    }
}

impl<'de> Deserialize<'de> for Void {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_unit_struct(VOID_TOKEN, VoidVisitor)
    }
}

struct VoidVisitor;

impl<'de> Visitor<'de> for VoidVisitor {
    type Value = Void;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no value")
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Void, E> {
        Ok(Void)
    }
}

// ── EmptyParams ────────────────────────────────────────────────────────────

/// Deserializer standing in for a `<params>` block with no `<param>`.
/// Only [`Void`] accepts it.
pub(crate) struct EmptyParams;

impl EmptyParams {
    fn mismatch() -> Error {
        Error::mismatch("a single <param>", "empty <params>")
    }
}

impl<'de> de::Deserializer<'de> for EmptyParams {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Self::mismatch())
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        if name == VOID_TOKEN {
            visitor.visit_unit()
        } else {
            Err(Self::mismatch())
        }
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit newtype_struct seq tuple tuple_struct map
        struct enum identifier ignored_any
    }
}
