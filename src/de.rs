//! XML-RPC Deserializer

use crate::datetime::{self, DATETIME_TOKEN};
use crate::error::{Error, Result};
use crate::grammar::positional_name;
use crate::value::{Member, Value};
use serde::de::value::{BorrowedStrDeserializer, StringDeserializer};
use serde::de::{
    self, Deserialize, DeserializeSeed, EnumAccess, IntoDeserializer, MapAccess, SeqAccess,
    VariantAccess, Visitor,
};
use std::collections::HashMap;

/// Deserialize a `T` from a [`Value`] tree.
///
/// Strings and base64 payloads may be borrowed from `value`.
pub fn from_value<'de, T: Deserialize<'de>>(value: &'de Value) -> Result<T> {
    T::deserialize(Deserializer::new(value))
}

/// The XML-RPC deserializer. Walks a borrowed [`Value`] tree.
#[derive(Debug, Clone, Copy)]
pub struct Deserializer<'de> {
    value: &'de Value,
}

impl<'de> Deserializer<'de> {
    pub fn new(value: &'de Value) -> Self {
        Deserializer { value }
    }

    fn invalid_type(&self, exp: &dyn de::Expected) -> Error {
        de::Error::invalid_type(self.value.unexpected(), exp)
    }

    fn members(&self, exp: &dyn de::Expected) -> Result<&'de [Member]> {
        match self.value {
            Value::Struct(members) => Ok(members.as_slice()),
            _ => Err(self.invalid_type(exp)),
        }
    }
}

/// Index struct members by name. Wire order is irrelevant from here on;
/// repeated names are rejected.
fn index_members(members: &[Member]) -> Result<HashMap<&str, &Value>> {
    let mut index = HashMap::with_capacity(members.len());
    for member in members {
        if index.insert(member.name.as_str(), &member.value).is_some() {
            return Err(Error::DuplicateMember(member.name.clone()));
        }
    }
    Ok(index)
}

// ── Main Deserializer impl ─────────────────────────────────────────────────

impl<'de> de::Deserializer<'de> for Deserializer<'de> {
    type Error = Error;

    /// XML-RPC is self-describing: dispatch on the wire tag.
    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Int(v) => visitor.visit_i32(*v),
            Value::Double(v) => visitor.visit_f64(*v),
            Value::Boolean(v) => visitor.visit_bool(*v),
            Value::String(s) => visitor.visit_borrowed_str(s),
            Value::DateTime(dt) => visitor.visit_string(datetime::format(dt)),
            Value::Base64(b) => visitor.visit_borrowed_bytes(b),
            Value::Nil => visitor.visit_unit(),
            Value::Array(items) => visitor.visit_seq(ArrayAccess::new(items)),
            Value::Struct(members) => {
                index_members(members)?;
                let entries = members
                    .iter()
                    .map(|m| (m.name.as_str(), &m.value))
                    .collect();
                visitor.visit_map(MemberAccess::new(entries))
            }
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Boolean(v) => visitor.visit_bool(*v),
            _ => Err(self.invalid_type(&visitor)),
        }
    }

    fn deserialize_i8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_i32(visitor)
    }
    fn deserialize_i16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_i32(visitor)
    }
    /// Every integer target reads `<int>`; serde's primitive visitors reject
    /// values outside the target's range.
    fn deserialize_i32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Int(v) => visitor.visit_i32(*v),
            _ => Err(self.invalid_type(&visitor)),
        }
    }
    fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_i32(visitor)
    }
    fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_i32(visitor)
    }
    fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_i32(visitor)
    }
    fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_i32(visitor)
    }
    fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_i32(visitor)
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_f64(visitor)
    }
    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Double(v) => visitor.visit_f64(*v),
            _ => Err(self.invalid_type(&visitor)),
        }
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::String(s) => visitor.visit_borrowed_str(s),
            _ => Err(self.invalid_type(&visitor)),
        }
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Base64(b) => visitor.visit_borrowed_bytes(b),
            _ => Err(self.invalid_type(&visitor)),
        }
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_bytes(visitor)
    }

    /// `<nil/>` is `None`; anything else must decode as the inner type.
    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Nil => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Nil => visitor.visit_unit(),
            _ => Err(self.invalid_type(&visitor)),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        if name != DATETIME_TOKEN {
            return visitor.visit_newtype_struct(self);
        }
        match self.value {
            Value::DateTime(dt) => {
                visitor.visit_newtype_struct(StringDeserializer::<Error>::new(datetime::format(dt)))
            }
            _ => Err(self.invalid_type(&visitor)),
        }
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Array(items) => visitor.visit_seq(ArrayAccess::new(items)),
            _ => Err(self.invalid_type(&visitor)),
        }
    }

    /// Tuples are structs keyed `_1` … `_len`, with exactly `len` members.
    fn deserialize_tuple<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value> {
        let members = self.members(&visitor)?;
        if members.len() != len {
            return Err(de::Error::invalid_length(members.len(), &visitor));
        }
        let index = index_members(members)?;
        let mut fields = Vec::with_capacity(len);
        for position in 0..len {
            let name = positional_name(position);
            let value = index
                .get(name.as_str())
                .copied()
                .ok_or_else(|| Error::MissingMember(name.clone()))?;
            fields.push((name, value));
        }
        visitor.visit_seq(PositionalAccess::new(fields))
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_tuple(len, visitor)
    }

    /// Maps read every member in wire order.
    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let members = self.members(&visitor)?;
        index_members(members)?;
        let entries = members
            .iter()
            .map(|m| (m.name.as_str(), &m.value))
            .collect();
        visitor.visit_map(MemberAccess::new(entries))
    }

    /// Records see every member in wire order; the derived visitor matches
    /// fields by name. Absent `Option` fields become `None`, other absent
    /// fields fail with [`Error::MissingMember`]. Undeclared members are
    /// skipped unless the type denies unknown fields.
    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_map(visitor)
    }

    /// Unit variants are strings; others are one-member structs.
    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        match self.value {
            Value::String(s) => visitor.visit_enum(s.as_str().into_deserializer()),
            Value::Struct(members) => match members.as_slice() {
                [member] => visitor.visit_enum(VariantDeserializer { member }),
                _ => Err(de::Error::invalid_length(members.len(), &"a single-member struct")),
            },
            _ => Err(self.invalid_type(&visitor)),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }
}

// ── ArrayAccess ────────────────────────────────────────────────────────────

struct ArrayAccess<'de> {
    items: std::slice::Iter<'de, Value>,
    index: usize,
}

impl<'de> ArrayAccess<'de> {
    fn new(items: &'de [Value]) -> Self {
        ArrayAccess {
            items: items.iter(),
            index: 0,
        }
    }
}

impl<'de> SeqAccess<'de> for ArrayAccess<'de> {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>> {
        let Some(item) = self.items.next() else {
            return Ok(None);
        };
        let index = self.index;
        self.index += 1;
        seed.deserialize(Deserializer::new(item))
            .map(Some)
            .map_err(|e| e.at_element(index))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

// ── PositionalAccess: tuple fields ─────────────────────────────────────────

struct PositionalAccess<'de> {
    fields: std::vec::IntoIter<(String, &'de Value)>,
}

impl<'de> PositionalAccess<'de> {
    fn new(fields: Vec<(String, &'de Value)>) -> Self {
        PositionalAccess {
            fields: fields.into_iter(),
        }
    }
}

impl<'de> SeqAccess<'de> for PositionalAccess<'de> {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>> {
        let Some((name, value)) = self.fields.next() else {
            return Ok(None);
        };
        seed.deserialize(Deserializer::new(value))
            .map(Some)
            .map_err(|e| e.at_member(&name))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.fields.len())
    }
}

// ── MemberAccess: maps and records ─────────────────────────────────────────

struct MemberAccess<'de> {
    entries: std::vec::IntoIter<(&'de str, &'de Value)>,
    pending: Option<(&'de str, &'de Value)>,
}

impl<'de> MemberAccess<'de> {
    fn new(entries: Vec<(&'de str, &'de Value)>) -> Self {
        MemberAccess {
            entries: entries.into_iter(),
            pending: None,
        }
    }
}

impl<'de> MapAccess<'de> for MemberAccess<'de> {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        let Some((name, value)) = self.entries.next() else {
            return Ok(None);
        };
        self.pending = Some((name, value));
        seed.deserialize(BorrowedStrDeserializer::new(name)).map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        let (name, value) = self
            .pending
            .take()
            .ok_or_else(|| Error::Message("member value requested before its name".to_string()))?;
        seed.deserialize(Deserializer::new(value))
            .map_err(|e| e.at_member(name))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

// ── VariantDeserializer ────────────────────────────────────────────────────

struct VariantDeserializer<'de> {
    member: &'de Member,
}

impl<'de> EnumAccess<'de> for VariantDeserializer<'de> {
    type Error = Error;
    type Variant = Self;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self)> {
        let variant = seed.deserialize(BorrowedStrDeserializer::<Error>::new(
            self.member.name.as_str(),
        ))?;
        Ok((variant, self))
    }
}

impl<'de> VariantAccess<'de> for VariantDeserializer<'de> {
    type Error = Error;

    /// Unit variant written in struct form: the payload must be `<nil/>`
    fn unit_variant(self) -> Result<()> {
        match self.member.value {
            Value::Nil => Ok(()),
            ref other => Err(Error::mismatch("<nil/>", other.tag()).at_member(&self.member.name)),
        }
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value> {
        seed.deserialize(Deserializer::new(&self.member.value))
            .map_err(|e| e.at_member(&self.member.name))
    }

    fn tuple_variant<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value> {
        de::Deserializer::deserialize_tuple(Deserializer::new(&self.member.value), len, visitor)
            .map_err(|e| e.at_member(&self.member.name))
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        de::Deserializer::deserialize_struct(
            Deserializer::new(&self.member.value),
            "",
            fields,
            visitor,
        )
        .map_err(|e| e.at_member(&self.member.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a: &str, b: &str) -> Value {
        Value::Struct(vec![
            Member::new("_1", Value::from(a)),
            Member::new("_2", Value::from(b)),
        ])
    }

    #[test]
    fn tuple_members_are_looked_up_by_name() {
        let swapped = Value::Struct(vec![
            Member::new("_2", Value::Int(2)),
            Member::new("_1", Value::from("one")),
        ]);
        let decoded: (String, i32) = from_value(&swapped).unwrap();
        assert_eq!(decoded, ("one".to_string(), 2));
    }

    #[test]
    fn tuple_arity_must_match() {
        let err = from_value::<(String, String, String)>(&pair("a", "b")).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }), "{err:?}");
    }

    #[test]
    fn borrowed_strings_point_into_the_tree() {
        let value = Value::from("borrowed");
        let s: &str = from_value(&value).unwrap();
        assert_eq!(s, "borrowed");
    }

    #[test]
    fn duplicate_names_are_rejected_for_maps() {
        let value = Value::Struct(vec![
            Member::new("k", Value::Int(1)),
            Member::new("k", Value::Int(2)),
        ]);
        let err = from_value::<HashMap<String, i32>>(&value).unwrap_err();
        assert_eq!(err, Error::DuplicateMember("k".to_string()));
    }
}
