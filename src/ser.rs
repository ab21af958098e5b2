//! XML-RPC Serializer
//!
//! Turns any `T: Serialize` into a [`Value`] tree. Rendering that tree as XML
//! text is the job of [`crate::xml::Writer`].
//!
//! ## Mapping summary
//! - Integers: `<int>`, must fit in 32 bits
//! - Floats: `<double>`, finite only
//! - Strings / chars: `<string>`
//! - Bytes: `<base64>`
//! - `None`, `()`, unit structs: `<nil/>`
//! - Sequences: `<array>`, in order
//! - Maps: `<struct>`, keys must be strings
//! - Structs: `<struct>` keyed by field name
//! - Tuples / tuple structs: `<struct>` keyed `_1`, `_2`, …
//! - Enums: unit variant as `<string>`, others as a one-member `<struct>`

use crate::datetime::{self, DATETIME_TOKEN};
use crate::error::{Error, Result};
use crate::grammar::positional_name;
use crate::value::{Member, Value};
use crate::void::VOID_TOKEN;
use serde::ser::{self, Impossible, Serialize};

// ── Public entry points ────────────────────────────────────────────────────

/// Serialize `value` into a [`Value`] tree.
///
/// A top-level [`crate::Void`] becomes `<nil/>` here; only
/// [`crate::Request`] gives it its "no parameter" meaning.
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    let mut ser = Serializer::new();
    value.serialize(&mut ser)
}

/// Serialize a request or response parameter. `None` means the value was
/// [`crate::Void`] and the `<params>` block stays empty.
pub(crate) fn to_param<T: Serialize + ?Sized>(value: &T) -> Result<Option<Value>> {
    let mut ser = Serializer::new();
    let encoded = value.serialize(&mut ser)?;
    Ok(if ser.top_level_void { None } else { Some(encoded) })
}

// ── Serializer ─────────────────────────────────────────────────────────────

/// The XML-RPC serializer.
///
/// Obtain one via [`to_value`], or drive it directly:
///
/// ```rust
/// use serde::Serialize;
/// use xmlrpc_serde::{Serializer, Value};
///
/// let mut ser = Serializer::new();
/// let value = 42u16.serialize(&mut ser).unwrap();
/// assert_eq!(value, Value::Int(42));
/// ```
#[derive(Debug, Default)]
pub struct Serializer {
    depth: usize,
    top_level_void: bool,
}

impl Serializer {
    pub fn new() -> Self {
        Serializer::default()
    }

    // ── Internal helpers ───────────────────────────────────────────────────

    fn int<T>(v: T) -> Result<Value>
    where
        T: Copy + Into<i128> + TryInto<i32>,
    {
        v.try_into()
            .map(Value::Int)
            .map_err(|_| Error::IntegerOutOfRange(v.into()))
    }

    fn double(v: f64) -> Result<Value> {
        if v.is_finite() {
            Ok(Value::Double(v))
        } else {
            Err(Error::Unsupported("NaN or infinite doubles"))
        }
    }

    fn enter(&mut self) {
        self.depth += 1;
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }
}

/// Wrap a variant payload the way externally tagged enums are written.
fn tagged(variant: &'static str, payload: Value) -> Value {
    Value::Struct(vec![Member::new(variant, payload)])
}

// ── serde::Serializer impl ─────────────────────────────────────────────────

impl<'a> ser::Serializer for &'a mut Serializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SeqSerializer<'a>;
    type SerializeTuple = MemberSerializer<'a>;
    type SerializeTupleStruct = MemberSerializer<'a>;
    type SerializeTupleVariant = MemberSerializer<'a>;
    type SerializeMap = MemberSerializer<'a>;
    type SerializeStruct = MemberSerializer<'a>;
    type SerializeStructVariant = MemberSerializer<'a>;

    // ── Primitives ─────────────────────────────────────────────────────────

    /// `<boolean>0</boolean>` or `<boolean>1</boolean>`
    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Boolean(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        Ok(Value::Int(v.into()))
    }
    fn serialize_i16(self, v: i16) -> Result<Value> {
        Ok(Value::Int(v.into()))
    }
    fn serialize_i32(self, v: i32) -> Result<Value> {
        Ok(Value::Int(v))
    }
    /// Only values inside the `i32` range have an XML-RPC form.
    fn serialize_i64(self, v: i64) -> Result<Value> {
        Serializer::int(v)
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        Ok(Value::Int(v.into()))
    }
    fn serialize_u16(self, v: u16) -> Result<Value> {
        Ok(Value::Int(v.into()))
    }
    fn serialize_u32(self, v: u32) -> Result<Value> {
        Serializer::int(v)
    }
    fn serialize_u64(self, v: u64) -> Result<Value> {
        Serializer::int(v)
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Serializer::double(v.into())
    }
    fn serialize_f64(self, v: f64) -> Result<Value> {
        Serializer::double(v)
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    /// `<base64>`
    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(Value::Base64(v.to_vec()))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Nil)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Value> {
        self.enter();
        let encoded = value.serialize(&mut *self);
        self.leave();
        encoded
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::Nil)
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<Value> {
        if name == VOID_TOKEN && self.depth == 0 {
            self.top_level_void = true;
        }
        Ok(Value::Nil)
    }

    /// Unit enum variant → the variant name as a string
    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(Value::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        value: &T,
    ) -> Result<Value> {
        self.enter();
        let encoded = value.serialize(&mut *self);
        self.leave();
        if name != DATETIME_TOKEN {
            return encoded;
        }
        // `datetime::serialize` hands us the formatted text, which only
        // fails to parse back when the year has no four-digit form.
        match encoded? {
            Value::String(text) => datetime::parse(&text)
                .map(Value::DateTime)
                .ok_or(Error::Unsupported(datetime::YEAR_RANGE)),
            other => Err(Error::mismatch("dateTime.iso8601 text", other.tag())),
        }
    }

    /// Newtype variant → `{variant: value}`
    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value> {
        self.enter();
        let payload = value.serialize(&mut *self);
        self.leave();
        Ok(tagged(variant, payload?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        Ok(SeqSerializer::new(self, len.unwrap_or(0)))
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        Ok(MemberSerializer::new(self, len, None))
    }
    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Ok(MemberSerializer::new(self, len, None))
    }

    /// Tuple variant → `{variant: {_1: …, _2: …}}`
    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Ok(MemberSerializer::new(self, len, Some(variant)))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap> {
        Ok(MemberSerializer::new(self, len.unwrap_or(0), None))
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<Self::SerializeStruct> {
        Ok(MemberSerializer::new(self, len, None))
    }

    /// Struct variant → `{variant: {field: …}}`
    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Ok(MemberSerializer::new(self, len, Some(variant)))
    }

    fn is_human_readable(&self) -> bool {
        true
    }
}

// ── Compound serializers ───────────────────────────────────────────────────

/// Collects `<array>` elements.
pub struct SeqSerializer<'a> {
    ser: &'a mut Serializer,
    items: Vec<Value>,
}

impl<'a> SeqSerializer<'a> {
    fn new(ser: &'a mut Serializer, len: usize) -> Self {
        ser.enter();
        SeqSerializer {
            ser,
            items: Vec::with_capacity(len),
        }
    }
}

impl ser::SerializeSeq for SeqSerializer<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.items.push(value.serialize(&mut *self.ser)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        self.ser.leave();
        Ok(Value::Array(self.items))
    }
}

/// Collects `<struct>` members for maps, structs, tuples and enum payloads.
pub struct MemberSerializer<'a> {
    ser: &'a mut Serializer,
    members: Vec<Member>,
    pending_key: Option<String>,
    variant: Option<&'static str>,
}

impl<'a> MemberSerializer<'a> {
    fn new(ser: &'a mut Serializer, len: usize, variant: Option<&'static str>) -> Self {
        ser.enter();
        MemberSerializer {
            ser,
            members: Vec::with_capacity(len),
            pending_key: None,
            variant,
        }
    }

    fn push<T: Serialize + ?Sized>(&mut self, name: String, value: &T) -> Result<()> {
        let value = value.serialize(&mut *self.ser)?;
        self.members.push(Member { name, value });
        Ok(())
    }

    fn push_positional<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let name = positional_name(self.members.len());
        self.push(name, value)
    }

    fn finish(self) -> Result<Value> {
        self.ser.leave();
        let fields = Value::Struct(self.members);
        Ok(match self.variant {
            Some(variant) => tagged(variant, fields),
            None => fields,
        })
    }
}

macro_rules! forward_serialize_positional {
    ($t:ty) => {
        impl $t for MemberSerializer<'_> {
            type Ok = Value;
            type Error = Error;
            fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
                self.push_positional(value)
            }
            fn end(self) -> Result<Value> {
                self.finish()
            }
        }
    };
}

macro_rules! forward_serialize_named {
    ($t:ty) => {
        impl $t for MemberSerializer<'_> {
            type Ok = Value;
            type Error = Error;
            fn serialize_field<T: Serialize + ?Sized>(
                &mut self,
                key: &'static str,
                value: &T,
            ) -> Result<()> {
                self.push(key.to_string(), value)
            }
            fn end(self) -> Result<Value> {
                self.finish()
            }
        }
    };
}

impl ser::SerializeTuple for MemberSerializer<'_> {
    type Ok = Value;
    type Error = Error;
    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.push_positional(value)
    }
    fn end(self) -> Result<Value> {
        self.finish()
    }
}

forward_serialize_positional!(ser::SerializeTupleStruct);
forward_serialize_positional!(ser::SerializeTupleVariant);
forward_serialize_named!(ser::SerializeStruct);
forward_serialize_named!(ser::SerializeStructVariant);

impl ser::SerializeMap for MemberSerializer<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<()> {
        self.pending_key = Some(key.serialize(MemberNameSerializer)?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let name = self
            .pending_key
            .take()
            .ok_or_else(|| Error::Message("map value serialized before its key".to_string()))?;
        self.push(name, value)
    }

    fn end(self) -> Result<Value> {
        self.finish()
    }
}

// ── MemberNameSerializer ───────────────────────────────────────────────────
//
// Map keys become `<name>` text, so only string-like keys are accepted.

struct MemberNameSerializer;

impl ser::Serializer for MemberNameSerializer {
    type Ok = String;
    type Error = Error;

    type SerializeSeq = Impossible<String, Error>;
    type SerializeTuple = Impossible<String, Error>;
    type SerializeTupleStruct = Impossible<String, Error>;
    type SerializeTupleVariant = Impossible<String, Error>;
    type SerializeMap = Impossible<String, Error>;
    type SerializeStruct = Impossible<String, Error>;
    type SerializeStructVariant = Impossible<String, Error>;

    fn serialize_str(self, v: &str) -> Result<String> {
        Ok(v.to_string())
    }
    fn serialize_char(self, v: char) -> Result<String> {
        Ok(v.to_string())
    }
    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<String> {
        Ok(variant.to_string())
    }
    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<String> {
        value.serialize(self)
    }

    // Everything else has no `<name>` form.
    fn serialize_bool(self, _v: bool) -> Result<String> {
        Err(Error::KeyMustBeString)
    }
    fn serialize_i8(self, _v: i8) -> Result<String> {
        Err(Error::KeyMustBeString)
    }
    fn serialize_i16(self, _v: i16) -> Result<String> {
        Err(Error::KeyMustBeString)
    }
    fn serialize_i32(self, _v: i32) -> Result<String> {
        Err(Error::KeyMustBeString)
    }
    fn serialize_i64(self, _v: i64) -> Result<String> {
        Err(Error::KeyMustBeString)
    }
    fn serialize_u8(self, _v: u8) -> Result<String> {
        Err(Error::KeyMustBeString)
    }
    fn serialize_u16(self, _v: u16) -> Result<String> {
        Err(Error::KeyMustBeString)
    }
    fn serialize_u32(self, _v: u32) -> Result<String> {
        Err(Error::KeyMustBeString)
    }
    fn serialize_u64(self, _v: u64) -> Result<String> {
        Err(Error::KeyMustBeString)
    }
    fn serialize_f32(self, _v: f32) -> Result<String> {
        Err(Error::KeyMustBeString)
    }
    fn serialize_f64(self, _v: f64) -> Result<String> {
        Err(Error::KeyMustBeString)
    }
    fn serialize_bytes(self, _v: &[u8]) -> Result<String> {
        Err(Error::KeyMustBeString)
    }
    fn serialize_none(self) -> Result<String> {
        Err(Error::KeyMustBeString)
    }
    fn serialize_some<T: Serialize + ?Sized>(self, _value: &T) -> Result<String> {
        Err(Error::KeyMustBeString)
    }
    fn serialize_unit(self) -> Result<String> {
        Err(Error::KeyMustBeString)
    }
    fn serialize_unit_struct(self, _name: &'static str) -> Result<String> {
        Err(Error::KeyMustBeString)
    }
    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<String> {
        Err(Error::KeyMustBeString)
    }
    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(Error::KeyMustBeString)
    }
    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(Error::KeyMustBeString)
    }
    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(Error::KeyMustBeString)
    }
    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(Error::KeyMustBeString)
    }
    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(Error::KeyMustBeString)
    }
    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(Error::KeyMustBeString)
    }
    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(Error::KeyMustBeString)
    }
}
