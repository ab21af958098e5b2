//! XML-RPC tag vocabulary.
//!
//! Shared by the writer and the reader so both directions agree on every
//! tag name and on the positional member naming used for tuples.

// ── Envelope tags ──────────────────────────────────────────────────────────

pub const METHOD_CALL: &str = "methodCall";
pub const METHOD_RESPONSE: &str = "methodResponse";
pub const METHOD_NAME: &str = "methodName";
pub const PARAMS: &str = "params";
pub const PARAM: &str = "param";
pub const FAULT: &str = "fault";

// ── Value tags ─────────────────────────────────────────────────────────────

pub const VALUE: &str = "value";
pub const ARRAY: &str = "array";
pub const DATA: &str = "data";
pub const STRUCT: &str = "struct";
pub const MEMBER: &str = "member";
pub const NAME: &str = "name";

pub const STRING: &str = "string";
pub const INT: &str = "int";
/// Accepted on decode as a synonym of `int`, never written.
pub const I4: &str = "i4";
pub const DOUBLE: &str = "double";
pub const BOOLEAN: &str = "boolean";
pub const DATE_TIME: &str = "dateTime.iso8601";
pub const BASE64: &str = "base64";
pub const NIL: &str = "nil";

// ── Fault members ──────────────────────────────────────────────────────────

pub const FAULT_CODE: &str = "faultCode";
pub const FAULT_STRING: &str = "faultString";

/// `chrono` format of `dateTime.iso8601`: ISO-8601 basic date, whole seconds,
/// no offset (`19980717T14:08:55`).
pub const DATE_TIME_FORMAT: &str = "%Y%m%dT%H:%M:%S";

/// Member name of the tuple field at `index` (zero-based): `_1`, `_2`, …
pub fn positional_name(index: usize) -> String {
    format!("_{}", index + 1)
}
