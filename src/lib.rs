//! # xmlrpc-serde
//!
//! A pure-Rust implementation of the XML-RPC value encoding and its
//! `methodCall` / `methodResponse` envelopes, built on top of the `serde`
//! framework.
//!
//! ## Overview
//!
//! Values travel as a small XML dialect: scalars (`int`, `double`,
//! `boolean`, `string`, `dateTime.iso8601`, `base64`, `nil`), arrays and
//! structs. Any type implementing `Serialize` / `Deserialize` can be
//! encoded and decoded; derived records and tuples of any arity map onto
//! structs without hand-written code.
//!
//! Encoding goes through an in-memory [`Value`] tree ([`to_value`]), which
//! [`xml::Writer`] renders as text with `quick-xml`. Decoding parses the
//! text with `roxmltree`, builds a [`Value`] and drives [`from_value`].
//! Decoding is total: malformed, unexpected or overly deep XML produces an
//! [`Error`], never a panic.
//!
//! ## Serde type mapping
//!
//! | Rust / serde type | XML-RPC encoding |
//! |-------------------|------------------|
//! | `bool`            | `<boolean>` with `0` or `1` |
//! | `i8` … `i64`, `u8` … `u64` | `<int>` (32-bit range only; `<i4>` also decodes) |
//! | `f32`, `f64`      | `<double>` (finite only) |
//! | `char`, `&str`, `String` | `<string>` (bare text inside `<value>` also decodes) |
//! | `serde_bytes` buffers | `<base64>` |
//! | `chrono` date-times via [`datetime`] | `<dateTime.iso8601>`, whole seconds |
//! | `Option<T>`       | `<nil/>` or the encoded `T` |
//! | `()` / unit struct | `<nil/>` |
//! | [`Void`]          | nothing: an empty `<params/>` |
//! | `Vec<T>` / seq    | `<array>` in order |
//! | Map with string keys | `<struct>`, one member per entry |
//! | Struct            | `<struct>` keyed by field name |
//! | Tuple / tuple struct | `<struct>` keyed `_1`, `_2`, … |
//! | Unit enum variant | `<string>` with the variant name |
//! | Other enum variants | one-member `<struct>` keyed by the variant name |
//!
//! ## Example
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use xmlrpc_serde::{Response, encode_request, read_response};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct State {
//!     name: String,
//!     population: i32,
//! }
//!
//! let request = encode_request("examples.getState", &41).unwrap();
//! assert!(request.contains("<methodName>examples.getState</methodName>"));
//!
//! let response = r#"<?xml version="1.0"?>
//! <methodResponse><params><param><value><struct>
//!   <member><name>population</name><value><int>4900000</int></value></member>
//!   <member><name>name</name><value>South Dakota</value></member>
//! </struct></value></param></params></methodResponse>"#;
//!
//! let state: Response<State> = read_response(response).unwrap();
//! assert_eq!(
//!     state,
//!     Response::Success(State { name: "South Dakota".into(), population: 4_900_000 })
//! );
//! ```

pub mod datetime;
pub mod de;
pub mod envelope;
pub mod error;
pub mod grammar;
pub mod ser;
pub mod value;
pub mod void;
pub mod xml;

pub use de::{Deserializer, from_value};
pub use envelope::{
    Fault, Request, Response, decode_request, decode_response, encode_fault, encode_request,
    encode_response, read_response,
};
pub use error::{Error, Result};
pub use ser::{Serializer, to_value};
pub use value::{Member, Value};
pub use void::Void;

pub use serde::{Deserialize, Serialize};
