//! `methodCall` / `methodResponse` framing.
//!
//! The client side is [`Request`] / [`encode_request`] and
//! [`read_response`]; the server side is [`Request::from_xml`] /
//! [`decode_request`], [`encode_response`] and [`encode_fault`].

use crate::de::from_value;
use crate::error::{Error, Result};
use crate::grammar;
use crate::ser::to_param;
use crate::value::{Member, Value};
use crate::void::EmptyParams;
use crate::xml::{self, Writer, describe, element_children, expect_tag, only_child, text_content};
use roxmltree::Node;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::Write;

// ── Fault ──────────────────────────────────────────────────────────────────

/// Application-level error reported by the remote method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("fault {code}: {message}")]
pub struct Fault {
    #[serde(rename = "faultCode")]
    code: i32,
    #[serde(rename = "faultString")]
    message: String,
}

impl Fault {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Fault {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    fn to_value(&self) -> Value {
        Value::Struct(vec![
            Member::new(grammar::FAULT_CODE, Value::Int(self.code)),
            Member::new(grammar::FAULT_STRING, Value::String(self.message.clone())),
        ])
    }
}

// ── Response ───────────────────────────────────────────────────────────────

/// A well-formed response: either the method's result or its fault.
///
/// Together with [`Error`] this makes the three-way outcome of a call:
/// `Ok(Response::Success(_))`, `Ok(Response::Fault(_))` or `Err(_)` for a
/// response that could not be decoded as the requested type.
#[derive(Debug, Clone, PartialEq)]
pub enum Response<T> {
    Success(T),
    Fault(Fault),
}

impl<T> Response<T> {
    pub fn is_fault(&self) -> bool {
        matches!(self, Response::Fault(_))
    }

    pub fn into_result(self) -> std::result::Result<T, Fault> {
        match self {
            Response::Success(value) => Ok(value),
            Response::Fault(fault) => Err(fault),
        }
    }
}

// ── Request ────────────────────────────────────────────────────────────────

/// A `methodCall` with at most one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method_name: String,
    param: Option<Value>,
}

impl Request {
    /// Encode `param` as the call's single parameter.
    ///
    /// The method name is not validated. A [`crate::Void`] parameter leaves
    /// `<params>` empty.
    pub fn new<T: Serialize + ?Sized>(method_name: impl Into<String>, param: &T) -> Result<Self> {
        Ok(Request {
            method_name: method_name.into(),
            param: to_param(param)?,
        })
    }

    /// Parse a `<methodCall>` document.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = xml::parse_document(xml)?;
        let root = expect_tag(document.root_element(), grammar::METHOD_CALL)?;
        let name_node = element_children(root)
            .find(|child| child.tag_name().name() == grammar::METHOD_NAME)
            .ok_or_else(|| Error::mismatch("<methodName>", "<methodCall> without it"))?;
        let method_name = text_content(name_node);
        let param = match element_children(root).find(|c| c.tag_name().name() == grammar::PARAMS) {
            Some(params) => read_params(params)?,
            None => None,
        };
        tracing::debug!(method = %method_name, "decoded XML-RPC request");
        Ok(Request { method_name, param })
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    /// The encoded parameter, or `None` for a parameterless call.
    pub fn param(&self) -> Option<&Value> {
        self.param.as_ref()
    }

    /// Decode the parameter as `T`. A parameterless call only decodes as
    /// [`crate::Void`].
    pub fn param_as<'de, T: Deserialize<'de>>(&'de self) -> Result<T> {
        match &self.param {
            Some(value) => from_value(value),
            None => T::deserialize(EmptyParams),
        }
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        Writer::new(writer).write_method_call(&self.method_name, self.param.as_ref())
    }

    pub fn to_xml(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.to_writer(&mut buf)?;
        xml::into_string(buf)
    }
}

// ── Client side ────────────────────────────────────────────────────────────

/// Encode a call of `method_name` with `param` as XML text.
///
/// ```rust
/// let xml = xmlrpc_serde::encode_request("examples.getStateName", &41).unwrap();
/// assert_eq!(
///     xml,
///     "<?xml version=\"1.0\"?><methodCall><methodName>examples.getStateName</methodName>\
///      <params><param><value><int>41</int></value></param></params></methodCall>"
/// );
/// ```
pub fn encode_request<T: Serialize + ?Sized>(method_name: &str, param: &T) -> Result<String> {
    let request = Request::new(method_name, param)?;
    tracing::debug!(method = %method_name, "encoding XML-RPC request");
    request.to_xml()
}

/// Decode a `<methodResponse>` document as `T`, or as the [`Fault`] it
/// carries.
///
/// Never panics on unexpected input: a response shaped for another type
/// yields [`Error::ShapeMismatch`] (possibly wrapped with the path to the
/// offending member or element).
pub fn read_response<T: DeserializeOwned>(xml: &str) -> Result<Response<T>> {
    let document = xml::parse_document(xml)?;
    let root = expect_tag(document.root_element(), grammar::METHOD_RESPONSE)?;
    let mut children = element_children(root);
    let branch = match (children.next(), children.next()) {
        (Some(branch), None) => branch,
        (None, _) => {
            return Err(Error::mismatch(
                "<params> or <fault>",
                "empty <methodResponse>",
            ));
        }
        (Some(_), Some(extra)) => {
            return Err(Error::mismatch(
                "a single <params> or <fault>",
                format!("extra {}", describe(extra)),
            ));
        }
    };

    match branch.tag_name().name() {
        grammar::FAULT => {
            let fault = read_fault(branch).map_err(|e| Error::MalformedFault(Box::new(e)))?;
            tracing::debug!(code = fault.code, message = %fault.message, "response carries a fault");
            Ok(Response::Fault(fault))
        }
        grammar::PARAMS => match read_params(branch)? {
            Some(value) => from_value(&value).map(Response::Success),
            None => {
                tracing::trace!("response has no parameter");
                T::deserialize(EmptyParams).map(Response::Success)
            }
        },
        _ => Err(Error::mismatch("<params> or <fault>", describe(branch))),
    }
}

/// Alias of [`read_response`], named after the transport-facing operation.
pub fn decode_response<T: DeserializeOwned>(xml: &str) -> Result<Response<T>> {
    read_response(xml)
}

// ── Server side ────────────────────────────────────────────────────────────

/// Decode a `<methodCall>` document into its method name and parameter.
pub fn decode_request<T: DeserializeOwned>(xml: &str) -> Result<(String, T)> {
    let request = Request::from_xml(xml)?;
    let param = request.param_as()?;
    Ok((request.method_name, param))
}

/// Encode a successful `<methodResponse>` carrying `result`.
pub fn encode_response<T: Serialize + ?Sized>(result: &T) -> Result<String> {
    let param = to_param(result)?;
    let mut writer = Writer::new(Vec::new());
    writer.write_method_response(param.as_ref())?;
    xml::into_string(writer.into_writer())
}

/// Encode a `<methodResponse>` carrying `fault`.
pub fn encode_fault(fault: &Fault) -> Result<String> {
    tracing::debug!(code = fault.code, message = %fault.message, "encoding fault response");
    let mut writer = Writer::new(Vec::new());
    writer.write_fault(&fault.to_value())?;
    xml::into_string(writer.into_writer())
}

// ── Shared helpers ─────────────────────────────────────────────────────────

/// `None` for an empty `<params>`, the decoded value for exactly one
/// `<param>`.
fn read_params(params: Node<'_, '_>) -> Result<Option<Value>> {
    let mut children = element_children(params);
    match (children.next(), children.next()) {
        (None, _) => Ok(None),
        (Some(param), None) => {
            let param = expect_tag(param, grammar::PARAM)?;
            let value = only_child(param, grammar::VALUE)?;
            xml::read_value(value).map(Some)
        }
        (Some(_), Some(_)) => Err(Error::mismatch(
            "at most one <param>",
            format!("{} parameters", element_children(params).count()),
        )),
    }
}

fn read_fault(fault: Node<'_, '_>) -> Result<Fault> {
    let value = only_child(fault, grammar::VALUE)?;
    let value = xml::read_value(value)?;
    from_value(&value)
}
