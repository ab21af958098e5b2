//! XML text layer.
//!
//! [`Writer`] renders [`Value`] trees and envelopes as XML-RPC text through
//! `quick-xml` events; the reader half walks a parsed `roxmltree` document
//! and builds [`Value`] trees, parsing scalar text on the way.
//!
//! ```rust
//! use xmlrpc_serde::{xml, Value};
//!
//! let text = xml::to_string(&Value::from("fish & chips")).unwrap();
//! assert_eq!(text, "<value><string>fish &amp; chips</string></value>");
//! assert_eq!(xml::from_str(&text).unwrap(), Value::from("fish & chips"));
//! ```

use crate::datetime;
use crate::error::{Error, Result};
use crate::grammar;
use crate::value::{Member, Value};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use quick_xml::Reader;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use roxmltree::{Document, Node};
use std::borrow::Cow;
use std::io::Write;

/// Deepest element nesting the reader accepts. Every array or struct level
/// costs three elements (`<value>`, `<array>`/`<struct>`,
/// `<data>`/`<member>`).
pub const MAX_DEPTH: usize = 256;

// ── Public entry points ────────────────────────────────────────────────────

/// Render `value` as a `<value>` element.
pub fn to_string(value: &Value) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    writer.write_value(value)?;
    into_string(writer.into_writer())
}

/// Render `value` as a `<value>` element into `writer`.
pub fn to_writer<W: Write>(writer: W, value: &Value) -> Result<()> {
    Writer::new(writer).write_value(value)
}

/// Parse a document whose root element is `<value>`.
pub fn from_str(xml: &str) -> Result<Value> {
    let document = parse_document(xml)?;
    let root = document.root_element();
    expect_tag(root, grammar::VALUE)?;
    read_value(root)
}

pub(crate) fn into_string(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| Error::Io(e.to_string()))
}

// ── Writer ─────────────────────────────────────────────────────────────────

/// XML-RPC text writer. Generic over any `W: Write`.
///
/// Output is compact: no indentation or line breaks between elements.
/// Text that XML 1.0 cannot carry is refused with [`Error::Unsupported`]
/// before anything is written for it.
pub struct Writer<W: Write> {
    writer: quick_xml::Writer<W>,
}

impl<W: Write> Writer<W> {
    pub fn new(writer: W) -> Self {
        Writer {
            writer: quick_xml::Writer::new(writer),
        }
    }

    pub fn into_writer(self) -> W {
        self.writer.into_inner()
    }

    // ── Internal helpers ───────────────────────────────────────────────────

    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| Error::Io(e.to_string()))
    }

    fn open(&mut self, tag: &str) -> Result<()> {
        self.event(Event::Start(BytesStart::new(tag)))
    }

    fn close(&mut self, tag: &str) -> Result<()> {
        self.event(Event::End(BytesEnd::new(tag)))
    }

    fn empty(&mut self, tag: &str) -> Result<()> {
        self.event(Event::Empty(BytesStart::new(tag)))
    }

    /// Character data with `&`, `<`, `>` escaped. `\r` becomes a character
    /// reference so XML line-ending normalisation does not eat it.
    fn write_text(&mut self, text: &str) -> Result<()> {
        if !text.chars().all(is_xml_char) {
            return Err(Error::Unsupported("characters outside the XML 1.0 range"));
        }
        let escaped = partial_escape(text);
        let escaped = if escaped.contains('\r') {
            Cow::Owned(escaped.replace('\r', "&#xD;"))
        } else {
            escaped
        };
        self.event(Event::Text(BytesText::from_escaped(escaped)))
    }

    fn write_element(&mut self, tag: &str, text: &str) -> Result<()> {
        self.open(tag)?;
        self.write_text(text)?;
        self.close(tag)
    }

    fn write_declaration(&mut self) -> Result<()> {
        self.event(Event::Decl(BytesDecl::new("1.0", None, None)))
    }

    fn write_params(&mut self, param: Option<&Value>) -> Result<()> {
        match param {
            Some(value) => {
                self.open(grammar::PARAMS)?;
                self.open(grammar::PARAM)?;
                self.write_value(value)?;
                self.close(grammar::PARAM)?;
                self.close(grammar::PARAMS)
            }
            None => self.empty(grammar::PARAMS),
        }
    }

    // ── Values ─────────────────────────────────────────────────────────────

    /// Write `value` wrapped in `<value>`.
    pub fn write_value(&mut self, value: &Value) -> Result<()> {
        self.open(grammar::VALUE)?;
        match value {
            Value::Int(v) => self.write_element(grammar::INT, &v.to_string())?,
            Value::Double(v) => self.write_element(grammar::DOUBLE, &v.to_string())?,
            Value::Boolean(v) => self.write_element(grammar::BOOLEAN, if *v { "1" } else { "0" })?,
            Value::String(s) => self.write_element(grammar::STRING, s)?,
            Value::DateTime(dt) => {
                if !datetime::has_wire_form(dt) {
                    return Err(Error::Unsupported(datetime::YEAR_RANGE));
                }
                self.write_element(grammar::DATE_TIME, &datetime::format(dt))?
            }
            Value::Base64(b) => self.write_element(grammar::BASE64, &STANDARD.encode(b))?,
            Value::Nil => self.empty(grammar::NIL)?,
            Value::Array(items) => {
                self.open(grammar::ARRAY)?;
                self.open(grammar::DATA)?;
                for item in items {
                    self.write_value(item)?;
                }
                self.close(grammar::DATA)?;
                self.close(grammar::ARRAY)?;
            }
            Value::Struct(members) => {
                self.open(grammar::STRUCT)?;
                for member in members {
                    self.open(grammar::MEMBER)?;
                    self.write_element(grammar::NAME, &member.name)?;
                    self.write_value(&member.value)?;
                    self.close(grammar::MEMBER)?;
                }
                self.close(grammar::STRUCT)?;
            }
        }
        self.close(grammar::VALUE)
    }

    // ── Envelopes ──────────────────────────────────────────────────────────

    /// `<methodCall>` with `param` as its only parameter, or an empty
    /// `<params/>` when there is none.
    pub fn write_method_call(&mut self, method_name: &str, param: Option<&Value>) -> Result<()> {
        self.write_declaration()?;
        self.open(grammar::METHOD_CALL)?;
        self.write_element(grammar::METHOD_NAME, method_name)?;
        self.write_params(param)?;
        self.close(grammar::METHOD_CALL)
    }

    /// Successful `<methodResponse>`.
    pub fn write_method_response(&mut self, param: Option<&Value>) -> Result<()> {
        self.write_declaration()?;
        self.open(grammar::METHOD_RESPONSE)?;
        self.write_params(param)?;
        self.close(grammar::METHOD_RESPONSE)
    }

    /// `<methodResponse>` carrying a `<fault>` whose value is `fault`.
    pub fn write_fault(&mut self, fault: &Value) -> Result<()> {
        self.write_declaration()?;
        self.open(grammar::METHOD_RESPONSE)?;
        self.open(grammar::FAULT)?;
        self.write_value(fault)?;
        self.close(grammar::FAULT)?;
        self.close(grammar::METHOD_RESPONSE)
    }
}

/// XML 1.0 `Char` production.
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

// ── Reader ─────────────────────────────────────────────────────────────────

pub(crate) fn parse_document(xml: &str) -> Result<Document<'_>> {
    check_depth(xml)?;
    Ok(Document::parse(xml)?)
}

/// Refuse documents nested deeper than [`MAX_DEPTH`]. Tree building and
/// the value reader both recurse per element; this scan does not.
fn check_depth(xml: &str) -> Result<()> {
    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;
    loop {
        match reader.read_event().map_err(|e| Error::Xml(e.to_string()))? {
            Event::Start(_) => {
                depth += 1;
                if depth > MAX_DEPTH {
                    return Err(Error::TooDeep(MAX_DEPTH));
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => return Ok(()),
            _ => {}
        }
    }
}

pub(crate) fn describe(node: Node<'_, '_>) -> String {
    format!("<{}>", node.tag_name().name())
}

pub(crate) fn element_children<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|child| child.is_element())
}

pub(crate) fn expect_tag<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &str,
) -> Result<Node<'a, 'input>> {
    if node.tag_name().name() == tag {
        Ok(node)
    } else {
        Err(Error::mismatch(format!("<{}>", tag), describe(node)))
    }
}

/// The single element child of `node`, which must be a `tag` element.
pub(crate) fn only_child<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &str,
) -> Result<Node<'a, 'input>> {
    let mut children = element_children(node);
    match (children.next(), children.next()) {
        (Some(child), None) => expect_tag(child, tag),
        (None, _) => Err(Error::mismatch(
            format!("<{}> inside {}", tag, describe(node)),
            format!("empty {}", describe(node)),
        )),
        (Some(_), Some(extra)) => Err(Error::mismatch(
            format!("a single <{}> inside {}", tag, describe(node)),
            format!("extra {}", describe(extra)),
        )),
    }
}

fn child_named<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Result<Node<'a, 'input>> {
    element_children(node)
        .find(|child| child.tag_name().name() == tag)
        .ok_or_else(|| {
            Error::mismatch(
                format!("<{}> inside {}", tag, describe(node)),
                format!("{} without it", describe(node)),
            )
        })
}

/// Concatenated character data of `node`'s direct text children, with
/// entities already resolved by the parser.
pub(crate) fn text_content(node: Node<'_, '_>) -> String {
    node.children()
        .filter(|child| child.is_text())
        .filter_map(|child| child.text())
        .collect()
}

/// Read the content of a `<value>` element.
pub(crate) fn read_value(node: Node<'_, '_>) -> Result<Value> {
    let mut children = element_children(node);
    let Some(typed) = children.next() else {
        // Bare text directly inside <value> is a string.
        return Ok(Value::String(text_content(node)));
    };
    if let Some(extra) = children.next() {
        return Err(Error::mismatch(
            "a single typed child of <value>",
            format!("{} followed by {}", describe(typed), describe(extra)),
        ));
    }
    read_typed(typed)
}

fn read_typed(node: Node<'_, '_>) -> Result<Value> {
    match node.tag_name().name() {
        grammar::INT | grammar::I4 => {
            parse_scalar(node, grammar::INT, |t| t.parse::<i32>().ok()).map(Value::Int)
        }
        grammar::DOUBLE => parse_scalar(node, grammar::DOUBLE, |t| {
            t.parse::<f64>().ok().filter(|v| v.is_finite())
        })
        .map(Value::Double),
        grammar::BOOLEAN => parse_scalar(node, grammar::BOOLEAN, |t| match t {
            "0" => Some(false),
            "1" => Some(true),
            _ => None,
        })
        .map(Value::Boolean),
        grammar::STRING => Ok(Value::String(text_content(node))),
        grammar::DATE_TIME => {
            parse_scalar(node, grammar::DATE_TIME, datetime::parse).map(Value::DateTime)
        }
        grammar::BASE64 => parse_scalar(node, grammar::BASE64, decode_base64).map(Value::Base64),
        grammar::NIL => Ok(Value::Nil),
        grammar::ARRAY => read_array(node),
        grammar::STRUCT => read_struct(node),
        _ => Err(Error::mismatch("an XML-RPC value type", describe(node))),
    }
}

fn parse_scalar<T>(
    node: Node<'_, '_>,
    kind: &'static str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<T> {
    let text = text_content(node);
    parse(&text).ok_or(Error::ScalarParse { kind, text })
}

/// Base64 payloads are often line-wrapped; whitespace is not significant.
fn decode_base64(text: &str) -> Option<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(compact).ok()
}

fn read_array(node: Node<'_, '_>) -> Result<Value> {
    let data = only_child(node, grammar::DATA)?;
    element_children(data)
        .enumerate()
        .map(|(index, child)| {
            expect_tag(child, grammar::VALUE)
                .and_then(read_value)
                .map_err(|e| e.at_element(index))
        })
        .collect::<Result<Vec<_>>>()
        .map(Value::Array)
}

fn read_struct(node: Node<'_, '_>) -> Result<Value> {
    let mut members = Vec::new();
    for member in element_children(node) {
        expect_tag(member, grammar::MEMBER)?;
        let name = text_content(child_named(member, grammar::NAME)?);
        let value = child_named(member, grammar::VALUE)
            .and_then(read_value)
            .map_err(|e| e.at_member(&name))?;
        members.push(Member { name, value });
    }
    Ok(Value::Struct(members))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carriage_returns_survive_line_ending_normalisation() {
        let value = Value::from("a\r\nb");
        assert_eq!(from_str(&to_string(&value).unwrap()).unwrap(), value);
    }

    #[test]
    fn base64_tolerates_line_wrapping() {
        let value = from_str("<value><base64>aGVs\n  bG8=</base64></value>").unwrap();
        assert_eq!(value, Value::Base64(b"hello".to_vec()));
    }

    #[test]
    fn two_typed_children_are_rejected() {
        let err = from_str("<value><int>1</int><int>2</int></value>").unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }), "{err:?}");
    }

    #[test]
    fn array_without_data_is_rejected() {
        let err = from_str("<value><array></array></value>").unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }), "{err:?}");
    }

    #[test]
    fn empty_value_is_an_empty_string() {
        assert_eq!(from_str("<value/>").unwrap(), Value::from(""));
        assert_eq!(from_str("<value><string/></value>").unwrap(), Value::from(""));
    }

    #[test]
    fn root_must_be_value() {
        let err = from_str("<string>x</string>").unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }), "{err:?}");
    }

    #[test]
    fn malformed_xml_is_reported() {
        assert!(matches!(from_str("<value><int>1</value>"), Err(Error::Xml(_))));
    }
}
