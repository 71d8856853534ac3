use super::registry::Formatter;
use crate::error::{GatewayError, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::Value;
use std::fmt::Display;

/// Element name used for array members
pub const ITEM_ELEMENT: &str = "item";

/// `application/xml` and `text/xml` via the `quick-xml` event writer
///
/// Objects become nested elements named after their keys, arrays become
/// repeated `<item>` elements, `null` becomes an empty element. Keys that are
/// not valid XML names are rewritten with `_`.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlFormatter {
    pub indent: bool,
}

impl Formatter for XmlFormatter {
    fn content_type(&self) -> &str {
        "application/xml"
    }

    fn content_types(&self) -> Vec<String> {
        vec!["application/xml".to_string(), "text/xml".to_string()]
    }

    fn format(&self, root: &str, value: &Value) -> Result<Vec<u8>> {
        let mut writer = if self.indent {
            Writer::new_with_indent(Vec::new(), b' ', 2)
        } else {
            Writer::new(Vec::new())
        };
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_error)?;
        write_element(&mut writer, &element_name(root), value)?;
        Ok(writer.into_inner())
    }
}

fn write_element(writer: &mut Writer<Vec<u8>>, name: &str, value: &Value) -> Result<()> {
    if value.is_null() {
        return writer
            .write_event(Event::Empty(BytesStart::new(name)))
            .map_err(xml_error);
    }

    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(xml_error)?;
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                write_element(writer, &element_name(key), child)?;
            }
        }
        Value::Array(items) => {
            for item in items {
                write_element(writer, ITEM_ELEMENT, item)?;
            }
        }
        Value::String(s) => write_text(writer, s)?,
        Value::Bool(b) => write_text(writer, &b.to_string())?,
        Value::Number(n) => write_text(writer, &n.to_string())?,
        Value::Null => {}
    }
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_error)
}

fn write_text(writer: &mut Writer<Vec<u8>>, text: &str) -> Result<()> {
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_error)
}

/// Rewrite a key into a valid XML element name
fn element_name(key: &str) -> String {
    let mut name: String = key
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let starts_ok = name
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_');
    if !starts_ok || name.to_ascii_lowercase().starts_with("xml") {
        name.insert(0, '_');
    }
    name
}

fn xml_error(err: impl Display) -> GatewayError {
    GatewayError::internal(format!("xml: {err}"))
}
