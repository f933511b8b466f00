//! ParameterList XML output.
//!
//! Only parameters holding an explicit value are written; a derived
//! parameter becomes a nested `ParameterList` when anything below it has a
//! value. Typed-spec selectors are written as the `"<field> type"` string
//! parameter when their placement keeps one.

use crate::primitives::to_text;
use crate::spec::{Parameter, SchemaNode};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::Writer;

#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error("xml write failed: {0}")]
    Write(String),

    #[error("xml output is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

fn write_err(e: impl std::fmt::Display) -> XmlError {
    XmlError::Write(e.to_string())
}

/// Render `node` as a top-level `ParameterList` called `name`.
pub fn to_xml(name: &str, node: &SchemaNode) -> Result<String, XmlError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    write_list(&mut writer, name, node)?;
    let mut out = String::from_utf8(writer.into_inner())?;
    out.push('\n');
    Ok(out)
}

fn write_list(writer: &mut Writer<Vec<u8>>, name: &str, node: &SchemaNode) -> Result<(), XmlError> {
    let start =
        BytesStart::new("ParameterList").with_attributes([("name", name), ("type", "ParameterList")]);
    writer.write_event(Event::Start(start)).map_err(write_err)?;
    for param in node.valued() {
        write_param(writer, param)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("ParameterList")))
        .map_err(write_err)?;
    Ok(())
}

fn write_param(writer: &mut Writer<Vec<u8>>, param: &Parameter) -> Result<(), XmlError> {
    match (param.value(), param.node()) {
        (Some(value), _) => {
            let ptype = value.primitive_type().to_string();
            let text = to_text(value);
            let elem = BytesStart::new("Parameter").with_attributes([
                ("name", param.name()),
                ("type", ptype.as_str()),
                ("value", text.as_str()),
            ]);
            writer.write_event(Event::Empty(elem)).map_err(write_err)?;
        }
        (None, Some(node)) => write_list(writer, param.name(), node)?,
        (None, None) => {}
    }
    Ok(())
}
