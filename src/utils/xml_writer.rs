//! Pretty-printing XMLTV serializer
//!
//! Output is UTF-8 with an XML declaration and two-space indentation.
//! Every text node is trimmed and stripped of control characters on the
//! way out; text that ends up empty is dropped, so an element whose only
//! content was whitespace is written self-closing.

use crate::errors::{XmlError, XmlResult};
use crate::utils::text::clean_trimmed;
use crate::utils::xml_tree::{Element, Node};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::path::Path;
use tracing::debug;

const INDENT_SIZE: usize = 2;

/// Serialize a root element into a complete pretty-printed document
pub fn to_pretty_xml(root: &Element) -> XmlResult<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_SIZE);

    emit(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;
    write_element(&mut writer, root)?;

    let mut output = writer.into_inner();
    output.push(b'\n');
    Ok(output)
}

/// Serialize and write a document, creating parent directories as needed
pub fn write_document(root: &Element, path: &Path) -> XmlResult<()> {
    let output = to_pretty_xml(root)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    std::fs::write(path, &output)?;
    debug!("Wrote {} bytes to {}", output.len(), path.display());
    Ok(())
}

enum Cleaned<'a> {
    Element(&'a Element),
    Text(String),
}

fn write_element<W: std::io::Write>(writer: &mut Writer<W>, element: &Element) -> XmlResult<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    let children: Vec<Cleaned<'_>> = element
        .children
        .iter()
        .filter_map(|node| match node {
            Node::Element(child) => Some(Cleaned::Element(child)),
            Node::Text(text) => {
                let text = clean_trimmed(text);
                (!text.is_empty()).then_some(Cleaned::Text(text))
            }
        })
        .collect();

    if children.is_empty() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    for child in &children {
        match child {
            Cleaned::Element(child) => write_element(writer, child)?,
            Cleaned::Text(text) => emit(writer, Event::Text(BytesText::new(text)))?,
        }
    }
    emit(writer, Event::End(BytesEnd::new(element.name.as_str())))
}

fn emit<W: std::io::Write>(writer: &mut Writer<W>, event: Event<'_>) -> XmlResult<()> {
    writer
        .write_event(event)
        .map_err(|e| XmlError::Write(std::io::Error::other(e.to_string())))
}
