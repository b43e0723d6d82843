//! Quick-XML based element tree
//!
//! XMLTV programmes carry arbitrary children (titles, credits, ratings,
//! episode numbers) that must survive a merge untouched, so instead of
//! extracting a fixed set of fields this module builds a small owned tree
//! from the quick-xml event stream. Comments, processing instructions and
//! the doctype are not retained.

use crate::errors::{XmlError, XmlResult};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// A child of an element: either a nested element or a run of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An owned XML element with ordered attributes and children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder form of [`Element::set_attribute`]
    pub fn with_attribute<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// Builder form of [`Element::push_child`]
    pub fn with_child(mut self, child: Element) -> Self {
        self.push_child(child);
        self
    }

    /// Builder form of [`Element::push_text`]
    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.push_text(text);
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Replace an attribute in place, or append it if not present
    pub fn set_attribute<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn push_text<S: Into<String>>(&mut self, text: S) {
        self.children.push(Node::Text(text.into()));
    }

    /// Concatenated direct text content
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// Direct children with the given tag name, in document order
    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.child_elements().filter(move |child| child.name == name)
    }

    /// Detach all children, leaving the element empty
    pub fn take_children(&mut self) -> Vec<Node> {
        std::mem::take(&mut self.children)
    }
}

/// Parse a complete XML document into its root element
pub fn parse_document(content: &str) -> XmlResult<Element> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(|source| XmlError::Parse {
            position: reader.buffer_position() as u64,
            source,
        })?;

        match event {
            Event::Start(ref e) => {
                stack.push(element_from_start(e)?);
            }

            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| XmlError::malformed("closing tag without matching start"))?;
                attach(&mut stack, &mut root, element)?;
            }

            Event::Empty(ref e) => {
                let element = element_from_start(e)?;
                attach(&mut stack, &mut root, element)?;
            }

            Event::Text(e) => {
                let text = e.unescape().map_err(|source| XmlError::Parse {
                    position: reader.buffer_position() as u64,
                    source,
                })?;
                // Text outside the root element is ignored
                if let Some(parent) = stack.last_mut() {
                    parent.push_text(text.into_owned());
                }
            }

            Event::CData(e) => {
                if let Some(parent) = stack.last_mut() {
                    parent.push_text(String::from_utf8_lossy(&e).into_owned());
                }
            }

            Event::Eof => break,

            _ => {} // Comments, declarations, doctype, processing instructions
        }
    }

    if let Some(open) = stack.last() {
        return Err(XmlError::malformed(format!(
            "unexpected end of document inside <{}>",
            open.name
        )));
    }

    root.ok_or(XmlError::NoRoot)
}

fn element_from_start(start: &BytesStart) -> XmlResult<Element> {
    let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());

    for attr in start.attributes() {
        let attr = attr.map_err(|e| XmlError::malformed(format!("invalid attribute: {e}")))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| XmlError::malformed(format!("invalid value for attribute '{key}': {e}")))?
            .into_owned();
        element.attributes.push((key, value));
    }

    Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> XmlResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.push_child(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(XmlError::malformed(format!(
                "second root element <{}>",
                element.name
            )))
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE tv SYSTEM "xmltv.dtd">
<tv generator-info-name="upstream">
  <!-- channels -->
  <channel id="1">
    <display-name lang="en">CNN &amp; Friends</display-name>
    <icon src="http://example.com/cnn.png"/>
  </channel>
  <programme start="20240101120000 +0000" stop="20240101130000 +0000" channel="1">
    <title><![CDATA[News <Live>]]></title>
  </programme>
</tv>"#;

    #[test]
    fn test_parse_document_structure() {
        let root = parse_document(SAMPLE).unwrap();
        assert_eq!(root.name, "tv");
        assert_eq!(root.attribute("generator-info-name"), Some("upstream"));

        let channels: Vec<_> = root.find_all("channel").collect();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].attribute("id"), Some("1"));

        let name = channels[0].find_all("display-name").next().unwrap();
        assert_eq!(name.text(), "CNN & Friends");
        assert_eq!(name.attribute("lang"), Some("en"));

        let icon = channels[0].find_all("icon").next().unwrap();
        assert!(icon.children.is_empty());
        assert_eq!(icon.attribute("src"), Some("http://example.com/cnn.png"));

        let programme = root.find_all("programme").next().unwrap();
        let title = programme.find_all("title").next().unwrap();
        assert_eq!(title.text(), "News <Live>");
    }

    #[test]
    fn test_parse_rejects_broken_documents() {
        assert!(parse_document("<tv><channel></tv>").is_err());
        assert!(parse_document("<tv><channel id=\"1\">").is_err());
        assert!(matches!(parse_document(""), Err(XmlError::NoRoot)));
        assert!(matches!(
            parse_document("<tv/><tv/>"),
            Err(XmlError::Malformed { .. })
        ));
    }

    #[test]
    fn test_set_attribute_replaces_in_place() {
        let mut element = Element::new("tv")
            .with_attribute("generator-info-name", "old")
            .with_attribute("source-info-url", "http://x");

        element.set_attribute("generator-info-name", "new");
        element.set_attribute("date", "20240101000000");

        assert_eq!(
            element.attributes,
            vec![
                ("generator-info-name".to_string(), "new".to_string()),
                ("source-info-url".to_string(), "http://x".to_string()),
                ("date".to_string(), "20240101000000".to_string()),
            ]
        );
    }

    #[test]
    fn test_take_children_empties_element() {
        let mut element = Element::new("tv")
            .with_child(Element::new("channel"))
            .with_text("stray");
        let children = element.take_children();
        assert_eq!(children.len(), 2);
        assert!(element.children.is_empty());
        assert_eq!(element.child_elements().count(), 0);
    }
}
