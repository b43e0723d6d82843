//! Utility modules for the EPG merger
//!
//! - `xml_tree` builds owned element trees from quick-xml events
//! - `xml_writer` pretty-prints element trees back to XMLTV
//! - `text` strips characters XML does not allow
//! - `time` renders the generation `date` stamp

pub mod text;
pub mod time;
pub mod xml_tree;
pub mod xml_writer;

pub use text::clean_text;
pub use xml_tree::{parse_document, Element, Node};
