use crate::utils::xml_tree::{Element, Node};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const CHANNEL_TAG: &str = "channel";
pub const PROGRAMME_TAG: &str = "programme";
pub const DISPLAY_NAME_TAG: &str = "display-name";

/// One merge task: the inputs are merged in order into `output`.
///
/// The first input is the base document. Its root attributes and channel
/// numbering are authoritative for the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub output: PathBuf,
    pub inputs: Vec<PathBuf>,
}

impl MergeGroup {
    pub fn new<O: Into<PathBuf>, I: Into<PathBuf>>(
        output: O,
        inputs: impl IntoIterator<Item = I>,
    ) -> Self {
        Self {
            name: None,
            output: output.into(),
            inputs: inputs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn base(&self) -> Option<&Path> {
        self.inputs.first().map(PathBuf::as_path)
    }

    /// Name used in log lines: the configured name or the output path
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.output.display().to_string(),
        }
    }
}

/// A loaded input document with the label it is reported under
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub label: String,
    pub root: Element,
}

impl SourceDocument {
    pub fn new<S: Into<String>>(label: S, root: Element) -> Self {
        Self {
            label: label.into(),
            root,
        }
    }
}

/// Trimmed, non-empty display names of a channel element in document order,
/// without duplicates
pub fn display_names(channel: &Element) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in channel
        .find_all(DISPLAY_NAME_TAG)
        .map(|dn| dn.text().trim().to_string())
    {
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// A channel in the merged document together with its known names
#[derive(Debug, Clone)]
pub struct ChannelEntry {
    pub names: Vec<String>,
    pub element: Element,
}

impl ChannelEntry {
    /// Wrap a channel element, dropping `display-name` children that repeat
    /// an earlier name of the same channel
    pub fn from_element(mut element: Element) -> Self {
        let mut names: Vec<String> = Vec::new();
        element.children.retain(|node| match node {
            Node::Element(child) if child.name == DISPLAY_NAME_TAG => {
                let name = child.text().trim().to_string();
                if name.is_empty() {
                    return true;
                }
                if names.contains(&name) {
                    return false;
                }
                names.push(name);
                true
            }
            _ => true,
        });

        Self { names, element }
    }

    pub fn id(&self) -> Option<&str> {
        self.element
            .attribute("id")
            .filter(|id| !id.is_empty())
    }

    pub fn set_id<S: Into<String>>(&mut self, id: S) {
        self.element.set_attribute("id", id);
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Append a display name unless the channel already carries it.
    /// Returns whether the name was added.
    pub fn add_name(&mut self, name: &str) -> bool {
        if self.has_name(name) {
            return false;
        }
        self.element
            .push_child(Element::new(DISPLAY_NAME_TAG).with_text(name));
        self.names.push(name.to_string());
        true
    }
}

/// Recoverable conditions met while processing a merge group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeWarning {
    MissingInput { path: PathBuf },
    UnparseableInput { path: PathBuf, message: String },
    UnresolvedChannel { source: String, channel: String },
}

impl fmt::Display for MergeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingInput { path } => write!(f, "file does not exist: {}", path.display()),
            Self::UnparseableInput { path, message } => {
                write!(f, "failed to parse {}: {}", path.display(), message)
            }
            Self::UnresolvedChannel { source, channel } => {
                write!(f, "no matching channel for '{}' in {}", channel, source)
            }
        }
    }
}

/// Counters and warnings for one merge group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub inputs_loaded: usize,
    pub inputs_skipped: usize,
    pub base_channels: usize,
    pub channels_added: usize,
    pub channels_merged: usize,
    pub channels_skipped: usize,
    pub names_added: usize,
    pub programmes_collected: usize,
    pub programmes_dropped: usize,
    pub programmes_orphaned: usize,
    pub channels_written: usize,
    pub programmes_written: usize,
    pub warnings: Vec<MergeWarning>,
}

impl MergeReport {
    pub fn warn(&mut self, warning: MergeWarning) {
        self.warnings.push(warning);
    }

    pub fn unresolved_channels(&self) -> impl Iterator<Item = &str> {
        self.warnings.iter().filter_map(|w| match w {
            MergeWarning::UnresolvedChannel { channel, .. } => Some(channel.as_str()),
            _ => None,
        })
    }
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "inputs={}/{} channels={} (base={} added={} merged={}) names_added={} programmes={} dropped={} warnings={}",
            self.inputs_loaded,
            self.inputs_loaded + self.inputs_skipped,
            self.channels_written,
            self.base_channels,
            self.channels_added,
            self.channels_merged,
            self.names_added,
            self.programmes_written,
            self.programmes_dropped + self.programmes_orphaned,
            self.warnings.len()
        )
    }
}
