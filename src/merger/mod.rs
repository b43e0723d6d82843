//! Channel deduplication and programme remapping
//!
//! The first document of a merge group is the base: its root element,
//! attributes and channels seed the merge. Every further document is folded
//! in channel by channel. A channel that shares any display name with an
//! already known channel is merged into it (missing names are copied over);
//! otherwise it is appended with the next free numeric id. Programmes follow
//! their channel through an old-id to new-id map built per document.
//!
//! When an incoming channel's names hit several different known channels,
//! the first hit in the incoming channel's name order wins and the other
//! channels are left alone. Names already owned by another channel are not
//! copied onto the winner, so a display name never ends up on two channels.

pub mod reassemble;

use crate::models::{
    ChannelEntry, MergeReport, MergeWarning, SourceDocument, CHANNEL_TAG, PROGRAMME_TAG,
};
use crate::utils::xml_tree::{Element, Node};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

pub use reassemble::{interleave, reassemble};

pub const GENERATOR_NAME_ATTR: &str = "generator-info-name";
pub const GENERATOR_URL_ATTR: &str = "generator-info-url";
pub const DATE_ATTR: &str = "date";

/// Values stamped onto the root element of every merged document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSettings {
    pub generator_info_name: String,
    pub generator_info_url: String,
    /// Pre-formatted `date` attribute (`%Y%m%d%H%M%S`)
    pub generated_at: String,
}

/// Display name to position of the owning channel in the merged list.
///
/// The first channel to claim a name keeps it.
#[derive(Debug, Default)]
pub struct NameIndex {
    owners: HashMap<String, usize>,
}

impl NameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.owners.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.owners.contains_key(name)
    }

    /// Claim a name for a channel. Returns false if it was already owned.
    pub fn claim(&mut self, name: &str, channel: usize) -> bool {
        if self.owners.contains_key(name) {
            return false;
        }
        self.owners.insert(name.to_string(), channel);
        true
    }

    /// First channel owning any of the given names, in the order given
    pub fn first_match<'a>(&self, names: impl IntoIterator<Item = &'a String>) -> Option<usize> {
        names.into_iter().find_map(|name| self.get(name))
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

/// Unbounded non-negative channel number kept as normalised decimal digits.
///
/// Base ids can be arbitrarily long digit strings, so the running maximum
/// never goes through a fixed-width integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelNumber {
    digits: String,
}

impl ChannelNumber {
    pub fn zero() -> Self {
        Self {
            digits: "0".to_string(),
        }
    }

    /// Parse a decimal id such as `"42"`, `" 007 "` or `"+5"`.
    /// Returns None for anything else, including negative numbers.
    pub fn parse(id: &str) -> Option<Self> {
        let id = id.trim();
        let id = id.strip_prefix('+').unwrap_or(id);
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let trimmed = id.trim_start_matches('0');
        Some(Self {
            digits: if trimmed.is_empty() { "0" } else { trimmed }.to_string(),
        })
    }

    /// Advance to the next number
    pub fn increment(&mut self) {
        let mut digits = std::mem::take(&mut self.digits).into_bytes();
        let mut carry = true;
        for digit in digits.iter_mut().rev() {
            if *digit == b'9' {
                *digit = b'0';
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, b'1');
        }
        self.digits = digits.into_iter().map(char::from).collect();
    }

    pub fn as_str(&self) -> &str {
        &self.digits
    }
}

impl Ord for ChannelNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        self.digits
            .len()
            .cmp(&other.digits.len())
            .then_with(|| self.digits.cmp(&other.digits))
    }
}

impl PartialOrd for ChannelNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ChannelNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.digits)
    }
}

/// Result of merging every document of a group, before reassembly
#[derive(Debug)]
pub struct MergedGuide {
    /// Base root element with its channel and programme children removed
    pub root: Element,
    /// Channels in output order: base channels first, then new ones
    pub channels: Vec<ChannelEntry>,
    /// Programmes keyed by merged channel id, in encounter order
    pub programmes: HashMap<String, Vec<Element>>,
    /// Other children of the base root, emitted after the channels
    pub extras: Vec<Node>,
}

impl MergedGuide {
    pub fn channel(&self, id: &str) -> Option<&ChannelEntry> {
        self.channels.iter().find(|c| c.id() == Some(id))
    }

    /// Build the final document with programmes interleaved after their channel
    pub fn into_document(self, report: &mut MergeReport) -> Element {
        reassemble(self, report)
    }
}

/// Per-group merge state
pub struct ChannelMerger {
    root: Element,
    channels: Vec<ChannelEntry>,
    index: NameIndex,
    max_id: ChannelNumber,
    programmes: HashMap<String, Vec<Element>>,
    extras: Vec<Node>,
    report: MergeReport,
}

impl ChannelMerger {
    /// Seed the merge from the base document
    pub fn from_base(base: SourceDocument, settings: &MergeSettings) -> Self {
        let SourceDocument { label, mut root } = base;

        root.set_attribute(GENERATOR_NAME_ATTR, settings.generator_info_name.as_str());
        root.set_attribute(GENERATOR_URL_ATTR, settings.generator_info_url.as_str());
        root.set_attribute(DATE_ATTR, settings.generated_at.as_str());

        let (channel_elements, programme_elements, extras) = split_children(&mut root);

        let mut merger = Self {
            root,
            channels: Vec::with_capacity(channel_elements.len()),
            index: NameIndex::new(),
            max_id: ChannelNumber::zero(),
            programmes: HashMap::new(),
            extras,
            report: MergeReport::default(),
        };

        for element in channel_elements {
            let entry = ChannelEntry::from_element(element);
            let position = merger.channels.len();

            if let Some(id) = entry.id() {
                for name in &entry.names {
                    merger.index.claim(name, position);
                }
                if let Some(number) = ChannelNumber::parse(id) {
                    if number > merger.max_id {
                        merger.max_id = number;
                    }
                }
                merger.programmes.entry(id.to_string()).or_default();
            }

            merger.channels.push(entry);
        }
        merger.report.base_channels = merger.channels.len();
        if merger.index.is_empty() {
            debug!("Base {} has no named channels", label);
        }

        for programme in programme_elements {
            let known = programme
                .attribute("channel")
                .filter(|id| merger.programmes.contains_key(*id))
                .map(str::to_string);
            match known {
                Some(id) => {
                    merger.report.programmes_collected += 1;
                    merger.programmes.entry(id).or_default().push(programme);
                }
                None => {
                    debug!(
                        "Dropping programme for unknown channel {:?} in base {}",
                        programme.attribute("channel"),
                        label
                    );
                    merger.report.programmes_dropped += 1;
                }
            }
        }

        debug!(
            "Base {}: {} channels, {} indexed names, max id {}",
            label,
            merger.channels.len(),
            merger.index.len(),
            merger.max_id
        );

        merger
    }

    /// Fold one additional document into the merge
    pub fn merge_document(&mut self, document: SourceDocument) {
        let SourceDocument { label, mut root } = document;
        let (channel_elements, programme_elements, _) = split_children(&mut root);

        let mut id_map: HashMap<String, String> = HashMap::new();
        for element in channel_elements {
            if let Some((old_id, new_id)) = self.merge_channel(element) {
                id_map.insert(old_id, new_id);
            }
        }

        for mut programme in programme_elements {
            let old_id = programme.attribute("channel").unwrap_or_default().to_string();
            match id_map.get(&old_id) {
                Some(new_id) => {
                    programme.set_attribute("channel", new_id.as_str());
                    self.programmes
                        .entry(new_id.clone())
                        .or_default()
                        .push(programme);
                    self.report.programmes_collected += 1;
                }
                None => {
                    warn!("No matching channel for programme channel '{}' in {}", old_id, label);
                    self.report.warn(MergeWarning::UnresolvedChannel {
                        source: label.clone(),
                        channel: old_id,
                    });
                    self.report.programmes_dropped += 1;
                }
            }
        }

        info!(
            "Merged {}: {} channel ids mapped, {} channels total",
            label,
            id_map.len(),
            self.channels.len()
        );
    }

    /// Merge or append one incoming channel, returning its (old id, new id)
    fn merge_channel(&mut self, element: Element) -> Option<(String, String)> {
        let mut entry = ChannelEntry::from_element(element);

        if entry.names.is_empty() {
            self.report.channels_skipped += 1;
            return None;
        }
        let Some(old_id) = entry.id().map(str::to_string) else {
            debug!("Skipping channel without id: {:?}", entry.names);
            self.report.channels_skipped += 1;
            return None;
        };

        if let Some(target) = self.index.first_match(&entry.names) {
            for name in &entry.names {
                if self.channels[target].has_name(name) || self.index.contains(name) {
                    continue;
                }
                self.channels[target].add_name(name);
                self.index.claim(name, target);
                self.report.names_added += 1;
            }
            self.report.channels_merged += 1;

            let new_id = self.channels[target].id()?.to_string();
            debug!("Channel {} merged into {} via {:?}", old_id, new_id, entry.names);
            return Some((old_id, new_id));
        }

        self.max_id.increment();
        let new_id = self.max_id.to_string();
        entry.set_id(new_id.as_str());

        let position = self.channels.len();
        for name in &entry.names {
            self.index.claim(name, position);
        }
        self.programmes.entry(new_id.clone()).or_default();
        self.channels.push(entry);
        self.report.channels_added += 1;

        debug!("Channel {} added as {}", old_id, new_id);
        Some((old_id, new_id))
    }

    pub fn report_mut(&mut self) -> &mut MergeReport {
        &mut self.report
    }

    pub fn finish(self) -> (MergedGuide, MergeReport) {
        let guide = MergedGuide {
            root: self.root,
            channels: self.channels,
            programmes: self.programmes,
            extras: self.extras,
        };
        (guide, self.report)
    }
}

/// Merge a base document with additional documents, in order
pub fn merge(
    base: SourceDocument,
    additional: impl IntoIterator<Item = SourceDocument>,
    settings: &MergeSettings,
) -> (MergedGuide, MergeReport) {
    let mut merger = ChannelMerger::from_base(base, settings);
    for document in additional {
        merger.merge_document(document);
    }
    merger.finish()
}

/// Detach a root's children into (channels, programmes, everything else)
fn split_children(root: &mut Element) -> (Vec<Element>, Vec<Element>, Vec<Node>) {
    let mut channels = Vec::new();
    let mut programmes = Vec::new();
    let mut extras = Vec::new();

    for node in root.take_children() {
        match node {
            Node::Element(e) if e.name == CHANNEL_TAG => channels.push(e),
            Node::Element(e) if e.name == PROGRAMME_TAG => programmes.push(e),
            other => extras.push(other),
        }
    }

    (channels, programmes, extras)
}
