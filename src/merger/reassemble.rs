//! Rebuild the merged document so every channel is immediately followed by
//! its programmes.

use super::MergedGuide;
use crate::models::{ChannelEntry, MergeReport};
use crate::utils::xml_tree::{Element, Node};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Pair every channel with its programmes, in channel order.
///
/// Returns the pairs and the number of programmes whose channel id has no
/// channel element; those are not part of the output.
pub fn interleave(
    channels: Vec<ChannelEntry>,
    mut programmes: HashMap<String, Vec<Element>>,
) -> (Vec<(Element, Vec<Element>)>, usize) {
    let pairs: Vec<(Element, Vec<Element>)> = channels
        .into_iter()
        .map(|channel| {
            let owned = channel
                .id()
                .and_then(|id| programmes.remove(id))
                .unwrap_or_default();
            (channel.element, owned)
        })
        .collect();

    let orphaned = programmes.values().map(Vec::len).sum();
    (pairs, orphaned)
}

/// Produce the final root element for a merged guide
pub fn reassemble(guide: MergedGuide, report: &mut MergeReport) -> Element {
    let MergedGuide {
        mut root,
        channels,
        programmes,
        extras,
    } = guide;

    let (pairs, orphaned) = interleave(channels, programmes);
    if orphaned > 0 {
        warn!("{} programmes have no channel element and were dropped", orphaned);
    }

    report.channels_written = pairs.len();
    report.programmes_written = pairs.iter().map(|(_, p)| p.len()).sum();
    report.programmes_orphaned = orphaned;

    let mut children: Vec<Node> =
        Vec::with_capacity(report.channels_written + report.programmes_written + extras.len());
    for (channel, owned) in pairs {
        children.push(Node::Element(channel));
        children.extend(owned.into_iter().map(Node::Element));
    }
    children.extend(extras);
    root.children = children;

    debug!(
        "Reassembled {} channels with {} programmes",
        report.channels_written, report.programmes_written
    );
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merger::{merge, MergeSettings};
    use crate::models::{SourceDocument, CHANNEL_TAG, DISPLAY_NAME_TAG, PROGRAMME_TAG};

    fn settings() -> MergeSettings {
        MergeSettings {
            generator_info_name: "tvsilo.vip".to_string(),
            generator_info_url: "https://github.com/g12777/TV".to_string(),
            generated_at: "20240101080000".to_string(),
        }
    }

    fn channel(id: &str, name: &str) -> Element {
        Element::new(CHANNEL_TAG)
            .with_attribute("id", id)
            .with_child(Element::new(DISPLAY_NAME_TAG).with_text(name))
    }

    fn programme(channel: &str, title: &str) -> Element {
        Element::new(PROGRAMME_TAG)
            .with_attribute("channel", channel)
            .with_child(Element::new("title").with_text(title))
    }

    fn root_of(children: Vec<Element>) -> Element {
        children
            .into_iter()
            .fold(Element::new("tv"), |root, child| root.with_child(child))
    }

    /// (tag, id-or-channel) for every root child
    fn layout(root: &Element) -> Vec<(String, String)> {
        root.child_elements()
            .map(|e| {
                let key = if e.name == CHANNEL_TAG { "id" } else { "channel" };
                (e.name.clone(), e.attribute(key).unwrap_or_default().to_string())
            })
            .collect()
    }

    #[test]
    fn test_programmes_follow_their_channel() {
        let base = SourceDocument::new(
            "base",
            root_of(vec![
                channel("1", "CNN"),
                channel("2", "BBC"),
                programme("2", "b1"),
                programme("1", "c1"),
                programme("2", "b2"),
            ]),
        );
        let other = SourceDocument::new(
            "other",
            root_of(vec![
                channel("10", "Fox"),
                channel("11", "CNN"),
                programme("11", "c2"),
                programme("10", "f1"),
            ]),
        );

        let (guide, mut report) = merge(base, vec![other], &settings());
        let root = reassemble(guide, &mut report);

        let expected: Vec<(String, String)> = [
            ("channel", "1"),
            ("programme", "1"),
            ("programme", "1"),
            ("channel", "2"),
            ("programme", "2"),
            ("programme", "2"),
            ("channel", "3"),
            ("programme", "3"),
        ]
        .iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect();
        assert_eq!(layout(&root), expected);

        let cnn_titles: Vec<String> = root
            .find_all(PROGRAMME_TAG)
            .filter(|p| p.attribute("channel") == Some("1"))
            .map(|p| p.find_all("title").next().unwrap().text())
            .collect();
        assert_eq!(cnn_titles, vec!["c1", "c2"]);

        assert_eq!(report.channels_written, 3);
        assert_eq!(report.programmes_written, 5);
        assert_eq!(report.programmes_orphaned, 0);
    }

    #[test]
    fn test_channel_without_programmes_is_followed_by_next_channel() {
        let base = SourceDocument::new(
            "base",
            root_of(vec![channel("1", "CNN"), channel("2", "BBC"), programme("2", "b")]),
        );

        let (guide, mut report) = merge(base, Vec::new(), &settings());
        let root = reassemble(guide, &mut report);

        let names: Vec<_> = root.child_elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["channel", "channel", "programme"]);
    }

    #[test]
    fn test_orphaned_programmes_are_not_emitted() {
        let mut programmes = HashMap::new();
        programmes.insert("1".to_string(), vec![programme("1", "kept")]);
        programmes.insert("ghost".to_string(), vec![programme("ghost", "lost")]);

        let channels = vec![ChannelEntry::from_element(channel("1", "CNN"))];
        let (pairs, orphaned) = interleave(channels, programmes);

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].1.len(), 1);
        assert_eq!(orphaned, 1);
    }

    #[test]
    fn test_extras_are_emitted_after_channels() {
        let base = SourceDocument::new(
            "base",
            root_of(vec![Element::new("note"), channel("1", "CNN"), programme("1", "c")]),
        );

        let (guide, mut report) = merge(base, Vec::new(), &settings());
        let root = reassemble(guide, &mut report);

        let names: Vec<_> = root.child_elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["channel", "programme", "note"]);
    }
}
