//! Document loader.
//!
//! Turns raw workflow bytes into a [`DocumentTree`]: a node arena in which an
//! alias is a back-reference to the anchored node, never a copy of it.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use saphyr_parser::{Event, Marker, Parser, ScalarStyle as YamlScalarStyle};

use crate::error::{Location, ScanError};

/// Index of a node inside its [`DocumentTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// How a scalar was written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    /// `|` block scalar.
    Literal,
    /// `>` block scalar.
    Folded,
}

impl ScalarStyle {
    /// Block scalars span several lines and hold free text such as shell scripts.
    #[must_use]
    pub fn is_block(self) -> bool {
        matches!(self, Self::Literal | Self::Folded)
    }
}

impl From<YamlScalarStyle> for ScalarStyle {
    fn from(style: YamlScalarStyle) -> Self {
        match style {
            YamlScalarStyle::Plain => Self::Plain,
            YamlScalarStyle::SingleQuoted => Self::SingleQuoted,
            YamlScalarStyle::DoubleQuoted => Self::DoubleQuoted,
            YamlScalarStyle::Literal => Self::Literal,
            YamlScalarStyle::Folded => Self::Folded,
        }
    }
}

/// A scalar value together with its presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scalar {
    pub value: String,
    pub style: ScalarStyle,
    pub location: Location,
}

/// A node of the generic YAML tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Entries in document order; scalar keys are unique.
    Mapping(Vec<(NodeId, NodeId)>),
    Sequence(Vec<NodeId>),
    Scalar(Scalar),
    /// Points at the anchored node it names.
    Alias(NodeId),
}

/// Every document of one YAML stream, sharing a single node arena.
#[derive(Debug, Clone, Default)]
pub struct DocumentTree {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

impl DocumentTree {
    /// Root node of each document, in stream order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// # Panics
    ///
    /// Panics if `id` was handed out by a different tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Follow an alias to the node it names. Anchored nodes are never aliases
    /// themselves, so a single hop is enough.
    ///
    /// # Panics
    ///
    /// Panics if `id` was handed out by a different tree.
    #[must_use]
    pub fn resolve(&self, id: NodeId) -> &Node {
        match self.node(id) {
            Node::Alias(target) => self.node(*target),
            node => node,
        }
    }

    /// Number of nodes stored in the arena (aliases count once).
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    fn scalar_key(&self, id: NodeId) -> Option<&Scalar> {
        match self.resolve(id) {
            Node::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }
}

/// Parse raw workflow bytes into a [`DocumentTree`].
///
/// # Errors
///
/// Returns [`ScanError::MalformedDocument`] if the bytes are not UTF-8, are not
/// well-formed YAML, reference an undefined or recursive alias, define an anchor
/// name twice in one document, or repeat a key within one mapping.
pub fn parse(raw: &[u8]) -> Result<DocumentTree, ScanError> {
    let text = std::str::from_utf8(raw).map_err(|e| {
        ScanError::malformed(format!("input is not valid UTF-8: {e}"), None)
    })?;
    let text = normalize_line_endings(text.strip_prefix('\u{feff}').unwrap_or(text));

    build_tree(&text)
}

/// Rewrite CRLF and lone CR line breaks as LF.
///
/// YAML folds every line break kind to LF inside scalars, so this never
/// changes logical content; it only makes mixed inputs tokenize identically.
fn normalize_line_endings(text: &str) -> Cow<'_, str> {
    if !text.contains('\r') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
}

fn location_of(marker: &Marker) -> Location {
    Location {
        line: marker.line(),
        column: marker.col() + 1,
    }
}

enum Frame {
    Mapping {
        anchor: usize,
        entries: Vec<(NodeId, NodeId)>,
        pending_key: Option<NodeId>,
        seen_keys: HashSet<String>,
    },
    Sequence {
        anchor: usize,
        items: Vec<NodeId>,
    },
}

#[derive(Default)]
struct TreeBuilder {
    tree: DocumentTree,
    stack: Vec<Frame>,
    /// Parser anchor id -> completed node, scoped to the current document.
    anchors: HashMap<usize, NodeId>,
    /// Anchor names defined so far in the current document.
    anchor_names: HashSet<String>,
}

impl TreeBuilder {
    /// YAML lets a later anchor silently shadow an earlier one. Workflows
    /// reject that.
    fn define_anchor(&mut self, name: &str, at: Location) -> Result<(), ScanError> {
        if !self.anchor_names.insert(name.to_owned()) {
            return Err(ScanError::malformed(
                format!("anchor `&{name}` is defined more than once"),
                Some(at),
            ));
        }
        Ok(())
    }

    fn complete(&mut self, node: Node, anchor: usize) -> Result<(), ScanError> {
        let id = self.tree.push(node);
        if anchor != 0 {
            self.anchors.insert(anchor, id);
        }
        self.attach(id)
    }

    fn attach(&mut self, id: NodeId) -> Result<(), ScanError> {
        match self.stack.last_mut() {
            None => self.tree.roots.push(id),
            Some(Frame::Sequence { items, .. }) => items.push(id),
            Some(Frame::Mapping {
                entries,
                pending_key,
                seen_keys,
                ..
            }) => match pending_key.take() {
                None => *pending_key = Some(id),
                Some(key) => {
                    if let Some(scalar) = self.tree.scalar_key(key)
                        && !seen_keys.insert(scalar.value.clone())
                    {
                        return Err(ScanError::malformed(
                            format!("duplicate mapping key `{}`", scalar.value),
                            Some(scalar.location),
                        ));
                    }
                    entries.push((key, id));
                }
            },
        }
        Ok(())
    }

    fn handle(&mut self, event: Event<'_>, at: Location) -> Result<(), ScanError> {
        match event {
            Event::DocumentStart(..) => {
                self.anchors.clear();
                self.anchor_names.clear();
            }
            Event::Scalar(value, style, anchor, _) => {
                let scalar = Scalar {
                    value: value.into_owned(),
                    style: style.into(),
                    location: at,
                };
                self.complete(Node::Scalar(scalar), anchor)?;
            }
            Event::Alias(anchor) => {
                let Some(&target) = self.anchors.get(&anchor) else {
                    return Err(ScanError::malformed(
                        "alias refers to an anchor that is undefined or still being defined",
                        Some(at),
                    ));
                };
                let id = self.tree.push(Node::Alias(target));
                self.attach(id)?;
            }
            Event::SequenceStart(anchor, _) => self.stack.push(Frame::Sequence {
                anchor,
                items: Vec::new(),
            }),
            Event::MappingStart(anchor, _) => self.stack.push(Frame::Mapping {
                anchor,
                entries: Vec::new(),
                pending_key: None,
                seen_keys: HashSet::new(),
            }),
            Event::SequenceEnd | Event::MappingEnd => {
                let (node, anchor) = match self.stack.pop() {
                    Some(Frame::Sequence { anchor, items }) => (Node::Sequence(items), anchor),
                    Some(Frame::Mapping {
                        anchor, entries, ..
                    }) => (Node::Mapping(entries), anchor),
                    None => {
                        return Err(ScanError::malformed(
                            "collection end without matching start",
                            Some(at),
                        ));
                    }
                };
                self.complete(node, anchor)?;
            }
            Event::Nothing | Event::StreamStart | Event::StreamEnd | Event::DocumentEnd => {}
        }
        Ok(())
    }
}

fn build_tree(text: &str) -> Result<DocumentTree, ScanError> {
    let source = SourceText::new(text);
    let mut builder = TreeBuilder::default();
    let mut previous_end = Marker::default();

    for next in Parser::new_from_str(text) {
        let (event, span) = next.map_err(|e| {
            ScanError::malformed(e.info().to_owned(), Some(location_of(e.marker())))
        })?;
        let at = location_of(&span.start);
        // Events only carry numeric anchor ids; the name sits in the source
        // just before the anchored node.
        if anchor_id(&event) != 0
            && let Some(name) = anchor_name(source.between(&previous_end, &span.start))
        {
            builder.define_anchor(name, at)?;
        }
        if span.end.index() > previous_end.index() {
            previous_end = span.end;
        }
        builder.handle(event, at)?;
    }
    if !builder.stack.is_empty() {
        return Err(ScanError::malformed("unterminated collection", None));
    }
    Ok(builder.tree)
}

fn anchor_id(event: &Event<'_>) -> usize {
    match event {
        Event::Scalar(_, _, anchor, _)
        | Event::SequenceStart(anchor, _)
        | Event::MappingStart(anchor, _) => *anchor,
        _ => 0,
    }
}

/// Anchor written in `gap`, the text between an anchored node and the event
/// before it. Indicators, a tag and comments may share the gap.
fn anchor_name(gap: &str) -> Option<&str> {
    let mut name = None;
    for line in gap.lines() {
        for word in line.split_whitespace() {
            if word.starts_with('#') {
                break;
            }
            if let Some(rest) = word.trim_start_matches([',', ':', '?']).strip_prefix('&') {
                name = rest.split([',', '[', ']', '{', '}']).next();
            }
        }
    }
    name.filter(|n| !n.is_empty())
}

/// Source text addressed by parser markers, which count chars, not bytes.
struct SourceText<'t> {
    text: &'t str,
    /// Byte offset of every char plus the end offset; `None` for ASCII text.
    char_starts: Option<Vec<usize>>,
}

impl<'t> SourceText<'t> {
    fn new(text: &'t str) -> Self {
        let char_starts = (!text.is_ascii()).then(|| {
            text.char_indices()
                .map(|(at, _)| at)
                .chain(std::iter::once(text.len()))
                .collect()
        });
        Self { text, char_starts }
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        match &self.char_starts {
            None => char_index.min(self.text.len()),
            Some(starts) => starts.get(char_index).copied().unwrap_or(self.text.len()),
        }
    }

    fn between(&self, from: &Marker, to: &Marker) -> &'t str {
        let start = self.byte_offset(from.index());
        let end = self.byte_offset(to.index());
        self.text.get(start..end).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root_mapping(tree: &DocumentTree) -> &[(NodeId, NodeId)] {
        match tree.node(tree.roots()[0]) {
            Node::Mapping(entries) => entries,
            other => panic!("expected mapping root, got {other:?}"),
        }
    }

    fn scalar<'a>(tree: &'a DocumentTree, id: NodeId) -> &'a Scalar {
        match tree.resolve(id) {
            Node::Scalar(s) => s,
            other => panic!("expected scalar, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_empty_mapping() {
        let tree = parse(b"{}").unwrap();
        assert_eq!(tree.roots().len(), 1);
        assert!(root_mapping(&tree).is_empty());
    }

    #[test]
    fn test_parse_empty_stream_has_no_documents() {
        let tree = parse(b"").unwrap();
        assert!(tree.roots().is_empty());
        assert!(tree.is_empty());
    }

    #[test]
    fn test_parse_keeps_key_order() {
        let tree = parse(b"zeta: 1\nalpha: 2\nmid: 3\n").unwrap();
        let keys: Vec<&str> = root_mapping(&tree)
            .iter()
            .map(|(k, _)| scalar(&tree, *k).value.as_str())
            .collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_parse_records_scalar_style() {
        let tree = parse(b"a: plain\nb: 'single'\nc: \"double\"\nd: |\n  literal\ne: >\n  folded\n")
            .unwrap();
        let styles: Vec<ScalarStyle> = root_mapping(&tree)
            .iter()
            .map(|(_, v)| scalar(&tree, *v).style)
            .collect();
        assert_eq!(
            styles,
            [
                ScalarStyle::Plain,
                ScalarStyle::SingleQuoted,
                ScalarStyle::DoubleQuoted,
                ScalarStyle::Literal,
                ScalarStyle::Folded,
            ]
        );
        assert!(!ScalarStyle::DoubleQuoted.is_block());
        assert!(ScalarStyle::Literal.is_block());
    }

    #[test]
    fn test_parse_scalar_location_is_one_based() {
        let tree = parse(b"first: 1\nsecond: value\n").unwrap();
        let (_, value) = root_mapping(&tree)[1];
        let loc = scalar(&tree, value).location;
        assert_eq!(loc, Location { line: 2, column: 9 });
    }

    #[test]
    fn test_alias_points_at_anchored_node() {
        let tree = parse(b"base: &b\n  k: v\ncopy: *b\n").unwrap();
        let entries = root_mapping(&tree);
        let (_, anchored) = entries[0];
        let (_, alias) = entries[1];
        assert_eq!(tree.node(alias), &Node::Alias(anchored));
        assert_eq!(tree.resolve(alias), tree.node(anchored));
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn test_node_id_from_another_tree_panics() {
        let big = parse(b"a: [1, 2, 3]\n").unwrap();
        let small = parse(b"{}").unwrap();
        let _ = small.node(NodeId(big.len() - 1));
    }

    #[test]
    fn test_undefined_alias_is_malformed() {
        let err = parse(b"a: *missing\n").unwrap_err();
        assert!(matches!(err, ScanError::MalformedDocument { .. }));
    }

    #[test]
    fn test_recursive_alias_is_malformed() {
        let err = parse(b"a: &loop\n  - *loop\n").unwrap_err();
        assert!(matches!(err, ScanError::MalformedDocument { .. }));
    }

    #[test]
    fn test_duplicate_anchor_is_malformed() {
        let err = parse(b"a: &x 1\nb: &x 2\n").unwrap_err();
        assert!(err.to_string().contains("&x"), "got: {err}");
    }

    #[test]
    fn test_duplicate_anchor_on_collections_is_malformed() {
        let err = parse(b"b: &yy\n  k: v\nc: &yy\n  - 1\n").unwrap_err();
        assert!(err.to_string().contains("&yy"), "got: {err}");
        assert_eq!(err.location().map(|l| l.line), Some(4));
    }

    #[test]
    fn test_anchor_text_in_comments_and_scalars_is_ignored() {
        let input = "a: &y # &x\n  1\nb: 'also &x'\nc: |\n  echo &x\nd: &x 2\n";
        let tree = parse(input.as_bytes()).unwrap();
        assert_eq!(root_mapping(&tree).len(), 4);
    }

    #[test]
    fn test_anchor_names_after_multibyte_text() {
        let input = "n\u{e9}: &\u{fc} 1\nb: &x [2]\nc: &\u{fc} 3\n";
        let err = parse(input.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("&\u{fc}"), "got: {err}");

        let distinct = "n\u{e9}\u{e9}: &a 1\nb: &b {k: v}\nc: *a\n";
        assert!(parse(distinct.as_bytes()).is_ok());
    }

    #[test]
    fn test_anchor_name_skips_indicators_and_comments() {
        assert_eq!(anchor_name(": &base\n  "), Some("base"));
        assert_eq!(anchor_name(", !!map &f "), Some("f"));
        assert_eq!(anchor_name(": &y # &x\n  "), Some("y"));
        assert_eq!(anchor_name(": "), None);
    }

    #[test]
    fn test_same_anchor_in_separate_documents_is_allowed() {
        let tree = parse(b"a: &x 1\n---\nb: &x 2\n").unwrap();
        assert_eq!(tree.roots().len(), 2);
    }

    #[test]
    fn test_duplicate_key_is_malformed() {
        let err = parse(b"uses: a/b@v1\nuses: a/b@v2\n").unwrap_err();
        assert!(err.to_string().contains("duplicate mapping key"), "got: {err}");
        assert_eq!(err.location().map(|l| l.line), Some(2));
    }

    #[test]
    fn test_unterminated_flow_sequence_is_malformed() {
        assert!(parse(b"jobs: [").is_err());
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        let err = parse(&[b'a', b':', b' ', 0xff, 0xfe]).unwrap_err();
        assert!(err.to_string().contains("UTF-8"), "got: {err}");
    }

    #[test]
    fn test_normalize_line_endings() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\n"), "a\nb\nc\n");
        assert!(matches!(normalize_line_endings("a\nb"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_leading_bom_is_ignored() {
        let tree = parse("\u{feff}key: value\n".as_bytes()).unwrap();
        assert_eq!(root_mapping(&tree).len(), 1);
    }
}
