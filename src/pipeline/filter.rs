//! Filter rule set: structural rewrites applied to the document tree before
//! it is serialised to Markdown.
//!
//! One top-down walk, five handlers:
//!
//! | Node | Rule |
//! |------|------|
//! | `Div.cmdsynopsis` | flattened to a whitespace-normalised code block |
//! | other `Div`, `Span` | unwrapped; children spliced into the parent list |
//! | `Link` | attributes cleared; internal `.html` targets become `.md` |
//! | `CodeBlock` | attributes cleared (no language, no id) |
//! | `Image` | deleted when its source is a sentinel path |
//!
//! Walking top-down matters for nested `cmdsynopsis` divs: the outer one
//! flattens its whole subtree, so an inner one ends up as plain text.

use super::ast::{is_node_list, stringify, Attr, Node, PandocDocument, Target};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;
use tracing::warn;

/// Class marking a command-line usage block.
pub const CMDSYNOPSIS_CLASS: &str = "cmdsynopsis";

/// Decorative image dropped from every converted manual.
pub const DEFAULT_SENTINEL_IMAGE: &str = "image/background_index.png";

/// The filter rules, parameterised by the image sources to delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRules {
    sentinel_images: Vec<String>,
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            sentinel_images: vec![DEFAULT_SENTINEL_IMAGE.to_string()],
        }
    }
}

impl FilterRules {
    pub fn new(sentinel_images: Vec<String>) -> Self {
        Self { sentinel_images }
    }

    /// Rewrite the document's blocks in place. `meta` is left alone.
    pub fn apply(&self, doc: &mut PandocDocument) {
        let blocks = std::mem::take(&mut doc.blocks);
        doc.blocks = self.filter_list(blocks);
    }

    /// Filter a block or inline list, splicing unwrapped children.
    pub fn filter_list(&self, nodes: Vec<Value>) -> Vec<Value> {
        nodes
            .into_iter()
            .flat_map(|node| self.filter_node(node))
            .collect()
    }

    fn filter_node(&self, value: Value) -> Vec<Value> {
        let node = match Node::classify(value) {
            Ok(node) => node,
            Err(malformed) => {
                warn!("Passing node through unmodified: {}", malformed);
                return vec![malformed.value];
            }
        };

        match node {
            Node::Div { attr, content } if attr.has_class(CMDSYNOPSIS_CLASS) => {
                let text = collapse_whitespace(&stringify(&content));
                vec![Node::code_block(text).into_value()]
            }
            Node::Div { content, .. } => self.filter_list(content),
            Node::Span { content, .. } => self.filter_list(content),
            Node::Link {
                content, target, ..
            } => {
                let Target(url, title) = target;
                let url = rewrite_link_target(&url).into_owned();
                vec![Node::Link {
                    attr: Attr::default(),
                    content: self.filter_list(content),
                    target: Target(url, title),
                }
                .into_value()]
            }
            Node::CodeBlock { text, .. } => vec![Node::code_block(text).into_value()],
            Node::Image { target, .. } if self.is_sentinel(target.url()) => Vec::new(),
            Node::Image {
                attr,
                content,
                target,
            } => vec![Node::Image {
                attr,
                content: self.filter_list(content),
                target,
            }
            .into_value()],
            Node::Other(value) => vec![self.descend(value)],
        }
    }

    /// Recurse into a node kind the rules do not handle.
    fn descend(&self, value: Value) -> Value {
        match value {
            Value::Array(items) if is_node_list(&items) => Value::Array(self.filter_list(items)),
            Value::Array(items) => {
                Value::Array(items.into_iter().map(|item| self.descend(item)).collect())
            }
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(key, item)| (key, self.descend(item)))
                    .collect(),
            ),
            other => other,
        }
    }

    fn is_sentinel(&self, src: &str) -> bool {
        self.sentinel_images.iter().any(|s| s == src)
    }
}

/// Collapse runs of spaces, tabs and newlines to one space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_ascii_whitespace().collect::<Vec<_>>().join(" ")
}

static RE_URI_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").unwrap());

static LINK_RULES: Lazy<[(Regex, &'static str); 3]> = Lazy::new(|| {
    [
        (Regex::new(r"\.html(\?.*)$").unwrap(), ".md$1"),
        (Regex::new(r"\.html(#.*)$").unwrap(), ".md$1"),
        (Regex::new(r"\.html$").unwrap(), ".md"),
    ]
});

/// Point internal `.html` links at the `.md` file the converter produces.
///
/// Targets with a URI scheme are external and returned unchanged. Only the
/// first matching rule applies.
pub fn rewrite_link_target(target: &str) -> Cow<'_, str> {
    if RE_URI_SCHEME.is_match(target) {
        return Cow::Borrowed(target);
    }
    for (pattern, replacement) in LINK_RULES.iter() {
        if pattern.is_match(target) {
            return pattern.replace(target, *replacement);
        }
    }
    Cow::Borrowed(target)
}
