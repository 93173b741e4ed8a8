//! Typed view over the engine's JSON document tree.
//!
//! Pandoc exchanges documents as JSON: every block and inline is an object
//! `{"t": <tag>, "c": <payload>}`. The filter only cares about five tags, so
//! instead of modelling the whole pandoc type zoo we classify each node into
//! a closed [`Node`] enum and keep everything else as raw JSON in
//! [`Node::Other`]. Payloads of the five known tags are decoded with serde;
//! a payload with the wrong shape surfaces as [`MalformedNode`] carrying the
//! untouched value so the caller can pass it through.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// A full pandoc JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PandocDocument {
    #[serde(rename = "pandoc-api-version")]
    pub api_version: Vec<u32>,
    pub meta: Value,
    pub blocks: Vec<Value>,
}

/// `[identifier, [classes], [[key, value]]]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attr(pub String, pub Vec<String>, pub Vec<(String, String)>);

impl Attr {
    pub fn has_class(&self, class: &str) -> bool {
        self.1.iter().any(|c| c == class)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty() && self.1.is_empty() && self.2.is_empty()
    }
}

/// `[url, title]` of a link or image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Target(pub String, pub String);

impl Target {
    pub fn url(&self) -> &str {
        &self.0
    }
}

/// The node kinds the filter rules dispatch on.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Div { attr: Attr, content: Vec<Value> },
    Span { attr: Attr, content: Vec<Value> },
    Link { attr: Attr, content: Vec<Value>, target: Target },
    Image { attr: Attr, content: Vec<Value>, target: Target },
    CodeBlock { attr: Attr, text: String },
    Other(Value),
}

/// A known tag whose payload did not decode. `value` is the original node.
#[derive(Debug, Error)]
#[error("malformed `{tag}` node: {source}")]
pub struct MalformedNode {
    pub tag: String,
    pub value: Value,
    #[source]
    pub source: serde_json::Error,
}

impl Node {
    /// Classify a raw JSON node.
    pub fn classify(value: Value) -> Result<Node, MalformedNode> {
        let Some(tag) = tag_of(&value) else {
            return Ok(Node::Other(value));
        };
        let payload = value.get("c").unwrap_or(&Value::Null);
        let decoded = match tag {
            "Div" => <(Attr, Vec<Value>)>::deserialize(payload)
                .map(|(attr, content)| Node::Div { attr, content }),
            "Span" => <(Attr, Vec<Value>)>::deserialize(payload)
                .map(|(attr, content)| Node::Span { attr, content }),
            "Link" => <(Attr, Vec<Value>, Target)>::deserialize(payload).map(
                |(attr, content, target)| Node::Link {
                    attr,
                    content,
                    target,
                },
            ),
            "Image" => <(Attr, Vec<Value>, Target)>::deserialize(payload).map(
                |(attr, content, target)| Node::Image {
                    attr,
                    content,
                    target,
                },
            ),
            "CodeBlock" => <(Attr, String)>::deserialize(payload)
                .map(|(attr, text)| Node::CodeBlock { attr, text }),
            _ => return Ok(Node::Other(value)),
        };
        decoded.map_err(|source| MalformedNode {
            tag: tag.to_string(),
            value: value.clone(),
            source,
        })
    }

    /// Attribute-free code block, as produced for `cmdsynopsis` divs.
    pub fn code_block(text: impl Into<String>) -> Node {
        Node::CodeBlock {
            attr: Attr::default(),
            text: text.into(),
        }
    }

    /// Serialise back to pandoc JSON.
    pub fn into_value(self) -> Value {
        match self {
            Node::Div { attr, content } => json!({ "t": "Div", "c": [attr, content] }),
            Node::Span { attr, content } => json!({ "t": "Span", "c": [attr, content] }),
            Node::Link {
                attr,
                content,
                target,
            } => json!({ "t": "Link", "c": [attr, content, target] }),
            Node::Image {
                attr,
                content,
                target,
            } => json!({ "t": "Image", "c": [attr, content, target] }),
            Node::CodeBlock { attr, text } => json!({ "t": "CodeBlock", "c": [attr, text] }),
            Node::Other(value) => value,
        }
    }
}

/// The `t` field of a node object, if `value` is one.
pub fn tag_of(value: &Value) -> Option<&str> {
    value.get("t").and_then(Value::as_str)
}

/// True when every element is a node object, i.e. `items` is a block or
/// inline list whose entries may be spliced.
pub fn is_node_list(items: &[Value]) -> bool {
    !items.is_empty() && items.iter().all(|v| tag_of(v).is_some())
}

const BLOCK_TAGS: &[&str] = &[
    "Plain",
    "Para",
    "LineBlock",
    "CodeBlock",
    "RawBlock",
    "BlockQuote",
    "OrderedList",
    "BulletList",
    "DefinitionList",
    "Header",
    "HorizontalRule",
    "Table",
    "Figure",
    "Div",
];

/// Flatten a node list to its plain text.
///
/// Block boundaries contribute a space; callers collapse whitespace anyway.
pub fn stringify(nodes: &[Value]) -> String {
    let mut out = String::new();
    for node in nodes {
        push_text(node, &mut out);
    }
    out
}

fn push_text(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| push_text(item, out)),
        Value::Object(_) => {
            let Some(tag) = tag_of(value) else {
                return;
            };
            let payload = value.get("c");
            match tag {
                "Str" => {
                    if let Some(s) = payload.and_then(Value::as_str) {
                        out.push_str(s);
                    }
                }
                "Space" | "SoftBreak" | "LineBreak" => out.push(' '),
                "Code" | "CodeBlock" | "Math" => {
                    if let Some(s) = payload.and_then(|c| c.get(1)).and_then(Value::as_str) {
                        out.push_str(s);
                    }
                }
                "RawInline" | "RawBlock" | "Note" => {}
                "Quoted" => {
                    let quote = match payload.and_then(|c| c.get(0)).and_then(tag_of) {
                        Some("SingleQuote") => '\'',
                        _ => '"',
                    };
                    out.push(quote);
                    if let Some(inner) = payload.and_then(|c| c.get(1)) {
                        push_text(inner, out);
                    }
                    out.push(quote);
                }
                _ => {
                    if let Some(inner) = payload {
                        push_text(inner, out);
                    }
                }
            }
            if BLOCK_TAGS.contains(&tag) {
                out.push(' ');
            }
        }
        _ => {}
    }
}
