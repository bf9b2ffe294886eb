//! XHTML section content
//!
//! Extracts paragraph blocks, the first heading and the body markup from a
//! spine document.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use roxmltree::{Node, NodeId};

use super::parse_xml;
use crate::document::DocumentResult;

static NAMED_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&([A-Za-z][A-Za-z0-9]*);").expect("valid entity regex"));

/// Entities XML defines itself
const XML_ENTITIES: &[&str] = &["amp", "lt", "gt", "quot", "apos"];

const BLOCK_TAGS: &[&str] = &["p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li"];
const TITLE_TAGS: &[&str] = &["h1", "h2", "h3"];
const IGNORED_TAGS: &[&str] = &["script", "style"];

/// Extracted content of one spine document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionContent {
    /// Text of the first `h1`/`h2`/`h3`
    pub heading: Option<String>,
    /// Inner markup of `<body>`
    pub html_content: String,
    pub paragraphs: Vec<String>,
}

/// Rewrite HTML named entities as numeric references so the text parses as
/// XML; unknown names are escaped and kept literally
pub fn replace_html_entities(xhtml: &str) -> std::borrow::Cow<'_, str> {
    NAMED_ENTITY.replace_all(xhtml, |caps: &Captures| {
        let name = &caps[1];
        if XML_ENTITIES.contains(&name) {
            return caps[0].to_string();
        }
        let decoded = html_escape::decode_html_entities(&caps[0]);
        if decoded == &caps[0] {
            return format!("&amp;{};", name);
        }
        decoded
            .chars()
            .map(|c| format!("&#{};", u32::from(c)))
            .collect()
    })
}

fn is_element(node: &Node, tags: &[&str]) -> bool {
    node.is_element() && tags.contains(&node.tag_name().name())
}

/// Whitespace-collapsed text, skipping script/style and breaking on `<br>`
fn collapsed_text(node: Node) -> String {
    let mut text = String::new();
    for d in node.descendants() {
        if d.is_element() && d.tag_name().name() == "br" {
            text.push(' ');
        } else if d.is_text() && !d.ancestors().any(|a| is_element(&a, IGNORED_TAGS)) {
            text.push_str(d.text().unwrap_or_default());
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace-collapsed text of `wrapper` that no nested block element owns
fn loose_text(wrapper: Node) -> String {
    let mut text = String::new();
    for d in wrapper.descendants().skip(1) {
        let owner = d
            .ancestors()
            .skip(1)
            .take_while(|a| a.id() != wrapper.id())
            .any(|a| is_element(&a, BLOCK_TAGS) || is_element(&a, IGNORED_TAGS));
        if owner {
            continue;
        }
        if is_element(&d, BLOCK_TAGS) || (d.is_element() && d.tag_name().name() == "br") {
            text.push(' ');
        } else if d.is_text() {
            text.push_str(d.text().unwrap_or_default());
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Paragraph texts from block elements under `body`
///
/// An element nested inside an already counted block is skipped. A `div`
/// wrapping other blocks is not counted itself; only its loose text (outside
/// the nested blocks) becomes a paragraph.
fn block_paragraphs(body: Node) -> Vec<String> {
    let mut counted: HashSet<NodeId> = HashSet::new();
    let mut paragraphs = Vec::new();

    for node in body.descendants().filter(|n| is_element(n, BLOCK_TAGS)) {
        if node.ancestors().skip(1).any(|a| counted.contains(&a.id())) {
            continue;
        }
        if node.tag_name().name() == "div"
            && node.descendants().skip(1).any(|d| is_element(&d, BLOCK_TAGS))
        {
            let text = loose_text(node);
            if !text.is_empty() {
                paragraphs.push(text);
            }
            continue;
        }

        let text = collapsed_text(node);
        if !text.is_empty() {
            counted.insert(node.id());
            paragraphs.push(text);
        }
    }

    paragraphs
}

/// Parse a spine document; `None` when it has no `<body>`
pub fn extract_section(xhtml: &str) -> DocumentResult<Option<SectionContent>> {
    let prepared = replace_html_entities(xhtml);
    let source: &str = &prepared;
    let doc = parse_xml(source)?;

    let Some(body) = doc.descendants().find(|n| n.tag_name().name() == "body") else {
        return Ok(None);
    };

    let mut paragraphs = block_paragraphs(body);
    if paragraphs.is_empty() {
        let text = collapsed_text(body);
        if !text.is_empty() {
            paragraphs.push(text);
        }
    }

    let heading = body
        .descendants()
        .filter(|n| is_element(n, TITLE_TAGS))
        .map(collapsed_text)
        .find(|text| !text.is_empty());

    let html_content = match (body.first_child(), body.last_child()) {
        (Some(first), Some(last)) => source[first.range().start..last.range().end]
            .trim()
            .to_string(),
        _ => String::new(),
    };

    Ok(Some(SectionContent {
        heading,
        html_content,
        paragraphs,
    }))
}
