//! Table of contents
//!
//! Builds the (possibly deeply nested) navigation tree from an EPUB 3 nav
//! document or an EPUB 2 NCX, then flattens it into an `href -> label` map.
//! Neither step recurses: the tree is assembled from open/close edges on an
//! explicit stack and flattened with an explicit work stack.

use std::collections::HashMap;

use roxmltree::{Edge, Node};

use super::package::resolve_href;
use super::parse_xml;
use crate::document::DocumentResult;

/// One navigation entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TocEntry {
    pub label: String,
    /// Archive path without fragment
    pub href: String,
    pub children: Vec<TocEntry>,
}

impl TocEntry {
    fn is_empty(&self) -> bool {
        self.label.is_empty() && self.href.is_empty()
    }
}

/// Pops the finished entry and attaches it to its parent (or the roots)
fn close_entry(stack: &mut Vec<TocEntry>, roots: &mut Vec<TocEntry>) {
    let Some(entry) = stack.pop() else {
        return;
    };
    if entry.is_empty() {
        return;
    }
    match stack.last_mut() {
        Some(parent) => parent.children.push(entry),
        None => roots.push(entry),
    }
}

fn text_of(node: Node) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse an EPUB 3 navigation document located in `base_dir`
pub fn parse_nav(content: &str, base_dir: &str) -> DocumentResult<Vec<TocEntry>> {
    let doc = parse_xml(content)?;

    let navs: Vec<Node> = doc
        .descendants()
        .filter(|n| n.tag_name().name() == "nav")
        .collect();
    let toc_nav = navs
        .iter()
        .find(|nav| {
            nav.attributes()
                .any(|a| a.name() == "type" && a.value().split_whitespace().any(|v| v == "toc"))
        })
        .or_else(|| navs.first());

    let Some(nav) = toc_nav else {
        return Ok(Vec::new());
    };

    let mut roots = Vec::new();
    let mut stack: Vec<TocEntry> = Vec::new();

    for edge in nav.traverse() {
        match edge {
            Edge::Open(node) if node.is_element() => match node.tag_name().name() {
                "li" => stack.push(TocEntry::default()),
                "a" | "span" => {
                    if let Some(entry) = stack.last_mut().filter(|e| e.is_empty()) {
                        entry.label = text_of(node);
                        if let Some(href) = node.attribute("href") {
                            entry.href = resolve_href(base_dir, href);
                        }
                    }
                }
                _ => {}
            },
            Edge::Close(node) if node.tag_name().name() == "li" => {
                close_entry(&mut stack, &mut roots);
            }
            _ => {}
        }
    }

    Ok(roots)
}

/// Parse an EPUB 2 NCX located in `base_dir`
pub fn parse_ncx(content: &str, base_dir: &str) -> DocumentResult<Vec<TocEntry>> {
    let doc = parse_xml(content)?;

    let Some(nav_map) = doc
        .descendants()
        .find(|n| n.tag_name().name() == "navMap")
    else {
        return Ok(Vec::new());
    };

    let mut roots = Vec::new();
    let mut stack: Vec<TocEntry> = Vec::new();

    for edge in nav_map.traverse() {
        match edge {
            Edge::Open(node) if node.is_element() => match node.tag_name().name() {
                "navPoint" => stack.push(TocEntry::default()),
                "text" => {
                    if let Some(entry) = stack.last_mut().filter(|e| e.label.is_empty()) {
                        entry.label = text_of(node);
                    }
                }
                "content" => {
                    if let Some(entry) = stack.last_mut().filter(|e| e.href.is_empty()) {
                        if let Some(src) = node.attribute("src") {
                            entry.href = resolve_href(base_dir, src);
                        }
                    }
                }
                _ => {}
            },
            Edge::Close(node) if node.tag_name().name() == "navPoint" => {
                close_entry(&mut stack, &mut roots);
            }
            _ => {}
        }
    }

    Ok(roots)
}

/// Flatten the tree into `href -> label`, keeping the first label seen for
/// each href in document order
pub fn flatten(entries: &[TocEntry]) -> HashMap<String, String> {
    let mut map = HashMap::new();
    let mut work: Vec<&TocEntry> = entries.iter().rev().collect();

    while let Some(entry) = work.pop() {
        if !entry.href.is_empty() && !entry.label.is_empty() {
            map.entry(entry.href.clone())
                .or_insert_with(|| entry.label.clone());
        }
        work.extend(entry.children.iter().rev());
    }

    map
}
