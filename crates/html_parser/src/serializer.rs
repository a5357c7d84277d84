//! HTML serialization.

use dom::document::Document;
use dom::element::ElementData;
use dom::node::{NodeData, NodeId};
use dom::tree::DomTree;

/// Serialize a document to an HTML string.
pub fn serialize_html(document: &Document) -> String {
    let mut output = String::new();
    serialize_children(&document.tree, document.tree.root(), &mut output, true);
    output
}

/// Serialize a node and its subtree (outer HTML).
pub fn serialize_node(tree: &DomTree, node: NodeId) -> String {
    let mut output = String::new();
    serialize_node_internal(tree, node, &mut output, true);
    output
}

/// Serialize the children of a node (inner HTML).
pub fn serialize_inner_html(tree: &DomTree, node: NodeId) -> String {
    let escape = tree
        .get_element(node)
        .map(|e| !e.is_raw_text())
        .unwrap_or(true);
    let mut output = String::new();
    serialize_children(tree, node, &mut output, escape);
    output
}

fn serialize_node_internal(tree: &DomTree, node: NodeId, output: &mut String, escape: bool) {
    let node_data = match tree.get(node) {
        Some(n) => n,
        None => return,
    };

    match &node_data.data {
        NodeData::Document | NodeData::DocumentFragment => {
            serialize_children(tree, node, output, escape);
        }
        NodeData::Element(elem) => {
            serialize_element(tree, node, elem, output);
        }
        NodeData::Text { content } => {
            if escape {
                output.push_str(&escape_html_text(content));
            } else {
                output.push_str(content);
            }
        }
        NodeData::Comment { content } => {
            output.push_str("<!--");
            output.push_str(content);
            output.push_str("-->");
        }
        NodeData::DocumentType(dt) => {
            output.push_str("<!DOCTYPE ");
            output.push_str(&dt.name);
            if !dt.public_id.is_empty() {
                output.push_str(" PUBLIC \"");
                output.push_str(&dt.public_id);
                output.push('"');
            }
            if !dt.system_id.is_empty() {
                if dt.public_id.is_empty() {
                    output.push_str(" SYSTEM");
                }
                output.push_str(" \"");
                output.push_str(&dt.system_id);
                output.push('"');
            }
            output.push('>');
        }
    }
}

fn serialize_element(tree: &DomTree, node: NodeId, elem: &ElementData, output: &mut String) {
    let tag_name = elem.tag_name.as_str();

    output.push('<');
    output.push_str(tag_name);

    for (name, value) in elem.attributes.iter() {
        output.push(' ');
        output.push_str(name);
        if !value.is_empty() {
            output.push_str("=\"");
            output.push_str(&escape_html_attribute(value));
            output.push('"');
        }
    }

    output.push('>');
    if elem.is_void() {
        return;
    }

    // Raw text elements (script, style) don't escape content
    serialize_children(tree, node, output, !elem.is_raw_text());

    output.push_str("</");
    output.push_str(tag_name);
    output.push('>');
}

fn serialize_children(tree: &DomTree, node: NodeId, output: &mut String, escape: bool) {
    for child in tree.children(node) {
        serialize_node_internal(tree, child, output, escape);
    }
}

/// Escape HTML text content.
pub fn escape_html_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '\u{00A0}' => result.push_str("&nbsp;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape HTML attribute value.
pub fn escape_html_attribute(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\u{00A0}' => result.push_str("&nbsp;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_html;
    use url::Url;

    fn parse(html: &str) -> Document {
        parse_html(html, Url::parse("about:blank").unwrap()).unwrap()
    }

    #[test]
    fn test_serialize_simple() {
        let doc = parse("<!DOCTYPE html><html><head></head><body><p>Hello</p></body></html>");
        let output = serialize_html(&doc);
        assert!(output.starts_with("<!DOCTYPE html>"));
        assert!(output.contains("<p>Hello</p>"));
    }

    #[test]
    fn test_serialize_attributes_in_order() {
        let doc = parse(concat!(
            r#"<a href="/x?a=1&amp;b=2" target="_blank" "#,
            r#"rel="noopener noreferrer">go</a>"#,
        ));
        let link = doc.query_selector("a").unwrap();
        assert_eq!(
            serialize_node(&doc.tree, link),
            r#"<a href="/x?a=1&amp;b=2" target="_blank" rel="noopener noreferrer">go</a>"#
        );
    }

    #[test]
    fn test_script_content_is_raw() {
        let doc = parse("<body><script>if (a < b) {}</script><p>1 &lt; 2</p></body>");
        let body = doc.body().unwrap();
        let inner = serialize_inner_html(&doc.tree, body);
        assert!(inner.contains("<script>if (a < b) {}</script>"));
        assert!(inner.contains("<p>1 &lt; 2</p>"));
    }

    #[test]
    fn test_void_elements() {
        let doc = parse(r#"<input type="text" value="hi"><br>"#);
        let body = doc.body().unwrap();
        assert_eq!(
            serialize_inner_html(&doc.tree, body),
            r#"<input type="text" value="hi"><br>"#
        );
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html_text("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html_text("a & b"), "a &amp; b");
        assert_eq!(escape_html_attribute(r#"say "hi""#), "say &quot;hi&quot;");
    }
}
