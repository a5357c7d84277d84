//! DOM Document implementation.

use crate::element::{ElementData, TagName};
use crate::node::NodeId;
use crate::tree::DomTree;
use parking_lot::RwLock;
use std::sync::Arc;
use url::Url;

/// Document ready state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

impl ReadyState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadyState::Loading => "loading",
            ReadyState::Interactive => "interactive",
            ReadyState::Complete => "complete",
        }
    }
}

/// DOM Document.
pub struct Document {
    /// The DOM tree.
    pub tree: DomTree,
    /// Document URL.
    pub url: Url,
    /// Document title.
    pub title: String,
    /// Ready state.
    pub ready_state: ReadyState,
    /// Document element (<html>).
    pub document_element: Option<NodeId>,
    /// Head element.
    pub head: Option<NodeId>,
    /// Body element.
    pub body: Option<NodeId>,
}

impl Document {
    pub fn new(url: Url) -> Self {
        Self {
            tree: DomTree::new(),
            url,
            title: String::new(),
            ready_state: ReadyState::Loading,
            document_element: None,
            head: None,
            body: None,
        }
    }

    /// Create a blank document with an empty `<html><head><body>` skeleton.
    pub fn blank() -> Self {
        let url = Url::parse("about:blank").expect("about:blank is a valid URL");
        let mut doc = Self::new(url);
        doc.ensure_body();
        doc.tree.take_changes();
        doc
    }

    /// Get document element.
    pub fn document_element(&self) -> Option<NodeId> {
        self.document_element
    }

    /// Get body element.
    pub fn body(&self) -> Option<NodeId> {
        self.body
    }

    /// Get head element.
    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    /// Create an element.
    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.tree.create_element(ElementData::new(TagName::new(tag_name)))
    }

    /// Create a text node.
    pub fn create_text_node(&mut self, content: &str) -> NodeId {
        self.tree.create_text(content.to_string())
    }

    /// Get element by ID.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree.find_element_by_id(id)
    }

    /// Get elements by tag name.
    pub fn get_elements_by_tag_name(&self, tag_name: &str) -> Vec<NodeId> {
        self.tree.find_elements_by_tag_name(tag_name)
    }

    /// Query selector.
    pub fn query_selector(&self, selector: &str) -> Option<NodeId> {
        self.tree.query_selector(selector)
    }

    /// Query selector all.
    pub fn query_selector_all(&self, selector: &str) -> Vec<NodeId> {
        self.tree.query_selector_all(selector)
    }

    /// Get all links in document.
    pub fn links(&self) -> Vec<NodeId> {
        self.tree
            .find_elements_by_tag_name("*")
            .into_iter()
            .filter(|&id| {
                self.tree
                    .get_element(id)
                    .map(|e| (e.tag_name == "a" || e.tag_name == "area") && e.has_attribute("href"))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Append child to body.
    pub fn append_to_body(&mut self, node: NodeId) {
        if let Some(body) = self.body {
            self.tree.append_child(body, node);
        }
    }

    /// Locate `<html>`, `<head>`, `<body>` and the title after the tree was built.
    pub fn refresh_special_elements(&mut self) {
        let root = self.tree.root();
        self.document_element = self.tree.find_child_by_tag(root, "html");
        self.head = None;
        self.body = None;

        if let Some(html) = self.document_element {
            self.head = self.tree.find_child_by_tag(html, "head");
            self.body = self.tree.find_child_by_tag(html, "body");
        }

        if let Some(title) = self
            .head
            .and_then(|head| self.tree.find_child_by_tag(head, "title"))
        {
            self.title = self.tree.get_text_content(title).trim().to_string();
        }
    }

    /// Return the body, creating the `<html>`/`<body>` skeleton if it is missing.
    pub fn ensure_body(&mut self) -> NodeId {
        if let Some(body) = self.body {
            return body;
        }

        let html = match self.document_element {
            Some(html) => html,
            None => {
                let html = self.create_element("html");
                let root = self.tree.root();
                self.tree.append_child(root, html);
                let head = self.create_element("head");
                self.tree.append_child(html, head);
                self.head = Some(head);
                self.document_element = Some(html);
                html
            }
        };

        let body = self.create_element("body");
        self.tree.append_child(html, body);
        self.body = Some(body);
        body
    }

    /// Mark the initial parse as finished (`DOMContentLoaded` time).
    pub fn finish_parsing(&mut self) {
        self.ready_state = ReadyState::Interactive;
    }

    /// Mark document as completely loaded.
    pub fn finish_loading(&mut self) {
        self.ready_state = ReadyState::Complete;
    }
}

/// Shared document reference.
pub type DocumentRef = Arc<RwLock<Document>>;
