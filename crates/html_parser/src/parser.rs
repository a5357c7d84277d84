//! HTML Parser implementation.

use common::ShieldResult;
use dom::document::Document;
use dom::element::{ElementData, TagName};
use dom::node::{DocumentType, NodeId};
use dom::tree::DomTree;
use html5ever::driver::ParseOpts;
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{parse_document, parse_fragment, LocalName, Namespace, QualName};
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};
use url::Url;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Parser options.
#[derive(Clone, Debug)]
pub struct ParseOptions {
    /// Document URL.
    pub url: Url,
    /// Whether the tree builder assumes scripting is enabled.
    pub scripting_enabled: bool,
}

impl ParseOptions {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            scripting_enabled: true,
        }
    }

    pub fn scripting(mut self, enabled: bool) -> Self {
        self.scripting_enabled = enabled;
        self
    }

    fn parse_opts(&self) -> ParseOpts {
        ParseOpts {
            tree_builder: TreeBuilderOpts {
                scripting_enabled: self.scripting_enabled,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// HTML Parser.
pub struct HtmlParser {
    options: ParseOptions,
}

impl HtmlParser {
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    /// Parse an HTML string into a Document.
    pub fn parse(&self, html: &str) -> ShieldResult<Document> {
        let rc_dom = parse_document(RcDom::default(), self.options.parse_opts())
            .from_utf8()
            .read_from(&mut html.as_bytes())?;

        let mut document = Document::new(self.options.url.clone());
        let root = document.tree.root();
        import_children(&mut document.tree, root, &rc_dom.document);

        document.refresh_special_elements();
        // Parser insertions are not observable mutations.
        document.tree.take_changes();

        tracing::debug!(
            url = %document.url,
            nodes = document.tree.len(),
            "parsed document"
        );
        Ok(document)
    }

    /// Parse an HTML fragment in `<body>` context and append the resulting
    /// nodes to `parent`. Returns the top-level nodes that were appended.
    pub fn parse_fragment_into(
        &self,
        document: &mut Document,
        parent: NodeId,
        html: &str,
    ) -> ShieldResult<Vec<NodeId>> {
        let context = QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from("body"));

        let rc_dom = parse_fragment(RcDom::default(), self.options.parse_opts(), context, vec![])
            .from_utf8()
            .read_from(&mut html.as_bytes())?;

        // Fragment parsing wraps its output in a synthetic <html> element.
        let wrapper = rc_dom.document.children.borrow().first().cloned();
        let Some(wrapper) = wrapper else {
            return Ok(Vec::new());
        };

        let mut appended = Vec::new();
        for child in wrapper.children.borrow().iter() {
            if let Some(id) = import_node(&mut document.tree, child) {
                document.tree.append_child(parent, id);
                appended.push(id);
            }
        }
        Ok(appended)
    }
}

fn import_children(tree: &mut DomTree, parent: NodeId, handle: &Handle) {
    for child in handle.children.borrow().iter() {
        if let Some(id) = import_node(tree, child) {
            tree.append_child(parent, id);
        }
    }
}

fn import_node(tree: &mut DomTree, handle: &Handle) -> Option<NodeId> {
    match &handle.data {
        RcNodeData::Document | RcNodeData::ProcessingInstruction { .. } => None,
        RcNodeData::Doctype {
            name,
            public_id,
            system_id,
        } => Some(tree.create_doctype(DocumentType {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        })),
        RcNodeData::Text { contents } => Some(tree.create_text(contents.borrow().to_string())),
        RcNodeData::Comment { contents } => Some(tree.create_comment(contents.to_string())),
        RcNodeData::Element { name, attrs, .. } => {
            let tag = TagName::new(&name.local);
            let mut data = if &*name.ns == HTML_NAMESPACE {
                ElementData::new(tag)
            } else {
                ElementData::with_namespace(tag, &name.ns)
            };
            for attr in attrs.borrow().iter() {
                data.set_attribute(&attr.name.local, &attr.value);
            }

            let id = tree.create_element(data);
            import_children(tree, id, handle);
            Some(id)
        }
    }
}

/// Parse HTML string into a Document.
pub fn parse_html(html: &str, url: Url) -> ShieldResult<Document> {
    HtmlParser::new(ParseOptions::new(url)).parse(html)
}

/// Parse an HTML fragment and append it under `parent`.
pub fn parse_html_fragment_into(
    document: &mut Document,
    parent: NodeId,
    html: &str,
) -> ShieldResult<Vec<NodeId>> {
    HtmlParser::new(ParseOptions::new(document.url.clone()))
        .parse_fragment_into(document, parent, html)
}
