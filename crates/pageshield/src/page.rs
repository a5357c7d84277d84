//! A shielded page.
//!
//! `Page` is the host side of the shield: it parses a document, installs
//! the behaviours and then plays the part of the browser, firing events and
//! running mutation checkpoints.

use common::ShieldResult;
use dom::events::EventType;
use dom::node::NodeId;
use dom::window::Window;
use html_parser::{parse_html, parse_html_fragment_into, serialize_html, serialize_inner_html};
use shield_security::{select, DocumentEnvironment, PageEnvironment};
use url::Url;
use web_apis::ConsoleBuffer;

use crate::config::ShieldConfig;

/// Outcome of installing the shield on a page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShieldState {
    /// All configured behaviours are running.
    Active,
    /// The frame guard fired; the page content was replaced.
    Blocked(String),
}

impl ShieldState {
    pub fn is_blocked(&self) -> bool {
        matches!(self, ShieldState::Blocked(_))
    }
}

/// A loaded page with the shield installed.
pub struct Page {
    config: ShieldConfig,
    env: DocumentEnvironment,
    state: ShieldState,
}

impl Page {
    /// Load a page as its own top-level browsing context.
    pub fn load(html: &str, config: ShieldConfig) -> ShieldResult<Self> {
        Self::load_in(html, Window::new(), config)
    }

    /// Load a page inside a frame of another page.
    pub fn load_framed(html: &str, config: ShieldConfig) -> ShieldResult<Self> {
        let embedder = Window::new().into_ref();
        Self::load_in(html, Window::nested_in(&embedder), config)
    }

    fn load_in(html: &str, window: Window, config: ShieldConfig) -> ShieldResult<Self> {
        let document = parse_html(html, config.document_url()?)?;
        let mut env = DocumentEnvironment::new(document, window.into_ref())
            .with_console_capacity(config.max_console_entries);

        let state = match shield_security::install(&mut env, &config.options()) {
            Ok(()) => ShieldState::Active,
            Err(e) if e.is_security() => {
                tracing::warn!(error = %e, "shield blocked the page");
                ShieldState::Blocked(e.to_string())
            }
            Err(e) => return Err(e),
        };

        env.fire_content_loaded();
        env.flush_mutations();
        env.document().write().finish_loading();

        Ok(Self { config, env, state })
    }

    pub fn state(&self) -> &ShieldState {
        &self.state
    }

    pub fn is_blocked(&self) -> bool {
        self.state.is_blocked()
    }

    pub fn config(&self) -> &ShieldConfig {
        &self.config
    }

    pub fn url(&self) -> Url {
        self.env.document().read().url.clone()
    }

    pub fn title(&self) -> String {
        self.env.document().read().title.clone()
    }

    /// Page console.
    pub fn console(&self) -> &ConsoleBuffer {
        self.env.console()
    }

    pub fn environment(&mut self) -> &mut DocumentEnvironment {
        &mut self.env
    }

    /// Type into the field matching `selector` and fire `input` at it.
    /// Returns the field value once the input handlers have run.
    pub fn type_into(&mut self, selector: &str, text: &str) -> ShieldResult<String> {
        let field = select(&self.env, selector)?;
        self.env.set_field_value(field, text);
        self.env.dispatch_input(field);
        Ok(self.env.field_value(field).unwrap_or_default())
    }

    /// Fire `input` at every text field, as if each value had just been
    /// entered. Returns the number of fields whose value changed.
    pub fn sanitize_fields(&mut self) -> usize {
        let doc = self.env.document().read();
        let fields: Vec<NodeId> = doc.tree.descendants(doc.tree.root()).collect();
        drop(doc);

        let mut changed = 0;
        for field in fields {
            if !self.env.is_text_field(field) {
                continue;
            }
            let before = self.env.field_value(field);
            self.env.dispatch_input(field);
            if self.env.field_value(field) != before {
                changed += 1;
            }
        }
        changed
    }

    /// Append markup to the end of the body. The change is seen by
    /// observers at the next [`Page::flush_mutations`].
    pub fn append_html(&mut self, html: &str) -> ShieldResult<Vec<NodeId>> {
        let mut doc = self.env.document().write();
        let body = doc.ensure_body();
        parse_html_fragment_into(&mut doc, body, html)
    }

    /// Append markup inside the element matching `selector`.
    pub fn append_html_to(&mut self, selector: &str, html: &str) -> ShieldResult<Vec<NodeId>> {
        let parent = select(&self.env, selector)?;
        let mut doc = self.env.document().write();
        parse_html_fragment_into(&mut doc, parent, html)
    }

    /// Remove the element matching `selector` from the tree.
    pub fn remove(&mut self, selector: &str) -> ShieldResult<()> {
        let node = select(&self.env, selector)?;
        self.env.document().write().tree.remove_from_parent(node);
        Ok(())
    }

    /// Mutation checkpoint.
    pub fn flush_mutations(&mut self) -> usize {
        self.env.flush_mutations()
    }

    /// Drag something over the window. Returns `true` if the browser's
    /// default handling would run.
    pub fn drag_over(&mut self) -> bool {
        self.env.dispatch_window_event(EventType::DragOver)
    }

    /// Drop something onto the window. Returns `true` if the browser would
    /// go on to open the dropped item.
    pub fn drop_payload(&mut self) -> bool {
        self.env.dispatch_window_event(EventType::Drop)
    }

    pub fn field_value(&self, selector: &str) -> ShieldResult<Option<String>> {
        let node = select(&self.env, selector)?;
        Ok(self.env.field_value(node))
    }

    pub fn attribute(&self, selector: &str, name: &str) -> ShieldResult<Option<String>> {
        let node = select(&self.env, selector)?;
        Ok(self.env.attribute(node, name))
    }

    /// Inner HTML of the body.
    pub fn body_html(&self) -> String {
        let doc = self.env.document().read();
        doc.body()
            .map(|body| serialize_inner_html(&doc.tree, body))
            .unwrap_or_default()
    }

    /// Serialize the whole document, with live field values written back
    /// into the markup.
    pub fn serialize(&mut self) -> String {
        self.env.commit_field_values();
        serialize_html(&self.env.document().read())
    }
}
