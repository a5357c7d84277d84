//! Page environment.
//!
//! Every behaviour of the shield reaches the page through [`PageEnvironment`]
//! rather than touching the document directly. [`DocumentEnvironment`] is the
//! implementation backed by a parsed [`Document`] and its [`Window`].

use std::collections::HashMap;
use std::sync::Arc;

use common::{ShieldError, ShieldResult};
use dom::document::{Document, DocumentRef};
use dom::events::{
    EventCallback, EventListenerOptions, EventManager, EventPhase, EventType, ListenerTarget,
};
use dom::node::NodeId;
use dom::window::WindowRef;
use dom::Event;
use parking_lot::RwLock;
use web_apis::{
    ConsoleBuffer, ConsoleMessage, LogLevel, MutationObserver, MutationObserverController,
    MutationObserverInit, MutationRecord,
};

/// Handler for page and window events.
pub type EventHandler = EventCallback<dyn PageEnvironment>;

/// Handler for a batch of mutation records.
pub type MutationHandler = Arc<dyn Fn(&mut dyn PageEnvironment, &[MutationRecord]) + Send + Sync>;

/// Capabilities a page offers to the shield.
pub trait PageEnvironment {
    /// Write a message to the page console.
    fn log_message(&mut self, level: LogLevel, message: ConsoleMessage);

    /// Subscribe to `input` events anywhere in the document.
    fn observe_input_changes(&mut self, handler: EventHandler);

    /// Subscribe to child-list changes at any depth under the body.
    /// Returns the observer id.
    fn observe_subtree_mutations(&mut self, handler: MutationHandler) -> ShieldResult<u64>;

    /// Subscribe to `DOMContentLoaded`.
    fn on_content_loaded(&mut self, handler: EventHandler);

    /// Subscribe to an event fired at the window.
    fn observe_window_event(&mut self, event_type: EventType, handler: EventHandler);

    /// Anchors that open in a new tab (`a[target="_blank"]`), in document order.
    fn query_anchors(&self) -> Vec<NodeId>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);

    /// Whether the node is a `<textarea>` or a free-text `<input>`.
    fn is_text_field(&self, node: NodeId) -> bool;

    /// Live value of a form field.
    fn field_value(&self, node: NodeId) -> Option<String>;

    fn set_field_value(&mut self, node: NodeId, value: &str);

    /// Replace everything inside `<body>` with the given markup.
    fn replace_body_content(&mut self, html: &str) -> ShieldResult<()>;

    /// Whether this window is its own top-level browsing context.
    fn is_top_level(&self) -> bool;
}

/// Page environment backed by a DOM document and window.
pub struct DocumentEnvironment {
    document: DocumentRef,
    window: WindowRef,
    console: ConsoleBuffer,
    events: EventManager<dyn PageEnvironment>,
    observers: MutationObserverController,
    mutation_handlers: HashMap<u64, MutationHandler>,
    next_callback_id: u64,
}

impl DocumentEnvironment {
    /// Attach an environment to `window`, making `document` its active document.
    pub fn new(document: Document, window: WindowRef) -> Self {
        let document = Arc::new(RwLock::new(document));
        window.write().set_document(Arc::clone(&document));

        Self {
            document,
            window,
            console: ConsoleBuffer::default(),
            events: EventManager::new(),
            observers: MutationObserverController::new(),
            mutation_handlers: HashMap::new(),
            next_callback_id: 1,
        }
    }

    /// Limit the number of console entries kept.
    pub fn with_console_capacity(mut self, max_entries: usize) -> Self {
        self.console = ConsoleBuffer::new(max_entries);
        self
    }

    pub fn document(&self) -> &DocumentRef {
        &self.document
    }

    pub fn window(&self) -> &WindowRef {
        &self.window
    }

    pub fn console(&self) -> &ConsoleBuffer {
        &self.console
    }

    /// Dispatch an event through capture, target and bubble phases.
    ///
    /// Events without a target are fired at the window. Node events
    /// propagate through the node's ancestors and then the window.
    pub fn dispatch(&mut self, mut event: Event) -> Event {
        event.is_trusted = true;

        let (target, path) = match event.target {
            Some(node) => (ListenerTarget::Node(node), self.propagation_path(node)),
            None => (ListenerTarget::Window, Vec::new()),
        };

        event.phase = EventPhase::Capturing;
        for hop in path.iter().rev() {
            if event.propagation_stopped {
                break;
            }
            self.invoke_listeners(*hop, &mut event);
        }

        if !event.propagation_stopped {
            event.phase = EventPhase::AtTarget;
            self.invoke_listeners(target, &mut event);
        }

        if event.bubbles {
            event.phase = EventPhase::Bubbling;
            for hop in &path {
                if event.propagation_stopped {
                    break;
                }
                self.invoke_listeners(*hop, &mut event);
            }
        }

        event.phase = EventPhase::None;
        event.current_target = None;
        event
    }

    /// Fire an event at the window. Returns `false` if a listener
    /// cancelled its default action.
    pub fn dispatch_window_event(&mut self, event_type: EventType) -> bool {
        !self.dispatch(Event::new(event_type)).default_prevented
    }

    /// Fire an `input` event at a field.
    pub fn dispatch_input(&mut self, node: NodeId) -> Event {
        self.dispatch(Event::targeted(EventType::Input, node))
    }

    /// Mark parsing finished and fire `DOMContentLoaded` at the document.
    pub fn fire_content_loaded(&mut self) {
        let root = {
            let mut doc = self.document.write();
            doc.finish_parsing();
            doc.tree.root()
        };
        tracing::debug!("firing DOMContentLoaded");
        self.dispatch(Event::targeted(EventType::DOMContentLoaded, root));
    }

    /// Deliver queued mutation records to their observers. Each observer
    /// runs at most once per call. Returns the number of records delivered.
    pub fn flush_mutations(&mut self) -> usize {
        {
            let mut doc = self.document.write();
            self.observers.collect(&mut doc.tree);
        }

        let mut delivered = 0;
        for (callback, records) in self.observers.flush() {
            let Some(handler) = self.mutation_handlers.get(&callback).cloned() else {
                continue;
            };
            delivered += records.len();
            handler(self, &records);
        }

        if delivered > 0 {
            tracing::debug!(records = delivered, "delivered mutation records");
        }
        delivered
    }

    /// Write live field values back into markup so serialization shows them.
    /// Child-list changes already journaled stay queued for the next
    /// [`DocumentEnvironment::flush_mutations`].
    pub fn commit_field_values(&mut self) {
        let mut doc = self.document.write();
        self.observers.collect(&mut doc.tree);

        let fields: Vec<(NodeId, bool, String)> = doc
            .tree
            .descendants(doc.tree.root())
            .filter_map(|id| {
                let elem = doc.tree.get_element(id)?;
                let value = elem.value.clone()?;
                Some((id, elem.tag_name == "textarea", value))
            })
            .collect();

        for (id, is_textarea, value) in fields {
            if is_textarea {
                doc.tree.set_text_content(id, &value);
            } else {
                doc.tree.set_attribute(id, "value", &value);
            }
        }
        // Committing values is not a page mutation.
        doc.tree.take_changes();
    }

    fn propagation_path(&self, node: NodeId) -> Vec<ListenerTarget> {
        let doc = self.document.read();
        let mut path: Vec<ListenerTarget> =
            doc.tree.ancestors(node).map(ListenerTarget::Node).collect();
        path.push(ListenerTarget::Window);
        path
    }

    fn invoke_listeners(&mut self, hop: ListenerTarget, event: &mut Event) {
        event.current_target = Some(hop);
        let phase = event.phase;
        for listener in self.events.listeners(hop, &event.event_type, phase) {
            if event.immediate_propagation_stopped {
                break;
            }
            let prevented = event.default_prevented;
            (listener.callback)(self, event);
            if listener.options.passive {
                event.default_prevented = prevented;
            }
        }
    }

    fn document_root(&self) -> NodeId {
        self.document.read().tree.root()
    }
}

impl PageEnvironment for DocumentEnvironment {
    fn log_message(&mut self, level: LogLevel, message: ConsoleMessage) {
        self.console.log(level, message);
    }

    fn observe_input_changes(&mut self, handler: EventHandler) {
        let root = self.document_root();
        self.events.add_listener(
            ListenerTarget::Node(root),
            EventType::Input,
            handler,
            EventListenerOptions::default(),
        );
    }

    fn observe_subtree_mutations(&mut self, handler: MutationHandler) -> ShieldResult<u64> {
        let target = {
            let doc = self.document.read();
            doc.body().unwrap_or_else(|| doc.tree.root())
        };

        let callback = self.next_callback_id;
        self.next_callback_id += 1;

        let mut observer = MutationObserver::new(callback);
        observer.observe(target, MutationObserverInit::new().child_list().subtree())?;
        let id = self.observers.register(observer);
        self.mutation_handlers.insert(callback, handler);

        tracing::debug!(observer = id, "observing subtree mutations");
        Ok(id)
    }

    fn on_content_loaded(&mut self, handler: EventHandler) {
        let root = self.document_root();
        self.events.add_listener(
            ListenerTarget::Node(root),
            EventType::DOMContentLoaded,
            handler,
            EventListenerOptions::default(),
        );
    }

    fn observe_window_event(&mut self, event_type: EventType, handler: EventHandler) {
        self.events.add_listener(
            ListenerTarget::Window,
            event_type,
            handler,
            EventListenerOptions::default(),
        );
    }

    fn query_anchors(&self) -> Vec<NodeId> {
        self.document
            .read()
            .query_selector_all(r#"a[target="_blank"]"#)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        let doc = self.document.read();
        doc.tree
            .get_element(node)?
            .get_attribute(name)
            .map(str::to_string)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        self.document.write().tree.set_attribute(node, name, value);
    }

    fn is_text_field(&self, node: NodeId) -> bool {
        self.document
            .read()
            .tree
            .get_element(node)
            .map(|e| e.is_text_field())
            .unwrap_or(false)
    }

    fn field_value(&self, node: NodeId) -> Option<String> {
        let doc = self.document.read();
        let elem = doc.tree.get_element(node)?;
        if !elem.is_form_control() {
            return None;
        }
        if let Some(value) = &elem.value {
            return Some(value.clone());
        }
        if elem.tag_name == "textarea" {
            Some(doc.tree.get_text_content(node))
        } else {
            Some(elem.get_attribute("value").unwrap_or_default().to_string())
        }
    }

    fn set_field_value(&mut self, node: NodeId, value: &str) {
        if let Some(elem) = self.document.write().tree.get_element_mut(node) {
            elem.value = Some(value.to_string());
        }
    }

    fn replace_body_content(&mut self, html: &str) -> ShieldResult<()> {
        let mut doc = self.document.write();
        let body = doc.ensure_body();
        doc.tree.remove_children(body);
        html_parser::parse_html_fragment_into(&mut doc, body, html)?;
        Ok(())
    }

    fn is_top_level(&self) -> bool {
        self.window.read().is_top_level()
    }
}

/// Look up a single element by selector.
pub fn select(env: &DocumentEnvironment, selector: &str) -> ShieldResult<NodeId> {
    env.document
        .read()
        .query_selector(selector)
        .ok_or_else(|| ShieldError::not_found(format!("no element matches `{}`", selector)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom::window::Window;
    use html_parser::parse_html;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    fn environment(html: &str) -> DocumentEnvironment {
        let doc = parse_html(html, Url::parse("https://app.example/").unwrap()).unwrap();
        DocumentEnvironment::new(doc, Window::new().into_ref())
    }

    #[test]
    fn test_window_listener_can_prevent_default() {
        let mut env = environment("<body></body>");
        assert!(env.dispatch_window_event(EventType::Drop));

        env.observe_window_event(EventType::Drop, Arc::new(|_, e| e.prevent_default()));
        assert!(!env.dispatch_window_event(EventType::Drop));
        // DragOver has no listener yet.
        assert!(env.dispatch_window_event(EventType::DragOver));
    }

    #[test]
    fn test_input_bubbles_to_document() {
        let mut env = environment(r#"<body><form><input id="q" value="x"></form></body>"#);
        let input = select(&env, "#q").unwrap();

        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        env.observe_input_changes(Arc::new(move |env, e| {
            let target = e.target.unwrap();
            assert!(env.is_text_field(target));
            assert_eq!(e.phase, EventPhase::Bubbling);
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        env.dispatch_input(input);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_field_value_falls_back_to_markup() {
        let mut env = environment(concat!(
            r#"<input id="a" value="from attr">"#,
            r#"<textarea id="b">from text</textarea><p id="c">x</p>"#,
        ));
        let a = select(&env, "#a").unwrap();
        let b = select(&env, "#b").unwrap();
        let c = select(&env, "#c").unwrap();

        assert_eq!(env.field_value(a).as_deref(), Some("from attr"));
        assert_eq!(env.field_value(b).as_deref(), Some("from text"));
        assert_eq!(env.field_value(c), None);

        env.set_field_value(a, "typed");
        assert_eq!(env.field_value(a).as_deref(), Some("typed"));
        // The markup is untouched until values are committed.
        assert_eq!(env.attribute(a, "value").as_deref(), Some("from attr"));

        env.commit_field_values();
        assert_eq!(env.attribute(a, "value").as_deref(), Some("typed"));
    }

    #[test]
    fn test_commit_keeps_pending_tree_changes() {
        let mut env =
            environment(r#"<body><textarea id="t">old</textarea><div id="feed"></div></body>"#);
        env.observe_subtree_mutations(Arc::new(|_, _| {})).unwrap();
        let t = select(&env, "#t").unwrap();
        env.set_field_value(t, "new");

        {
            let mut doc = env.document().write();
            let feed = doc.get_element_by_id("feed").unwrap();
            let a = doc.create_element("a");
            doc.tree.append_child(feed, a);
        }

        env.commit_field_values();
        // Only the append is delivered; rewriting the textarea text is not.
        assert_eq!(env.flush_mutations(), 1);
        assert_eq!(env.document().read().tree.get_text_content(t), "new");
    }

    #[test]
    fn test_replace_body_content() {
        let mut env = environment("<body><p>secret</p><p>more</p></body>");
        env.replace_body_content("<h1>gone</h1>").unwrap();

        let doc = env.document().read();
        let body = doc.body().unwrap();
        let children: Vec<_> = doc.tree.children(body).collect();
        assert_eq!(children.len(), 1);
        assert_eq!(doc.tree.get_text_content(body), "gone");
    }

    #[test]
    fn test_subtree_mutations_are_batched_per_flush() {
        let mut env = environment("<body><div id='root'></div></body>");
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        env.observe_subtree_mutations(Arc::new(move |_, records| {
            assert!(!records.is_empty());
            counter.fetch_add(1, Ordering::SeqCst);
        }))
        .unwrap();

        assert_eq!(env.flush_mutations(), 0);

        {
            let mut doc = env.document().write();
            let root = doc.get_element_by_id("root").unwrap();
            let a = doc.create_element("a");
            let b = doc.create_element("a");
            doc.tree.append_child(root, a);
            doc.tree.append_child(root, b);
        }

        assert_eq!(env.flush_mutations(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(env.flush_mutations(), 0);
    }

    #[test]
    fn test_content_loaded_fires_once_parsed() {
        let mut env = environment("<body></body>");
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        env.on_content_loaded(Arc::new(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        env.fire_content_loaded();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(
            env.document().read().ready_state,
            dom::document::ReadyState::Interactive
        );
    }

    #[test]
    fn test_framed_window_is_not_top_level() {
        let doc = parse_html("<body></body>", Url::parse("about:blank").unwrap()).unwrap();
        let parent = Window::new().into_ref();
        let env = DocumentEnvironment::new(doc, Window::nested_in(&parent).into_ref());
        assert!(!env.is_top_level());
        assert!(environment("<body></body>").is_top_level());
    }
}
