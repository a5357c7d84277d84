//! In-memory page environment for behaviour tests.

use std::sync::Arc;

use common::ShieldResult;
use dom::element::{ElementData, TagName};
use dom::events::{Event, EventType};
use dom::node::NodeId;
use slotmap::SlotMap;
use web_apis::{ConsoleMessage, LogLevel, MutationRecord};

use crate::environment::{EventHandler, MutationHandler, PageEnvironment};

/// A page without a document tree: a flat list of elements plus the
/// handlers the shield registered.
pub struct FakeEnvironment {
    elements: SlotMap<NodeId, ElementData>,
    order: Vec<NodeId>,
    pub console: Vec<(LogLevel, ConsoleMessage)>,
    pub input_handlers: Vec<EventHandler>,
    pub loaded_handlers: Vec<EventHandler>,
    pub window_handlers: Vec<(EventType, EventHandler)>,
    pub mutation_handlers: Vec<MutationHandler>,
    pub body_html: Option<String>,
    pub attribute_writes: usize,
    top_level: bool,
}

impl FakeEnvironment {
    pub fn new() -> Self {
        Self {
            elements: SlotMap::with_key(),
            order: Vec::new(),
            console: Vec::new(),
            input_handlers: Vec::new(),
            loaded_handlers: Vec::new(),
            window_handlers: Vec::new(),
            mutation_handlers: Vec::new(),
            body_html: None,
            attribute_writes: 0,
            top_level: true,
        }
    }

    /// A page loaded inside someone else's frame.
    pub fn framed() -> Self {
        Self {
            top_level: false,
            ..Self::new()
        }
    }

    pub fn add_element(&mut self, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        let mut data = ElementData::new(TagName::new(tag));
        for (name, value) in attributes {
            data.set_attribute(name, value);
        }
        let id = self.elements.insert(data);
        self.order.push(id);
        id
    }

    pub fn type_into(&mut self, node: NodeId, text: &str) -> String {
        self.set_field_value(node, text);
        let mut event = Event::targeted(EventType::Input, node);
        for handler in self.input_handlers.clone() {
            handler(self, &mut event);
        }
        self.field_value(node).unwrap_or_default()
    }

    pub fn fire_content_loaded(&mut self) {
        let mut event = Event::new(EventType::DOMContentLoaded);
        for handler in self.loaded_handlers.clone() {
            handler(self, &mut event);
        }
    }

    pub fn fire_window_event(&mut self, event_type: EventType) -> Event {
        let mut event = Event::new(event_type.clone());
        let handlers: Vec<EventHandler> = self
            .window_handlers
            .iter()
            .filter(|(ty, _)| *ty == event_type)
            .map(|(_, h)| Arc::clone(h))
            .collect();
        for handler in handlers {
            handler(self, &mut event);
        }
        event
    }

    pub fn fire_mutations(&mut self, records: &[MutationRecord]) {
        for handler in self.mutation_handlers.clone() {
            handler(self, records);
        }
    }

    pub fn warnings(&self) -> Vec<&str> {
        self.console
            .iter()
            .filter(|(level, _)| *level == LogLevel::Warn)
            .map(|(_, msg)| msg.text.as_str())
            .collect()
    }

    pub fn registered_handlers(&self) -> usize {
        self.input_handlers.len()
            + self.loaded_handlers.len()
            + self.window_handlers.len()
            + self.mutation_handlers.len()
    }
}

impl PageEnvironment for FakeEnvironment {
    fn log_message(&mut self, level: LogLevel, message: ConsoleMessage) {
        self.console.push((level, message));
    }

    fn observe_input_changes(&mut self, handler: EventHandler) {
        self.input_handlers.push(handler);
    }

    fn observe_subtree_mutations(&mut self, handler: MutationHandler) -> ShieldResult<u64> {
        self.mutation_handlers.push(handler);
        Ok(self.mutation_handlers.len() as u64)
    }

    fn on_content_loaded(&mut self, handler: EventHandler) {
        self.loaded_handlers.push(handler);
    }

    fn observe_window_event(&mut self, event_type: EventType, handler: EventHandler) {
        self.window_handlers.push((event_type, handler));
    }

    fn query_anchors(&self) -> Vec<NodeId> {
        self.order
            .iter()
            .copied()
            .filter(|&id| {
                let elem = &self.elements[id];
                elem.tag_name == "a"
                    && elem
                        .get_attribute("target")
                        .map(|t| t.eq_ignore_ascii_case("_blank"))
                        .unwrap_or(false)
            })
            .collect()
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.elements.get(node)?.get_attribute(name).map(str::to_string)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(elem) = self.elements.get_mut(node) {
            elem.set_attribute(name, value);
            self.attribute_writes += 1;
        }
    }

    fn is_text_field(&self, node: NodeId) -> bool {
        self.elements
            .get(node)
            .map(|e| e.is_text_field())
            .unwrap_or(false)
    }

    fn field_value(&self, node: NodeId) -> Option<String> {
        let elem = self.elements.get(node)?;
        Some(
            elem.value
                .clone()
                .unwrap_or_else(|| elem.get_attribute("value").unwrap_or_default().to_string()),
        )
    }

    fn set_field_value(&mut self, node: NodeId, value: &str) {
        if let Some(elem) = self.elements.get_mut(node) {
            elem.value = Some(value.to_string());
        }
    }

    fn replace_body_content(&mut self, html: &str) -> ShieldResult<()> {
        self.elements.clear();
        self.order.clear();
        self.body_html = Some(html.to_string());
        Ok(())
    }

    fn is_top_level(&self) -> bool {
        self.top_level
    }
}
