//! DOM Events implementation.

use crate::node::NodeId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Event type enumeration.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    // Mouse events
    Click,

    // Form events
    Submit,
    Change,
    Input,

    // Document/Window events
    Load,
    DOMContentLoaded,

    // Drag events
    DragStart,
    Drag,
    DragEnd,
    DragEnter,
    DragOver,
    DragLeave,
    Drop,

    // Other
    Custom(String),
}

impl EventType {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "click" => EventType::Click,
            "submit" => EventType::Submit,
            "change" => EventType::Change,
            "input" => EventType::Input,
            "load" => EventType::Load,
            "domcontentloaded" => EventType::DOMContentLoaded,
            "dragstart" => EventType::DragStart,
            "drag" => EventType::Drag,
            "dragend" => EventType::DragEnd,
            "dragenter" => EventType::DragEnter,
            "dragover" => EventType::DragOver,
            "dragleave" => EventType::DragLeave,
            "drop" => EventType::Drop,
            other => EventType::Custom(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventType::Click => "click",
            EventType::Submit => "submit",
            EventType::Change => "change",
            EventType::Input => "input",
            EventType::Load => "load",
            EventType::DOMContentLoaded => "DOMContentLoaded",
            EventType::DragStart => "dragstart",
            EventType::Drag => "drag",
            EventType::DragEnd => "dragend",
            EventType::DragEnter => "dragenter",
            EventType::DragOver => "dragover",
            EventType::DragLeave => "dragleave",
            EventType::Drop => "drop",
            EventType::Custom(s) => s,
        }
    }

    /// Check if event bubbles by default.
    pub fn bubbles(&self) -> bool {
        !matches!(self, EventType::Load)
    }

    /// Check if event is cancelable by default.
    pub fn cancelable(&self) -> bool {
        !matches!(
            self,
            EventType::Load
                | EventType::DOMContentLoaded
                | EventType::Input
                | EventType::Change
                | EventType::DragEnd
                | EventType::DragLeave
        )
    }
}

/// Event phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventPhase {
    None = 0,
    Capturing = 1,
    AtTarget = 2,
    Bubbling = 3,
}

/// Where a listener is attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListenerTarget {
    Window,
    Node(NodeId),
}

/// DOM Event.
#[derive(Clone, Debug)]
pub struct Event {
    /// Event type.
    pub event_type: EventType,
    /// Target node. `None` for events fired at the window.
    pub target: Option<NodeId>,
    /// Current target during propagation.
    pub current_target: Option<ListenerTarget>,
    /// Event phase.
    pub phase: EventPhase,
    /// Whether event bubbles.
    pub bubbles: bool,
    /// Whether event is cancelable.
    pub cancelable: bool,
    /// Whether default was prevented.
    pub default_prevented: bool,
    /// Whether propagation was stopped.
    pub propagation_stopped: bool,
    /// Whether immediate propagation was stopped.
    pub immediate_propagation_stopped: bool,
    /// Whether event is trusted (generated by the host, not by script).
    pub is_trusted: bool,
    /// Timestamp in milliseconds since the Unix epoch.
    pub timestamp: f64,
}

impl Event {
    pub fn new(event_type: EventType) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64()
            * 1000.0;

        let bubbles = event_type.bubbles();
        let cancelable = event_type.cancelable();

        Self {
            event_type,
            target: None,
            current_target: None,
            phase: EventPhase::None,
            bubbles,
            cancelable,
            default_prevented: false,
            propagation_stopped: false,
            immediate_propagation_stopped: false,
            is_trusted: false,
            timestamp,
        }
    }

    pub fn with_options(event_type: EventType, bubbles: bool, cancelable: bool) -> Self {
        let mut event = Self::new(event_type);
        event.bubbles = bubbles;
        event.cancelable = cancelable;
        event
    }

    /// Create an event aimed at a node.
    pub fn targeted(event_type: EventType, target: NodeId) -> Self {
        let mut event = Self::new(event_type);
        event.target = Some(target);
        event
    }

    /// Prevent default action.
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    /// Stop propagation.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Stop immediate propagation.
    pub fn stop_immediate_propagation(&mut self) {
        self.immediate_propagation_stopped = true;
        self.propagation_stopped = true;
    }
}

/// Event listener callback. `C` is the context handed to the listener,
/// typically the page environment that owns the manager.
pub type EventCallback<C> = Arc<dyn Fn(&mut C, &mut Event) + Send + Sync>;

/// Event listener options.
#[derive(Clone, Debug, Default)]
pub struct EventListenerOptions {
    pub capture: bool,
    pub once: bool,
    pub passive: bool,
}

/// Event listener.
pub struct EventListener<C: ?Sized> {
    pub id: u64,
    pub callback: EventCallback<C>,
    pub options: EventListenerOptions,
}

impl<C: ?Sized> Clone for EventListener<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: Arc::clone(&self.callback),
            options: self.options.clone(),
        }
    }
}

/// Listener registry.
///
/// The manager never invokes callbacks itself: callers snapshot the
/// listeners for a hop with [`EventManager::listeners`] and run them with
/// the context they own, so listeners may freely mutate that context.
pub struct EventManager<C: ?Sized> {
    listeners: HashMap<ListenerTarget, HashMap<EventType, Vec<EventListener<C>>>>,
    next_id: u64,
}

impl<C: ?Sized> EventManager<C> {
    pub fn new() -> Self {
        Self {
            listeners: HashMap::new(),
            next_id: 1,
        }
    }

    /// Add an event listener. Returns an id usable with `remove_listener`.
    pub fn add_listener(
        &mut self,
        target: ListenerTarget,
        event_type: EventType,
        callback: EventCallback<C>,
        options: EventListenerOptions,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        self.listeners
            .entry(target)
            .or_default()
            .entry(event_type)
            .or_default()
            .push(EventListener {
                id,
                callback,
                options,
            });
        id
    }

    /// Remove a listener by id.
    pub fn remove_listener(&mut self, listener_id: u64) -> bool {
        for by_type in self.listeners.values_mut() {
            for list in by_type.values_mut() {
                if let Some(pos) = list.iter().position(|l| l.id == listener_id) {
                    list.remove(pos);
                    return true;
                }
            }
        }
        false
    }

    /// Snapshot the listeners that fire on `target` during `phase`.
    /// `once` listeners are removed as part of the snapshot.
    pub fn listeners(
        &mut self,
        target: ListenerTarget,
        event_type: &EventType,
        phase: EventPhase,
    ) -> Vec<EventListener<C>> {
        let Some(list) = self
            .listeners
            .get_mut(&target)
            .and_then(|by_type| by_type.get_mut(event_type))
        else {
            return Vec::new();
        };

        let selected: Vec<EventListener<C>> = list
            .iter()
            .filter(|l| match phase {
                EventPhase::Capturing => l.options.capture,
                EventPhase::Bubbling => !l.options.capture,
                EventPhase::AtTarget | EventPhase::None => true,
            })
            .cloned()
            .collect();

        list.retain(|l| !(l.options.once && selected.iter().any(|s| s.id == l.id)));
        selected
    }

    /// Number of listeners registered for a target and type.
    pub fn listener_count(&self, target: ListenerTarget, event_type: &EventType) -> usize {
        self.listeners
            .get(&target)
            .and_then(|by_type| by_type.get(event_type))
            .map(|list| list.len())
            .unwrap_or(0)
    }

    /// Remove all listeners for a target.
    pub fn remove_all(&mut self, target: ListenerTarget) {
        self.listeners.remove(&target);
    }
}

impl<C: ?Sized> Default for EventManager<C> {
    fn default() -> Self {
        Self::new()
    }
}
