//! Mutation Observer API implementation.

use common::{ShieldError, ShieldResult};
use dom::node::NodeId;
use dom::tree::{ChildListChange, DomTree};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

/// Mutation Observer.
pub struct MutationObserver {
    /// Observer ID.
    id: u64,
    /// Callback function reference.
    callback: u64,
    /// Observed targets and their options.
    targets: Vec<(NodeId, MutationObserverInit)>,
    /// Pending mutation records.
    pending_records: VecDeque<MutationRecord>,
    /// Whether the observer is connected.
    connected: bool,
}

impl MutationObserver {
    /// Create a new Mutation Observer.
    pub fn new(callback: u64) -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);

        Self {
            id: COUNTER.fetch_add(1, Ordering::Relaxed),
            callback,
            targets: Vec::new(),
            pending_records: VecDeque::new(),
            connected: false,
        }
    }

    /// Observe a target node.
    pub fn observe(&mut self, target: NodeId, options: MutationObserverInit) -> ShieldResult<()> {
        if !options.child_list && !options.attributes && !options.character_data {
            return Err(ShieldError::invalid(
                "At least one of childList, attributes, or characterData must be true",
            ));
        }

        if options.attribute_old_value && !options.attributes {
            return Err(ShieldError::invalid(
                "attributeOldValue requires attributes to be true",
            ));
        }

        // Re-observing a target replaces its options
        self.targets.retain(|(t, _)| *t != target);
        self.targets.push((target, options));
        self.connected = true;

        Ok(())
    }

    /// Stop observing all targets.
    pub fn disconnect(&mut self) {
        self.targets.clear();
        self.pending_records.clear();
        self.connected = false;
    }

    /// Take pending records.
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        self.pending_records.drain(..).collect()
    }

    /// Queue a mutation record.
    pub fn queue_record(&mut self, record: MutationRecord) {
        self.pending_records.push_back(record);
    }

    /// Check if the observer is observing a target.
    pub fn is_observing(&self, target: NodeId) -> bool {
        self.targets.iter().any(|(t, _)| *t == target)
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn callback(&self) -> u64 {
        self.callback
    }

    /// Whether a record should be delivered to this observer.
    fn is_interested(&self, record: &MutationRecord, tree: &DomTree) -> bool {
        self.targets.iter().any(|(target, options)| {
            let in_scope = *target == record.target
                || (options.subtree && tree.is_inclusive_ancestor(*target, record.target));
            if !in_scope {
                return false;
            }

            match record.mutation_type {
                MutationType::ChildList => options.child_list,
                MutationType::Attributes => {
                    if !options.attributes {
                        return false;
                    }
                    match (&options.attribute_filter, &record.attribute_name) {
                        (Some(filter), Some(name)) => filter.contains(name),
                        _ => true,
                    }
                }
                MutationType::CharacterData => options.character_data,
            }
        })
    }
}

/// Mutation observer initialization options.
#[derive(Clone, Debug, Default)]
pub struct MutationObserverInit {
    /// Observe child list changes.
    pub child_list: bool,
    /// Observe attribute changes.
    pub attributes: bool,
    /// Observe character data changes.
    pub character_data: bool,
    /// Observe entire subtree.
    pub subtree: bool,
    /// Record old attribute values.
    pub attribute_old_value: bool,
    /// Filter to specific attributes.
    pub attribute_filter: Option<Vec<String>>,
}

impl MutationObserverInit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn child_list(mut self) -> Self {
        self.child_list = true;
        self
    }

    pub fn attributes(mut self) -> Self {
        self.attributes = true;
        self
    }

    pub fn subtree(mut self) -> Self {
        self.subtree = true;
        self
    }

    pub fn attribute_filter(mut self, filter: Vec<String>) -> Self {
        self.attribute_filter = Some(filter);
        self.attributes = true;
        self
    }
}

/// Mutation record.
#[derive(Clone, Debug, PartialEq)]
pub struct MutationRecord {
    /// Type of mutation.
    pub mutation_type: MutationType,
    /// Target node.
    pub target: NodeId,
    /// Added nodes.
    pub added_nodes: Vec<NodeId>,
    /// Removed nodes.
    pub removed_nodes: Vec<NodeId>,
    /// Previous sibling.
    pub previous_sibling: Option<NodeId>,
    /// Next sibling.
    pub next_sibling: Option<NodeId>,
    /// Attribute name (for attribute mutations).
    pub attribute_name: Option<String>,
    /// Old value.
    pub old_value: Option<String>,
}

impl MutationRecord {
    /// Create a child list mutation record.
    pub fn child_list(target: NodeId) -> Self {
        Self {
            mutation_type: MutationType::ChildList,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            previous_sibling: None,
            next_sibling: None,
            attribute_name: None,
            old_value: None,
        }
    }

    /// Create an attribute mutation record.
    pub fn attributes(target: NodeId, attribute_name: &str, old_value: Option<String>) -> Self {
        Self {
            mutation_type: MutationType::Attributes,
            attribute_name: Some(attribute_name.to_string()),
            old_value,
            ..Self::child_list(target)
        }
    }

    pub fn with_added_node(mut self, node: NodeId) -> Self {
        self.added_nodes.push(node);
        self
    }

    pub fn with_removed_node(mut self, node: NodeId) -> Self {
        self.removed_nodes.push(node);
        self
    }

    pub fn with_siblings(mut self, previous: Option<NodeId>, next: Option<NodeId>) -> Self {
        self.previous_sibling = previous;
        self.next_sibling = next;
        self
    }
}

impl From<ChildListChange> for MutationRecord {
    fn from(change: ChildListChange) -> Self {
        Self {
            added_nodes: change.added,
            removed_nodes: change.removed,
            previous_sibling: change.previous_sibling,
            next_sibling: change.next_sibling,
            ..Self::child_list(change.target)
        }
    }
}

/// Mutation type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationType {
    ChildList,
    Attributes,
    CharacterData,
}

impl std::fmt::Display for MutationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MutationType::ChildList => write!(f, "childList"),
            MutationType::Attributes => write!(f, "attributes"),
            MutationType::CharacterData => write!(f, "characterData"),
        }
    }
}

/// Mutation observer controller.
pub struct MutationObserverController {
    /// Active observers.
    observers: Vec<MutationObserver>,
}

impl MutationObserverController {
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    /// Register an observer. Returns its id.
    pub fn register(&mut self, observer: MutationObserver) -> u64 {
        let id = observer.id();
        self.observers.push(observer);
        id
    }

    /// Look up a registered observer.
    pub fn get_mut(&mut self, observer_id: u64) -> Option<&mut MutationObserver> {
        self.observers.iter_mut().find(|o| o.id() == observer_id)
    }

    /// Notify observers of a mutation.
    pub fn notify(&mut self, record: MutationRecord, tree: &DomTree) {
        for observer in &mut self.observers {
            if observer.is_connected() && observer.is_interested(&record, tree) {
                observer.queue_record(record.clone());
            }
        }
    }

    /// Drain the tree's child-list journal into the observers.
    pub fn collect(&mut self, tree: &mut DomTree) -> usize {
        let changes = tree.take_changes();
        let count = changes.len();
        for change in changes {
            self.notify(change.into(), tree);
        }
        count
    }

    /// Take pending records, grouped by observer callback. Observers with
    /// nothing pending are skipped.
    pub fn flush(&mut self) -> Vec<(u64, Vec<MutationRecord>)> {
        self.observers
            .iter_mut()
            .filter_map(|observer| {
                let records = observer.take_records();
                (!records.is_empty()).then(|| (observer.callback(), records))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl Default for MutationObserverController {
    fn default() -> Self {
        Self::new()
    }
}
