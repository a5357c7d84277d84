//! DOM Tree implementation.

use crate::element::{ElementData, SimpleSelector};
use crate::node::{DocumentType, Node, NodeData, NodeId};
use slotmap::SlotMap;
use std::collections::HashMap;

/// A structural change to one parent's child list.
///
/// The tree keeps a journal of these so that mutation observers can be
/// notified at the next checkpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChildListChange {
    /// Parent whose children changed.
    pub target: NodeId,
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
    pub previous_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
}

/// The DOM tree structure.
pub struct DomTree {
    /// All nodes in the tree.
    nodes: SlotMap<NodeId, Node>,
    /// Root node (document).
    root: NodeId,
    /// ID to node mapping for fast lookups.
    id_map: HashMap<String, NodeId>,
    /// Pending child-list changes.
    changes: Vec<ChildListChange>,
}

impl DomTree {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert_with_key(Node::new_document);
        Self {
            nodes,
            root,
            id_map: HashMap::new(),
            changes: Vec::new(),
        }
    }

    /// Get the root document node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get a node by ID.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Get a mutable node by ID.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Get element data for a node.
    pub fn get_element(&self, id: NodeId) -> Option<&ElementData> {
        self.nodes.get(id).and_then(|n| n.as_element())
    }

    /// Get mutable element data for a node.
    pub fn get_element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.nodes.get_mut(id).and_then(|n| n.as_element_mut())
    }

    /// Create an element node. The node is detached until appended.
    pub fn create_element(&mut self, data: ElementData) -> NodeId {
        self.nodes.insert_with_key(|id| Node::new_element(id, data))
    }

    /// Create a text node.
    pub fn create_text(&mut self, content: String) -> NodeId {
        self.nodes.insert_with_key(|id| Node::new_text(id, content))
    }

    /// Create a comment node.
    pub fn create_comment(&mut self, content: String) -> NodeId {
        self.nodes.insert_with_key(|id| Node::new_comment(id, content))
    }

    /// Create a doctype node.
    pub fn create_doctype(&mut self, doctype: DocumentType) -> NodeId {
        self.nodes.insert_with_key(|id| Node::new_doctype(id, doctype))
    }

    /// Append a child to a parent node.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return;
        }
        if self.is_inclusive_ancestor(child, parent) {
            tracing::warn!("refusing to append a node into its own subtree");
            return;
        }

        self.remove_from_parent(child);

        let last_child = self.last_child(parent);
        if let Some(last) = last_child.and_then(|id| self.nodes.get_mut(id)) {
            last.next_sibling = Some(child);
        }

        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.push(child);
        }

        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.parent = Some(parent);
            child_node.prev_sibling = last_child;
            child_node.next_sibling = None;
        }

        self.index_subtree(child);
        self.record_change(ChildListChange {
            target: parent,
            added: vec![child],
            removed: Vec::new(),
            previous_sibling: last_child,
            next_sibling: None,
        });
    }

    /// Insert a child before a reference node.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        let ref_id = match reference {
            Some(r) if self.parent(r) == Some(parent) && r != child => r,
            _ => return self.append_child(parent, child),
        };
        if self.is_inclusive_ancestor(child, parent) {
            return;
        }

        self.remove_from_parent(child);

        if let Some(parent_node) = self.nodes.get_mut(parent) {
            if let Some(pos) = parent_node.children.iter().position(|&id| id == ref_id) {
                parent_node.children.insert(pos, child);
            }
        }

        let prev = self.prev_sibling(ref_id);
        if let Some(prev_node) = prev.and_then(|id| self.nodes.get_mut(id)) {
            prev_node.next_sibling = Some(child);
        }
        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.parent = Some(parent);
            child_node.prev_sibling = prev;
            child_node.next_sibling = Some(ref_id);
        }
        if let Some(ref_node) = self.nodes.get_mut(ref_id) {
            ref_node.prev_sibling = Some(child);
        }

        self.index_subtree(child);
        self.record_change(ChildListChange {
            target: parent,
            added: vec![child],
            removed: Vec::new(),
            previous_sibling: prev,
            next_sibling: Some(ref_id),
        });
    }

    /// Remove a node from its parent. The node stays alive, detached.
    pub fn remove_from_parent(&mut self, node: NodeId) {
        let (parent, prev, next) = match self.nodes.get(node) {
            Some(n) => (n.parent, n.prev_sibling, n.next_sibling),
            None => return,
        };
        let parent_id = match parent {
            Some(p) => p,
            None => return,
        };

        if let Some(parent_node) = self.nodes.get_mut(parent_id) {
            parent_node.children.retain(|id| *id != node);
        }
        if let Some(prev_node) = prev.and_then(|id| self.nodes.get_mut(id)) {
            prev_node.next_sibling = next;
        }
        if let Some(next_node) = next.and_then(|id| self.nodes.get_mut(id)) {
            next_node.prev_sibling = prev;
        }
        if let Some(node_data) = self.nodes.get_mut(node) {
            node_data.parent = None;
            node_data.prev_sibling = None;
            node_data.next_sibling = None;
        }

        self.unindex_subtree(node);
        self.record_change(ChildListChange {
            target: parent_id,
            added: Vec::new(),
            removed: vec![node],
            previous_sibling: prev,
            next_sibling: next,
        });
    }

    /// Remove a node and its subtree from the tree.
    pub fn remove(&mut self, node: NodeId) {
        if node == self.root {
            return;
        }
        self.remove_from_parent(node);

        let mut to_remove = vec![node];
        let mut i = 0;
        while i < to_remove.len() {
            if let Some(n) = self.nodes.get(to_remove[i]) {
                to_remove.extend(n.children.iter().copied());
            }
            i += 1;
        }

        for id in to_remove {
            self.nodes.remove(id);
        }
    }

    /// Remove every child of `node`.
    pub fn remove_children(&mut self, node: NodeId) {
        let children: Vec<NodeId> = self.children(node).collect();
        for child in children {
            self.remove(child);
        }
    }

    /// Get parent node.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.parent)
    }

    /// Get first child.
    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.first_child())
    }

    /// Get last child.
    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.last_child())
    }

    /// Get previous sibling.
    pub fn prev_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.prev_sibling)
    }

    /// Get next sibling.
    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.next_sibling)
    }

    /// Get all children.
    pub fn children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .get(node)
            .into_iter()
            .flat_map(|n| n.children.iter().copied())
    }

    /// Get ancestors, nearest first.
    pub fn ancestors(&self, node: NodeId) -> AncestorIterator<'_> {
        AncestorIterator {
            tree: self,
            current: self.parent(node),
        }
    }

    /// Get descendants (pre-order).
    pub fn descendants(&self, node: NodeId) -> DescendantIterator<'_> {
        let mut stack = Vec::new();
        if let Some(n) = self.nodes.get(node) {
            stack.extend(n.children.iter().rev().copied());
        }
        DescendantIterator { tree: self, stack }
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor == node || self.ancestors(node).any(|a| a == ancestor)
    }

    /// Whether the node is reachable from the document root.
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.is_inclusive_ancestor(self.root, node)
    }

    /// Find element by ID.
    pub fn find_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.id_map.get(id).copied()
    }

    /// Find elements by tag name, in document order.
    pub fn find_elements_by_tag_name(&self, tag_name: &str) -> Vec<NodeId> {
        let is_all = tag_name == "*";
        self.descendants(self.root)
            .filter(|&id| {
                self.get_element(id)
                    .map(|elem| is_all || elem.tag_name == tag_name)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Find child by tag name.
    pub fn find_child_by_tag(&self, parent: NodeId, tag_name: &str) -> Option<NodeId> {
        self.children(parent).find(|&id| {
            self.get_element(id)
                .map(|e| e.tag_name == tag_name)
                .unwrap_or(false)
        })
    }

    /// Query selector (first match).
    pub fn query_selector(&self, selector: &str) -> Option<NodeId> {
        self.query_selector_all(selector).into_iter().next()
    }

    /// Query selector all, supporting `tag`, `#id`, `[attr]` and
    /// `tag[attr=value]`. Unsupported selectors match nothing.
    pub fn query_selector_all(&self, selector: &str) -> Vec<NodeId> {
        let parsed = match SimpleSelector::parse(selector) {
            Some(s) => s,
            None => {
                tracing::debug!(selector, "unsupported selector");
                return Vec::new();
            }
        };

        if let SimpleSelector::Id(id) = &parsed {
            return self.find_element_by_id(id).into_iter().collect();
        }

        self.descendants(self.root)
            .filter(|&id| {
                self.get_element(id)
                    .map(|e| e.matches_selector(&parsed))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Set an attribute on an element, keeping the ID index current.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let connected = self.is_connected(node);
        let Some(elem) = self.get_element_mut(node) else {
            return;
        };
        let old_id = elem.id.clone();
        elem.set_attribute(name, value);
        let new_id = elem.id.clone();

        if connected && old_id != new_id {
            if let Some(old) = old_id {
                self.id_map.remove(old.as_ref());
            }
            if let Some(new) = new_id {
                self.id_map.insert(new.to_string(), node);
            }
        }
    }

    /// Set text content of a node.
    pub fn set_text_content(&mut self, node: NodeId, text: &str) {
        let is_element = match self.nodes.get_mut(node) {
            Some(Node {
                data: NodeData::Text { content },
                ..
            }) => {
                *content = text.to_string();
                false
            }
            Some(n) => n.is_element(),
            None => false,
        };

        if is_element {
            self.remove_children(node);
            if !text.is_empty() {
                let text_node = self.create_text(text.to_string());
                self.append_child(node, text_node);
            }
        }
    }

    /// Get text content of a node and its descendants.
    pub fn get_text_content(&self, node: NodeId) -> String {
        let mut result = String::new();
        if let Some(text) = self.nodes.get(node).and_then(|n| n.as_text()) {
            result.push_str(text);
        }
        for id in self.descendants(node) {
            if let Some(text) = self.nodes.get(id).and_then(|n| n.as_text()) {
                result.push_str(text);
            }
        }
        result
    }

    /// Drain the pending child-list changes.
    pub fn take_changes(&mut self) -> Vec<ChildListChange> {
        std::mem::take(&mut self.changes)
    }

    /// Journal a change. Edits to detached subtrees, such as a fragment
    /// being built before insertion, are not recorded.
    fn record_change(&mut self, change: ChildListChange) {
        if self.is_connected(change.target) {
            self.changes.push(change);
        }
    }

    /// Whether any child-list change is waiting to be delivered.
    pub fn has_pending_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    fn index_subtree(&mut self, node: NodeId) {
        if !self.is_connected(node) {
            return;
        }
        let ids: Vec<(String, NodeId)> = std::iter::once(node)
            .chain(self.descendants(node))
            .filter_map(|id| {
                let elem_id = self.get_element(id)?.id.as_ref()?;
                Some((elem_id.to_string(), id))
            })
            .collect();
        for (elem_id, id) in ids {
            self.id_map.entry(elem_id).or_insert(id);
        }
    }

    fn unindex_subtree(&mut self, node: NodeId) {
        let ids: Vec<String> = std::iter::once(node)
            .chain(self.descendants(node))
            .filter_map(|id| Some(self.get_element(id)?.id.as_ref()?.to_string()))
            .collect();
        for elem_id in ids {
            if let Some(&mapped) = self.id_map.get(&elem_id) {
                if self.is_inclusive_ancestor(node, mapped) {
                    self.id_map.remove(&elem_id);
                }
            }
        }
    }

    /// Get total number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty (only root).
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over ancestor nodes.
pub struct AncestorIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl<'a> Iterator for AncestorIterator<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        self.current = self.tree.parent(current);
        Some(current)
    }
}

/// Iterator over descendant nodes (pre-order traversal).
pub struct DescendantIterator<'a> {
    tree: &'a DomTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for DescendantIterator<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;

        // Reverse order so the first child is visited first
        if let Some(node) = self.tree.nodes.get(current) {
            self.stack.extend(node.children.iter().rev().copied());
        }

        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::TagName;

    fn anchor(tree: &mut DomTree, target: &str) -> NodeId {
        let mut data = ElementData::new(TagName::a());
        data.set_attribute("target", target);
        tree.create_element(data)
    }

    #[test]
    fn test_append_child() {
        let mut tree = DomTree::new();
        let root = tree.root();

        let div = tree.create_element(ElementData::new(TagName::div()));
        tree.append_child(root, div);

        assert_eq!(tree.parent(div), Some(root));
        assert_eq!(tree.first_child(root), Some(div));
        assert!(tree.is_connected(div));
    }

    #[test]
    fn test_sibling_links() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let a = tree.create_element(ElementData::new(TagName::p()));
        let c = tree.create_element(ElementData::new(TagName::p()));
        let b = tree.create_element(ElementData::new(TagName::p()));
        tree.append_child(root, a);
        tree.append_child(root, c);
        tree.insert_before(root, b, Some(c));

        assert_eq!(tree.children(root).collect::<Vec<_>>(), vec![a, b, c]);
        assert_eq!(tree.next_sibling(a), Some(b));
        assert_eq!(tree.prev_sibling(c), Some(b));

        tree.remove_from_parent(b);
        assert_eq!(tree.next_sibling(a), Some(c));
        assert_eq!(tree.prev_sibling(c), Some(a));
    }

    #[test]
    fn test_find_by_id() {
        let mut tree = DomTree::new();
        let root = tree.root();

        let mut data = ElementData::new(TagName::div());
        data.set_attribute("id", "test");
        let div = tree.create_element(data);
        assert_eq!(tree.find_element_by_id("test"), None);

        tree.append_child(root, div);
        assert_eq!(tree.find_element_by_id("test"), Some(div));

        tree.remove(div);
        assert_eq!(tree.find_element_by_id("test"), None);
    }

    #[test]
    fn test_remove_node() {
        let mut tree = DomTree::new();
        let root = tree.root();

        let div = tree.create_element(ElementData::new(TagName::div()));
        let p = tree.create_element(ElementData::new(TagName::p()));
        tree.append_child(root, div);
        tree.append_child(div, p);

        tree.remove(div);

        assert!(tree.get(div).is_none());
        assert!(tree.get(p).is_none());
    }

    #[test]
    fn test_cannot_append_into_own_subtree() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let outer = tree.create_element(ElementData::new(TagName::div()));
        let inner = tree.create_element(ElementData::new(TagName::div()));
        tree.append_child(root, outer);
        tree.append_child(outer, inner);

        tree.append_child(inner, outer);
        assert_eq!(tree.parent(outer), Some(root));
    }

    #[test]
    fn test_query_selector_all() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let blank = anchor(&mut tree, "_blank");
        let same = anchor(&mut tree, "_self");
        let upper = anchor(&mut tree, "_BLANK");
        tree.append_child(root, blank);
        tree.append_child(root, same);
        tree.append_child(root, upper);

        let found = tree.query_selector_all(r#"a[target="_blank"]"#);
        assert_eq!(found, vec![blank, upper]);
        assert_eq!(tree.query_selector("a"), Some(blank));
        assert!(tree.query_selector_all("a > b").is_empty());
    }

    #[test]
    fn test_change_journal() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let div = tree.create_element(ElementData::new(TagName::div()));
        let p = tree.create_element(ElementData::new(TagName::p()));

        tree.append_child(root, div);
        tree.append_child(div, p);
        tree.remove(p);

        let changes = tree.take_changes();
        assert_eq!(changes.len(), 3);
        assert_eq!(changes[0].target, root);
        assert_eq!(changes[0].added, vec![div]);
        assert_eq!(changes[2].target, div);
        assert_eq!(changes[2].removed, vec![p]);
        assert!(!tree.has_pending_changes());
    }

    #[test]
    fn test_detached_edits_are_not_journaled() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let div = tree.create_element(ElementData::new(TagName::div()));
        let p = tree.create_element(ElementData::new(TagName::p()));

        tree.append_child(div, p);
        assert!(!tree.has_pending_changes());

        tree.append_child(root, div);
        let changes = tree.take_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].added, vec![div]);
    }

    #[test]
    fn test_attribute_change_is_not_journaled() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let link = anchor(&mut tree, "_blank");
        tree.append_child(root, link);
        tree.take_changes();

        tree.set_attribute(link, "rel", "noopener");
        assert!(!tree.has_pending_changes());
        assert_eq!(tree.get_element(link).and_then(|e| e.get_attribute("rel")), Some("noopener"));
    }

    #[test]
    fn test_text_content() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let div = tree.create_element(ElementData::new(TagName::div()));
        tree.append_child(root, div);

        tree.set_text_content(div, "hello");
        assert_eq!(tree.get_text_content(div), "hello");

        tree.set_text_content(div, "bye");
        assert_eq!(tree.get_text_content(div), "bye");
        assert_eq!(tree.children(div).count(), 1);
    }
}
