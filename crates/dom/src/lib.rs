//! DOM (Document Object Model) implementation.
//!
//! This crate provides the document tree the page shield runs against:
//! nodes, elements, the document itself, events and the window's
//! browsing-context hierarchy.

pub mod node;
pub mod document;
pub mod element;
pub mod tree;
pub mod events;
pub mod attributes;
pub mod window;

pub use node::{Node, NodeId, NodeType, NodeData};
pub use document::{Document, DocumentRef, ReadyState};
pub use element::{ElementData, TagName};
pub use tree::{ChildListChange, DomTree};
pub use events::{Event, EventManager, EventPhase, EventType, ListenerTarget};
pub use attributes::AttributeMap;
pub use window::{Window, WindowId, WindowRef};
