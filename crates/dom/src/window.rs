//! DOM Window object and browsing-context hierarchy.

use crate::document::DocumentRef;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identity of a browsing context. Two windows are the same context
/// exactly when their ids are equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WindowId(u64);

impl WindowId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        WindowId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Shared window reference.
pub type WindowRef = Arc<RwLock<Window>>;

/// Browser window object.
pub struct Window {
    /// Browsing context identity (`window.self`).
    id: WindowId,
    /// Associated document.
    pub document: Option<DocumentRef>,
    /// Window name.
    pub name: String,
    /// Parent window (for frames).
    pub parent: Option<WindowRef>,
    /// Top-level browsing context, when this window is nested.
    top: Option<WindowId>,
    /// Closed flag.
    pub closed: bool,
}

impl Window {
    /// Create a top-level window.
    pub fn new() -> Self {
        Self {
            id: WindowId::next(),
            document: None,
            name: String::new(),
            parent: None,
            top: None,
            closed: false,
        }
    }

    /// Create a window nested in `parent`'s frame. Its top is the parent's top.
    pub fn nested_in(parent: &WindowRef) -> Self {
        let top = parent.read().top_id();
        Self {
            parent: Some(Arc::clone(parent)),
            top: Some(top),
            ..Self::new()
        }
    }

    /// This window's own browsing context (`window.self`).
    pub fn self_id(&self) -> WindowId {
        self.id
    }

    /// The top-level browsing context (`window.top`).
    pub fn top_id(&self) -> WindowId {
        self.top.unwrap_or(self.id)
    }

    /// Whether `window.top === window.self`.
    pub fn is_top_level(&self) -> bool {
        self.top_id() == self.id
    }

    /// Attach a document.
    pub fn set_document(&mut self, document: DocumentRef) {
        self.document = Some(document);
    }

    /// Close the window.
    pub fn close(&mut self) {
        self.closed = true;
        self.document = None;
    }

    /// Wrap in a shared reference.
    pub fn into_ref(self) -> WindowRef {
        Arc::new(RwLock::new(self))
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_level_window() {
        let window = Window::new();
        assert!(window.is_top_level());
        assert_eq!(window.top_id(), window.self_id());
    }

    #[test]
    fn test_nested_window() {
        let top = Window::new().into_ref();
        let frame = Window::nested_in(&top).into_ref();
        let inner = Window::nested_in(&frame);

        assert!(!frame.read().is_top_level());
        assert_eq!(frame.read().top_id(), top.read().self_id());
        assert_eq!(inner.top_id(), top.read().self_id());
        assert!(!inner.is_top_level());
    }

    #[test]
    fn test_unique_ids() {
        assert_ne!(Window::new().self_id(), Window::new().self_id());
    }
}
