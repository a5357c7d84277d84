//! Drag-and-drop hijacking protection.

use std::sync::Arc;

use dom::events::EventType;

use crate::environment::PageEnvironment;

/// Window events whose default action is always cancelled.
pub const GUARDED_EVENTS: [EventType; 2] = [EventType::DragOver, EventType::Drop];

/// Stop the page from navigating to, or loading, whatever is dropped onto
/// the window. The payload is never inspected.
pub fn install_drop_guard(env: &mut dyn PageEnvironment) {
    for event_type in GUARDED_EVENTS {
        env.observe_window_event(
            event_type,
            Arc::new(|_, event| {
                event.prevent_default();
            }),
        );
    }
    tracing::debug!("drop guard registered");
}
