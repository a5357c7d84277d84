//! Web APIs implementation.
//!
//! This crate provides the Web APIs the page shield talks to:
//! - Console API (leveled, optionally `%c`-styled messages)
//! - Mutation Observer API

pub mod console;
pub mod mutation_observer;

pub use console::{ConsoleBuffer, ConsoleLogEntry, ConsoleMessage, LogLevel};
pub use mutation_observer::{
    MutationObserver, MutationObserverController, MutationObserverInit, MutationRecord,
    MutationType,
};
