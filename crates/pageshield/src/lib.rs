//! PageShield - client-side hardening for web pages.
//!
//! This crate hosts the shield on a parsed page:
//! - Configuration (presets, builders, TOML files)
//! - Page loading in a top-level window or a foreign frame
//! - Event and mutation-checkpoint driving
//! - Serialization of the hardened document

pub mod config;
pub mod page;

pub use config::ShieldConfig;
pub use page::{Page, ShieldState};

/// PageShield version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
