//! Common types shared across the PageShield crates.

pub mod error;

pub use error::{ShieldError, ShieldResult};
