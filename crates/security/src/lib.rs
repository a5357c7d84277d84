//! Client-side page hardening.
//!
//! This crate implements the page shield behaviours:
//! - Self-XSS console warning
//! - Input sanitization
//! - Link hardening against reverse tabnabbing
//! - Drag-and-drop hijacking protection
//! - Clickjacking (frame) detection
//!
//! Behaviours only talk to the page through [`PageEnvironment`].

pub mod environment;
pub mod console_warning;
pub mod sanitizer;
pub mod link_hardener;
pub mod drop_guard;
pub mod frame_guard;

#[cfg(test)]
pub(crate) mod testing;

pub use environment::{select, DocumentEnvironment, EventHandler, MutationHandler, PageEnvironment};
pub use console_warning::{active_message, emit_console_warning, ConsoleWarning};
pub use sanitizer::{install_input_sanitizer, sanitize, sanitize_field, Sanitized};
pub use link_hardener::{harden_rel, install_link_hardener, secure_external_links};
pub use drop_guard::install_drop_guard;
pub use frame_guard::check_framing;

use common::ShieldResult;
use web_apis::LogLevel;

/// Which behaviours to install, and the console text to use.
#[derive(Clone, Debug)]
pub struct ShieldOptions {
    /// Product named in the console messages.
    pub product_name: String,
    pub console_warning: bool,
    pub sanitize_inputs: bool,
    pub harden_links: bool,
    pub block_drops: bool,
    pub frame_guard: bool,
    pub warning: ConsoleWarning,
}

impl ShieldOptions {
    /// All behaviours on, with the stock messages for `product`.
    pub fn for_product(product: &str) -> Self {
        Self {
            product_name: product.to_string(),
            warning: ConsoleWarning::for_product(product),
            ..Self::default()
        }
    }
}

impl Default for ShieldOptions {
    fn default() -> Self {
        Self {
            product_name: console_warning::DEFAULT_PRODUCT.to_string(),
            console_warning: true,
            sanitize_inputs: true,
            harden_links: true,
            block_drops: true,
            frame_guard: true,
            warning: ConsoleWarning::default(),
        }
    }
}

/// Install the shield on a page.
///
/// The frame guard runs first. If the page is framed, its body has already
/// been replaced when the `Security` error comes back, and nothing else
/// is registered.
pub fn install(env: &mut dyn PageEnvironment, options: &ShieldOptions) -> ShieldResult<()> {
    if options.frame_guard {
        check_framing(env)?;
    }

    if options.console_warning {
        emit_console_warning(env, &options.warning);
    }
    if options.sanitize_inputs {
        install_input_sanitizer(env);
    }
    if options.harden_links {
        install_link_hardener(env)?;
    }
    if options.block_drops {
        install_drop_guard(env);
    }

    env.log_message(LogLevel::Info, active_message(&options.product_name));
    tracing::info!(product = %options.product_name, "page shield installed");
    Ok(())
}
