//! Shield configuration.

use std::path::Path;

use common::{ShieldError, ShieldResult};
use serde::Deserialize;
use shield_security::{ConsoleWarning, ShieldOptions};
use url::Url;

/// Shield configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ShieldConfig {
    /// Product named in the console messages.
    pub product_name: String,
    /// URL given to loaded documents.
    pub url: String,
    /// Whether to print the self-XSS warning.
    pub console_warning: bool,
    /// Whether to sanitize text fields on input.
    pub sanitize_inputs: bool,
    /// Whether to harden new-tab links.
    pub harden_links: bool,
    /// Whether to cancel window drag-over and drop.
    pub block_drops: bool,
    /// Whether to refuse running inside a foreign frame.
    pub frame_guard: bool,
    /// Override for the warning title.
    pub warning_title: Option<String>,
    /// Override for the warning body.
    pub warning_body: Option<String>,
    /// Console entries kept per page.
    pub max_console_entries: usize,
}

impl ShieldConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every behaviour except the frame guard, for apps that are meant to
    /// be embedded.
    pub fn embeddable() -> Self {
        Self {
            frame_guard: false,
            ..Self::default()
        }
    }

    /// No console output besides the sanitizer warnings.
    pub fn quiet() -> Self {
        Self {
            console_warning: false,
            ..Self::default()
        }
    }

    /// Load a configuration from a TOML file. Missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> ShieldResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> ShieldResult<Self> {
        toml::from_str(content).map_err(|e| ShieldError::config(e.to_string()))
    }

    /// Set the product name.
    pub fn with_product(mut self, product: &str) -> Self {
        self.product_name = product.to_string();
        self
    }

    /// Set the document URL.
    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    pub fn with_frame_guard(mut self, enabled: bool) -> Self {
        self.frame_guard = enabled;
        self
    }

    pub fn with_console_warning(mut self, enabled: bool) -> Self {
        self.console_warning = enabled;
        self
    }

    pub fn with_input_sanitizer(mut self, enabled: bool) -> Self {
        self.sanitize_inputs = enabled;
        self
    }

    pub fn with_link_hardening(mut self, enabled: bool) -> Self {
        self.harden_links = enabled;
        self
    }

    pub fn with_drop_guard(mut self, enabled: bool) -> Self {
        self.block_drops = enabled;
        self
    }

    /// Parse the document URL.
    pub fn document_url(&self) -> ShieldResult<Url> {
        Ok(Url::parse(&self.url)?)
    }

    /// Options for [`shield_security::install`].
    pub fn options(&self) -> ShieldOptions {
        let mut warning = ConsoleWarning::for_product(&self.product_name);
        if let Some(title) = &self.warning_title {
            warning = warning.with_title(title.as_str());
        }
        if let Some(body) = &self.warning_body {
            warning = warning.with_body(body.as_str());
        }

        ShieldOptions {
            product_name: self.product_name.clone(),
            console_warning: self.console_warning,
            sanitize_inputs: self.sanitize_inputs,
            harden_links: self.harden_links,
            block_drops: self.block_drops,
            frame_guard: self.frame_guard,
            warning,
        }
    }
}

impl Default for ShieldConfig {
    fn default() -> Self {
        Self {
            product_name: "Collective AI".to_string(),
            url: "about:blank".to_string(),
            console_warning: true,
            sanitize_inputs: true,
            harden_links: true,
            block_drops: true,
            frame_guard: true,
            warning_title: None,
            warning_body: None,
            max_console_entries: 1000,
        }
    }
}
