//! Self-XSS console warning.

use web_apis::{ConsoleMessage, LogLevel};

use crate::environment::PageEnvironment;

pub const DEFAULT_PRODUCT: &str = "Collective AI";

pub const TITLE_STYLE: &str = "font-size: 40px; color: #ef4444; font-weight: bold; font-family: sans-serif; text-shadow: 1px 1px 0 #000;";

pub const BODY_STYLE: &str = "font-size: 16px; color: #ffffff; font-family: sans-serif; background: #000; padding: 4px; border-radius: 4px;";

/// The two styled messages shown in the console.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsoleWarning {
    pub title: String,
    pub title_style: String,
    pub body: String,
    pub body_style: String,
}

impl ConsoleWarning {
    /// The stock warning, naming `product` as the account at risk.
    pub fn for_product(product: &str) -> Self {
        Self {
            title: "🛑 STOP!".to_string(),
            title_style: TITLE_STYLE.to_string(),
            body: format!(
                "This is a browser feature intended for developers. If someone told you to \
                 copy-paste something here to enable a feature or hack someone's account, it \
                 is a scam and will give them access to your {} account.",
                product
            ),
            body_style: BODY_STYLE.to_string(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

impl Default for ConsoleWarning {
    fn default() -> Self {
        Self::for_product(DEFAULT_PRODUCT)
    }
}

/// Write the warning to the console.
pub fn emit_console_warning(env: &mut dyn PageEnvironment, warning: &ConsoleWarning) {
    env.log_message(
        LogLevel::Log,
        ConsoleMessage::styled(&warning.title, &warning.title_style),
    );
    env.log_message(
        LogLevel::Log,
        ConsoleMessage::styled(&warning.body, &warning.body_style),
    );
}

/// Info line logged once every behaviour is in place.
pub fn active_message(product: &str) -> ConsoleMessage {
    ConsoleMessage::plain(format!("🛡️ {} Security Module Active", product))
}
