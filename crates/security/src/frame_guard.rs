//! Clickjacking detection.

use common::{ShieldError, ShieldResult};

use crate::environment::PageEnvironment;

/// Markup that replaces the body of an embedded page.
pub const EMBEDDED_NOTICE: &str = "<h1>Security Error: App cannot be embedded.</h1>";

/// Message of the error that aborts installation.
pub const CLICKJACKING_DETECTED: &str = "Clickjacking attempt detected.";

/// Refuse to run inside another page's frame.
///
/// When the window is not its own top-level browsing context, the body is
/// wiped and a [`ShieldError::Security`] is returned. There is no retry.
pub fn check_framing(env: &mut dyn PageEnvironment) -> ShieldResult<()> {
    if env.is_top_level() {
        return Ok(());
    }

    tracing::error!("page is embedded in a foreign frame, blanking content");
    env.replace_body_content(EMBEDDED_NOTICE)?;
    Err(ShieldError::security(CLICKJACKING_DETECTED))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeEnvironment;

    #[test]
    fn test_top_level_passes() {
        let mut env = FakeEnvironment::new();
        env.add_element("p", &[]);
        assert!(check_framing(&mut env).is_ok());
        assert!(env.body_html.is_none());
    }

    #[test]
    fn test_framed_page_is_blanked() {
        let mut env = FakeEnvironment::framed();
        let secret = env.add_element("input", &[("value", "secret")]);

        let err = check_framing(&mut env).unwrap_err();
        assert!(err.is_security());
        assert_eq!(err.to_string(), "Security error: Clickjacking attempt detected.");
        assert_eq!(env.body_html.as_deref(), Some(EMBEDDED_NOTICE));
        assert_eq!(env.attribute(secret, "value"), None);
    }
}
