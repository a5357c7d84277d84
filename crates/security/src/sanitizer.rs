//! Input sanitizer.
//!
//! Best-effort removal of obvious script-injection substrings from text
//! fields. This is not an HTML sanitizer: it does not parse markup and does
//! not catch encoded or obfuscated payloads.

use std::sync::Arc;

use dom::node::NodeId;
use once_cell::sync::Lazy;
use regex::Regex;
use web_apis::{ConsoleMessage, LogLevel};

use crate::environment::PageEnvironment;

/// Console warning logged whenever a field value is rewritten.
pub const STRIPPED_WARNING: &str = "Security: Potential XSS vector stripped from input.";

/// `<script ...>...</script>` including its body, across lines.
static SCRIPT_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script>").expect("SCRIPT_BLOCK is a valid static regex")
});

static JAVASCRIPT_SCHEME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)javascript:").expect("JAVASCRIPT_SCHEME is a valid static regex")
});

/// Inline handler prefix such as `onclick=`. Only the prefix goes; the
/// handler body that follows it is left in place.
static EVENT_HANDLER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)on(?-u:\w)+=").expect("EVENT_HANDLER is a valid static regex")
});

/// Outcome of sanitizing one value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sanitized {
    pub value: String,
    /// Whether anything was removed.
    pub stripped: bool,
}

/// Strip script blocks, `javascript:` and `on<word>=` prefixes.
///
/// The three removals repeat until the value is stable, so text such as
/// `javajavascript:script:` cannot reassemble a forbidden pattern.
pub fn sanitize(input: &str) -> Sanitized {
    let mut value = strip_once(input);
    loop {
        let next = strip_once(&value);
        if next == value {
            break;
        }
        value = next;
    }

    Sanitized {
        stripped: value != input,
        value,
    }
}

fn strip_once(input: &str) -> String {
    let pass = SCRIPT_BLOCK.replace_all(input, "");
    let pass = JAVASCRIPT_SCHEME.replace_all(&pass, "");
    let pass = EVENT_HANDLER.replace_all(&pass, "");
    pass.into_owned()
}

/// Sanitize one field in place. Returns `true` if its value was rewritten.
pub fn sanitize_field(env: &mut dyn PageEnvironment, node: NodeId) -> bool {
    if !env.is_text_field(node) {
        return false;
    }
    let Some(original) = env.field_value(node) else {
        return false;
    };

    let result = sanitize(&original);
    if !result.stripped {
        return false;
    }

    env.set_field_value(node, &result.value);
    tracing::warn!(
        removed = original.len() - result.value.len(),
        "stripped script-injection pattern from input"
    );
    env.log_message(LogLevel::Warn, ConsoleMessage::plain(STRIPPED_WARNING));
    true
}

/// Sanitize every text field as the user types into it.
pub fn install_input_sanitizer(env: &mut dyn PageEnvironment) {
    env.observe_input_changes(Arc::new(|env, event| {
        if let Some(target) = event.target {
            sanitize_field(env, target);
        }
    }));
    tracing::debug!("input sanitizer registered");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeEnvironment;

    #[test]
    fn test_strips_script_block() {
        let result = sanitize("<script>alert(1)</script>hello");
        assert_eq!(result.value, "hello");
        assert!(result.stripped);
    }

    #[test]
    fn test_script_block_spans_lines_and_case() {
        let result = sanitize("a<SCRIPT type=\"text/javascript\">\nsteal()\n</ScRiPt>b");
        assert_eq!(result.value, "ab");
    }

    #[test]
    fn test_strips_javascript_scheme() {
        assert_eq!(sanitize("JavaScript:alert(1)").value, "alert(1)");
    }

    #[test]
    fn test_handler_prefix_leaves_payload() {
        // Only the `on<word>=` prefix is removed.
        assert_eq!(sanitize("hello onclick=alert(1)").value, "hello alert(1)");
        assert_eq!(sanitize("<img src=x OnError=steal()>").value, "<img src=x steal()>");
    }

    #[test]
    fn test_removal_cannot_reassemble_pattern() {
        let result = sanitize("javajavascript:script:alert(1)");
        assert_eq!(result.value, "alert(1)");
        // Removing the handler prefix exposes a scheme.
        let result = sanitize("javasonx=cript:alert(1)");
        assert_eq!(result.value, "alert(1)");
    }

    #[test]
    fn test_clean_text_untouched() {
        let result = sanitize("plain text, on sale = 50% off");
        assert_eq!(result.value, "plain text, on sale = 50% off");
        assert!(!result.stripped);
    }

    #[test]
    fn test_unclosed_script_is_kept() {
        assert!(!sanitize("<script>never closed").stripped);
    }

    #[test]
    fn test_sanitized_value_has_no_vectors() {
        let inputs = [
            "<script>x</script>",
            "javascript:void(0)",
            "onload=go()",
            "<scr<script>x</script>ipt>y</script>",
            "JAVASCRIPT:ONMOUSEOVER=1",
        ];
        for input in inputs {
            let value = sanitize(input).value;
            assert!(!SCRIPT_BLOCK.is_match(&value), "{input:?} -> {value:?}");
            assert!(!JAVASCRIPT_SCHEME.is_match(&value), "{input:?} -> {value:?}");
            assert!(!EVENT_HANDLER.is_match(&value), "{input:?} -> {value:?}");
        }
    }

    #[test]
    fn test_input_handler_rewrites_field() {
        let mut env = FakeEnvironment::new();
        let field = env.add_element("input", &[("type", "text")]);
        install_input_sanitizer(&mut env);

        assert_eq!(env.type_into(field, "<script>alert(1)</script>hello"), "hello");
        assert_eq!(env.warnings(), vec![STRIPPED_WARNING]);

        // A clean value is left alone and logs nothing.
        assert_eq!(env.type_into(field, "hello"), "hello");
        assert_eq!(env.warnings().len(), 1);
    }

    #[test]
    fn test_textarea_is_sanitized() {
        let mut env = FakeEnvironment::new();
        let area = env.add_element("TEXTAREA", &[]);
        install_input_sanitizer(&mut env);

        assert_eq!(env.type_into(area, "see javascript:go"), "see go");
    }

    #[test]
    fn test_non_text_fields_ignored() {
        let mut env = FakeEnvironment::new();
        let checkbox = env.add_element("input", &[("type", "checkbox"), ("value", "x")]);
        let div = env.add_element("div", &[]);
        install_input_sanitizer(&mut env);

        assert_eq!(env.type_into(checkbox, "javascript:x"), "javascript:x");
        assert!(!sanitize_field(&mut env, div));
        assert!(env.warnings().is_empty());
    }
}
