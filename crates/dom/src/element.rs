//! DOM Element implementation.

use crate::attributes::AttributeMap;
use bitflags::bitflags;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Common HTML tag names interned for efficiency.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TagName(Arc<str>);

impl TagName {
    pub fn new(name: &str) -> Self {
        static INTERNED: Lazy<RwLock<HashMap<String, Arc<str>>>> =
            Lazy::new(|| RwLock::new(HashMap::new()));

        let lower = name.to_ascii_lowercase();

        {
            let cache = INTERNED.read();
            if let Some(s) = cache.get(&lower) {
                return TagName(s.clone());
            }
        }

        let mut cache = INTERNED.write();
        let s = cache
            .entry(lower.clone())
            .or_insert_with(|| Arc::from(lower.as_str()))
            .clone();
        TagName(s)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn body() -> Self {
        Self::new("body")
    }
    pub fn div() -> Self {
        Self::new("div")
    }
    pub fn p() -> Self {
        Self::new("p")
    }
    pub fn a() -> Self {
        Self::new("a")
    }
    pub fn input() -> Self {
        Self::new("input")
    }
    pub fn textarea() -> Self {
        Self::new("textarea")
    }
}

impl std::fmt::Display for TagName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for TagName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for TagName {
    fn eq(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl PartialEq<&str> for TagName {
    fn eq(&self, other: &&str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

bitflags! {
    /// Element flags for quick property checks.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ElementFlags: u32 {
        const VOID = 1 << 0;
        const RAW_TEXT = 1 << 1;
        const FORM_CONTROL = 1 << 2;
    }
}

/// `<input type>` values whose control edits free-form text.
const TEXT_INPUT_TYPES: &[&str] = &["text", "search", "url", "tel", "email", "password"];

/// `<input type>` values that are recognised but do not hold free-form text.
const NON_TEXT_INPUT_TYPES: &[&str] = &[
    "hidden", "checkbox", "radio", "file", "submit", "image", "reset", "button", "color",
    "date", "datetime-local", "month", "week", "time", "number", "range",
];

/// Attributes whose values selectors compare ASCII-case-insensitively in HTML documents.
const CASE_INSENSITIVE_ATTRIBUTES: &[&str] = &[
    "accept", "accept-charset", "align", "charset", "checked", "dir", "disabled", "enctype",
    "hreflang", "http-equiv", "lang", "media", "method", "multiple", "readonly", "rel", "rev",
    "selected", "target", "type",
];

/// Element-specific data.
#[derive(Clone, Debug)]
pub struct ElementData {
    /// Tag name (lowercase).
    pub tag_name: TagName,
    /// Namespace URI.
    pub namespace: Option<Arc<str>>,
    /// Attributes.
    pub attributes: AttributeMap,
    /// ID attribute (cached).
    pub id: Option<Arc<str>>,
    /// Element flags.
    pub flags: ElementFlags,
    /// Live value of a form control once it diverges from its markup.
    pub value: Option<String>,
}

impl ElementData {
    pub fn new(tag_name: TagName) -> Self {
        let flags = Self::default_flags(&tag_name);
        Self {
            tag_name,
            namespace: None,
            attributes: AttributeMap::new(),
            id: None,
            flags,
            value: None,
        }
    }

    pub fn with_namespace(tag_name: TagName, namespace: &str) -> Self {
        let mut elem = Self::new(tag_name);
        elem.namespace = Some(Arc::from(namespace));
        elem
    }

    /// Get default flags for a tag.
    fn default_flags(tag_name: &TagName) -> ElementFlags {
        let mut flags = ElementFlags::empty();
        let name = tag_name.as_str();

        if matches!(
            name,
            "area" | "base" | "br" | "col" | "embed" | "hr" | "img" | "input" | "link" | "meta"
                | "param" | "source" | "track" | "wbr"
        ) {
            flags |= ElementFlags::VOID;
        }

        if matches!(name, "script" | "style") {
            flags |= ElementFlags::RAW_TEXT;
        }

        if matches!(name, "input" | "textarea" | "select" | "button") {
            flags |= ElementFlags::FORM_CONTROL;
        }

        flags
    }

    /// Set an attribute, updating cached values.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        let name_lower = name.to_ascii_lowercase();

        if name_lower == "id" {
            self.id = Some(Arc::from(value));
        }

        self.attributes.set(&name_lower, value);
    }

    /// Remove an attribute.
    pub fn remove_attribute(&mut self, name: &str) {
        let name_lower = name.to_ascii_lowercase();

        if name_lower == "id" {
            self.id = None;
        }

        self.attributes.remove(&name_lower);
    }

    /// Get an attribute value.
    #[inline]
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(&name.to_ascii_lowercase())
    }

    /// Check if element has an attribute.
    #[inline]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains(&name.to_ascii_lowercase())
    }

    /// Check if this is a void element.
    #[inline]
    pub fn is_void(&self) -> bool {
        self.flags.contains(ElementFlags::VOID)
    }

    /// Check if children of this element serialize without escaping.
    #[inline]
    pub fn is_raw_text(&self) -> bool {
        self.flags.contains(ElementFlags::RAW_TEXT)
    }

    #[inline]
    pub fn is_form_control(&self) -> bool {
        self.flags.contains(ElementFlags::FORM_CONTROL)
    }

    /// Whether this element is a text field: a `<textarea>`, or an `<input>`
    /// whose type is missing, unknown, or one of the free-text types.
    pub fn is_text_field(&self) -> bool {
        if self.tag_name == "textarea" {
            return true;
        }
        if self.tag_name != "input" {
            return false;
        }

        match self.get_attribute("type") {
            None => true,
            Some(ty) => {
                let ty = ty.trim();
                TEXT_INPUT_TYPES.iter().any(|t| t.eq_ignore_ascii_case(ty))
                    || !NON_TEXT_INPUT_TYPES.iter().any(|t| t.eq_ignore_ascii_case(ty))
            }
        }
    }

    /// Check if this element matches a simple selector.
    pub fn matches_selector(&self, selector: &SimpleSelector) -> bool {
        match selector {
            SimpleSelector::Tag(tag) => self.tag_name == tag.as_str(),
            SimpleSelector::Id(id) => self.id.as_deref() == Some(id.as_str()),
            SimpleSelector::Attribute { tag, name, value } => {
                if let Some(tag) = tag {
                    if self.tag_name != tag.as_str() {
                        return false;
                    }
                }
                self.matches_attribute_selector(name, value.as_deref())
            }
            SimpleSelector::Universal => true,
        }
    }

    fn matches_attribute_selector(&self, name: &str, value: Option<&str>) -> bool {
        let attr_value = match self.get_attribute(name) {
            Some(v) => v,
            None => return false,
        };

        match value {
            None => true,
            Some(v) => {
                let name = name.to_ascii_lowercase();
                if CASE_INSENSITIVE_ATTRIBUTES.contains(&name.as_str()) {
                    attr_value.eq_ignore_ascii_case(v)
                } else {
                    attr_value == v
                }
            }
        }
    }
}

/// Simple CSS selector for matching.
#[derive(Clone, Debug, PartialEq)]
pub enum SimpleSelector {
    Tag(String),
    Id(String),
    /// `[name]`, `[name=value]`, optionally prefixed with a tag name.
    Attribute {
        tag: Option<String>,
        name: String,
        value: Option<String>,
    },
    Universal,
}

impl SimpleSelector {
    /// Parse the small selector subset the shield needs.
    pub fn parse(selector: &str) -> Option<Self> {
        let selector = selector.trim();
        if selector.is_empty() {
            return None;
        }
        if selector == "*" {
            return Some(SimpleSelector::Universal);
        }
        if let Some(id) = selector.strip_prefix('#') {
            return Some(SimpleSelector::Id(id.to_string()));
        }

        match selector.find('[') {
            Some(open) => {
                let inner = selector[open + 1..].strip_suffix(']')?;
                let tag = &selector[..open];
                let tag = (!tag.is_empty()).then(|| tag.to_string());
                let (name, value) = match inner.split_once('=') {
                    Some((name, value)) => (
                        name.trim(),
                        Some(value.trim().trim_matches(|c| c == '"' || c == '\'').to_string()),
                    ),
                    None => (inner.trim(), None),
                };
                if name.is_empty() {
                    return None;
                }
                Some(SimpleSelector::Attribute {
                    tag,
                    name: name.to_string(),
                    value,
                })
            }
            None => Some(SimpleSelector::Tag(selector.to_string())),
        }
    }
}
