//! HTML5 Parser implementation using html5ever.
//!
//! Documents are parsed with html5ever into an `RcDom` and then imported
//! into our DOM tree.

pub mod parser;
pub mod serializer;

pub use parser::{parse_html, parse_html_fragment_into, HtmlParser, ParseOptions};
pub use serializer::{serialize_html, serialize_inner_html, serialize_node};
