//! fOS Security
//!
//! Sanitization of values bound into the DOM.
//!
//! Features:
//! - Security contexts (HTML, style, script, URL, resource URL)
//! - Allow-list HTML sanitizer
//! - Style value and URL sanitizers

pub mod html;
pub mod sanitizer;
pub mod style;
pub mod url;

pub use sanitizer::{DomSanitizer, SanitizerConfig, SecurityContext};

/// Security error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SecurityError {
    #[error("unsafe value used in a {context} context: {value}")]
    UnsafeContext {
        context: &'static str,
        value: String,
    },
}
