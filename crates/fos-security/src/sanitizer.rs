//! DOM Sanitizer
//!
//! Maps a security context to the matching sanitization routine.

use crate::{html, style, url, SecurityError};

/// Security context a bound value is rendered into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum SecurityContext {
    #[default]
    None = 0,
    Html = 1,
    Style = 2,
    Script = 3,
    Url = 4,
    ResourceUrl = 5,
}

impl SecurityContext {
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Html => "html",
            Self::Style => "style",
            Self::Script => "script",
            Self::Url => "url",
            Self::ResourceUrl => "resource URL",
        }
    }
}

/// Sanitizer configuration
#[derive(Debug, Clone)]
pub struct SanitizerConfig {
    /// Replacement for rejected style values
    pub unsafe_style_replacement: String,
    /// Prefix added to rejected URLs
    pub unsafe_url_prefix: String,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            unsafe_style_replacement: "unsafe".to_string(),
            unsafe_url_prefix: "unsafe:".to_string(),
        }
    }
}

/// Default sanitizer for DOM-bound values
#[derive(Debug, Clone, Default)]
pub struct DomSanitizer {
    config: SanitizerConfig,
}

impl DomSanitizer {
    pub fn new(config: SanitizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SanitizerConfig {
        &self.config
    }

    /// Sanitize, reporting contexts that can never hold a bound value
    pub fn try_sanitize(
        &self,
        context: SecurityContext,
        value: Option<&str>,
    ) -> Result<Option<String>, SecurityError> {
        let Some(value) = value else {
            return Ok(None);
        };
        let sanitized = match context {
            SecurityContext::None => value.to_string(),
            SecurityContext::Html => html::sanitize_html(value),
            SecurityContext::Style => {
                style::sanitize_style(value, &self.config.unsafe_style_replacement)
            }
            SecurityContext::Url => url::sanitize_url(value, &self.config.unsafe_url_prefix),
            SecurityContext::Script | SecurityContext::ResourceUrl => {
                return Err(SecurityError::UnsafeContext {
                    context: context.name(),
                    value: value.to_string(),
                });
            }
        };
        Ok(Some(sanitized))
    }

    /// Sanitize a value; rejected values become `None`
    pub fn sanitize(&self, context: SecurityContext, value: Option<&str>) -> Option<String> {
        match self.try_sanitize(context, value) {
            Ok(v) => v,
            Err(err) => {
                tracing::warn!("{}", err);
                None
            }
        }
    }
}
