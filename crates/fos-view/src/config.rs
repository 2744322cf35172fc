//! View engine configuration

use fos_security::SanitizerConfig;

/// Maximum number of values accepted by the inline check functions
pub const MAX_INLINE_BINDINGS: usize = 10;

/// View engine configuration
#[derive(Debug, Clone)]
pub struct ViewConfig {
    /// Run the verification pass after every change detection
    pub dev_mode: bool,
    /// Used when the tree builds its own [`fos_security::DomSanitizer`]
    pub sanitizer: SanitizerConfig,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            dev_mode: cfg!(debug_assertions),
            sanitizer: SanitizerConfig::default(),
        }
    }
}

impl ViewConfig {
    pub fn with_dev_mode(mut self, dev_mode: bool) -> Self {
        self.dev_mode = dev_mode;
        self
    }

    pub fn with_sanitizer(mut self, sanitizer: SanitizerConfig) -> Self {
        self.sanitizer = sanitizer;
        self
    }
}
