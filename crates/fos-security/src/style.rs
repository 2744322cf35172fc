//! Style Sanitization
//!
//! Inline style values are accepted when they are plain tokens, an allow-listed
//! CSS function call, or a `url()` whose target is a safe URL.

use crate::url::is_safe_url;

const TRANSFORM_FNS: &[&str] = &["matrix", "translate", "scale", "rotate", "skew", "perspective"];
const TRANSFORM_SUFFIXES: &[&str] = &["", "X", "Y", "Z", "3d"];
const COLOR_FNS: &[&str] = &["rgb", "rgba", "hsl", "hsla"];
const CSS3_FNS: &[&str] = &["calc", "attr"];

fn is_value_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | ',' | '.' | '"' | '\'' | '%' | '_' | '!' | '#' | ' ')
}

fn is_fn_arg_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '%' | ',' | ' ' | '#')
}

fn is_safe_function(name: &str) -> bool {
    let transform = TRANSFORM_FNS.iter().any(|base| {
        name.strip_prefix(base)
            .is_some_and(|suffix| TRANSFORM_SUFFIXES.contains(&suffix))
    });
    let gradient = name
        .strip_prefix("repeating-")
        .unwrap_or(name)
        .strip_suffix("-gradient")
        .is_some_and(|kind| kind == "linear" || kind == "radial");
    transform || gradient || COLOR_FNS.contains(&name) || CSS3_FNS.contains(&name)
}

/// Plain token list or a single allow-listed function call
fn is_safe_style_value(value: &str) -> bool {
    if value.chars().all(is_value_char) {
        return true;
    }
    let Some((name, rest)) = value.split_once('(') else {
        return false;
    };
    let Some(args) = rest.strip_suffix(')') else {
        return false;
    };
    is_safe_function(name) && !args.is_empty() && args.chars().all(is_fn_arg_char)
}

/// Quotes must not be left open outside of the other quote kind
fn has_balanced_quotes(value: &str) -> bool {
    let mut outside_single = true;
    let mut outside_double = true;
    for c in value.chars() {
        if c == '\'' && outside_double {
            outside_single = !outside_single;
        } else if c == '"' && outside_single {
            outside_double = !outside_double;
        }
    }
    outside_single && outside_double
}

/// Check a trimmed style value
pub fn is_safe_style(value: &str) -> bool {
    if let Some(target) = value.strip_prefix("url(").and_then(|v| v.strip_suffix(')')) {
        if !target.is_empty() && !target.contains(')') && is_safe_url(target) {
            return true;
        }
    }
    is_safe_style_value(value) && has_balanced_quotes(value)
}

/// Sanitize an inline style value
pub fn sanitize_style(value: &str, replacement: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        return String::new();
    }
    if is_safe_style(value) {
        value.to_string()
    } else {
        tracing::warn!("sanitizing unsafe style value {}", value);
        replacement.to_string()
    }
}
