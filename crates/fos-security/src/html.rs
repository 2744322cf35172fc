//! HTML Sanitization
//!
//! A small allow-list sanitizer for bound HTML fragments. Unknown elements are
//! unwrapped (their text is kept), script-like elements are dropped together
//! with their content, and only allow-listed attributes survive.

use crate::url::is_safe_url;

const SAFE_ELEMENTS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "blockquote", "br", "caption", "cite", "code", "col",
    "colgroup", "dd", "del", "dfn", "div", "dl", "dt", "em", "figcaption", "figure", "footer",
    "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "i", "img", "ins", "kbd", "li", "mark",
    "ol", "p", "pre", "q", "s", "samp", "small", "span", "strong", "sub", "sup", "table", "tbody",
    "td", "tfoot", "th", "thead", "tr", "u", "ul",
];

const VOID_ELEMENTS: &[&str] = &["br", "col", "hr", "img"];

/// Elements removed together with everything inside them
const BLOCKED_ELEMENTS: &[&str] = &["script", "style", "template", "iframe", "object", "embed"];

const SAFE_ATTRS: &[&str] = &[
    "abbr", "align", "alt", "cite", "class", "colspan", "dir", "height", "href", "id", "lang",
    "rowspan", "src", "start", "title", "type", "width",
];

/// Attributes whose values are URLs
const URL_ATTRS: &[&str] = &["href", "src", "cite"];

struct Tag<'a> {
    name: String,
    closing: bool,
    attrs: Vec<(String, Option<&'a str>)>,
}

fn parse_tag(body: &str) -> Option<Tag<'_>> {
    let (closing, body) = match body.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, body),
    };
    let body = body.trim_end_matches('/').trim();
    let name_end = body.find(|c: char| c.is_whitespace()).unwrap_or(body.len());
    let name = body[..name_end].to_ascii_lowercase();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return None;
    }
    Some(Tag {
        name,
        closing,
        attrs: parse_attrs(&body[name_end..]),
    })
}

fn parse_attrs(mut rest: &str) -> Vec<(String, Option<&str>)> {
    let mut attrs = Vec::new();
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        let name_end = rest
            .find(|c: char| c.is_whitespace() || c == '=')
            .unwrap_or(rest.len());
        let name = rest[..name_end].to_ascii_lowercase();
        rest = rest[name_end..].trim_start();
        let mut value = None;
        if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            let (v, remaining) = match after_eq.chars().next() {
                Some(q @ ('"' | '\'')) => {
                    let inner = &after_eq[1..];
                    let end = inner.find(q).unwrap_or(inner.len());
                    (&inner[..end], inner.get(end + 1..).unwrap_or(""))
                }
                _ => {
                    let end = after_eq.find(char::is_whitespace).unwrap_or(after_eq.len());
                    (&after_eq[..end], &after_eq[end..])
                }
            };
            value = Some(v);
            rest = remaining;
        }
        if !name.is_empty() {
            attrs.push((name, value));
        }
    }
    attrs
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn write_open_tag(tag: &Tag<'_>, out: &mut String) {
    out.push('<');
    out.push_str(&tag.name);
    for (name, value) in &tag.attrs {
        if !SAFE_ATTRS.contains(&name.as_str()) {
            tracing::warn!("dropping unsafe attribute {} on <{}>", name, tag.name);
            continue;
        }
        let value = value.unwrap_or("");
        if URL_ATTRS.contains(&name.as_str()) && !is_safe_url(value) {
            tracing::warn!("dropping unsafe URL {}={} on <{}>", name, value, tag.name);
            continue;
        }
        out.push_str(&format!(" {}=\"{}\"", name, escape_attr(value)));
    }
    out.push('>');
}

/// Sanitize an HTML fragment
pub fn sanitize_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    // Name of the blocked element whose content is being skipped
    let mut skipping: Option<String> = None;

    while !rest.is_empty() {
        let Some(lt) = rest.find('<') else {
            if skipping.is_none() {
                escape_text(rest, &mut out);
            }
            break;
        };
        if skipping.is_none() {
            escape_text(&rest[..lt], &mut out);
        }
        rest = &rest[lt..];

        if let Some(comment) = rest.strip_prefix("<!--") {
            rest = comment.find("-->").map_or("", |end| &comment[end + 3..]);
            continue;
        }
        let Some(gt) = rest.find('>') else {
            // Unterminated tag: treat the remainder as text
            if skipping.is_none() {
                escape_text(rest, &mut out);
            }
            break;
        };
        let body = &rest[1..gt];
        rest = &rest[gt + 1..];

        let Some(tag) = parse_tag(body) else {
            if skipping.is_none() {
                escape_text(&format!("<{}>", body), &mut out);
            }
            continue;
        };

        if let Some(blocked) = &skipping {
            if tag.closing && &tag.name == blocked {
                skipping = None;
            }
            continue;
        }
        if BLOCKED_ELEMENTS.contains(&tag.name.as_str()) {
            tracing::warn!("dropping <{}> element and its content", tag.name);
            if !tag.closing {
                skipping = Some(tag.name);
            }
            continue;
        }
        if !SAFE_ELEMENTS.contains(&tag.name.as_str()) {
            continue;
        }
        if tag.closing {
            if !VOID_ELEMENTS.contains(&tag.name.as_str()) {
                out.push_str(&format!("</{}>", tag.name));
            }
        } else {
            write_open_tag(&tag, &mut out);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_safe_markup() {
        assert_eq!(
            sanitize_html("<p class=\"x\">Hi <b>there</b></p>"),
            "<p class=\"x\">Hi <b>there</b></p>"
        );
    }

    #[test]
    fn test_drops_scripts_and_handlers() {
        assert_eq!(sanitize_html("a<script>alert(1)</script>b"), "ab");
        assert_eq!(sanitize_html("<img src=x.png onerror='alert(1)'>"), "<img src=\"x.png\">");
        assert_eq!(sanitize_html("<a href=\"javascript:x\">go</a>"), "<a>go</a>");
    }

    #[test]
    fn test_unwraps_unknown_elements() {
        assert_eq!(sanitize_html("<blink>hey</blink><!-- c -->"), "hey");
        assert_eq!(sanitize_html("1 < 2"), "1 &lt; 2");
    }
}
