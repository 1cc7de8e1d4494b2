//! Pattern-based scanning of HTML start tags.
//!
//! Uses simple string scanning (no HTML parser dependency). Good enough for
//! `<link>` tags in a document head and `<img>` tags in feed content, which
//! is all the pipeline needs. Comments, scripts and CDATA are not treated
//! specially.

/// Iterator over the raw text of every start tag with a given name.
///
/// Yields slices of the original input such as
/// `<link rel="icon" href="/favicon.png">`, including the angle brackets.
pub struct StartTags<'a> {
    html: &'a str,
    // ASCII-lowercased copy; byte offsets match `html` exactly.
    lower: String,
    needle: String,
    pos: usize,
}

/// Returns an iterator over start tags named `name` (case-insensitive).
pub fn start_tags<'a>(html: &'a str, name: &str) -> StartTags<'a> {
    StartTags {
        html,
        lower: html.to_ascii_lowercase(),
        needle: format!("<{}", name.to_ascii_lowercase()),
        pos: 0,
    }
}

impl<'a> Iterator for StartTags<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        while self.pos < self.lower.len() {
            let rel = self.lower[self.pos..].find(&self.needle)?;
            let start = self.pos + rel;
            let name_end = start + self.needle.len();

            // `<link` must not match `<linker`
            let boundary = self.lower.as_bytes().get(name_end).copied();
            if !matches!(boundary, Some(b) if b.is_ascii_whitespace() || b == b'/' || b == b'>') {
                self.pos = name_end;
                continue;
            }

            let tag_end = match self.lower[name_end..].find('>') {
                Some(offset) => name_end + offset,
                None => {
                    self.pos = self.lower.len();
                    return None;
                }
            };

            self.pos = tag_end + 1;
            return Some(&self.html[start..=tag_end]);
        }
        None
    }
}

/// Extracts the value of an attribute from a tag string (case-preserving).
///
/// Accepts double-quoted, single-quoted and unquoted values. The attribute
/// name must start at a whitespace boundary, so `src` does not match
/// `data-src`.
pub fn attr_value<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let lower = tag.to_ascii_lowercase();
    let name = name.to_ascii_lowercase();
    let bytes = lower.as_bytes();
    let mut from = 0;

    while let Some(rel) = lower[from..].find(&name) {
        let start = from + rel;
        let end = start + name.len();
        from = end;

        if start == 0 || !bytes[start - 1].is_ascii_whitespace() {
            continue;
        }

        let eq = skip_ascii_whitespace(&lower, end);
        if bytes.get(eq) != Some(&b'=') {
            continue;
        }

        let value_start = skip_ascii_whitespace(&lower, eq + 1);
        let rest = &tag[value_start..];
        return match rest.as_bytes().first()? {
            quote @ (b'"' | b'\'') => {
                let inner = &rest[1..];
                let close = inner.find(*quote as char)?;
                Some(&inner[..close])
            }
            _ => {
                let close = rest
                    .find(|c: char| c.is_ascii_whitespace() || c == '>')
                    .unwrap_or(rest.len());
                let value = rest[..close].trim_end_matches('/');
                (!value.is_empty()).then_some(value)
            }
        };
    }

    None
}

fn skip_ascii_whitespace(s: &str, from: usize) -> usize {
    from + s[from..]
        .bytes()
        .take_while(|b| b.is_ascii_whitespace())
        .count()
}

/// Whether a whitespace-separated attribute value (such as `rel`) contains
/// `token`, ignoring ASCII case.
pub fn has_token(value: &str, token: &str) -> bool {
    value
        .split_ascii_whitespace()
        .any(|t| t.eq_ignore_ascii_case(token))
}

/// Returns the `src` of the first `<img>` tag that has one.
///
/// Only the first candidate is considered; `srcset`, lazy-loading
/// attributes and `<picture>` sources are ignored.
pub fn first_img_src(html: &str) -> Option<&str> {
    start_tags(html, "img")
        .filter_map(|tag| attr_value(tag, "src"))
        .map(str::trim)
        .find(|src| !src.is_empty())
}
