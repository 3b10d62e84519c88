//! Repair of front-matter written before values were escaped
//!
//! Older files contain lines like `title: My: Title` that YAML rejects. Each
//! metadata line is split into key and value and the value is re-quoted when
//! it holds an unsafe character and is not already a complete quoted scalar.
//! Repairing an already repaired file changes nothing.

use super::frontmatter::{block_span, escape_value, has_unsafe_chars, is_special_char, push_escaped};
use crate::helpers::parse_timestamp;

/// Keys whose values are timestamps and may contain `:` unquoted
const TIMESTAMP_KEYS: &[&str] = &["date", "updatedAt"];

/// Repair the front-matter of a post file. Files without a front-matter
/// block are returned unchanged.
pub fn repair(text: &str) -> String {
    let Some(span) = block_span(text) else {
        return text.to_string();
    };

    let block = &text[span.clone()];
    let repaired: Vec<String> = block.split('\n').map(repair_line).collect();

    let mut out = String::with_capacity(text.len() + 16);
    out.push_str(&text[..span.start]);
    out.push_str(&repaired.join("\n"));
    out.push_str(&text[span.end..]);
    out
}

/// Whether `value` is one complete double- or single-quoted YAML scalar
pub fn is_quoted_scalar(value: &str) -> bool {
    if value.len() < 2 {
        return false;
    }

    if let Some(inner) = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    // A trailing backslash would escape the closing quote.
                    if chars.next().is_none() {
                        return false;
                    }
                }
                '"' => return false,
                _ => {}
            }
        }
        return true;
    }

    if let Some(inner) = value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')) {
        let mut chars = inner.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\'' {
                // '' is an escaped quote
                if chars.next_if_eq(&'\'').is_none() {
                    return false;
                }
            }
        }
        return true;
    }

    false
}

fn repair_value(value: &str) -> Option<String> {
    if is_quoted_scalar(value) {
        return requote(value);
    }
    if !has_unsafe_chars(value) {
        return None;
    }
    Some(escape_value(value).into_owned())
}

/// A quoted scalar holding raw control characters or line separators is
/// rewritten with those characters escaped. Anything else stays as is.
fn requote(value: &str) -> Option<String> {
    if !value.chars().any(is_special_char) {
        return None;
    }
    if value.starts_with('"') {
        let mut out = String::with_capacity(value.len() + 8);
        for c in value.chars() {
            if is_special_char(c) {
                push_escaped(&mut out, c);
            } else {
                out.push(c);
            }
        }
        return Some(out);
    }
    // Single-quoted scalars have no escapes; decode and quote again
    let inner = &value[1..value.len() - 1];
    Some(escape_value(&inner.replace("''", "'")).into_owned())
}

fn is_key(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn repair_line(line: &str) -> String {
    let (content, cr) = match line.strip_suffix('\r') {
        Some(content) => (content, "\r"),
        None => (line, ""),
    };
    let trimmed = content.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return line.to_string();
    }

    // List item
    if let Some(item) = trimmed.strip_prefix("- ") {
        let indent = &content[..content.len() - trimmed.len()];
        return match repair_value(item.trim()) {
            Some(fixed) => format!("{}- {}{}", indent, fixed, cr),
            None => line.to_string(),
        };
    }

    // Only top-level keys; indented lines belong to nested values
    if trimmed.len() != content.len() {
        return line.to_string();
    }
    let Some((key, rest)) = content.split_once(':') else {
        return line.to_string();
    };
    if !is_key(key) {
        return line.to_string();
    }
    let value = rest.trim();
    if value.is_empty() {
        return line.to_string();
    }

    if TIMESTAMP_KEYS.contains(&key) && parse_timestamp(value).is_some() {
        return line.to_string();
    }

    if key == "tags" {
        if let Some(items) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
            return expand_flow_list(key, items, cr).unwrap_or_else(|| line.to_string());
        }
    }

    match repair_value(value) {
        Some(fixed) => format!("{}: {}{}", key, fixed, cr),
        None => line.to_string(),
    }
}

/// Split the inside of a flow sequence on top-level commas. Quoted items
/// keep their commas. Returns `None` when a quote is left open.
fn split_flow_items(items: &str) -> Option<Vec<&str>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;
    let mut chars = items.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match (quote, c) {
            (Some('"'), '\\') => {
                chars.next();
            }
            (Some('"'), '"') => quote = None,
            (Some('\''), '\'') => {
                // '' is an escaped quote
                if chars.next_if(|&(_, next)| next == '\'').is_none() {
                    quote = None;
                }
            }
            (Some(_), _) => {}
            (None, '"' | '\'') if items[start..i].trim().is_empty() => quote = Some(c),
            (None, ',') => {
                out.push(items[start..i].trim());
                start = i + 1;
            }
            (None, _) => {}
        }
    }
    if quote.is_some() {
        return None;
    }
    out.push(items[start..].trim());
    Some(out.into_iter().filter(|item| !item.is_empty()).collect())
}

/// Rewrite `key: [a, b]` as a block list with each item escaped. Lists that
/// are already safe are left alone.
fn expand_flow_list(key: &str, items: &str, cr: &str) -> Option<String> {
    let items = split_flow_items(items)?;
    let needs_repair = items.iter().any(|item| repair_value(item).is_some());
    if items.is_empty() || !needs_repair {
        return None;
    }

    let mut out = format!("{}:{}", key, cr);
    for item in items {
        let value = repair_value(item).unwrap_or_else(|| item.to_string());
        out.push_str(&format!("\n  - {}{}", value, cr));
    }
    Some(out)
}
