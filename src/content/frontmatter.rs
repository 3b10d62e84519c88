//! Front-matter encoding and decoding
//!
//! A post file is `---\n<yaml>\n---\n\n<markdown>`. Decoding goes through
//! `serde_yaml`; encoding is done by hand so the field order and quoting stay
//! stable across edits.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::borrow::Cow;
use std::ops::Range;

use super::post::PostDraft;
use crate::error::{Error, Result};
use crate::helpers::parse_timestamp;

lazy_static! {
    /// Opening `---`, the metadata block, closing `---`
    static ref FRONT_MATTER_RE: Regex =
        Regex::new(r"\A---[ \t]*\r?\n(?:([\s\S]*?)\r?\n)??---[ \t]*(?:\r?\n|\z)").unwrap();

    /// Loose block match used only to salvage a body from broken files
    static ref LOOSE_BLOCK_RE: Regex = Regex::new(r"---[\s\S]*?---").unwrap();
}

/// Characters that force a value to be double-quoted
pub const UNSAFE_CHARS: &[char] = &[':', '"', '\'', '\n', '#', '&'];

/// Characters that change a plain YAML scalar's meaning when they lead it
const INDICATOR_CHARS: &[char] = &[
    '-', '?', '[', ']', '{', '}', ',', '*', '!', '|', '>', '%', '@', '`',
];

/// Custom deserializer that handles both a single value and a list of values
fn string_or_vec<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};
    use std::fmt;

    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_string<E>(self, value: String) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value])
        }

        fn visit_bool<E>(self, value: bool) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_i64<E>(self, value: i64) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_u64<E>(self, value: u64) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_f64<E>(self, value: f64) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_seq<S>(self, mut seq: S) -> std::result::Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(item) = seq.next_element::<String>()? {
                vec.push(item);
            }
            Ok(vec)
        }

        fn visit_none<E>(self) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_unit<E>(self) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

/// Front-matter data from a post file
///
/// Timestamps stay as text here; [`crate::content::Post`] interprets them.
/// Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub date: Option<String>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<String>,
    pub excerpt: Option<String>,
    #[serde(rename = "coverImage")]
    pub cover_image: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    #[serde(deserialize_with = "string_or_vec")]
    pub tags: Vec<String>,
}

/// Split a file into its raw metadata block and body.
///
/// The blank separator line after the closing delimiter is not part of the
/// body. Returns `None` when the file does not start with a delimited block.
pub fn split(text: &str) -> Option<(&str, &str)> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let caps = FRONT_MATTER_RE.captures(text)?;
    let block = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    let end = caps.get(0)?.end();
    let body = &text[end..];
    let body = body
        .strip_prefix("\r\n")
        .or_else(|| body.strip_prefix('\n'))
        .unwrap_or(body);
    Some((block, body))
}

/// Byte range of the metadata block inside `text`, excluding the delimiters.
/// `None` when there is no block or the block is empty.
pub(crate) fn block_span(text: &str) -> Option<Range<usize>> {
    let stripped = text.strip_prefix('\u{feff}').unwrap_or(text);
    let offset = text.len() - stripped.len();
    let block = FRONT_MATTER_RE.captures(stripped)?.get(1)?;
    Some(block.start() + offset..block.end() + offset)
}

impl FrontMatter {
    /// Parse front-matter from a post file.
    /// Returns (front_matter, content)
    pub fn parse(text: &str) -> Result<(Self, &str)> {
        let (block, body) =
            split(text).ok_or_else(|| Error::parse("missing `---` front-matter block"))?;

        if block.trim().is_empty() {
            return Ok((FrontMatter::default(), body));
        }

        let fm: FrontMatter = serde_yaml::from_str(block)?;
        Ok((fm, body))
    }
}

/// Best-effort body of a file whose front-matter cannot be decoded
pub fn salvage_body(text: &str) -> String {
    match split(text) {
        Some((_, body)) => body.trim().to_string(),
        None => LOOSE_BLOCK_RE.replace(text, "").trim().to_string(),
    }
}

/// Characters YAML rejects in a document or reads as a line break. Tab is
/// allowed inside a plain scalar.
pub(crate) fn is_special_char(c: char) -> bool {
    (c.is_control() && c != '\t') || matches!(c, '\u{2028}' | '\u{2029}')
}

/// Whether a value holds anything that cannot appear in a plain scalar
pub(crate) fn has_unsafe_chars(value: &str) -> bool {
    value.contains(UNSAFE_CHARS) || value.chars().any(is_special_char)
}

/// Append `c` as it must appear inside a double-quoted scalar
pub(crate) fn push_escaped(out: &mut String, c: char) {
    match c {
        '\\' => out.push_str("\\\\"),
        '"' => out.push_str("\\\""),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        '\u{85}' => out.push_str("\\N"),
        '\u{2028}' => out.push_str("\\L"),
        '\u{2029}' => out.push_str("\\P"),
        // Every other control character is below U+0100
        c if c.is_control() => out.push_str(&format!("\\x{:02X}", c as u32)),
        c => out.push(c),
    }
}

/// Whether a scalar must be double-quoted to survive a YAML round trip
pub fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || has_unsafe_chars(value)
        || value.trim() != value
        || value.starts_with(INDICATOR_CHARS)
        || matches!(value, "~" | "null" | "Null" | "NULL")
}

/// Escape a scalar value: unquoted when safe, otherwise double-quoted with
/// backslashes, quotes, line breaks and control characters escaped
pub fn escape_value(value: &str) -> Cow<'_, str> {
    if !needs_quotes(value) {
        return Cow::Borrowed(value);
    }

    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        push_escaped(&mut out, c);
    }
    out.push('"');
    Cow::Owned(out)
}

fn push_scalar(out: &mut String, key: &str, value: &str) {
    out.push_str(key);
    out.push_str(": ");
    out.push_str(&escape_value(value));
    out.push('\n');
}

fn push_timestamp(out: &mut String, key: &str, value: &str) {
    let value = value.trim();
    if parse_timestamp(value).is_some() && !value.contains(['"', '\'', '#']) {
        out.push_str(&format!("{}: {}\n", key, value));
    } else {
        push_scalar(out, key, value);
    }
}

/// Render a post file.
///
/// Fields are written in a fixed order; optional fields are omitted when
/// empty.
pub fn serialize(draft: &PostDraft, date: &str, updated_at: Option<&str>) -> String {
    let mut out = String::from("---\n");

    push_scalar(&mut out, "title", &draft.title);
    push_timestamp(&mut out, "date", date);
    if let Some(updated_at) = updated_at {
        push_timestamp(&mut out, "updatedAt", updated_at);
    }
    if !draft.excerpt.is_empty() {
        push_scalar(&mut out, "excerpt", &draft.excerpt);
    }

    let optional = [
        ("coverImage", &draft.cover_image),
        ("author", &draft.author),
        ("category", &draft.category),
    ];
    for (key, value) in optional {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            push_scalar(&mut out, key, value);
        }
    }

    if !draft.tags.is_empty() {
        out.push_str("tags:\n");
        for tag in &draft.tags {
            out.push_str("  - ");
            out.push_str(&escape_value(tag));
            out.push('\n');
        }
    }

    out.push_str("---\n\n");
    out.push_str(&draft.content);
    out
}
