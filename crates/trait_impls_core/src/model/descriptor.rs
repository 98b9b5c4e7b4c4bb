//! Implementor descriptor model.
//!
//! # Responsibility
//! - Describe one `impl Capability for Type` entry in display-ready form.
//! - Recover structured fields (capability, implementor, generics) from the
//!   compiler-produced display HTML.
//!
//! # Invariants
//! - `display` is kept exactly as produced and is never rewritten.
//! - Descriptors are immutable after construction; only getters are exposed.
//! - Parsing the display string never fails; unrecognized headers keep the
//!   plain text as implementor with an empty capability.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(?:#([0-9]{1,7})|#[xX]([0-9a-fA-F]{1,6})|(lt|gt|amp|quot|apos|nbsp));")
        .expect("valid entity regex")
});
static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static IMPL_KEYWORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:unsafe\s+)?impl\b").expect("valid impl regex"));

/// One concrete type implementing one capability, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImplementorDescriptor {
    /// Display string as produced by the documentation compiler.
    display: String,
    /// Capability (trait) text, e.g. `Display` or `Iterator`.
    capability: String,
    /// Implementing type text including its generic arguments.
    implementor: String,
    /// Impl-level generic parameter list without the angle brackets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    generics: Option<String>,
    /// Trailing `where` clause predicates, without the keyword.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    where_clause: Option<String>,
    /// `impl !Capability for Type`.
    #[serde(default)]
    negative: bool,
    /// Compiler-synthesized impl (auto traits).
    #[serde(default)]
    synthetic: bool,
}

impl ImplementorDescriptor {
    /// Creates a descriptor for a plain `impl Capability for Implementor`.
    ///
    /// The display string is the HTML-escaped header text.
    pub fn new(capability: impl Into<String>, implementor: impl Into<String>) -> Self {
        let capability = capability.into();
        let implementor = implementor.into();
        let display = escape_html(&format!("impl {capability} for {implementor}"));
        Self {
            display,
            capability,
            implementor,
            generics: None,
            where_clause: None,
            negative: false,
            synthetic: false,
        }
    }

    /// Builds a descriptor from a compiler display string.
    pub fn from_display(display: impl Into<String>) -> Self {
        let display = display.into();
        let text = display_to_text(&display);
        let header = parse_impl_header(&text);
        Self {
            display,
            capability: header.capability,
            implementor: header.implementor,
            generics: header.generics,
            where_clause: header.where_clause,
            negative: header.negative,
            synthetic: false,
        }
    }

    /// Returns a copy flagged as compiler-synthesized.
    pub fn with_synthetic(mut self, synthetic: bool) -> Self {
        self.synthetic = synthetic;
        self
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn capability(&self) -> &str {
        &self.capability
    }

    pub fn implementor(&self) -> &str {
        &self.implementor
    }

    pub fn generics(&self) -> Option<&str> {
        self.generics.as_deref()
    }

    pub fn where_clause(&self) -> Option<&str> {
        self.where_clause.as_deref()
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    /// Plain-text impl header rebuilt from the structured fields.
    pub fn header_text(&self) -> String {
        if self.capability.is_empty() {
            return self.implementor.clone();
        }
        let mut out = String::from("impl");
        if let Some(generics) = &self.generics {
            out.push('<');
            out.push_str(generics);
            out.push('>');
        }
        out.push(' ');
        if self.negative {
            out.push('!');
        }
        out.push_str(&self.capability);
        out.push_str(" for ");
        out.push_str(&self.implementor);
        if let Some(where_clause) = &self.where_clause {
            out.push_str(" where ");
            out.push_str(where_clause);
        }
        out
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct ImplHeader {
    capability: String,
    implementor: String,
    generics: Option<String>,
    where_clause: Option<String>,
    negative: bool,
}

/// Strips markup, decodes entities and collapses whitespace.
fn display_to_text(display: &str) -> String {
    let stripped = TAG_RE.replace_all(display, "");
    let decoded = decode_entities(&stripped);
    WHITESPACE_RE
        .replace_all(decoded.trim(), " ")
        .into_owned()
}

/// Single pass, so decoded text is never decoded again.
fn decode_entities(value: &str) -> String {
    ENTITY_RE
        .replace_all(value, |caps: &regex::Captures<'_>| {
            let decoded = match (caps.get(1), caps.get(2), caps.get(3)) {
                (Some(dec), _, _) => dec.as_str().parse::<u32>().ok().and_then(char::from_u32),
                (_, Some(hex), _) => u32::from_str_radix(hex.as_str(), 16)
                    .ok()
                    .and_then(char::from_u32),
                (_, _, Some(name)) => match name.as_str() {
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "amp" => Some('&'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    _ => Some(' '),
                },
                _ => None,
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn parse_impl_header(text: &str) -> ImplHeader {
    let Some(keyword) = IMPL_KEYWORD_RE.find(text) else {
        return ImplHeader {
            implementor: text.to_string(),
            ..ImplHeader::default()
        };
    };

    let mut rest = &text[keyword.end()..];
    let mut generics = None;
    if rest.starts_with('<') {
        let Some(close) = matching_angle(rest) else {
            return ImplHeader {
                implementor: text.to_string(),
                ..ImplHeader::default()
            };
        };
        let inner = rest[1..close].trim();
        if !inner.is_empty() {
            generics = Some(inner.to_string());
        }
        rest = &rest[close + 1..];
    }

    let rest = rest.trim_start();
    let (negative, rest) = match rest.strip_prefix('!') {
        Some(stripped) => (true, stripped.trim_start()),
        None => (false, rest),
    };

    let Some(for_at) = find_top_level(rest, " for ") else {
        return ImplHeader {
            implementor: text.to_string(),
            ..ImplHeader::default()
        };
    };
    let capability = rest[..for_at].trim().to_string();
    let target = &rest[for_at + " for ".len()..];

    let (implementor, where_clause) = match find_where(target) {
        Some(at) => {
            let predicates = target[at + "where".len()..].trim();
            let predicates = predicates.trim_end_matches(',').trim();
            (
                target[..at].trim().to_string(),
                (!predicates.is_empty()).then(|| predicates.to_string()),
            )
        }
        None => (target.trim().to_string(), None),
    };

    ImplHeader {
        capability,
        implementor,
        generics,
        where_clause,
        negative,
    }
}

/// Index of the `>` closing the `<` at position 0. `->` arrows are skipped.
fn matching_angle(value: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut prev = '\0';
    for (idx, c) in value.char_indices() {
        match c {
            '<' => depth += 1,
            '>' if prev != '-' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
        prev = c;
    }
    None
}

/// First occurrence of `needle` outside any `<>`, `()` or `[]` nesting.
fn find_top_level(value: &str, needle: &str) -> Option<usize> {
    let mut depth = 0isize;
    let mut prev = '\0';
    for (idx, c) in value.char_indices() {
        if depth == 0 && value[idx..].starts_with(needle) {
            return Some(idx);
        }
        match c {
            '<' | '(' | '[' => depth += 1,
            '>' if prev != '-' => depth -= 1,
            ')' | ']' => depth -= 1,
            _ => {}
        }
        prev = c;
    }
    None
}

/// Position of a top-level `where` keyword. The display markup often glues it
/// to the preceding type (`Foo<T>where T: Bar`), so only the right side needs
/// a word boundary.
fn find_where(value: &str) -> Option<usize> {
    let mut depth = 0isize;
    let mut prev = '\0';
    for (idx, c) in value.char_indices() {
        if depth == 0 && idx > 0 && value[idx..].starts_with("where") {
            let after = value[idx + "where".len()..].chars().next();
            let left_ok = !(prev.is_alphanumeric() || prev == '_');
            let right_ok = after.map_or(true, char::is_whitespace);
            if right_ok && (left_ok || prev == '>') {
                return Some(idx);
            }
        }
        match c {
            '<' | '(' | '[' => depth += 1,
            '>' if prev != '-' => depth -= 1,
            ')' | ']' => depth -= 1,
            _ => {}
        }
        prev = c;
    }
    None
}
