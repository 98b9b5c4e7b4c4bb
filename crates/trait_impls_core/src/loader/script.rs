//! Generated implementor chunk script decoding.
//!
//! # Responsibility
//! - Extract the `var implementors = {...}` payload from one generated
//!   `trait.<Name>.js` file.
//! - Decode every package entry into implementor descriptors.
//!
//! # Invariants
//! - Package order in the payload is preserved.
//! - Packages with `[]` are kept as present-but-empty.
//! - The registration tail of the script is ignored; delivery is the
//!   caller's decision.

use crate::loader::chunk::Chunk;
use crate::model::descriptor::ImplementorDescriptor;
use crate::model::mapping::CapabilityMapping;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

static PAYLOAD_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"var\s+implementors\s*=\s*\{").expect("valid payload regex"));

/// Chunk file decoding errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkScriptError {
    Io { path: String, message: String },
    NotAChunkFile(String),
    MissingPayload,
    UnterminatedPayload,
    InvalidJson(String),
    InvalidEntry { package: String, index: usize },
}

impl Display for ChunkScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "failed to read chunk `{path}`: {message}"),
            Self::NotAChunkFile(path) => {
                write!(f, "not an implementor chunk file (expected trait.<Name>.js): {path}")
            }
            Self::MissingPayload => {
                write!(f, "chunk script has no `var implementors = {{` payload")
            }
            Self::UnterminatedPayload => write!(f, "chunk script payload object is not closed"),
            Self::InvalidJson(message) => write!(f, "chunk payload is not valid JSON: {message}"),
            Self::InvalidEntry { package, index } => {
                write!(f, "chunk entry {index} of package `{package}` has no display string")
            }
        }
    }
}

impl Error for ChunkScriptError {}

/// Parses one generated chunk script for `trait_path`.
pub fn parse_chunk_script(trait_path: &str, source: &str) -> Result<Chunk, ChunkScriptError> {
    let payload = extract_payload(source)?;
    let raw: IndexMap<String, Vec<Value>> = serde_json::from_str(payload)
        .map_err(|err| ChunkScriptError::InvalidJson(err.to_string()))?;

    let mut mapping = CapabilityMapping::new();
    for (package, entries) in raw {
        let mut implementors = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let descriptor =
                decode_entry(entry).ok_or_else(|| ChunkScriptError::InvalidEntry {
                    package: package.clone(),
                    index,
                })?;
            implementors.push(descriptor);
        }
        mapping.insert(package, implementors);
    }
    Ok(Chunk::new(trait_path, mapping))
}

/// Returns the JSON object literal assigned to `implementors`.
fn extract_payload(source: &str) -> Result<&str, ChunkScriptError> {
    let marker = PAYLOAD_MARKER_RE
        .find(source)
        .ok_or(ChunkScriptError::MissingPayload)?;
    let start = marker.end() - 1;
    let end = matching_brace(&source[start..]).ok_or(ChunkScriptError::UnterminatedPayload)?;
    Ok(&source[start..=start + end])
}

/// Index of the `}` closing the `{` at position 0, skipping string contents.
fn matching_brace(value: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (idx, byte) in value.bytes().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Accepts the three entry shapes rustdoc has emitted over time:
/// `"html"`, `["html", synthetic?, ...]` and `{"text": "html", "synthetic": bool}`.
fn decode_entry(entry: &Value) -> Option<ImplementorDescriptor> {
    let (display, synthetic) = match entry {
        Value::String(display) => (display.as_str(), false),
        Value::Array(items) => {
            let display = items.first()?.as_str()?;
            let synthetic = items.get(1).and_then(Value::as_bool).unwrap_or(false);
            (display, synthetic)
        }
        Value::Object(fields) => {
            let display = fields.get("text")?.as_str()?;
            let synthetic = fields
                .get("synthetic")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            (display, synthetic)
        }
        _ => return None,
    };
    Some(ImplementorDescriptor::from_display(display).with_synthetic(synthetic))
}
