//! Parameter Parser - Generation Tool Text Dialect
//!
//! Splits one extracted text blob into positive prompt, negative prompt and
//! a flat key/value footer record. Never fails: the source format has no
//! formal grammar, so malformed input degrades to best-effort output.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Footer marker for the step count.
pub const STEPS_MARKER: &str = "Steps: ";
/// Footer marker for the sampler name.
pub const SAMPLER_MARKER: &str = "Sampler: ";
/// Prefix that flips a body line (and everything after it) to the negative prompt.
pub const NEGATIVE_MARKER: &str = "Negative prompt:";

/// A comma only separates footer fields when the text after it looks like a
/// `Key:` token; commas inside values (e.g. sampler names) stay put.
static KEY_AHEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[A-Za-z0-9\s]+:").unwrap());

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedParameters {
    pub positive: String,
    pub negative: String,
    pub fields: BTreeMap<String, String>,
}

/// Which prompt buffer a body line belongs to. The flip is one-way: once a
/// negative marker is seen, every later line is negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Positive,
    Negative,
}

/// Parse a `parameters` text blob into prompts and footer fields.
pub fn parse_parameters(text: &str) -> ParsedParameters {
    if text.is_empty() {
        return ParsedParameters::default();
    }

    let lines: Vec<&str> = text.split('\n').collect();
    let footer = lines.last().copied().filter(|l| is_footer_line(l));
    let body = if footer.is_some() {
        &lines[..lines.len() - 1]
    } else {
        &lines[..]
    };

    let mut positive: Vec<&str> = Vec::new();
    let mut negative: Vec<&str> = Vec::new();
    let mut section = Section::Positive;

    for line in body {
        if let Some(rest) = line.strip_prefix(NEGATIVE_MARKER) {
            section = Section::Negative;
            let rest = rest.trim();
            if !rest.is_empty() {
                negative.push(rest);
            }
        } else {
            match section {
                Section::Positive => positive.push(line),
                Section::Negative => negative.push(line),
            }
        }
    }

    ParsedParameters {
        positive: positive.join(" ").trim().to_string(),
        negative: negative.join(" ").trim().to_string(),
        fields: footer.map(parse_footer_fields).unwrap_or_default(),
    }
}

/// Footer heuristic: the last line either starts with the step marker, or
/// carries both the step and sampler markers somewhere in it. A prompt that
/// legitimately contains both substrings misclassifies; that ambiguity is
/// inherent to the producer format and preserved here.
fn is_footer_line(line: &str) -> bool {
    line.starts_with(STEPS_MARKER)
        || (line.contains(STEPS_MARKER) && line.contains(SAMPLER_MARKER))
}

fn parse_footer_fields(line: &str) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();

    for part in split_footer(line) {
        let Some(colon) = part.find(':') else { continue };
        let key = part[..colon].trim();
        let value = part[colon + 1..].trim().to_string();
        fields.insert(canonical_key(key), value);
    }

    fields
}

/// Split a footer line at commas, but only where the following token matches
/// `Key:`. Returns the raw field substrings, separators consumed.
fn split_footer(line: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;

    for (i, ch) in line.char_indices() {
        if ch != ',' || i < start {
            continue;
        }
        let rest = &line[i + 1..];
        if KEY_AHEAD.is_match(rest) {
            parts.push(&line[start..i]);
            let skipped = rest.len() - rest.trim_start().len();
            start = i + 1 + skipped;
        }
    }

    parts.push(&line[start..]);
    parts
}

/// Canonical lowercase names for the well-known footer keys; anything else
/// is retained verbatim.
fn canonical_key(key: &str) -> String {
    match key {
        "Steps" => "steps".to_string(),
        "Sampler" => "sampler".to_string(),
        "CFG scale" => "cfg".to_string(),
        "Seed" => "seed".to_string(),
        "Size" => "size".to_string(),
        "Model" | "Model hash" => key.to_ascii_lowercase(),
        other => other.to_string(),
    }
}
