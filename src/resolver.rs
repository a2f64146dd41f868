//! Prompt Resolver - Ordered Rewrite Pipeline
//!
//! Expands a stored tag list into final copy-ready text. The pipeline order
//! is a correctness contract: placeholders, then wildcards, then filter
//! rules, then whitespace normalization. Reordering changes output.

use std::collections::HashMap;
use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Wildcard token: `__name__`, name limited to alphanumerics, dot,
/// underscore and hyphen.
static WILDCARD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__([A-Za-z0-9_.-]+)__").unwrap());

static LORA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<lora:[^>]+>").unwrap());
static EMBEDDING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)embedding:[^\s,]+").unwrap());
static BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bBREAK\b").unwrap());
static WEIGHT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(([^:)]+):[\d.]+\)").unwrap());
static BRACKETS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[()\[\]{}]").unwrap());

static SPACE_BEFORE_COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+,").unwrap());
static COMMA_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",(\s*,)+").unwrap());
static SPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// A named user-defined substitution applied before wildcard resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderDef {
    pub key: String,
    pub value: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

/// Independently toggleable copy-time filter rules.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterConfig {
    /// Strip `<lora:...>` reference tokens.
    pub strip_lora: bool,
    /// Strip `embedding:<name>` reference tokens.
    pub strip_embeddings: bool,
    /// Strip standalone `BREAK` tokens.
    pub strip_break: bool,
    /// Collapse `(phrase:weight)` to `phrase`, then drop residual brackets.
    pub strip_weights: bool,
}

/// Read-only snapshot of wildcard line-lists. Lookup failure is "leave the
/// token unresolved", never an error.
pub trait WildcardSource {
    fn lines(&self, name: &str) -> Option<Vec<String>>;
}

impl WildcardSource for HashMap<String, Vec<String>> {
    fn lines(&self, name: &str) -> Option<Vec<String>> {
        self.get(name).cloned()
    }
}

/// Resolve a stored tag list to final text, drawing wildcard lines from the
/// thread RNG. Non-deterministic across calls when wildcards are present;
/// that randomization is the feature.
pub fn resolve(
    tags: &[String],
    placeholders: &[PlaceholderDef],
    wildcards: &dyn WildcardSource,
    filters: &FilterConfig,
) -> String {
    resolve_with_rng(tags, placeholders, wildcards, filters, &mut rand::thread_rng())
}

/// [`resolve`] with an injectable random source, so resolution is
/// deterministic and replayable under test.
pub fn resolve_with_rng<R: Rng>(
    tags: &[String],
    placeholders: &[PlaceholderDef],
    wildcards: &dyn WildcardSource,
    filters: &FilterConfig,
    rng: &mut R,
) -> String {
    let text = tags.join(", ");
    let segments = apply_placeholders(&text, placeholders);
    let text = apply_wildcards(&segments, wildcards, rng);
    let text = apply_filters(&text, filters);
    normalize_spacing(&text)
}

/// A piece of the working text. Substituted values are tracked separately
/// so later rewrite stages never rescan them for markers.
#[derive(Debug, PartialEq, Eq)]
enum Segment {
    Source(String),
    Inserted(String),
}

/// Replace every `{key}` occurrence of every active placeholder in one
/// left-to-right pass. Inserted values land in [`Segment::Inserted`] and are
/// never rescanned, so a self-referential key cannot loop. At a given
/// position, placeholders match in their given order.
fn apply_placeholders(text: &str, placeholders: &[PlaceholderDef]) -> Vec<Segment> {
    let patterns: Vec<(String, &str)> = placeholders
        .iter()
        .filter(|p| p.active)
        .map(|p| (format!("{{{}}}", p.key), p.value.as_str()))
        .collect();

    if patterns.is_empty() {
        return vec![Segment::Source(text.to_string())];
    }

    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    'scan: while i < text.len() {
        for (pattern, value) in &patterns {
            if text[i..].starts_with(pattern.as_str()) {
                if !literal.is_empty() {
                    segments.push(Segment::Source(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Inserted(value.to_string()));
                i += pattern.len();
                continue 'scan;
            }
        }
        let step = text[i..].chars().next().map(char::len_utf8).unwrap_or(1);
        literal.push_str(&text[i..i + step]);
        i += step;
    }

    if !literal.is_empty() {
        segments.push(Segment::Source(literal));
    }
    segments
}

/// Replace each `__name__` token with one line drawn uniformly at random
/// from its wildcard file. Every occurrence draws independently; a missing
/// or empty wildcard leaves the token literal. Only source text is scanned;
/// placeholder-inserted values pass through untouched.
fn apply_wildcards<R: Rng>(
    segments: &[Segment],
    wildcards: &dyn WildcardSource,
    rng: &mut R,
) -> String {
    let mut out = String::new();

    for segment in segments {
        let text = match segment {
            Segment::Inserted(value) => {
                out.push_str(value);
                continue;
            }
            Segment::Source(text) => text,
        };

        let mut last = 0;
        for m in WILDCARD.find_iter(text) {
            let token = m.as_str();
            let name = &token[2..token.len() - 2];
            out.push_str(&text[last..m.start()]);

            match wildcards.lines(name) {
                Some(lines) => {
                    let candidates: Vec<&str> = lines
                        .iter()
                        .map(|l| l.trim())
                        .filter(|l| !l.is_empty())
                        .collect();
                    if candidates.is_empty() {
                        out.push_str(token);
                    } else {
                        out.push_str(candidates[rng.gen_range(0..candidates.len())]);
                    }
                }
                None => out.push_str(token),
            }

            last = m.end();
        }
        out.push_str(&text[last..]);
    }

    out
}

fn apply_filters(text: &str, filters: &FilterConfig) -> String {
    let mut text = text.to_string();

    if filters.strip_lora {
        text = LORA.replace_all(&text, "").into_owned();
    }
    if filters.strip_embeddings {
        text = EMBEDDING.replace_all(&text, "").into_owned();
    }
    if filters.strip_break {
        text = BREAK.replace_all(&text, "").into_owned();
    }
    if filters.strip_weights {
        text = WEIGHT.replace_all(&text, "$1").into_owned();
        text = BRACKETS.replace_all(&text, "").into_owned();
    }

    text
}

/// Final cleanup: drop whitespace before commas, collapse comma runs to a
/// single `", "`, collapse whitespace runs, trim, and drop one leading
/// comma left behind by an empty first tag. Idempotent on its own output.
pub fn normalize_spacing(text: &str) -> String {
    let text = SPACE_BEFORE_COMMA.replace_all(text, ",");
    let text = COMMA_RUN.replace_all(&text, ", ");
    let text = SPACE_RUN.replace_all(&text, " ");
    let text = text.trim();
    match text.strip_prefix(',') {
        Some(rest) => rest.trim_start().to_string(),
        None => text.to_string(),
    }
}
