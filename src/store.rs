//! External Store Adapters
//!
//! Codecs and lookups for the externally owned placeholder and wildcard
//! stores. The resolver only ever sees snapshots built here; nothing in
//! this module caches across calls.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::resolver::{PlaceholderDef, WildcardSource};

/// Persisted key prefix marking a placeholder as disabled.
pub const DISABLED_PREFIX: &str = "_disabled_";

/// Filename suffix of wildcard line-list files.
pub const WILDCARD_SUFFIX: &str = ".txt";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load placeholder definitions from their flat JSON object form.
///
/// A key prefixed `_disabled_` loads as an inactive definition with the
/// prefix stripped. File order is kept; it is the application order.
pub fn load_placeholders(path: &Path) -> Result<Vec<PlaceholderDef>, StoreError> {
    let raw = fs::read_to_string(path)?;
    let map: Map<String, Value> = serde_json::from_str(&raw)?;

    let placeholders = map
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            match key.strip_prefix(DISABLED_PREFIX) {
                Some(stripped) => PlaceholderDef {
                    key: stripped.to_string(),
                    value,
                    active: false,
                },
                None => PlaceholderDef { key, value, active: true },
            }
        })
        .collect::<Vec<_>>();

    debug!(count = placeholders.len(), "loaded placeholder definitions");
    Ok(placeholders)
}

/// Write placeholder definitions back to the flat JSON object form,
/// re-applying the disabled prefix. Blank keys are dropped.
pub fn save_placeholders(path: &Path, placeholders: &[PlaceholderDef]) -> Result<(), StoreError> {
    let mut map = Map::new();
    for p in placeholders {
        let key = p.key.trim();
        if key.is_empty() {
            continue;
        }
        let stored_key = if p.active {
            key.to_string()
        } else {
            format!("{DISABLED_PREFIX}{key}")
        };
        map.insert(stored_key, Value::String(p.value.clone()));
    }

    fs::write(path, serde_json::to_string_pretty(&Value::Object(map))?)?;
    Ok(())
}

/// Wildcard source backed by a directory of `<name>.txt` line-lists.
///
/// Files are read lazily, one per lookup, so edits between resolution
/// passes are always picked up. Any read failure is a lookup miss.
#[derive(Debug, Clone)]
pub struct DirWildcards {
    dir: PathBuf,
}

impl DirWildcards {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Names of every wildcard file present, suffix stripped.
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if let Some(stem) = name.strip_suffix(WILDCARD_SUFFIX) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn save(&self, name: &str, content: &str) -> Result<(), StoreError> {
        fs::write(self.dir.join(format!("{name}{WILDCARD_SUFFIX}")), content)?;
        Ok(())
    }
}

impl WildcardSource for DirWildcards {
    fn lines(&self, name: &str) -> Option<Vec<String>> {
        let path = self.dir.join(format!("{name}{WILDCARD_SUFFIX}"));
        match fs::read_to_string(&path) {
            Ok(content) => Some(content.lines().map(str::to_string).collect()),
            Err(err) => {
                warn!(name, error = %err, "wildcard lookup miss");
                None
            }
        }
    }
}

/// In-memory wildcard snapshot for embedders and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryWildcards {
    files: HashMap<String, Vec<String>>,
}

impl MemoryWildcards {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, lines: Vec<String>) {
        self.files.insert(name.into(), lines);
    }
}

impl WildcardSource for MemoryWildcards {
    fn lines(&self, name: &str) -> Option<Vec<String>> {
        self.files.lines(name)
    }
}
