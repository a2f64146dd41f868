//! Import Pipeline - Image to Record-Creation Artifact
//!
//! Glues the chunk extractor and parameter parser together for the import
//! path. Any extraction failure degrades to an empty import; a corrupt file
//! never aborts the surrounding flow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chunks::{extract_text_chunks, ChunkError};
use crate::parameters::{parse_parameters, ParsedParameters};
use crate::PARAMETERS_KEYWORD;

/// Data prefilled into the record-creation form for one imported image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportedPrompt {
    pub name: String,
    pub tags: Vec<String>,
    pub negative_tags: Vec<String>,
    pub parameters: ParsedParameters,
    pub created_at: DateTime<Utc>,
}

/// Import one image buffer: recover the `parameters` chunk, parse it, and
/// split the prompts into tag lists. `filename` names the record, extension
/// stripped.
pub fn import_image(filename: &str, buffer: &[u8]) -> ImportedPrompt {
    let chunks = match extract_text_chunks(buffer) {
        Ok(chunks) => chunks,
        Err(ChunkError::TruncatedRecord { offset, recovered }) => {
            debug!(filename, offset, "image truncated, using recovered chunks");
            recovered
        }
        Err(ChunkError::NotRecognizedFormat) => {
            debug!(filename, "no embedded metadata");
            Default::default()
        }
    };

    let parameters = chunks
        .get(PARAMETERS_KEYWORD)
        .map(parse_parameters)
        .unwrap_or_default();

    ImportedPrompt {
        name: strip_extension(filename).to_string(),
        tags: split_tags(&parameters.positive),
        negative_tags: split_tags(&parameters.negative),
        parameters,
        created_at: Utc::now(),
    }
}

/// Split a prompt string into tags on commas, trimming and dropping empties.
pub fn split_tags(prompt: &str) -> Vec<String> {
    prompt
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_extension(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(dot) if dot > 0 && !filename[dot + 1..].is_empty() => &filename[..dot],
        _ => filename,
    }
}
