//! Chunk Extractor - Embedded Text Metadata
//!
//! Walks the length-prefixed chunk stream of a PNG buffer and collects the
//! tEXt records that generation tools embed alongside the pixels.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 8-byte PNG signature expected at offset 0.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Type tag of the plain-text chunk variant. Other chunk types are skipped
/// by offset arithmetic alone, checksums included.
pub const TEXT_CHUNK_TYPE: &[u8; 4] = b"tEXt";

#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("buffer does not carry a PNG signature")]
    NotRecognizedFormat,

    #[error("chunk truncated at byte offset {offset}")]
    TruncatedRecord {
        offset: usize,
        /// Every record fully parsed before the truncation point.
        recovered: TextChunks,
    },
}

/// One keyword/text association recovered from a tEXt record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    pub keyword: String,
    pub text: String,
}

/// Ordered keyword -> text mapping in file byte order.
///
/// A repeated keyword keeps its first position but takes the last text value,
/// matching the overwrite semantics of single-producer embedding tools.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextChunks {
    chunks: Vec<TextChunk>,
}

impl TextChunks {
    pub fn insert(&mut self, keyword: String, text: String) {
        match self.chunks.iter_mut().find(|c| c.keyword == keyword) {
            Some(existing) => existing.text = text,
            None => self.chunks.push(TextChunk { keyword, text }),
        }
    }

    pub fn get(&self, keyword: &str) -> Option<&str> {
        self.chunks
            .iter()
            .find(|c| c.keyword == keyword)
            .map(|c| c.text.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TextChunk> {
        self.chunks.iter()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Extract all tEXt keyword/text pairs from a raw image buffer.
///
/// Pure function of its input: the buffer is never mutated or retained.
/// Checksums are not verified; corruption there is the producing tool's
/// concern, not the catalog's.
pub fn extract_text_chunks(buffer: &[u8]) -> Result<TextChunks, ChunkError> {
    if buffer.len() < PNG_SIGNATURE.len() || buffer[..8] != PNG_SIGNATURE {
        return Err(ChunkError::NotRecognizedFormat);
    }

    let mut chunks = TextChunks::default();
    let mut offset = PNG_SIGNATURE.len();

    while offset < buffer.len() {
        let header = match buffer.get(offset..offset + 8) {
            Some(h) => h,
            None => {
                return Err(ChunkError::TruncatedRecord {
                    offset,
                    recovered: chunks,
                })
            }
        };

        let length = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let data_start = offset + 8;

        // Record spans length(4) + type(4) + data + crc(4).
        let next = match data_start.checked_add(length).map(|n| n + 4) {
            Some(n) if n <= buffer.len() => n,
            _ => {
                return Err(ChunkError::TruncatedRecord {
                    offset,
                    recovered: chunks,
                })
            }
        };

        if &header[4..8] == TEXT_CHUNK_TYPE {
            let data = &buffer[data_start..data_start + length];
            let (keyword, text) = split_keyword(data);
            chunks.insert(keyword, text);
        }

        offset = next;
    }

    Ok(chunks)
}

/// Split record data into a NUL-terminated keyword and the trailing text
/// payload. A record with no NUL byte yields its whole data as the keyword.
fn split_keyword(data: &[u8]) -> (String, String) {
    match data.iter().position(|&b| b == 0) {
        Some(nul) => (latin1(&data[..nul]), latin1(&data[nul + 1..])),
        None => (latin1(data), String::new()),
    }
}

/// Byte-for-byte Latin-1 decoding; non-ASCII bytes pass through as the
/// matching U+0080..U+00FF code points, never an error.
fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
