//! PromptVault Core - Prompt Catalog Engine
//!
//! The format and grammar heart of the catalog:
//! 1. Chunk Extractor recovers embedded text records from image buffers.
//! 2. Parameter Parser splits a record into prompts and footer fields.
//! 3. Prompt Resolver expands stored tags through the ordered rewrite
//!    pipeline (placeholders, wildcards, filters, normalization).
//!
//! All three cores are pure over explicitly passed snapshots; only the
//! store adapters touch the filesystem.

pub mod chunks;
pub mod dictionary;
pub mod import;
pub mod parameters;
pub mod resolver;
pub mod store;

pub use chunks::{extract_text_chunks, ChunkError, TextChunk, TextChunks};
pub use import::{import_image, split_tags, ImportedPrompt};
pub use parameters::{parse_parameters, ParsedParameters};
pub use resolver::{
    normalize_spacing, resolve, resolve_with_rng, FilterConfig, PlaceholderDef, WildcardSource,
};
pub use store::{load_placeholders, save_placeholders, DirWildcards, MemoryWildcards, StoreError};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Keyword of the text chunk that carries generation parameters. Chosen by
/// the caller, case-sensitive; the parser itself is keyword-agnostic.
pub const PARAMETERS_KEYWORD: &str = "parameters";
