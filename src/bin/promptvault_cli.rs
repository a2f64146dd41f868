//! PromptVault CLI - Bridge interface for the catalog UI
//!
//! Commands: extract, parse, import, resolve
//! Outputs JSON to stdout (resolve prints plain text)
//! Returns non-zero when an image carries no readable metadata

use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use promptvault_core::{
    extract_text_chunks, import_image, load_placeholders, parse_parameters, resolve, ChunkError,
    DirWildcards, FilterConfig, MemoryWildcards,
};

#[derive(Parser)]
#[command(name = "promptvault-cli")]
#[command(about = "PromptVault CLI - prompt catalog engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List embedded text chunks of an image
    Extract {
        /// Image file to read
        image: PathBuf,
    },

    /// Parse a generation-parameters text blob
    Parse {
        /// Text file holding the blob, or `-` for stdin
        input: PathBuf,
    },

    /// Build a record-creation payload from an image
    Import {
        /// Image file to read
        image: PathBuf,
    },

    /// Resolve stored tags to final prompt text
    Resolve {
        /// Comma-separated tag list
        tags: String,

        /// Placeholder definitions file (flat JSON object)
        #[arg(short, long)]
        placeholders: Option<PathBuf>,

        /// Directory of wildcard .txt files
        #[arg(short, long)]
        wildcards: Option<PathBuf>,

        /// Strip <lora:...> tokens
        #[arg(long)]
        no_lora: bool,

        /// Strip embedding:<name> tokens
        #[arg(long)]
        no_embedding: bool,

        /// Strip standalone BREAK tokens
        #[arg(long)]
        no_break: bool,

        /// Collapse (phrase:weight) annotations and drop brackets
        #[arg(long)]
        normalize: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract { image } => {
            let buffer = match fs::read(&image) {
                Ok(b) => b,
                Err(e) => {
                    eprintln!(r#"{{"error": "Failed to read image: {}"}}"#, e);
                    return ExitCode::FAILURE;
                }
            };

            let (chunks, truncated) = match extract_text_chunks(&buffer) {
                Ok(chunks) => (chunks, false),
                Err(ChunkError::TruncatedRecord { recovered, .. }) => (recovered, true),
                Err(ChunkError::NotRecognizedFormat) => {
                    println!(r#"{{"chunks": [], "truncated": false}}"#);
                    return ExitCode::from(2); // no metadata available
                }
            };

            let output = serde_json::json!({
                "chunks": chunks,
                "truncated": truncated,
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap());
            ExitCode::SUCCESS
        }

        Commands::Parse { input } => {
            let text = if input.as_os_str() == "-" {
                let mut buf = String::new();
                use std::io::Read;
                if let Err(e) = std::io::stdin().read_to_string(&mut buf) {
                    eprintln!(r#"{{"error": "Failed to read stdin: {}"}}"#, e);
                    return ExitCode::FAILURE;
                }
                buf
            } else {
                match fs::read_to_string(&input) {
                    Ok(t) => t,
                    Err(e) => {
                        eprintln!(r#"{{"error": "Failed to read input: {}"}}"#, e);
                        return ExitCode::FAILURE;
                    }
                }
            };

            let parsed = parse_parameters(&text);
            println!("{}", serde_json::to_string_pretty(&parsed).unwrap());
            ExitCode::SUCCESS
        }

        Commands::Import { image } => {
            let buffer = match fs::read(&image) {
                Ok(b) => b,
                Err(e) => {
                    eprintln!(r#"{{"error": "Failed to read image: {}"}}"#, e);
                    return ExitCode::FAILURE;
                }
            };

            let name = image
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let imported = import_image(&name, &buffer);
            println!("{}", serde_json::to_string_pretty(&imported).unwrap());
            ExitCode::SUCCESS
        }

        Commands::Resolve {
            tags,
            placeholders,
            wildcards,
            no_lora,
            no_embedding,
            no_break,
            normalize,
        } => {
            let placeholders = match placeholders {
                Some(path) => match load_placeholders(&path) {
                    Ok(p) => p,
                    Err(e) => {
                        eprintln!(r#"{{"error": "Failed to load placeholders: {}"}}"#, e);
                        return ExitCode::FAILURE;
                    }
                },
                None => Vec::new(),
            };

            let tags: Vec<String> = tags
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();

            let filters = FilterConfig {
                strip_lora: no_lora,
                strip_embeddings: no_embedding,
                strip_break: no_break,
                strip_weights: normalize,
            };

            let text = match wildcards {
                Some(dir) => resolve(&tags, &placeholders, &DirWildcards::new(dir), &filters),
                None => resolve(&tags, &placeholders, &MemoryWildcards::new(), &filters),
            };

            println!("{text}");
            ExitCode::SUCCESS
        }
    }
}
