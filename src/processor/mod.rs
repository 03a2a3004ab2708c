//! Document processing: text extraction and chunking for staged uploads.
//!
//! The processor is the first CPU-bound stage of the pipeline. It is synchronous on
//! purpose; the orchestrator runs it on the blocking worker pool so request handling
//! never stalls behind a large PDF.

pub mod chunking;
mod extract;

use std::path::Path;

use thiserror::Error;

use crate::config::get_config;
use crate::ingest::{ChunkMetadata, FileKind, ProcessedDocument};
use chunking::{TokenCounter, chunk_text, default_token_counter};

pub use chunking::ChunkingError;

/// Errors emitted while turning a staged file into chunks.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Staged file could not be read back from disk.
    #[error("Failed to read staged document '{path}': {source}")]
    Read {
        /// Path of the staged file.
        path: String,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },
    /// Input bytes were malformed or unreadable for the resolved type.
    #[error("Failed to extract {kind} content: {message}")]
    Extract {
        /// Resolved document type.
        kind: FileKind,
        /// Diagnostic from the format-specific extractor.
        message: String,
    },
    /// Chunking step failed to segment the document.
    #[error("Failed to chunk document: {0}")]
    Chunking(#[from] ChunkingError),
}

/// Turns a staged file of a known type into chunks with per-chunk metadata.
///
/// Implementations must return equal-length chunk and metadata sequences and must be
/// safe to invoke concurrently from multiple in-flight requests.
pub trait DocumentProcessor: Send + Sync {
    /// Extract and chunk the document at `path`.
    ///
    /// `file_name` is the original upload name recorded in chunk metadata.
    /// `total_chunks` is left unset because the total is only known once splitting
    /// has finished; the orchestrator backfills it.
    fn process(
        &self,
        path: &Path,
        file_name: &str,
        kind: FileKind,
    ) -> Result<ProcessedDocument, ProcessingError>;
}

const DEFAULT_CHUNK_SIZE: usize = 512;

/// Default processor handling the allowed upload types.
pub struct StandardProcessor {
    chunk_size: usize,
    chunk_overlap: usize,
    token_counter: TokenCounter,
}

impl StandardProcessor {
    /// Build a processor with explicit chunking limits.
    pub fn with_limits(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            token_counter: default_token_counter(),
        }
    }

    /// Build a processor from the process-wide configuration.
    pub fn from_config() -> Self {
        let config = get_config();
        let chunk_size = config.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE).max(1);
        let chunk_overlap = config.chunk_overlap.unwrap_or(0);
        tracing::debug!(chunk_size, chunk_overlap, "Configured document processor");
        Self::with_limits(chunk_size, chunk_overlap)
    }
}

impl DocumentProcessor for StandardProcessor {
    fn process(
        &self,
        path: &Path,
        file_name: &str,
        kind: FileKind,
    ) -> Result<ProcessedDocument, ProcessingError> {
        let text = extract::extract_text(path, kind)?;
        let chunks = chunk_text(
            &text,
            self.chunk_size,
            self.chunk_overlap,
            self.token_counter.clone(),
        )?;

        let metadatas = chunks
            .iter()
            .enumerate()
            .map(|(chunk_index, _)| ChunkMetadata {
                chunk_index,
                total_chunks: None,
                source_file: file_name.to_string(),
                file_kind: kind,
            })
            .collect();

        tracing::debug!(
            file = file_name,
            kind = %kind,
            chunks = chunks.len(),
            "Processed document"
        );

        Ok(ProcessedDocument { chunks, metadatas })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(dir: &tempfile::TempDir, name: &str, contents: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).expect("create temp file");
        file.write_all(contents).expect("write temp file");
        path
    }

    #[test]
    fn processes_plain_text_with_indexed_metadata() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_temp(&dir, "staged_notes.txt", b"alpha beta gamma delta");
        let processor = StandardProcessor::with_limits(2, 0);

        let document = processor
            .process(&path, "notes.txt", FileKind::Txt)
            .expect("processed");

        assert!(!document.chunks.is_empty());
        assert_eq!(document.chunks.len(), document.metadatas.len());
        for (index, metadata) in document.metadatas.iter().enumerate() {
            assert_eq!(metadata.chunk_index, index);
            assert_eq!(metadata.total_chunks, None);
            assert_eq!(metadata.source_file, "notes.txt");
            assert_eq!(metadata.file_kind, FileKind::Txt);
        }
    }

    #[test]
    fn empty_document_produces_no_chunks() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_temp(&dir, "staged_empty.txt", b"   \n  ");
        let processor = StandardProcessor::with_limits(64, 0);

        let document = processor
            .process(&path, "empty.txt", FileKind::Txt)
            .expect("processed");
        assert!(document.chunks.is_empty());
        assert!(document.metadatas.is_empty());
    }

    #[test]
    fn markdown_markup_is_stripped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_temp(
            &dir,
            "staged_readme.md",
            b"# Title\n\nSome *emphasized* body text.\n",
        );
        let processor = StandardProcessor::with_limits(64, 0);

        let document = processor
            .process(&path, "readme.md", FileKind::Md)
            .expect("processed");
        let joined = document.chunks.join(" ");
        assert!(joined.contains("Title"));
        assert!(joined.contains("emphasized"));
        assert!(!joined.contains('#'));
        assert!(!joined.contains('*'));
    }

    #[test]
    fn json_scalars_are_flattened() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_temp(
            &dir,
            "staged_data.json",
            br#"{"title": "Release notes", "version": 3, "tags": ["infra", "rust"]}"#,
        );
        let processor = StandardProcessor::with_limits(64, 0);

        let document = processor
            .process(&path, "data.json", FileKind::Json)
            .expect("processed");
        let joined = document.chunks.join(" ");
        assert!(joined.contains("Release notes"));
        assert!(joined.contains('3'));
        assert!(joined.contains("infra"));
    }

    #[test]
    fn malformed_json_is_an_extract_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_temp(&dir, "staged_bad.json", b"{ not json");
        let processor = StandardProcessor::with_limits(64, 0);

        let err = processor
            .process(&path, "bad.json", FileKind::Json)
            .unwrap_err();
        assert!(matches!(
            err,
            ProcessingError::Extract {
                kind: FileKind::Json,
                ..
            }
        ));
    }

    #[test]
    fn malformed_pdf_is_an_extract_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_temp(&dir, "staged_bad.pdf", b"not a pdf at all");
        let processor = StandardProcessor::with_limits(64, 0);

        let err = processor
            .process(&path, "bad.pdf", FileKind::Pdf)
            .unwrap_err();
        assert!(matches!(
            err,
            ProcessingError::Extract {
                kind: FileKind::Pdf,
                ..
            }
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let processor = StandardProcessor::with_limits(64, 0);
        let err = processor
            .process(Path::new("/nonexistent/staged.txt"), "staged.txt", FileKind::Txt)
            .unwrap_err();
        assert!(matches!(err, ProcessingError::Read { .. }));
    }
}
