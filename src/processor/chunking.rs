//! Token-budget chunking for extracted document text.
//!
//! Chunk boundaries come from `semchunk-rs`; token counting prefers the `cl100k_base`
//! encoding from `tiktoken-rs` and falls back to whitespace counting when the encoder
//! cannot be built. When an overlap is configured, part of the budget is reserved for
//! the tail of the previous chunk so overlapped chunks still respect `chunk_size`.

use std::sync::Arc;

use semchunk_rs::Chunker;
use thiserror::Error;
use tiktoken_rs::cl100k_base;

/// Counts tokens in a text segment.
pub(crate) type TokenCounter = Arc<dyn Fn(&str) -> usize + Send + Sync>;

/// Errors produced while segmenting a document.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// Ingestion configured an impossible token budget.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// Overlap would consume the entire chunk budget.
    #[error("chunk overlap {overlap} must be smaller than chunk size {chunk_size}")]
    OverlapTooLarge {
        /// Configured overlap in tokens.
        overlap: usize,
        /// Configured chunk size in tokens.
        chunk_size: usize,
    },
}

/// Split text into chunks of at most `chunk_size` tokens.
///
/// With a non-zero `overlap`, each chunk after the first is prefixed with the largest
/// word-aligned suffix of its predecessor that fits in `overlap` tokens. Returns an
/// empty vector for all-whitespace input.
pub(crate) fn chunk_text(
    text: &str,
    chunk_size: usize,
    overlap: usize,
    token_counter: TokenCounter,
) -> Result<Vec<String>, ChunkingError> {
    if chunk_size == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }
    if overlap >= chunk_size {
        return Err(ChunkingError::OverlapTooLarge {
            overlap,
            chunk_size,
        });
    }
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    // Reserve room for the prepended tail so overlapped chunks stay within budget.
    let budget = chunk_size - overlap;
    let counter_for_chunker = token_counter.clone();
    let chunker = Chunker::new(
        budget,
        Box::new(move |segment: &str| counter_for_chunker.as_ref()(segment)),
    );
    let base_chunks = chunker.chunk(text);
    Ok(apply_overlap(base_chunks, overlap, &token_counter))
}

/// Token counter used by the default processor: `cl100k_base`, whitespace fallback.
pub(crate) fn default_token_counter() -> TokenCounter {
    match cl100k_base() {
        Ok(encoding) => {
            let encoding = Arc::new(encoding);
            Arc::new(move |segment: &str| encoding.encode_ordinary(segment).len())
        }
        Err(error) => {
            tracing::warn!(
                error = %error,
                "cl100k_base encoder unavailable; falling back to whitespace counting"
            );
            whitespace_token_counter()
        }
    }
}

/// Whitespace token counter; non-empty segments count as at least one token.
pub(crate) fn whitespace_token_counter() -> TokenCounter {
    Arc::new(|segment: &str| {
        let tokens = segment.split_whitespace().count();
        if tokens == 0 && !segment.is_empty() {
            1
        } else {
            tokens
        }
    })
}

fn apply_overlap(chunks: Vec<String>, overlap: usize, token_counter: &TokenCounter) -> Vec<String> {
    if overlap == 0 || chunks.len() < 2 {
        return chunks;
    }

    let mut overlapped = Vec::with_capacity(chunks.len());
    let mut previous: Option<String> = None;
    for chunk in chunks {
        let merged = match previous.as_deref() {
            Some(prev) => {
                let tail = overlap_tail(prev, overlap, token_counter);
                if tail.is_empty() {
                    chunk.clone()
                } else {
                    format!("{tail} {chunk}")
                }
            }
            None => chunk.clone(),
        };
        previous = Some(chunk);
        overlapped.push(merged);
    }
    overlapped
}

/// Largest word-aligned suffix of `text` that fits within `limit` tokens.
fn overlap_tail<'a>(text: &'a str, limit: usize, token_counter: &TokenCounter) -> &'a str {
    let mut word_starts = Vec::new();
    let mut previous_was_space = true;
    for (idx, ch) in text.char_indices() {
        if previous_was_space && !ch.is_whitespace() {
            word_starts.push(idx);
        }
        previous_was_space = ch.is_whitespace();
    }

    let mut tail = "";
    for &start in word_starts.iter().rev() {
        let candidate = text[start..].trim_end();
        if token_counter.as_ref()(candidate) <= limit {
            tail = candidate;
        } else {
            break;
        }
    }
    tail
}
