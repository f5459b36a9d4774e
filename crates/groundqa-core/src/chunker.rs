//! Recursive boundary-aware chunking with character overlap.
//!
//! Chunks are contiguous slices of the document text. A split point is the end
//! of the last boundary marker of the highest-priority level that fits inside
//! the size limit; when no marker fits the text is cut at the limit. The next
//! chunk starts `chunk_overlap` characters before the previous end, moved
//! forward to the next word start when one exists inside that window.

use tracing::debug;

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::extract::ExtractedDocument;
use crate::types::Chunk;

/// Boundary levels, highest priority first.
const BOUNDARIES: &[&[&str]] = &[&["\n\n"], &["\n"], &[". ", "! ", "? "], &[" "]];

#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        let c = ChunkingConfig::default();
        Self { chunk_size: c.chunk_size, chunk_overlap: c.chunk_overlap }
    }
}

impl Chunker {
    pub fn new(config: &ChunkingConfig) -> Result<Self> {
        if config.chunk_size == 0 || config.chunk_overlap >= config.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunk_overlap ({}) must be smaller than a positive chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        Ok(Self { chunk_size: config.chunk_size, chunk_overlap: config.chunk_overlap })
    }

    pub fn chunk_size(&self) -> usize { self.chunk_size }

    pub fn chunk_overlap(&self) -> usize { self.chunk_overlap }

    /// Split plain text. Spans made only of whitespace are dropped, so
    /// whitespace-only text yields no chunks and ordinals stay `0..n`.
    pub fn split_text(&self, text: &str) -> Vec<Chunk> {
        let chars: Vec<char> = text.chars().collect();
        let spans = self.spans(&chars);
        let chunks: Vec<Chunk> = spans
            .into_iter()
            .filter(|&(start, end)| chars[start..end].iter().any(|c| !c.is_whitespace()))
            .enumerate()
            .map(|(ordinal, (start, end))| Chunk {
                ordinal,
                content: chars[start..end].iter().collect(),
                start,
                end,
                page: None,
            })
            .collect();
        debug!(chars = chars.len(), chunks = chunks.len(), "split text");
        chunks
    }

    /// Split an extracted document, tagging each chunk with the page it starts on.
    pub fn split_document(&self, doc: &ExtractedDocument) -> Vec<Chunk> {
        let page_starts = doc.page_starts();
        let mut chunks = self.split_text(&doc.text());
        for chunk in &mut chunks {
            let page = page_starts.partition_point(|&s| s <= chunk.start).saturating_sub(1);
            chunk.page = Some(page);
        }
        chunks
    }

    fn spans(&self, chars: &[char]) -> Vec<(usize, usize)> {
        if chars.iter().all(|c| c.is_whitespace()) {
            return Vec::new();
        }
        let n = chars.len();
        let mut spans = Vec::new();
        let mut start = 0;
        loop {
            if n - start <= self.chunk_size {
                spans.push((start, n));
                break;
            }
            let end = self.break_point(chars, start);
            spans.push((start, end));
            start = self.next_start(chars, start, end);
        }
        spans
    }

    /// End of the chunk starting at `start`. Always in `(start + overlap, start + size]`
    /// so the following chunk starts strictly after `start`.
    fn break_point(&self, chars: &[char], start: usize) -> usize {
        let limit = start + self.chunk_size;
        let floor = start + self.chunk_overlap;
        for level in BOUNDARIES {
            let best = level
                .iter()
                .filter_map(|marker| last_marker_end(chars, marker, floor, limit))
                .max();
            if let Some(end) = best {
                return end;
            }
        }
        limit
    }

    fn next_start(&self, chars: &[char], start: usize, end: usize) -> usize {
        if self.chunk_overlap == 0 {
            return end;
        }
        let desired = end - self.chunk_overlap;
        debug_assert!(desired > start);
        (desired..end)
            .find(|&p| p > 0 && chars[p - 1].is_whitespace() && !chars[p].is_whitespace())
            .unwrap_or(desired)
    }
}

/// End offset of the last `marker` occurrence ending in `(floor, limit]`.
fn last_marker_end(chars: &[char], marker: &str, floor: usize, limit: usize) -> Option<usize> {
    let marker: Vec<char> = marker.chars().collect();
    let len = marker.len();
    let mut end = limit;
    while end > floor && end >= len {
        if chars[end - len..end] == marker[..] {
            return Some(end);
        }
        end -= 1;
    }
    None
}
