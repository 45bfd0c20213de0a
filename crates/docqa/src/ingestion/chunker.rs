//! Recursive boundary-preferring text chunker
//!
//! Windows are measured in characters. Each window is cut at the latest paragraph
//! break it contains, else line break, else sentence punctuation, else space, else
//! hard at the window edge. The next window starts exactly `overlap` characters
//! before the cut, so consecutive chunks overlap by exactly `overlap` characters.

use crate::error::{Error, Result};
use crate::types::{keys, Chunk, TextUnit};

/// Separator groups, most preferred first
const SEPARATORS: &[&[&str]] = &[&["\n\n"], &["\n"], &[". ", "! ", "? ", "; "], &[" "]];

/// Text chunker with configurable size and overlap
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Maximum chunk size in characters
    chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    overlap: usize,
    /// Separator patterns as char vectors, grouped by preference
    separators: Vec<Vec<Vec<char>>>,
}

impl TextChunker {
    /// Create a new chunker. `overlap` must be smaller than `chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Config("chunk_size must be positive".to_string()));
        }
        if overlap >= chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                overlap, chunk_size
            )));
        }

        Ok(Self {
            chunk_size,
            overlap,
            separators: compile_separators(),
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Chunk units in order. Each chunk inherits its unit's metadata; `chunk_id`
    /// becomes the chunk's ordinal within the unit and the unit's own ordinal is
    /// kept as `unit_index`.
    pub fn chunk_units(&self, units: &[TextUnit]) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for (unit_pos, unit) in units.iter().enumerate() {
            if unit.content.trim().is_empty() {
                tracing::debug!(
                    "Skipping empty unit {} of {}",
                    unit_pos,
                    unit.metadata.source().unwrap_or("unknown")
                );
                continue;
            }

            let unit_index = unit
                .metadata
                .get_i64(keys::CHUNK_ID)
                .unwrap_or(unit_pos as i64);

            for (ordinal, piece) in self.split_text(&unit.content).into_iter().enumerate() {
                let mut metadata = unit.metadata.clone();
                metadata.insert(keys::UNIT_INDEX, unit_index);
                metadata.insert(keys::CHUNK_ID, ordinal);
                chunks.push(Chunk::new(piece, metadata));
            }
        }

        chunks
    }

    /// Split text into overlapping windows
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();

        if len <= self.chunk_size {
            return vec![text.to_string()];
        }

        let mut pieces = Vec::new();
        let mut start = 0;

        loop {
            let window_end = start + self.chunk_size;
            if window_end >= len {
                pieces.push(chars[start..].iter().collect());
                break;
            }

            let cut = self.find_cut(&chars, start, window_end);
            pieces.push(chars[start..cut].iter().collect());
            start = cut - self.overlap;
        }

        pieces
    }

    /// Latest cut in `(start + overlap, window_end]`, preferring coarser separators.
    /// Cutting past `start + overlap` guarantees forward progress.
    fn find_cut(&self, chars: &[char], start: usize, window_end: usize) -> usize {
        let min_cut = start + self.overlap + 1;

        for group in &self.separators {
            let mut best: Option<usize> = None;
            for sep in group {
                if let Some(cut) = last_separator_end(chars, sep, min_cut, window_end) {
                    best = Some(best.map_or(cut, |b| b.max(cut)));
                }
            }
            if let Some(cut) = best {
                return cut;
            }
        }

        window_end
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self {
            chunk_size: 1500,
            overlap: 200,
            separators: compile_separators(),
        }
    }
}

fn compile_separators() -> Vec<Vec<Vec<char>>> {
    SEPARATORS
        .iter()
        .map(|group| group.iter().map(|s| s.chars().collect()).collect())
        .collect()
}

/// Largest `p` in `[min_cut, max_cut]` such that `sep` ends exactly at `p`
fn last_separator_end(chars: &[char], sep: &[char], min_cut: usize, max_cut: usize) -> Option<usize> {
    let n = sep.len();
    let lower = min_cut.max(n);
    if lower > max_cut {
        return None;
    }
    (lower..=max_cut).rev().find(|&p| &chars[p - n..p] == sep)
}
