//! Citation building from retrieved chunks

use std::collections::HashMap;

use crate::types::{keys, Chunk, Citation};

/// Maximum snippet length in characters before the ellipsis
pub const SNIPPET_CHARS: usize = 240;

/// Build one citation per distinct (source, page), in first-seen order.
///
/// When several chunks share a key the one with the longest content wins, ties
/// keeping the earlier chunk. Chunks without a `source` are skipped.
pub fn build_citations(chunks: &[Chunk]) -> Vec<Citation> {
    let mut winners: Vec<&Chunk> = Vec::new();
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for chunk in chunks {
        let Some(source) = chunk.source() else {
            tracing::warn!("Skipping citation for chunk without source metadata");
            continue;
        };

        let page = chunk
            .metadata
            .get(keys::PAGE)
            .map(|p| p.to_string())
            .unwrap_or_else(|| "none".to_string());
        let key = format!("{}:{}", source, page);

        match by_key.get(&key) {
            Some(&pos) => {
                if chunk.char_len() > winners[pos].char_len() {
                    winners[pos] = chunk;
                }
            }
            None => {
                by_key.insert(key, winners.len());
                winners.push(chunk);
            }
        }
    }

    winners
        .into_iter()
        .map(|chunk| Citation {
            source: chunk.source().unwrap_or_default().to_string(),
            page: chunk.page(),
            chunk_id: chunk.chunk_id(),
            snippet: truncate_snippet(&chunk.content, SNIPPET_CHARS),
        })
        .collect()
}

/// Cut to `max_chars` characters, appending `…` only when something was cut
pub fn truncate_snippet(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_end, _)) => format!("{}…", &text[..byte_end]),
        None => text.to_string(),
    }
}
