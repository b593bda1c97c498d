//! Splits article text into overlapping fixed-size windows.

use chronicle_common::{Chunk, SourceDocument};

/// Window size in bytes before snapping to a char boundary.
pub const CHUNK_SIZE: usize = 1000;
/// Bytes of trailing context carried into the next window.
pub const CHUNK_OVERLAP: usize = 150;

/// Snap a byte offset down to the nearest char boundary.
fn floor_char_boundary(text: &str, mut idx: usize) -> usize {
    if idx >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Cut a document into chunks of up to [`CHUNK_SIZE`] bytes with
/// [`CHUNK_OVERLAP`] bytes of overlap, each carrying the document's
/// metadata. Chunk ids are `{url}-{sequence}`.
pub fn chunk_document(doc: &SourceDocument) -> Vec<Chunk> {
    let text = doc.raw_text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut seq = 0usize;
    loop {
        let end = floor_char_boundary(text, start + CHUNK_SIZE);
        let window = &text[start..end];
        chunks.push(Chunk {
            id: format!("{}-{}", doc.url, seq),
            text: window.to_string(),
            source_url: doc.url.clone(),
            title: doc.title.clone(),
            published_date: doc.published_date,
            publisher: doc.publisher.clone(),
        });
        if end >= text.len() {
            break;
        }
        start = floor_char_boundary(text, end.saturating_sub(CHUNK_OVERLAP));
        seq += 1;
    }
    chunks
}
