//! Boundary-aware overlapping text chunker.
//!
//! Windows are counted in characters but chunk offsets are byte
//! offsets into the source text, so slicing is always UTF-8 safe.

use crate::error::Error;
use crate::types::Chunk;
use anyhow::Result;

/// Characters a window prefers to break just after: newline, full stop
/// (ASCII or CJK), exclamation mark, question mark.
const BOUNDARY_CHARS: [char; 5] = ['\n', '。', '.', '!', '?'];

/// How many characters a window scans backwards for a boundary.
pub const DEFAULT_BOUNDARY_WINDOW: usize = 100;

/// Split `text` into overlapping chunks of at most `chunk_size`
/// characters, preferring to cut just after a sentence or line end.
pub fn chunk(text: &str, chunk_size: usize, chunk_overlap: usize) -> Result<Vec<Chunk>> {
    chunk_with_window(text, chunk_size, chunk_overlap, DEFAULT_BOUNDARY_WINDOW)
}

/// Same as [`chunk`] with an explicit backward-scan window.
///
/// Texts of at most `chunk_size` characters come back verbatim as a
/// single untrimmed chunk. Longer texts are scanned front to back:
/// each window's candidate end is `chunk_size` characters past its
/// start; if a boundary character occurs within the last
/// `boundary_window` characters the cut moves to just past it,
/// otherwise the hard cut stands. Whitespace-only windows produce no
/// chunk. The next window starts `chunk_overlap` characters before the
/// previous end; a snap that would stall the scan starts at the
/// previous end instead.
pub fn chunk_with_window(
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
    boundary_window: usize,
) -> Result<Vec<Chunk>> {
    if chunk_size == 0 {
        return Err(Error::InvalidConfig("chunk_size must be positive".to_string()).into());
    }
    if chunk_overlap >= chunk_size {
        return Err(Error::InvalidConfig(format!(
            "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
        ))
        .into());
    }

    if text.chars().count() <= chunk_size {
        return Ok(vec![Chunk { text: text.to_string(), start: 0, end: text.len() }]);
    }

    let len = text.len();
    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < len {
        let mut end = advance_chars(text, start, chunk_size);
        if end < len {
            if let Some(snapped) = snap_to_boundary(text, start, end, boundary_window) {
                end = snapped;
            }
        }

        let piece = text[start..end].trim();
        if !piece.is_empty() {
            chunks.push(Chunk { text: piece.to_string(), start, end });
        }

        start = if end < len {
            let back = retreat_chars(text, end, chunk_overlap);
            // A short snapped window could otherwise rewind past its
            // own start and loop forever.
            if back > start {
                back
            } else {
                end
            }
        } else {
            end
        };
    }

    Ok(chunks)
}

/// Byte offset `count` characters after `from`, clamped to the end.
fn advance_chars(text: &str, from: usize, count: usize) -> usize {
    text[from..]
        .char_indices()
        .nth(count)
        .map_or(text.len(), |(i, _)| from + i)
}

/// Byte offset `count` characters before `to`, clamped to 0.
fn retreat_chars(text: &str, to: usize, count: usize) -> usize {
    if count == 0 {
        return to;
    }
    text[..to]
        .char_indices()
        .rev()
        .nth(count - 1)
        .map_or(0, |(i, _)| i)
}

/// Scan backwards from the candidate cut for a boundary character and
/// return the offset just past it. The scan covers the character at
/// `end` and at most `window` characters before it, never reaching back
/// to `start` itself.
fn snap_to_boundary(text: &str, start: usize, end: usize, window: usize) -> Option<usize> {
    if let Some(c) = text[end..].chars().next() {
        if BOUNDARY_CHARS.contains(&c) {
            return Some(end + c.len_utf8());
        }
    }
    let lower = retreat_chars(text, end, window).max(start);
    for (off, c) in text[lower..end].char_indices().rev() {
        if off == 0 {
            break;
        }
        if BOUNDARY_CHARS.contains(&c) {
            return Some(lower + off + c.len_utf8());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_untrimmed_chunk() {
        let text = "  The cat sat. The dog ran.  ";
        let chunks = chunk(text, 500, 50).expect("chunk");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
        assert_eq!(chunks[0].start, 0);
        assert_eq!(chunks[0].end, text.len());
    }

    #[test]
    fn overlap_must_be_smaller_than_size() {
        assert!(chunk("anything at all", 50, 50).is_err());
        assert!(chunk("anything at all", 50, 80).is_err());
        assert!(chunk("anything at all", 0, 0).is_err());
    }

    #[test]
    fn cuts_prefer_sentence_boundaries() {
        let sentence = "All systems remain nominal today. ";
        let text = sentence.repeat(10);
        let chunks = chunk(&text, 100, 10).expect("chunk");
        assert!(chunks.len() > 1);
        // Every non-final cut lands just after a full stop.
        for c in &chunks[..chunks.len() - 1] {
            assert!(c.text.ends_with('.'), "chunk ends with {:?}", c.text.chars().last());
        }
    }

    #[test]
    fn covers_the_whole_text_and_terminates() {
        let text = "abcdefghij".repeat(100);
        let chunks = chunk(&text, 80, 20).expect("chunk");
        assert!(!chunks.is_empty());
        assert_eq!(chunks[0].start, 0);
        assert_eq!(chunks.last().map(|c| c.end), Some(text.len()));
        for pair in chunks.windows(2) {
            assert!(pair[1].start > pair[0].start, "windows advance");
            assert!(pair[1].start < pair[0].end, "consecutive windows overlap");
        }
        for c in &chunks {
            assert!(c.start < c.end);
            assert!(c.end <= text.len());
        }
    }

    #[test]
    fn whitespace_windows_are_dropped() {
        let mut text = "A sentence before a long gap.".to_string();
        text.push_str(&" ".repeat(120));
        text.push_str("And one after it, far away from the first.");
        let chunks = chunk(&text, 60, 10).expect("chunk");
        for c in &chunks {
            assert!(!c.text.trim().is_empty());
        }
    }

    #[test]
    fn cjk_boundaries_do_not_split_codepoints() {
        let text = "这是第一句话。这是第二句话。这是第三句话！".repeat(8);
        let chunks = chunk(&text, 20, 4).expect("chunk");
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(text.is_char_boundary(c.start));
            assert!(text.is_char_boundary(c.end));
        }
    }

    #[test]
    fn output_is_deterministic() {
        let text = "One. Two! Three? Four.\nFive.".repeat(20);
        let a = chunk(&text, 50, 10).expect("chunk");
        let b = chunk(&text, 50, 10).expect("chunk");
        assert_eq!(a, b);
    }

    #[test]
    fn hard_cut_when_no_boundary_in_window() {
        let text = "x".repeat(500);
        let chunks = chunk(&text, 100, 0).expect("chunk");
        assert_eq!(chunks.len(), 5);
        for c in &chunks {
            assert_eq!(c.text.len(), 100);
        }
    }
}
