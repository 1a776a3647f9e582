//! Sketch edits: partial file bodies with elided unchanged regions.
//!
//! A sketch interleaves literal new lines with marker comments such as
//! `// ... existing code ...` that stand for spans of the original file.
//! Merging is line-anchored: each new chunk's first line is looked up in the
//! original to decide how much to copy before it, and its last line is looked
//! up to skip the region it replaced. Anchors are matched on trimmed text and
//! always searched forward from the cursor, so repeated lines can resync onto
//! the wrong occurrence. When an anchor is missing, everything left in the
//! original is copied.

const MARKER_TEXT: &str = "existing code";

const COMMENT_OPENERS: &[&str] = &["//", "#", "/*", "<!--", "--", ";", "{/*", "%", "'"];

#[derive(Debug, PartialEq)]
enum Chunk<'a> {
    Existing,
    New(Vec<&'a str>),
}

/// Whether a sketch line stands for elided original content.
pub fn is_marker_line(line: &str) -> bool {
    let trimmed = line.trim();
    COMMENT_OPENERS.iter().any(|open| trimmed.starts_with(open))
        && trimmed.to_ascii_lowercase().contains(MARKER_TEXT)
}

/// Whether the sketch elides anything, as opposed to being a whole file.
pub fn has_markers(sketch: &str) -> bool {
    sketch.split('\n').any(is_marker_line)
}

/// Merge a sketch into the existing file content.
///
/// A sketch without markers replaces the file verbatim.
pub fn apply_sketch_edit(existing: &str, sketch: &str) -> String {
    if !has_markers(sketch) {
        return sketch.to_string();
    }

    let original: Vec<&str> = existing.split('\n').collect();
    let chunks = split_chunks(sketch);
    let mut out: Vec<&str> = Vec::with_capacity(original.len() + sketch.len() / 16);
    let mut cursor = 0usize;

    for (i, chunk) in chunks.iter().enumerate() {
        match chunk {
            Chunk::Existing => {
                let Some(Chunk::New(next)) = chunks.get(i + 1) else {
                    continue;
                };
                let anchor = next.first().map(|l| l.trim()).unwrap_or_default();
                let stop = find_forward(&original, cursor, anchor).unwrap_or(original.len());
                out.extend_from_slice(&original[cursor..stop]);
                cursor = stop;
            }
            Chunk::New(lines) => {
                out.extend_from_slice(lines);
                let last = lines.last().map(|l| l.trim()).unwrap_or_default();
                if let Some(found) = find_forward(&original, cursor, last) {
                    cursor = found + 1;
                }
            }
        }
    }

    out.extend_from_slice(&original[cursor..]);
    out.join("\n")
}

fn split_chunks(sketch: &str) -> Vec<Chunk<'_>> {
    let mut chunks = Vec::new();
    let mut pending: Vec<&str> = Vec::new();
    for line in sketch.split('\n') {
        if is_marker_line(line) {
            if !pending.is_empty() {
                chunks.push(Chunk::New(std::mem::take(&mut pending)));
            }
            if chunks.last() != Some(&Chunk::Existing) {
                chunks.push(Chunk::Existing);
            }
        } else {
            pending.push(line);
        }
    }
    if !pending.is_empty() {
        chunks.push(Chunk::New(pending));
    }
    chunks
}

fn find_forward(lines: &[&str], from: usize, needle: &str) -> Option<usize> {
    lines
        .get(from..)?
        .iter()
        .position(|line| line.trim() == needle)
        .map(|offset| from + offset)
}
