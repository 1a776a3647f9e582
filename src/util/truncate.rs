//! Text truncation that never splits a UTF-8 character.

/// Cut `s` to at most `max_bytes` bytes on a char boundary.
pub fn truncate_utf8(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut cutoff = max_bytes;
    while cutoff > 0 && !s.is_char_boundary(cutoff) {
        cutoff -= 1;
    }
    &s[..cutoff]
}

/// Cut `s` to at most `max_chars` characters.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Cut `s` to `max_chars` characters, appending a note with the omitted count.
pub fn truncate_with_marker(s: &str, max_chars: usize) -> String {
    let kept = truncate_chars(s, max_chars);
    if kept.len() == s.len() {
        return s.to_string();
    }
    let omitted = s[kept.len()..].chars().count();
    format!("{kept}\n... (truncated, {omitted} more characters)")
}
