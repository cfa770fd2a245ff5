//! Split policy: how a fragment's text divides when it breaks.
//!
//! Characters are counted as Unicode scalar values (`char`s), never bytes, so
//! multi-byte scripts split between characters rather than inside one.

/// Splits the trimmed `text` into two halves at `floor(chars / 2)`.
///
/// Returns `None` when the trimmed text has at most one character. The result is
/// deterministic: the same input always yields the same halves, and
/// `left + right == text.trim()`.
pub fn try_split(text: &str) -> Option<(String, String)> {
    let trimmed = text.trim();
    let count = trimmed.chars().count();
    if count <= 1 {
        return None;
    }

    let mid = count / 2;
    // `mid` is in 1..count, so the byte index always exists.
    let at = trimmed.char_indices().nth(mid).map(|(i, _)| i)?;
    let (left, right) = trimmed.split_at(at);

    if left.is_empty() || right.is_empty() {
        return None;
    }

    Some((left.to_owned(), right.to_owned()))
}

/// True iff the trimmed text is exactly one character. Atomic fragments never split.
pub fn is_atomic(text: &str) -> bool {
    let mut chars = text.trim().chars();
    chars.next().is_some() && chars.next().is_none()
}

/// Character count of the trimmed text.
#[inline]
pub fn char_count(text: &str) -> usize {
    text.trim().chars().count()
}
