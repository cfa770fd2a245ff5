//! Turning raw article text into the initial fragment texts.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;
use unicode_segmentation::UnicodeSegmentation;

/// Sentences this short (in chars) are dropped.
pub const MIN_SENTENCE_CHARS: usize = 5;

/// At most this many sentences start falling.
pub const MAX_SENTENCES: usize = 30;

/// Split `text` into trimmed sentences, in input order.
///
/// Boundaries follow the Unicode sentence rules (UAX #29): terminators stay
/// attached to their sentence, line breaks end a sentence, and a period inside
/// a number or before a lowercase word does not.
pub fn segment(text: &str) -> Vec<String> {
    text.split_sentence_bounds()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Segment, drop short sentences and repeats, shuffle, and cap the count.
pub fn prepare_sentences(text: &str, rng: &mut impl Rng) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut sentences: Vec<String> = segment(text)
        .into_iter()
        .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
        .filter(|s| seen.insert(s.clone()))
        .collect();

    sentences.shuffle(rng);
    sentences.truncate(MAX_SENTENCES);
    sentences
}
