//! Word aligner for lyric lines.
//!
//! Maps a line's display text onto its ordered timed-word tokens and
//! classifies per-word highlight state for a playback position. Display text
//! and the word array can diverge (ad-libs, repeated words, punctuation
//! variance); a mismatch degrades that fragment to plain rendering instead of
//! failing or desynchronizing the rest of the line.

use serde::Serialize;

use crate::model::{Segment, Word};

/// Punctuation removed before token comparison. Hyphens are stripped
/// entirely, not replaced with a space.
const STRIPPED_PUNCTUATION: &[char] = &['.', ',', '!', '?', '\'', '"', '¡', '¿', '-'];

/// Highlight state of one rendered fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Highlight {
    /// Whitespace fragments carry no highlight at all.
    None,
    /// Not yet sung, or unmatched against the word array.
    Upcoming,
    /// The playback position is inside the word's interval.
    Active,
    /// The playback position is past the word's interval.
    Sung,
}

/// One renderable piece of a lyric line.
///
/// Concatenating the `text` of every fragment in output order reproduces the
/// input line exactly, whitespace runs included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fragment {
    #[serde(rename = "fragmentText")]
    pub text: String,
    pub is_whitespace: bool,
    pub highlight: Highlight,
}

/// Lower-cases a token and strips the fixed punctuation set.
pub fn normalize_token(raw: &str) -> String {
    raw.chars()
        .filter(|c| !STRIPPED_PUNCTUATION.contains(c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Aligns a lyric line against its timed words for one playback position.
///
/// The line is split on whitespace runs, the runs preserved as their own
/// non-highlightable fragments. A cursor into `words` advances strictly
/// left-to-right, one slot per non-whitespace fragment, and only when the
/// normalized fragment equals the normalized word at the cursor. A
/// non-matching fragment is emitted as upcoming and the cursor stays put, so
/// one skipped or extra token cannot desynchronize the rest of the line.
///
/// Pure function of its inputs; O(len of `text`) per call.
pub fn align_line(text: &str, words: &[Word], current_time_ms: i64) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    let mut cursor = 0usize;

    for run in split_runs(text) {
        if run.chars().all(char::is_whitespace) {
            fragments.push(Fragment {
                text: run.to_string(),
                is_whitespace: true,
                highlight: Highlight::None,
            });
            continue;
        }

        let highlight = match words.get(cursor) {
            Some(word) if normalize_token(run) == normalize_token(&word.word) => {
                cursor += 1;
                classify(word, current_time_ms)
            }
            _ => Highlight::Upcoming,
        };

        fragments.push(Fragment {
            text: run.to_string(),
            is_whitespace: false,
            highlight,
        });
    }

    fragments
}

/// Returns the position of the segment whose interval contains
/// `current_time_ms`, using the same half-open `[start, end)` convention as
/// word highlighting.
pub fn active_segment_index(segments: &[Segment], current_time_ms: i64) -> Option<usize> {
    segments
        .iter()
        .position(|s| current_time_ms >= s.start_time_ms && current_time_ms < s.end_time_ms)
}

fn classify(word: &Word, current_time_ms: i64) -> Highlight {
    if current_time_ms >= word.end_time_ms {
        Highlight::Sung
    } else if current_time_ms >= word.start_time_ms {
        Highlight::Active
    } else {
        Highlight::Upcoming
    }
}

/// Splits text into maximal runs of whitespace and non-whitespace,
/// preserving every byte of the input.
fn split_runs(text: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut start = 0usize;
    let mut current_is_ws: Option<bool> = None;

    for (idx, ch) in text.char_indices() {
        let is_ws = ch.is_whitespace();
        match current_is_ws {
            Some(prev) if prev == is_ws => {}
            Some(_) => {
                runs.push(&text[start..idx]);
                start = idx;
                current_is_ws = Some(is_ws);
            }
            None => current_is_ws = Some(is_ws),
        }
    }

    if !text.is_empty() {
        runs.push(&text[start..]);
    }

    runs
}
