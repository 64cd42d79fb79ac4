//! Anchored timing correction over immutable track snapshots.
//!
//! A correction picks an anchor segment and a signed millisecond delta;
//! everything at or after the anchor moves by the delta, everything before it
//! is already correct and stays untouched. Each call consumes a full snapshot
//! and produces a new one, so chained corrections compose:
//! `shift_from(shift_from(t, a, d1), a, d2)` equals `shift_from(t, a, d1 + d2)`.

use crate::model::{Segment, TimedTrack, TrackPair, Word};

/// Returns a new track with segments at positions `>= anchor_index` shifted
/// by `delta_ms`, words included. Timestamps are not clamped; results may go
/// negative or exceed `metadata.durationMs`.
///
/// # Panics
///
/// Panics when `anchor_index` is not a valid position in `track.segments`.
/// That is a caller bug, not a recoverable state; the HTTP layer validates
/// client-supplied anchors before calling.
pub fn shift_from(track: &TimedTrack, anchor_index: usize, delta_ms: i64) -> TimedTrack {
    assert!(
        anchor_index < track.segments.len(),
        "anchor index {anchor_index} out of range for track with {} segments",
        track.segments.len()
    );

    let segments = track
        .segments
        .iter()
        .enumerate()
        .map(|(position, segment)| {
            if position < anchor_index {
                segment.clone()
            } else {
                shift_segment(segment, delta_ms)
            }
        })
        .collect();

    TimedTrack {
        metadata: track.metadata.clone(),
        segments,
    }
}

/// Shifts both tracks of a pair from the same anchor, keeping them in
/// lock-step during human correction.
///
/// # Panics
///
/// Panics when `anchor_index` is out of range for either track.
pub fn shift_pair(pair: &TrackPair, anchor_index: usize, delta_ms: i64) -> TrackPair {
    TrackPair {
        source: shift_from(&pair.source, anchor_index, delta_ms),
        translation: shift_from(&pair.translation, anchor_index, delta_ms),
    }
}

fn shift_segment(segment: &Segment, delta_ms: i64) -> Segment {
    Segment {
        start_time_ms: segment.start_time_ms + delta_ms,
        end_time_ms: segment.end_time_ms + delta_ms,
        words: segment
            .words
            .as_deref()
            .map(|words| words.iter().map(|w| shift_word(w, delta_ms)).collect()),
        ..segment.clone()
    }
}

fn shift_word(word: &Word, delta_ms: i64) -> Word {
    Word {
        word: word.word.clone(),
        start_time_ms: word.start_time_ms + delta_ms,
        end_time_ms: word.end_time_ms + delta_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SegmentKind, TrackMetadata};

    fn sample_track() -> TimedTrack {
        let word = |text: &str, start: i64, end: i64| Word {
            word: text.to_string(),
            start_time_ms: start,
            end_time_ms: end,
        };
        let lyric = |index: u32, start: i64, end: i64, text: &str, words: Vec<Word>| Segment {
            kind: SegmentKind::Lyric,
            start_time_ms: start,
            end_time_ms: end,
            segment_index: index,
            text: Some(text.to_string()),
            cue_text: None,
            words: Some(words),
        };

        TimedTrack {
            metadata: TrackMetadata {
                title: "Mi Gente".to_string(),
                artist: "J Balvin".to_string(),
                duration_ms: 30_000,
                language: "es-ES".to_string(),
                version: "1.0".to_string(),
            },
            segments: vec![
                Segment {
                    kind: SegmentKind::Instrumental,
                    start_time_ms: 0,
                    end_time_ms: 4_000,
                    segment_index: 1,
                    text: None,
                    cue_text: Some("Intro".to_string()),
                    words: None,
                },
                lyric(2, 4_000, 7_000, "Toda mi gente", vec![
                    word("Toda", 4_000, 4_400),
                    word("mi", 4_400, 4_700),
                    word("gente", 4_700, 5_400),
                ]),
                lyric(3, 7_000, 10_000, "se mueve", vec![
                    word("se", 7_000, 7_300),
                    word("mueve", 7_300, 8_100),
                ]),
                lyric(4, 10_000, 13_000, "Mira el ritmo", vec![
                    word("Mira", 10_000, 10_500),
                    word("el", 10_500, 10_700),
                    word("ritmo", 10_700, 11_600),
                ]),
                Segment {
                    kind: SegmentKind::Instrumental,
                    start_time_ms: 13_000,
                    end_time_ms: 16_000,
                    segment_index: 5,
                    text: None,
                    cue_text: Some("Outro".to_string()),
                    words: None,
                },
            ],
        }
    }

    #[test]
    fn shift_is_local_to_the_anchor_and_after() {
        let track = sample_track();
        let shifted = shift_from(&track, 2, 500);

        assert_eq!(shifted.segments[0], track.segments[0]);
        assert_eq!(shifted.segments[1], track.segments[1]);

        for position in 2..track.segments.len() {
            let before = &track.segments[position];
            let after = &shifted.segments[position];
            assert_eq!(after.start_time_ms, before.start_time_ms + 500);
            assert_eq!(after.end_time_ms, before.end_time_ms + 500);
            assert_eq!(after.segment_index, before.segment_index);
            assert_eq!(after.text, before.text);
            assert_eq!(after.cue_text, before.cue_text);

            let before_words = before.words.as_deref().unwrap_or(&[]);
            let after_words = after.words.as_deref().unwrap_or(&[]);
            assert_eq!(before_words.len(), after_words.len());
            for (b, a) in before_words.iter().zip(after_words) {
                assert_eq!(a.word, b.word);
                assert_eq!(a.start_time_ms, b.start_time_ms + 500);
                assert_eq!(a.end_time_ms, b.end_time_ms + 500);
            }
        }
    }

    #[test]
    fn opposite_deltas_restore_the_original_exactly() {
        let track = sample_track();
        let restored = shift_from(&shift_from(&track, 2, 300), 2, -300);
        assert_eq!(restored, track);
    }

    #[test]
    fn chained_deltas_compose_additively() {
        let track = sample_track();
        let chained = shift_from(&shift_from(&track, 1, 200), 1, 150);
        let combined = shift_from(&track, 1, 350);
        assert_eq!(chained, combined);
    }

    #[test]
    fn anchor_zero_shifts_every_segment() {
        let track = sample_track();
        let shifted = shift_from(&track, 0, -250);
        for (before, after) in track.segments.iter().zip(&shifted.segments) {
            assert_eq!(after.start_time_ms, before.start_time_ms - 250);
            assert_eq!(after.end_time_ms, before.end_time_ms - 250);
        }
        // No clamping: the intro now starts before zero.
        assert_eq!(shifted.segments[0].start_time_ms, -250);
    }

    #[test]
    fn lock_step_shifts_both_tracks() {
        let source = sample_track();
        let mut translation = sample_track();
        translation.metadata.language = "en-US".to_string();

        let pair = TrackPair {
            source,
            translation,
        };
        let shifted = shift_pair(&pair, 3, 120);

        assert_eq!(shifted.source.segments[2], pair.source.segments[2]);
        assert_eq!(
            shifted.source.segments[3].start_time_ms,
            pair.source.segments[3].start_time_ms + 120
        );
        assert_eq!(
            shifted.translation.segments[3].start_time_ms,
            pair.translation.segments[3].start_time_ms + 120
        );
    }

    #[test]
    #[should_panic(expected = "anchor index 5 out of range")]
    fn out_of_range_anchor_panics() {
        let track = sample_track();
        let _ = shift_from(&track, 5, 100);
    }
}
