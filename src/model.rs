//! Timed karaoke track data model and boundary validation.
//!
//! Generated track data enters the system exactly once — from the upstream
//! generator or a direct JSON upload — and is parsed into these types and
//! validated here. Everything downstream (render, shift, export) trusts the
//! model and never re-derives structure.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// One sung token with its audible interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    /// Token text as sung, including any punctuation.
    pub word: String,
    /// Start of the audible interval in milliseconds.
    pub start_time_ms: i64,
    /// End of the audible interval in milliseconds.
    pub end_time_ms: i64,
}

/// Segment payload kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SegmentKind {
    /// Sung lyric text, optionally with word-level timing.
    Lyric,
    /// Non-lyric passage described by a cue.
    Instrumental,
}

/// A contiguous interval of the song: a sung line or an instrumental passage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    #[serde(rename = "type")]
    pub kind: SegmentKind,
    pub start_time_ms: i64,
    pub end_time_ms: i64,
    /// Stable ordinal assigned at creation; used for keying only, never
    /// recomputed.
    pub segment_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cue_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<Word>>,
}

/// Song-level metadata attached to each per-language track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub duration_ms: i64,
    /// Language tag, for example `es-ES`.
    pub language: String,
    pub version: String,
}

/// Complete per-language timed representation of a song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedTrack {
    pub metadata: TrackMetadata,
    pub segments: Vec<Segment>,
}

/// The two language versions of one song.
///
/// A pair is created atomically when generation completes, replaced as a
/// whole by corrections, and discarded as a whole on delete. It is never
/// mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPair {
    pub source: TimedTrack,
    pub translation: TimedTrack,
}

impl TimedTrack {
    /// Validates the invariants the render and shift paths rely on.
    ///
    /// Rejects segment intervals with `start > end`, word intervals with
    /// `start > end`, and word sequences whose start times decrease. Word
    /// containment within the segment interval is intentionally not enforced;
    /// upstream timing is only loosely contained. Segment overlap is not
    /// checked either — segments are non-overlapping by upstream
    /// construction.
    pub fn validate(&self) -> Result<(), AppError> {
        for segment in &self.segments {
            if segment.start_time_ms > segment.end_time_ms {
                return Err(AppError::invalid_track(format!(
                    "segment {} has startTimeMs {} > endTimeMs {}",
                    segment.segment_index, segment.start_time_ms, segment.end_time_ms
                )));
            }

            let Some(words) = segment.words.as_deref() else {
                continue;
            };

            let mut previous_start = i64::MIN;
            for word in words {
                if word.start_time_ms > word.end_time_ms {
                    return Err(AppError::invalid_track(format!(
                        "segment {} word {:?} has startTimeMs {} > endTimeMs {}",
                        segment.segment_index, word.word, word.start_time_ms, word.end_time_ms
                    )));
                }
                if word.start_time_ms < previous_start {
                    return Err(AppError::invalid_track(format!(
                        "segment {} words are out of time order at {:?}",
                        segment.segment_index, word.word
                    )));
                }
                previous_start = word.start_time_ms;
            }
        }

        Ok(())
    }
}

impl TrackPair {
    /// Validates both tracks of the pair.
    pub fn validate(&self) -> Result<(), AppError> {
        self.source.validate()?;
        self.translation.validate()
    }

    /// Selects the track whose metadata language matches `tag`.
    pub fn track_for_language(&self, tag: &str) -> Option<&TimedTrack> {
        if self.source.metadata.language == tag {
            Some(&self.source)
        } else if self.translation.metadata.language == tag {
            Some(&self.translation)
        } else {
            None
        }
    }

    /// Returns the language tags of both tracks, source first.
    pub fn languages(&self) -> (&str, &str) {
        (
            &self.source.metadata.language,
            &self.translation.metadata.language,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track_with_words(words: Vec<Word>) -> TimedTrack {
        TimedTrack {
            metadata: TrackMetadata {
                title: "Mi Gente".to_string(),
                artist: "J Balvin".to_string(),
                duration_ms: 30_000,
                language: "es-ES".to_string(),
                version: "1.0".to_string(),
            },
            segments: vec![Segment {
                kind: SegmentKind::Lyric,
                start_time_ms: 1_000,
                end_time_ms: 4_000,
                segment_index: 1,
                text: Some("Toda mi gente".to_string()),
                cue_text: None,
                words: Some(words),
            }],
        }
    }

    fn word(word: &str, start: i64, end: i64) -> Word {
        Word {
            word: word.to_string(),
            start_time_ms: start,
            end_time_ms: end,
        }
    }

    #[test]
    fn parses_wire_format() {
        let raw = r#"{
            "metadata": {
                "title": "Mi Gente",
                "artist": "J Balvin, Willy William",
                "durationMs": 28450,
                "language": "es-ES",
                "version": "1.1"
            },
            "segments": [
                {
                    "type": "INSTRUMENTAL",
                    "startTimeMs": 0,
                    "endTimeMs": 8048,
                    "cueText": "Intro",
                    "segmentIndex": 1
                },
                {
                    "type": "LYRIC",
                    "startTimeMs": 8100,
                    "endTimeMs": 11530,
                    "text": "Si el ritmo",
                    "segmentIndex": 2,
                    "words": [
                        { "word": "Si", "startTimeMs": 8178, "endTimeMs": 8418 },
                        { "word": "el", "startTimeMs": 8418, "endTimeMs": 8598 },
                        { "word": "ritmo", "startTimeMs": 8598, "endTimeMs": 9080 }
                    ]
                }
            ]
        }"#;

        let track: TimedTrack = serde_json::from_str(raw).expect("parse track");
        assert_eq!(track.metadata.duration_ms, 28_450);
        assert_eq!(track.segments.len(), 2);
        assert_eq!(track.segments[0].kind, SegmentKind::Instrumental);
        assert_eq!(track.segments[0].cue_text.as_deref(), Some("Intro"));
        assert_eq!(track.segments[1].kind, SegmentKind::Lyric);
        assert_eq!(
            track.segments[1].words.as_deref().map(<[Word]>::len),
            Some(3)
        );
        track.validate().expect("valid track");
    }

    #[test]
    fn serializes_wire_field_names() {
        let track = track_with_words(vec![word("Toda", 1_000, 1_400)]);
        let value = serde_json::to_value(&track).expect("serialize");

        assert_eq!(value["segments"][0]["type"], "LYRIC");
        assert_eq!(value["segments"][0]["startTimeMs"], 1_000);
        assert_eq!(value["segments"][0]["segmentIndex"], 1);
        assert_eq!(value["segments"][0]["words"][0]["startTimeMs"], 1_000);
        // Absent optionals stay off the wire.
        assert!(value["segments"][0].get("cueText").is_none());
    }

    #[test]
    fn validate_rejects_inverted_word_interval() {
        let track = track_with_words(vec![word("Toda", 2_000, 1_000)]);
        let err = track.validate().expect_err("inverted interval");
        assert!(err.to_string().contains("Toda"));
    }

    #[test]
    fn validate_rejects_words_out_of_order() {
        let track = track_with_words(vec![
            word("mi", 2_000, 2_300),
            word("Toda", 1_000, 1_400),
        ]);
        let err = track.validate().expect_err("out of order");
        assert!(err.to_string().contains("out of time order"));
    }

    #[test]
    fn validate_rejects_inverted_segment_interval() {
        let mut track = track_with_words(vec![]);
        track.segments[0].start_time_ms = 5_000;
        track.segments[0].end_time_ms = 4_000;
        assert!(track.validate().is_err());
    }

    #[test]
    fn track_for_language_selects_by_tag() {
        let source = track_with_words(vec![]);
        let mut translation = track_with_words(vec![]);
        translation.metadata.language = "en-US".to_string();

        let pair = TrackPair {
            source,
            translation,
        };
        assert!(pair.track_for_language("es-ES").is_some());
        assert!(pair.track_for_language("en-US").is_some());
        assert!(pair.track_for_language("fr-FR").is_none());
        assert_eq!(pair.languages(), ("es-ES", "en-US"));
    }
}
