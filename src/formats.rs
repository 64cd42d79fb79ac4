//! Export renditions of a timed track.

use std::fmt;

use crate::error::AppError;
use crate::model::{Segment, SegmentKind, TimedTrack};

/// Output format accepted by `format` on the export endpoint.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ExportFormat {
    /// The track's JSON wire schema, pretty-printed.
    Json,
    /// One row per segment and per word, RFC-4180 quoting.
    Csv,
    /// LRC line-timestamp lyric format.
    Lrc,
    /// SubRip subtitle format.
    Srt,
    /// WebVTT subtitle format.
    Vtt,
}

impl ExportFormat {
    /// Parses a `format` string used by the HTTP API.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw.trim() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "lrc" => Ok(Self::Lrc),
            "srt" => Ok(Self::Srt),
            "vtt" => Ok(Self::Vtt),
            other => Err(AppError::invalid_request(
                format!("invalid format={other:?}; expected one of json,csv,lrc,srt,vtt"),
                Some("format"),
                Some("invalid_export_format"),
            )),
        }
    }

    /// Content type for the exported body.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json; charset=utf-8",
            Self::Csv => "text/csv; charset=utf-8",
            Self::Lrc => "text/plain; charset=utf-8",
            Self::Srt => "application/x-subrip; charset=utf-8",
            Self::Vtt => "text/vtt; charset=utf-8",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
            Self::Lrc => write!(f, "lrc"),
            Self::Srt => write!(f, "srt"),
            Self::Vtt => write!(f, "vtt"),
        }
    }
}

/// Renders a track in the requested format.
pub fn render_track(track: &TimedTrack, format: ExportFormat) -> Result<String, AppError> {
    match format {
        ExportFormat::Json => track_to_json(track),
        ExportFormat::Csv => Ok(track_to_csv(track)),
        ExportFormat::Lrc => Ok(track_to_lrc(track)),
        ExportFormat::Srt => Ok(track_to_srt(track)),
        ExportFormat::Vtt => Ok(track_to_vtt(track)),
    }
}

/// Serializes the track's wire schema, pretty-printed with a trailing newline.
pub fn track_to_json(track: &TimedTrack) -> Result<String, AppError> {
    let body = serde_json::to_string_pretty(track)
        .map_err(|err| AppError::internal(format!("failed to serialize track: {err}")))?;
    Ok(format!("{body}\n"))
}

/// Converts a track to CSV: one row per segment, then one row per timed word.
pub fn track_to_csv(track: &TimedTrack) -> String {
    let mut lines = vec![
        "segmentIndex,type,startTimeMs,endTimeMs,text,word,wordStartMs,wordEndMs".to_string(),
    ];

    for segment in &track.segments {
        let text = match segment.kind {
            SegmentKind::Lyric => segment.text.as_deref().unwrap_or(""),
            SegmentKind::Instrumental => segment.cue_text.as_deref().unwrap_or(""),
        };
        lines.push(format!(
            "{},{},{},{},{},,,",
            segment.segment_index,
            kind_str(segment.kind),
            segment.start_time_ms,
            segment.end_time_ms,
            escape_csv_cell(text),
        ));

        for word in segment.words.as_deref().unwrap_or(&[]) {
            lines.push(format!(
                "{},{},{},{},,{},{},{}",
                segment.segment_index,
                kind_str(segment.kind),
                segment.start_time_ms,
                segment.end_time_ms,
                escape_csv_cell(&word.word),
                word.start_time_ms,
                word.end_time_ms,
            ));
        }
    }

    format!("{}\n", lines.join("\n"))
}

/// Converts a track to LRC lyric text.
pub fn track_to_lrc(track: &TimedTrack) -> String {
    let mut lines = vec![
        format!("[ti:{}]", track.metadata.title),
        format!("[ar:{}]", track.metadata.artist),
    ];

    for segment in &track.segments {
        let Some(text) = segment_display_text(segment) else {
            continue;
        };
        lines.push(format!(
            "[{}]{}",
            lrc_timestamp(segment.start_time_ms),
            text
        ));
    }

    format!("{}\n", lines.join("\n"))
}

/// Converts a track to SRT subtitle text.
pub fn track_to_srt(track: &TimedTrack) -> String {
    let mut lines = Vec::new();
    let mut cue_number = 0usize;
    for segment in &track.segments {
        let Some(text) = segment_display_text(segment) else {
            continue;
        };
        cue_number += 1;
        lines.push(cue_number.to_string());
        lines.push(format!(
            "{} --> {}",
            srt_timestamp(segment.start_time_ms),
            srt_timestamp(segment.end_time_ms)
        ));
        lines.push(text);
        lines.push(String::new());
    }

    let out = lines.join("\n");
    if out.is_empty() {
        "\n".to_string()
    } else {
        format!("{}\n", out.trim_end())
    }
}

/// Converts a track to WebVTT subtitle text.
pub fn track_to_vtt(track: &TimedTrack) -> String {
    let mut lines = vec!["WEBVTT".to_string(), String::new()];
    for segment in &track.segments {
        let Some(text) = segment_display_text(segment) else {
            continue;
        };
        lines.push(format!(
            "{} --> {}",
            vtt_timestamp(segment.start_time_ms),
            vtt_timestamp(segment.end_time_ms)
        ));
        lines.push(text);
        lines.push(String::new());
    }

    format!("{}\n", lines.join("\n").trim_end())
}

/// Display line for text renditions: the lyric text, or the decorated cue.
fn segment_display_text(segment: &Segment) -> Option<String> {
    match segment.kind {
        SegmentKind::Lyric => segment
            .text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(ToOwned::to_owned),
        SegmentKind::Instrumental => segment
            .cue_text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|cue| format!("♪ {cue} ♪")),
    }
}

fn kind_str(kind: SegmentKind) -> &'static str {
    match kind {
        SegmentKind::Lyric => "LYRIC",
        SegmentKind::Instrumental => "INSTRUMENTAL",
    }
}

/// Quotes a CSV cell when it contains a comma, quote, or line break.
fn escape_csv_cell(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') || cell.contains('\r') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

fn srt_timestamp(time_ms: i64) -> String {
    let ms = clamp_ms(time_ms);
    let h = ms / 3_600_000;
    let m = (ms % 3_600_000) / 60_000;
    let s = (ms % 60_000) / 1_000;
    let frac = ms % 1_000;
    format!("{h:02}:{m:02}:{s:02},{frac:03}")
}

fn vtt_timestamp(time_ms: i64) -> String {
    let ms = clamp_ms(time_ms);
    let h = ms / 3_600_000;
    let m = (ms % 3_600_000) / 60_000;
    let s = (ms % 60_000) / 1_000;
    let frac = ms % 1_000;
    format!("{h:02}:{m:02}:{s:02}.{frac:03}")
}

fn lrc_timestamp(time_ms: i64) -> String {
    let ms = clamp_ms(time_ms);
    let m = ms / 60_000;
    let s = (ms % 60_000) / 1_000;
    let centis = (ms % 1_000) / 10;
    format!("{m:02}:{s:02}.{centis:02}")
}

// Unclamped shifts can push timestamps below zero; text renditions floor at 0.
fn clamp_ms(time_ms: i64) -> i64 {
    time_ms.max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TrackMetadata, Word};

    fn sample_track() -> TimedTrack {
        TimedTrack {
            metadata: TrackMetadata {
                title: "Mi Gente".to_string(),
                artist: "J Balvin, Willy William".to_string(),
                duration_ms: 70_000,
                language: "es-ES".to_string(),
                version: "1.1".to_string(),
            },
            segments: vec![
                Segment {
                    kind: SegmentKind::Instrumental,
                    start_time_ms: 0,
                    end_time_ms: 8_000,
                    segment_index: 1,
                    text: None,
                    cue_text: Some("Intro".to_string()),
                    words: None,
                },
                Segment {
                    kind: SegmentKind::Lyric,
                    start_time_ms: 61_505,
                    end_time_ms: 64_000,
                    segment_index: 2,
                    text: Some("Toda mi gente, se mueve".to_string()),
                    cue_text: None,
                    words: Some(vec![
                        Word {
                            word: "Toda".to_string(),
                            start_time_ms: 61_505,
                            end_time_ms: 61_900,
                        },
                        Word {
                            word: "mi".to_string(),
                            start_time_ms: 61_900,
                            end_time_ms: 62_150,
                        },
                    ]),
                },
            ],
        }
    }

    #[test]
    fn export_format_parse() {
        assert!(matches!(ExportFormat::parse("csv"), Ok(ExportFormat::Csv)));
        assert!(matches!(ExportFormat::parse("lrc"), Ok(ExportFormat::Lrc)));
        assert!(ExportFormat::parse("xml").is_err());
    }

    #[test]
    fn csv_quotes_cells_with_commas() {
        let csv = track_to_csv(&sample_track());
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("segmentIndex,type,startTimeMs,endTimeMs,text,word,wordStartMs,wordEndMs")
        );
        assert_eq!(lines.next(), Some("1,INSTRUMENTAL,0,8000,Intro,,,"));
        assert_eq!(
            lines.next(),
            Some("2,LYRIC,61505,64000,\"Toda mi gente, se mueve\",,,")
        );
        assert_eq!(
            lines.next(),
            Some("2,LYRIC,61505,64000,,Toda,61505,61900")
        );
    }

    #[test]
    fn escape_csv_cell_doubles_quotes() {
        assert_eq!(escape_csv_cell("plain"), "plain");
        assert_eq!(escape_csv_cell("a,b"), "\"a,b\"");
        assert_eq!(escape_csv_cell("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn lrc_lines_carry_centisecond_timestamps() {
        let lrc = track_to_lrc(&sample_track());
        assert!(lrc.starts_with("[ti:Mi Gente]\n[ar:J Balvin, Willy William]\n"));
        assert!(lrc.contains("[00:00.00]♪ Intro ♪"));
        assert!(lrc.contains("[01:01.50]Toda mi gente, se mueve"));
    }

    #[test]
    fn srt_numbers_cues_sequentially() {
        let srt = track_to_srt(&sample_track());
        assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:08,000\n♪ Intro ♪\n"));
        assert!(srt.contains("\n2\n00:01:01,505 --> 00:01:04,000\nToda mi gente, se mueve"));
    }

    #[test]
    fn vtt_starts_with_header() {
        let vtt = track_to_vtt(&sample_track());
        assert!(vtt.starts_with("WEBVTT\n\n"));
        assert!(vtt.contains("00:01:01.505 --> 00:01:04.000"));
    }

    #[test]
    fn negative_timestamps_floor_at_zero() {
        let mut track = sample_track();
        track.segments[0].start_time_ms = -250;
        let srt = track_to_srt(&track);
        assert!(srt.contains("00:00:00,000 --> 00:00:08,000"));
    }

    #[test]
    fn json_round_trips_through_serde() {
        let track = sample_track();
        let body = track_to_json(&track).expect("serialize");
        let parsed: TimedTrack = serde_json::from_str(&body).expect("parse back");
        assert_eq!(parsed, track);
    }
}
