//! HTTP API surface for karaoke track generation, correction, and export.
//!
//! This module owns request parsing, authentication, and input validation
//! while delegating generation to the configured [`Generator`] and the
//! timing work to the `align` and `shift` modules.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::align::{self, Fragment};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::formats::{self, ExportFormat};
use crate::generator::{GenerateRequest, Generator};
use crate::model::{SegmentKind, TimedTrack, TrackPair};
use crate::shift;
use crate::store::TrackStore;
use crate::upload::validate_extension;

/// Human-readable service name returned by health endpoints.
pub const APP_NAME: &str = "karaoke-sync-server";
/// Service version string returned by health endpoints.
pub const APP_VERSION: &str = "0.1.0";

/// Shared state injected into all route handlers.
pub struct AppState {
    /// Runtime configuration loaded at startup.
    pub cfg: AppConfig,
    /// Generation boundary; `None` when no upstream is configured.
    pub generator: Option<Arc<dyn Generator>>,
    /// In-memory track snapshots.
    pub store: TrackStore,
}

impl AppState {
    /// Constructs shared handler state.
    pub fn new(cfg: AppConfig, generator: Option<Arc<dyn Generator>>) -> Self {
        Self {
            cfg,
            generator,
            store: TrackStore::new(),
        }
    }
}

/// Builds the Axum router for all public endpoints.
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.cfg.max_upload_bytes;
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/v1", get(v1))
        .route("/v1/generate", post(generate))
        .route("/v1/tracks", post(create_track))
        .route("/v1/tracks/:id", get(get_track).delete(delete_track))
        .route("/v1/tracks/:id/render", get(render_track))
        .route("/v1/tracks/:id/shift", post(shift_track))
        .route("/v1/tracks/:id/export", get(export_track))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Root status endpoint (`GET /`).
pub async fn root(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    require_auth(&state.cfg, &headers)?;
    Ok(Json(json!({
        "status": "ok",
        "name": APP_NAME,
        "version": APP_VERSION,
        "generator": state.generator.is_some(),
    })))
}

/// Alias status endpoint (`GET /health`).
pub async fn health(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    root(State(state), headers).await
}

/// API root status endpoint (`GET /v1`).
pub async fn v1(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    root(State(state), headers).await
}

/// Runs generation for an uploaded song (`POST /v1/generate`).
///
/// Multipart fields: `file` (audio), `sourceLyrics`, `translationLyrics`,
/// and optionally `title`, `artist`, `sourceLanguage`, `translationLanguage`.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, AppError> {
    require_auth(&state.cfg, &headers)?;

    let Some(generator) = state.generator.clone() else {
        return Err(AppError::unavailable(
            "no generation service configured; set GENERATOR_URL",
        ));
    };

    let form = parse_generate_form(&mut multipart).await?;
    let request = GenerateRequest {
        audio_bytes: form.bytes,
        audio_extension: form.extension,
        title: form.title,
        artist: form.artist,
        source_language: form.source_language,
        translation_language: form.translation_language,
        source_lyrics: form.source_lyrics,
        translation_lyrics: form.translation_lyrics,
    };

    let pair = generator.generate(request).await?;
    let id = state.store.insert(pair.clone())?;

    Ok(Json(json!({"id": id, "pair": pair})))
}

/// Stores an already-generated track pair (`POST /v1/tracks`).
pub async fn create_track(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    require_auth(&state.cfg, &headers)?;

    let pair: TrackPair = parse_json_body(&body)?;
    pair.validate()?;
    let (source, translation) = pair.languages();
    let languages = json!([source, translation]);
    let id = state.store.insert(pair)?;

    Ok(Json(json!({"id": id, "languages": languages})))
}

/// Fetches a stored pair (`GET /v1/tracks/{id}`).
pub async fn get_track(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<TrackPair>, AppError> {
    require_auth(&state.cfg, &headers)?;
    let pair = state.store.get(id)?.ok_or_else(|| missing_pair(id))?;
    Ok(Json(pair))
}

/// Discards a stored pair, both tracks together (`DELETE /v1/tracks/{id}`).
pub async fn delete_track(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_auth(&state.cfg, &headers)?;
    if !state.store.remove(id)? {
        return Err(missing_pair(id));
    }
    Ok(Json(json!({"status": "deleted", "id": id})))
}

/// Line-level render state for one playback position.
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum LineState {
    Past,
    Active,
    Upcoming,
}

/// One renderable line of the track.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderedLine {
    segment_index: u32,
    #[serde(rename = "type")]
    kind: SegmentKind,
    state: LineState,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cue_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fragments: Option<Vec<Fragment>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderResponse {
    language: String,
    time_ms: i64,
    /// Position of the active segment in `segments` — the same index space
    /// `anchorIndex` uses, not the `segmentIndex` ordinal.
    active_index: Option<usize>,
    lines: Vec<RenderedLine>,
}

/// Renders highlight state for every line (`GET /v1/tracks/{id}/render`).
///
/// The active lyric line carries per-word fragments; every other line is
/// reported as plain text (or cue text) with a past/active/upcoming state.
pub async fn render_track(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<RenderResponse>, AppError> {
    require_auth(&state.cfg, &headers)?;

    let language = require_param(&params, "language")?.to_string();
    let time_ms = parse_time_ms(require_param(&params, "timeMs")?)?;

    let pair = state.store.get(id)?.ok_or_else(|| missing_pair(id))?;
    let track = pair
        .track_for_language(&language)
        .ok_or_else(|| unknown_language(&pair, &language))?;

    let active_index = align::active_segment_index(&track.segments, time_ms);
    let lines = track
        .segments
        .iter()
        .enumerate()
        .map(|(position, segment)| {
            let line_state = match active_index {
                Some(active) if position == active => LineState::Active,
                Some(active) if position < active => LineState::Past,
                _ => LineState::Upcoming,
            };
            let is_active = matches!(line_state, LineState::Active);

            let mut line = RenderedLine {
                segment_index: segment.segment_index,
                kind: segment.kind,
                state: line_state,
                text: None,
                cue_text: None,
                fragments: None,
            };
            match segment.kind {
                SegmentKind::Instrumental => line.cue_text = segment.cue_text.clone(),
                SegmentKind::Lyric => {
                    let words = segment.words.as_deref().unwrap_or(&[]);
                    match segment.text.as_deref() {
                        Some(text) if is_active && !words.is_empty() => {
                            line.fragments = Some(align::align_line(text, words, time_ms));
                        }
                        other => line.text = other.map(ToOwned::to_owned),
                    }
                }
            }
            line
        })
        .collect();

    Ok(Json(RenderResponse {
        language,
        time_ms,
        active_index,
        lines,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShiftRequest {
    /// Position in `segments` from which the delta applies.
    anchor_index: usize,
    delta_ms: i64,
    #[serde(default)]
    language: Option<String>,
    /// Shift both tracks symmetrically instead of selecting one by language.
    #[serde(default)]
    lock_step: bool,
}

/// Applies an anchored timing correction (`POST /v1/tracks/{id}/shift`).
///
/// On success the stored snapshot is replaced atomically and the updated
/// pair returned.
pub async fn shift_track(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    require_auth(&state.cfg, &headers)?;

    let req: ShiftRequest = parse_json_body(&body)?;
    let pair = state.store.get(id)?.ok_or_else(|| missing_pair(id))?;

    let updated = if req.lock_step {
        validate_anchor(&pair.source, req.anchor_index)?;
        validate_anchor(&pair.translation, req.anchor_index)?;
        shift::shift_pair(&pair, req.anchor_index, req.delta_ms)
    } else {
        let language = req
            .language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .ok_or_else(|| {
                AppError::invalid_request(
                    "language is required when lockStep is false",
                    Some("language"),
                    None,
                )
            })?;

        if pair.source.metadata.language == language {
            validate_anchor(&pair.source, req.anchor_index)?;
            TrackPair {
                source: shift::shift_from(&pair.source, req.anchor_index, req.delta_ms),
                translation: pair.translation.clone(),
            }
        } else if pair.translation.metadata.language == language {
            validate_anchor(&pair.translation, req.anchor_index)?;
            TrackPair {
                source: pair.source.clone(),
                translation: shift::shift_from(&pair.translation, req.anchor_index, req.delta_ms),
            }
        } else {
            return Err(unknown_language(&pair, language));
        }
    };

    if !state.store.replace(id, updated.clone())? {
        return Err(missing_pair(id));
    }

    Ok(Json(json!({"id": id, "pair": updated})))
}

/// Exports one track in an interchange format (`GET /v1/tracks/{id}/export`).
pub async fn export_track(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, AppError> {
    require_auth(&state.cfg, &headers)?;

    let language = require_param(&params, "language")?;
    let format = ExportFormat::parse(require_param(&params, "format")?)?;

    let pair = state.store.get(id)?.ok_or_else(|| missing_pair(id))?;
    let track = pair
        .track_for_language(language)
        .ok_or_else(|| unknown_language(&pair, language))?;

    let body = formats::render_track(track, format)?;
    let response_headers = [
        (header::CONTENT_TYPE, format.content_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{language}.{format}\""),
        ),
    ];
    Ok((response_headers, body).into_response())
}

struct GenerateForm {
    extension: String,
    bytes: Vec<u8>,
    title: String,
    artist: String,
    source_language: String,
    translation_language: String,
    source_lyrics: String,
    translation_lyrics: String,
}

/// Parses and validates multipart form fields for the generate endpoint.
async fn parse_generate_form(multipart: &mut Multipart) -> Result<GenerateForm, AppError> {
    let mut file_name: Option<String> = None;
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut title = String::new();
    let mut artist = String::new();
    let mut source_language = "es-ES".to_string();
    let mut translation_language = "en-US".to_string();
    let mut source_lyrics = String::new();
    let mut translation_lyrics = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_multipart(format!("invalid multipart body: {err}")))?
    {
        let Some(name) = field.name().map(ToOwned::to_owned) else {
            continue;
        };

        match name.as_str() {
            "file" => {
                let filename = field
                    .file_name()
                    .map(ToOwned::to_owned)
                    .ok_or_else(|| AppError::bad_multipart("file field is missing filename"))?;
                let bytes = field.bytes().await.map_err(|err| {
                    AppError::bad_multipart(format!("failed to read file bytes: {err}"))
                })?;
                file_name = Some(filename);
                file_bytes = Some(bytes.to_vec());
            }
            "title" => title = text_field(field, "title").await?,
            "artist" => artist = text_field(field, "artist").await?,
            "sourceLanguage" => {
                let value = text_field(field, "sourceLanguage").await?;
                if !value.is_empty() {
                    source_language = value;
                }
            }
            "translationLanguage" => {
                let value = text_field(field, "translationLanguage").await?;
                if !value.is_empty() {
                    translation_language = value;
                }
            }
            "sourceLyrics" => source_lyrics = text_field(field, "sourceLyrics").await?,
            "translationLyrics" => {
                translation_lyrics = text_field(field, "translationLyrics").await?;
            }
            _ => {}
        }
    }

    let filename = file_name.ok_or_else(|| {
        AppError::invalid_request("missing required multipart field: file", Some("file"), None)
    })?;
    let extension = validate_extension(&filename)?;
    let bytes = file_bytes
        .ok_or_else(|| AppError::invalid_request("missing file content", Some("file"), None))?;
    if bytes.is_empty() {
        return Err(AppError::invalid_request(
            "uploaded file is empty",
            Some("file"),
            Some("empty_file"),
        ));
    }

    if source_lyrics.trim().is_empty() {
        return Err(AppError::invalid_request(
            "missing required multipart field: sourceLyrics",
            Some("sourceLyrics"),
            None,
        ));
    }
    if translation_lyrics.trim().is_empty() {
        return Err(AppError::invalid_request(
            "missing required multipart field: translationLyrics",
            Some("translationLyrics"),
            None,
        ));
    }

    Ok(GenerateForm {
        extension,
        bytes,
        title,
        artist,
        source_language,
        translation_language,
        source_lyrics,
        translation_lyrics,
    })
}

async fn text_field(field: axum::extract::multipart::Field<'_>, name: &str) -> Result<String, AppError> {
    Ok(field
        .text()
        .await
        .map_err(|err| AppError::bad_multipart(format!("invalid {name} field: {err}")))?
        .trim()
        .to_string())
}

fn parse_json_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|err| {
        AppError::invalid_request(
            format!("invalid JSON body: {err}"),
            Some("body"),
            Some("invalid_json"),
        )
    })
}

fn require_param<'a>(
    params: &'a HashMap<String, String>,
    name: &str,
) -> Result<&'a str, AppError> {
    params
        .get(name)
        .map(String::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            AppError::invalid_request(
                format!("missing required query parameter: {name}"),
                Some(name),
                None,
            )
        })
}

fn parse_time_ms(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>().map_err(|_| {
        AppError::invalid_request(
            format!("invalid timeMs={raw:?}; expected integer milliseconds"),
            Some("timeMs"),
            Some("invalid_time"),
        )
    })
}

fn missing_pair(id: u64) -> AppError {
    AppError::not_found(format!("no track pair with id {id}"))
}

fn unknown_language(pair: &TrackPair, requested: &str) -> AppError {
    let (source, translation) = pair.languages();
    AppError::invalid_request(
        format!("no track with language={requested:?}; available: {source}, {translation}"),
        Some("language"),
        Some("unknown_language"),
    )
}

fn validate_anchor(track: &TimedTrack, anchor_index: usize) -> Result<(), AppError> {
    if anchor_index >= track.segments.len() {
        return Err(AppError::invalid_request(
            format!(
                "anchorIndex {anchor_index} out of range for track {:?} with {} segments",
                track.metadata.language,
                track.segments.len()
            ),
            Some("anchorIndex"),
            Some("invalid_anchor"),
        ));
    }
    Ok(())
}

/// Enforces optional bearer-token authentication.
fn require_auth(cfg: &AppConfig, headers: &HeaderMap) -> Result<(), AppError> {
    let Some(expected_api_key) = cfg.api_key.as_deref() else {
        return Ok(());
    };

    let Some(raw) = headers.get(header::AUTHORIZATION) else {
        return Err(AppError::unauthorized("missing bearer token"));
    };

    let value = raw
        .to_str()
        .map_err(|_| AppError::unauthorized("invalid authorization header"))?;

    let mut parts = value.split_whitespace();
    let scheme = parts
        .next()
        .ok_or_else(|| AppError::unauthorized("missing bearer token"))?;
    let token = parts
        .next()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::unauthorized("missing bearer token"))?;
    if parts.next().is_some() || !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AppError::unauthorized("missing bearer token"));
    }

    if token != expected_api_key {
        return Err(AppError::unauthorized("invalid token"));
    }

    Ok(())
}
