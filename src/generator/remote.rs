//! HTTP client for a remote track-generation service.
//!
//! The upstream owns prompt construction, model choice, and retries; this
//! client makes one bounded multipart request and validates what comes back
//! before it enters the system.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::generator::{GenerateRequest, Generator};
use crate::model::TrackPair;
use crate::upload::mime_for_extension;

const UPSTREAM_BODY_SNIPPET_CHARS: usize = 512;

/// Generator backed by a remote HTTP generation endpoint.
pub struct RemoteGenerator {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl RemoteGenerator {
    /// Builds a client with the configured per-call timeout.
    pub fn new(endpoint: &str, cfg: &AppConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.generator_timeout_secs as u64))
            .build()
            .map_err(|err| {
                AppError::internal(format!("failed to build generator http client: {err}"))
            })?;

        Ok(Self {
            endpoint: endpoint.to_string(),
            api_key: cfg.generator_api_key.clone(),
            client,
        })
    }
}

#[async_trait]
impl Generator for RemoteGenerator {
    async fn generate(&self, req: GenerateRequest) -> Result<TrackPair, AppError> {
        let file_part = Part::bytes(req.audio_bytes)
            .file_name(format!("audio.{}", req.audio_extension))
            .mime_str(mime_for_extension(&req.audio_extension))
            .map_err(|err| AppError::internal(format!("invalid upload mime type: {err}")))?;

        let form = Form::new()
            .part("file", file_part)
            .text("title", req.title)
            .text("artist", req.artist)
            .text("sourceLanguage", req.source_language)
            .text("translationLanguage", req.translation_language)
            .text("sourceLyrics", req.source_lyrics)
            .text("translationLyrics", req.translation_lyrics);

        let mut request = self.client.post(&self.endpoint).multipart(form);
        if let Some(key) = self.api_key.as_deref() {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|err| AppError::upstream(format!("generation request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "generation service returned an error status");
            return Err(AppError::upstream(format!(
                "generation service returned {status}: {}",
                snippet(&body)
            )));
        }

        let pair = response.json::<TrackPair>().await.map_err(|err| {
            AppError::upstream(format!(
                "generation service returned unparseable track data: {err}"
            ))
        })?;

        // Boundary validation: bad upstream data is an upstream failure, not
        // a client error.
        pair.validate().map_err(|err| {
            AppError::upstream(format!(
                "generation service returned invalid track data: {err}"
            ))
        })?;

        info!(
            title = %pair.source.metadata.title,
            source_language = %pair.source.metadata.language,
            translation_language = %pair.translation.metadata.language,
            segments = pair.source.segments.len(),
            "generation completed"
        );

        Ok(pair)
    }
}

fn snippet(body: &str) -> String {
    body.chars().take(UPSTREAM_BODY_SNIPPET_CHARS).collect()
}
