//! Generation-service boundary.
//!
//! The HTTP layer depends on the [`Generator`] trait instead of a concrete
//! upstream client, which keeps request handling decoupled from the external
//! service that performs the actual audio-to-lyric alignment.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::model::TrackPair;

pub mod remote;

/// Input payload for one generation call.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Raw uploaded audio bytes, forwarded untouched.
    pub audio_bytes: Vec<u8>,
    /// Validated lowercase file extension, without the leading dot.
    pub audio_extension: String,
    pub title: String,
    pub artist: String,
    /// Language tag of the original lyrics, for example `es-ES`.
    pub source_language: String,
    /// Language tag of the translated lyrics, for example `en-US`.
    pub translation_language: String,
    pub source_lyrics: String,
    pub translation_lyrics: String,
}

/// Contract implemented by timed-track generation services.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produces a validated track pair for the given audio and lyrics.
    async fn generate(&self, req: GenerateRequest) -> Result<TrackPair, AppError>;
}

/// Builds the configured generator, if any.
///
/// Returns `None` when `GENERATOR_URL` is unset; the generate endpoint then
/// reports itself unavailable while the rest of the API keeps working.
pub fn build_generator(cfg: &AppConfig) -> Result<Option<Arc<dyn Generator>>, AppError> {
    match cfg.generator_url.as_deref() {
        Some(url) => Ok(Some(Arc::new(remote::RemoteGenerator::new(url, cfg)?))),
        None => Ok(None),
    }
}
