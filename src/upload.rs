//! Upload validation for the generation endpoint.
//!
//! Files are validated by extension only; decoding and timing analysis
//! belong to the upstream generation service.

use crate::error::AppError;

/// File extensions accepted by upload validation.
pub const SUPPORTED_EXTENSIONS: &[&str] =
    &["mp3", "wav", "ogg", "flac", "m4a", "aac", "opus", "webm"];

/// Validates and normalizes the file extension from an uploaded filename.
///
/// Returns the lowercased extension without the leading dot.
pub fn validate_extension(filename: &str) -> Result<String, AppError> {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.trim().to_ascii_lowercase())
        .ok_or_else(|| {
            AppError::unsupported_media_type(
                "file must include an extension; accepted extensions: .mp3,.wav,.ogg,.flac,.m4a,.aac,.opus,.webm",
            )
        })?;

    if !SUPPORTED_EXTENSIONS.iter().any(|ext| *ext == extension) {
        return Err(AppError::unsupported_media_type(format!(
            "unsupported file extension .{extension}; accepted extensions: .mp3,.wav,.ogg,.flac,.m4a,.aac,.opus,.webm"
        )));
    }

    Ok(extension)
}

/// MIME type forwarded to the generation service for an accepted extension.
pub fn mime_for_extension(extension: &str) -> &'static str {
    match extension {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "opus" => "audio/opus",
        "webm" => "audio/webm",
        _ => "application/octet-stream",
    }
}
