//! Configuration loading from environment variables.
//!
//! Values are intentionally validated early so startup fails fast with
//! actionable errors.

use crate::error::AppError;
use std::env;

pub const DEFAULT_GENERATOR_TIMEOUT_SECS: usize = 300;
pub const MAX_GENERATOR_TIMEOUT_SECS: usize = 3_600;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;
pub const MAX_MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// Runtime configuration for the HTTP server and the generation boundary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host interface to bind, for example `127.0.0.1`.
    pub host: String,
    /// TCP port to bind.
    pub port: u16,
    /// Optional bearer token required by all endpoints.
    pub api_key: Option<String>,
    /// Upstream generation service URL; the generate endpoint is disabled
    /// when unset.
    pub generator_url: Option<String>,
    /// Optional bearer token sent to the generation service.
    pub generator_api_key: Option<String>,
    /// Timeout for one generation call, in seconds.
    pub generator_timeout_secs: usize,
    /// Request body limit, bounding audio uploads.
    pub max_upload_bytes: usize,
}

impl AppConfig {
    /// Builds configuration from environment variables.
    ///
    /// Variables:
    /// - `HOST` (default `127.0.0.1`)
    /// - `PORT` (default `8000`)
    /// - `API_KEY` (optional)
    /// - `GENERATOR_URL` (optional; generation disabled when unset)
    /// - `GENERATOR_API_KEY` (optional)
    /// - `GENERATOR_TIMEOUT_SECS` (default `300`, min `1`, max `3600`)
    /// - `MAX_UPLOAD_BYTES` (default `26214400`, min `1024`, max `536870912`)
    pub fn from_env() -> Result<Self, AppError> {
        let host = env_str("HOST", "127.0.0.1");
        let port = env_u16("PORT", 8000)?;
        let generator_timeout_secs = env_usize_bounded(
            "GENERATOR_TIMEOUT_SECS",
            DEFAULT_GENERATOR_TIMEOUT_SECS,
            1,
            MAX_GENERATOR_TIMEOUT_SECS,
        )?;
        let max_upload_bytes = env_usize_bounded(
            "MAX_UPLOAD_BYTES",
            DEFAULT_MAX_UPLOAD_BYTES,
            1024,
            MAX_MAX_UPLOAD_BYTES,
        )?;

        Ok(Self {
            host,
            port,
            api_key: env_opt("API_KEY"),
            generator_url: env_opt("GENERATOR_URL"),
            generator_api_key: env_opt("GENERATOR_API_KEY"),
            generator_timeout_secs,
            max_upload_bytes,
        })
    }
}

fn env_str(name: &str, default: &str) -> String {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                default.to_string()
            } else {
                trimmed.to_string()
            }
        }
        Err(_) => default.to_string(),
    }
}

fn env_opt(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Err(_) => None,
    }
}

fn env_u16(name: &str, default: u16) -> Result<u16, AppError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    let parsed = raw.trim().parse::<u16>().map_err(|_| {
        AppError::internal(format!("invalid {name}={raw:?}; expected integer 1-65535"))
    })?;
    if parsed == 0 {
        return Err(AppError::internal(format!(
            "invalid {name}={raw:?}; expected > 0"
        )));
    }
    Ok(parsed)
}

fn env_usize_bounded(
    name: &str,
    default: usize,
    min: usize,
    max: usize,
) -> Result<usize, AppError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    parse_usize_bounded(name, &raw, min, max)
}

fn parse_usize_bounded(name: &str, raw: &str, min: usize, max: usize) -> Result<usize, AppError> {
    let trimmed = raw.trim();
    let parsed = trimmed.parse::<usize>().map_err(|_| {
        AppError::internal(format!(
            "invalid {name}={raw:?}; expected integer in range [{min}, {max}]"
        ))
    })?;
    if parsed < min || parsed > max {
        return Err(AppError::internal(format!(
            "invalid {name}={raw:?}; expected integer in range [{min}, {max}]"
        )));
    }
    Ok(parsed)
}
