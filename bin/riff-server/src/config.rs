//! Server configuration, loaded from environment variables at startup.

use riff_types::generate::DEFAULT_MAX_DURATION;

pub const DEFAULT_MODAL_API_URL: &str = "https://nkjain92--ace-step-v15-web.modal.run";
pub const DEFAULT_XAI_BASE_URL: &str = "https://api.x.ai/v1";
pub const DEFAULT_XAI_MODEL: &str = "grok-4-1-fast-non-reasoning";

/// Runtime configuration for riff-server.
///
/// Every field has a default, so the proxy starts without any environment
/// variables set. Only the lyrics endpoint needs `XAI_API_KEY`.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:3000"`).
    pub bind_address: String,

    /// Base URL of the music inference service.
    pub modal_api_url: String,

    /// Bearer key for the lyrics model; lyrics requests fail without it.
    pub xai_api_key: Option<String>,

    /// OpenAI-compatible base URL of the lyrics model.
    pub xai_base_url: String,

    pub xai_model: String,

    /// Longest track, in seconds, forwarded to the inference service.
    pub max_duration: f64,

    /// Largest accepted upload, in MiB.
    pub max_upload_mb: usize,

    /// Comma-separated list of allowed CORS origins; `None` allows any.
    pub cors_allowed_origins: Option<String>,

    /// Serve Swagger UI and the OpenAPI document.
    pub enable_swagger: bool,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_owned(),
            modal_api_url: DEFAULT_MODAL_API_URL.to_owned(),
            xai_api_key: None,
            xai_base_url: DEFAULT_XAI_BASE_URL.to_owned(),
            xai_model: DEFAULT_XAI_MODEL.to_owned(),
            max_duration: DEFAULT_MAX_DURATION,
            max_upload_mb: 50,
            cors_allowed_origins: None,
            enable_swagger: true,
            log_level: "info".to_owned(),
            log_json: false,
        }
    }
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_address: env_or("RIFF_BIND", &defaults.bind_address),
            modal_api_url: env_or("MODAL_API_URL", &defaults.modal_api_url),
            xai_api_key: env_opt("XAI_API_KEY"),
            xai_base_url: env_or("RIFF_XAI_BASE_URL", &defaults.xai_base_url),
            xai_model: env_or("RIFF_XAI_MODEL", &defaults.xai_model),
            max_duration: parse_env("RIFF_MAX_DURATION", defaults.max_duration),
            max_upload_mb: parse_env("RIFF_MAX_UPLOAD_MB", defaults.max_upload_mb),
            cors_allowed_origins: env_opt("RIFF_CORS_ORIGINS"),
            enable_swagger: flag_env("RIFF_ENABLE_SWAGGER", defaults.enable_swagger),
            log_level: env_or("RIFF_LOG", &defaults.log_level),
            log_json: flag_env("RIFF_LOG_JSON", defaults.log_json),
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn flag_env(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
