// Configuration for the relay server

use std::time::Duration;

use tts_core::{SynthesisRequest, DEFAULT_MODEL_ID, DEFAULT_OUTPUT_FORMAT, DEFAULT_VOICE_ID};

/// Local frontend dev servers allowed by default.
pub const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://127.0.0.1:5173"];

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    /// Upper bound on the completion call. `None` waits indefinitely.
    pub llm_timeout_secs: Option<u64>,
    pub voice_id: String,
    pub model_id: String,
    pub output_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            cors_allowed_origins: DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
            llm_timeout_secs: None,
            voice_id: DEFAULT_VOICE_ID.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.port);

        let llm_timeout_secs = std::env::var("LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|secs: &u64| *secs > 0);

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .ok()
            .map(|origins| parse_origins(&origins))
            .filter(|origins| !origins.is_empty())
            .unwrap_or(defaults.cors_allowed_origins);

        Self {
            port,
            cors_allowed_origins,
            llm_timeout_secs,
            voice_id: env_or("ELEVENLABS_VOICE_ID", defaults.voice_id),
            model_id: env_or("ELEVENLABS_MODEL_ID", defaults.model_id),
            output_format: env_or("ELEVENLABS_OUTPUT_FORMAT", defaults.output_format),
        }
    }

    pub fn llm_timeout(&self) -> Option<Duration> {
        self.llm_timeout_secs.map(Duration::from_secs)
    }

    /// Synthesis request for `text` with the configured voice, model and format.
    pub fn synthesis_request(&self, text: impl Into<String>) -> SynthesisRequest {
        SynthesisRequest {
            text: text.into(),
            voice_id: self.voice_id.clone(),
            model_id: self.model_id.clone(),
            output_format: self.output_format.clone(),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
