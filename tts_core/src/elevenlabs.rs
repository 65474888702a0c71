use std::env;

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;

use crate::{AudioStream, SynthesisRequest, SynthesisService};

const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io/v1";

#[derive(Serialize)]
struct TtsBody<'a> {
    text: &'a str,
    model_id: &'a str,
}

/// Streaming client for the ElevenLabs text-to-speech API.
pub struct ElevenLabsClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ElevenLabsClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Create a client from `ELEVENLABS_API_KEY` and `ELEVENLABS_BASE_URL`.
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = env::var("ELEVENLABS_API_KEY")
            .context("ELEVENLABS_API_KEY must be set in the environment")?;
        let client = Self::new(api_key);
        Ok(match env::var("ELEVENLABS_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => client.with_base_url(url),
            _ => client,
        })
    }

    fn stream_url(&self, voice_id: &str) -> String {
        format!("{}/text-to-speech/{}/stream", self.base_url, voice_id)
    }
}

#[async_trait]
impl SynthesisService for ElevenLabsClient {
    async fn synthesize(&self, request: &SynthesisRequest) -> anyhow::Result<AudioStream> {
        let body = TtsBody {
            text: &request.text,
            model_id: &request.model_id,
        };

        let response = self
            .client
            .post(self.stream_url(&request.voice_id))
            .query(&[("output_format", request.output_format.as_str())])
            .header("xi-api-key", &self.api_key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&body)
            .send()
            .await
            .context("ElevenLabs request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("ElevenLabs returned HTTP {status}: {body}");
        }

        tracing::debug!(
            voice_id = %request.voice_id,
            model_id = %request.model_id,
            "synthesis stream opened"
        );
        Ok(AudioStream::from_response(response))
    }
}
