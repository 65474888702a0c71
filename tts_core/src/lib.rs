mod elevenlabs;
mod stream;

pub use elevenlabs::ElevenLabsClient;
pub use stream::{AudioStream, StreamState};

use async_trait::async_trait;

pub const DEFAULT_VOICE_ID: &str = "6MoEUz34rbRrmmyxgRm4";
pub const DEFAULT_MODEL_ID: &str = "eleven_flash_v2_5";
/// MPEG audio, 44.1kHz, 128kbps.
pub const DEFAULT_OUTPUT_FORMAT: &str = "mp3_44100_128";

/// What to say and how to voice it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice_id: String,
    pub model_id: String,
    pub output_format: String,
}

impl SynthesisRequest {
    /// Request using the default voice, model and MP3 output format.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice_id: DEFAULT_VOICE_ID.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
        }
    }
}

/// A text-to-speech backend producing audio as a stream of chunks.
///
/// The returned stream is consumed once. Errors that happen before any audio
/// is available (bad credentials, rejected text) are reported by the call
/// itself; errors after that arrive as stream items.
#[async_trait]
pub trait SynthesisService: Send + Sync {
    async fn synthesize(&self, request: &SynthesisRequest) -> anyhow::Result<AudioStream>;
}
