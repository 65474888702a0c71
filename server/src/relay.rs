//! `POST /generate-audio`: keywords and persona in, streamed MP3 out.
//!
//! Per request the pipeline runs
//! `RECEIVED -> COMPLETING_TEXT -> SYNTHESIZING -> STREAMING -> DONE`, with a
//! failure possible in any of the middle three. Text generation always
//! finishes before synthesis starts, and audio chunks are forwarded in the
//! order the synthesis service produced them.

use std::{
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::Instant,
};

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use futures_util::{ready, Stream, StreamExt};
use serde::Deserialize;
use tracing::{debug, error, info, warn};
use tts_core::AudioStream;

use crate::error::ApiError;
use crate::metrics::RelayMetrics;
use crate::validation::validate_generated_sentence;
use crate::AppState;

pub const AUDIO_MPEG: &str = "audio/mpeg";

#[derive(Debug, Deserialize)]
pub struct SpeakRequest {
    pub keywords: String,
    pub persona: String,
}

pub async fn generate_audio(
    State(state): State<AppState>,
    payload: Result<Json<SpeakRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    state.metrics.record_request();
    let Json(req) = payload?;
    debug!(persona = %req.persona, "RECEIVED");

    let sentence = complete_sentence(&state, &req).await.inspect_err(|_| {
        state.metrics.record_text_error();
    })?;
    info!("Generated sentence: {}", sentence);

    debug!("SYNTHESIZING");
    let synthesis = state.config.synthesis_request(sentence);
    let mut audio = state.tts.synthesize(&synthesis).await.map_err(|e| {
        state.metrics.record_audio_error();
        ApiError::UpstreamAudio(e)
    })?;

    // Hold the headers back until there is audio to send, so a failure here
    // still gets a proper error status.
    let first = match audio.next().await {
        Some(Ok(chunk)) => Some(chunk),
        Some(Err(e)) => {
            state.metrics.record_audio_error();
            return Err(ApiError::UpstreamAudio(e));
        }
        None => None,
    };

    debug!("STREAMING");
    let body = RelayBody::new(first, audio, state.metrics.clone());
    Ok(([(header::CONTENT_TYPE, AUDIO_MPEG)], Body::from_stream(body)).into_response())
}

async fn complete_sentence(state: &AppState, req: &SpeakRequest) -> Result<String, ApiError> {
    debug!("COMPLETING_TEXT");
    let prompt = llm_core::build_prompt(&req.keywords, &req.persona);
    let started = Instant::now();

    let completion = match state.config.llm_timeout() {
        Some(limit) => tokio::time::timeout(limit, state.llm.complete(&prompt))
            .await
            .map_err(|_| {
                ApiError::UpstreamText(anyhow::anyhow!(
                    "completion timed out after {} seconds",
                    limit.as_secs()
                ))
            })?,
        None => state.llm.complete(&prompt).await,
    };
    let raw = completion.map_err(ApiError::UpstreamText)?;

    state
        .metrics
        .record_completion(started.elapsed().as_millis() as u64);
    validate_generated_sentence(&raw).map(str::to_string)
}

/// Response body that forwards audio chunks and accounts for how the stream
/// ended. Dropping it early (client disconnect) cancels the upstream stream.
struct RelayBody {
    first: Option<Bytes>,
    audio: AudioStream,
    metrics: Arc<RelayMetrics>,
    done: bool,
}

impl RelayBody {
    fn new(first: Option<Bytes>, audio: AudioStream, metrics: Arc<RelayMetrics>) -> Self {
        Self {
            first,
            audio,
            metrics,
            done: false,
        }
    }
}

impl Stream for RelayBody {
    type Item = anyhow::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        if let Some(chunk) = this.first.take() {
            this.metrics.record_chunk(chunk.len());
            return Poll::Ready(Some(Ok(chunk)));
        }

        match ready!(this.audio.poll_next_unpin(cx)) {
            Some(Ok(chunk)) => {
                this.metrics.record_chunk(chunk.len());
                Poll::Ready(Some(Ok(chunk)))
            }
            Some(Err(e)) => {
                // Headers are already out; the only signal left is to abort
                // the body so the caller sees a truncated transfer.
                this.done = true;
                this.metrics.record_audio_error();
                error!(
                    bytes = this.audio.byte_count(),
                    "Audio stream failed mid-response: {:#}", e
                );
                Poll::Ready(Some(Err(e)))
            }
            None => {
                this.done = true;
                this.metrics.record_stream_completed();
                info!(
                    chunks = this.audio.chunk_count(),
                    bytes = this.audio.byte_count(),
                    "DONE"
                );
                Poll::Ready(None)
            }
        }
    }
}

impl Drop for RelayBody {
    fn drop(&mut self) {
        if !self.done {
            self.audio.cancel();
            self.metrics.record_stream_cancelled();
            warn!(
                bytes = self.audio.byte_count(),
                "Client went away, stopped pulling audio"
            );
        }
    }
}
