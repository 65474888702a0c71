//! Common utilities for integration tests

#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use bytes::Bytes;
use llm_core::CompletionService;
use server::{build_router, config::ServerConfig, AppState};
use tower::ServiceExt;
use tts_core::{AudioStream, SynthesisRequest, SynthesisService};

/// Completion service that returns a canned reply and remembers every prompt.
pub struct StubCompletion {
    reply: Result<String, String>,
    delay: Option<Duration>,
    pub prompts: Mutex<Vec<String>>,
}

impl StubCompletion {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn slow(text: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            delay: Some(delay),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionService for StubCompletion {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply.clone().map_err(|e| anyhow::anyhow!(e))
    }
}

/// What the stub synthesis service does when called.
pub enum AudioScript {
    Chunks(Vec<Bytes>),
    FailUpfront(&'static str),
    FailAfter(Vec<Bytes>, &'static str),
    /// Yields one-byte chunks forever, counting how many were pulled.
    Endless(Arc<AtomicUsize>),
}

impl AudioScript {
    pub fn chunks(parts: &[&[u8]]) -> Self {
        Self::Chunks(to_bytes_vec(parts))
    }

    pub fn fail_after(parts: &[&[u8]], message: &'static str) -> Self {
        Self::FailAfter(to_bytes_vec(parts), message)
    }
}

fn to_bytes_vec(parts: &[&[u8]]) -> Vec<Bytes> {
    parts.iter().map(|p| Bytes::copy_from_slice(p)).collect()
}

pub struct StubSynthesis {
    script: AudioScript,
    pub requests: Mutex<Vec<SynthesisRequest>>,
}

impl StubSynthesis {
    pub fn new(script: AudioScript) -> Arc<Self> {
        Arc::new(Self {
            script,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl SynthesisService for StubSynthesis {
    async fn synthesize(&self, request: &SynthesisRequest) -> anyhow::Result<AudioStream> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.script {
            AudioScript::Chunks(chunks) => Ok(AudioStream::from_chunks(chunks.clone())),
            AudioScript::FailUpfront(message) => Err(anyhow::anyhow!(*message)),
            AudioScript::FailAfter(chunks, message) => {
                let chunks = chunks.clone();
                let message = *message;
                Ok(AudioStream::from_stream(async_stream::stream! {
                    for chunk in chunks {
                        yield Ok(chunk);
                    }
                    yield Err(anyhow::anyhow!(message));
                }))
            }
            AudioScript::Endless(pulled) => {
                let pulled = pulled.clone();
                Ok(AudioStream::from_stream(async_stream::stream! {
                    loop {
                        let n = pulled.fetch_add(1, Ordering::SeqCst);
                        yield Ok::<_, anyhow::Error>(Bytes::from(vec![n as u8]));
                    }
                }))
            }
        }
    }
}

/// Create a test app instance backed by stub upstreams.
pub fn create_test_app(
    llm: Arc<StubCompletion>,
    tts: Arc<StubSynthesis>,
    config: ServerConfig,
) -> (Router, AppState) {
    let state = AppState::new(llm, tts, config);
    (build_router(state.clone()), state)
}

pub async fn post_json(app: Router, body: serde_json::Value) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri("/generate-audio")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
    )
    .await
    .unwrap()
}
