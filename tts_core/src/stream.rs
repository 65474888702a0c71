//! Single-pass audio chunk streams.
//!
//! An [`AudioStream`] wraps whatever the synthesis backend produces (an HTTP
//! body, a test fixture) and hands chunks out in the order they arrive. Empty
//! chunks are swallowed. Once the stream ends, fails, or is cancelled it only
//! yields `None`; there is no way to restart it.
//!
//! Dropping the stream drops the underlying source, which for an HTTP body
//! releases the upstream connection. [`AudioStream::cancel`] does the same
//! thing explicitly while keeping the handle around.

use std::{
    pin::Pin,
    task::{Context, Poll},
};

use bytes::Bytes;
use futures_core::{ready, Stream};
use futures_util::{stream, StreamExt};

type ChunkSource = Pin<Box<dyn Stream<Item = anyhow::Result<Bytes>> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Open,
    Finished,
    Failed,
    Cancelled,
}

pub struct AudioStream {
    source: Option<ChunkSource>,
    state: StreamState,
    chunks: u64,
    bytes: u64,
}

impl AudioStream {
    pub fn from_stream<S>(source: S) -> Self
    where
        S: Stream<Item = anyhow::Result<Bytes>> + Send + 'static,
    {
        Self {
            source: Some(Box::pin(source)),
            state: StreamState::Open,
            chunks: 0,
            bytes: 0,
        }
    }

    /// Stream over a streamed HTTP response body.
    pub fn from_response(response: reqwest::Response) -> Self {
        Self::from_stream(
            response
                .bytes_stream()
                .map(|chunk| chunk.map_err(anyhow::Error::from)),
        )
    }

    /// Stream over chunks that are already in memory.
    pub fn from_chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Bytes>,
        I::IntoIter: Send + 'static,
    {
        Self::from_stream(stream::iter(chunks.into_iter().map(Ok::<_, anyhow::Error>)))
    }

    /// Stop pulling chunks and release the source.
    pub fn cancel(&mut self) {
        if self.source.take().is_some() {
            tracing::debug!(chunks = self.chunks, bytes = self.bytes, "audio stream cancelled");
            self.state = StreamState::Cancelled;
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Number of non-empty chunks handed out so far.
    pub fn chunk_count(&self) -> u64 {
        self.chunks
    }

    /// Number of bytes handed out so far.
    pub fn byte_count(&self) -> u64 {
        self.bytes
    }
}

impl Stream for AudioStream {
    type Item = anyhow::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            let Some(source) = this.source.as_mut() else {
                return Poll::Ready(None);
            };
            match ready!(source.as_mut().poll_next(cx)) {
                Some(Ok(chunk)) if chunk.is_empty() => continue,
                Some(Ok(chunk)) => {
                    this.chunks += 1;
                    this.bytes += chunk.len() as u64;
                    return Poll::Ready(Some(Ok(chunk)));
                }
                Some(Err(e)) => {
                    this.source = None;
                    this.state = StreamState::Failed;
                    return Poll::Ready(Some(Err(e)));
                }
                None => {
                    this.source = None;
                    this.state = StreamState::Finished;
                    return Poll::Ready(None);
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.source {
            Some(_) => (0, None),
            None => (0, Some(0)),
        }
    }
}

impl Drop for AudioStream {
    fn drop(&mut self) {
        if self.source.is_some() {
            tracing::debug!(
                chunks = self.chunks,
                bytes = self.bytes,
                "audio stream dropped before the end, releasing upstream"
            );
        }
    }
}

impl std::fmt::Debug for AudioStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioStream")
            .field("state", &self.state)
            .field("chunks", &self.chunks)
            .field("bytes", &self.bytes)
            .finish()
    }
}
