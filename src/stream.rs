//! Lazy SSE chunk stream for streaming chat completions.
//!
//! The gateway streams newline-delimited `data: {json}` frames terminated by
//! a literal `data: [DONE]` sentinel. Lines are reassembled across network
//! chunk boundaries; frames that fail to parse as JSON are dropped (counted,
//! logged at debug) rather than tearing down the stream.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::{Bytes, BytesMut};
use futures::{Stream, TryStreamExt};

use crate::error::GatewayError;

/// SSE stream termination sentinel. Not itself JSON-decoded.
const DONE_SENTINEL: &str = "[DONE]";

/// How a [`ChunkStream`] terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The gateway sent the `[DONE]` sentinel.
    Sentinel,
    /// The connection closed without a sentinel.
    Eof,
}

/// Classification of a single SSE line.
#[derive(Debug)]
pub(crate) enum SseLine {
    /// Blank keep-alive line, nothing to do.
    Empty,
    /// The `[DONE]` sentinel: terminate the stream.
    Done,
    /// A decoded JSON chunk.
    Chunk(serde_json::Value),
    /// Malformed frame: drop it and keep the stream alive.
    Skip,
}

/// Classify one line of the event stream. Strips a literal `data: ` prefix
/// when present; lines without the prefix are still parsed as JSON.
pub(crate) fn classify_line(line: &str) -> SseLine {
    if line.trim().is_empty() {
        return SseLine::Empty;
    }
    let data = line.strip_prefix("data: ").unwrap_or(line);
    if data.trim() == DONE_SENTINEL {
        return SseLine::Done;
    }
    match serde_json::from_str(data) {
        Ok(value) => SseLine::Chunk(value),
        Err(_) => SseLine::Skip,
    }
}

type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, GatewayError>> + Send>>;

/// Lazy, single-pass sequence of decoded streaming chunks.
///
/// Consuming the stream drives the underlying network read. It is finite,
/// ending at the `[DONE]` sentinel or end-of-stream, whichever comes first,
/// and fuses after a transport error. [`ChunkStream::end`] reports how it
/// terminated and [`ChunkStream::dropped_frames`] how many malformed frames
/// were discarded along the way.
pub struct ChunkStream {
    body: BodyStream,
    /// Raw bytes of a partial line carried across network chunks. Kept as
    /// bytes so a multi-byte character split by a chunk boundary is only
    /// decoded once the line is complete.
    buffer: BytesMut,
    /// Chunks decoded from a flushed trailing line, not yet yielded.
    pending: VecDeque<serde_json::Value>,
    dropped: usize,
    end: Option<StreamEnd>,
    errored: bool,
}

impl ChunkStream {
    /// Wrap a streaming HTTP response body.
    pub(crate) fn new(response: reqwest::Response) -> Self {
        Self::from_body(Box::pin(
            response.bytes_stream().map_err(GatewayError::transport),
        ))
    }

    fn from_body(body: BodyStream) -> Self {
        Self {
            body,
            buffer: BytesMut::new(),
            pending: VecDeque::new(),
            dropped: 0,
            end: None,
            errored: false,
        }
    }

    /// How the stream terminated, once exhausted. `None` while chunks may
    /// still arrive or after a transport error.
    pub fn end(&self) -> Option<StreamEnd> {
        self.end
    }

    /// Number of malformed frames dropped so far.
    pub fn dropped_frames(&self) -> usize {
        self.dropped
    }

    /// Handle one complete line; returns a chunk to yield, if any.
    fn consume_line(&mut self, line: &str) -> Option<serde_json::Value> {
        match classify_line(line) {
            SseLine::Empty => None,
            SseLine::Done => {
                self.end = Some(StreamEnd::Sentinel);
                None
            }
            SseLine::Chunk(value) => Some(value),
            SseLine::Skip => {
                self.dropped += 1;
                tracing::debug!(line, "dropping malformed stream frame");
                None
            }
        }
    }

    /// Split the next complete line (through its `\n`) off the byte buffer
    /// and decode it. Decoding happens per complete line only, so chunk
    /// boundaries inside a multi-byte character are harmless.
    fn take_line(&mut self) -> Option<String> {
        let pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let raw = self.buffer.split_to(pos + 1);
        Some(String::from_utf8_lossy(&raw).into_owned())
    }
}

impl Stream for ChunkStream {
    type Item = Result<serde_json::Value, GatewayError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if let Some(value) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(value)));
            }
            if this.end.is_some() || this.errored {
                return Poll::Ready(None);
            }

            // Drain complete lines already buffered before reading more.
            while let Some(line) = this.take_line() {
                if let Some(value) = this.consume_line(line.trim_end_matches(['\r', '\n'])) {
                    return Poll::Ready(Some(Ok(value)));
                }
                if this.end.is_some() {
                    return Poll::Ready(None);
                }
            }

            match ready!(this.body.as_mut().poll_next(cx)) {
                Some(Ok(bytes)) => {
                    this.buffer.extend_from_slice(&bytes);
                }
                Some(Err(e)) => {
                    this.errored = true;
                    return Poll::Ready(Some(Err(e)));
                }
                None => {
                    // Flush a trailing line that arrived without a newline.
                    if !this.buffer.is_empty() {
                        let raw = std::mem::take(&mut this.buffer);
                        let line = String::from_utf8_lossy(&raw);
                        if let Some(value) = this.consume_line(line.trim_end_matches('\r')) {
                            this.pending.push_back(value);
                        }
                    }
                    if this.end.is_none() {
                        this.end = Some(StreamEnd::Eof);
                    }
                    if let Some(value) = this.pending.pop_front() {
                        return Poll::Ready(Some(Ok(value)));
                    }
                    return Poll::Ready(None);
                }
            }
        }
    }
}
