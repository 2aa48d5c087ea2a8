//! Streaming response contract shared by every provider
//!
//! A provider call produces a [`ResponseStream`]: a bounded channel fed by one
//! spawned worker task. The stream always terminates, either after exactly one
//! error chunk or after zero or more success chunks followed by closure.
//! Dropping the stream cancels the worker.

use crate::error::{ParleyError, ParleyResult};
use crate::llm::messages::{Choice, Response, Role, Usage};
use futures::{Stream, StreamExt};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Capacity of the chunk channel between worker and consumer
pub const STREAM_CHANNEL_CAPACITY: usize = 64;

/// One element of a response stream
pub type ResponseChunk = ParleyResult<Response>;

/// Consumer side of a provider stream
#[derive(Debug)]
pub struct ResponseStream {
    rx: mpsc::Receiver<ResponseChunk>,
    cancel: CancellationToken,
}

impl ResponseStream {
    /// Spawn `worker` on the current tokio runtime and return its stream.
    ///
    /// Any error the worker returns (other than [`ParleyError::Cancelled`])
    /// is delivered as the single terminal error chunk.
    pub fn spawn<F, Fut>(worker: F) -> Self
    where
        F: FnOnce(ChunkSender) -> Fut,
        Fut: Future<Output = ParleyResult<()>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();
        let sender = ChunkSender {
            tx: tx.clone(),
            cancel: cancel.clone(),
        };
        let fut = worker(sender);
        let abandoned = cancel.clone();

        tokio::spawn(async move {
            match fut.await {
                Ok(()) => debug!("response stream completed"),
                Err(ParleyError::Cancelled) => debug!("response stream cancelled"),
                Err(e) => {
                    warn!("response stream failed: {}", e);
                    tokio::select! {
                        _ = abandoned.cancelled() => {}
                        _ = tx.send(Err(e)) => {}
                    }
                }
            }
        });

        Self { rx, cancel }
    }

    /// Stream that replays a fixed sequence of chunks
    pub fn from_chunks(chunks: Vec<ResponseChunk>) -> Self {
        let (tx, rx) = mpsc::channel(chunks.len().max(1));
        for chunk in chunks {
            let _ = tx.try_send(chunk);
        }
        Self {
            rx,
            cancel: CancellationToken::new(),
        }
    }

    /// Abandon the stream; the worker stops at its next read or send
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Stream for ResponseStream {
    type Item = ResponseChunk;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for ResponseStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Producer side handed to a stream worker
#[derive(Debug, Clone)]
pub struct ChunkSender {
    tx: mpsc::Sender<ResponseChunk>,
    cancel: CancellationToken,
}

impl ChunkSender {
    /// Send one success chunk. Fails with `Cancelled` once the consumer is
    /// gone, including while waiting for room in a full channel.
    pub async fn send(&self, response: Response) -> ParleyResult<()> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ParleyError::Cancelled),
            sent = self.tx.send(Ok(response)) => sent.map_err(|_| ParleyError::Cancelled),
        }
    }

    pub async fn send_all(&self, responses: impl IntoIterator<Item = Response>) -> ParleyResult<()> {
        for response in responses {
            self.send(response).await?;
        }
        Ok(())
    }

    /// Resolves when the consumer cancels or drops the stream
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}

/// Incremental decoder from raw body bytes to normalized responses
pub trait StreamDecoder: Send {
    /// Feed the next slice of body bytes, pushing complete responses to `out`.
    /// An error is terminal for the stream.
    fn decode(&mut self, bytes: &[u8], out: &mut Vec<Response>) -> ParleyResult<()>;

    /// True once the wire format signalled its end
    fn is_finished(&self) -> bool;

    /// Called when the body ends
    fn finish(&mut self, _out: &mut Vec<Response>) -> ParleyResult<()> {
        Ok(())
    }
}

/// Pump a byte stream through `decoder` into `sender`.
///
/// Responses decoded before an error are delivered ahead of it. Cancellation
/// is checked between reads.
pub async fn drive_decoder<S, B, E, D>(
    body: S,
    mut decoder: D,
    sender: &ChunkSender,
) -> ParleyResult<()>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<ParleyError>,
    D: StreamDecoder,
{
    let mut body = std::pin::pin!(body);
    let mut out = Vec::new();
    loop {
        let next = tokio::select! {
            _ = sender.cancelled() => return Err(ParleyError::Cancelled),
            next = body.next() => next,
        };

        match next {
            Some(Ok(bytes)) => {
                let result = decoder.decode(bytes.as_ref(), &mut out);
                sender.send_all(out.drain(..)).await?;
                result?;
                if decoder.is_finished() {
                    return Ok(());
                }
            }
            Some(Err(e)) => return Err(e.into()),
            None => {
                let result = decoder.finish(&mut out);
                sender.send_all(out.drain(..)).await?;
                return result;
            }
        }
    }
}

/// Running aggregate of a response stream.
///
/// Text deltas are concatenated in arrival order and the last reported usage
/// wins.
#[derive(Debug, Default)]
pub struct ChunkAccumulator {
    content: String,
    usage: Option<Usage>,
}

impl ChunkAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one chunk in and return the text it appended
    pub fn push(&mut self, chunk: &Response) -> &str {
        let start = self.content.len();
        for choice in &chunk.choices {
            self.content.push_str(&choice.message.content);
        }
        if chunk.usage.is_some() {
            self.usage = chunk.usage;
        }
        &self.content[start..]
    }

    pub fn text(&self) -> &str {
        &self.content
    }

    /// Last reported usage, or zeros when none arrived
    pub fn usage(&self) -> Usage {
        self.usage.unwrap_or_default()
    }

    pub fn into_response(self) -> Response {
        let usage = self.usage();
        Response {
            choices: vec![Choice::new(Role::Assistant, self.content)],
            usage: Some(usage),
        }
    }
}

/// Drain a stream into one aggregated response.
///
/// The first error chunk aborts collection.
pub async fn collect_stream<S>(mut stream: S) -> ParleyResult<Response>
where
    S: Stream<Item = ResponseChunk> + Unpin,
{
    let mut acc = ChunkAccumulator::new();
    while let Some(chunk) = stream.next().await {
        acc.push(&chunk?);
    }
    Ok(acc.into_response())
}
