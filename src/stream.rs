//! Text fragments of a streamed reply, accumulated as they pass through.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use futures::Stream;
use futures::stream::FusedStream;

use crate::client::ChunkStream;
use crate::observability::{STREAM_DURATION, STREAM_FRAGMENTS, STREAM_TTFB};
use crate::{FinishReason, Result, Usage};

/// A fully received reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Concatenation of every fragment.
    pub text: String,
    /// Usage reported by the server, if any.
    pub usage: Option<Usage>,
    /// Why generation stopped, if the server said.
    pub finish_reason: Option<FinishReason>,
}

/// A lazy, finite, non-restartable stream of reply text fragments.
///
/// Each non-empty `delta.content` of the underlying chunk stream is yielded once, and
/// also appended to an internal buffer so that the full reply is available from
/// [`TextStream::into_reply`] once the stream has been drained.  The stream ends for
/// good after the first error or the end of the underlying chunks.
pub struct TextStream {
    inner: ChunkStream,
    text: String,
    usage: Option<Usage>,
    finish_reason: Option<FinishReason>,
    started: Instant,
    saw_fragment: bool,
    terminated: bool,
}

impl TextStream {
    /// Wraps a chunk stream.
    pub fn new(inner: ChunkStream) -> Self {
        Self {
            inner,
            text: String::new(),
            usage: None,
            finish_reason: None,
            started: Instant::now(),
            saw_fragment: false,
            terminated: false,
        }
    }

    /// Text received so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Usage, once the server has reported it.
    pub fn usage(&self) -> Option<Usage> {
        self.usage
    }

    /// Finish reason, once the server has reported it.
    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.finish_reason
    }

    /// Consumes the stream, returning what has been accumulated.
    pub fn into_reply(self) -> Reply {
        Reply {
            text: self.text,
            usage: self.usage,
            finish_reason: self.finish_reason,
        }
    }
}

impl Stream for TextStream {
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if self.terminated {
                return Poll::Ready(None);
            }
            match self.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    if let Some(usage) = chunk.usage() {
                        self.usage = Some(usage);
                    }
                    if let Some(reason) = chunk.finish_reason() {
                        self.finish_reason = Some(reason);
                    }
                    let Some(fragment) = chunk.fragment() else {
                        continue;
                    };
                    if !self.saw_fragment {
                        self.saw_fragment = true;
                        STREAM_TTFB.add(self.started.elapsed().as_secs_f64());
                    }
                    STREAM_FRAGMENTS.click();
                    self.text.push_str(fragment);
                    return Poll::Ready(Some(Ok(fragment.to_string())));
                }
                Poll::Ready(Some(Err(e))) => {
                    self.terminated = true;
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    self.terminated = true;
                    STREAM_DURATION.add(self.started.elapsed().as_secs_f64());
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl FusedStream for TextStream {
    fn is_terminated(&self) -> bool {
        self.terminated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChatCompletionChunk, Error};
    use futures::StreamExt;
    use futures::stream;

    fn chunks(items: Vec<Result<ChatCompletionChunk>>) -> ChunkStream {
        Box::pin(stream::iter(items))
    }

    #[tokio::test]
    async fn concatenation_is_full_reply() {
        let mut text = TextStream::new(chunks(vec![
            Ok(ChatCompletionChunk::text("c", "Hel")),
            Ok(ChatCompletionChunk::text("c", "")),
            Ok(ChatCompletionChunk::text("c", "lo")),
            Ok(ChatCompletionChunk::finished(
                "c",
                FinishReason::Stop,
                Some(Usage::new(9, 2)),
            )),
        ]));

        let mut fragments = Vec::new();
        while let Some(fragment) = text.next().await {
            fragments.push(fragment.unwrap());
        }
        assert_eq!(fragments, vec!["Hel".to_string(), "lo".to_string()]);
        assert!(text.is_terminated());

        let reply = text.into_reply();
        assert_eq!(reply.text, "Hello");
        assert_eq!(reply.usage, Some(Usage::new(9, 2)));
        assert_eq!(reply.finish_reason, Some(FinishReason::Stop));
    }

    #[tokio::test]
    async fn error_terminates() {
        let mut text = TextStream::new(chunks(vec![
            Ok(ChatCompletionChunk::text("c", "partial")),
            Err(Error::streaming("connection reset", None)),
            Ok(ChatCompletionChunk::text("c", "never seen")),
        ]));
        assert_eq!(text.next().await.unwrap().unwrap(), "partial");
        assert!(text.next().await.unwrap().is_err());
        assert!(text.next().await.is_none());
        assert!(text.next().await.is_none());
        assert_eq!(text.text(), "partial");
    }

    #[tokio::test]
    async fn empty_stream() {
        let mut text = TextStream::new(chunks(vec![]));
        assert!(text.next().await.is_none());
        assert_eq!(text.into_reply().text, "");
    }
}
