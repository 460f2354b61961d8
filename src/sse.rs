//! Server-Sent Events (SSE) processing for streaming responses.
//!
//! This module turns the byte stream of a streaming `chat/completions` response into
//! [`ChatCompletionChunk`]s.  Every event carries a single `data:` payload; the payload
//! `[DONE]` ends the stream, and a payload with an `error` object is surfaced as an
//! [`Error`].

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;

use crate::observability::{STREAM_BYTES, STREAM_ERRORS, STREAM_EVENTS};
use crate::{ChatCompletionChunk, Error, Result};

/// Marker payload that terminates a completion stream.
const DONE_MARKER: &str = "[DONE]";

/// Process a stream of bytes into a stream of completion chunks.
///
/// The returned stream ends after the `[DONE]` marker.  If the underlying byte stream
/// ends first, the reply was cut short and the last item is a streaming error.
/// Keep-alive comments and events without data are skipped.
pub fn process_sse<S>(byte_stream: S) -> impl Stream<Item = Result<ChatCompletionChunk>>
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Unpin + 'static,
{
    // Convert reqwest errors to our error type
    let stream = byte_stream.map(|result| {
        result
            .map_err(|e| Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e))))
    });
    decode_events(stream)
}

/// Decode SSE events from a stream of already-converted byte results.
pub(crate) fn decode_events<S>(stream: S) -> impl Stream<Item = Result<ChatCompletionChunk>>
where
    S: Stream<Item = Result<Bytes>> + Unpin,
{
    let state = DecoderState {
        stream,
        buffer: Vec::new(),
        eof: false,
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        if state.done {
            return None;
        }
        loop {
            if state.eof {
                STREAM_ERRORS.click();
                state.done = true;
                return Some((
                    Err(Error::streaming("stream ended before [DONE]", None)),
                    state,
                ));
            }

            // First check if we have a complete event in the buffer
            if let Some(event_text) = take_event(&mut state.buffer) {
                match parse_event(&event_text) {
                    Some(Event::Done) => return None,
                    Some(Event::Chunk(chunk)) => {
                        if chunk.is_err() {
                            STREAM_ERRORS.click();
                            state.done = true;
                        } else {
                            STREAM_EVENTS.click();
                        }
                        return Some((chunk, state));
                    }
                    None => continue,
                }
            }

            // Read more data
            match state.stream.next().await {
                Some(Ok(bytes)) => {
                    STREAM_BYTES.count(bytes.len() as u64);
                    state.buffer.extend_from_slice(&bytes);
                }
                Some(Err(e)) => {
                    STREAM_ERRORS.click();
                    state.done = true;
                    return Some((Err(e), state));
                }
                None => {
                    // End of stream without [DONE]; a trailing event may lack its blank
                    // line, and the reply is reported as truncated after it.
                    state.eof = true;
                    let rest = std::mem::take(&mut state.buffer);
                    match parse_event(&rest) {
                        Some(Event::Done) => return None,
                        Some(Event::Chunk(chunk)) => {
                            state.done = chunk.is_err();
                            return Some((chunk, state));
                        }
                        None => continue,
                    }
                }
            }
        }
    })
}

struct DecoderState<S> {
    stream: S,
    buffer: Vec<u8>,
    eof: bool,
    done: bool,
}

enum Event {
    Chunk(Result<ChatCompletionChunk>),
    Done,
}

/// Removes the first complete event (terminated by a blank line) from `buffer`.
///
/// Works on bytes so that a multi-byte character split across two network reads is
/// reassembled before decoding.
fn take_event(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
    let (end, delimiter_len) = find_delimiter(buffer)?;
    let event = buffer[..end].to_vec();
    buffer.drain(..end + delimiter_len);
    Some(event)
}

fn find_delimiter(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = buffer.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2));
    let crlf = buffer
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|i| (i, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

/// Parse one event.  Returns `None` for events that carry no data.
fn parse_event(event: &[u8]) -> Option<Event> {
    let text = match std::str::from_utf8(event) {
        Ok(text) => text,
        Err(e) => {
            return Some(Event::Chunk(Err(Error::encoding(
                format!("Invalid UTF-8 in stream: {e}"),
                Some(Box::new(e)),
            ))));
        }
    };

    let mut data: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.starts_with(':') {
            continue;
        }
        if let Some(value) = line.strip_prefix("data:") {
            data.push(value.strip_prefix(' ').unwrap_or(value));
        }
    }
    if data.is_empty() {
        return None;
    }
    let data = data.join("\n");
    let data = data.trim();

    if data == DONE_MARKER {
        return Some(Event::Done);
    }
    Some(Event::Chunk(parse_chunk(data)))
}

fn parse_chunk(data: &str) -> Result<ChatCompletionChunk> {
    #[derive(Deserialize)]
    struct StreamError {
        error: StreamErrorDetail,
    }

    #[derive(Deserialize)]
    struct StreamErrorDetail {
        #[serde(rename = "type")]
        error_type: Option<String>,
        message: Option<String>,
    }

    if let Ok(StreamError { error }) = serde_json::from_str::<StreamError>(data) {
        return Err(Error::api(
            500,
            Some(
                error
                    .error_type
                    .unwrap_or_else(|| "stream_error".to_string()),
            ),
            error.message.unwrap_or_else(|| data.to_string()),
            None,
        ));
    }

    serde_json::from_str::<ChatCompletionChunk>(data).map_err(|e| {
        Error::serialization(
            format!("Failed to parse event JSON: {e}"),
            Some(Box::new(e)),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn bytes_stream(chunks: Vec<&'static [u8]>) -> impl Stream<Item = Result<Bytes>> + Unpin {
        stream::iter(chunks.into_iter().map(|c| Ok(Bytes::from_static(c))))
    }

    const CHUNK: &[u8] = b"data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hi\"}}]}\n\n";

    #[tokio::test]
    async fn parse_single_chunk() {
        let mut events = Box::pin(decode_events(bytes_stream(vec![CHUNK])));
        let chunk = events.next().await.unwrap().unwrap();
        assert_eq!(chunk.fragment(), Some("Hi"));
        let err = events.next().await.unwrap().unwrap_err();
        assert!(err.to_string().contains("stream ended before [DONE]"));
        assert!(err.is_transport());
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn done_after_chunks_ends_cleanly() {
        let mut events = Box::pin(decode_events(bytes_stream(vec![
            CHUNK,
            CHUNK,
            &b"data: [DONE]\n\n"[..],
        ])));
        assert!(events.next().await.unwrap().is_ok());
        assert!(events.next().await.unwrap().is_ok());
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn empty_body_is_truncated() {
        let mut events = Box::pin(decode_events(bytes_stream(vec![])));
        assert!(events.next().await.unwrap().is_err());
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn done_marker_ends_stream() {
        let mut events = Box::pin(decode_events(bytes_stream(vec![
            CHUNK,
            &b"data: [DONE]\n\n"[..],
            CHUNK,
        ])));
        assert!(events.next().await.unwrap().is_ok());
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn handle_split_event() {
        let mut events = Box::pin(decode_events(bytes_stream(vec![
            &b"data: {\"id\":\"c1\",\"choices\":[{\"delta\":"[..],
            &b"{\"content\":\"split\"}}]}\n"[..],
            &b"\n"[..],
        ])));
        let chunk = events.next().await.unwrap().unwrap();
        assert_eq!(chunk.fragment(), Some("split"));
    }

    #[tokio::test]
    async fn handle_split_multibyte_character() {
        // "é" is 0xC3 0xA9; split it across two reads.
        let mut events = Box::pin(decode_events(bytes_stream(vec![
            &b"data: {\"choices\":[{\"delta\":{\"content\":\"caf\xC3"[..],
            &b"\xA9\"}}]}\n\n"[..],
        ])));
        let chunk = events.next().await.unwrap().unwrap();
        assert_eq!(chunk.fragment(), Some("caf\u{e9}"));
    }

    #[tokio::test]
    async fn skip_comments_and_crlf() {
        let mut events = Box::pin(decode_events(bytes_stream(vec![
            &b": keep-alive\r\n\r\n"[..],
            &b"data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\r\n\r\n"[..],
            &b"data: [DONE]\r\n\r\n"[..],
        ])));
        let chunk = events.next().await.unwrap().unwrap();
        assert_eq!(chunk.fragment(), Some("ok"));
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn handle_malformed_event() {
        let mut events = Box::pin(decode_events(bytes_stream(vec![&b"data: {not json\n\n"[..]])));
        let event = events.next().await.unwrap();
        let err = event.unwrap_err();
        assert!(err.to_string().contains("Failed to parse event JSON"));
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn in_band_error_payload() {
        let mut events = Box::pin(decode_events(bytes_stream(vec![
            &b"data: {\"error\":{\"message\":\"model overloaded\",\"type\":\"server_error\"}}\n\n"[..],
        ])));
        let err = events.next().await.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "server_error: model overloaded");
        assert!(err.is_transport());
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn transport_error_terminates_stream() {
        let mut events = Box::pin(decode_events(stream::iter(vec![
            Err(Error::connection("reset by peer", None)),
            Ok(Bytes::from_static(CHUNK)),
        ])));
        assert!(events.next().await.unwrap().is_err());
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn trailing_event_without_blank_line() {
        let mut events = Box::pin(decode_events(bytes_stream(vec![
            &b"data: {\"choices\":[{\"delta\":{\"content\":\"tail\"}}]}"[..],
        ])));
        let chunk = events.next().await.unwrap().unwrap();
        assert_eq!(chunk.fragment(), Some("tail"));
        assert!(events.next().await.unwrap().is_err());
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn trailing_done_without_blank_line() {
        let mut events = Box::pin(decode_events(bytes_stream(vec![CHUNK, &b"data: [DONE]"[..]])));
        assert!(events.next().await.unwrap().is_ok());
        assert!(events.next().await.is_none());
    }
}
