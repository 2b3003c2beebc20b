use std::collections::VecDeque;

use futures_util::stream;
use futures_util::Stream;
use futures_util::StreamExt;

/// Marker that opens every payload line of the generation stream.
pub const DATA_PREFIX: &str = "data: ";

/// Incremental splitter for a `data: <json>\n\n` response body.
///
/// Bytes are buffered until a `\n` arrives, so a UTF-8 sequence cut between
/// two chunks is decoded only once it is whole. A trailing `\r` is dropped.
/// Lines without the `data: ` marker (keep-alives, comments, other SSE
/// fields) are discarded.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk and returns the payloads of every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        let mut start = 0;
        for end in memchr::memchr_iter(b'\n', &self.buf) {
            if let Some(payload) = data_payload(&self.buf[start..end]) {
                payloads.push(payload);
            }
            start = end + 1;
        }
        self.buf.drain(..start);
        payloads
    }

    /// Bytes of the current unterminated line.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Ends the stream. An unterminated tail cannot be a full event and is
    /// dropped.
    pub fn finish(self) {
        if !self.buf.is_empty() {
            tracing::trace!("discarding {} bytes of unterminated stream tail", self.buf.len());
        }
    }
}

fn data_payload(line: &[u8]) -> Option<String> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let text = String::from_utf8_lossy(line);
    match text.strip_prefix(DATA_PREFIX) {
        Some(payload) => Some(payload.to_string()),
        None => {
            if !text.is_empty() {
                tracing::trace!("dropping non-data line: {text}");
            }
            None
        }
    }
}

/// Lazily turns a chunked body into its `data:` payloads.
///
/// A transport error is yielded once and ends the sequence.
pub fn payloads<S, B, E>(body: S) -> impl Stream<Item = Result<String, E>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    let state = (Box::pin(body), SseDecoder::new(), VecDeque::new(), false);
    stream::unfold(state, |(mut body, mut decoder, mut ready, failed)| async move {
        loop {
            if let Some(payload) = ready.pop_front() {
                return Some((Ok(payload), (body, decoder, ready, failed)));
            }
            if failed {
                return None;
            }
            match body.next().await {
                Some(Ok(chunk)) => ready.extend(decoder.push(chunk.as_ref())),
                Some(Err(err)) => return Some((Err(err), (body, decoder, ready, true))),
                None => {
                    decoder.finish();
                    return None;
                }
            }
        }
    })
}
