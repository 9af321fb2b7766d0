//! Incremental decoder for the `data: <json>\n\n` query stream.

use encoding_rs::{Encoding, UTF_8};
use panel_core::{QueryAnswer, StreamEvent};
use panel_logging::{panel_debug, panel_warn};
use serde::Deserialize;

/// Blank line between frames.
pub const FRAME_DELIMITER: &[u8] = b"\n\n";
/// Prefix of every payload line.
pub const FRAME_PREFIX: &str = "data:";

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum WireEvent {
    Progress { message: String },
    Final { data: QueryAnswer },
    Error { message: String },
}

impl From<WireEvent> for StreamEvent {
    fn from(wire: WireEvent) -> Self {
        match wire {
            WireEvent::Progress { message } => StreamEvent::Progress { message },
            WireEvent::Final { data } => StreamEvent::Final(data),
            WireEvent::Error { message } => StreamEvent::Error { message },
        }
    }
}

/// Splits arbitrary byte chunks into stream events.
///
/// Bytes are buffered until a full frame is present, so chunk boundaries may
/// fall anywhere, including inside a multi-byte character. After a terminal
/// event the decoder is closed and ignores further input.
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    scan_from: usize,
    encoding: &'static Encoding,
    terminated: bool,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            scan_from: 0,
            encoding: UTF_8,
            terminated: false,
        }
    }

    /// Decoder for a response with the given `Content-Type` header.
    pub fn for_content_type(content_type: Option<&str>) -> Self {
        let encoding = content_type
            .and_then(extract_charset)
            .and_then(|label| Encoding::for_label(label.as_bytes()))
            .unwrap_or(UTF_8);
        Self {
            encoding,
            ..Self::new()
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Bytes of an incomplete trailing frame.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Appends a chunk and returns every event completed by it, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        if self.terminated {
            return Vec::new();
        }
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(end) = self.next_delimiter() {
            let frame: Vec<u8> = self.buffer.drain(..end + FRAME_DELIMITER.len()).collect();
            self.scan_from = 0;
            let Some(event) = self.decode_frame(&frame[..end]) else {
                continue;
            };
            let terminal = event.is_terminal();
            events.push(event);
            if terminal {
                self.terminated = true;
                self.buffer.clear();
                break;
            }
        }
        events
    }

    /// Ends the stream. An unterminated trailing frame is dropped silently;
    /// returns its length.
    pub fn finish(self) -> usize {
        let dropped = self.buffer.len();
        if dropped > 0 {
            panel_debug!("stream ended with {} unterminated bytes", dropped);
        }
        dropped
    }

    fn next_delimiter(&mut self) -> Option<usize> {
        let found = self.buffer[self.scan_from..]
            .windows(FRAME_DELIMITER.len())
            .position(|window| window == FRAME_DELIMITER)
            .map(|offset| self.scan_from + offset);
        if found.is_none() {
            // The next search only needs to revisit a possible half delimiter.
            self.scan_from = self.buffer.len().saturating_sub(FRAME_DELIMITER.len() - 1);
        }
        found
    }

    fn decode_frame(&self, frame: &[u8]) -> Option<StreamEvent> {
        let (text, had_errors) = self.encoding.decode_without_bom_handling(frame);
        if had_errors {
            panel_warn!("frame contained invalid {} sequences", self.encoding.name());
        }

        let payload = text
            .lines()
            .filter(|line| !line.starts_with(':'))
            .map(|line| match line.strip_prefix(FRAME_PREFIX) {
                Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
                None => line,
            })
            .collect::<Vec<_>>()
            .join("\n");
        let payload = payload.trim();
        if payload.is_empty() {
            return None;
        }

        match serde_json::from_str::<WireEvent>(payload) {
            Ok(wire) => Some(wire.into()),
            Err(err) => {
                panel_warn!("dropping malformed frame ({} bytes): {}", frame.len(), err);
                None
            }
        }
    }
}

fn extract_charset(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .filter_map(|part| {
            let (key, value) = part.trim().split_once('=')?;
            key.eq_ignore_ascii_case("charset")
                .then(|| value.trim_matches([' ', '"', '\''].as_ref()).to_string())
        })
        .next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn progress(message: &str) -> StreamEvent {
        StreamEvent::Progress {
            message: message.to_string(),
        }
    }

    const STREAM: &str = concat!(
        "data: {\"type\":\"progress\",\"message\":\"searching\"}\n\n",
        "data: {\"type\":\"progress\",\"message\":\"ranking\"}\n\n",
        "data: {\"type\":\"final\",\"data\":{\"answer\":\"# Hi\",\"sources\":[]}}\n\n",
    );

    #[test]
    fn every_split_point_yields_the_same_events() {
        let bytes = STREAM.as_bytes();
        let expected = vec![
            progress("searching"),
            progress("ranking"),
            StreamEvent::Final(QueryAnswer {
                answer: "# Hi".to_string(),
                sources: Vec::new(),
            }),
        ];
        for split in 0..=bytes.len() {
            let mut decoder = FrameDecoder::new();
            let mut events = decoder.push(&bytes[..split]);
            events.extend(decoder.push(&bytes[split..]));
            assert_eq!(events, expected, "split at {split}");
        }
    }

    #[test]
    fn byte_by_byte_delivery() {
        let mut decoder = FrameDecoder::new();
        let events: Vec<_> = STREAM
            .as_bytes()
            .iter()
            .flat_map(|byte| decoder.push(std::slice::from_ref(byte)))
            .collect();
        assert_eq!(events.len(), 3);
        assert!(decoder.is_terminated());
    }

    #[test]
    fn partial_frame_is_retained() {
        let mut decoder = FrameDecoder::new();
        let input = "data: {\"type\":\"progress\",\"message\":\"a\"}\n\ndata: {\"type\":\"progress\",\"mess";

        assert_eq!(decoder.push(input.as_bytes()), vec![progress("a")]);
        assert_eq!(decoder.buffered_len(), "data: {\"type\":\"progress\",\"mess".len());

        let rest = decoder.push(b"age\":\"b\"}\n\n");
        assert_eq!(rest, vec![progress("b")]);
        assert_eq!(decoder.buffered_len(), 0);
    }

    #[test]
    fn multibyte_character_split_across_chunks() {
        let frame = "data: {\"type\":\"progress\",\"message\":\"正在检索本地知识库\"}\n\n";
        let bytes = frame.as_bytes();
        let split = frame.find('检').expect("char") + 1;

        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(&bytes[..split]).is_empty());
        assert_eq!(decoder.push(&bytes[split..]), vec![progress("正在检索本地知识库")]);
    }

    #[test]
    fn malformed_and_blank_frames_are_dropped() {
        let input = concat!(
            "data: {not json}\n\n",
            "data:   \n\n",
            "data: {\"type\":\"unknown\",\"message\":\"x\"}\n\n",
            ": keep-alive\n\n",
            "data: {\"type\":\"progress\",\"message\":\"ok\"}\n\n",
        );
        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.push(input.as_bytes()), vec![progress("ok")]);
    }

    #[test]
    fn null_source_fields_read_as_empty() {
        let input = concat!(
            "data: {\"type\":\"final\",\"data\":{\"answer\":\"A\",\"sources\":[",
            "{\"arxiv_id\":\"2401.00001\",\"title\":null,\"summary\":null,",
            "\"pdf_url\":null,\"authors\":null}]}}\n\n",
        );
        let mut decoder = FrameDecoder::new();
        assert_eq!(
            decoder.push(input.as_bytes()),
            vec![StreamEvent::Final(QueryAnswer {
                answer: "A".to_string(),
                sources: vec![panel_core::Source {
                    arxiv_id: "2401.00001".to_string(),
                    ..Default::default()
                }],
            })]
        );
        assert!(decoder.is_terminated());
    }

    #[test]
    fn nothing_is_yielded_after_a_terminal_event() {
        let input = concat!(
            "data: {\"type\":\"error\",\"message\":\"boom\"}\n\n",
            "data: {\"type\":\"progress\",\"message\":\"late\"}\n\n",
        );
        let mut decoder = FrameDecoder::new();
        assert_eq!(
            decoder.push(input.as_bytes()),
            vec![StreamEvent::Error {
                message: "boom".to_string()
            }]
        );
        assert!(decoder
            .push(b"data: {\"type\":\"progress\",\"message\":\"later\"}\n\n")
            .is_empty());
    }

    #[test]
    fn unterminated_tail_is_truncated_silently() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder
            .push(b"data: {\"type\":\"final\",\"data\":{\"answer\":\"x\"}}")
            .is_empty());
        assert_eq!(decoder.finish(), 44);
    }

    #[test]
    fn charset_is_taken_from_content_type() {
        let decoder = FrameDecoder::for_content_type(Some("text/event-stream; charset=\"GBK\""));
        assert_eq!(decoder.encoding.name(), "GBK");
        let decoder = FrameDecoder::for_content_type(Some("text/event-stream"));
        assert_eq!(decoder.encoding.name(), "UTF-8");
    }
}
