//! Reassembles one HTTP response from a byte stream.
//!
//! TCP carries no message boundaries, so the reader accumulates chunks until
//! it has seen the blank line ending the header block, learns the body length
//! from `Content-Length`, and then keeps reading until exactly that many body
//! bytes are buffered.
//!
//! A response whose header block carries no usable `Content-Length` is read until
//! the peer closes the connection. EOF at any point ends the read early and
//! the bytes accumulated so far are returned as a truncated response.

use std::io::{ErrorKind, Read};

use log::{trace, warn};

use crate::error::ApiError;
use crate::http::HEADER_TERMINATOR;

/// Size of a single socket read.
pub const READ_CHUNK: usize = 8192;

const CONTENT_LENGTH: &str = "Content-Length: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    /// Still looking for the header terminator.
    ReadingHeaders,
    /// Header block complete; done once the buffer reaches `target` bytes.
    /// Without a usable `Content-Length` there is no target and the body
    /// runs to EOF.
    ReadingBody { target: Option<usize> },
}

/// Incremental response reader.
#[derive(Debug)]
pub struct ResponseReader {
    buffer: Vec<u8>,
    state: ReadState,
}

impl Default for ResponseReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseReader {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(READ_CHUNK),
            state: ReadState::ReadingHeaders,
        }
    }

    /// Read from `stream` until one full response is buffered or the peer
    /// closes the connection, and return the raw text.
    pub fn read_from<R: Read>(mut self, stream: &mut R) -> Result<String, ApiError> {
        let mut chunk = [0u8; READ_CHUNK];

        while !self.is_complete() {
            let n = match stream.read(&mut chunk) {
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ApiError::Io(e)),
            };
            if n == 0 {
                if let ReadState::ReadingBody { target: Some(target) } = self.state {
                    warn!(
                        "peer closed connection after {} of {target} response bytes",
                        self.buffer.len()
                    );
                }
                break;
            }
            trace!("read {n} bytes");
            self.feed(&chunk[..n]);
        }

        Ok(self.finish())
    }

    fn is_complete(&self) -> bool {
        match self.state {
            ReadState::ReadingHeaders => false,
            ReadState::ReadingBody { target } => target.is_some_and(|t| self.buffer.len() >= t),
        }
    }

    /// Append a chunk and advance the state machine.
    fn feed(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);

        if self.state == ReadState::ReadingHeaders {
            if let Some(header_end) = find_header_end(&self.buffer) {
                let target = content_length(&self.buffer[..header_end])
                    .and_then(|length| header_end.checked_add(length));
                self.state = ReadState::ReadingBody { target };
            }
        }
    }

    /// The buffered response, cut at the declared length.
    fn finish(mut self) -> String {
        if let ReadState::ReadingBody { target: Some(target) } = self.state {
            self.buffer.truncate(target);
        }
        String::from_utf8_lossy(&self.buffer).into_owned()
    }
}

/// Offset just past the header terminator, if it has been received.
fn find_header_end(buffer: &[u8]) -> Option<usize> {
    let needle = HEADER_TERMINATOR.as_bytes();
    buffer
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|pos| pos + needle.len())
}

/// Value of the `Content-Length` header in a complete header block.
fn content_length(headers: &[u8]) -> Option<usize> {
    let text = String::from_utf8_lossy(headers);
    let start = text.find(CONTENT_LENGTH)? + CONTENT_LENGTH.len();
    let rest = &text[start..];
    let end = rest.find('\r').unwrap_or(rest.len());
    rest[..end].trim().parse().ok()
}

/// Read one response from `stream`.
pub fn read_response<R: Read>(stream: &mut R) -> Result<String, ApiError> {
    ResponseReader::new().read_from(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;

    /// Hands out pre-split chunks, then either EOF or a panic if the reader
    /// asks for more than it should.
    struct ChunkedStream {
        chunks: VecDeque<Vec<u8>>,
        eof_when_drained: bool,
    }

    impl ChunkedStream {
        fn new(data: &[u8], size: usize) -> Self {
            Self {
                chunks: data.chunks(size).map(<[u8]>::to_vec).collect(),
                eof_when_drained: true,
            }
        }

        fn no_eof(mut self) -> Self {
            self.eof_when_drained = false;
            self
        }
    }

    impl Read for ChunkedStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.chunks.pop_front() {
                Some(chunk) => {
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    if n < chunk.len() {
                        self.chunks.push_front(chunk[n..].to_vec());
                    }
                    Ok(n)
                }
                None if self.eof_when_drained => Ok(0),
                None => panic!("reader kept reading after the response was complete"),
            }
        }
    }

    const JSON_RESPONSE: &str = "HTTP/1.1 200 OK\r\n\
        X-Powered-By: Express\r\n\
        Content-Type: application/json; charset=utf-8\r\n\
        Content-Length: 27\r\n\
        \r\n\
        {\"token\":\"eyJhbGciOi.x.y\"}\n";

    #[test]
    fn single_read() {
        let mut stream = ChunkedStream::new(JSON_RESPONSE.as_bytes(), 64 * 1024).no_eof();
        assert_eq!(read_response(&mut stream).unwrap(), JSON_RESPONSE);
    }

    #[test]
    fn any_chunking_reassembles_identically() {
        for size in [1, 2, 3, 7, 16, 50, 97] {
            let mut stream = ChunkedStream::new(JSON_RESPONSE.as_bytes(), size).no_eof();
            assert_eq!(read_response(&mut stream).unwrap(), JSON_RESPONSE, "chunk size {size}");
        }
    }

    #[test]
    fn zero_length_body_stops_at_header_end() {
        let response = "HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n";
        let mut stream = ChunkedStream::new(response.as_bytes(), 5).no_eof();
        assert_eq!(read_response(&mut stream).unwrap(), response);
    }

    #[test]
    fn bytes_past_declared_length_are_dropped() {
        let response = "HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n";
        let trailing = format!("{response}HTTP/1.1 200 OK\r\n");
        let mut stream = ChunkedStream::new(trailing.as_bytes(), 4096).no_eof();
        assert_eq!(read_response(&mut stream).unwrap(), response);
    }

    #[test]
    fn eof_mid_body_returns_truncated_response() {
        let cut = &JSON_RESPONSE[..JSON_RESPONSE.len() - 10];
        let mut stream = ChunkedStream::new(cut.as_bytes(), 8);
        assert_eq!(read_response(&mut stream).unwrap(), cut);
    }

    #[test]
    fn eof_before_headers_complete() {
        let mut stream = ChunkedStream::new(b"HTTP/1.1 200", 4);
        assert_eq!(read_response(&mut stream).unwrap(), "HTTP/1.1 200");
    }

    #[test]
    fn missing_content_length_reads_until_close() {
        let response = "HTTP/1.1 200 OK\r\nConnection: close\r\n\r\nplain body";
        let mut stream = ChunkedStream::new(response.as_bytes(), 6);
        assert_eq!(read_response(&mut stream).unwrap(), response);
    }

    #[test]
    fn oversized_content_length_reads_until_close() {
        let response = format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\nabc", usize::MAX);
        let mut stream = ChunkedStream::new(response.as_bytes(), 16);
        assert_eq!(read_response(&mut stream).unwrap(), response);
    }

    #[test]
    fn header_end_is_found_once() {
        let mut reader = ResponseReader::new();
        reader.feed(b"HTTP/1.1 200 OK\r\n\r\nbody");
        assert_eq!(reader.state, ReadState::ReadingBody { target: None });
        // A terminator inside the body must not move the boundary.
        reader.feed(b"\r\n\r\nmore");
        assert_eq!(reader.state, ReadState::ReadingBody { target: None });
        assert!(!reader.is_complete());
    }

    #[test]
    fn content_length_in_body_is_ignored() {
        let response = "HTTP/1.1 200 OK\r\n\r\nContent-Length: 3\r\n";
        let mut stream = ChunkedStream::new(response.as_bytes(), 3);
        assert_eq!(read_response(&mut stream).unwrap(), response);
    }

    #[test]
    fn read_error_propagates() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::from(io::ErrorKind::ConnectionReset))
            }
        }
        assert!(matches!(read_response(&mut Broken), Err(ApiError::Io(_))));
    }
}
