//! Decoder for the chunked transfer coding.
//!
//! A chunked body is a sequence of `<hex size>[;ext]\r\n<data>\r\n` chunks
//! closed by a zero sized chunk, optional trailer lines and an empty line.
//! Size and trailer lines go through a [`LineReader`], data is handed out as
//! it arrives without waiting for the whole chunk.

use std::cmp;

use crate::codec::line::LineReader;
use crate::ensure;
use crate::protocol::{ParseError, PayloadItem};
use bytes::{Bytes, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;
use ChunkedState::*;

/// Upper bound of a chunk size line and of the whole trailer block.
const MAX_LINE_SIZE: usize = 4 * 1024;

#[derive(Debug, Clone)]
pub struct ChunkedDecoder {
    state: ChunkedState,
    line_reader: LineReader,
    remaining_size: u64,
    received_size: u64,
    max_size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    AwaitingSize,
    ReadingChunkData,
    AwaitingDataCrlf,
    AwaitingFinalTrailer,
    Done,
}

impl ChunkedDecoder {
    /// A decoder that fails once more than `max_size` body bytes were
    /// announced.
    pub fn new(max_size: u64) -> Self {
        Self { state: AwaitingSize, line_reader: LineReader::new(MAX_LINE_SIZE), remaining_size: 0, received_size: 0, max_size }
    }

    pub fn is_done(&self) -> bool {
        self.state == Done
    }

    fn read_line(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>, ParseError> {
        self.line_reader.read_line(src).map_err(|e| match self.state {
            AwaitingSize => ParseError::invalid_chunk_size(e),
            _ => ParseError::invalid_body(e),
        })
    }
}

impl Decoder for ChunkedDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.state {
                AwaitingSize => {
                    let Some(line) = self.read_line(src)? else {
                        return Ok(None);
                    };
                    self.line_reader.reset();

                    let size = parse_chunk_size(&line)?;
                    trace!(size, "read chunk size");
                    if size == 0 {
                        self.state = AwaitingFinalTrailer;
                        continue;
                    }

                    let total = self.received_size.saturating_add(size);
                    ensure!(total <= self.max_size, ParseError::body_too_large(total, self.max_size));
                    self.received_size = total;
                    self.remaining_size = size;
                    self.state = ReadingChunkData;
                }

                ReadingChunkData => {
                    if src.is_empty() {
                        return Ok(None);
                    }

                    let len = cmp::min(self.remaining_size, src.len() as u64) as usize;
                    let bytes = src.split_to(len).freeze();
                    self.remaining_size -= len as u64;
                    if self.remaining_size == 0 {
                        self.state = AwaitingDataCrlf;
                    }
                    return Ok(Some(PayloadItem::Chunk(bytes)));
                }

                AwaitingDataCrlf => {
                    let Some(line) = self.read_line(src)? else {
                        return Ok(None);
                    };
                    self.line_reader.reset();

                    ensure!(line.is_empty(), ParseError::invalid_body("chunk data is not followed by CRLF"));
                    self.state = AwaitingSize;
                }

                AwaitingFinalTrailer => {
                    let Some(line) = self.read_line(src)? else {
                        return Ok(None);
                    };

                    if line.trim_ascii().is_empty() {
                        self.line_reader.reset();
                        self.state = Done;
                        return Ok(Some(PayloadItem::Eof));
                    }
                    trace!(trailer = ?line, "skip trailer line");
                }

                Done => return Ok(Some(PayloadItem::Eof)),
            }
        }
    }
}

/// Parses the hex size of a chunk size line, ignoring any extension.
fn parse_chunk_size(line: &[u8]) -> Result<u64, ParseError> {
    let size = match line.iter().position(|b| *b == b';') {
        Some(i) => &line[..i],
        None => line,
    }
    .trim_ascii();

    ensure!(!size.is_empty(), ParseError::invalid_chunk_size("empty chunk size"));
    ensure!(
        size.iter().all(u8::is_ascii_hexdigit),
        ParseError::invalid_chunk_size(format!("{:?} is not hex", String::from_utf8_lossy(size)))
    );

    // all bytes are ascii hex digits here
    let size = std::str::from_utf8(size).map_err(ParseError::invalid_chunk_size)?;
    u64::from_str_radix(size, 16).map_err(|e| ParseError::invalid_chunk_size(format!("{size}: {e}")))
}
