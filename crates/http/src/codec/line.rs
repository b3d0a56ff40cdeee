//! Bounded line splitting over a read buffer.
//!
//! Both the request head and the chunk size lines of a chunked body are line
//! oriented. [`LineReader`] hands out complete lines only, and refuses to let
//! the bytes it has seen grow past a ceiling, so a peer that never sends a
//! line terminator cannot make the buffer grow without bound.

use bytes::{Bytes, BytesMut};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LineError {
    #[error("line size {size} exceed the limit {limit}")]
    TooLong { size: usize, limit: usize },
}

/// Splits `\n` terminated lines off a buffer, counting every byte it hands
/// out (terminators included) against a cumulative limit.
///
/// A trailing `\r` is stripped together with the `\n`.
#[derive(Debug, Clone)]
pub struct LineReader {
    limit: usize,
    consumed: usize,
}

impl LineReader {
    pub fn new(limit: usize) -> Self {
        Self { limit, consumed: 0 }
    }

    /// Returns the next line without its terminator, or `Ok(None)` when the
    /// buffer holds no complete line yet.
    ///
    /// The limit is checked before anything is split off, so on error the
    /// buffer is left untouched.
    pub fn read_line(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>, LineError> {
        let Some(pos) = src.iter().position(|b| *b == b'\n') else {
            let size = self.consumed + src.len();
            if size > self.limit {
                return Err(LineError::TooLong { size, limit: self.limit });
            }
            return Ok(None);
        };

        let size = self.consumed + pos + 1;
        if size > self.limit {
            return Err(LineError::TooLong { size, limit: self.limit });
        }
        self.consumed = size;

        let mut line = src.split_to(pos + 1);
        line.truncate(pos);
        if line.last() == Some(&b'\r') {
            line.truncate(pos - 1);
        }
        Ok(Some(line.freeze()))
    }

    /// Bytes handed out since the last reset.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Starts a new cumulative count, for the next header block.
    pub fn reset(&mut self) {
        self.consumed = 0;
    }
}
