use std::io::{ErrorKind, Read};

use super::error::DecodeError;
use super::layout;

/// Sequential, offset-tracking reader over a GNT byte stream.
///
/// Reads never look ahead: every method consumes exactly the bytes of the
/// field it returns (or fewer, when the stream ends early).
pub struct RecordReader<R> {
    inner: R,
    offset: u64,
}

impl<R: Read> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_offset(inner, 0)
    }

    /// Start counting from `offset`, for streams that are already positioned
    /// past earlier records.
    pub fn with_offset(inner: R, offset: u64) -> Self {
        Self { inner, offset }
    }

    /// Bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Fill `buf` until it is full or the stream ends. Returns the number of
    /// bytes read; `Interrupted` reads are retried.
    pub fn fill(&mut self, buf: &mut [u8]) -> Result<usize, DecodeError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => {
                    filled += n;
                    self.offset += n as u64;
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(DecodeError::Io {
                        offset: self.offset,
                        source,
                    });
                }
            }
        }
        Ok(filled)
    }

    /// Read exactly `N` bytes of the record starting at `record_offset`.
    pub fn read_array<const N: usize>(&mut self, record_offset: u64) -> Result<[u8; N], DecodeError> {
        let mut bytes = [0u8; N];
        let actual = self.fill(&mut bytes)?;
        if actual < N {
            return Err(DecodeError::Truncated {
                offset: record_offset,
                needed: N,
                actual,
            });
        }
        Ok(bytes)
    }

    /// Read the record length prefix. `Ok(None)` means the stream ended
    /// cleanly at a record boundary.
    pub fn read_total_length(&mut self) -> Result<Option<u32>, DecodeError> {
        let record_offset = self.offset;
        let mut bytes = [0u8; layout::TOTAL_LENGTH_SIZE];
        match self.fill(&mut bytes)? {
            0 => Ok(None),
            layout::TOTAL_LENGTH_SIZE => Ok(Some(u32::from_le_bytes(bytes))),
            actual => Err(DecodeError::Truncated {
                offset: record_offset,
                needed: layout::TOTAL_LENGTH_SIZE,
                actual,
            }),
        }
    }

    /// Read the two raw label bytes (lead byte first).
    pub fn read_label_bytes(&mut self, record_offset: u64) -> Result<[u8; 2], DecodeError> {
        self.read_array::<{ layout::LABEL_SIZE }>(record_offset)
    }

    pub fn read_u16_le(&mut self, record_offset: u64) -> Result<u16, DecodeError> {
        let bytes = self.read_array::<{ layout::DIMENSION_SIZE }>(record_offset)?;
        Ok(u16::from_le_bytes(bytes))
    }

    /// Read exactly `count` pixel bytes. The buffer grows with the data
    /// actually present, so a corrupt header cannot force a huge allocation.
    pub fn read_pixels(&mut self, count: usize, record_offset: u64) -> Result<Vec<u8>, DecodeError> {
        let mut pixels = Vec::with_capacity(count.min(layout::PIXEL_PREALLOC_LIMIT));
        let result = (&mut self.inner)
            .take(count as u64)
            .read_to_end(&mut pixels);
        // Bytes read before a failure are consumed either way.
        self.offset += pixels.len() as u64;
        let read = result.map_err(|source| DecodeError::Io {
            offset: self.offset,
            source,
        })?;
        if read < count {
            return Err(DecodeError::Truncated {
                offset: record_offset,
                needed: count,
                actual: read,
            });
        }
        Ok(pixels)
    }
}
