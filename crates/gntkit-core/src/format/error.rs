use thiserror::Error;

/// Errors returned while decoding GNT records.
///
/// Every variant carries the byte offset within the source at which the
/// problem was detected, so a corpus-level caller can point at the exact
/// record.
///
/// # Examples
/// ```
/// use gntkit_core::DecodeError;
///
/// let err = DecodeError::InvalidDimensions { offset: 14, width: 0, height: 3 };
/// assert!(err.to_string().contains("invalid dimensions"));
/// assert!(err.is_fatal());
/// ```
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("record at offset {offset} truncated: need {needed} bytes, got {actual}")]
    Truncated {
        offset: u64,
        needed: usize,
        actual: usize,
    },
    #[error("invalid GB2312 label {bytes:02x?} at offset {offset}")]
    InvalidLabelEncoding { offset: u64, bytes: [u8; 2] },
    #[error("invalid dimensions {width}x{height} in record at offset {offset}")]
    InvalidDimensions { offset: u64, width: u16, height: u16 },
    #[error("record at offset {offset} declares {declared} bytes, layout implies {expected}")]
    LengthMismatch {
        offset: u64,
        declared: u32,
        expected: u64,
    },
    #[error("I/O error at offset {offset}: {source}")]
    Io {
        offset: u64,
        source: std::io::Error,
    },
}

impl DecodeError {
    /// Byte offset within the source associated with this error.
    pub fn offset(&self) -> u64 {
        match self {
            DecodeError::Truncated { offset, .. }
            | DecodeError::InvalidLabelEncoding { offset, .. }
            | DecodeError::InvalidDimensions { offset, .. }
            | DecodeError::LengthMismatch { offset, .. }
            | DecodeError::Io { offset, .. } => *offset,
        }
    }

    /// `LengthMismatch` is a warning; everything else ends the source.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DecodeError::LengthMismatch { .. })
    }
}

/// Errors returned while re-encoding a sample into the record layout.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("label {label:?} has no GB2312 encoding")]
    UnencodableLabel { label: char },
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u16, height: u16 },
    #[error("pixel buffer holds {actual} bytes, dimensions require {expected}")]
    PixelCountMismatch { expected: usize, actual: usize },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
