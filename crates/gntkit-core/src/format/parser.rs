use std::io::Read;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::{DecodeError, EncodeError};
use super::label::decode_label;
use super::layout;
use super::reader::RecordReader;

/// One handwritten character: its label and an 8-bit grayscale raster.
///
/// # Examples
/// ```
/// use gntkit_core::Sample;
///
/// let sample = Sample {
///     label: '中',
///     width: 2,
///     height: 2,
///     pixels: vec![1, 2, 3, 4],
/// };
/// assert_eq!(sample.pixel(1, 1), Some(4));
/// assert_eq!(sample.row(0), Some(&[1u8, 2][..]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub label: char,
    pub width: u16,
    pub height: u16,
    /// Row-major, stride `width`, no padding.
    pub pixels: Vec<u8>,
}

impl Sample {
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn pixel(&self, x: u16, y: u16) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = y as usize * self.width as usize + x as usize;
        self.pixels.get(index).copied()
    }

    pub fn row(&self, y: u16) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.width as usize;
        self.pixels.get(start..start + self.width as usize)
    }

    /// Record length the dataset tools write for this sample.
    pub fn expected_total_length(&self) -> u64 {
        expected_total_length(self.width, self.height)
    }

    /// Encode this sample as one GNT record.
    pub fn to_record_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        super::encode::record_bytes(self)
    }
}

pub(crate) fn expected_total_length(width: u16, height: u16) -> u64 {
    layout::HEADER_LEN as u64 + width as u64 * height as u64
}

/// How the declared `total_length` prefix is treated.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthCheck {
    /// The prefix is read and discarded.
    #[default]
    Ignore,
    /// A prefix that disagrees with the header is logged and kept as a warning.
    Warn,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderOptions {
    pub length_check: LengthCheck,
}

pub(crate) struct DecodedRecord {
    pub offset: u64,
    pub declared_length: u32,
    pub sample: Sample,
}

/// Decode the next record from `source`.
///
/// Returns `Ok(None)` when the source is exhausted at a record boundary.
/// Offsets in errors are relative to the position of `source` when this
/// function was called; use [`RecordDecoder`] for offsets across a whole
/// member.
///
/// # Examples
/// ```
/// use std::io::Cursor;
///
/// use gntkit_core::decode_next;
///
/// let bytes = [
///     0x0c, 0x00, 0x00, 0x00, 0xb0, 0xa1, 0x02, 0x00, 0x02, 0x00, 1, 2, 3, 4,
/// ];
/// let mut source = Cursor::new(bytes);
/// let sample = decode_next(&mut source)?.expect("one record");
/// assert_eq!(sample.label, '啊');
/// assert_eq!(sample.pixels, vec![1, 2, 3, 4]);
/// assert!(decode_next(&mut source)?.is_none());
/// # Ok::<(), gntkit_core::DecodeError>(())
/// ```
pub fn decode_next<R: Read>(source: &mut R) -> Result<Option<Sample>, DecodeError> {
    let mut reader = RecordReader::new(source);
    Ok(decode_record(&mut reader)?.map(|record| record.sample))
}

pub(crate) fn decode_record<R: Read>(
    reader: &mut RecordReader<R>,
) -> Result<Option<DecodedRecord>, DecodeError> {
    let offset = reader.offset();
    let Some(declared_length) = reader.read_total_length()? else {
        return Ok(None);
    };

    let label_offset = reader.offset();
    let label_bytes = reader.read_label_bytes(offset)?;
    let label = decode_label(label_bytes).ok_or(DecodeError::InvalidLabelEncoding {
        offset: label_offset,
        bytes: label_bytes,
    })?;

    let width = reader.read_u16_le(offset)?;
    let height = reader.read_u16_le(offset)?;
    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidDimensions {
            offset,
            width,
            height,
        });
    }

    let pixel_count = (width as usize)
        .checked_mul(height as usize)
        .ok_or(DecodeError::InvalidDimensions {
            offset,
            width,
            height,
        })?;
    let pixels = reader.read_pixels(pixel_count, offset)?;

    Ok(Some(DecodedRecord {
        offset,
        declared_length,
        sample: Sample {
            label,
            width,
            height,
            pixels,
        },
    }))
}

/// Stateful decoder over one GNT member.
///
/// Tracks the absolute byte offset, applies [`DecoderOptions`], and keeps
/// non-fatal length warnings. Used as an iterator it yields samples until the
/// member ends or the first error, then fuses.
pub struct RecordDecoder<R> {
    reader: RecordReader<R>,
    options: DecoderOptions,
    warnings: Vec<DecodeError>,
    finished: bool,
}

impl<R: Read> RecordDecoder<R> {
    pub fn new(inner: R) -> Self {
        Self::with_options(inner, DecoderOptions::default())
    }

    pub fn with_options(inner: R, options: DecoderOptions) -> Self {
        Self {
            reader: RecordReader::new(inner),
            options,
            warnings: Vec::new(),
            finished: false,
        }
    }

    /// Bytes consumed from the member so far.
    pub fn offset(&self) -> u64 {
        self.reader.offset()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn warnings(&self) -> &[DecodeError] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<DecodeError> {
        std::mem::take(&mut self.warnings)
    }

    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }

    pub fn decode_next(&mut self) -> Result<Option<Sample>, DecodeError> {
        if self.finished {
            return Ok(None);
        }
        let record = match decode_record(&mut self.reader) {
            Ok(Some(record)) => record,
            Ok(None) => {
                self.finished = true;
                return Ok(None);
            }
            Err(err) => {
                self.finished = true;
                return Err(err);
            }
        };
        self.check_length(&record);
        Ok(Some(record.sample))
    }

    fn check_length(&mut self, record: &DecodedRecord) {
        if self.options.length_check != LengthCheck::Warn {
            return;
        }
        let expected = record.sample.expected_total_length();
        if record.declared_length as u64 != expected {
            let warning = DecodeError::LengthMismatch {
                offset: record.offset,
                declared: record.declared_length,
                expected,
            };
            warn!("{warning}");
            self.warnings.push(warning);
        }
    }
}

impl<R: Read> Iterator for RecordDecoder<R> {
    type Item = Result<Sample, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.decode_next().transpose()
    }
}

impl<R: Read> std::iter::FusedIterator for RecordDecoder<R> {}
