use std::io::Write;

use super::error::EncodeError;
use super::label::encode_label;
use super::layout;
use super::parser::{Sample, expected_total_length};

/// Write `sample` in the GNT record layout.
///
/// `total_length` is always written as `10 + width * height`; every other
/// field reproduces the decoded bytes exactly. Returns the number of bytes
/// written.
pub fn encode_record<W: Write>(sample: &Sample, writer: &mut W) -> Result<usize, EncodeError> {
    let header = encode_header(sample)?;
    writer.write_all(&header)?;
    writer.write_all(&sample.pixels)?;
    Ok(header.len() + sample.pixels.len())
}

/// Encode `sample` into a freshly allocated record buffer.
///
/// # Examples
/// ```
/// use gntkit_core::{Sample, format::encode::record_bytes};
///
/// let sample = Sample { label: '啊', width: 1, height: 1, pixels: vec![255] };
/// let bytes = record_bytes(&sample)?;
/// assert_eq!(bytes, vec![11, 0, 0, 0, 0xb0, 0xa1, 1, 0, 1, 0, 255]);
/// # Ok::<(), gntkit_core::format::error::EncodeError>(())
/// ```
pub fn record_bytes(sample: &Sample) -> Result<Vec<u8>, EncodeError> {
    let mut bytes = Vec::with_capacity(layout::HEADER_LEN + sample.pixels.len());
    encode_record(sample, &mut bytes)?;
    Ok(bytes)
}

fn encode_header(sample: &Sample) -> Result<[u8; layout::HEADER_LEN], EncodeError> {
    if sample.width == 0 || sample.height == 0 {
        return Err(EncodeError::InvalidDimensions {
            width: sample.width,
            height: sample.height,
        });
    }
    let expected = sample.pixel_count();
    if sample.pixels.len() != expected {
        return Err(EncodeError::PixelCountMismatch {
            expected,
            actual: sample.pixels.len(),
        });
    }
    let label = encode_label(sample.label).ok_or(EncodeError::UnencodableLabel {
        label: sample.label,
    })?;
    // 10 + 65535 * 65535 still fits in a u32.
    let total_length = expected_total_length(sample.width, sample.height) as u32;

    let mut header = [0u8; layout::HEADER_LEN];
    header[layout::TOTAL_LENGTH_RANGE].copy_from_slice(&total_length.to_le_bytes());
    header[layout::LABEL_RANGE].copy_from_slice(&label);
    header[layout::WIDTH_RANGE].copy_from_slice(&sample.width.to_le_bytes());
    header[layout::HEIGHT_RANGE].copy_from_slice(&sample.height.to_le_bytes());
    Ok(header)
}
