use std::ops::RangeInclusive;

pub const TOTAL_LENGTH_SIZE: usize = 4;
pub const LABEL_SIZE: usize = 2;
pub const DIMENSION_SIZE: usize = 2;

pub const TOTAL_LENGTH_RANGE: std::ops::Range<usize> = 0..4;
pub const LABEL_RANGE: std::ops::Range<usize> = 4..6;
pub const WIDTH_RANGE: std::ops::Range<usize> = 6..8;
pub const HEIGHT_RANGE: std::ops::Range<usize> = 8..10;
pub const PIXEL_DATA_OFFSET: usize = 10;

/// Fixed header length; `total_length` as written by the dataset tools is
/// `HEADER_LEN + width * height`.
pub const HEADER_LEN: usize = PIXEL_DATA_OFFSET;

pub const GB2312_LEAD_BYTES: RangeInclusive<u8> = 0xA1..=0xF7;
pub const GB2312_TRAIL_BYTES: RangeInclusive<u8> = 0xA1..=0xFE;

/// Assigned GB2312 cells as `(lead bytes, trail bytes)` blocks. Everything
/// else inside the lead/trail box is empty in GB2312, even where GBK has a
/// character.
pub const GB2312_ASSIGNED_CELLS: &[(RangeInclusive<u8>, RangeInclusive<u8>)] = &[
    (0xA1..=0xA1, 0xA1..=0xFE),
    (0xA2..=0xA2, 0xB1..=0xE2),
    (0xA2..=0xA2, 0xE5..=0xEE),
    (0xA2..=0xA2, 0xF1..=0xFC),
    (0xA3..=0xA3, 0xA1..=0xFE),
    (0xA4..=0xA4, 0xA1..=0xF3),
    (0xA5..=0xA5, 0xA1..=0xF6),
    (0xA6..=0xA6, 0xA1..=0xB8),
    (0xA6..=0xA6, 0xC1..=0xD8),
    (0xA7..=0xA7, 0xA1..=0xC1),
    (0xA7..=0xA7, 0xD1..=0xF1),
    (0xA8..=0xA8, 0xA1..=0xBA),
    (0xA8..=0xA8, 0xC5..=0xE9),
    (0xA9..=0xA9, 0xA4..=0xEF),
    (0xB0..=0xD6, 0xA1..=0xFE),
    (0xD7..=0xD7, 0xA1..=0xF9),
    (0xD8..=0xF7, 0xA1..=0xFE),
];

/// Cells where GB2312 and the GBK decoder disagree: GBK turns A1A4 into
/// U+00B7 and A1AA into U+2014.
pub const GB2312_GBK_OVERRIDES: [([u8; 2], char); 2] =
    [([0xA1, 0xA4], '\u{30FB}'), ([0xA1, 0xAA], '\u{2015}')];

/// Whether `[lead, trail]` is an assigned GB2312 cell.
pub fn is_gb2312_cell(lead: u8, trail: u8) -> bool {
    GB2312_ASSIGNED_CELLS
        .iter()
        .any(|(leads, trails)| leads.contains(&lead) && trails.contains(&trail))
}

/// Upper bound on the pixel buffer reserved before any pixel byte is read.
pub const PIXEL_PREALLOC_LIMIT: usize = 64 * 1024;
