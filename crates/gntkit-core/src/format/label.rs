use encoding_rs::GBK;

use super::layout;

/// Decode a GB2312 double-byte code into its character.
///
/// The pair must be an assigned GB2312 cell (see
/// [`layout::GB2312_ASSIGNED_CELLS`]). GBK fills many of the empty cells and
/// maps two symbols differently, so those are checked before the GBK decoder
/// runs. No replacement character is ever produced.
///
/// # Examples
/// ```
/// use gntkit_core::format::label::decode_label;
///
/// assert_eq!(decode_label([0xb0, 0xa1]), Some('啊'));
/// assert_eq!(decode_label([0xa1, 0xa4]), Some('\u{30fb}'));
/// assert_eq!(decode_label([0xa2, 0xa1]), None);
/// assert_eq!(decode_label([0x41, 0x42]), None);
/// ```
pub fn decode_label(bytes: [u8; 2]) -> Option<char> {
    let [lead, trail] = bytes;
    if !layout::is_gb2312_cell(lead, trail) {
        return None;
    }
    if let Some(&(_, label)) = layout::GB2312_GBK_OVERRIDES
        .iter()
        .find(|(pair, _)| *pair == bytes)
    {
        return Some(label);
    }

    let text = GBK.decode_without_bom_handling_and_without_replacement(&bytes)?;
    let mut chars = text.chars();
    let label = chars.next()?;
    if chars.next().is_some() || is_private_use(label) {
        return None;
    }
    Some(label)
}

/// Encode a character back into its GB2312 double-byte code.
///
/// # Examples
/// ```
/// use gntkit_core::format::label::encode_label;
///
/// assert_eq!(encode_label('啊'), Some([0xb0, 0xa1]));
/// assert_eq!(encode_label('A'), None);
/// ```
pub fn encode_label(label: char) -> Option<[u8; 2]> {
    if let Some(&(pair, _)) = layout::GB2312_GBK_OVERRIDES
        .iter()
        .find(|(_, mapped)| *mapped == label)
    {
        return Some(pair);
    }
    let mut buf = [0u8; 4];
    let text = label.encode_utf8(&mut buf);
    let (bytes, _, had_errors) = GBK.encode(text);
    if had_errors {
        return None;
    }
    match *bytes {
        [lead, trail] => {
            let pair = [lead, trail];
            (decode_label(pair) == Some(label)).then_some(pair)
        }
        _ => None,
    }
}

fn is_private_use(c: char) -> bool {
    matches!(c, '\u{E000}'..='\u{F8FF}')
}
