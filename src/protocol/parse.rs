use core::ops::Range;

use nom::error::Error;

use super::addr::MessageId;
use super::crc::{CrcDigest, CrcStyle};
use super::{CRC_LEN, ETX, HEADER_LEN, STX};

/// A helpful short name for a whole bundle of useful parser traits,
/// plus iterating over slice chunks.
pub trait Parse:
    nom::InputTakeAtPosition<Item = u8>
    + nom::Compare<&'static [u8]>
    + nom::InputLength
    + nom::InputTake
    + nom::InputIter<Item = u8>
    + nom::Slice<core::ops::Range<usize>>
    + nom::Slice<core::ops::RangeFrom<usize>>
    + nom::Slice<core::ops::RangeFull>
    + nom::Slice<core::ops::RangeTo<usize>>
    + Clone
    + PartialEq
{
    /// Iterate over chunks of byte slices.
    ///
    /// Used to speed up CRC digests and round-trip writes.
    fn iter_slices(&self) -> impl Iterator<Item = &[u8]>;
}

impl<'a> Parse for &'a [u8] {
    fn iter_slices(&self) -> impl Iterator<Item = &[u8]> {
        core::iter::once(*self)
    }
}

/// Read one byte at an index, if the input is long enough.
fn byte_at<I>(input: &I, index: usize) -> Option<u8>
where
    I: Parse,
{
    if index < input.input_len() {
        input.slice(index..).iter_elements().next()
    } else {
        None
    }
}

/// Helper to grab a le u32 out of an enumerated byte iterator.
fn read_le_u32(iter: &mut impl Iterator<Item = (usize, u8)>) -> Option<u32> {
    Some(
        (iter.next()?.1 as u32)
            | ((iter.next()?.1 as u32) << 8)
            | ((iter.next()?.1 as u32) << 16)
            | ((iter.next()?.1 as u32) << 24),
    )
}

/// Check one STX candidate against the length, CRC, and terminator
/// rules. Returns one past the frame's ETX on success.
fn check_candidate<C, I>(crc: &C, input: &I, stx: usize) -> Option<usize>
where
    C: CrcStyle,
    I: Parse,
{
    let total = input.input_len();

    // LEN counts header, payload, and CRC
    let len = byte_at(input, stx + 1)? as usize;
    if len < HEADER_LEN + CRC_LEN {
        return None;
    }

    // STX, LEN, `len` counted bytes, ETX
    let end = stx + 2 + len + 1;
    if end > total {
        return None;
    }

    // the CRC covers LEN, header, and payload
    let crc_field = stx + 2 + len - CRC_LEN;
    let mut digest = crc.digest();
    for chunk in input.slice(stx + 1..crc_field).iter_slices() {
        digest.update(chunk);
    }
    let calculated = digest.finalize();

    let provided = read_le_u32(&mut input.slice(crc_field..).iter_indices())?;
    if !crc.validate(calculated, provided) {
        return None;
    }

    if byte_at(input, stx + 2 + len)? != ETX {
        return None;
    }

    Some(end)
}

/// Find a frame with a valid length, CRC, and terminator, tolerating
/// arbitrary garbage before and between candidates.
///
/// Every failed candidate resumes the STX search one byte past the
/// candidate's STX, so a false start never masks a later real frame.
/// Returns the range of the whole frame and the body slice (header and
/// payload, without the CRC), or None if the buffer holds no frame.
pub fn frame_raw<C, I>(crc: &C, input: I) -> Option<(Range<usize>, I)>
where
    C: CrcStyle,
    I: Parse,
{
    let total = input.input_len();
    let mut search = 0;

    while search < total {
        let stx = search + input.slice(search..).position(|b| b == STX)?;

        if let Some(end) = check_candidate(crc, &input, stx) {
            let len = byte_at(&input, stx + 1)? as usize;
            let body = input.slice(stx + 2..stx + 2 + len - CRC_LEN);
            return Some((stx..end, body));
        }

        search = stx + 1;
    }

    None
}

/// A trait for parseable typed message schemas.
pub trait MessageParse<I>: Sized
where
    I: Parse,
{
    /// Parse the payload of a message, given the message id.
    ///
    /// The parser fails if the id does not belong to this schema.
    fn parse_body(id: MessageId) -> impl nom::Parser<I, Self, Error<I>>;

    /// Parse a typed schema out of a decoded message's payload.
    ///
    /// The whole payload must belong to the schema; a wrong id or
    /// leftover bytes are a parse error, distinct from frame
    /// invalidity.
    fn parse_message(message: &super::Message<I>) -> Result<Self, nom::Err<Error<I>>> {
        use nom::Parser;

        let mut parser = nom::combinator::all_consuming(Self::parse_body(message.id()));
        parser
            .parse(message.payload().clone())
            .map(|(_, parsed)| parsed)
    }
}
