//! The inter-node link protocol: addressing, framing, and payload codecs.

/// Start-of-frame delimiter.
pub const STX: u8 = 0x1e;
/// End-of-frame delimiter.
pub const ETX: u8 = 0x1f;

/// Size of the packed routing header on the wire.
pub const HEADER_LEN: usize = 4;
/// Size of the CRC field on the wire.
pub const CRC_LEN: usize = 4;

/// Largest payload that still fits the one-byte length field.
pub const MAX_PAYLOAD_LEN: usize = 246;

/// Largest possible frame: STX, LEN, 255 counted bytes, ETX.
pub const MAX_FRAME_LEN: usize = 255 + 3;

pub mod addr;

pub mod crc;

pub mod parse;
pub use parse::{MessageParse, Parse};

pub mod scalar;
pub use scalar::{CodecError, Scalar, ScalarSeq};

pub mod serialize;
pub use serialize::MessageSerialize;

mod messages;
pub use messages::*;

/// Scan a byte buffer for a message frame, skipping any leading or
/// interleaved garbage.
///
/// Every failed frame candidate (bad length, bad CRC, bad terminator)
/// resumes the search one byte past the candidate's STX. If no valid
/// frame exists anywhere in the buffer, the result is
/// [FrameResult::Invalid].
pub fn parse<C, I>(crc: &C, input: I) -> FrameResult<I>
where
    C: crc::CrcStyle,
    I: Parse,
{
    Message::convert_network_bytes(crc, input)
}

/// Serialize a message into a full frame, with length, CRC, and
/// start/end delimiters.
#[cfg(feature = "std")]
pub fn serialize<C, W, I>(crc: &C, writer: &mut W, message: &Message<I>) -> std::io::Result<()>
where
    C: crc::CrcStyle,
    W: std::io::Write,
    I: Parse,
{
    let mut ser = serialize::SerializerWrap::new(writer);
    message.frame(crc, &mut ser)
}
