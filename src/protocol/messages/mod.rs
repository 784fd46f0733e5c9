//! The message entity and the typed schemas built on it.

use core::ops::Range;

use nom::IResult;

use crate::protocol::addr::{Address, Header, MessageId};
use crate::protocol::crc::CrcStyle;
use crate::protocol::parse::{self, Parse};
use crate::protocol::scalar::{CodecError, ScalarSeq};
use crate::protocol::serialize::{Serializer, SerializerCrc};
use crate::protocol::{CRC_LEN, ETX, HEADER_LEN, MAX_PAYLOAD_LEN, STX};

pub mod position;
pub use position::{PositionMeasurement, PositionType};

/// A trait for schemas with statically-known message ids.
pub trait MessageType {
    const ID: MessageId;
}

/// The unit of inter-node communication: a message id, source and
/// destination addresses, and a payload.
///
/// Generic over the payload representation, so decoding can borrow the
/// incoming buffer (`I = &[u8]`) and construction can own its bytes
/// (`I = Vec<u8>`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Message<I> {
    id: MessageId,
    source: Address,
    destination: Address,
    payload: I,
}

impl<I> Message<I> {
    /// Create a message. Both addresses default to task 0 on the
    /// master node; set them before framing.
    pub fn new(id: MessageId, payload: I) -> Self {
        Self {
            id,
            source: Address::default(),
            destination: Address::default(),
            payload,
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn source_address(&self) -> Address {
        self.source
    }

    pub fn destination_address(&self) -> Address {
        self.destination
    }

    pub fn set_source_address(&mut self, address: Address) {
        self.source = address;
    }

    pub fn set_destination_address(&mut self, address: Address) {
        self.destination = address;
    }

    pub fn payload(&self) -> &I {
        &self.payload
    }

    pub fn set_payload(&mut self, payload: I) {
        self.payload = payload;
    }

    /// The routing word for this message.
    pub fn header(&self) -> Header {
        Header::new(self.id, self.destination, self.source)
    }

    pub fn map<F, J>(self, f: F) -> Message<J>
    where
        F: FnOnce(I) -> J,
    {
        Message {
            id: self.id,
            source: self.source,
            destination: self.destination,
            payload: f(self.payload),
        }
    }

    pub fn map_ref<'a, F, J>(&'a self, f: F) -> Message<J>
    where
        F: FnOnce(&'a I) -> J,
    {
        Message {
            id: self.id,
            source: self.source,
            destination: self.destination,
            payload: f(&self.payload),
        }
    }

    #[cfg(feature = "alloc")]
    pub fn to_owned(&self) -> Message<I::Owned>
    where
        I: alloc::borrow::ToOwned,
    {
        self.map_ref(I::to_owned)
    }

    pub fn borrow<Borrowed: ?Sized>(&self) -> Message<&Borrowed>
    where
        I: core::borrow::Borrow<Borrowed>,
    {
        self.map_ref(I::borrow)
    }
}

impl<I> Message<I>
where
    I: Parse,
{
    /// Logical content length: the header word plus the payload. The
    /// wire LEN byte counts this plus the CRC field.
    pub fn length(&self) -> usize {
        HEADER_LEN + self.payload.input_len()
    }

    /// Serialize into a full frame: STX, LEN, header, payload, CRC,
    /// ETX.
    ///
    /// The payload must fit the one-byte length field
    /// ([MAX_PAYLOAD_LEN]); larger payloads are a caller error.
    pub fn frame<C, S>(&self, crc: &C, ser: &mut S) -> Result<(), S::Error>
    where
        C: CrcStyle,
        S: Serializer,
    {
        debug_assert!(self.payload.input_len() <= MAX_PAYLOAD_LEN);
        let len = (self.length() + CRC_LEN) as u8;

        ser.write_u8(STX)?;

        // the CRC covers LEN, header, and payload
        let mut crc_ser = SerializerCrc::new(crc, &mut *ser);
        crc_ser.write_u8(len)?;
        crc_ser.write_le_u32(self.header().pack())?;
        crc_ser.write_slice(&self.payload)?;
        let (crc_value, _) = crc_ser.finalize();

        ser.write_le_u32(crc_value)?;
        ser.write_u8(ETX)
    }

    /// Serialize into a full frame in a fresh byte vector.
    #[cfg(feature = "alloc")]
    pub fn network_bytes<C>(&self, crc: &C) -> alloc::vec::Vec<u8>
    where
        C: CrcStyle,
    {
        use void::ResultVoidExt;

        let mut ser = crate::protocol::serialize::SerializerVec::new();
        self.frame(crc, &mut ser).void_unwrap();
        ser.done()
    }

    /// Parse a frame body: the header word followed by the payload.
    pub fn parse_body(input: I) -> IResult<I, Self> {
        let (input, word) = nom::number::complete::le_u32(input)?;
        let header = Header::unpack(word);
        let (input, payload) = nom::bytes::complete::take_till(|_| false)(input)?;

        Ok((
            input,
            Message {
                id: header.id,
                source: header.source,
                destination: header.destination,
                payload,
            },
        ))
    }

    /// Reconstruct a message from a raw byte stream, resynchronizing
    /// past any leading or interleaved garbage.
    ///
    /// All malformed-frame conditions collapse into
    /// [FrameResult::Invalid]; this never panics on any input.
    pub fn convert_network_bytes<C>(crc: &C, input: I) -> FrameResult<I>
    where
        C: CrcStyle,
    {
        match parse::frame_raw(crc, input) {
            Some((range, body)) => match Self::parse_body(body) {
                Ok((_, message)) => FrameResult::Ok(range, message),
                // unreachable: the scanner guarantees a full header
                Err(_) => FrameResult::Invalid,
            },
            None => FrameResult::Invalid,
        }
    }

    /// Re-read the payload as a declared list of scalar fields, in
    /// order.
    ///
    /// Fails if the payload is shorter than the summed field widths;
    /// never reads past the payload bound. Trailing payload bytes are
    /// left unread.
    pub fn decode<T>(&self) -> Result<T, CodecError>
    where
        T: ScalarSeq,
    {
        let available = self.payload.input_len();
        if available < T::WIDTH {
            return Err(CodecError::Truncated {
                needed: T::WIDTH,
                available,
            });
        }

        match T::parse(self.payload.clone()) {
            Ok((_, fields)) => Ok(fields),
            Err(_) => Err(CodecError::Truncated {
                needed: T::WIDTH,
                available,
            }),
        }
    }
}

#[cfg(feature = "alloc")]
impl Message<alloc::vec::Vec<u8>> {
    /// Build a message whose payload is the concatenation of the given
    /// scalar fields, written in order.
    pub fn encode<T>(id: MessageId, fields: T) -> Self
    where
        T: ScalarSeq,
    {
        use void::ResultVoidExt;

        let mut ser = crate::protocol::serialize::SerializerVec::new();
        fields.write(&mut ser).void_unwrap();
        Self::new(id, ser.done())
    }

    /// Logical content length: the header word plus the payload. The
    /// wire LEN byte counts this plus the CRC field.
    pub fn length(&self) -> usize {
        self.borrow::<[u8]>().length()
    }

    /// Serialize into a full frame in a fresh byte vector.
    pub fn network_bytes<C>(&self, crc: &C) -> alloc::vec::Vec<u8>
    where
        C: CrcStyle,
    {
        self.borrow::<[u8]>().network_bytes(crc)
    }
}

/// The result of scanning a byte buffer for a message frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FrameResult<I> {
    /// A frame was found and decoded; the range locates it in the
    /// scanned buffer.
    Ok(Range<usize>, Message<I>),
    /// No structurally valid frame with a matching checksum anywhere.
    Invalid,
}

impl<I> FrameResult<I> {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Ok(_, _))
    }

    pub fn ok(self) -> Option<Message<I>> {
        match self {
            Self::Ok(_, message) => Some(message),
            Self::Invalid => None,
        }
    }

    pub fn range(&self) -> Option<&Range<usize>> {
        match self {
            Self::Ok(range, _) => Some(range),
            Self::Invalid => None,
        }
    }
}

#[cfg(test)]
#[cfg(feature = "alloc")]
mod test {
    use alloc::vec::Vec;

    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    use crate::protocol::addr::{NodeId, TaskId};
    use crate::protocol::crc::{Crc32Hdlc, CrcDigest, CrcStyle};

    use super::*;

    impl Arbitrary for Message<Vec<u8>> {
        fn arbitrary(g: &mut Gen) -> Self {
            let mut payload = Vec::<u8>::arbitrary(g);
            payload.truncate(MAX_PAYLOAD_LEN);

            let mut message = Message::new(MessageId::arbitrary(g), payload);
            message.set_source_address(Address::arbitrary(g));
            message.set_destination_address(Address::arbitrary(g));
            message
        }
    }

    pub(super) fn wire_roundtrip(message: &Message<Vec<u8>>) -> bool {
        let crc = Crc32Hdlc::new();
        let bytes = message.network_bytes(&crc);

        match Message::convert_network_bytes(&crc, bytes.as_slice()) {
            FrameResult::Ok(range, decoded) => {
                range == (0..bytes.len()) && decoded == message.borrow::<[u8]>()
            }
            FrameResult::Invalid => false,
        }
    }

    fn test_message() -> Message<Vec<u8>> {
        let payload = (1u8..=10).collect::<Vec<u8>>();
        let mut message = Message::new(MessageId::from_masked(0x123), payload);
        message.set_source_address(Address::new(
            TaskId::from_task_offset(0),
            NodeId::FIRST_SLAVE,
        ));
        message.set_destination_address(Address::new(
            TaskId::BROADCAST,
            NodeId::NETWORK_BROADCAST,
        ));
        message
    }

    #[test]
    fn network_bytes_layout() {
        let crc = Crc32Hdlc::new();
        let message = test_message();
        let bytes = message.network_bytes(&crc);

        // STX, LEN, header, 10 payload bytes, CRC, ETX
        assert_eq!(bytes.len(), 21);
        assert_eq!(message.length(), 14);
        assert_eq!(bytes[0], STX);
        assert_eq!(bytes[1] as usize, bytes.len() - 3);
        assert_eq!(
            u32::from_le_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]),
            message.header().pack()
        );
        assert_eq!(&bytes[6..16], &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);

        let mut digest = crc.digest();
        digest.update(&bytes[1..16]);
        assert_eq!(
            u32::from_le_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]),
            digest.finalize()
        );

        assert_eq!(bytes[20], ETX);
    }

    #[test]
    fn convert_network_bytes_roundtrip() {
        assert!(wire_roundtrip(&test_message()));
    }

    #[test]
    fn convert_with_leading_garbage() {
        let crc = Crc32Hdlc::new();
        let message = test_message();

        // a false STX with a plausible length byte, then the frame
        let mut bytes = alloc::vec![STX, 0x12, 0xab, 0xcd];
        let frame = message.network_bytes(&crc);
        bytes.extend_from_slice(&frame);

        match Message::convert_network_bytes(&crc, bytes.as_slice()) {
            FrameResult::Ok(range, decoded) => {
                assert_eq!(range, 4..bytes.len());
                assert_eq!(decoded, message.borrow::<[u8]>());
            }
            FrameResult::Invalid => panic!("expected a valid frame"),
        }
    }

    #[test]
    fn corrupt_payload_detected() {
        let crc = Crc32Hdlc::new();
        let message = test_message();
        let bytes = message.network_bytes(&crc);

        for i in 6..16 {
            let mut corrupted = bytes.clone();
            corrupted[i] ^= 0xff;
            assert!(
                !Message::convert_network_bytes(&crc, corrupted.as_slice()).is_valid(),
                "flip of payload byte {} went undetected",
                i
            );
        }
    }

    #[test]
    fn garbage_rejected() {
        let crc = Crc32Hdlc::new();
        let mut bytes = test_message().network_bytes(&crc);
        bytes[0] = 0xff;
        assert!(!Message::convert_network_bytes(&crc, bytes.as_slice()).is_valid());
    }

    #[test]
    fn truncation_rejected() {
        let crc = Crc32Hdlc::new();
        let bytes = test_message().network_bytes(&crc);

        for cut in 0..bytes.len() {
            assert!(
                !Message::convert_network_bytes(&crc, &bytes[..cut]).is_valid(),
                "prefix of {} bytes decoded as valid",
                cut
            );
        }
    }

    #[test]
    fn corrupt_frame_then_valid_frame() {
        let crc = Crc32Hdlc::new();
        let message = test_message();

        let mut corrupted = message.network_bytes(&crc);
        corrupted[8] ^= 0xff;
        let offset = corrupted.len();
        corrupted.extend_from_slice(&message.network_bytes(&crc));

        match Message::convert_network_bytes(&crc, corrupted.as_slice()) {
            FrameResult::Ok(range, decoded) => {
                assert_eq!(range, offset..corrupted.len());
                assert_eq!(decoded, message.borrow::<[u8]>());
            }
            FrameResult::Invalid => panic!("expected resync onto the second frame"),
        }
    }

    #[test]
    fn encode_concatenates_fields() {
        let message = Message::encode(
            MessageId::from_masked(0x0aa),
            (1u8, 0x0302u16, 0x07060504u32, -2i16, -3i32),
        );
        assert_eq!(
            message.payload().as_slice(),
            &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0xfe, 0xff, 0xfd, 0xff, 0xff, 0xff]
        );
    }

    #[test]
    fn decode_recovers_fields() {
        let raw: &[u8] = &[
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0xfe, 0xff, 0xfd, 0xff, 0xff, 0xff,
        ];
        let message = Message::new(MessageId::from_masked(0x0aa), raw);

        let (a, b, c, d, e) = message.decode::<(u8, u16, u32, i16, i32)>().unwrap();
        assert_eq!(a, 0x01);
        assert_eq!(b, 0x0302);
        assert_eq!(c, 0x07060504);
        assert_eq!(d, -2);
        assert_eq!(e, -3);
    }

    #[test]
    fn decode_short_payload_fails() {
        let raw: &[u8] = &[0x01, 0x02, 0x03];
        let message = Message::new(MessageId::from_masked(0x0aa), raw);

        assert_eq!(
            message.decode::<(u32,)>(),
            Err(CodecError::Truncated {
                needed: 4,
                available: 3
            })
        );
    }

    #[test]
    fn decode_leaves_trailing_bytes() {
        let raw: &[u8] = &[0x01, 0x02, 0x03];
        let message = Message::new(MessageId::from_masked(0x0aa), raw);

        assert_eq!(message.decode::<(u16,)>(), Ok((0x0201u16,)));
    }

    #[test]
    fn equality_is_component_wise() {
        let a = test_message();
        let mut b = a.clone();
        assert_eq!(a, b);

        b.set_source_address(Address::default());
        assert_ne!(a, b);

        let mut c = a.clone();
        c.set_payload(alloc::vec![0xff]);
        assert_ne!(a, c);
    }

    #[quickcheck]
    fn roundtrip_arbitrary(message: Message<Vec<u8>>) -> bool {
        wire_roundtrip(&message)
    }

    #[quickcheck]
    fn resync_past_arbitrary_garbage(garbage: Vec<u8>, message: Message<Vec<u8>>) -> bool {
        let crc = Crc32Hdlc::new();

        let mut bytes = garbage;
        bytes.extend_from_slice(&message.network_bytes(&crc));

        match Message::convert_network_bytes(&crc, bytes.as_slice()) {
            FrameResult::Ok(_, decoded) => decoded == message.borrow::<[u8]>(),
            FrameResult::Invalid => false,
        }
    }
}
