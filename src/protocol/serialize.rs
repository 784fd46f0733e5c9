use super::addr::MessageId;
use super::crc::{CrcDigest, CrcStyle};
use super::parse::Parse;

/// A sink for the little-endian scalar fields and raw bytes that make
/// up frames and payloads.
pub trait Serializer {
    type Error;

    fn write_u8(&mut self, val: u8) -> Result<(), Self::Error>;

    // everything else can be written in terms of write_u8
    // (although they probably should be specialized in some impls)

    fn write_i8(&mut self, val: i8) -> Result<(), Self::Error> {
        self.write_u8(val as u8)
    }

    fn write_bytes(&mut self, val: &[u8]) -> Result<(), Self::Error> {
        for b in val.iter() {
            self.write_u8(*b)?;
        }
        Ok(())
    }

    // this one is tricky. if this becomes a bottleneck, split out a
    // new trait that can be implemented one-by-one on special-case I
    fn write_slice<I>(&mut self, val: &I) -> Result<(), Self::Error>
    where
        I: Parse,
    {
        for b in val.iter_elements() {
            self.write_u8(b)?;
        }
        Ok(())
    }

    fn write_le_u16(&mut self, val: u16) -> Result<(), Self::Error> {
        self.write_bytes(&[(val & 0xff) as u8, (val >> 8) as u8])
    }

    fn write_le_i16(&mut self, val: i16) -> Result<(), Self::Error> {
        self.write_le_u16(val as u16)
    }

    fn write_le_u32(&mut self, val: u32) -> Result<(), Self::Error> {
        self.write_bytes(&[
            (val & 0xff) as u8,
            ((val >> 8) & 0xff) as u8,
            ((val >> 16) & 0xff) as u8,
            ((val >> 24) & 0xff) as u8,
        ])
    }

    fn write_le_i32(&mut self, val: i32) -> Result<(), Self::Error> {
        self.write_le_u32(val as u32)
    }

    fn write_le_u64(&mut self, val: u64) -> Result<(), Self::Error> {
        self.write_le_u32((val & 0xffff_ffff) as u32)?;
        self.write_le_u32((val >> 32) as u32)
    }

    fn write_le_i64(&mut self, val: i64) -> Result<(), Self::Error> {
        self.write_le_u64(val as u64)
    }
}

impl<S> Serializer for &mut S
where
    S: Serializer,
{
    type Error = S::Error;

    fn write_u8(&mut self, val: u8) -> Result<(), Self::Error> {
        (*self).write_u8(val)
    }

    fn write_i8(&mut self, val: i8) -> Result<(), Self::Error> {
        (*self).write_i8(val)
    }

    fn write_bytes(&mut self, val: &[u8]) -> Result<(), Self::Error> {
        (*self).write_bytes(val)
    }

    fn write_le_u16(&mut self, val: u16) -> Result<(), Self::Error> {
        (*self).write_le_u16(val)
    }

    fn write_le_i16(&mut self, val: i16) -> Result<(), Self::Error> {
        (*self).write_le_i16(val)
    }

    fn write_le_u32(&mut self, val: u32) -> Result<(), Self::Error> {
        (*self).write_le_u32(val)
    }

    fn write_le_i32(&mut self, val: i32) -> Result<(), Self::Error> {
        (*self).write_le_i32(val)
    }

    fn write_le_u64(&mut self, val: u64) -> Result<(), Self::Error> {
        (*self).write_le_u64(val)
    }

    fn write_le_i64(&mut self, val: i64) -> Result<(), Self::Error> {
        (*self).write_le_i64(val)
    }
}

/// Wrap an std::io::Write to become a Serializer
#[cfg(feature = "std")]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SerializerWrap<T> {
    inner: T,
}

#[cfg(feature = "std")]
impl<T> SerializerWrap<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn done(self) -> T {
        self.inner
    }
}

#[cfg(feature = "std")]
impl<T> Serializer for SerializerWrap<T>
where
    T: std::io::Write,
{
    type Error = std::io::Error;

    fn write_u8(&mut self, val: u8) -> Result<(), Self::Error> {
        self.inner.write_all(&[val])
    }

    fn write_bytes(&mut self, val: &[u8]) -> Result<(), Self::Error> {
        self.inner.write_all(val)
    }
}

/// An infallible serializer collecting into a byte vector.
#[cfg(feature = "alloc")]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SerializerVec {
    data: alloc::vec::Vec<u8>,
}

#[cfg(feature = "alloc")]
impl SerializerVec {
    pub fn new() -> Self {
        Self {
            data: alloc::vec::Vec::new(),
        }
    }

    pub fn done(self) -> alloc::vec::Vec<u8> {
        self.data
    }
}

#[cfg(feature = "alloc")]
impl Serializer for SerializerVec {
    type Error = void::Void;

    fn write_u8(&mut self, val: u8) -> Result<(), Self::Error> {
        self.data.push(val);
        Ok(())
    }

    fn write_bytes(&mut self, val: &[u8]) -> Result<(), Self::Error> {
        self.data.extend_from_slice(val);
        Ok(())
    }
}

/// A serializer that also computes a CRC on the side.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SerializerCrc<'a, C, T>
where
    C: CrcStyle + 'a,
{
    digest: C::Digest<'a>,
    inner: T,
}

impl<'a, C, T> SerializerCrc<'a, C, T>
where
    C: CrcStyle + 'a,
{
    pub fn new(crc: &'a C, inner: T) -> Self {
        Self {
            digest: crc.digest(),
            inner,
        }
    }

    pub fn finalize(self) -> (u32, T) {
        (self.digest.finalize(), self.inner)
    }
}

impl<'a, C, T> Serializer for SerializerCrc<'a, C, T>
where
    C: CrcStyle + 'a,
    T: Serializer,
{
    type Error = T::Error;

    fn write_u8(&mut self, val: u8) -> Result<(), Self::Error> {
        self.digest.update(&[val]);
        self.inner.write_u8(val)
    }

    fn write_bytes(&mut self, val: &[u8]) -> Result<(), Self::Error> {
        self.digest.update(val);
        self.inner.write_bytes(val)
    }
}

/// A trait for typed message schemas that can serialize their payload.
pub trait MessageSerialize {
    /// The message id for this schema.
    fn message_id(&self) -> MessageId;

    /// Serialize just the payload fields.
    ///
    /// For this to work correctly, it *must* perform the same actions
    /// every time it is called with the same message. That means no
    /// IO, no funny business.
    fn message_body<S>(&self, ser: &mut S) -> Result<(), S::Error>
    where
        S: Serializer;

    /// Build a routable [Message](super::Message) with an owned payload.
    ///
    /// Addresses default to the local master endpoint; set them before
    /// framing.
    #[cfg(feature = "alloc")]
    fn to_message(&self) -> super::Message<alloc::vec::Vec<u8>> {
        use void::ResultVoidExt;

        let mut ser = SerializerVec::new();
        self.message_body(&mut ser).void_unwrap();
        super::Message::new(self.message_id(), ser.done())
    }
}
