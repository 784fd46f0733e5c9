//! Fixed-width little-endian scalar fields.
//!
//! Payloads are flat sequences of the eight supported integer widths.
//! [Scalar] covers one field; [ScalarSeq] covers a declared field list
//! as a tuple, and backs the generic
//! [Message::encode](super::Message::encode) and
//! [Message::decode](super::Message::decode) entry points.

use nom::IResult;

use super::parse::Parse;
use super::serialize::Serializer;

/// One fixed-width integer field, little-endian on the wire.
pub trait Scalar: Sized + Copy {
    /// Encoded width in bytes.
    const WIDTH: usize;

    fn write<S>(&self, ser: &mut S) -> Result<(), S::Error>
    where
        S: Serializer;

    fn parse<I>(input: I) -> IResult<I, Self>
    where
        I: Parse;
}

macro_rules! scalar_impl {
    ($typ:ty, $width:expr, $write:ident, $parse:path) => {
        impl Scalar for $typ {
            const WIDTH: usize = $width;

            fn write<S>(&self, ser: &mut S) -> Result<(), S::Error>
            where
                S: Serializer,
            {
                ser.$write(*self)
            }

            fn parse<I>(input: I) -> IResult<I, Self>
            where
                I: Parse,
            {
                $parse(input)
            }
        }
    };
}

scalar_impl!(u8, 1, write_u8, nom::number::complete::u8);
scalar_impl!(i8, 1, write_i8, nom::number::complete::i8);
scalar_impl!(u16, 2, write_le_u16, nom::number::complete::le_u16);
scalar_impl!(i16, 2, write_le_i16, nom::number::complete::le_i16);
scalar_impl!(u32, 4, write_le_u32, nom::number::complete::le_u32);
scalar_impl!(i32, 4, write_le_i32, nom::number::complete::le_i32);
scalar_impl!(u64, 8, write_le_u64, nom::number::complete::le_u64);
scalar_impl!(i64, 8, write_le_i64, nom::number::complete::le_i64);

/// A declared list of scalar fields, written and read in order.
///
/// Implemented for tuples of up to eight [Scalar] values.
pub trait ScalarSeq: Sized {
    /// Total encoded width of the list, in bytes.
    const WIDTH: usize;

    fn write<S>(&self, ser: &mut S) -> Result<(), S::Error>
    where
        S: Serializer;

    fn parse<I>(input: I) -> IResult<I, Self>
    where
        I: Parse;
}

macro_rules! scalar_seq_impl {
    ($($field:ident),+) => {
        #[allow(non_snake_case)]
        impl<$($field),+> ScalarSeq for ($($field,)+)
        where
            $($field: Scalar),+
        {
            const WIDTH: usize = 0 $(+ $field::WIDTH)+;

            fn write<S>(&self, ser: &mut S) -> Result<(), S::Error>
            where
                S: Serializer,
            {
                let ($($field,)+) = self;
                $($field.write(ser)?;)+
                Ok(())
            }

            fn parse<I>(input: I) -> IResult<I, Self>
            where
                I: Parse,
            {
                $(let (input, $field) = $field::parse(input)?;)+
                Ok((input, ($($field,)+)))
            }
        }
    };
}

scalar_seq_impl!(A);
scalar_seq_impl!(A, B);
scalar_seq_impl!(A, B, C);
scalar_seq_impl!(A, B, C, D);
scalar_seq_impl!(A, B, C, D, E);
scalar_seq_impl!(A, B, C, D, E, F);
scalar_seq_impl!(A, B, C, D, E, F, G);
scalar_seq_impl!(A, B, C, D, E, F, G, H);

/// An error from the scalar payload codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecError {
    /// The payload ends before the requested fields do.
    Truncated { needed: usize, available: usize },
}

#[cfg(feature = "std")]
impl std::error::Error for CodecError {}

impl core::fmt::Display for CodecError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            CodecError::Truncated { needed, available } => write!(
                f,
                "payload too short: {} bytes of fields, {} available",
                needed, available
            ),
        }
    }
}
