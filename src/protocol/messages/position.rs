//! Typed messages published by the position task.

use nom::error::Error;
use nom::Parser;

use crate::protocol::addr::MessageId;
use crate::protocol::parse::{MessageParse, Parse};
use crate::protocol::serialize::{MessageSerialize, Serializer};

use super::MessageType;

/// How a position sample was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PositionType {
    /// No usable reading, e.g. before the axis is homed.
    Invalid = 0,
    /// Read back from the encoder.
    Measured = 1,
    /// Derived from the commanded step count.
    Commanded = 2,
}

impl PositionType {
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Invalid),
            1 => Some(Self::Measured),
            2 => Some(Self::Commanded),
            _ => None,
        }
    }

    pub const fn raw(self) -> u8 {
        self as u8
    }
}

/// A position sample from one stepper axis, with any raw driver
/// samples appended.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PositionMeasurement<I> {
    /// Seconds since boot when the sample was taken.
    pub timestamp: u32,
    /// Stepper axis the sample belongs to.
    pub axis: u8,
    pub kind: PositionType,
    /// Measured position, in half-steps.
    pub position: i16,
    /// Commanded position at sample time.
    pub target: i16,
    /// Raw samples appended by the driver.
    pub samples: I,
}

impl<I> MessageType for PositionMeasurement<I> {
    const ID: MessageId = MessageId::from_masked(0x012);
}

impl<I> PositionMeasurement<I> {
    pub fn map<F, J>(self, f: F) -> PositionMeasurement<J>
    where
        F: FnOnce(I) -> J,
    {
        PositionMeasurement {
            timestamp: self.timestamp,
            axis: self.axis,
            kind: self.kind,
            position: self.position,
            target: self.target,
            samples: f(self.samples),
        }
    }

    pub fn map_ref<'a, F, J>(&'a self, f: F) -> PositionMeasurement<J>
    where
        F: FnOnce(&'a I) -> J,
    {
        PositionMeasurement {
            timestamp: self.timestamp,
            axis: self.axis,
            kind: self.kind,
            position: self.position,
            target: self.target,
            samples: f(&self.samples),
        }
    }

    #[cfg(feature = "alloc")]
    pub fn to_owned(&self) -> PositionMeasurement<I::Owned>
    where
        I: alloc::borrow::ToOwned,
    {
        self.map_ref(I::to_owned)
    }

    pub fn borrow<Borrowed: ?Sized>(&self) -> PositionMeasurement<&Borrowed>
    where
        I: core::borrow::Borrow<Borrowed>,
    {
        self.map_ref(I::borrow)
    }
}

impl<I> MessageSerialize for PositionMeasurement<I>
where
    I: Parse,
{
    fn message_id(&self) -> MessageId {
        Self::ID
    }

    fn message_body<S>(&self, ser: &mut S) -> Result<(), S::Error>
    where
        S: Serializer,
    {
        ser.write_le_u32(self.timestamp)?;
        ser.write_u8(self.axis)?;
        ser.write_u8(self.kind.raw())?;
        ser.write_le_i16(self.position)?;
        ser.write_le_i16(self.target)?;
        ser.write_slice(&self.samples)
    }
}

impl<I> MessageParse<I> for PositionMeasurement<I>
where
    I: Parse,
{
    fn parse_body(id: MessageId) -> impl Parser<I, Self, Error<I>> {
        move |input| {
            let input = if id != Self::ID {
                nom::combinator::fail::<_, (), _>(input)?.0
            } else {
                input
            };

            let (input, timestamp) = nom::number::complete::le_u32(input)?;
            let (input, axis) = nom::number::complete::u8(input)?;

            let (input, raw_kind) = nom::number::complete::u8(input)?;
            let Some(kind) = PositionType::from_raw(raw_kind) else {
                return nom::combinator::fail(input);
            };

            let (input, position) = nom::number::complete::le_i16(input)?;
            let (input, target) = nom::number::complete::le_i16(input)?;
            let (input, samples) = nom::bytes::complete::take_till(|_| false)(input)?;

            Ok((
                input,
                PositionMeasurement {
                    timestamp,
                    axis,
                    kind,
                    position,
                    target,
                    samples,
                },
            ))
        }
    }
}
