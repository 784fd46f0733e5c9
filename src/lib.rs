#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod protocol;

pub use protocol::addr::{Address, Header, MessageId, NodeId, TaskId};
pub use protocol::{FrameResult, Message, MessageParse, MessageSerialize, Parse};
