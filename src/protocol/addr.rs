//! Node, task, and message identifiers, and their packed wire forms.
//!
//! An [Address] is a `(TaskId, NodeId)` pair packed into 11 bits. A
//! [Header] combines two addresses and a [MessageId] into the 32-bit
//! routing word carried at the front of every frame body.

/// A network node identity. Valid values are 6 bits, `0..=63`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NodeId(u8);

impl NodeId {
    /// The network master.
    pub const MASTER: NodeId = NodeId(0);

    /// The first dynamically assigned node id.
    pub const FIRST_SLAVE: NodeId = NodeId(1);

    /// All-ones id addressing every node on the network.
    pub const NETWORK_BROADCAST: NodeId = NodeId(0x3f);

    /// Create a node id, if the value is in the 6-bit domain.
    pub const fn new(value: u8) -> Option<Self> {
        if value < 0x40 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Create a node id from the low 6 bits of a wire field.
    pub const fn from_masked(value: u8) -> Self {
        Self(value & 0x3f)
    }

    pub const fn value(self) -> u8 {
        self.0
    }
}

/// A logical service within a node. Valid values are 5 bits, `0..=31`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskId(u8);

impl TaskId {
    /// All-ones id addressing every task on a node.
    pub const BROADCAST: TaskId = TaskId(0x1f);

    /// Id of the first application task. Offset base for
    /// [TaskId::from_task_offset].
    const FIRST_TASK: TaskId = TaskId(1);

    /// Create a task id, if the value is in the 5-bit domain.
    pub const fn new(value: u8) -> Option<Self> {
        if value < 0x20 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Create a task id from the low 5 bits of a wire field.
    pub const fn from_masked(value: u8) -> Self {
        Self(value & 0x1f)
    }

    /// Map an application task index to its task id.
    ///
    /// Offsets count up from the first non-reserved id. The caller must
    /// keep the result below [TaskId::BROADCAST].
    pub const fn from_task_offset(offset: u8) -> Self {
        Self(Self::FIRST_TASK.0 + offset)
    }

    pub const fn value(self) -> u8 {
        self.0
    }
}

/// A routable endpoint: a task on a node.
///
/// Packed form is 11 bits, node in the high 6, task in the low 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Address {
    pub task: TaskId,
    pub node: NodeId,
}

impl Address {
    pub const fn new(task: TaskId, node: NodeId) -> Self {
        Self { task, node }
    }

    /// Pack into the 11-bit wire form, `(node << 5) | task`.
    pub const fn pack(self) -> u16 {
        ((self.node.value() as u16) << 5) | self.task.value() as u16
    }

    /// Unpack from the low 11 bits of a wire field.
    pub const fn unpack(raw: u16) -> Self {
        Self {
            task: TaskId::from_masked(raw as u8),
            node: NodeId::from_masked((raw >> 5) as u8),
        }
    }
}

/// A message schema tag. Valid values are 10 bits, `0..=1023`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MessageId(u16);

impl MessageId {
    /// Create a message id, if the value is in the 10-bit domain.
    pub const fn new(value: u16) -> Option<Self> {
        if value < 0x400 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Create a message id from the low 10 bits of a wire field.
    pub const fn from_masked(value: u16) -> Self {
        Self(value & 0x3ff)
    }

    pub const fn value(self) -> u16 {
        self.0
    }
}

/// The 32-bit routing word.
///
/// Bit layout, MSB to LSB: message id in `[31:22]`, destination address
/// in `[21:11]`, source address in `[10:0]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Header {
    pub id: MessageId,
    pub destination: Address,
    pub source: Address,
}

impl Header {
    pub const fn new(id: MessageId, destination: Address, source: Address) -> Self {
        Self {
            id,
            destination,
            source,
        }
    }

    /// Pack into the 32-bit wire word.
    pub const fn pack(self) -> u32 {
        ((self.id.value() as u32) << 22)
            | ((self.destination.pack() as u32) << 11)
            | self.source.pack() as u32
    }

    /// Unpack a 32-bit wire word.
    pub const fn unpack(word: u32) -> Self {
        Self {
            id: MessageId::from_masked((word >> 22) as u16),
            destination: Address::unpack(((word >> 11) & 0x7ff) as u16),
            source: Address::unpack((word & 0x7ff) as u16),
        }
    }
}
