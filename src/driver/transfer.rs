//! Transfer vocabulary: direction, addresses and sequence numbers.

use crate::internal::register::{CMD_READ, CMD_WRITE};

/// Direction of a transfer, named from the host's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Device memory → host memory (a "read" of the device)
    FromDevice,
    /// Host memory → device memory (a "write" to the device)
    ToDevice,
}

impl Direction {
    /// Both directions, read first
    pub const ALL: [Direction; 2] = [Direction::FromDevice, Direction::ToDevice];

    /// Doorbell value that starts a transfer in this direction
    #[inline(always)]
    pub const fn opcode(self) -> u64 {
        match self {
            Direction::FromDevice => CMD_READ,
            Direction::ToDevice => CMD_WRITE,
        }
    }

    /// Short name from the device's perspective
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::FromDevice => "read",
            Direction::ToDevice => "write",
        }
    }

    #[inline(always)]
    pub(crate) const fn index(self) -> usize {
        match self {
            Direction::FromDevice => 0,
            Direction::ToDevice => 1,
        }
    }
}

/// An address in the device's (FPGA-side) bus space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceAddress(pub u64);

impl From<u64> for DeviceAddress {
    fn from(addr: u64) -> Self {
        Self(addr)
    }
}

/// A host-side bus address the device can master.
///
/// Producing one from a user buffer (pinning, IOMMU mapping) is the job of
/// the caller's address-resolution layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusAddress(pub u64);

impl BusAddress {
    /// Use a pointer's integer value as the bus address.
    ///
    /// Only meaningful on platforms where host physical and bus addresses
    /// are identity-mapped for the buffer in question.
    #[inline]
    pub fn from_ptr<T>(ptr: *const T) -> Self {
        Self(ptr as usize as u64)
    }
}

impl From<u64> for BusAddress {
    fn from(addr: u64) -> Self {
        Self(addr)
    }
}

/// Completion point of an issued transfer.
///
/// The transfer is finished once the completion counter of its direction is
/// greater than or equal to this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SequenceNumber(u64);

impl SequenceNumber {
    /// Wrap a raw counter target
    #[inline(always)]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw counter target
    #[inline(always)]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Whether a completion count satisfies this sequence number
    #[inline(always)]
    pub const fn is_reached_by(self, completed: u64) -> bool {
        completed >= self.0
    }
}

impl From<SequenceNumber> for u64 {
    fn from(seq: SequenceNumber) -> Self {
        seq.0
    }
}
