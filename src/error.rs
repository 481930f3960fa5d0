//! Errors reported by this library

use alloc::collections::TryReserveError;
use core::fmt;
use core::num::TryFromIntError;
use core::result;

/// Violations of the node nesting rules of the structure block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureError {
    /// `end_node` was called with no open node, or `finish` was called while nodes remained
    /// open.
    UnbalancedNodes,

    /// The builder was already finalized and can no longer be modified.
    Finalized,
}

/// An error describing problems while building a device tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevTreeError {
    InvalidParameter(&'static str),

    /// A header field could not be written at its computed offset.
    InvalidOffset,

    /// The begin/end node calls did not form a well-nested tree.
    Structure(StructureError),

    /// A backing buffer could not grow, or a destination buffer is too small to hold the
    /// device tree.
    NotEnoughMemory,

    /// A length or offset does not fit the 32-bit fields of the device tree format.
    TotalSizeTooLarge,
}

impl From<StructureError> for DevTreeError {
    fn from(e: StructureError) -> DevTreeError {
        DevTreeError::Structure(e)
    }
}

impl From<TryReserveError> for DevTreeError {
    fn from(_: TryReserveError) -> DevTreeError {
        DevTreeError::NotEnoughMemory
    }
}

impl From<TryFromIntError> for DevTreeError {
    fn from(_: TryFromIntError) -> DevTreeError {
        DevTreeError::TotalSizeTooLarge
    }
}

/// The result of a build step.
pub type Result<T> = core::result::Result<T, DevTreeError>;

impl fmt::Display for StructureError {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        match *self {
            StructureError::UnbalancedNodes => write!(f, "Begin and end node calls are unbalanced."),
            StructureError::Finalized => write!(f, "Device tree has already been finalized."),
        }
    }
}

impl fmt::Display for DevTreeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        match *self {
            DevTreeError::InvalidParameter(err) => write!(f, "Invalid paramter supplied: {}", err),
            DevTreeError::InvalidOffset => write!(f, "Invalid offset computed for a header field."),
            DevTreeError::Structure(err) => write!(f, "Malformed device tree structure: {}", err),
            DevTreeError::NotEnoughMemory => write!(f, "Unable to fit device tree into the available memory."),
            DevTreeError::TotalSizeTooLarge => write!(f, "Device tree size does not fit in 32 bits."),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for StructureError {}

#[cfg(feature = "std")]
impl std::error::Error for DevTreeError {}
