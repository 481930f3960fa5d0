use alloc::collections::TryReserveError;
use alloc::vec::Vec;
use core::convert::TryFrom;
use core::mem::size_of;

use crate::build::{DevTreeStrings, DevTreeStructure};
use crate::error::{DevTreeError, Result};
use crate::priv_util::VecWrite;
use crate::spec::Phandle;

/// A property value as it will be laid out in the structure block.
pub(crate) enum Payload<'a> {
    Bytes(&'a [u8]),
    Str(&'a str),
    StrList(&'a [&'a str]),
    U32s(&'a [u32]),
    U64s(&'a [u64]),
}

impl<'a> Payload<'a> {
    /// Unpadded length of the value in bytes.
    pub(crate) fn len(&self) -> usize {
        match *self {
            Payload::Bytes(b) => b.len(),
            Payload::Str(s) => s.len() + 1,
            Payload::StrList(list) => list.iter().map(|s| s.len() + 1).sum(),
            Payload::U32s(v) => v.len() * size_of::<u32>(),
            Payload::U64s(v) => v.len() * size_of::<u64>(),
        }
    }

    fn check(&self) -> Result<()> {
        let has_nul = match *self {
            Payload::Str(s) => s.as_bytes().contains(&0),
            Payload::StrList(list) => list.iter().any(|s| s.as_bytes().contains(&0)),
            _ => false,
        };
        if has_nul {
            Err(DevTreeError::InvalidParameter("Interior null byte in string"))
        } else {
            Ok(())
        }
    }

    /// Copies the value into `buf`, zero padded to a u32 boundary.
    ///
    /// Byte values are copied verbatim. Integer cells are converted to big-endian.
    pub(crate) fn write_to(&self, buf: &mut Vec<u8>) -> core::result::Result<(), TryReserveError> {
        match *self {
            Payload::Bytes(b) => buf.write_padded(b)?,
            Payload::Str(s) => {
                buf.extend_from_slice(s.as_bytes());
                buf.push(0);
            }
            Payload::StrList(list) => {
                for s in list {
                    buf.extend_from_slice(s.as_bytes());
                    buf.push(0);
                }
            }
            Payload::U32s(cells) => {
                for cell in cells {
                    buf.write_be_u32(*cell)?;
                }
            }
            // High word first.
            Payload::U64s(cells) => {
                for cell in cells {
                    buf.write_be_u64(*cell)?;
                }
            }
        }
        buf.align_to(size_of::<u32>());
        Ok(())
    }
}

fn write_prop<W: PropWriter + ?Sized>(writer: &mut W, name: &str, value: Payload<'_>) -> Result<()> {
    // Lengths are 32-bit on disk. Checked before anything is reserved or interned.
    u32::try_from(value.len())?;
    value.check()?;
    let (structure, strings) = writer.blocks_mut()?;
    // Reserve before interning the name so a failed write leaves both blocks untouched.
    structure.reserve(DevTreeStructure::prop_size(&value))?;
    let nameoff = strings.intern(name)?;
    structure.emit_prop(nameoff, &value)
}

/// Property encoders for a device tree under construction.
///
/// Every property is written as a `PROP` token, the unpadded value length, the offset of the
/// property name in the strings block, then the value padded to a whole number of words.
///
/// Implementors only provide access to their structure and strings blocks; all encoders are
/// provided methods.
pub trait PropWriter {
    /// Returns the blocks properties are written into, or an error if they can no longer be
    /// modified.
    #[doc(hidden)]
    fn blocks_mut(&mut self) -> Result<(&mut DevTreeStructure, &mut DevTreeStrings)>;

    /// Write a property whose value is an opaque byte string, copied as is.
    fn prop_raw(&mut self, name: &str, value: &[u8]) -> Result<()> {
        write_prop(self, name, Payload::Bytes(value))
    }

    /// Write a single big-endian [`u32`] cell.
    fn prop_u32(&mut self, name: &str, value: u32) -> Result<()> {
        write_prop(self, name, Payload::U32s(&[value]))
    }

    fn prop_u32_array(&mut self, name: &str, values: &[u32]) -> Result<()> {
        write_prop(self, name, Payload::U32s(values))
    }

    /// Write a [`u64`] as two big-endian cells, high word first.
    fn prop_u64(&mut self, name: &str, value: u64) -> Result<()> {
        write_prop(self, name, Payload::U64s(&[value]))
    }

    /// Write a `(base, size)` pair as four cells, e.g. a `reg` range with two address and two
    /// size cells.
    fn prop_u64_pair(&mut self, name: &str, base: u64, size: u64) -> Result<()> {
        write_prop(self, name, Payload::U64s(&[base, size]))
    }

    fn prop_u64_array(&mut self, name: &str, values: &[u64]) -> Result<()> {
        write_prop(self, name, Payload::U64s(values))
    }

    /// Write a null terminated string.
    fn prop_string(&mut self, name: &str, value: &str) -> Result<()> {
        write_prop(self, name, Payload::Str(value))
    }

    /// Write a list of strings, each null terminated, as a single value.
    fn prop_string_list(&mut self, name: &str, values: &[&str]) -> Result<()> {
        write_prop(self, name, Payload::StrList(values))
    }

    /// Write an empty property. Its presence alone is the value, e.g. `interrupt-controller`.
    fn prop_flag(&mut self, name: &str) -> Result<()> {
        write_prop(self, name, Payload::Bytes(&[]))
    }

    /// Write the `phandle` property other nodes use to reference this node.
    fn prop_phandle(&mut self, phandle: Phandle) -> Result<()> {
        self.prop_u32("phandle", phandle)
    }
}
