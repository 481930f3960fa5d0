//! Final layout of a device tree blob.
//!
//! The blob is laid out as:
//!
//! ```text
//! +--------------------+ 0
//! | fdt_header         |
//! +--------------------+
//! | zero padding       |  up to an 8 byte boundary
//! +--------------------+ off_mem_rsvmap
//! | fdt_reserve_entry  |  the (0, 0) terminator only
//! +--------------------+ off_dt_struct
//! | structure block    |
//! +--------------------+ off_dt_strings
//! | strings block      |
//! +--------------------+ totalsize
//! ```

use alloc::vec::Vec;
use core::convert::TryFrom;
use core::mem::size_of;

use crate::error::{DevTreeError, Result};
use crate::priv_util::{align_pad_len, SliceRead, SliceWrite, VecWrite};
use crate::spec::{
    fdt_header, fdt_reserve_entry, FDT_BOOT_CPUID_PHYS, FDT_LAST_COMP_VERSION, FDT_MAGIC,
    FDT_RSVMAP_ALIGN, FDT_VERSION,
};

macro_rules! set_be32_field {
    ( $f:ident, $s:ident , $buf:expr, $val:expr ) => {
        $buf.set_be_u32(offset_of!($s, $f), $val)
            .map_err(|_| DevTreeError::InvalidOffset)
    };
}

macro_rules! get_be32_field {
    ( $f:ident, $s:ident , $buf:expr ) => {
        $buf.read_be_u32(offset_of!($s, $f)).unwrap_or_default()
    };
}

/// Byte offsets and sizes of every block of a blob.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Offsets {
    off_mem_rsvmap: u32,
    off_dt_struct: u32,
    off_dt_strings: u32,
    size_dt_struct: u32,
    size_dt_strings: u32,
    totalsize: u32,
}

impl Offsets {
    fn compute(struct_len: usize, strings_len: usize) -> Result<Self> {
        let header = size_of::<fdt_header>();
        let off_mem_rsvmap = header + align_pad_len(header, FDT_RSVMAP_ALIGN);
        let off_dt_struct = off_mem_rsvmap + size_of::<fdt_reserve_entry>();
        let off_dt_strings = off_dt_struct
            .checked_add(struct_len)
            .ok_or(DevTreeError::TotalSizeTooLarge)?;
        let totalsize = off_dt_strings
            .checked_add(strings_len)
            .ok_or(DevTreeError::TotalSizeTooLarge)?;

        Ok(Self {
            off_mem_rsvmap: u32::try_from(off_mem_rsvmap)?,
            off_dt_struct: u32::try_from(off_dt_struct)?,
            off_dt_strings: u32::try_from(off_dt_strings)?,
            size_dt_struct: u32::try_from(struct_len)?,
            size_dt_strings: u32::try_from(strings_len)?,
            totalsize: u32::try_from(totalsize)?,
        })
    }
}

/// Lay out a complete device tree blob from a finished structure block and strings block.
///
/// This is a pure function of its inputs: the same blocks always produce the same bytes.
pub fn layout(structure: &[u8], strings: &[u8]) -> Result<DevTreeBlob> {
    let off = Offsets::compute(structure.len(), strings.len())?;

    let mut buf = Vec::new();
    buf.try_grow(off.totalsize as usize)?;

    // Header space and padding are zero filled, then back-filled below.
    buf.resize(off.off_mem_rsvmap as usize, 0);
    buf.write_be_u64(0)?;
    buf.write_be_u64(0)?;
    buf.extend_from_slice(structure);
    buf.extend_from_slice(strings);
    debug_assert_eq!(buf.len(), off.totalsize as usize);

    let hdr = buf.as_mut_slice();
    set_be32_field!(magic, fdt_header, hdr, FDT_MAGIC)?;
    set_be32_field!(totalsize, fdt_header, hdr, off.totalsize)?;
    set_be32_field!(off_dt_struct, fdt_header, hdr, off.off_dt_struct)?;
    set_be32_field!(off_dt_strings, fdt_header, hdr, off.off_dt_strings)?;
    set_be32_field!(off_mem_rsvmap, fdt_header, hdr, off.off_mem_rsvmap)?;
    set_be32_field!(version, fdt_header, hdr, FDT_VERSION)?;
    set_be32_field!(last_comp_version, fdt_header, hdr, FDT_LAST_COMP_VERSION)?;
    set_be32_field!(boot_cpuid_phys, fdt_header, hdr, FDT_BOOT_CPUID_PHYS)?;
    set_be32_field!(size_dt_strings, fdt_header, hdr, off.size_dt_strings)?;
    set_be32_field!(size_dt_struct, fdt_header, hdr, off.size_dt_struct)?;

    Ok(DevTreeBlob { buf })
}

/// A finished, serialized Flattened Device Tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DevTreeBlob {
    buf: Vec<u8>,
}

impl DevTreeBlob {
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    #[inline]
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Copy the blob to the start of `dest`, returning the number of bytes copied.
    ///
    /// Fails with [`DevTreeError::NotEnoughMemory`] if `dest` is shorter than the blob; nothing
    /// is written in that case.
    pub fn copy_into(&self, dest: &mut [u8]) -> Result<usize> {
        let dest = dest
            .get_mut(..self.buf.len())
            .ok_or(DevTreeError::NotEnoughMemory)?;
        dest.copy_from_slice(&self.buf);
        Ok(self.buf.len())
    }

    /// Returns the magic field of the Device Tree
    #[inline]
    #[must_use]
    pub fn magic(&self) -> u32 {
        get_be32_field!(magic, fdt_header, self.buf)
    }

    /// Returns the totalsize field of the Device Tree. This is the number of bytes of the device
    /// tree structure.
    #[inline]
    #[must_use]
    pub fn totalsize(&self) -> usize {
        get_be32_field!(totalsize, fdt_header, self.buf) as usize
    }

    /// Returns the dt_struct offset field of the Device Tree
    #[inline]
    #[must_use]
    pub fn off_dt_struct(&self) -> usize {
        get_be32_field!(off_dt_struct, fdt_header, self.buf) as usize
    }

    /// Returns the dt_strings offset field of the Device Tree
    #[inline]
    #[must_use]
    pub fn off_dt_strings(&self) -> usize {
        get_be32_field!(off_dt_strings, fdt_header, self.buf) as usize
    }

    /// Returns the rsvmap offset field of the Device Tree
    #[inline]
    #[must_use]
    pub fn off_mem_rsvmap(&self) -> usize {
        get_be32_field!(off_mem_rsvmap, fdt_header, self.buf) as usize
    }

    #[inline]
    #[must_use]
    pub fn version(&self) -> u32 {
        get_be32_field!(version, fdt_header, self.buf)
    }

    #[inline]
    #[must_use]
    pub fn last_comp_version(&self) -> u32 {
        get_be32_field!(last_comp_version, fdt_header, self.buf)
    }

    #[inline]
    #[must_use]
    pub fn boot_cpuid_phys(&self) -> u32 {
        get_be32_field!(boot_cpuid_phys, fdt_header, self.buf)
    }

    #[inline]
    #[must_use]
    pub fn size_dt_strings(&self) -> u32 {
        get_be32_field!(size_dt_strings, fdt_header, self.buf)
    }

    #[inline]
    #[must_use]
    pub fn size_dt_struct(&self) -> u32 {
        get_be32_field!(size_dt_struct, fdt_header, self.buf)
    }
}

impl AsRef<[u8]> for DevTreeBlob {
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}

impl From<DevTreeBlob> for Vec<u8> {
    fn from(blob: DevTreeBlob) -> Vec<u8> {
        blob.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // BEGIN_NODE "" END_NODE END
    const EMPTY_ROOT: [u8; 16] = [0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0, 9];

    #[test]
    fn minimal_blob() {
        let blob = layout(&EMPTY_ROOT, &[]).unwrap();
        assert_eq!(blob.len(), 72);
        assert_eq!(blob.magic(), FDT_MAGIC);
        assert_eq!(blob.totalsize(), 72);
        assert_eq!(blob.off_mem_rsvmap(), 40);
        assert_eq!(blob.off_dt_struct(), 56);
        assert_eq!(blob.off_dt_strings(), 72);
        assert_eq!(blob.size_dt_struct(), 16);
        assert_eq!(blob.size_dt_strings(), 0);
        assert_eq!(blob.version(), 17);
        assert_eq!(blob.last_comp_version(), 16);
        assert_eq!(blob.boot_cpuid_phys(), 0);
        assert_eq!(&blob.as_bytes()[40..56], [0u8; 16]);
        assert_eq!(&blob.as_bytes()[56..], EMPTY_ROOT);
    }

    #[test]
    fn header_is_big_endian() {
        let blob = layout(&EMPTY_ROOT, b"model\0").unwrap();
        assert_eq!(&blob.as_bytes()[..4], [0xd0, 0x0d, 0xfe, 0xed]);
        assert_eq!(&blob.as_bytes()[4..8], [0, 0, 0, 78]);
        assert_eq!(&blob.as_bytes()[72..], b"model\0");
    }

    #[test]
    fn layout_is_pure() {
        let a = layout(&EMPTY_ROOT, b"compatible\0").unwrap();
        let b = layout(&EMPTY_ROOT, b"compatible\0").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rsvmap_is_aligned() {
        let off = Offsets::compute(0, 0).unwrap();
        assert_eq!(off.off_mem_rsvmap as usize % FDT_RSVMAP_ALIGN, 0);
    }

    #[test]
    fn bounded_copy() {
        let blob = layout(&EMPTY_ROOT, &[]).unwrap();
        let mut small = [0u8; 71];
        assert_eq!(blob.copy_into(&mut small), Err(DevTreeError::NotEnoughMemory));
        assert_eq!(small, [0u8; 71]);

        let mut big = [0xffu8; 80];
        assert_eq!(blob.copy_into(&mut big), Ok(72));
        assert_eq!(&big[..72], blob.as_bytes());
        assert_eq!(&big[72..], [0xffu8; 8]);
    }

    #[test]
    fn oversized_blocks() {
        assert_eq!(
            Offsets::compute(u32::MAX as usize, 0),
            Err(DevTreeError::TotalSizeTooLarge)
        );
    }
}
