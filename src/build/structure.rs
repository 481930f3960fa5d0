use alloc::format;
use alloc::vec::Vec;
use core::convert::TryFrom;
use core::mem::size_of;

use crate::build::prop::Payload;
use crate::error::{DevTreeError, Result, StructureError};
use crate::priv_util::{align_pad_len, VecWrite};
use crate::spec::{fdt_prop_header, FdtTok};

/// The structure block of a device tree under construction.
///
/// An append-only stream of big-endian 32-bit words: tokens interleaved with node names and
/// property values. The stream also tracks how many nodes are currently open.
#[derive(Clone, Debug, Default)]
pub struct DevTreeStructure {
    buf: Vec<u8>,
    depth: usize,
    ended: bool,
    // Set once end_node underflows; the block can never be finished.
    unbalanced: bool,
}

/// Bytes `len` occupies once padded to a u32 boundary.
#[inline]
fn padded(len: usize) -> usize {
    len.saturating_add(align_pad_len(len, size_of::<u32>()))
}

fn check_name(name: &str) -> Result<()> {
    if name.as_bytes().contains(&0) {
        Err(DevTreeError::InvalidParameter("Interior null byte in string"))
    } else {
        Ok(())
    }
}

impl DevTreeStructure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a structure block with room for `words` 32-bit words.
    pub fn with_capacity(words: usize) -> Result<Self> {
        let mut ret = Self::default();
        ret.buf.try_grow(words.saturating_mul(size_of::<u32>()))?;
        Ok(ret)
    }

    #[inline]
    fn check_open(&self) -> Result<()> {
        if self.ended {
            Err(StructureError::Finalized.into())
        } else if self.unbalanced {
            Err(StructureError::UnbalancedNodes.into())
        } else {
            Ok(())
        }
    }

    /// Make room for `bytes` more bytes so the writes that follow cannot fail halfway.
    #[inline]
    pub(crate) fn reserve(&mut self, bytes: usize) -> Result<()> {
        self.check_open()?;
        self.buf.try_grow(bytes)?;
        Ok(())
    }

    pub fn emit_token(&mut self, tok: FdtTok) -> Result<()> {
        self.check_open()?;
        self.buf.write_be_u32(tok.into())?;
        Ok(())
    }

    /// Append `bytes` verbatim, zero padded to a whole number of words. An empty payload still
    /// occupies one zero word.
    pub fn emit_raw_payload(&mut self, bytes: &[u8]) -> Result<()> {
        self.check_open()?;
        if bytes.is_empty() {
            self.buf.write_be_u32(0)?;
        } else {
            self.buf.write_padded(bytes)?;
        }
        Ok(())
    }

    pub fn emit_nop(&mut self) -> Result<()> {
        self.emit_token(FdtTok::Nop)
    }

    pub fn begin_node(&mut self, name: &str) -> Result<()> {
        check_name(name)?;
        self.reserve(size_of::<u32>() + padded(name.len() + 1))?;

        self.buf.write_be_u32(FdtTok::BeginNode.into())?;
        self.buf.extend_from_slice(name.as_bytes());
        self.buf.push(0);
        self.buf.align_to(size_of::<u32>());
        self.depth += 1;
        Ok(())
    }

    /// Begin a node named `<name>@<unit_address>`, the address in lowercase hex.
    pub fn begin_node_at(&mut self, name: &str, unit_address: u64) -> Result<()> {
        self.begin_node(&format!("{}@{:x}", name, unit_address))
    }

    /// Close the innermost open node.
    ///
    /// Closing a node that was never opened fails, and every later call on this block fails
    /// the same way: the tree can no longer be made balanced.
    pub fn end_node(&mut self) -> Result<()> {
        self.check_open()?;
        if self.depth == 0 {
            self.unbalanced = true;
            return Err(StructureError::UnbalancedNodes.into());
        }
        self.buf.write_be_u32(FdtTok::EndNode.into())?;
        self.depth -= 1;
        Ok(())
    }

    /// Append a property record: `PROP`, the unpadded value length, the name offset, then the
    /// value itself.
    pub(crate) fn emit_prop(&mut self, nameoff: u32, value: &Payload) -> Result<()> {
        let len = u32::try_from(value.len())?;
        self.reserve(Self::prop_size(value))?;

        self.buf.write_be_u32(FdtTok::Prop.into())?;
        self.buf.write_be_u32(len)?;
        self.buf.write_be_u32(nameoff)?;
        value.write_to(&mut self.buf)?;
        Ok(())
    }

    /// Bytes a property record with `value` occupies in the structure block.
    pub(crate) fn prop_size(value: &Payload) -> usize {
        size_of::<u32>() + size_of::<fdt_prop_header>() + padded(value.len())
    }

    /// Close the structure block with the `END` token.
    ///
    /// Fails without modifying the block if any node is still open.
    pub(crate) fn finish(&mut self) -> Result<()> {
        self.check_open()?;
        if self.depth != 0 {
            return Err(StructureError::UnbalancedNodes.into());
        }
        self.buf.write_be_u32(FdtTok::End.into())?;
        self.ended = true;
        Ok(())
    }

    /// Undo [`Self::finish`], removing the `END` token again.
    pub(crate) fn unfinish(&mut self) {
        if self.ended {
            self.buf.truncate(self.buf.len() - size_of::<u32>());
            self.ended = false;
        }
    }

    /// Number of currently open nodes.
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    #[inline]
    #[must_use]
    pub fn len_bytes(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(s: &DevTreeStructure) -> Vec<u32> {
        s.as_bytes()
            .chunks(4)
            .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    #[test]
    fn empty_root() {
        let mut s = DevTreeStructure::new();
        s.begin_node("").unwrap();
        assert_eq!(s.depth(), 1);
        s.end_node().unwrap();
        s.finish().unwrap();
        assert_eq!(words(&s), [1, 0, 2, 9]);
        assert_eq!(s.len_bytes(), 16);
    }

    #[test]
    fn unit_address_name() {
        let mut s = DevTreeStructure::new();
        s.begin_node_at("memory", 0x8000_0000).unwrap();
        assert_eq!(&s.as_bytes()[4..], b"memory@80000000\0");

        let mut s = DevTreeStructure::new();
        s.begin_node_at("cpu", 0).unwrap();
        assert_eq!(&s.as_bytes()[4..], b"cpu@0\0\0\0");
    }

    #[test]
    fn name_bytes_are_not_swapped() {
        let mut s = DevTreeStructure::new();
        s.begin_node("soc").unwrap();
        assert_eq!(s.as_bytes(), [0, 0, 0, 1, b's', b'o', b'c', 0]);
    }

    #[test]
    fn raw_payload_padding() {
        let mut s = DevTreeStructure::new();
        s.emit_raw_payload(&[]).unwrap();
        assert_eq!(s.as_bytes(), [0, 0, 0, 0]);
        s.emit_raw_payload(&[0xaa, 0xbb, 0xcc, 0xdd, 0xee]).unwrap();
        assert_eq!(&s.as_bytes()[4..], [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0, 0, 0]);
    }

    #[test]
    fn end_without_begin() {
        let mut s = DevTreeStructure::new();
        let err = Err(DevTreeError::Structure(StructureError::UnbalancedNodes));
        assert_eq!(s.end_node(), err);
        assert_eq!(s.len_bytes(), 0);

        // The block stays unusable.
        assert_eq!(s.begin_node(""), err);
        assert_eq!(s.finish(), err);
        assert_eq!(s.len_bytes(), 0);
        assert!(!s.is_ended());
    }

    #[test]
    fn unfinish_restores_block() {
        let mut s = DevTreeStructure::new();
        s.begin_node("").unwrap();
        s.end_node().unwrap();
        let before = s.as_bytes().to_vec();
        s.finish().unwrap();
        s.unfinish();
        assert!(!s.is_ended());
        assert_eq!(s.as_bytes(), before.as_slice());
        s.finish().unwrap();
        assert_eq!(words(&s), [1, 0, 2, 9]);
    }

    #[test]
    fn finish_with_open_node() {
        let mut s = DevTreeStructure::new();
        s.begin_node("").unwrap();
        let len = s.len_bytes();
        assert_eq!(
            s.finish(),
            Err(DevTreeError::Structure(StructureError::UnbalancedNodes))
        );
        assert_eq!(s.len_bytes(), len);
        assert!(!s.is_ended());
    }

    #[test]
    fn closed_after_finish() {
        let mut s = DevTreeStructure::new();
        s.emit_nop().unwrap();
        s.finish().unwrap();
        assert_eq!(words(&s), [4, 9]);
        let err = Err(DevTreeError::Structure(StructureError::Finalized));
        assert_eq!(s.begin_node("late"), err);
        assert_eq!(s.finish(), err);
    }

    #[test]
    fn interior_null_in_node_name() {
        let mut s = DevTreeStructure::new();
        assert!(s.begin_node("a\0b").is_err());
        assert_eq!(s.depth(), 0);
        assert_eq!(s.len_bytes(), 0);
    }
}
