use alloc::vec::Vec;
use core::convert::TryFrom;

use crate::error::{DevTreeError, Result};
use crate::priv_util::VecWrite;

/// The strings block of a device tree under construction.
///
/// Holds every property name as a null terminated string. Names are deduplicated on insert: a
/// name that already occurs in the block, either as a whole string or as the tail of a longer
/// one, reuses that storage.
#[derive(Clone, Debug, Default)]
pub struct DevTreeStrings {
    buf: Vec<u8>,
}

impl DevTreeStrings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a strings block with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let mut buf = Vec::new();
        buf.try_grow(capacity)?;
        Ok(Self { buf })
    }

    /// Returns the offset of `name` within the strings block, appending it if it is not already
    /// present.
    ///
    /// A stored occurrence only matches if it is immediately followed by a null byte, so the
    /// returned offset always reads back as exactly `name`.
    pub fn intern(&mut self, name: &str) -> Result<u32> {
        let name = name.as_bytes();
        if name.contains(&0) {
            return Err(DevTreeError::InvalidParameter("Interior null byte in string"));
        }

        if let Some(off) = self.find(name) {
            return Ok(u32::try_from(off)?);
        }

        let off = u32::try_from(self.buf.len())?;
        self.buf.try_grow(name.len() + 1)?;
        self.buf.extend_from_slice(name);
        self.buf.push(0);
        Ok(off)
    }

    fn find(&self, name: &[u8]) -> Option<usize> {
        let len = name.len();
        self.buf
            .windows(len + 1)
            .position(|w| w[len] == 0 && &w[..len] == name)
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

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_names_share_offset() {
        let mut strings = DevTreeStrings::new();
        let first = strings.intern("compatible").unwrap();
        let len = strings.len();
        let second = strings.intern("compatible").unwrap();
        assert_eq!(first, second);
        assert_eq!(strings.len(), len);
        assert_eq!(len, "compatible".len() + 1);
    }

    #[test]
    fn suffix_reuses_tail() {
        let mut strings = DevTreeStrings::new();
        assert_eq!(strings.intern("#address-cells").unwrap(), 0);
        assert_eq!(strings.intern("cells").unwrap(), 9);
        assert_eq!(strings.len(), "#address-cells".len() + 1);
    }

    #[test]
    fn unterminated_run_is_not_reused() {
        let mut strings = DevTreeStrings::new();
        strings.intern("interrupt-controller").unwrap();
        // "interrupt" occurs in the block but is followed by '-', not a null byte.
        let off = strings.intern("interrupt").unwrap();
        assert_eq!(off as usize, "interrupt-controller".len() + 1);
        assert_eq!(&strings.as_bytes()[off as usize..], b"interrupt\0");
    }

    #[test]
    fn empty_name() {
        let mut strings = DevTreeStrings::new();
        assert_eq!(strings.intern("").unwrap(), 0);
        assert_eq!(strings.as_bytes(), b"\0");
        strings.intern("model").unwrap();
        assert_eq!(strings.intern("").unwrap(), 0);
    }

    #[test]
    fn interior_null_rejected() {
        let mut strings = DevTreeStrings::new();
        assert_eq!(
            strings.intern("bad\0name"),
            Err(DevTreeError::InvalidParameter("Interior null byte in string"))
        );
        assert!(strings.is_empty());
    }
}
