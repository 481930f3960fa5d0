use alloc::collections::TryReserveError;
use alloc::vec::Vec;
use core::cmp::max;
use core::mem::size_of;

#[derive(Debug, Copy, Clone)]
pub enum SliceWriteError {
    InvalidOffset,
}

pub(crate) type SliceWriteResult<T> = Result<T, SliceWriteError>;

/// Number of zero bytes needed to pad `len` up to a multiple of `align`.
#[inline]
pub(crate) const fn align_pad_len(len: usize, align: usize) -> usize {
    (align - len % align) % align
}

/// Append-only writes into a growable buffer.
///
/// Every write grows the buffer by at least half its current capacity when it is full, so a
/// sequence of appends costs amortized O(1) each. Growth goes through `try_reserve_exact`;
/// an allocation failure is reported instead of aborting.
pub(crate) trait VecWrite {
    fn try_grow(&mut self, additional: usize) -> Result<(), TryReserveError>;
    fn write_be_u32(&mut self, val: u32) -> Result<(), TryReserveError>;
    fn write_be_u64(&mut self, val: u64) -> Result<(), TryReserveError>;
    fn write_padded(&mut self, data: &[u8]) -> Result<(), TryReserveError>;
    fn align_to(&mut self, align: usize);
}

impl VecWrite for Vec<u8> {
    fn try_grow(&mut self, additional: usize) -> Result<(), TryReserveError> {
        let needed = self.len().saturating_add(additional);
        if needed <= self.capacity() {
            return Ok(());
        }
        let target = max(needed, self.capacity() + self.capacity() / 2);
        self.try_reserve_exact(target - self.len())
    }

    #[inline]
    fn write_be_u32(&mut self, val: u32) -> Result<(), TryReserveError> {
        self.try_grow(size_of::<u32>())?;
        self.extend_from_slice(&val.to_be_bytes());
        Ok(())
    }

    #[inline]
    fn write_be_u64(&mut self, val: u64) -> Result<(), TryReserveError> {
        self.try_grow(size_of::<u64>())?;
        self.extend_from_slice(&val.to_be_bytes());
        Ok(())
    }

    /// Copies `data` byte for byte and zero pads it to the next u32 boundary.
    fn write_padded(&mut self, data: &[u8]) -> Result<(), TryReserveError> {
        let pad = align_pad_len(data.len(), size_of::<u32>());
        self.try_grow(data.len().saturating_add(pad))?;
        self.extend_from_slice(data);
        self.resize(self.len() + pad, 0);
        Ok(())
    }

    /// Zero pads the buffer to a multiple of `align`. Callers reserve the room beforehand.
    #[inline]
    fn align_to(&mut self, align: usize) {
        let pad = align_pad_len(self.len(), align);
        self.resize(self.len() + pad, 0);
    }
}

/// Back-fills fixed size fields of an already laid out buffer.
pub(crate) trait SliceWrite {
    fn set_be_u32(&mut self, pos: usize, val: u32) -> SliceWriteResult<()>;
}

impl SliceWrite for [u8] {
    #[inline]
    fn set_be_u32(&mut self, pos: usize, val: u32) -> SliceWriteResult<()> {
        match self.get_mut(pos..pos + size_of::<u32>()) {
            Some(field) => {
                field.copy_from_slice(&val.to_be_bytes());
                Ok(())
            }
            None => Err(SliceWriteError::InvalidOffset),
        }
    }
}

pub(crate) trait SliceRead {
    fn read_be_u32(&self, pos: usize) -> Option<u32>;
}

impl SliceRead for [u8] {
    #[inline]
    fn read_be_u32(&self, pos: usize) -> Option<u32> {
        let field = self.get(pos..pos + size_of::<u32>())?;
        let mut word = [0u8; size_of::<u32>()];
        word.copy_from_slice(field);
        Some(u32::from_be_bytes(word))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_len() {
        assert_eq!(align_pad_len(0, 4), 0);
        assert_eq!(align_pad_len(1, 4), 3);
        assert_eq!(align_pad_len(4, 4), 0);
        assert_eq!(align_pad_len(40, 8), 0);
        assert_eq!(align_pad_len(41, 8), 7);
    }

    #[test]
    fn grows_by_half() {
        let mut buf: Vec<u8> = Vec::with_capacity(8);
        buf.resize(8, 0);
        buf.try_grow(1).unwrap();
        assert!(buf.capacity() >= 12);
    }

    #[test]
    fn growth_failure_reported() {
        let mut buf: Vec<u8> = Vec::new();
        buf.push(1);
        assert!(buf.try_grow(usize::MAX).is_err());
        assert_eq!(buf, [1]);
    }

    #[test]
    fn padded_write_keeps_byte_order() {
        let mut buf = Vec::new();
        buf.write_padded(b"abcde").unwrap();
        assert_eq!(buf, b"abcde\0\0\0");
    }

    #[test]
    fn back_fill_out_of_range() {
        let mut buf = [0u8; 6];
        assert!(buf.set_be_u32(4, 1).is_err());
        buf.set_be_u32(2, 0x0102_0304).unwrap();
        assert_eq!(buf, [0, 0, 1, 2, 3, 4]);
        assert_eq!(buf.read_be_u32(2), Some(0x0102_0304));
        assert_eq!(buf.read_be_u32(3), None);
    }
}
