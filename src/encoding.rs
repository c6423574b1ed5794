//! Byte-level decoding helpers
//!
//! Every wire format in this crate is a fixed concatenation of fields, with
//! the occasional length-prefixed blob. The reader tracks how much of the
//! buffer has been consumed so decoders can distinguish truncation from
//! trailing garbage, as the error taxonomy requires.

use crate::error::{ZerocashError, ZerocashResult};

/// Cursor over a byte slice with categorized exhaustion errors.
pub(crate) struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    what: &'static str,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8], what: &'static str) -> Self {
        Self { bytes, pos: 0, what }
    }

    pub fn take(&mut self, len: usize) -> ZerocashResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(ZerocashError::Truncated { what: self.what })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn take_array<const N: usize>(&mut self) -> ZerocashResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn take_u16_be(&mut self) -> ZerocashResult<u16> {
        Ok(u16::from_be_bytes(self.take_array::<2>()?))
    }

    pub fn take_u32_be(&mut self) -> ZerocashResult<u32> {
        Ok(u32::from_be_bytes(self.take_array::<4>()?))
    }

    pub fn take_u64_be(&mut self) -> ZerocashResult<u64> {
        Ok(u64::from_be_bytes(self.take_array::<8>()?))
    }

    /// A blob preceded by its 4-byte big-endian length.
    pub fn take_length_prefixed(&mut self) -> ZerocashResult<Vec<u8>> {
        let len = self.take_u32_be()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    /// Succeeds only when the whole buffer was consumed.
    pub fn finish(self) -> ZerocashResult<()> {
        let extra = self.bytes.len() - self.pos;
        if extra != 0 {
            return Err(ZerocashError::TrailingGarbage { extra });
        }
        Ok(())
    }
}

/// Append a 4-byte big-endian length prefix followed by the blob itself.
pub(crate) fn write_length_prefixed(out: &mut Vec<u8>, blob: &[u8]) {
    debug_assert!(blob.len() <= u32::MAX as usize);
    out.extend_from_slice(&(blob.len() as u32).to_be_bytes());
    out.extend_from_slice(blob);
}
