use crate::error::{CodecError, CodecResult};
use crate::format::padding_for;

/// Bounded read position over a borrowed buffer.
///
/// The cursor owns only its position. Every read is bounds-checked and fails
/// with [`CodecError::BufferUnderrun`] instead of returning short data.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.pos == self.buf.len()
    }

    /// Read one byte and advance by one.
    #[inline]
    pub fn read_byte(&mut self) -> CodecResult<u8> {
        let byte = *self.buf.get(self.pos).ok_or_else(|| self.underrun(1))?;
        self.pos += 1;
        Ok(byte)
    }

    /// Borrow the next `count` bytes and advance past them.
    pub fn read_bytes(&mut self, count: usize) -> CodecResult<&'a [u8]> {
        if count > self.remaining() {
            return Err(self.underrun(count));
        }
        let buf: &'a [u8] = self.buf;
        let out = &buf[self.pos..self.pos + count];
        self.pos += count;
        Ok(out)
    }

    /// Skip to the next multiple of `align`, then borrow `count` bytes.
    ///
    /// The padding bytes must be present in the buffer; their values are not
    /// inspected.
    pub fn read_aligned(&mut self, count: usize, align: usize) -> CodecResult<&'a [u8]> {
        let pad = padding_for(self.pos, align);
        if pad > self.remaining() {
            return Err(self.underrun(pad + count));
        }
        self.pos += pad;
        self.read_bytes(count)
    }

    /// Fail unless every byte has been consumed.
    pub fn expect_end(&self) -> CodecResult<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }

    fn underrun(&self, needed: usize) -> CodecError {
        CodecError::BufferUnderrun {
            position: self.pos,
            needed,
            remaining: self.remaining(),
        }
    }
}
