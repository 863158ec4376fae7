//! Wire-format constants shared by every codec.
//!
//! All multi-byte primitives are little-endian. Nothing here is versioned:
//! the order in which a schema declares its fields is the whole contract.

// ── Varint7 ────────────────────────────────────────────────────────────────

/// High bit of a varint7 byte: set when more bytes follow.
pub const VARINT_CONTINUATION: u8 = 0x80;

/// Low seven bits of a varint7 byte carry the value.
pub const VARINT_PAYLOAD_MASK: u8 = 0x7F;

/// Value bits carried per varint7 byte.
pub const VARINT_PAYLOAD_BITS: u32 = 7;

// ── Presence / booleans ────────────────────────────────────────────────────

pub const ABSENT: u8 = 0;
pub const PRESENT: u8 = 1;

pub const FALSE: u8 = 0;
pub const TRUE: u8 = 1;

// ── Sizes ──────────────────────────────────────────────────────────────────

/// Bytes per float32 on the wire.
pub const F32_SIZE: usize = 4;

/// Natural alignment of a 16-bit numeric buffer.
pub const U16_ALIGN: usize = 2;

/// Natural alignment of a 32-bit numeric buffer.
pub const U32_ALIGN: usize = 4;

/// Sink storage grows in chunks of this many bytes.
pub const SINK_CHUNK_SIZE: usize = 4096;

/// Enums and unions address their members with a single byte.
pub const MAX_DISCRIMINANTS: usize = 256;

// ── Packed text container ──────────────────────────────────────────────────

/// Separates the decimal length header from the code stream: `"<N>;codes"`.
pub const PACKED_SEPARATOR: u16 = b';' as u16;

/// Padding needed to bring `len` up to the next multiple of `align`.
#[inline]
pub fn padding_for(len: usize, align: usize) -> usize {
    assert!(
        align.is_power_of_two(),
        "alignment must be a power of two, got {align}"
    );
    (align - (len & (align - 1))) & (align - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_reaches_next_multiple() {
        assert_eq!(padding_for(0, 4), 0);
        assert_eq!(padding_for(1, 4), 3);
        assert_eq!(padding_for(3, 2), 1);
        assert_eq!(padding_for(8, 4), 0);
        assert_eq!(padding_for(5, 1), 0);
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn zero_alignment_is_rejected() {
        padding_for(3, 0);
    }
}
