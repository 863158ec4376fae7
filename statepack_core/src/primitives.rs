//! Leaf codecs: varint7 integers, float32, booleans, strings, and raw
//! numeric buffers.

use zerocopy::{FromBytes, IntoBytes};

use crate::codec::Codec;
use crate::cursor::Cursor;
use crate::error::{CodecError, CodecResult};
use crate::format::{
    F32_SIZE, FALSE, TRUE, U16_ALIGN, U32_ALIGN, VARINT_CONTINUATION, VARINT_PAYLOAD_BITS,
    VARINT_PAYLOAD_MASK,
};
use crate::sink::Sink;

// ── Varint7 ────────────────────────────────────────────────────────────────

/// Write `value` as varint7: seven value bits per byte, low group first,
/// high bit set on every byte except the last.
pub fn write_varint(sink: &mut Sink, mut value: u64) {
    while value > VARINT_PAYLOAD_MASK as u64 {
        sink.write_byte((value as u8 & VARINT_PAYLOAD_MASK) | VARINT_CONTINUATION);
        value >>= VARINT_PAYLOAD_BITS;
    }
    sink.write_byte(value as u8);
}

/// Read a varint7 that must fit in `bits` bits.
pub fn read_varint(cursor: &mut Cursor<'_>, bits: u32) -> CodecResult<u64> {
    let mut value = 0u64;
    let mut shift = 0u32;
    loop {
        let byte = cursor.read_byte()?;
        let group = (byte & VARINT_PAYLOAD_MASK) as u64;
        if shift >= bits {
            return Err(CodecError::VarintOverflow { bits });
        }
        let room = bits - shift;
        if room < 64 && group >> room != 0 {
            return Err(CodecError::VarintOverflow { bits });
        }
        value |= group << shift;
        if byte & VARINT_CONTINUATION == 0 {
            return Ok(value);
        }
        shift += VARINT_PAYLOAD_BITS;
    }
}

/// Read a varint7 count or length.
#[inline]
pub fn read_len(cursor: &mut Cursor<'_>) -> CodecResult<usize> {
    let value = read_varint(cursor, usize::BITS)?;
    Ok(value as usize)
}

/// varint7 integer codec, implemented for `u16`, `u32`, `u64` and `usize`.
///
/// Values wider than the target type fail with
/// [`CodecError::VarintOverflow`] on decode.
#[derive(Debug, Clone, Copy, Default)]
pub struct Varint;

macro_rules! varint_impl {
    ($($ty:ty),*) => {$(
        impl Codec<$ty> for Varint {
            #[inline]
            fn encode(&self, sink: &mut Sink, value: &$ty) -> CodecResult<()> {
                write_varint(sink, *value as u64);
                Ok(())
            }

            #[inline]
            fn decode(&self, cursor: &mut Cursor<'_>) -> CodecResult<$ty> {
                let value = read_varint(cursor, <$ty>::BITS)?;
                Ok(value as $ty)
            }
        }
    )*};
}

varint_impl!(u16, u32, u64, usize);

// ── Float32 ────────────────────────────────────────────────────────────────

/// IEEE-754 binary32, four little-endian bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct F32;

impl Codec<f32> for F32 {
    fn encode(&self, sink: &mut Sink, value: &f32) -> CodecResult<()> {
        sink.write_bytes(&value.to_le_bytes());
        Ok(())
    }

    fn decode(&self, cursor: &mut Cursor<'_>) -> CodecResult<f32> {
        let raw = cursor.read_bytes(F32_SIZE)?;
        Ok(f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }
}

// ── Boolean ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct Bool;

impl Codec<bool> for Bool {
    fn encode(&self, sink: &mut Sink, value: &bool) -> CodecResult<()> {
        sink.write_byte(if *value { TRUE } else { FALSE });
        Ok(())
    }

    fn decode(&self, cursor: &mut Cursor<'_>) -> CodecResult<bool> {
        match cursor.read_byte()? {
            FALSE => Ok(false),
            TRUE => Ok(true),
            other => Err(CodecError::InvalidBool(other)),
        }
    }
}

// ── String ─────────────────────────────────────────────────────────────────

/// varint7 UTF-8 byte length followed by the bytes. No terminator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Str;

impl Codec<String> for Str {
    fn encode(&self, sink: &mut Sink, value: &String) -> CodecResult<()> {
        write_varint(sink, value.len() as u64);
        sink.write_bytes(value.as_bytes());
        Ok(())
    }

    fn decode(&self, cursor: &mut Cursor<'_>) -> CodecResult<String> {
        let len = read_len(cursor)?;
        let raw = cursor.read_bytes(len)?;
        let text = std::str::from_utf8(raw).map_err(|e| CodecError::InvalidText(e.to_string()))?;
        Ok(text.to_owned())
    }
}

// ── Numeric buffers ────────────────────────────────────────────────────────
//
// Element count, zero padding to the element's natural alignment, then the
// raw little-endian elements. The element types are byte arrays with
// alignment 1, so the stored bytes are reinterpreted in place on any host.

/// Little-endian 16-bit element of a [`U16Buffer`].
pub use zerocopy::byteorder::little_endian::U16 as Le16;
/// Little-endian 32-bit element of a [`U32Buffer`].
pub use zerocopy::byteorder::little_endian::U32 as Le32;

macro_rules! numeric_buffer {
    ($(#[$doc:meta])* $name:ident, $elem:ty, $align:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl $name {
            /// Borrow the elements straight out of the cursor's buffer.
            pub fn view<'a>(cursor: &mut Cursor<'a>) -> CodecResult<&'a [$elem]> {
                let count = read_len(cursor)?;
                let bytes = count
                    .checked_mul(std::mem::size_of::<$elem>())
                    .ok_or(CodecError::VarintOverflow { bits: usize::BITS })?;
                let raw = cursor.read_aligned(bytes, $align)?;
                <[$elem]>::ref_from_bytes(raw).map_err(|_| {
                    CodecError::Invalid(format!(
                        "{} bytes do not form a {} slice",
                        raw.len(),
                        stringify!($elem)
                    ))
                })
            }
        }

        impl Codec<Vec<$elem>> for $name {
            fn encode(&self, sink: &mut Sink, value: &Vec<$elem>) -> CodecResult<()> {
                write_varint(sink, value.len() as u64);
                sink.write_aligned(value.as_slice().as_bytes(), $align);
                Ok(())
            }

            fn decode(&self, cursor: &mut Cursor<'_>) -> CodecResult<Vec<$elem>> {
                Ok(Self::view(cursor)?.to_vec())
            }
        }
    };
}

numeric_buffer!(
    /// Buffer of 16-bit elements, aligned to 2 bytes.
    U16Buffer,
    Le16,
    U16_ALIGN
);

numeric_buffer!(
    /// Buffer of 32-bit elements, aligned to 4 bytes.
    U32Buffer,
    Le32,
    U32_ALIGN
);
