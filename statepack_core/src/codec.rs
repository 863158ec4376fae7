use std::sync::Arc;

use crate::cursor::Cursor;
use crate::error::CodecResult;
use crate::sink::Sink;

/// Mirrored encode/decode pair for one data shape.
///
/// Every implementation must satisfy the round-trip law: for any value `v`
/// in the codec's domain, decoding what `encode` wrote yields `v` again and
/// consumes exactly the bytes that were written.
///
/// Codecs keep no state between calls. A built codec is immutable and can be
/// shared across threads.
pub trait Codec<T>: Send + Sync {
    /// Append the encoding of `value` to `sink`.
    ///
    /// Fails only for values outside the codec's declared domain, e.g. a
    /// string that is not a member of a closed enum.
    fn encode(&self, sink: &mut Sink, value: &T) -> CodecResult<()>;

    /// Read one value from `cursor`, advancing past its encoding.
    fn decode(&self, cursor: &mut Cursor<'_>) -> CodecResult<T>;
}

impl<T, C: Codec<T> + ?Sized> Codec<T> for &C {
    #[inline]
    fn encode(&self, sink: &mut Sink, value: &T) -> CodecResult<()> {
        (**self).encode(sink, value)
    }

    #[inline]
    fn decode(&self, cursor: &mut Cursor<'_>) -> CodecResult<T> {
        (**self).decode(cursor)
    }
}

impl<T, C: Codec<T> + ?Sized> Codec<T> for Box<C> {
    #[inline]
    fn encode(&self, sink: &mut Sink, value: &T) -> CodecResult<()> {
        (**self).encode(sink, value)
    }

    #[inline]
    fn decode(&self, cursor: &mut Cursor<'_>) -> CodecResult<T> {
        (**self).decode(cursor)
    }
}

impl<T, C: Codec<T> + ?Sized> Codec<T> for Arc<C> {
    #[inline]
    fn encode(&self, sink: &mut Sink, value: &T) -> CodecResult<()> {
        (**self).encode(sink, value)
    }

    #[inline]
    fn decode(&self, cursor: &mut Cursor<'_>) -> CodecResult<T> {
        (**self).decode(cursor)
    }
}

/// Encode a top-level value into a fresh buffer.
pub fn to_bytes<T, C: Codec<T> + ?Sized>(codec: &C, value: &T) -> CodecResult<Vec<u8>> {
    let mut sink = Sink::new();
    codec.encode(&mut sink, value)?;
    Ok(sink.into_bytes())
}

/// Decode a top-level value that must span the whole buffer.
pub fn from_bytes<T, C: Codec<T> + ?Sized>(codec: &C, bytes: &[u8]) -> CodecResult<T> {
    let mut cursor = Cursor::new(bytes);
    let value = codec.decode(&mut cursor)?;
    cursor.expect_end()?;
    Ok(value)
}
