//! Generic composition over other codecs: arrays, optionals, closed enums,
//! and mapped newtypes.

use std::collections::HashMap;
use std::marker::PhantomData;

use crate::codec::Codec;
use crate::cursor::Cursor;
use crate::error::{CodecError, CodecResult, SchemaError};
use crate::format::{ABSENT, MAX_DISCRIMINANTS, PRESENT};
use crate::primitives::{read_len, write_varint};
use crate::sink::Sink;

// ── Array ──────────────────────────────────────────────────────────────────

/// varint7 element count, then every element through the inner codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayOf<C>(pub C);

impl<T, C: Codec<T>> Codec<Vec<T>> for ArrayOf<C> {
    fn encode(&self, sink: &mut Sink, value: &Vec<T>) -> CodecResult<()> {
        write_varint(sink, value.len() as u64);
        for item in value {
            self.0.encode(sink, item)?;
        }
        Ok(())
    }

    fn decode(&self, cursor: &mut Cursor<'_>) -> CodecResult<Vec<T>> {
        let count = read_len(cursor)?;
        // The count is untrusted; bound the preallocation by the input left.
        let mut out = Vec::with_capacity(count.min(cursor.remaining()));
        for _ in 0..count {
            out.push(self.0.decode(cursor)?);
        }
        Ok(out)
    }
}

// ── Optional ───────────────────────────────────────────────────────────────

/// One presence byte, then the payload only when present.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionalOf<C>(pub C);

impl<T, C: Codec<T>> Codec<Option<T>> for OptionalOf<C> {
    fn encode(&self, sink: &mut Sink, value: &Option<T>) -> CodecResult<()> {
        match value {
            None => {
                sink.write_byte(ABSENT);
                Ok(())
            }
            Some(inner) => {
                sink.write_byte(PRESENT);
                self.0.encode(sink, inner)
            }
        }
    }

    fn decode(&self, cursor: &mut Cursor<'_>) -> CodecResult<Option<T>> {
        match cursor.read_byte()? {
            ABSENT => Ok(None),
            PRESENT => self.0.decode(cursor).map(Some),
            other => Err(CodecError::InvalidPresence(other)),
        }
    }
}

// ── Closed string enum ─────────────────────────────────────────────────────

/// A closed, ordered set of strings encoded as a one-byte index.
///
/// The position of a value in the list given to [`EnumOf::new`] is its wire
/// index, so the list must only ever be appended to.
#[derive(Debug, Clone)]
pub struct EnumOf {
    name: &'static str,
    values: Vec<String>,
    index: HashMap<String, u8>,
}

impl EnumOf {
    pub fn new<I, S>(name: &'static str, values: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(SchemaError::Empty { name });
        }
        if values.len() > MAX_DISCRIMINANTS {
            return Err(SchemaError::TooMany {
                name,
                count: values.len(),
            });
        }
        let mut index = HashMap::with_capacity(values.len());
        for (i, v) in values.iter().enumerate() {
            if index.insert(v.clone(), i as u8).is_some() {
                return Err(SchemaError::DuplicateValue {
                    name,
                    value: v.clone(),
                });
            }
        }
        Ok(Self { name, values, index })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

impl Codec<String> for EnumOf {
    fn encode(&self, sink: &mut Sink, value: &String) -> CodecResult<()> {
        let idx = self
            .index
            .get(value)
            .ok_or_else(|| CodecError::UnknownEnumValue(value.clone()))?;
        sink.write_byte(*idx);
        Ok(())
    }

    fn decode(&self, cursor: &mut Cursor<'_>) -> CodecResult<String> {
        let idx = cursor.read_byte()?;
        self.values
            .get(idx as usize)
            .cloned()
            .ok_or(CodecError::UnknownEnumIndex {
                index: idx,
                len: self.values.len(),
            })
    }
}

// ── Mapped ─────────────────────────────────────────────────────────────────

/// Adapt a codec of `U` into a codec of `T` through a pair of conversions.
///
/// `into_wire` runs on encode, `from_wire` on decode and may reject values.
pub struct Mapped<U, C, F, G> {
    inner: C,
    into_wire: F,
    from_wire: G,
    _wire: PhantomData<fn() -> U>,
}

impl<U, C, F, G> Mapped<U, C, F, G> {
    pub fn new(inner: C, into_wire: F, from_wire: G) -> Self {
        Self {
            inner,
            into_wire,
            from_wire,
            _wire: PhantomData,
        }
    }
}

impl<T, U, C, F, G> Codec<T> for Mapped<U, C, F, G>
where
    C: Codec<U>,
    F: Fn(&T) -> U + Send + Sync,
    G: Fn(U) -> CodecResult<T> + Send + Sync,
{
    fn encode(&self, sink: &mut Sink, value: &T) -> CodecResult<()> {
        self.inner.encode(sink, &(self.into_wire)(value))
    }

    fn decode(&self, cursor: &mut Cursor<'_>) -> CodecResult<T> {
        let wire = self.inner.decode(cursor)?;
        (self.from_wire)(wire)
    }
}
