//! Tagged unions with explicit, stable discriminants.
//!
//! Each variant is registered with the discriminant byte it owns. The
//! builder refuses to seal unless the discriminants are unique and cover
//! `0..n` without gaps, so reordering registration code can never silently
//! renumber the wire format.

use std::sync::Arc;

use crate::codec::Codec;
use crate::cursor::Cursor;
use crate::error::{CodecError, CodecResult, SchemaError};
use crate::format::MAX_DISCRIMINANTS;
use crate::sink::Sink;

type TryEncodeFn<T> = Box<dyn Fn(&mut Sink, &T) -> Option<CodecResult<()>> + Send + Sync>;
type DecodeFn<T> = Box<dyn Fn(&mut Cursor<'_>) -> CodecResult<T> + Send + Sync>;

struct Variant<T> {
    tag: u8,
    name: &'static str,
    /// Writes tag and payload when the value is this variant, else `None`.
    try_encode: TryEncodeFn<T>,
    decode: DecodeFn<T>,
}

/// Registers variants before [`seal`](UnionBuilder::seal) validates them.
pub struct UnionBuilder<T> {
    name: &'static str,
    variants: Vec<Variant<T>>,
}

impl<T: 'static> UnionBuilder<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            variants: Vec::new(),
        }
    }

    /// Register the variant owning discriminant `tag`.
    ///
    /// `project` recognises the variant and borrows its payload; `inject`
    /// wraps a decoded payload back into `T`.
    pub fn variant<V, C, P, I>(
        mut self,
        tag: u8,
        name: &'static str,
        codec: C,
        project: P,
        inject: I,
    ) -> Self
    where
        V: 'static,
        C: Codec<V> + 'static,
        P: Fn(&T) -> Option<&V> + Send + Sync + 'static,
        I: Fn(V) -> T + Send + Sync + 'static,
    {
        let codec = Arc::new(codec);
        let reader = Arc::clone(&codec);
        self.variants.push(Variant {
            tag,
            name,
            try_encode: Box::new(move |sink: &mut Sink, value: &T| {
                let payload = project(value)?;
                sink.write_byte(tag);
                Some(codec.encode(sink, payload))
            }),
            decode: Box::new(move |cursor: &mut Cursor<'_>| reader.decode(cursor).map(&inject)),
        });
        self
    }

    /// Register a payload-free variant.
    pub fn unit<M, I>(self, tag: u8, name: &'static str, matches: M, make: I) -> Self
    where
        M: Fn(&T) -> bool + Send + Sync + 'static,
        I: Fn() -> T + Send + Sync + 'static,
    {
        self.variant(
            tag,
            name,
            NoPayload,
            move |value: &T| matches(value).then_some(&()),
            move |()| make(),
        )
    }

    /// Validate the discriminants and freeze the registry.
    pub fn seal(mut self) -> Result<UnionCodec<T>, SchemaError> {
        let name = self.name;
        if self.variants.is_empty() {
            return Err(SchemaError::Empty { name });
        }
        if self.variants.len() > MAX_DISCRIMINANTS {
            return Err(SchemaError::TooMany {
                name,
                count: self.variants.len(),
            });
        }
        self.variants.sort_by_key(|v| v.tag);
        for pair in self.variants.windows(2) {
            if pair[0].tag == pair[1].tag {
                return Err(SchemaError::DuplicateTag {
                    name,
                    tag: pair[0].tag,
                });
            }
        }
        for (expected, v) in self.variants.iter().enumerate() {
            if v.tag as usize != expected {
                return Err(SchemaError::TagGap {
                    name,
                    missing: expected as u8,
                });
            }
        }
        Ok(UnionCodec {
            name,
            variants: self.variants,
        })
    }
}

/// Sealed tagged union: one discriminant byte, then the variant's payload.
pub struct UnionCodec<T> {
    name: &'static str,
    /// Sorted so that `variants[tag].tag == tag`.
    variants: Vec<Variant<T>>,
}

impl<T: 'static> UnionCodec<T> {
    pub fn builder(name: &'static str) -> UnionBuilder<T> {
        UnionBuilder::new(name)
    }
}

impl<T> UnionCodec<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// `(discriminant, variant name)` pairs in discriminant order.
    pub fn variants(&self) -> impl Iterator<Item = (u8, &'static str)> + '_ {
        self.variants.iter().map(|v| (v.tag, v.name))
    }
}

impl<T> Codec<T> for UnionCodec<T> {
    fn encode(&self, sink: &mut Sink, value: &T) -> CodecResult<()> {
        for variant in &self.variants {
            if let Some(result) = (variant.try_encode)(sink, value) {
                return result;
            }
        }
        Err(CodecError::UnregisteredVariant(self.name))
    }

    fn decode(&self, cursor: &mut Cursor<'_>) -> CodecResult<T> {
        let tag = cursor.read_byte()?;
        let variant = self
            .variants
            .get(tag as usize)
            .ok_or(CodecError::UnknownVariantTag {
                union: self.name,
                tag,
                registered: self.variants.len(),
            })?;
        (variant.decode)(cursor)
    }
}

/// Zero-byte payload of unit variants.
struct NoPayload;

impl Codec<()> for NoPayload {
    fn encode(&self, _sink: &mut Sink, _value: &()) -> CodecResult<()> {
        Ok(())
    }

    fn decode(&self, _cursor: &mut Cursor<'_>) -> CodecResult<()> {
        Ok(())
    }
}
