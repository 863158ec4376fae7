//! Objects built in ordered stages.
//!
//! A [`StagedCodec`] is described once, as an ordered list of stages over a
//! draft accumulator `D`. Encoding walks the stages and writes whatever each
//! one pulls out of the finished value `T`; decoding walks the same stages,
//! folding what it reads into the draft, and then turns the draft into `T`.
//!
//! Because every stage sees the draft as decoded so far, a later stage can
//! depend on an earlier field: it can size a buffer from a previously read
//! count ([`stage`]), or recompute a value that is never written at all
//! ([`derive`]). Cross-references between objects are persisted as
//! [`Link`](crate::link::Link) indices and checked in a final [`link`] pass
//! once the whole value exists.
//!
//! A plain fixed-shape object is the special case `D == T`; see
//! [`StagedBuilder::build_object`].
//!
//! [`stage`]: StagedBuilder::stage
//! [`derive`]: StagedBuilder::derive
//! [`link`]: StagedBuilder::link

use std::sync::Arc;

use crate::codec::Codec;
use crate::cursor::Cursor;
use crate::error::CodecResult;
use crate::sink::Sink;

type WriteFn<T> = Box<dyn Fn(&mut Sink, &T) -> CodecResult<()> + Send + Sync>;
type ReadFn<D> = Box<dyn Fn(&mut Cursor<'_>, &mut D) -> CodecResult<()> + Send + Sync>;
type FinishFn<D, T> = Box<dyn Fn(D) -> CodecResult<T> + Send + Sync>;
type LinkFn<T> = Box<dyn Fn(&mut T) -> CodecResult<()> + Send + Sync>;

struct Stage<D, T> {
    name: &'static str,
    /// `None` for derived stages, which contribute nothing to the wire.
    write: Option<WriteFn<T>>,
    read: ReadFn<D>,
}

/// Codec for an object with fields equal to its draft.
pub type ObjectCodec<T> = StagedCodec<T, T>;

/// Accumulates stages in declaration order.
pub struct StagedBuilder<D, T> {
    name: &'static str,
    stages: Vec<Stage<D, T>>,
    link: Option<LinkFn<T>>,
}

impl<D: Default + 'static, T: 'static> StagedBuilder<D, T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            stages: Vec::new(),
            link: None,
        }
    }

    /// A field written from a borrow of the value and read into the draft.
    pub fn field<V, C, G, P>(self, name: &'static str, codec: C, get: G, put: P) -> Self
    where
        V: 'static,
        C: Codec<V> + 'static,
        G: Fn(&T) -> &V + Send + Sync + 'static,
        P: Fn(&mut D, V) + Send + Sync + 'static,
    {
        let codec = Arc::new(codec);
        let reader = Arc::clone(&codec);
        self.stage(
            name,
            move |sink, value| codec.encode(sink, get(value)),
            move |cursor, draft| {
                put(draft, reader.decode(cursor)?);
                Ok(())
            },
        )
    }

    /// Like [`field`](Self::field), for values that are computed on encode
    /// (lengths, ids, conversions) rather than borrowed.
    pub fn field_by_value<V, C, G, P>(self, name: &'static str, codec: C, get: G, put: P) -> Self
    where
        V: 'static,
        C: Codec<V> + 'static,
        G: Fn(&T) -> V + Send + Sync + 'static,
        P: Fn(&mut D, V) + Send + Sync + 'static,
    {
        let codec = Arc::new(codec);
        let reader = Arc::clone(&codec);
        self.stage(
            name,
            move |sink, value| codec.encode(sink, &get(value)),
            move |cursor, draft| {
                put(draft, reader.decode(cursor)?);
                Ok(())
            },
        )
    }

    /// General stage. `read` sees the draft decoded by every earlier stage.
    pub fn stage<W, R>(mut self, name: &'static str, write: W, read: R) -> Self
    where
        W: Fn(&mut Sink, &T) -> CodecResult<()> + Send + Sync + 'static,
        R: Fn(&mut Cursor<'_>, &mut D) -> CodecResult<()> + Send + Sync + 'static,
    {
        self.stages.push(Stage {
            name,
            write: Some(Box::new(write)),
            read: Box::new(read),
        });
        self
    }

    /// Decode-only stage: recompute part of the draft from earlier stages.
    /// Nothing is written for it.
    pub fn derive<F>(mut self, name: &'static str, f: F) -> Self
    where
        F: Fn(&mut D) -> CodecResult<()> + Send + Sync + 'static,
    {
        self.stages.push(Stage {
            name,
            write: None,
            read: Box::new(move |_: &mut Cursor<'_>, draft: &mut D| f(draft)),
        });
        self
    }

    /// Final pass over the finished value, run after every stage and the
    /// finish function. Used to validate and resolve arena links.
    pub fn link<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut T) -> CodecResult<()> + Send + Sync + 'static,
    {
        self.link = Some(Box::new(f));
        self
    }

    /// Seal the stage list; `finish` turns a complete draft into the value.
    pub fn build<F>(self, finish: F) -> StagedCodec<D, T>
    where
        F: Fn(D) -> CodecResult<T> + Send + Sync + 'static,
    {
        StagedCodec {
            name: self.name,
            stages: self.stages,
            finish: Box::new(finish),
            link: self.link,
        }
    }
}

impl<T: Default + 'static> StagedBuilder<T, T> {
    /// Seal a fixed-shape object whose draft is the value itself.
    pub fn build_object(self) -> ObjectCodec<T> {
        self.build(Ok)
    }
}

/// A codec described as ordered stages. Built with [`StagedBuilder`].
pub struct StagedCodec<D, T> {
    name: &'static str,
    stages: Vec<Stage<D, T>>,
    finish: FinishFn<D, T>,
    link: Option<LinkFn<T>>,
}

impl<D: Default + 'static, T: 'static> StagedCodec<D, T> {
    pub fn builder(name: &'static str) -> StagedBuilder<D, T> {
        StagedBuilder::new(name)
    }
}

impl<D, T> StagedCodec<D, T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Stage names in wire order; derived stages are marked with a `~`.
    pub fn layout(&self) -> Vec<String> {
        self.stages
            .iter()
            .map(|s| match s.write {
                Some(_) => s.name.to_string(),
                None => format!("~{}", s.name),
            })
            .collect()
    }
}

impl<D: Default, T> Codec<T> for StagedCodec<D, T> {
    fn encode(&self, sink: &mut Sink, value: &T) -> CodecResult<()> {
        for stage in &self.stages {
            if let Some(write) = &stage.write {
                write(sink, value)?;
            }
        }
        Ok(())
    }

    fn decode(&self, cursor: &mut Cursor<'_>) -> CodecResult<T> {
        let mut draft = D::default();
        for stage in &self.stages {
            if let Err(err) = (stage.read)(cursor, &mut draft) {
                log::debug!(
                    "{}.{}: decode failed at byte {}: {}",
                    self.name,
                    stage.name,
                    cursor.position(),
                    err
                );
                return Err(err);
            }
        }
        let mut value = (self.finish)(draft)?;
        if let Some(link) = &self.link {
            link(&mut value)?;
        }
        Ok(value)
    }
}
