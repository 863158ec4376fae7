pub mod codec;
pub mod combinators;
pub mod compress;
pub mod cursor;
pub mod error;
pub mod format;
pub mod link;
pub mod packed;
pub mod persist;
pub mod primitives;
pub mod sink;
pub mod staged;
pub mod union;

pub use codec::{from_bytes, to_bytes, Codec};
pub use combinators::{ArrayOf, EnumOf, Mapped, OptionalOf};
pub use compress::Compressor;
pub use cursor::Cursor;
pub use error::{CodecError, CodecResult, PersistError, SchemaError};
pub use link::{Link, LinkCodec};
pub use packed::PackedText;
pub use persist::{load, save, DirSlots, MemorySlots, SaveReport, SlotStore};
pub use primitives::{Bool, Le16, Le32, Str, U16Buffer, U32Buffer, Varint, F32};
pub use sink::Sink;
pub use staged::{ObjectCodec, StagedBuilder, StagedCodec};
pub use union::{UnionBuilder, UnionCodec};
