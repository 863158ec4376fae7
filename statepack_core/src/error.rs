use thiserror::Error;

/// Runtime failure while encoding or decoding a single value.
///
/// Every variant is fatal for the call in progress: codecs never return a
/// partially decoded value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("buffer underrun at byte {position}: needed {needed} bytes, {remaining} remaining")]
    BufferUnderrun {
        position: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("unknown discriminant {tag} for union '{union}' ({registered} variants registered)")]
    UnknownVariantTag {
        union: &'static str,
        tag: u8,
        registered: usize,
    },

    #[error("invalid UTF-8 text: {0}")]
    InvalidText(String),

    #[error("dictionary desync: code {code} referenced but only {assigned} codes assigned")]
    DictionaryDesync { code: u32, assigned: u32 },

    #[error("varint does not fit in {bits} bits")]
    VarintOverflow { bits: u32 },

    #[error("invalid boolean byte 0x{0:02x}")]
    InvalidBool(u8),

    #[error("invalid presence byte 0x{0:02x}")]
    InvalidPresence(u8),

    #[error("enum index {index} out of range ({len} values)")]
    UnknownEnumIndex { index: u8, len: usize },

    #[error("value '{0}' is not a member of the enum")]
    UnknownEnumValue(String),

    #[error("value has no registered variant in union '{0}'")]
    UnregisteredVariant(&'static str),

    #[error("dangling {kind} link {index} (arena holds {len})")]
    DanglingLink {
        kind: &'static str,
        index: usize,
        len: usize,
    },

    #[error("{0} trailing bytes after top-level value")]
    TrailingBytes(usize),

    #[error("malformed container: {0}")]
    MalformedContainer(String),

    #[error("literal unit {0:#06x} is not a byte")]
    InvalidLiteral(u16),

    #[error("decoded {actual} bytes but header declares {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("invalid value: {0}")]
    Invalid(String),
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Programmer error in a codec description, reported when the codec is built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("'{name}': discriminant {tag} registered twice")]
    DuplicateTag { name: &'static str, tag: u8 },

    #[error("'{name}': discriminants must be contiguous from 0, missing {missing}")]
    TagGap { name: &'static str, missing: u8 },

    #[error("'{name}': no variants registered")]
    Empty { name: &'static str },

    #[error("'{name}': {count} entries exceed the one-byte limit of 256")]
    TooMany { name: &'static str, count: usize },

    #[error("'{name}': enum value '{value}' listed twice")]
    DuplicateValue { name: &'static str, value: String },
}

/// Failure of the save/load façade.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("slot storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("slot '{slot}': {source}")]
    Codec {
        slot: String,
        #[source]
        source: CodecError,
    },

    #[error("invalid slot name '{0}' (allowed: A-Z a-z 0-9 _ -)")]
    InvalidSlotName(String),
}
