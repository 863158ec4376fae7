//! Save/load façade: encode → compress → one named slot, and back.
//!
//! RULE: a slot is written and read wholesale. Stores never append to or
//! partially read a slot, and callers must not overlap a read and a write of
//! the same slot.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use xxhash_rust::xxh3::xxh3_64;

use crate::codec::{from_bytes, to_bytes, Codec};
use crate::compress::Compressor;
use crate::error::{CodecError, PersistError};
use crate::packed::PackedText;

/// File extension of directory-backed slots.
pub const SLOT_EXTENSION: &str = "sav";

/// A key/value store addressed by slot name.
///
/// A stored slot that cannot be read back as a container is reported as an
/// [`io::ErrorKind::InvalidData`] error wrapping the [`CodecError`]; `load`
/// turns it into [`PersistError::Codec`].
pub trait SlotStore {
    fn get(&self, slot: &str) -> io::Result<Option<PackedText>>;

    fn set(&mut self, slot: &str, packed: &PackedText) -> io::Result<()>;
}

// ── In-memory store ────────────────────────────────────────────────────────

/// HashMap-backed store, used in tests and for ephemeral runs.
#[derive(Debug, Default)]
pub struct MemorySlots {
    slots: HashMap<String, PackedText>,
}

impl MemorySlots {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotStore for MemorySlots {
    fn get(&self, slot: &str) -> io::Result<Option<PackedText>> {
        Ok(self.slots.get(slot).cloned())
    }

    fn set(&mut self, slot: &str, packed: &PackedText) -> io::Result<()> {
        self.slots.insert(slot.to_string(), packed.clone());
        Ok(())
    }
}

// ── Directory store ────────────────────────────────────────────────────────

/// One `<slot>.sav` file per slot, holding the container's UTF-16LE units.
#[derive(Debug, Clone)]
pub struct DirSlots {
    root: PathBuf,
}

impl DirSlots {
    /// Open (or create) a slot directory.
    pub fn open(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, slot: &str) -> PathBuf {
        self.root.join(format!("{slot}.{SLOT_EXTENSION}"))
    }
}

impl SlotStore for DirSlots {
    fn get(&self, slot: &str) -> io::Result<Option<PackedText>> {
        let bytes = match fs::read(self.path_for(slot)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        PackedText::from_le_bytes(&bytes)
            .map(Some)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn set(&mut self, slot: &str, packed: &PackedText) -> io::Result<()> {
        // Write a sibling file and rename it over the slot so a reader never
        // sees half a save.
        let path = self.path_for(slot);
        let tmp = path.with_extension(format!("{SLOT_EXTENSION}.tmp"));
        fs::write(&tmp, packed.to_le_bytes())?;
        fs::rename(&tmp, &path)
    }
}

// ── Save / load ────────────────────────────────────────────────────────────

/// What a save produced, for logs and inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    /// Serialized bytes before compression.
    pub raw_len: usize,
    /// Code units stored in the slot, header included.
    pub packed_units: usize,
    /// xxh3-64 of the serialized bytes.
    pub digest: u64,
}

impl SaveReport {
    pub fn for_payload(raw: &[u8], packed: &PackedText) -> Self {
        Self {
            raw_len: raw.len(),
            packed_units: packed.len(),
            digest: xxh3_64(raw),
        }
    }

    /// Stored size over raw size; units count as two bytes.
    pub fn ratio(&self) -> f64 {
        if self.raw_len == 0 {
            return 1.0;
        }
        (self.packed_units * 2) as f64 / self.raw_len as f64
    }
}

/// Slot names are used as file stems, so keep them to a safe alphabet.
pub fn validate_slot_name(slot: &str) -> Result<(), PersistError> {
    let ok = !slot.is_empty()
        && slot
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if ok {
        Ok(())
    } else {
        Err(PersistError::InvalidSlotName(slot.to_string()))
    }
}

/// Encode `value`, compress it, and store it under `slot`.
pub fn save<T, C, S>(
    store: &mut S,
    slot: &str,
    codec: &C,
    compressor: &dyn Compressor,
    value: &T,
) -> Result<SaveReport, PersistError>
where
    C: Codec<T> + ?Sized,
    S: SlotStore + ?Sized,
{
    validate_slot_name(slot)?;
    let raw = to_bytes(codec, value).map_err(|source| PersistError::Codec {
        slot: slot.to_string(),
        source,
    })?;
    let packed = compressor.compress(&raw);
    store.set(slot, &packed)?;

    let report = SaveReport::for_payload(&raw, &packed);
    log::info!(
        "saved slot '{}': {} bytes -> {} units via {} (digest {:016x})",
        slot,
        report.raw_len,
        report.packed_units,
        compressor.name(),
        report.digest
    );
    Ok(report)
}

/// Load and decode `slot`.
///
/// Returns `Ok(None)` when the slot has never been written. A slot that
/// exists but fails to decompress or decode is an error; whether that means
/// "start fresh" or "abort" is the caller's decision.
pub fn load<T, C, S>(
    store: &S,
    slot: &str,
    codec: &C,
    compressor: &dyn Compressor,
) -> Result<Option<T>, PersistError>
where
    C: Codec<T> + ?Sized,
    S: SlotStore + ?Sized,
{
    validate_slot_name(slot)?;
    let Some(packed) = store.get(slot).map_err(|e| read_error(slot, e))? else {
        log::debug!("slot '{}' is empty", slot);
        return Ok(None);
    };
    let corrupt = |source| PersistError::Codec {
        slot: slot.to_string(),
        source,
    };
    let raw = compressor.decompress(&packed).map_err(corrupt)?;
    let value = from_bytes(codec, &raw).map_err(corrupt)?;
    log::info!(
        "loaded slot '{}': {} units -> {} bytes via {}",
        slot,
        packed.len(),
        raw.len(),
        compressor.name()
    );
    Ok(Some(value))
}

/// Separate a corrupt container from a failing store.
fn read_error(slot: &str, err: io::Error) -> PersistError {
    match err.get_ref().and_then(|inner| inner.downcast_ref::<CodecError>()) {
        Some(source) => PersistError::Codec {
            slot: slot.to_string(),
            source: source.clone(),
        },
        None => PersistError::Io(err),
    }
}
