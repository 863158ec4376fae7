use crate::error::CodecResult;
use crate::packed::PackedText;

/// Whole-buffer compression applied between encoding and slot storage.
///
/// Each `Compressor`:
/// - Works on one complete serialized state at a time; there is no streaming
///   and no state carried between calls.
/// - Emits a [`PackedText`] whose header records the uncompressed length, so
///   decompression can check that it produced exactly that many bytes.
/// - Reports malformed input as a [`CodecError`](crate::error::CodecError)
///   rather than returning bytes that merely look plausible.
pub trait Compressor: Send + Sync {
    /// Human-readable name for logs and the CLI.
    fn name(&self) -> &'static str;

    fn compress(&self, raw: &[u8]) -> PackedText;

    fn decompress(&self, packed: &PackedText) -> CodecResult<Vec<u8>>;
}
