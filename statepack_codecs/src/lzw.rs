use std::collections::HashMap;

use statepack_core::compress::Compressor;
use statepack_core::error::{CodecError, CodecResult};
use statepack_core::packed::PackedText;

/// Codes `0..FIRST_CODE` stand for the literal byte of the same value.
pub const FIRST_CODE: u32 = 256;

/// Size of the code space. Every code must fit in one 16-bit unit, so once
/// the next code to hand out would equal this the dictionary starts over.
///
/// Encoder and decoder both reset through [`CodeAllocator`], which is the
/// only place this threshold is consulted.
pub const CODE_SPACE: u32 = 1 << 16;

/// Dictionary codes assignable between two resets.
pub const CODES_PER_GENERATION: u32 = CODE_SPACE - FIRST_CODE;

// ── Code allocation ────────────────────────────────────────────────────────

/// Hands out dictionary codes in order and signals resets.
///
/// The encoder registers one code per `(prefix, literal)` pair it emits and
/// the decoder registers one per pair it reads. Driving both through this
/// type keeps their reset points identical by construction.
#[derive(Debug, Clone)]
pub struct CodeAllocator {
    next: u32,
    generation: u32,
}

/// Outcome of [`CodeAllocator::allocate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    /// Register the new sequence under this code.
    Assign(u16),
    /// The code space is exhausted: drop every learned code instead.
    Reset,
}

impl Default for CodeAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeAllocator {
    pub fn new() -> Self {
        Self {
            next: FIRST_CODE,
            generation: 0,
        }
    }

    /// Smallest code not yet assigned in the current generation.
    pub fn next_code(&self) -> u32 {
        self.next
    }

    /// Number of resets so far.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn allocate(&mut self) -> Allocation {
        let code = self.next;
        self.next += 1;
        if self.next == CODE_SPACE {
            self.next = FIRST_CODE;
            self.generation += 1;
            return Allocation::Reset;
        }
        Allocation::Assign(code as u16)
    }
}

// ── Encoder ────────────────────────────────────────────────────────────────

/// Counters from one compression run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LzwStats {
    /// `(prefix, literal)` pairs emitted, i.e. codes handed out.
    pub pairs: u64,
    /// Input offsets just past the byte that triggered each reset.
    pub reset_offsets: Vec<usize>,
}

/// Compress `raw` into a `"<len>;codes"` container.
pub fn compress(raw: &[u8]) -> PackedText {
    compress_with_stats(raw).0
}

/// [`compress`], also reporting where the dictionary was reset.
pub fn compress_with_stats(raw: &[u8]) -> (PackedText, LzwStats) {
    let mut out = PackedText::with_header(raw.len(), raw.len() / 2 + 1);
    let mut stats = LzwStats::default();

    // Trie edges: (code of the matched prefix, next byte) -> code of the
    // extended sequence. Literal codes are implicit.
    let mut trie: HashMap<(u16, u8), u16> = HashMap::new();
    let mut alloc = CodeAllocator::new();
    let mut matched: Option<u16> = None;

    for (offset, &byte) in raw.iter().enumerate() {
        let Some(prefix) = matched else {
            matched = Some(byte as u16);
            continue;
        };
        if let Some(&code) = trie.get(&(prefix, byte)) {
            matched = Some(code);
            continue;
        }

        out.push(prefix);
        out.push(byte as u16);
        stats.pairs += 1;
        match alloc.allocate() {
            Allocation::Assign(code) => {
                trie.insert((prefix, byte), code);
            }
            Allocation::Reset => {
                log::debug!(
                    "lzw: dictionary full at input offset {}, resetting (generation {})",
                    offset + 1,
                    alloc.generation()
                );
                trie.clear();
                stats.reset_offsets.push(offset + 1);
            }
        }
        matched = None;
    }
    if let Some(prefix) = matched {
        out.push(prefix);
    }

    log::trace!(
        "lzw: {} bytes -> {} units, {} pairs, {} resets",
        raw.len(),
        out.len(),
        stats.pairs,
        stats.reset_offsets.len()
    );
    (out, stats)
}

// ── Decoder ────────────────────────────────────────────────────────────────

/// Rebuild the bytes a [`compress`] container describes.
pub fn decompress(packed: &PackedText) -> CodecResult<Vec<u8>> {
    let (raw_len, body) = packed.split_header()?;
    // The header is untrusted until the body backs it up.
    let mut out: Vec<u8> = Vec::with_capacity(raw_len.min(body.len().saturating_mul(4)));

    // Entry `code - FIRST_CODE` is the range of `out` holding that code's
    // sequence. Filled in the order the encoder assigned codes.
    let mut table: Vec<(usize, usize)> = Vec::new();
    let mut alloc = CodeAllocator::new();

    for group in body.chunks(2) {
        let code = group[0] as u32;
        let start = out.len();
        if code < FIRST_CODE {
            out.push(code as u8);
        } else {
            let &(from, to) = table
                .get((code - FIRST_CODE) as usize)
                .ok_or(CodecError::DictionaryDesync {
                    code,
                    assigned: alloc.next_code(),
                })?;
            out.extend_from_within(from..to);
        }

        if let Some(&literal) = group.get(1) {
            let byte = u8::try_from(literal).map_err(|_| CodecError::InvalidLiteral(literal))?;
            out.push(byte);
            match alloc.allocate() {
                Allocation::Assign(_) => table.push((start, out.len())),
                Allocation::Reset => table.clear(),
            }
        }

        if out.len() > raw_len {
            return Err(CodecError::LengthMismatch {
                expected: raw_len,
                actual: out.len(),
            });
        }
    }

    if out.len() != raw_len {
        return Err(CodecError::LengthMismatch {
            expected: raw_len,
            actual: out.len(),
        });
    }
    Ok(out)
}

/// Dictionary compressor over 16-bit code units.
///
/// Best for: serialized simulation state, which repeats field layouts and
/// small integers heavily. Output is about one unit per two to three input
/// bytes on such data.
#[derive(Debug, Clone, Copy, Default)]
pub struct LzwCompressor;

impl Compressor for LzwCompressor {
    fn name(&self) -> &'static str {
        "lzw"
    }

    fn compress(&self, raw: &[u8]) -> PackedText {
        compress(raw)
    }

    fn decompress(&self, packed: &PackedText) -> CodecResult<Vec<u8>> {
        decompress(packed)
    }
}
