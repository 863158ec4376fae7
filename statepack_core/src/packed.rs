use std::fmt;

use crate::error::{CodecError, CodecResult};
use crate::format::PACKED_SEPARATOR;

/// Compressed slot payload: `"<N>;"` followed by 16-bit code units.
///
/// `N` is the uncompressed length in decimal. The units after the separator
/// are whatever the compressor emits; they may include values that are not
/// valid UTF-16 on their own, which is why the container is kept as raw units
/// rather than a `String`.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct PackedText {
    units: Vec<u16>,
}

impl PackedText {
    /// Start a container for `raw_len` uncompressed bytes.
    pub fn with_header(raw_len: usize, capacity: usize) -> Self {
        let digits = raw_len.to_string();
        let mut units = Vec::with_capacity(digits.len() + 1 + capacity);
        units.extend(digits.bytes().map(u16::from));
        units.push(PACKED_SEPARATOR);
        Self { units }
    }

    pub fn from_units(units: Vec<u16>) -> Self {
        Self { units }
    }

    #[inline]
    pub fn push(&mut self, unit: u16) {
        self.units.push(unit);
    }

    pub fn units(&self) -> &[u16] {
        &self.units
    }

    /// Total units, header included.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Parse the header, returning the declared raw length and the body.
    pub fn split_header(&self) -> CodecResult<(usize, &[u16])> {
        let sep = self
            .units
            .iter()
            .position(|&u| u == PACKED_SEPARATOR)
            .ok_or_else(|| CodecError::MalformedContainer("missing ';' after length".into()))?;
        let digits = &self.units[..sep];
        if digits.is_empty() {
            return Err(CodecError::MalformedContainer("empty length header".into()));
        }
        let mut raw_len: usize = 0;
        for &u in digits {
            let digit = match u {
                0x30..=0x39 => (u - 0x30) as usize,
                other => {
                    return Err(CodecError::MalformedContainer(format!(
                        "non-digit unit {other:#06x} in length header"
                    )))
                }
            };
            raw_len = raw_len
                .checked_mul(10)
                .and_then(|v| v.checked_add(digit))
                .ok_or_else(|| CodecError::MalformedContainer("length header overflows".into()))?;
        }
        Ok((raw_len, &self.units[sep + 1..]))
    }

    /// UTF-16LE bytes, the representation used by file-backed slots.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.units.iter().flat_map(|u| u.to_le_bytes()).collect()
    }

    pub fn from_le_bytes(bytes: &[u8]) -> CodecResult<Self> {
        if bytes.len() % 2 != 0 {
            return Err(CodecError::MalformedContainer(format!(
                "odd byte count {} for 16-bit units",
                bytes.len()
            )));
        }
        Ok(Self {
            units: bytes
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]))
                .collect(),
        })
    }

    /// The container as a Rust string, if its units form valid UTF-16.
    pub fn to_text(&self) -> Option<String> {
        String::from_utf16(&self.units).ok()
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            units: text.encode_utf16().collect(),
        }
    }
}

impl fmt::Debug for PackedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.split_header() {
            Ok((raw_len, body)) => write!(f, "PackedText({raw_len};{:04x?})", body),
            Err(_) => write!(f, "PackedText(malformed {:04x?})", self.units),
        }
    }
}
