use statepack_core::compress::Compressor;
use statepack_core::error::{CodecError, CodecResult};
use statepack_core::packed::PackedText;

/// Stores each byte as its own code unit.
///
/// Best for: debugging a schema, since the slot body is the serialized bytes
/// unchanged. Twice the raw size on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughCompressor;

impl Compressor for PassThroughCompressor {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn compress(&self, raw: &[u8]) -> PackedText {
        let mut out = PackedText::with_header(raw.len(), raw.len());
        for &b in raw {
            out.push(b as u16);
        }
        out
    }

    fn decompress(&self, packed: &PackedText) -> CodecResult<Vec<u8>> {
        let (raw_len, body) = packed.split_header()?;
        if body.len() != raw_len {
            return Err(CodecError::LengthMismatch {
                expected: raw_len,
                actual: body.len(),
            });
        }
        body.iter()
            .map(|&u| u8::try_from(u).map_err(|_| CodecError::InvalidLiteral(u)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_is_the_input() {
        let packed = PassThroughCompressor.compress(b"hi");
        assert_eq!(packed.to_text().as_deref(), Some("2;hi"));
        assert_eq!(PassThroughCompressor.decompress(&packed).unwrap(), b"hi");
    }

    #[test]
    fn rejects_wide_units_and_bad_lengths() {
        let wide = PackedText::from_units(vec![0x31, 0x3B, 0x100]);
        assert_eq!(
            PassThroughCompressor.decompress(&wide),
            Err(CodecError::InvalidLiteral(0x100))
        );
        let short = PackedText::from_text("3;ab");
        assert_eq!(
            PassThroughCompressor.decompress(&short),
            Err(CodecError::LengthMismatch {
                expected: 3,
                actual: 2
            })
        );
    }
}
