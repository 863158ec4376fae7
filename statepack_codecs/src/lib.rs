mod lzw;
mod passthrough;

pub use lzw::{
    compress, compress_with_stats, decompress, Allocation, CodeAllocator, LzwCompressor, LzwStats,
    CODES_PER_GENERATION, CODE_SPACE, FIRST_CODE,
};
pub use passthrough::PassThroughCompressor;

use statepack_core::Compressor;

/// Resolve a compressor from the name given on the command line.
pub fn compressor_by_name(name: &str) -> anyhow::Result<Box<dyn Compressor>> {
    match name {
        "lzw" => Ok(Box::new(LzwCompressor)),
        "passthrough" | "pass" | "none" => Ok(Box::new(PassThroughCompressor)),
        _ => anyhow::bail!("unknown compressor '{}'; supported: lzw, passthrough", name),
    }
}
