use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use flate2::write::GzEncoder;
use flate2::Compression as GzCompression;

use statepack_codecs::{compressor_by_name, LzwCompressor};
use statepack_core::{load, save, to_bytes, Compressor, DirSlots, PackedText, SaveReport, SlotStore};

mod sample;

use sample::{world_codec, World};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "statepack",
    about = "Save, load, and inspect compressed simulation state slots",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a sample world and save it into a slot
    Save {
        /// Slot directory (created if missing)
        #[arg(short, long, default_value = "saves")]
        dir: PathBuf,
        /// Slot name: letters, digits, '-' and '_'
        #[arg(short, long, default_value = "autosave")]
        slot: String,
        /// Seed for the generated world
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Map width in tiles
        #[arg(long, default_value_t = 64)]
        width: u32,
        /// Map height in tiles
        #[arg(long, default_value_t = 64)]
        height: u32,
        /// Number of agents
        #[arg(short, long, default_value_t = 200)]
        agents: usize,
        /// Compressor to use: lzw | passthrough
        #[arg(short, long, default_value = "lzw")]
        compressor: String,
    },
    /// Load a slot and print a summary of the world it holds
    Load {
        #[arg(short, long, default_value = "saves")]
        dir: PathBuf,
        #[arg(short, long, default_value = "autosave")]
        slot: String,
        #[arg(short, long, default_value = "lzw")]
        compressor: String,
    },
    /// Print container header, sizes, and payload digest of a slot
    Inspect {
        #[arg(short, long, default_value = "saves")]
        dir: PathBuf,
        #[arg(short, long, default_value = "autosave")]
        slot: String,
        #[arg(short, long, default_value = "lzw")]
        compressor: String,
    },
    /// LZW-compress any file into 16-bit code units (UTF-16LE on disk)
    Compress {
        /// Source file ("-" reads stdin)
        input: PathBuf,
        /// Destination file ("-" writes to stdout)
        output: PathBuf,
    },
    /// Reverse `compress`
    Decompress {
        /// Source file ("-" reads stdin)
        input: PathBuf,
        /// Destination file ("-" writes to stdout)
        output: PathBuf,
    },
    /// Compare LZW against zstd, lz4, and gzip on the same bytes
    ///
    /// Without an input file, a serialized sample world is used.
    Compare {
        /// File to compress
        input: Option<PathBuf>,
        /// Seed for the sample world when no input is given
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Agents in the sample world when no input is given
        #[arg(short, long, default_value_t = 2000)]
        agents: usize,
        /// Zstd compression level (1–22)
        #[arg(long, default_value_t = 3)]
        zstd_level: i32,
    },
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    if path.to_str() == Some("-") {
        let mut buf = Vec::new();
        io::stdin().lock().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        fs::read(path).with_context(|| format!("reading input file {:?}", path))
    }
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if path.to_str() == Some("-") {
        io::stdout().lock().write_all(bytes)?;
        Ok(())
    } else {
        fs::write(path, bytes).with_context(|| format!("writing output file {:?}", path))
    }
}

fn throughput(bytes: usize, secs: f64) -> String {
    if secs <= 0.0 {
        return "-".to_string();
    }
    format!("{}/s", human_bytes((bytes as f64 / secs) as u64))
}

// ── Subcommand implementations ─────────────────────────────────────────────

fn run_save(
    dir: PathBuf,
    slot: &str,
    seed: u64,
    (width, height): (u32, u32),
    agents: usize,
    compressor_name: &str,
) -> anyhow::Result<()> {
    let compressor = compressor_by_name(compressor_name)?;
    let codec = world_codec()?;
    let mut store =
        DirSlots::open(&dir).with_context(|| format!("opening slot directory {:?}", dir))?;

    let world = World::generate(seed, width, height, agents)?;
    let t0 = Instant::now();
    let report = save(&mut store, slot, &codec, compressor.as_ref(), &world)?;
    let elapsed = t0.elapsed();

    eprintln!("  slot        : {:?}", store.path_for(slot));
    eprintln!("  compressor  : {}", compressor.name());
    eprintln!("  world       : {}x{}, {} agents, {} squads", width, height, agents, world.squads.len());
    eprintln!("  raw size    : {}", human_bytes(report.raw_len as u64));
    eprintln!("  stored      : {} units ({})", report.packed_units, human_bytes(report.packed_units as u64 * 2));
    eprintln!("  ratio       : {:.3}", report.ratio());
    eprintln!("  digest      : {:016x}", report.digest);
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn run_load(dir: PathBuf, slot: &str, compressor_name: &str) -> anyhow::Result<()> {
    let compressor = compressor_by_name(compressor_name)?;
    let codec = world_codec()?;
    let store = DirSlots::open(&dir).with_context(|| format!("opening slot directory {:?}", dir))?;

    let t0 = Instant::now();
    let Some(world) = load::<World, _, _>(&store, slot, &codec, compressor.as_ref())? else {
        anyhow::bail!("slot '{}' has no save in {:?}", slot, dir);
    };
    let elapsed = t0.elapsed();

    println!("=== slot '{}' ===", slot);
    println!();
    println!("  turn        : {}", world.turn);
    println!("  map         : {}x{} ({} tiles)", world.width, world.height, world.tile_count);
    println!("  resources   : {}", world.resources.iter().map(|r| r.get() as u64).sum::<u64>());
    println!("  agents      : {} ({} alive)", world.agents.len(), world.alive_count());
    for (faction, count) in world.faction_counts() {
        println!("    {:<9} : {}", faction, count);
    }
    println!("  orders      : {}", world.order_count());
    println!("  squads      : {}", world.squads.len());
    println!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn run_inspect(dir: PathBuf, slot: &str, compressor_name: &str) -> anyhow::Result<()> {
    let compressor = compressor_by_name(compressor_name)?;
    let store = DirSlots::open(&dir).with_context(|| format!("opening slot directory {:?}", dir))?;
    let path = store.path_for(slot);
    let Some(packed) = store.get(slot).with_context(|| format!("reading {:?}", path))? else {
        anyhow::bail!("slot '{}' has no save in {:?}", slot, dir);
    };
    let (raw_len, body) = packed.split_header()?;

    println!("=== slot file: {:?} ===", path);
    println!();
    println!("  header      : {};", raw_len);
    println!("  code units  : {} ({} body)", packed.len(), body.len());
    println!("  on disk     : {}", human_bytes(fs::metadata(&path)?.len()));
    println!("  raw size    : {}", human_bytes(raw_len as u64));

    match compressor.decompress(&packed) {
        Ok(raw) => {
            let report = SaveReport::for_payload(&raw, &packed);
            println!("  ratio       : {:.3}", report.ratio());
            println!("  digest      : {:016x}", report.digest);
        }
        Err(e) => println!("  payload     : does not decompress with {}: {}", compressor.name(), e),
    }
    Ok(())
}

fn run_compress(input: PathBuf, output: PathBuf) -> anyhow::Result<()> {
    let raw = read_input(&input)?;
    let t0 = Instant::now();
    let packed = LzwCompressor.compress(&raw);
    let elapsed = t0.elapsed();
    let bytes = packed.to_le_bytes();
    write_output(&output, &bytes)?;

    eprintln!("  raw size    : {}", human_bytes(raw.len() as u64));
    eprintln!("  compressed  : {} ({} units)", human_bytes(bytes.len() as u64), packed.len());
    eprintln!("  ratio       : {:.2}x", raw.len() as f64 / bytes.len() as f64);
    eprintln!("  throughput  : {}", throughput(raw.len(), elapsed.as_secs_f64()));
    Ok(())
}

fn run_decompress(input: PathBuf, output: PathBuf) -> anyhow::Result<()> {
    let bytes = read_input(&input)?;
    let packed = PackedText::from_le_bytes(&bytes)?;
    let t0 = Instant::now();
    let raw = LzwCompressor
        .decompress(&packed)
        .with_context(|| format!("decompressing {:?}", input))?;
    let elapsed = t0.elapsed();
    write_output(&output, &raw)?;

    eprintln!("  raw size    : {}", human_bytes(raw.len() as u64));
    eprintln!("  throughput  : {}", throughput(raw.len(), elapsed.as_secs_f64()));
    Ok(())
}

fn run_compare(input: Option<PathBuf>, seed: u64, agents: usize, zstd_level: i32) -> anyhow::Result<()> {
    let raw = match &input {
        Some(path) => read_input(path)?,
        None => {
            let world = World::generate(seed, 128, 128, agents)?;
            to_bytes(&world_codec()?, &world)?
        }
    };
    let source = match &input {
        Some(path) => format!("{:?}", path),
        None => format!("sample world (seed {}, {} agents)", seed, agents),
    };

    let mut rows: Vec<(&str, usize, f64)> = Vec::new();

    let t0 = Instant::now();
    let packed = LzwCompressor.compress(&raw);
    rows.push(("lzw", packed.len() * 2, t0.elapsed().as_secs_f64()));
    let back = LzwCompressor.decompress(&packed)?;
    anyhow::ensure!(back == raw, "lzw round-trip mismatch");

    let t0 = Instant::now();
    let z = zstd::bulk::compress(&raw, zstd_level)?;
    rows.push(("zstd", z.len(), t0.elapsed().as_secs_f64()));

    let t0 = Instant::now();
    let l = lz4_flex::compress_prepend_size(&raw);
    rows.push(("lz4", l.len(), t0.elapsed().as_secs_f64()));

    let t0 = Instant::now();
    let mut gz = GzEncoder::new(Vec::new(), GzCompression::default());
    gz.write_all(&raw)?;
    let g = gz.finish()?;
    rows.push(("gzip", g.len(), t0.elapsed().as_secs_f64()));

    println!("=== {} : {} ===", source, human_bytes(raw.len() as u64));
    println!();
    println!("  {:<6}  {:>12}  {:>8}  {:>14}", "codec", "size", "ratio", "throughput");
    println!("  {}", "-".repeat(46));
    for (name, size, secs) in rows {
        println!(
            "  {:<6}  {:>12}  {:>7.2}x  {:>14}",
            name,
            human_bytes(size as u64),
            raw.len() as f64 / size.max(1) as f64,
            throughput(raw.len(), secs)
        );
    }
    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Save {
            dir,
            slot,
            seed,
            width,
            height,
            agents,
            compressor,
        } => run_save(dir, &slot, seed, (width, height), agents, &compressor),
        Commands::Load {
            dir,
            slot,
            compressor,
        } => run_load(dir, &slot, &compressor),
        Commands::Inspect {
            dir,
            slot,
            compressor,
        } => run_inspect(dir, &slot, &compressor),
        Commands::Compress { input, output } => run_compress(input, output),
        Commands::Decompress { input, output } => run_decompress(input, output),
        Commands::Compare {
            input,
            seed,
            agents,
            zstd_level,
        } => run_compare(input, seed, agents, zstd_level),
    }
}
