//! Integration tests: a complete turn-based state schema pushed through the
//! save/load façade with the LZW compressor, on both slot stores.
//!
//! Test sequence:
//!  1. Describe a campaign schema using every combinator (objects, a derived
//!     stage, enum, union, options, aligned buffers, arena links)
//!  2. Generate seeded pseudo-random campaigns and round-trip them in memory
//!  3. Save and load through `MemorySlots` and `DirSlots`
//!  4. Corrupt stored slots and check the failure is reported, never a
//!     silently wrong value
use std::fs;
use std::path::PathBuf;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

use statepack_codecs::{LzwCompressor, PassThroughCompressor};
use statepack_core::link::check_all;
use statepack_core::persist::SLOT_EXTENSION;
use statepack_core::{
    from_bytes, load, save, to_bytes, ArrayOf, Bool, CodecError, Compressor, DirSlots, EnumOf,
    Le16, Le32, Link, LinkCodec, MemorySlots, ObjectCodec, OptionalOf, PackedText, PersistError,
    SlotStore, StagedCodec, Str, U16Buffer, U32Buffer, UnionCodec, Varint, F32,
};

// ── schema ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Spawn { unit: Link<Unit> },
    Chat(String),
    Tick,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Unit {
    name: String,
    class: String,
    hp: u32,
    heading: f32,
    ready: bool,
    house: Option<Link<House>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct House {
    banner: String,
    units: Vec<Link<Unit>>,
}

#[derive(Debug, Clone, PartialEq)]
struct Campaign {
    cols: u32,
    rows: u32,
    /// Recomputed on decode.
    cells: u32,
    heights: Vec<Le16>,
    owners: Vec<Le32>,
    units: Vec<Unit>,
    houses: Vec<House>,
    log: Vec<Event>,
}

#[derive(Default)]
struct CampaignDraft {
    cols: u32,
    rows: u32,
    cells: u32,
    heights: Vec<Le16>,
    owners: Vec<Le32>,
    units: Vec<Unit>,
    houses: Vec<House>,
    log: Vec<Event>,
}

const CLASSES: [&str; 4] = ["scout", "pike", "archer", "healer"];

fn unit_codec() -> ObjectCodec<Unit> {
    ObjectCodec::builder("Unit")
        .field("name", Str, |u: &Unit| &u.name, |u, v| u.name = v)
        .field(
            "class",
            EnumOf::new("Class", CLASSES).unwrap(),
            |u: &Unit| &u.class,
            |u, v| u.class = v,
        )
        .field("hp", Varint, |u: &Unit| &u.hp, |u, v| u.hp = v)
        .field("heading", F32, |u: &Unit| &u.heading, |u, v| u.heading = v)
        .field("ready", Bool, |u: &Unit| &u.ready, |u, v| u.ready = v)
        .field("house", OptionalOf(LinkCodec), |u: &Unit| &u.house, |u, v| u.house = v)
        .build_object()
}

fn house_codec() -> ObjectCodec<House> {
    ObjectCodec::builder("House")
        .field("banner", Str, |h: &House| &h.banner, |h, v| h.banner = v)
        .field("units", ArrayOf(LinkCodec), |h: &House| &h.units, |h, v| h.units = v)
        .build_object()
}

fn event_codec() -> UnionCodec<Event> {
    UnionCodec::builder("Event")
        .unit(2, "tick", |e: &Event| matches!(e, Event::Tick), || Event::Tick)
        .variant(
            0,
            "spawn",
            LinkCodec,
            |e: &Event| match e {
                Event::Spawn { unit } => Some(unit),
                _ => None,
            },
            |unit: Link<Unit>| Event::Spawn { unit },
        )
        .variant(
            1,
            "chat",
            Str,
            |e: &Event| match e {
                Event::Chat(s) => Some(s),
                _ => None,
            },
            Event::Chat,
        )
        .seal()
        .unwrap()
}

fn campaign_codec() -> StagedCodec<CampaignDraft, Campaign> {
    StagedCodec::builder("Campaign")
        .field("cols", Varint, |c: &Campaign| &c.cols, |d: &mut CampaignDraft, v| d.cols = v)
        .field("rows", Varint, |c: &Campaign| &c.rows, |d: &mut CampaignDraft, v| d.rows = v)
        .derive("cells", |d: &mut CampaignDraft| {
            d.cells = d.cols * d.rows;
            Ok(())
        })
        .field("heights", U16Buffer, |c: &Campaign| &c.heights, |d: &mut CampaignDraft, v| {
            d.heights = v
        })
        .field("owners", U32Buffer, |c: &Campaign| &c.owners, |d: &mut CampaignDraft, v| {
            d.owners = v
        })
        .field("units", ArrayOf(unit_codec()), |c: &Campaign| &c.units, |d: &mut CampaignDraft, v| {
            d.units = v
        })
        .field("houses", ArrayOf(house_codec()), |c: &Campaign| &c.houses, |d: &mut CampaignDraft, v| {
            d.houses = v
        })
        .field("log", ArrayOf(event_codec()), |c: &Campaign| &c.log, |d: &mut CampaignDraft, v| {
            d.log = v
        })
        .link(|c: &mut Campaign| {
            check_all("house", c.houses.len(), c.units.iter().filter_map(|u| u.house))?;
            for h in &c.houses {
                check_all("unit", c.units.len(), h.units.iter().copied())?;
            }
            check_all(
                "unit",
                c.units.len(),
                c.log.iter().filter_map(|e| match e {
                    Event::Spawn { unit } => Some(*unit),
                    _ => None,
                }),
            )
        })
        .build(|d: CampaignDraft| {
            if d.heights.len() != d.cells as usize {
                return Err(CodecError::LengthMismatch {
                    expected: d.cells as usize,
                    actual: d.heights.len(),
                });
            }
            Ok(Campaign {
                cols: d.cols,
                rows: d.rows,
                cells: d.cells,
                heights: d.heights,
                owners: d.owners,
                units: d.units,
                houses: d.houses,
                log: d.log,
            })
        })
}

// ── helpers ───────────────────────────────────────────────────────────────

/// Generate a campaign from `seed`. `scale` grows every arena.
fn campaign(seed: u64, scale: usize) -> Campaign {
    let mut rng = Pcg64Mcg::seed_from_u64(seed);
    let cols = rng.gen_range(1..=8 * scale as u32);
    let rows = rng.gen_range(1..=8 * scale as u32);
    let cells = cols * rows;
    let unit_count = rng.gen_range(0..=4 * scale);
    let house_count = rng.gen_range(1..=scale.max(1));

    let mut houses: Vec<House> = (0..house_count)
        .map(|i| House {
            banner: format!("house {i} ⚔"),
            units: Vec::new(),
        })
        .collect();
    let units: Vec<Unit> = (0..unit_count)
        .map(|i| {
            let house = rng.gen_bool(0.7).then(|| rng.gen_range(0..house_count));
            if let Some(h) = house {
                houses[h].units.push(Link::new(i as u32));
            }
            Unit {
                name: format!("u{i}"),
                class: CLASSES[rng.gen_range(0..CLASSES.len())].to_string(),
                hp: rng.gen_range(0..100_000),
                heading: rng.gen_range(-180.0..180.0),
                ready: rng.gen(),
                house: house.map(|h| Link::new(h as u32)),
            }
        })
        .collect();
    let log = (0..rng.gen_range(0..3 * scale + 1))
        .map(|i| match rng.gen_range(0..3) {
            0 if unit_count > 0 => Event::Spawn {
                unit: Link::new(rng.gen_range(0..unit_count) as u32),
            },
            1 => Event::Chat(format!("turn {i}: gg 🎲")),
            _ => Event::Tick,
        })
        .collect();

    Campaign {
        cols,
        rows,
        cells,
        heights: (0..cells).map(|c| Le16::new((c % 7) as u16 * 100)).collect(),
        owners: (0..cells).map(|_| Le32::new(rng.gen_range(0..4))).collect(),
        units,
        houses,
        log,
    }
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("statepack_test_{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

// ── tests ──────────────────────────────────────────────────────────────────

#[test]
fn test_random_campaigns_round_trip() {
    let codec = campaign_codec();
    for seed in 0..100 {
        let value = campaign(seed, 1 + seed as usize % 5);
        let bytes = to_bytes(&codec, &value).unwrap();
        let back: Campaign = from_bytes(&codec, &bytes).unwrap();
        assert_eq!(back, value, "seed {seed}");
        assert_eq!(back.cells, back.cols * back.rows);
    }
}

#[test]
fn test_every_prefix_fails() {
    let codec = campaign_codec();
    let value = campaign(5, 2);
    let bytes = to_bytes(&codec, &value).unwrap();
    for cut in 0..bytes.len() {
        assert!(
            from_bytes::<Campaign, _>(&codec, &bytes[..cut]).is_err(),
            "prefix of {cut}/{} bytes decoded",
            bytes.len()
        );
    }
}

#[test]
fn test_memory_slots_round_trip() {
    let codec = campaign_codec();
    let mut store = MemorySlots::new();
    let value = campaign(11, 3);

    let report = save(&mut store, "turn-12", &codec, &LzwCompressor, &value).unwrap();
    assert_eq!(report.raw_len, to_bytes(&codec, &value).unwrap().len());

    let loaded = load::<Campaign, _, _>(&store, "turn-12", &codec, &LzwCompressor).unwrap();
    assert_eq!(loaded, Some(value));
}

#[test]
fn test_missing_slot_is_none() {
    let codec = campaign_codec();
    let store = MemorySlots::new();
    assert_eq!(load::<Campaign, _, _>(&store, "never", &codec, &LzwCompressor).unwrap(), None);

    let dir = DirSlots::open(temp_dir("missing")).unwrap();
    assert_eq!(load::<Campaign, _, _>(&dir, "never", &codec, &LzwCompressor).unwrap(), None);
    let _ = fs::remove_dir_all(dir.root());
}

#[test]
fn test_dir_slots_round_trip_and_overwrite() {
    let codec = campaign_codec();
    let mut store = DirSlots::open(temp_dir("dir")).unwrap();

    let first = campaign(1, 2);
    let second = campaign(2, 4);
    save(&mut store, "main", &codec, &LzwCompressor, &first).unwrap();
    save(&mut store, "main", &codec, &LzwCompressor, &second).unwrap();

    let path = store.path_for("main");
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some(SLOT_EXTENSION));
    // On disk: the container's units as UTF-16LE, header first.
    let on_disk = fs::read(&path).unwrap();
    let raw_len = to_bytes(&codec, &second).unwrap().len();
    let header: Vec<u8> = format!("{raw_len};").bytes().flat_map(|b| [b, 0]).collect();
    assert!(on_disk.starts_with(&header));
    assert!(!path.with_extension(format!("{SLOT_EXTENSION}.tmp")).exists());

    assert_eq!(load::<Campaign, _, _>(&store, "main", &codec, &LzwCompressor).unwrap(), Some(second));
    let _ = fs::remove_dir_all(store.root());
}

#[test]
fn test_large_state_crosses_dictionary_resets() {
    // Noisy owner buffers leave the LZW dictionary little to reuse, so the
    // code space fills and resets mid-save.
    let codec = campaign_codec();
    let mut value = campaign(3, 40);
    let mut rng = Pcg64Mcg::seed_from_u64(99);
    value.cols = 512;
    value.rows = 256;
    value.cells = value.cols * value.rows;
    value.heights = (0..value.cells).map(|_| Le16::new(rng.gen())).collect();
    value.owners = (0..value.cells).map(|_| Le32::new(rng.gen())).collect();

    let mut store = MemorySlots::new();
    let report = save(&mut store, "big", &codec, &LzwCompressor, &value).unwrap();
    assert!(report.raw_len > 600_000);
    assert_eq!(load::<Campaign, _, _>(&store, "big", &codec, &LzwCompressor).unwrap(), Some(value));
}

#[test]
fn test_corrupt_slot_is_an_error() {
    let codec = campaign_codec();
    let mut store = MemorySlots::new();
    let value = campaign(8, 2);
    save(&mut store, "s", &codec, &LzwCompressor, &value).unwrap();

    // Header claims one byte more than the stream produces.
    let packed = store.get("s").unwrap().unwrap();
    let (raw_len, body) = packed.split_header().unwrap();
    let mut units: Vec<u16> = format!("{};", raw_len + 1).encode_utf16().collect();
    units.extend_from_slice(body);
    store.set("s", &PackedText::from_units(units)).unwrap();
    match load::<Campaign, _, _>(&store, "s", &codec, &LzwCompressor) {
        Err(PersistError::Codec { slot, source }) => {
            assert_eq!(slot, "s");
            assert!(matches!(source, CodecError::LengthMismatch { .. }));
        }
        other => panic!("expected a corrupt-slot error, got {other:?}"),
    }

    store.set("s", &PackedText::from_text("garbage")).unwrap();
    assert!(matches!(
        load::<Campaign, _, _>(&store, "s", &codec, &LzwCompressor),
        Err(PersistError::Codec {
            source: CodecError::MalformedContainer(_),
            ..
        })
    ));
}

#[test]
fn test_corrupt_file_is_an_error() {
    let codec = campaign_codec();
    let mut store = DirSlots::open(temp_dir("corrupt")).unwrap();
    save(&mut store, "s", &codec, &LzwCompressor, &campaign(4, 1)).unwrap();

    // An odd byte count cannot be a sequence of 16-bit units.
    let path = store.path_for("s");
    let mut bytes = fs::read(&path).unwrap();
    bytes.push(0);
    fs::write(&path, &bytes).unwrap();
    // Reported like any other corrupt slot, not as a storage failure.
    match load::<Campaign, _, _>(&store, "s", &codec, &LzwCompressor) {
        Err(PersistError::Codec { slot, source }) => {
            assert_eq!(slot, "s");
            assert!(matches!(source, CodecError::MalformedContainer(_)));
        }
        other => panic!("expected a corrupt-slot error, got {other:?}"),
    }
    let _ = fs::remove_dir_all(store.root());
}

#[test]
fn test_compressor_mismatch() {
    let codec = campaign_codec();
    let mut store = MemorySlots::new();
    let mut value = campaign(6, 2);
    value.cols = 16;
    value.rows = 16;
    value.cells = 256;
    value.heights = (0..256u16).map(|c| Le16::new(c % 7 * 100)).collect();
    value.owners = vec![Le32::new(0); 256];

    // A pass-through body is also a literal-only LZW stream.
    save(&mut store, "plain", &codec, &PassThroughCompressor, &value).unwrap();
    assert_eq!(
        load::<Campaign, _, _>(&store, "plain", &codec, &LzwCompressor).unwrap(),
        Some(value.clone())
    );

    // The reverse never holds once the dictionary has been used.
    save(&mut store, "packed", &codec, &LzwCompressor, &value).unwrap();
    let compressors: [&dyn Compressor; 2] = [&LzwCompressor, &PassThroughCompressor];
    assert!(load::<Campaign, _, _>(&store, "packed", &codec, compressors[0]).is_ok());
    assert!(matches!(
        load::<Campaign, _, _>(&store, "packed", &codec, compressors[1]),
        Err(PersistError::Codec { .. })
    ));
}

#[test]
fn test_invalid_slot_names_are_refused() {
    let codec = campaign_codec();
    let mut store = MemorySlots::new();
    assert!(matches!(
        save(&mut store, "../escape", &codec, &LzwCompressor, &campaign(0, 1)),
        Err(PersistError::InvalidSlotName(_))
    ));
}
