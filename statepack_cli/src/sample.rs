//! Sample turn-based world used by `save`, `load` and `compare`.
//!
//! The schema touches every codec the library offers: aligned numeric
//! buffers, a derived field, a closed enum, a tagged union, optional values,
//! and agent/squad cross-references stored as arena links.

use anyhow::Context;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

use statepack_core::link::check_all;
use statepack_core::{
    ArrayOf, Bool, CodecError, CodecResult, EnumOf, Le16, Le32, Link, LinkCodec, ObjectCodec,
    OptionalOf, SchemaError, StagedCodec, Str, U16Buffer, U32Buffer, UnionCodec, Varint, F32,
};

pub const FACTIONS: [&str; 3] = ["crown", "guild", "wilds"];

const TERRAIN_KINDS: u16 = 6;
const NAMES: [&str; 8] = [
    "ash", "birch", "cedar", "elm", "fir", "hazel", "larch", "rowan",
];

// ── Model ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Waypoint {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Order {
    Move(Waypoint),
    Attack(Link<Agent>),
    Hold,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Agent {
    pub id: u32,
    pub name: String,
    pub faction: String,
    pub pos: Waypoint,
    pub alive: bool,
    pub target: Option<Link<Agent>>,
    pub squad: Option<Link<Squad>>,
    pub orders: Vec<Order>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Squad {
    pub label: String,
    pub members: Vec<Link<Agent>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct World {
    pub turn: u32,
    pub width: u32,
    pub height: u32,
    /// Always `width * height`; recomputed on load, never stored.
    pub tile_count: u32,
    pub terrain: Vec<Le16>,
    pub resources: Vec<Le32>,
    pub agents: Vec<Agent>,
    pub squads: Vec<Squad>,
}

impl World {
    /// Deterministic world for `seed`.
    ///
    /// Fails when `width * height` does not fit the stored tile count.
    pub fn generate(seed: u64, width: u32, height: u32, agent_count: usize) -> anyhow::Result<Self> {
        let tiles = width
            .checked_mul(height)
            .with_context(|| format!("{}x{} map is too large", width, height))?;
        let mut rng = Pcg64Mcg::seed_from_u64(seed);

        // Terrain comes in horizontal runs, like real maps; resources are
        // sparse.
        let mut terrain = Vec::with_capacity(tiles as usize);
        let mut kind = 0u16;
        while terrain.len() < tiles as usize {
            let run = rng.gen_range(1..=width.max(1)) as usize;
            let run = run.min(tiles as usize - terrain.len());
            terrain.extend(std::iter::repeat(Le16::new(kind)).take(run));
            kind = rng.gen_range(0..TERRAIN_KINDS);
        }
        let resources: Vec<Le32> = (0..tiles)
            .map(|_| {
                if rng.gen_bool(0.1) {
                    Le32::new(rng.gen_range(1..5000))
                } else {
                    Le32::new(0)
                }
            })
            .collect();

        let squad_count = (agent_count / 4).max(usize::from(agent_count > 0));
        let mut squads: Vec<Squad> = (0..squad_count)
            .map(|i| Squad {
                label: format!("squad-{i}"),
                members: Vec::new(),
            })
            .collect();

        let mut agents = Vec::with_capacity(agent_count);
        for id in 0..agent_count {
            let squad = if squad_count > 0 && rng.gen_bool(0.8) {
                let s = rng.gen_range(0..squad_count);
                squads[s].members.push(Link::new(id as u32));
                Some(Link::new(s as u32))
            } else {
                None
            };
            let target = (agent_count > 1 && rng.gen_bool(0.3))
                .then(|| Link::new(rng.gen_range(0..agent_count) as u32));
            let orders = (0..rng.gen_range(0..4))
                .map(|_| match rng.gen_range(0..3) {
                    0 => Order::Move(Waypoint {
                        x: rng.gen_range(0..width.max(1)) as f32,
                        y: rng.gen_range(0..height.max(1)) as f32,
                    }),
                    1 => Order::Attack(Link::new(rng.gen_range(0..agent_count) as u32)),
                    _ => Order::Hold,
                })
                .collect();
            agents.push(Agent {
                id: id as u32,
                name: format!("{}-{}", NAMES[id % NAMES.len()], id / NAMES.len()),
                faction: FACTIONS[rng.gen_range(0..FACTIONS.len())].to_string(),
                pos: Waypoint {
                    x: rng.gen_range(0.0..width.max(1) as f32),
                    y: rng.gen_range(0.0..height.max(1) as f32),
                },
                alive: rng.gen_bool(0.9),
                target,
                squad,
                orders,
            });
        }

        Ok(Self {
            turn: rng.gen_range(0..1000),
            width,
            height,
            tile_count: tiles,
            terrain,
            resources,
            agents,
            squads,
        })
    }

    pub fn alive_count(&self) -> usize {
        self.agents.iter().filter(|a| a.alive).count()
    }

    pub fn order_count(&self) -> usize {
        self.agents.iter().map(|a| a.orders.len()).sum()
    }

    /// Agents per faction, in [`FACTIONS`] order.
    pub fn faction_counts(&self) -> Vec<(&'static str, usize)> {
        FACTIONS
            .iter()
            .map(|&f| (f, self.agents.iter().filter(|a| a.faction == f).count()))
            .collect()
    }
}

// ── Schema ─────────────────────────────────────────────────────────────────

/// Decode-side accumulator for [`World`]; `tile_count` is filled by a
/// derived stage.
#[derive(Default)]
pub struct WorldDraft {
    turn: u32,
    width: u32,
    height: u32,
    tile_count: u32,
    terrain: Vec<Le16>,
    resources: Vec<Le32>,
    agents: Vec<Agent>,
    squads: Vec<Squad>,
}

pub type WorldCodec = StagedCodec<WorldDraft, World>;

fn waypoint_codec() -> ObjectCodec<Waypoint> {
    ObjectCodec::builder("Waypoint")
        .field("x", F32, |w: &Waypoint| &w.x, |w, v| w.x = v)
        .field("y", F32, |w: &Waypoint| &w.y, |w, v| w.y = v)
        .build_object()
}

// Discriminants are part of the save format; append new orders only.
const ORDER_MOVE: u8 = 0;
const ORDER_ATTACK: u8 = 1;
const ORDER_HOLD: u8 = 2;

fn order_codec() -> Result<UnionCodec<Order>, SchemaError> {
    UnionCodec::builder("Order")
        .variant(
            ORDER_MOVE,
            "move",
            waypoint_codec(),
            |o: &Order| match o {
                Order::Move(w) => Some(w),
                _ => None,
            },
            Order::Move,
        )
        .variant(
            ORDER_ATTACK,
            "attack",
            LinkCodec,
            |o: &Order| match o {
                Order::Attack(l) => Some(l),
                _ => None,
            },
            Order::Attack,
        )
        .unit(ORDER_HOLD, "hold", |o: &Order| matches!(o, Order::Hold), || Order::Hold)
        .seal()
}

fn agent_codec() -> Result<ObjectCodec<Agent>, SchemaError> {
    let factions = EnumOf::new("Faction", FACTIONS)?;
    Ok(ObjectCodec::builder("Agent")
        .field("id", Varint, |a: &Agent| &a.id, |a, v| a.id = v)
        .field("name", Str, |a: &Agent| &a.name, |a, v| a.name = v)
        .field("faction", factions, |a: &Agent| &a.faction, |a, v| a.faction = v)
        .field("pos", waypoint_codec(), |a: &Agent| &a.pos, |a, v| a.pos = v)
        .field("alive", Bool, |a: &Agent| &a.alive, |a, v| a.alive = v)
        .field("target", OptionalOf(LinkCodec), |a: &Agent| &a.target, |a, v| a.target = v)
        .field("squad", OptionalOf(LinkCodec), |a: &Agent| &a.squad, |a, v| a.squad = v)
        .field("orders", ArrayOf(order_codec()?), |a: &Agent| &a.orders, |a, v| a.orders = v)
        .build_object())
}

fn squad_codec() -> ObjectCodec<Squad> {
    ObjectCodec::builder("Squad")
        .field("label", Str, |s: &Squad| &s.label, |s, v| s.label = v)
        .field("members", ArrayOf(LinkCodec), |s: &Squad| &s.members, |s, v| s.members = v)
        .build_object()
}

/// Every link must land inside its arena, and squad membership must agree
/// in both directions.
fn link_world(world: &mut World) -> CodecResult<()> {
    let agents = world.agents.len();
    let squads = world.squads.len();
    for (a, agent) in world.agents.iter().enumerate() {
        check_all("agent", agents, agent.target)?;
        check_all("squad", squads, agent.squad)?;
        if let Some(squad) = agent.squad {
            if !world.squads[squad.index()].members.iter().any(|m| m.index() == a) {
                return Err(CodecError::Invalid(format!(
                    "agent {} points at squad {} which does not list it",
                    a,
                    squad.index()
                )));
            }
        }
        check_all(
            "agent",
            agents,
            agent.orders.iter().filter_map(|o| match o {
                Order::Attack(l) => Some(*l),
                _ => None,
            }),
        )?;
    }
    for (i, squad) in world.squads.iter().enumerate() {
        check_all("agent", agents, squad.members.iter().copied())?;
        for member in &squad.members {
            let back = world.agents[member.index()].squad.map(|l| l.index());
            if back != Some(i) {
                return Err(CodecError::Invalid(format!(
                    "agent {} is listed in squad {} but points at {:?}",
                    member.index(),
                    i,
                    back
                )));
            }
        }
    }
    Ok(())
}

pub fn world_codec() -> Result<WorldCodec, SchemaError> {
    Ok(StagedCodec::builder("World")
        .field("turn", Varint, |w: &World| &w.turn, |d: &mut WorldDraft, v| d.turn = v)
        .field("width", Varint, |w: &World| &w.width, |d: &mut WorldDraft, v| d.width = v)
        .field("height", Varint, |w: &World| &w.height, |d: &mut WorldDraft, v| d.height = v)
        .derive("tile_count", |d: &mut WorldDraft| {
            d.tile_count = d.width.checked_mul(d.height).ok_or_else(|| {
                CodecError::Invalid(format!("{}x{} map is too large", d.width, d.height))
            })?;
            Ok(())
        })
        .field("terrain", U16Buffer, |w: &World| &w.terrain, |d: &mut WorldDraft, v| d.terrain = v)
        .field(
            "resources",
            U32Buffer,
            |w: &World| &w.resources,
            |d: &mut WorldDraft, v| d.resources = v,
        )
        .field("agents", ArrayOf(agent_codec()?), |w: &World| &w.agents, |d: &mut WorldDraft, v| {
            d.agents = v
        })
        .field("squads", ArrayOf(squad_codec()), |w: &World| &w.squads, |d: &mut WorldDraft, v| {
            d.squads = v
        })
        .link(link_world)
        .build(|d: WorldDraft| {
            for actual in [d.terrain.len(), d.resources.len()] {
                if actual != d.tile_count as usize {
                    return Err(CodecError::LengthMismatch {
                        expected: d.tile_count as usize,
                        actual,
                    });
                }
            }
            Ok(World {
                turn: d.turn,
                width: d.width,
                height: d.height,
                tile_count: d.tile_count,
                terrain: d.terrain,
                resources: d.resources,
                agents: d.agents,
                squads: d.squads,
            })
        }))
}
