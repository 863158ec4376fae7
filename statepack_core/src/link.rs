//! Arena links: cross-references persisted as indices.
//!
//! Objects that refer to each other are stored in flat arenas (`Vec<T>`)
//! and hold a [`Link<T>`] instead of a direct reference. A link is written
//! as a varint7 index. Decoding never needs a placeholder for the other side:
//! once every arena is decoded, a link pass checks each index with
//! [`Link::check`] and callers look targets up with [`Link::get`].

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::codec::Codec;
use crate::cursor::Cursor;
use crate::error::{CodecError, CodecResult};
use crate::primitives::{read_varint, write_varint};
use crate::sink::Sink;

/// Typed index into an arena of `T`.
pub struct Link<T> {
    index: u32,
    _target: PhantomData<fn() -> T>,
}

impl<T> Link<T> {
    pub const fn new(index: u32) -> Self {
        Self {
            index,
            _target: PhantomData,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }

    /// Fail with [`CodecError::DanglingLink`] unless the index is inside an
    /// arena of `len` entries.
    pub fn check(self, kind: &'static str, len: usize) -> CodecResult<()> {
        if self.index() < len {
            Ok(())
        } else {
            Err(CodecError::DanglingLink {
                kind,
                index: self.index(),
                len,
            })
        }
    }

    pub fn get(self, arena: &[T]) -> Option<&T> {
        arena.get(self.index())
    }
}

impl<T> Clone for Link<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Link<T> {}

impl<T> PartialEq for Link<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Link<T> {}

impl<T> Hash for Link<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for Link<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Link({})", self.index)
    }
}

/// Wire codec for [`Link`]: a varint7 index.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkCodec;

impl<T> Codec<Link<T>> for LinkCodec {
    fn encode(&self, sink: &mut Sink, value: &Link<T>) -> CodecResult<()> {
        write_varint(sink, value.index as u64);
        Ok(())
    }

    fn decode(&self, cursor: &mut Cursor<'_>) -> CodecResult<Link<T>> {
        let index = read_varint(cursor, u32::BITS)?;
        Ok(Link::new(index as u32))
    }
}

/// Check every link yielded by `links` against an arena of `len` entries.
pub fn check_all<T>(
    kind: &'static str,
    len: usize,
    links: impl IntoIterator<Item = Link<T>>,
) -> CodecResult<()> {
    links.into_iter().try_for_each(|l| l.check(kind, len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{from_bytes, to_bytes};
    use crate::combinators::{ArrayOf, OptionalOf};
    use crate::primitives::Str;
    use crate::staged::ObjectCodec;

    // Squads list their members and every member points back at its squad.
    #[derive(Debug, Default, Clone, PartialEq)]
    struct Member {
        name: String,
        squad: Option<Link<Squad>>,
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Squad {
        label: String,
        members: Vec<Link<Member>>,
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Army {
        members: Vec<Member>,
        squads: Vec<Squad>,
    }

    fn army_codec() -> ObjectCodec<Army> {
        let member = ObjectCodec::builder("Member")
            .field("name", Str, |m: &Member| &m.name, |m, v| m.name = v)
            .field("squad", OptionalOf(LinkCodec), |m: &Member| &m.squad, |m, v| m.squad = v)
            .build_object();
        let squad = ObjectCodec::builder("Squad")
            .field("label", Str, |s: &Squad| &s.label, |s, v| s.label = v)
            .field("members", ArrayOf(LinkCodec), |s: &Squad| &s.members, |s, v| s.members = v)
            .build_object();
        ObjectCodec::builder("Army")
            .field("members", ArrayOf(member), |a: &Army| &a.members, |a, v| a.members = v)
            .field("squads", ArrayOf(squad), |a: &Army| &a.squads, |a, v| a.squads = v)
            .link(|a: &mut Army| {
                check_all("squad", a.squads.len(), a.members.iter().filter_map(|m| m.squad))?;
                for s in &a.squads {
                    check_all("member", a.members.len(), s.members.iter().copied())?;
                }
                Ok(())
            })
            .build_object()
    }

    fn sample() -> Army {
        Army {
            members: vec![
                Member {
                    name: "ash".into(),
                    squad: Some(Link::new(0)),
                },
                Member {
                    name: "birch".into(),
                    squad: Some(Link::new(0)),
                },
                Member {
                    name: "cedar".into(),
                    squad: None,
                },
            ],
            squads: vec![Squad {
                label: "grove".into(),
                members: vec![Link::new(0), Link::new(1)],
            }],
        }
    }

    #[test]
    fn mutual_links_resolve_after_decode() {
        let codec = army_codec();
        let army = sample();
        let bytes = to_bytes(&codec, &army).unwrap();
        let decoded = from_bytes(&codec, &bytes).unwrap();
        assert_eq!(decoded, army);

        // Walk member -> squad -> member without any patching.
        let ash = &decoded.members[0];
        let squad = ash.squad.and_then(|l| l.get(&decoded.squads)).unwrap();
        let first = squad.members[0].get(&decoded.members).unwrap();
        assert_eq!(first.name, "ash");
    }

    #[test]
    fn dangling_link_fails_the_link_pass() {
        let codec = army_codec();
        let mut army = sample();
        army.squads[0].members.push(Link::new(7));
        let bytes = to_bytes(&codec, &army).unwrap();
        assert_eq!(
            from_bytes(&codec, &bytes),
            Err(CodecError::DanglingLink {
                kind: "member",
                index: 7,
                len: 3
            })
        );
    }
}
