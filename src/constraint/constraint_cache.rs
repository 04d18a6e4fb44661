use std::io::{self, Read, Write};

use ahash::AHashMap;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::DVec2;

use super::{Constraint, ConstraintId, ConstraintKind};

/// Upper bound on entries accepted when reading a cache back.
const MAX_CACHED_CONSTRAINTS: u64 = 1 << 32;

/// Last solved impulse of every contact, keyed by contact identity.
///
/// The stored vector holds the normal impulse in `x` and the net tangential
/// impulse in `y`. Entries are only overwritten, never purged, until the
/// scene is reloaded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConstraintCache {
    impulses: AHashMap<ConstraintId, DVec2>,
}

impl ConstraintCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&mut self, constraint: &Constraint, impulse: DVec2) {
        self.impulses.insert(constraint.id(), impulse);
    }

    #[must_use]
    pub fn lookup(&self, constraint: &Constraint) -> Option<DVec2> {
        self.get(&constraint.id())
    }

    #[inline]
    #[must_use]
    pub fn get(&self, id: &ConstraintId) -> Option<DVec2> {
        self.impulses.get(id).copied()
    }

    pub fn clear(&mut self) {
        self.impulses.clear();
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.impulses.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.impulses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ConstraintId, &DVec2)> {
        self.impulses.iter()
    }

    /// Writes the cache in ascending identity order so equal caches give equal bytes.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut entries: Vec<_> = self.impulses.iter().collect();
        entries.sort_unstable_by_key(|(id, _)| **id);

        writer.write_u64::<LittleEndian>(entries.len() as u64)?;
        for (id, impulse) in entries {
            writer.write_u8(id.kind.to_u8())?;
            writer.write_i32::<LittleEndian>(id.body0)?;
            writer.write_i32::<LittleEndian>(id.body1)?;
            writer.write_i32::<LittleEndian>(id.geometry)?;
            writer.write_f64::<LittleEndian>(impulse.x)?;
            writer.write_f64::<LittleEndian>(impulse.y)?;
        }

        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        let num_entries = reader.read_u64::<LittleEndian>()?;
        if num_entries > MAX_CACHED_CONSTRAINTS {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("constraint cache claims {num_entries} entries"),
            ));
        }

        let mut impulses = AHashMap::with_capacity(num_entries.min(1 << 16) as usize);
        for _ in 0..num_entries {
            let kind_tag = reader.read_u8()?;
            let kind = ConstraintKind::from_u8(kind_tag).ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("unknown constraint kind {kind_tag}"),
                )
            })?;

            let id = ConstraintId {
                kind,
                body0: reader.read_i32::<LittleEndian>()?,
                body1: reader.read_i32::<LittleEndian>()?,
                geometry: reader.read_i32::<LittleEndian>()?,
            };
            let impulse = DVec2::new(
                reader.read_f64::<LittleEndian>()?,
                reader.read_f64::<LittleEndian>()?,
            );

            impulses.insert(id, impulse);
        }

        Ok(Self { impulses })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::{
        constraint::{BallBallConstraint, StaticDrumConstraint},
        scene::StaticDrum,
    };

    fn populated() -> ConstraintCache {
        let mut cache = ConstraintCache::new();
        cache.cache(
            &BallBallConstraint::new(0, 3, 1.0, 1.0).into(),
            DVec2::new(0.5, -0.25),
        );
        cache.cache(
            &StaticDrumConstraint::new(2, 1, StaticDrum::new(DVec2::ZERO, 10.0), 1.0).into(),
            DVec2::new(1.5, 0.0),
        );
        cache
    }

    #[test]
    fn lookup_by_identity() {
        let cache = populated();
        // A new constraint object with the same identity finds the old impulse.
        let again: Constraint = BallBallConstraint::new(0, 3, 2.0, 2.0).into();
        assert_eq!(cache.lookup(&again), Some(DVec2::new(0.5, -0.25)));

        let other: Constraint = BallBallConstraint::new(1, 3, 1.0, 1.0).into();
        assert_eq!(cache.lookup(&other), None);
    }

    #[test]
    fn snapshot_round_trip() {
        let cache = populated();
        let mut bytes = Vec::new();
        cache.write_to(&mut bytes).unwrap();

        let restored = ConstraintCache::read_from(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(restored, cache);
    }

    #[test]
    fn corrupt_kind_is_invalid_data() {
        let mut bytes = Vec::new();
        populated().write_to(&mut bytes).unwrap();
        bytes[8] = 42;

        let err = ConstraintCache::read_from(&mut Cursor::new(bytes)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn clear_empties() {
        let mut cache = populated();
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }
}
