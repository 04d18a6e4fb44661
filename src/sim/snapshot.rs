use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::DVec2;

use crate::{constraint::ConstraintCache, scene::BallState};

/// "B2DS", little endian.
pub const SNAPSHOT_MAGIC: u32 = 0x5344_3242;
pub const SNAPSHOT_VERSION: u32 = 1;

const MAX_BALL_COUNT: u64 = 1 << 32;

trait FromReader: Sized {
    fn from_reader<R: Read>(reader: &mut R) -> io::Result<Self>;
}

impl FromReader for DVec2 {
    fn from_reader<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(Self::new(
            reader.read_f64::<LittleEndian>()?,
            reader.read_f64::<LittleEndian>()?,
        ))
    }
}

fn write_dvec2<W: Write>(writer: &mut W, value: DVec2) -> io::Result<()> {
    writer.write_f64::<LittleEndian>(value.x)?;
    writer.write_f64::<LittleEndian>(value.y)
}

fn invalid_data<E>(error: E) -> io::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    io::Error::new(io::ErrorKind::InvalidData, error)
}

/// Dynamic state needed to resume a run: balls, step counter and impulse cache.
///
/// Static geometry is not part of a snapshot; it comes from the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub iteration: u64,
    pub q: Vec<DVec2>,
    pub v: Vec<DVec2>,
    pub r: Vec<f64>,
    pub m: Vec<f64>,
    pub cache: ConstraintCache,
}

impl Snapshot {
    pub fn write<W: Write>(
        writer: &mut W,
        state: &BallState,
        iteration: u64,
        cache: &ConstraintCache,
    ) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(SNAPSHOT_MAGIC)?;
        writer.write_u32::<LittleEndian>(SNAPSHOT_VERSION)?;
        writer.write_u64::<LittleEndian>(iteration)?;

        writer.write_u64::<LittleEndian>(state.num_balls() as u64)?;
        for ball in 0..state.num_balls() {
            write_dvec2(writer, state.q[ball])?;
            write_dvec2(writer, state.v[ball])?;
            writer.write_f64::<LittleEndian>(state.r()[ball])?;
            writer.write_f64::<LittleEndian>(state.m()[ball])?;
        }

        cache.write_to(writer)
    }

    pub fn read<R: Read>(reader: &mut R) -> io::Result<Self> {
        let magic = reader.read_u32::<LittleEndian>()?;
        if magic != SNAPSHOT_MAGIC {
            return Err(invalid_data(format!("bad snapshot magic 0x{magic:x}")));
        }

        let version = reader.read_u32::<LittleEndian>()?;
        if version != SNAPSHOT_VERSION {
            return Err(invalid_data(format!(
                "unsupported snapshot version {version}, expected {SNAPSHOT_VERSION}"
            )));
        }

        let iteration = reader.read_u64::<LittleEndian>()?;
        let num_balls = reader.read_u64::<LittleEndian>()?;
        if num_balls > MAX_BALL_COUNT {
            return Err(invalid_data(format!("snapshot claims {num_balls} balls")));
        }

        let capacity = num_balls.min(1 << 16) as usize;
        let mut q = Vec::with_capacity(capacity);
        let mut v = Vec::with_capacity(capacity);
        let mut r = Vec::with_capacity(capacity);
        let mut m = Vec::with_capacity(capacity);
        for _ in 0..num_balls {
            q.push(DVec2::from_reader(reader)?);
            v.push(DVec2::from_reader(reader)?);
            r.push(reader.read_f64::<LittleEndian>()?);
            m.push(reader.read_f64::<LittleEndian>()?);
        }

        let cache = ConstraintCache::read_from(reader)?;

        Ok(Self {
            iteration,
            q,
            v,
            r,
            m,
            cache,
        })
    }

    /// Moves the balls into `state`, validating radii and masses.
    pub fn restore_balls(self, state: &mut BallState) -> io::Result<(u64, ConstraintCache)> {
        state
            .replace_balls(self.q, self.v, self.r, self.m)
            .map_err(invalid_data)?;
        Ok((self.iteration, self.cache))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::constraint::BallBallConstraint;

    fn two_balls() -> BallState {
        BallState::new(
            vec![DVec2::new(-2.0, 0.0), DVec2::new(2.0, 0.0)],
            vec![DVec2::new(1.0, 0.0), DVec2::new(-1.0, 0.5)],
            vec![1.0, 0.5],
            vec![1.0, 2.0],
        )
        .unwrap()
    }

    #[test]
    fn round_trip() {
        let state = two_balls();
        let mut cache = ConstraintCache::new();
        cache.cache(&BallBallConstraint::new(0, 1, 1.0, 0.5).into(), DVec2::new(0.75, 0.1));

        let mut bytes = Vec::new();
        Snapshot::write(&mut bytes, &state, 42, &cache).unwrap();

        let snapshot = Snapshot::read(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(snapshot.iteration, 42);
        assert_eq!(snapshot.q, state.q);
        assert_eq!(snapshot.v, state.v);
        assert_eq!(snapshot.r, state.r());
        assert_eq!(snapshot.m, state.m());
        assert_eq!(snapshot.cache, cache);
    }

    #[test]
    fn rejects_bad_header() {
        let mut bytes = Vec::new();
        Snapshot::write(&mut bytes, &two_balls(), 0, &ConstraintCache::new()).unwrap();

        let mut bad_magic = bytes.clone();
        bad_magic[0] ^= 0xff;
        let err = Snapshot::read(&mut Cursor::new(bad_magic)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let mut bad_version = bytes;
        bad_version[4] = 99;
        let err = Snapshot::read(&mut Cursor::new(bad_version)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn rejects_invalid_balls() {
        let mut snapshot = {
            let mut bytes = Vec::new();
            Snapshot::write(&mut bytes, &two_balls(), 3, &ConstraintCache::new()).unwrap();
            Snapshot::read(&mut Cursor::new(bytes)).unwrap()
        };
        snapshot.m[1] = 0.0;

        let mut state = two_balls();
        let err = snapshot.restore_balls(&mut state).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert_eq!(state, two_balls());
    }

    #[test]
    fn truncated_input() {
        let mut bytes = Vec::new();
        Snapshot::write(&mut bytes, &two_balls(), 0, &ConstraintCache::new()).unwrap();
        bytes.truncate(bytes.len() - 3);

        let err = Snapshot::read(&mut Cursor::new(bytes)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
