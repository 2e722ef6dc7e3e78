//! Wall (boundary edge) records.

use serde::{Deserialize, Serialize};

use crate::fixed::{Angle, Fixed, Vec2Fixed};

use super::SectorId;

/// Index of a wall in [`Level::walls`](super::Level::walls).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WallId(pub u32);

/// Behavior flags for a wall.
///
/// Used to decide which entity classes may cross an adjoined wall. For a
/// wall/mirror pair the blocking flags are synchronized to the stricter
/// union of the two sides when the level is finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WallFlags(pub u32);

impl WallFlags {
    pub const NONE: Self = Self(0);

    /// Any entity may walk across this wall's adjoin.
    pub const ALWAYS_WALK: Self = Self(1 << 0);

    /// Never crossable, even with an adjoin (e.g. a window rail).
    pub const SOLID: Self = Self(1 << 1);

    /// Only player entities may cross.
    pub const PLAYER_WALK_ONLY: Self = Self(1 << 2);

    /// Projectiles and area effects do not pass.
    pub const BLOCK_FIRE: Self = Self(1 << 3);

    /// Flags that must agree on both sides of a portal.
    pub const BLOCKING: Self =
        Self(Self::SOLID.0 | Self::PLAYER_WALK_ONLY.0 | Self::BLOCK_FIRE.0);

    #[inline]
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    #[inline]
    pub fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    #[inline]
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl std::ops::BitOr for WallFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// One oriented boundary edge of a sector.
///
/// Walls run w0 -> w1 with the owning sector's interior on the left
/// (counter-clockwise winding in the X/Z plane). Direction, length and
/// angle are derived by [`Level::finalize`](super::Level::finalize).
///
/// A wall with an `adjoin` is a portal into a neighboring sector; `mirror`
/// is the matching wall on the far side, and exactly one such wall points
/// back here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wall {
    /// First vertex (index into the level vertex array).
    pub v0: u32,

    /// Second vertex.
    pub v1: u32,

    /// Unit direction w0 -> w1 (derived).
    pub dir: Vec2Fixed,

    /// Length of the wall segment (derived).
    pub length: Fixed,

    /// Facing angle of `dir` (derived).
    pub angle: Angle,

    /// Neighbor sector on the far side, if this wall is a portal.
    pub adjoin: Option<SectorId>,

    /// The matching wall on the neighbor side of the portal.
    pub mirror: Option<WallId>,

    /// Crossability flags.
    pub flags: WallFlags,

    /// The sector this wall belongs to.
    pub sector: SectorId,
}
