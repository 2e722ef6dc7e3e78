//! Sector (polygonal floor region) records.

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::fixed::{Fixed, Vec2Fixed};

use super::WallId;

/// Index of a sector in [`Level::sectors`](super::Level::sectors).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectorId(pub u32);

/// Category flags for a sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SectorFlags(pub u32);

impl SectorFlags {
    pub const NONE: Self = Self(0);

    /// Bottomless terrain: the effective floor extends down by the sky
    /// height when traversal computes the passable band.
    pub const PIT: Self = Self(1 << 0);

    /// Open sky: the effective ceiling extends up by the sky height.
    pub const EXTERIOR: Self = Self(1 << 1);

    #[inline]
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl std::ops::BitOr for SectorFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Axis-aligned horizontal bounding box of a sector (derived from its
/// wall vertices).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2Fixed,
    pub max: Vec2Fixed,
}

impl Bounds {
    /// Whether a circle of `radius` around `center` can overlap this box.
    #[inline]
    pub fn overlaps_circle(&self, center: Vec2Fixed, radius: Fixed) -> bool {
        center.x + radius >= self.min.x
            && center.x - radius <= self.max.x
            && center.z + radius >= self.min.z
            && center.z - radius <= self.max.z
    }
}

/// A closed polygonal floor region.
///
/// The vertical axis points down: `floor >= ceiling` numerically. The wall
/// list is ordered counter-clockwise (interior on the left of each wall).
/// Everything except the resident entity list is immutable once the level
/// is finalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sector {
    pub id: SectorId,

    /// Ordered boundary walls.
    pub walls: Vec<WallId>,

    /// Floor height (numerically the larger of the two).
    pub floor: Fixed,

    /// Ceiling height.
    pub ceiling: Fixed,

    /// Secondary height for split-level sectors; zero when unused.
    /// Carried for loaders and gameplay, not consulted by traversal.
    pub second_height: Fixed,

    pub flags: SectorFlags,

    /// Derived horizontal AABB.
    pub bounds: Bounds,

    /// Entities currently resident here. Unordered; mutated transiently by
    /// the resolver and by entity spawn/despawn.
    pub objects: Vec<EntityId>,
}

impl Sector {
    /// Effective floor/ceiling for portal traversal.
    ///
    /// Pit sectors push the floor down by the sky height, exterior sectors
    /// pull the ceiling up by it, so open terrain does not artificially
    /// pinch the passable band.
    #[inline]
    pub fn effective_heights(&self, sky_height: Fixed) -> (Fixed, Fixed) {
        let mut floor = self.floor;
        let mut ceiling = self.ceiling;
        if self.flags.contains(SectorFlags::PIT) {
            floor = floor + sky_height;
        }
        if self.flags.contains(SectorFlags::EXTERIOR) {
            ceiling = ceiling - sky_height;
        }
        (floor, ceiling)
    }
}
