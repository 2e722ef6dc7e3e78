//! Sector-to-sector path traversal.
//!
//! Given a source sector and a movement segment, find the nearest blocking
//! wall, crossing zero or more permeable portals along the way while
//! narrowing the passable vertical band. There is no explicit adjacency
//! graph: the walk follows per-wall adjoin references only.
//!
//! Visited-wall state lives in a per-query [`QueryContext`] bitset, not on
//! the geometry, so independent and nested queries never interfere.

use serde::{Deserialize, Serialize};

use crate::entity::EntityClass;
use crate::fixed::{dist_approx, Fixed, Vec2Fixed};
use crate::level::{AdjoinError, Level, SectorId, WallId};

use super::intersect::{intersect_wall, PathSegment};
use super::CollisionConfig;

/// Per-query scratch state: one visited bit per wall in the level.
///
/// A wall (and its mirror) is marked once hit so the walk never re-tests
/// it within the same query. Independent queries each build their own
/// context; nothing persists on the level.
#[derive(Debug)]
pub struct QueryContext {
    visited: Vec<u64>,
}

impl QueryContext {
    pub fn new(level: &Level) -> Self {
        Self {
            visited: vec![0; level.walls.len().div_ceil(64)],
        }
    }

    #[inline]
    pub fn is_visited(&self, wall: WallId) -> bool {
        let i = wall.0 as usize;
        self.visited[i / 64] & (1 << (i % 64)) != 0
    }

    #[inline]
    fn mark(&mut self, wall: WallId) {
        let i = wall.0 as usize;
        self.visited[i / 64] |= 1 << (i % 64);
    }

    /// Mark a wall and, if it is a portal, the matching wall on the far
    /// side, so the walk does not immediately re-hit the portal after
    /// crossing it.
    pub fn mark_with_mirror(&mut self, level: &Level, wall: WallId) {
        self.mark(wall);
        if let Some(mirror) = level.wall(wall).mirror {
            self.mark(mirror);
        }
    }
}

/// Passable vertical band accumulated across portal crossings.
///
/// The axis points down: `floor >= ceiling` numerically, and tightening
/// moves both bounds toward the more restrictive value (floor up, ceiling
/// down in world terms; numeric min/max respectively).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerticalBand {
    pub floor: Fixed,
    pub ceiling: Fixed,
}

impl VerticalBand {
    #[inline]
    pub fn tighten(&mut self, floor: Fixed, ceiling: Fixed) {
        self.floor = self.floor.min(floor);
        self.ceiling = self.ceiling.max(ceiling);
    }

    /// Floor-to-ceiling gap of the band.
    #[inline]
    pub fn opening(&self) -> Fixed {
        self.floor - self.ceiling
    }
}

/// Terminal state of a traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalOutcome {
    /// The path reached its end point inside `sector`.
    Unobstructed { sector: SectorId },
    /// A wall with no crossable adjoin stopped the path while the mover
    /// stood in `sector`.
    BlockedByWall { wall: WallId, sector: SectorId },
    /// Line-of-sight mode only: the portal's own opening was below the
    /// minimum traversable threshold.
    BlockedByGap { wall: WallId, sector: SectorId },
}

/// Result of one traversal query.
#[derive(Debug, Clone)]
pub struct Traversal {
    pub outcome: TraversalOutcome,

    /// Vertical band accumulated across every portal actually crossed;
    /// a blocking wall's far side is not included.
    pub band: VerticalBand,

    /// Portals crossed, in crossing order. Needed by the resolver for
    /// cross-line event emission.
    pub crossed: Vec<WallId>,

    /// Where the path met the blocking wall, when blocked.
    pub hit_point: Option<Vec2Fixed>,
}

/// Walk a movement segment from `start`, crossing permeable portals.
///
/// In each sector the nearest intersecting, non-visited, non-backface wall
/// (ordered by [`dist_approx`] from the path origin) is taken; it and its
/// mirror are marked visited. A crossable portal tightens the band with
/// the neighbor's effective floor/ceiling (pit/exterior bias applied) and
/// the walk continues in the neighbor with the same path.
///
/// `min_opening` switches line-of-sight mode: a portal whose own effective
/// opening is below the threshold blocks the probe even when the mover's
/// class could cross it.
///
/// Fails only on a dangling adjoin reference (malformed level data).
pub fn traverse(
    level: &Level,
    path: &PathSegment,
    start: SectorId,
    class: EntityClass,
    min_opening: Option<Fixed>,
    cfg: &CollisionConfig,
    ctx: &mut QueryContext,
) -> Result<Traversal, AdjoinError> {
    let mut sector = level.sector(start);
    let (floor, ceiling) = sector.effective_heights(cfg.sky_height);
    let mut band = VerticalBand { floor, ceiling };
    let mut crossed = Vec::new();

    loop {
        // Nearest unvisited wall the path actually pierces.
        let mut best: Option<(WallId, Fixed, Vec2Fixed)> = None;
        for &wid in &sector.walls {
            if ctx.is_visited(wid) {
                continue;
            }
            let Some(s) = intersect_wall(level, path, level.wall(wid)) else {
                continue;
            };
            let hit = path.point_at(s);
            let d = dist_approx(hit.x - path.p0.x, hit.z - path.p0.z);
            if best.map_or(true, |(_, bd, _)| d < bd) {
                best = Some((wid, d, hit));
            }
        }

        let Some((wid, _, hit)) = best else {
            return Ok(Traversal {
                outcome: TraversalOutcome::Unobstructed { sector: sector.id },
                band,
                crossed,
                hit_point: None,
            });
        };

        ctx.mark_with_mirror(level, wid);
        let wall = level.wall(wid);

        let adjoin = match wall.adjoin {
            Some(adjoin) if class.can_cross(wall.flags) => adjoin,
            _ => {
                return Ok(Traversal {
                    outcome: TraversalOutcome::BlockedByWall {
                        wall: wid,
                        sector: sector.id,
                    },
                    band,
                    crossed,
                    hit_point: Some(hit),
                });
            }
        };

        let neighbor = level.resolve_adjoin(wid, adjoin)?;
        let (n_floor, n_ceiling) = neighbor.effective_heights(cfg.sky_height);

        if let Some(threshold) = min_opening {
            if n_floor - n_ceiling < threshold {
                return Ok(Traversal {
                    outcome: TraversalOutcome::BlockedByGap {
                        wall: wid,
                        sector: sector.id,
                    },
                    band,
                    crossed,
                    hit_point: Some(hit),
                });
            }
        }

        band.tighten(n_floor, n_ceiling);
        crossed.push(wid);
        sector = neighbor;
    }
}
