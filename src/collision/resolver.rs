//! Top-level movement resolver.
//!
//! One call resolves one entity's attempted horizontal displacement for
//! one tick, as a short-lived state progression:
//!
//! `PROBE -> (BLOCKED | UNOBSTRUCTED) -> RESPONSE -> CLIP -> EMIT`
//!
//! - **PROBE**: sector traversal along the requested displacement,
//!   collecting crossed portals, the vertical band, and any blocker
//! - **BLOCKED**: wall or entity in the way; compute the slide response
//! - **RESPONSE**: commit the final sector and reassign membership
//! - **CLIP**: clamp the vertical position to the final sector's actual
//!   (unbiased) floor and ceiling
//! - **EMIT**: report each crossed portal to the trigger interpreter
//!
//! Position and sector membership are written exactly once, at the end of
//! a successful resolution, never incrementally mid-query.

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, EntityTable};
use crate::fixed::{Angle, Fixed, Vec2Fixed, Vec3Fixed};
use crate::level::{AdjoinError, Level, SectorId, WallId};

use super::intersect::PathSegment;
use super::objects::{interval_query, CollisionInterval};
use super::traversal::{traverse, QueryContext, TraversalOutcome, VerticalBand};
use super::CollisionConfig;

/// Which side of a wall a crossing event happened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrossSide {
    Front,
    Back,
}

/// Seam to the external trigger/scripting interpreter.
///
/// The resolver reports every portal an entity actually moved past, front
/// side first, then the mirror wall's back side. Calls go one way; the
/// interpreter never returns a synchronous result.
pub trait CrossingSink {
    /// A line was crossed.
    ///
    /// Note: the back-side event for the mirror wall historically also
    /// fires that side's enter-sector effects. That behavior is preserved
    /// for compatibility and is a quirk, not a contract.
    fn cross_line(&mut self, wall: WallId, side: CrossSide, entity: EntityId);
}

/// Sink for callers without a trigger interpreter.
#[derive(Debug, Default)]
pub struct NullSink;

impl CrossingSink for NullSink {
    fn cross_line(&mut self, _wall: WallId, _side: CrossSide, _entity: EntityId) {}
}

/// What to do with the displacement when a wall blocks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResolveMode {
    /// Rewind the displacement to zero: the entity does not move this
    /// tick. The caller typically re-issues along the slide direction.
    #[default]
    Stop,
    /// Advance to just short of the hit point, keeping any portals
    /// genuinely crossed on the way.
    Slide,
}

/// Slide response computed from a blocking wall: redirect movement along
/// the wall rather than into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideResponse {
    /// The wall's unit direction.
    pub dir: Vec2Fixed,

    /// Anchor point: the wall's first endpoint.
    pub anchor: Vec2Fixed,

    /// The wall's stored facing angle.
    pub angle: Angle,
}

/// Tagged outcome of one movement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveOutcome {
    Unobstructed,
    BlockedByWall(WallId),
    BlockedByObject {
        entity: EntityId,
        /// Push-out scalar from the interval query.
        overlap: Fixed,
    },
}

/// Result record of one movement request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveResult {
    pub outcome: MoveOutcome,

    /// Sector the entity ended the tick in.
    pub sector: SectorId,

    /// Final position, vertical clip applied.
    pub pos: Vec3Fixed,

    /// Vertical band accumulated by the probe.
    pub band: VerticalBand,

    /// Slide response when a wall blocked the move.
    pub response: Option<SlideResponse>,
}

/// Resolve one entity's attempted horizontal displacement.
///
/// A zero displacement returns immediately: starting sector unchanged, no
/// wall visited. Otherwise the probe traverses from the entity's current
/// sector; a blocking wall (or, for entities with a footprint, a blocking
/// entity found by the widened-path object check) produces a blocked
/// outcome with a slide response, and an unobstructed probe commits the
/// new position, reassigns sector membership, clips vertically, and
/// reports crossed portals to `sink`.
///
/// Fails only on malformed adjacency data: the error is logged and the
/// call changes nothing and emits nothing.
pub fn resolve_move(
    level: &mut Level,
    entities: &mut EntityTable,
    id: EntityId,
    delta: Vec2Fixed,
    mode: ResolveMode,
    cfg: &CollisionConfig,
    sink: &mut dyn CrossingSink,
) -> Result<MoveResult, AdjoinError> {
    let Some(entity) = entities.get(id).cloned() else {
        // Despawned mid-tick by gameplay; nothing to do.
        log::debug!("resolve_move on empty entity slot {}", id.0);
        return Ok(MoveResult {
            outcome: MoveOutcome::Unobstructed,
            sector: SectorId(0),
            pos: Vec3Fixed::default(),
            band: VerticalBand { floor: Fixed::ZERO, ceiling: Fixed::ZERO },
            response: None,
        });
    };

    let start_sector = entity.sector;
    let sector = level.sector(start_sector);
    let band = VerticalBand { floor: sector.floor, ceiling: sector.ceiling };
    if delta == Vec2Fixed::ZERO {
        return Ok(MoveResult {
            outcome: MoveOutcome::Unobstructed,
            sector: start_sector,
            pos: entity.pos,
            band,
            response: None,
        });
    }

    // PROBE
    let path = PathSegment::new(entity.pos.xz(), entity.pos.xz() + delta);
    let mut ctx = QueryContext::new(level);
    let probe = match traverse(level, &path, start_sector, entity.class, None, cfg, &mut ctx) {
        Ok(t) => t,
        Err(err) => {
            log::error!("movement aborted for entity {}: {err}", id.0);
            return Err(err);
        }
    };

    // Widened-path object check across every sector the probe touched.
    if entity.radius > Fixed::ZERO {
        let (dir, mag) = delta.decompose();
        let (y_top, y_bottom) = entity.vertical_extent();
        let interval = CollisionInterval {
            origin: path.p0,
            y_top,
            y_bottom,
            dir,
            mag: mag + entity.radius,
        };
        let mut sectors = vec![start_sector];
        for &wid in &probe.crossed {
            if let Some(adjoin) = level.wall(wid).adjoin {
                sectors.push(adjoin);
            }
        }
        for s in sectors {
            if let Some(hit) =
                interval_query(level, entities, s, &interval, Some(id), cfg.object_hit)
            {
                return Ok(MoveResult {
                    outcome: MoveOutcome::BlockedByObject { entity: hit.id, overlap: hit.overlap },
                    sector: start_sector,
                    pos: entity.pos,
                    band: probe.band,
                    response: None,
                });
            }
        }
    }

    // BLOCKED / RESPONSE
    let (final_sector, final_xz, outcome, response, crossed_committed) = match probe.outcome {
        TraversalOutcome::Unobstructed { sector } => (
            sector,
            path.p1,
            MoveOutcome::Unobstructed,
            None,
            probe.crossed.as_slice(),
        ),
        TraversalOutcome::BlockedByWall { wall, sector }
        | TraversalOutcome::BlockedByGap { wall, sector } => {
            let w = level.wall(wall);
            let response = SlideResponse {
                dir: w.dir,
                anchor: level.wall_start(wall),
                angle: w.angle,
            };
            match mode {
                ResolveMode::Stop => {
                    // Rewound to zero: the entity never moved, so nothing
                    // was crossed and no events fire.
                    return Ok(MoveResult {
                        outcome: MoveOutcome::BlockedByWall(wall),
                        sector: start_sector,
                        pos: entity.pos,
                        band: probe.band,
                        response: Some(response),
                    });
                }
                ResolveMode::Slide => {
                    let hit = probe.hit_point.unwrap_or(path.p1);
                    let (dir, _) = delta.decompose();
                    // The pull-back is not re-tested against the crossed
                    // portals: when the blocking wall sits within
                    // slide_backoff of the last portal, the stop point can
                    // land a fraction behind that portal while membership
                    // stays with the probe's terminal sector.
                    let stop = Vec2Fixed::new(
                        hit.x - dir.x * cfg.slide_backoff,
                        hit.z - dir.z * cfg.slide_backoff,
                    );
                    (
                        sector,
                        stop,
                        MoveOutcome::BlockedByWall(wall),
                        Some(response),
                        probe.crossed.as_slice(),
                    )
                }
            }
        }
    };

    // Commit position and membership once.
    let final_pos = clip_vertical(level, final_sector, final_xz, entity.pos.y, entity.height);
    if let Some(e) = entities.get_mut(id) {
        e.pos = final_pos;
        e.sector = final_sector;
    }
    if final_sector != start_sector {
        level.detach_entity(start_sector, id);
        level.attach_entity(final_sector, id);
    }

    // EMIT: front event per crossed portal, back event on its mirror.
    for &wid in crossed_committed {
        sink.cross_line(wid, CrossSide::Front, id);
        if let Some(mirror) = level.wall(wid).mirror {
            sink.cross_line(mirror, CrossSide::Back, id);
        }
    }

    Ok(MoveResult {
        outcome,
        sector: final_sector,
        pos: final_pos,
        band: probe.band,
        response,
    })
}

/// CLIP stage: clamp the vertical position against the final sector's
/// actual (unbiased) floor and ceiling, honoring the height sign.
fn clip_vertical(level: &Level, sector: SectorId, xz: Vec2Fixed, y: Fixed, height: Fixed) -> Vec3Fixed {
    let s = level.sector(sector);
    let mut y = y;
    if height >= Fixed::ZERO {
        // Floor-anchored: position at the base, top at y - height.
        if y - height < s.ceiling {
            y = s.ceiling + height;
        } else if y > s.floor {
            y = s.floor;
        }
    } else {
        // Ceiling-anchored: position at the top, base at y - height.
        if y < s.ceiling {
            y = s.ceiling;
        } else if y - height > s.floor {
            y = s.floor + height;
        }
    }
    Vec3Fixed::new(xz.x, y, xz.z)
}
