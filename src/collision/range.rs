//! Range and visibility queries: proximity tests and area-effect
//! propagation (explosions, alarm senses).
//!
//! Both flavors share a broad/narrow-phase structure. The broad phase
//! rejects whole sectors by horizontal AABB and vertical band; the narrow
//! phase re-runs sector traversal as a straight line-of-sight probe that
//! keeps crossing portals only while each portal's own opening is at least
//! the configured minimum.
//!
//! The narrow phase builds a fresh [`QueryContext`] per candidate, so a
//! visitor that issues its own collision queries cannot disturb the sweep.

use crate::entity::{Entity, EntityClass, EntityId, EntityTable};
use crate::fixed::{dist_approx, Fixed, Vec3Fixed};
use crate::level::{Level, Sector, SectorId};

use super::intersect::PathSegment;
use super::traversal::{traverse, QueryContext, TraversalOutcome};
use super::CollisionConfig;

/// Visitor verdict for effect propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Continue,
    Stop,
}

/// Broad-phase sector rejection: horizontal AABB inflated by the radius,
/// and vertical overlap against the sector's effective band.
fn sector_in_range(sector: &Sector, center: Vec3Fixed, radius: Fixed, cfg: &CollisionConfig) -> bool {
    if !sector.bounds.overlaps_circle(center.xz(), radius) {
        return false;
    }
    let (floor, ceiling) = sector.effective_heights(cfg.sky_height);
    center.y - radius <= floor && center.y + radius >= ceiling
}

/// Whether an entity is within `radius` of `center`, using the approximate
/// horizontal distance and a vertical delta check.
fn entity_in_range(entity: &Entity, center: Vec3Fixed, radius: Fixed) -> bool {
    let d = dist_approx(entity.pos.x - center.x, entity.pos.z - center.z);
    d <= radius && (entity.pos.y - center.y).abs() <= radius
}

/// Line-of-sight probe from `from` to `target`: succeeds only when the
/// traversal ends unobstructed in the target's own sector.
fn sees(
    level: &Level,
    from: Vec3Fixed,
    from_sector: SectorId,
    target: &Entity,
    class: EntityClass,
    cfg: &CollisionConfig,
) -> bool {
    let path = PathSegment::new(from.xz(), target.pos.xz());
    let mut ctx = QueryContext::new(level);
    match traverse(
        level,
        &path,
        from_sector,
        class,
        Some(cfg.min_opening),
        cfg,
        &mut ctx,
    ) {
        Ok(t) => t.outcome == TraversalOutcome::Unobstructed { sector: target.sector },
        Err(err) => {
            // Malformed adjacency: diagnose and treat the target as hidden.
            log::error!("line-of-sight probe aborted: {err}");
            false
        }
    }
}

/// Is any entity accepted by `filter` within `radius` of `from` and
/// visible from it?
///
/// Idempotent: with no intervening entity movement or geometry change,
/// repeated calls return the same answer.
pub fn proximity_query(
    level: &Level,
    entities: &EntityTable,
    from: Vec3Fixed,
    from_sector: SectorId,
    radius: Fixed,
    class: EntityClass,
    cfg: &CollisionConfig,
    mut filter: impl FnMut(&Entity) -> bool,
) -> bool {
    for sector in &level.sectors {
        if !sector_in_range(sector, from, radius, cfg) {
            continue;
        }
        for &id in &sector.objects {
            let Some(entity) = entities.get(id) else {
                continue;
            };
            if !filter(entity) || !entity_in_range(entity, from, radius) {
                continue;
            }
            if sees(level, from, from_sector, entity, class, cfg) {
                return true;
            }
        }
    }
    false
}

/// Apply an effect to every entity within `radius` of `from` that has
/// line of sight to it (e.g. explosion damage).
///
/// The visitor is invoked once per qualifying entity and may stop the
/// sweep early. Entities behind blocking walls, or separated from the
/// source by a portal gap below the minimum opening, are never visited.
/// The visitor receives ids and shared references only; callers apply
/// mutations afterwards, which keeps nested queries sound.
pub fn propagate_effect(
    level: &Level,
    entities: &EntityTable,
    from: Vec3Fixed,
    from_sector: SectorId,
    radius: Fixed,
    class: EntityClass,
    cfg: &CollisionConfig,
    mut visitor: impl FnMut(EntityId, &Entity) -> Visit,
) {
    for sector in &level.sectors {
        if !sector_in_range(sector, from, radius, cfg) {
            continue;
        }
        for &id in &sector.objects {
            let Some(entity) = entities.get(id) else {
                continue;
            };
            if !entity_in_range(entity, from, radius) {
                continue;
            }
            if !sees(level, from, from_sector, entity, class, cfg) {
                continue;
            }
            if visitor(id, entity) == Visit::Stop {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use crate::fixed::Vec2Fixed;
    use crate::level::SectorFlags;

    fn square(origin: (i32, i32), size: i32) -> Vec<Vec2Fixed> {
        let (x, z) = origin;
        vec![
            Vec2Fixed::from_int(x, z),
            Vec2Fixed::from_int(x + size, z),
            Vec2Fixed::from_int(x + size, z + size),
            Vec2Fixed::from_int(x, z + size),
        ]
    }

    fn npc(x: i32, z: i32, sector: SectorId) -> Entity {
        Entity::new(
            Vec3Fixed::from_int(x, 0, z),
            Fixed::from_int(2),
            Fixed::from_int(6),
            EntityClass::Npc,
            sector,
        )
    }

    /// Source room adjoined to an open room and to a pinched room whose
    /// portal opening is below the minimum.
    fn three_rooms() -> (Level, SectorId, SectorId, SectorId) {
        let mut level = Level::new();
        let src = level.add_sector(&square((0, 0), 10), Fixed::ZERO, Fixed::from_int(-10), SectorFlags::NONE);
        let open = level.add_sector(&square((10, 0), 10), Fixed::ZERO, Fixed::from_int(-10), SectorFlags::NONE);
        let pinched = level.add_sector(&square((-10, 0), 10), Fixed::ZERO, Fixed::from_int(-2), SectorFlags::NONE);
        let east = level.sector(src).walls[1];
        let open_west = level.sector(open).walls[3];
        level.set_adjoin(east, open_west);
        let west = level.sector(src).walls[3];
        let pinched_east = level.sector(pinched).walls[1];
        level.set_adjoin(west, pinched_east);
        level.finalize();
        (level, src, open, pinched)
    }

    #[test]
    fn test_proximity_sees_through_open_portal() {
        let (mut level, src, open, _) = three_rooms();
        let mut entities = EntityTable::new();
        entities.spawn(&mut level, npc(15, 5, open));
        let cfg = CollisionConfig::default();

        let found = proximity_query(
            &level,
            &entities,
            Vec3Fixed::from_int(5, 0, 5),
            src,
            Fixed::from_int(30),
            EntityClass::Projectile,
            &cfg,
            |e| e.class == EntityClass::Npc,
        );
        assert!(found);
    }

    #[test]
    fn test_proximity_radius_cutoff() {
        let (mut level, src, open, _) = three_rooms();
        let mut entities = EntityTable::new();
        entities.spawn(&mut level, npc(15, 5, open));
        let cfg = CollisionConfig::default();

        let found = proximity_query(
            &level,
            &entities,
            Vec3Fixed::from_int(5, 0, 5),
            src,
            Fixed::from_int(3),
            EntityClass::Projectile,
            &cfg,
            |_| true,
        );
        assert!(!found);
    }

    #[test]
    fn test_proximity_idempotent() {
        let (mut level, src, open, _) = three_rooms();
        let mut entities = EntityTable::new();
        entities.spawn(&mut level, npc(15, 5, open));
        let cfg = CollisionConfig::default();

        let run = || {
            proximity_query(
                &level,
                &entities,
                Vec3Fixed::from_int(5, 0, 5),
                src,
                Fixed::from_int(30),
                EntityClass::Projectile,
                &cfg,
                |_| true,
            )
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_effect_skips_pinched_portal() {
        let (mut level, src, open, pinched) = three_rooms();
        let mut entities = EntityTable::new();
        let visible = entities.spawn(&mut level, npc(15, 5, open));
        let hidden = entities.spawn(&mut level, npc(-5, 5, pinched));
        let cfg = CollisionConfig::default();

        let mut hits = Vec::new();
        propagate_effect(
            &level,
            &entities,
            Vec3Fixed::from_int(5, 0, 5),
            src,
            Fixed::from_int(30),
            EntityClass::Projectile,
            &cfg,
            |id, _| {
                hits.push(id);
                Visit::Continue
            },
        );
        assert_eq!(hits, vec![visible]);
        assert!(!hits.contains(&hidden));
    }

    #[test]
    fn test_effect_stop_aborts_sweep() {
        let (mut level, src, open, _) = three_rooms();
        let mut entities = EntityTable::new();
        entities.spawn(&mut level, npc(12, 3, open));
        entities.spawn(&mut level, npc(15, 7, open));
        let cfg = CollisionConfig::default();

        let mut count = 0;
        propagate_effect(
            &level,
            &entities,
            Vec3Fixed::from_int(5, 0, 5),
            src,
            Fixed::from_int(30),
            EntityClass::Projectile,
            &cfg,
            |_, _| {
                count += 1;
                Visit::Stop
            },
        );
        assert_eq!(count, 1);
    }

    #[test]
    fn test_nested_query_from_visitor() {
        // A visitor issuing its own proximity query must not corrupt the
        // outer sweep: both entities are still visited.
        let (mut level, src, open, _) = three_rooms();
        let mut entities = EntityTable::new();
        entities.spawn(&mut level, npc(12, 3, open));
        entities.spawn(&mut level, npc(15, 7, open));
        let cfg = CollisionConfig::default();

        let mut visited = 0;
        propagate_effect(
            &level,
            &entities,
            Vec3Fixed::from_int(5, 0, 5),
            src,
            Fixed::from_int(30),
            EntityClass::Projectile,
            &cfg,
            |_, entity| {
                let nested = proximity_query(
                    &level,
                    &entities,
                    entity.pos,
                    entity.sector,
                    Fixed::from_int(30),
                    EntityClass::Projectile,
                    &cfg,
                    |_| true,
                );
                assert!(nested);
                visited += 1;
                Visit::Continue
            },
        );
        assert_eq!(visited, 2);
    }
}
