//! Swept entity-vs-entity interval query.
//!
//! Tests one moving footprint against the resident object list of a single
//! sector. The caller supplies the movement direction and magnitude; the
//! query projects every candidate onto the axes of that movement and keeps
//! the first one whose parallel and perpendicular extents overlap.
//!
//! The first-in-list-order selection (rather than closest) is historic
//! behavior preserved for compatibility; see [`ObjectHitMode`] for the
//! stricter alternative.

use crate::entity::{EntityId, EntityTable};
use crate::fixed::{Fixed, Vec2Fixed};
use crate::level::{Level, SectorId};

use super::ObjectHitMode;

/// The swept region of one movement query: a horizontal origin and
/// direction/magnitude plus the vertical band the mover occupies.
///
/// Vertical axis points down: `y_top <= y_bottom` numerically.
#[derive(Debug, Clone, Copy)]
pub struct CollisionInterval {
    pub origin: Vec2Fixed,
    pub y_top: Fixed,
    pub y_bottom: Fixed,

    /// Unit movement direction.
    pub dir: Vec2Fixed,

    /// Movement length along `dir`.
    pub mag: Fixed,
}

/// One entity found in the swept region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectHit {
    pub id: EntityId,

    /// Push-out scalar: how far past the candidate's near edge the sweep
    /// reaches, measured along the movement direction.
    pub overlap: Fixed,
}

/// Find an entity in `sector` overlapping the swept interval.
///
/// Candidates with zero width never block. A floor-anchored candidate
/// (positive height) is rejected when it lies entirely above or below the
/// query's vertical band; a ceiling-anchored one uses the mirrored test.
/// Survivors are projected onto the movement axes: the perpendicular
/// offset must be within the candidate's half-width and the parallel
/// offset within `[-halfWidth, mag + halfWidth]`.
///
/// `skip` steps past one previous result so a caller can repeat the query.
pub fn interval_query(
    level: &Level,
    entities: &EntityTable,
    sector: SectorId,
    interval: &CollisionInterval,
    skip: Option<EntityId>,
    mode: ObjectHitMode,
) -> Option<ObjectHit> {
    let mut closest: Option<(ObjectHit, Fixed)> = None;

    for &id in &level.sector(sector).objects {
        if skip == Some(id) {
            continue;
        }
        let Some(candidate) = entities.get(id) else {
            continue;
        };
        if candidate.radius == Fixed::ZERO {
            continue;
        }

        // Vertical rejection, honoring the height sign.
        let (top, bottom) = candidate.vertical_extent();
        if top > interval.y_bottom || bottom < interval.y_top {
            continue;
        }

        // Project the candidate's offset onto the movement axes.
        let off = Vec2Fixed::new(
            candidate.pos.x - interval.origin.x,
            candidate.pos.z - interval.origin.z,
        );
        let parallel = off.x * interval.dir.x + off.z * interval.dir.z;
        let perpendicular = off.x * interval.dir.z - off.z * interval.dir.x;

        if perpendicular.abs() > candidate.radius {
            continue;
        }
        if parallel < -candidate.radius || parallel > interval.mag + candidate.radius {
            continue;
        }

        let hit = ObjectHit {
            id,
            overlap: interval.mag + candidate.radius - parallel,
        };
        match mode {
            ObjectHitMode::FirstMatch => return Some(hit),
            ObjectHitMode::Closest => {
                if closest.map_or(true, |(_, best)| parallel < best) {
                    closest = Some((hit, parallel));
                }
            }
        }
    }

    closest.map(|(hit, _)| hit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Entity, EntityClass};
    use crate::fixed::Vec3Fixed;
    use crate::level::SectorFlags;

    fn one_room() -> (Level, SectorId) {
        let mut level = Level::new();
        let s = level.add_sector(
            &[
                Vec2Fixed::from_int(0, 0),
                Vec2Fixed::from_int(40, 0),
                Vec2Fixed::from_int(40, 40),
                Vec2Fixed::from_int(0, 40),
            ],
            Fixed::ZERO,
            Fixed::from_int(-20),
            SectorFlags::NONE,
        );
        level.finalize();
        (level, s)
    }

    fn npc_at(x: i32, z: i32, radius: i32, sector: SectorId) -> Entity {
        Entity::new(
            Vec3Fixed::from_int(x, 0, z),
            Fixed::from_int(radius),
            Fixed::from_int(6),
            EntityClass::Npc,
            sector,
        )
    }

    /// Sweep from (5,5) heading +x by `mag` units, six units tall.
    fn sweep(mag: i32) -> CollisionInterval {
        CollisionInterval {
            origin: Vec2Fixed::from_int(5, 5),
            y_top: Fixed::from_int(-6),
            y_bottom: Fixed::ZERO,
            dir: Vec2Fixed::new(Fixed::ONE, Fixed::ZERO),
            mag: Fixed::from_int(mag),
        }
    }

    #[test]
    fn test_hit_on_path() {
        let (mut level, s) = one_room();
        let mut entities = EntityTable::new();
        let target = entities.spawn(&mut level, npc_at(15, 5, 2, s));

        let hit = interval_query(&level, &entities, s, &sweep(10), None, ObjectHitMode::FirstMatch)
            .unwrap();
        assert_eq!(hit.id, target);
        // overlap = mag + r - parallel = 10 + 2 - 10
        assert_eq!(hit.overlap, Fixed::from_int(2));
    }

    #[test]
    fn test_perpendicular_rejection() {
        let (mut level, s) = one_room();
        let mut entities = EntityTable::new();
        entities.spawn(&mut level, npc_at(15, 9, 2, s));

        // Offset 4 units sideways with half-width 2: no contact.
        assert!(
            interval_query(&level, &entities, s, &sweep(20), None, ObjectHitMode::FirstMatch)
                .is_none()
        );
    }

    #[test]
    fn test_parallel_range_rejection() {
        let (mut level, s) = one_room();
        let mut entities = EntityTable::new();
        entities.spawn(&mut level, npc_at(30, 5, 2, s));

        // 25 units ahead with a 10-unit sweep and 2-unit half-width.
        assert!(
            interval_query(&level, &entities, s, &sweep(10), None, ObjectHitMode::FirstMatch)
                .is_none()
        );
        // A longer sweep reaches it.
        assert!(
            interval_query(&level, &entities, s, &sweep(24), None, ObjectHitMode::FirstMatch)
                .is_some()
        );
    }

    #[test]
    fn test_vertical_band_rejection() {
        let (mut level, s) = one_room();
        let mut entities = EntityTable::new();

        // Hangs from the ceiling: occupies [-20, -14], band is [-6, 0].
        let mut bat = npc_at(15, 5, 2, s);
        bat.pos.y = Fixed::from_int(-20);
        bat.height = Fixed::from_int(-6);
        entities.spawn(&mut level, bat);

        assert!(
            interval_query(&level, &entities, s, &sweep(20), None, ObjectHitMode::FirstMatch)
                .is_none()
        );
    }

    #[test]
    fn test_zero_width_never_blocks() {
        let (mut level, s) = one_room();
        let mut entities = EntityTable::new();
        entities.spawn(&mut level, npc_at(10, 5, 0, s));

        assert!(
            interval_query(&level, &entities, s, &sweep(20), None, ObjectHitMode::FirstMatch)
                .is_none()
        );
    }

    #[test]
    fn test_first_match_list_order_quirk() {
        let (mut level, s) = one_room();
        let mut entities = EntityTable::new();
        // The farther target is spawned first, so list order favors it.
        let far = entities.spawn(&mut level, npc_at(25, 5, 2, s));
        let near = entities.spawn(&mut level, npc_at(12, 5, 2, s));

        let first =
            interval_query(&level, &entities, s, &sweep(30), None, ObjectHitMode::FirstMatch)
                .unwrap();
        assert_eq!(first.id, far);

        let closest =
            interval_query(&level, &entities, s, &sweep(30), None, ObjectHitMode::Closest)
                .unwrap();
        assert_eq!(closest.id, near);
    }

    #[test]
    fn test_skip_steps_past_previous_hit() {
        let (mut level, s) = one_room();
        let mut entities = EntityTable::new();
        let first = entities.spawn(&mut level, npc_at(12, 5, 2, s));
        let second = entities.spawn(&mut level, npc_at(25, 5, 2, s));

        let hit = interval_query(&level, &entities, s, &sweep(30), None, ObjectHitMode::FirstMatch)
            .unwrap();
        assert_eq!(hit.id, first);

        let hit = interval_query(
            &level,
            &entities,
            s,
            &sweep(30),
            Some(first),
            ObjectHitMode::FirstMatch,
        )
        .unwrap();
        assert_eq!(hit.id, second);
    }
}
