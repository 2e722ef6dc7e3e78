//! Moving objects and their storage.
//!
//! Entities are created and destroyed by external gameplay logic; this
//! crate only relocates them between sectors and adjusts their vertical
//! position. Storage is array-based with deterministic iteration order;
//! no hash containers in simulation state.

use serde::{Deserialize, Serialize};

use crate::fixed::{Fixed, Vec3Fixed};
use crate::level::{Level, SectorId, WallFlags};

/// Unique identifier for an entity (slot index in the [`EntityTable`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Category used to filter which walls and other entities may block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityClass {
    Player,
    Npc,
    Projectile,
    /// Inert decoration; occupies space but never moves itself.
    Scenery,
}

impl EntityClass {
    /// Whether this class may cross an adjoined wall with the given flags.
    ///
    /// `SOLID` stops everyone; `PLAYER_WALK_ONLY` admits only the player;
    /// `BLOCK_FIRE` stops projectiles and area effects.
    pub fn can_cross(self, flags: WallFlags) -> bool {
        if flags.contains(WallFlags::SOLID) {
            return false;
        }
        if flags.contains(WallFlags::PLAYER_WALK_ONLY) && self != Self::Player {
            return false;
        }
        if flags.contains(WallFlags::BLOCK_FIRE) && self == Self::Projectile {
            return false;
        }
        true
    }
}

/// A moving object: position, footprint, vertical extent, owning sector.
///
/// `height` is signed: positive extends upward from the position
/// (floor-anchored, position at the base), negative extends downward
/// (ceiling-anchored, position at the top). The vertical axis points down,
/// so "upward" is numerically negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub pos: Vec3Fixed,

    /// Horizontal half-width of the footprint.
    pub radius: Fixed,

    /// Signed vertical extent.
    pub height: Fixed,

    pub class: EntityClass,

    /// Current owning sector; mutated by the resolver on crossing.
    pub sector: SectorId,
}

impl Entity {
    pub fn new(
        pos: Vec3Fixed,
        radius: Fixed,
        height: Fixed,
        class: EntityClass,
        sector: SectorId,
    ) -> Self {
        Self {
            id: EntityId(u32::MAX),
            pos,
            radius,
            height,
            class,
            sector,
        }
    }

    /// Vertical interval `(top, bottom)` occupied by this entity, honoring
    /// the height sign. Top is numerically the smaller value.
    #[inline]
    pub fn vertical_extent(&self) -> (Fixed, Fixed) {
        if self.height >= Fixed::ZERO {
            (self.pos.y - self.height, self.pos.y)
        } else {
            (self.pos.y, self.pos.y - self.height)
        }
    }
}

/// Slot-based entity storage with deterministic iteration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityTable {
    slots: Vec<Option<Entity>>,
}

impl EntityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity, attach it to its sector, and return its id.
    /// Reuses the lowest free slot so iteration order stays stable.
    pub fn spawn(&mut self, level: &mut Level, mut entity: Entity) -> EntityId {
        let slot = self
            .slots
            .iter()
            .position(Option::is_none)
            .unwrap_or_else(|| {
                self.slots.push(None);
                self.slots.len() - 1
            });
        let id = EntityId(slot as u32);
        entity.id = id;
        level.attach_entity(entity.sector, id);
        self.slots[slot] = Some(entity);
        id
    }

    /// Remove an entity and detach it from its sector.
    pub fn despawn(&mut self, level: &mut Level, id: EntityId) -> Option<Entity> {
        let entity = self.slots.get_mut(id.0 as usize)?.take()?;
        level.detach_entity(entity.sector, id);
        Some(entity)
    }

    #[inline]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots.get(id.0 as usize)?.as_ref()
    }

    #[inline]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots.get_mut(id.0 as usize)?.as_mut()
    }

    /// Iterate live entities in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::Vec2Fixed;
    use crate::level::SectorFlags;

    fn one_sector_level() -> (Level, SectorId) {
        let mut level = Level::new();
        let points = [
            Vec2Fixed::from_int(0, 0),
            Vec2Fixed::from_int(10, 0),
            Vec2Fixed::from_int(10, 10),
            Vec2Fixed::from_int(0, 10),
        ];
        let s = level.add_sector(&points, Fixed::ZERO, Fixed::from_int(-10), SectorFlags::NONE);
        level.finalize();
        (level, s)
    }

    #[test]
    fn test_can_cross_rules() {
        assert!(EntityClass::Player.can_cross(WallFlags::NONE));
        assert!(EntityClass::Player.can_cross(WallFlags::PLAYER_WALK_ONLY));
        assert!(!EntityClass::Npc.can_cross(WallFlags::PLAYER_WALK_ONLY));
        assert!(!EntityClass::Projectile.can_cross(WallFlags::BLOCK_FIRE));
        assert!(EntityClass::Npc.can_cross(WallFlags::BLOCK_FIRE));
        assert!(!EntityClass::Player.can_cross(WallFlags::SOLID));
    }

    #[test]
    fn test_vertical_extent_sign() {
        let floor_anchored = Entity::new(
            Vec3Fixed::from_int(0, 0, 0),
            Fixed::ONE,
            Fixed::from_int(6),
            EntityClass::Npc,
            SectorId(0),
        );
        assert_eq!(
            floor_anchored.vertical_extent(),
            (Fixed::from_int(-6), Fixed::ZERO)
        );

        let ceiling_anchored = Entity::new(
            Vec3Fixed::from_int(0, -8, 0),
            Fixed::ONE,
            Fixed::from_int(-3),
            EntityClass::Scenery,
            SectorId(0),
        );
        assert_eq!(
            ceiling_anchored.vertical_extent(),
            (Fixed::from_int(-8), Fixed::from_int(-5))
        );
    }

    #[test]
    fn test_spawn_despawn_membership() {
        let (mut level, s) = one_sector_level();
        let mut entities = EntityTable::new();

        let a = entities.spawn(
            &mut level,
            Entity::new(Vec3Fixed::from_int(5, 0, 5), Fixed::ONE, Fixed::from_int(6), EntityClass::Npc, s),
        );
        let b = entities.spawn(
            &mut level,
            Entity::new(Vec3Fixed::from_int(2, 0, 2), Fixed::ONE, Fixed::from_int(6), EntityClass::Npc, s),
        );
        assert_eq!(level.sector(s).objects, vec![a, b]);

        entities.despawn(&mut level, a);
        assert_eq!(level.sector(s).objects, vec![b]);
        assert!(entities.get(a).is_none());

        // Freed slot is reused
        let c = entities.spawn(
            &mut level,
            Entity::new(Vec3Fixed::from_int(1, 0, 1), Fixed::ONE, Fixed::from_int(6), EntityClass::Npc, s),
        );
        assert_eq!(c, a);
    }
}
