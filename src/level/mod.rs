//! Level geometry model: sectors, walls, vertices, portal adjacency.
//!
//! A [`Level`] is produced once by an external loader through the builder
//! methods here, then [`finalize`](Level::finalize)d, after which it is
//! read-mostly: collision only mutates per-sector entity membership.
//!
//! Sector connectivity is implicit. There is no graph structure; a sector
//! reaches its neighbors only through the per-wall `adjoin` references,
//! and the matching wall on the far side is the `mirror`.

mod sector;
mod wall;

pub use sector::{Bounds, Sector, SectorFlags, SectorId};
pub use wall::{Wall, WallFlags, WallId};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::fixed::{Angle, Fixed, Vec2Fixed};

/// A wall's adjoin reference does not resolve to a sector.
///
/// The one hard-failure condition in this crate: geometry is assumed valid
/// as produced by the loader, and a dangling adjoin means the data is
/// malformed. The resolver aborts the call with no movement and no events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjoinError {
    pub wall: WallId,
    pub adjoin: SectorId,
    pub sector_count: usize,
}

impl fmt::Display for AdjoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "wall {} adjoin {} does not resolve to a sector (level has {})",
            self.wall.0, self.adjoin.0, self.sector_count
        )
    }
}

impl std::error::Error for AdjoinError {}

/// The world geometry: vertex, wall and sector arrays.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Level {
    pub vertices: Vec<Vec2Fixed>,
    pub walls: Vec<Wall>,
    pub sectors: Vec<Sector>,
}

impl Level {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sector from a counter-clockwise polygon (interior on the left
    /// of each edge). Walls are created in order, closing the loop from
    /// the last point back to the first.
    pub fn add_sector(
        &mut self,
        points: &[Vec2Fixed],
        floor: Fixed,
        ceiling: Fixed,
        flags: SectorFlags,
    ) -> SectorId {
        let id = SectorId(self.sectors.len() as u32);
        let base_vertex = self.vertices.len() as u32;
        self.vertices.extend_from_slice(points);

        let mut walls = Vec::with_capacity(points.len());
        for i in 0..points.len() {
            let wid = WallId(self.walls.len() as u32);
            walls.push(wid);
            self.walls.push(Wall {
                v0: base_vertex + i as u32,
                v1: base_vertex + ((i + 1) % points.len()) as u32,
                dir: Vec2Fixed::ZERO,
                length: Fixed::ZERO,
                angle: Angle(0),
                adjoin: None,
                mirror: None,
                flags: WallFlags::NONE,
                sector: id,
            });
        }

        self.sectors.push(Sector {
            id,
            walls,
            floor,
            ceiling,
            second_height: Fixed::ZERO,
            flags,
            bounds: Bounds::default(),
            objects: Vec::new(),
        });
        id
    }

    /// Join two walls into a portal pair: each becomes the other's mirror
    /// and adjoins the other's sector.
    pub fn set_adjoin(&mut self, a: WallId, b: WallId) {
        let sector_a = self.walls[a.0 as usize].sector;
        let sector_b = self.walls[b.0 as usize].sector;
        {
            let wa = &mut self.walls[a.0 as usize];
            wa.adjoin = Some(sector_b);
            wa.mirror = Some(b);
        }
        {
            let wb = &mut self.walls[b.0 as usize];
            wb.adjoin = Some(sector_a);
            wb.mirror = Some(a);
        }
    }

    /// Compute all derived data: wall direction/length/angle, sector
    /// bounds, and mirror flag consistency.
    ///
    /// Each side of a portal inherits the stricter of the pair's blocking
    /// flags, so crossing rules agree no matter which side is tested.
    pub fn finalize(&mut self) {
        for wall in &mut self.walls {
            let w0 = self.vertices[wall.v0 as usize];
            let w1 = self.vertices[wall.v1 as usize];
            let (dir, length) = (w1 - w0).decompose();
            wall.dir = dir;
            wall.length = length;
            wall.angle = Angle::from_vector(dir.x, dir.z);
        }

        for i in 0..self.walls.len() {
            if let Some(mirror) = self.walls[i].mirror {
                let strict = WallFlags(
                    (self.walls[i].flags.0 | self.walls[mirror.0 as usize].flags.0)
                        & WallFlags::BLOCKING.0,
                );
                self.walls[i].flags = self.walls[i].flags.union(strict);
                let m = &mut self.walls[mirror.0 as usize];
                m.flags = m.flags.union(strict);
            }
        }

        for sector in &mut self.sectors {
            let mut min = Vec2Fixed::new(Fixed(i32::MAX), Fixed(i32::MAX));
            let mut max = Vec2Fixed::new(Fixed(i32::MIN), Fixed(i32::MIN));
            for &wid in &sector.walls {
                let v = self.vertices[self.walls[wid.0 as usize].v0 as usize];
                min.x = min.x.min(v.x);
                min.z = min.z.min(v.z);
                max.x = max.x.max(v.x);
                max.z = max.z.max(v.z);
            }
            sector.bounds = Bounds { min, max };
        }
    }

    #[inline]
    pub fn wall(&self, id: WallId) -> &Wall {
        &self.walls[id.0 as usize]
    }

    #[inline]
    pub fn sector(&self, id: SectorId) -> &Sector {
        &self.sectors[id.0 as usize]
    }

    /// First vertex of a wall.
    #[inline]
    pub fn wall_start(&self, id: WallId) -> Vec2Fixed {
        self.vertices[self.wall(id).v0 as usize]
    }

    /// Second vertex of a wall.
    #[inline]
    pub fn wall_end(&self, id: WallId) -> Vec2Fixed {
        self.vertices[self.wall(id).v1 as usize]
    }

    /// Resolve an adjoin reference, validating it against the sector
    /// array. A dangling reference is the malformed-data case.
    pub fn resolve_adjoin(&self, wall: WallId, adjoin: SectorId) -> Result<&Sector, AdjoinError> {
        self.sectors
            .get(adjoin.0 as usize)
            .ok_or(AdjoinError {
                wall,
                adjoin,
                sector_count: self.sectors.len(),
            })
    }

    /// Record an entity as resident in a sector.
    pub fn attach_entity(&mut self, sector: SectorId, entity: EntityId) {
        self.sectors[sector.0 as usize].objects.push(entity);
    }

    /// Remove an entity from a sector's resident list.
    pub fn detach_entity(&mut self, sector: SectorId, entity: EntityId) {
        let objects = &mut self.sectors[sector.0 as usize].objects;
        if let Some(i) = objects.iter().position(|&e| e == entity) {
            objects.swap_remove(i);
        }
    }
}
