//! Path-against-wall intersection test.
//!
//! The innermost primitive of traversal: given one tick's movement segment
//! and one wall segment, decide whether they intersect and where along the
//! path. All arithmetic is exact (64-bit cross products, 128-bit
//! division), so the answer is identical on every platform.

use crate::fixed::{Fixed, Vec2Fixed};
use crate::level::{Level, Wall};

/// One tick's attempted horizontal movement, p0 -> p1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathSegment {
    pub p0: Vec2Fixed,
    pub p1: Vec2Fixed,
}

impl PathSegment {
    #[inline]
    pub const fn new(p0: Vec2Fixed, p1: Vec2Fixed) -> Self {
        Self { p0, p1 }
    }

    /// The displacement vector p1 - p0.
    #[inline]
    pub fn delta(&self) -> Vec2Fixed {
        self.p1 - self.p0
    }

    /// Point at parameter `s` along the path (0 = start, 1 = end).
    #[inline]
    pub fn point_at(&self, s: Fixed) -> Vec2Fixed {
        let d = self.delta();
        Vec2Fixed::new(self.p0.x + s * d.x, self.p0.z + s * d.z)
    }
}

/// Exact 2D cross product of two fixed-point vectors, in 64 bits.
/// Only the sign and relative magnitude are consumed.
#[inline]
fn cross64(a: Vec2Fixed, b: Vec2Fixed) -> i64 {
    a.x.0 as i64 * b.z.0 as i64 - a.z.0 as i64 * b.x.0 as i64
}

/// Test a movement path against one wall segment.
///
/// Returns the intersection parameter along the path, or `None` if the
/// segments do not intersect. Parallel segments (zero shared denominator)
/// never intersect, whatever their relative position.
///
/// # Backface rule
///
/// Sector boundaries are wound counter-clockwise, interior on the left of
/// w0 -> w1. When the candidate intersection lies beyond the path start,
/// the displacement's signed projection onto the wall direction rotated
/// 90 degrees (pointing back into the owning sector) must be negative:
/// a mover heading away from, or parallel to, a wall it already touches
/// reports no hit. Without this, an entity resting against a wall would
/// re-collide with it on every departure.
pub fn intersect_wall(level: &Level, path: &PathSegment, wall: &Wall) -> Option<Fixed> {
    let w0 = level.vertices[wall.v0 as usize];
    let w1 = level.vertices[wall.v1 as usize];

    // Interval rejection, X axis then Z axis. Neither segment's direction
    // is normalized at this point, so order the endpoints per axis first.
    let (px0, px1) = if path.p0.x <= path.p1.x {
        (path.p0.x, path.p1.x)
    } else {
        (path.p1.x, path.p0.x)
    };
    let (wx0, wx1) = if w0.x <= w1.x { (w0.x, w1.x) } else { (w1.x, w0.x) };
    if px1 < wx0 || wx1 < px0 {
        return None;
    }
    let (pz0, pz1) = if path.p0.z <= path.p1.z {
        (path.p0.z, path.p1.z)
    } else {
        (path.p1.z, path.p0.z)
    };
    let (wz0, wz1) = if w0.z <= w1.z { (w0.z, w1.z) } else { (w1.z, w0.z) };
    if pz1 < wz0 || wz1 < pz0 {
        return None;
    }

    let d = w1 - w0; // wall direction, unnormalized
    let m = path.delta(); // movement displacement
    let q = w0 - path.p0;

    // Solve p0 + s*m = w0 + t*d. Parallel segments share a zero
    // denominator and never intersect.
    let den = cross64(m, d);
    if den == 0 {
        return None;
    }
    let num_s = cross64(q, d);
    let num_t = cross64(q, m);

    // Both parameters must fall within their segment extents [0, 1].
    let (num_s, num_t, den_abs) = if den < 0 {
        (-num_s, -num_t, -den)
    } else {
        (num_s, num_t, den)
    };
    if num_s < 0 || num_s > den_abs || num_t < 0 || num_t > den_abs {
        return None;
    }

    let s = Fixed((((num_s as i128) << 16) / den_abs as i128) as i32);

    // Backface rule (see module docs). Skipped when the hit point is the
    // path start itself.
    if s != Fixed::ZERO && cross64(d, m) >= 0 {
        return None;
    }

    Some(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::Vec2Fixed;
    use crate::level::SectorFlags;

    /// One CCW square sector, (0,0) to (10,10).
    fn square_level() -> Level {
        let mut level = Level::new();
        level.add_sector(
            &[
                Vec2Fixed::from_int(0, 0),
                Vec2Fixed::from_int(10, 0),
                Vec2Fixed::from_int(10, 10),
                Vec2Fixed::from_int(0, 10),
            ],
            Fixed::ZERO,
            Fixed::from_int(-10),
            SectorFlags::NONE,
        );
        level.finalize();
        level
    }

    fn path(x0: i32, z0: i32, x1: i32, z1: i32) -> PathSegment {
        PathSegment::new(Vec2Fixed::from_int(x0, z0), Vec2Fixed::from_int(x1, z1))
    }

    #[test]
    fn test_crossing_hit_parameter() {
        let level = square_level();
        // walls[0] runs (0,0) -> (10,0); leaving the sector through it
        let s = intersect_wall(&level, &path(5, 5, 5, -5), &level.walls[0]).unwrap();
        assert_eq!(s, Fixed::HALF);
    }

    #[test]
    fn test_parallel_never_intersects() {
        let level = square_level();
        // Parallel to walls[0] at various offsets, including collinear
        for z in [-2, 0, 3] {
            assert_eq!(
                intersect_wall(&level, &path(1, z, 9, z), &level.walls[0]),
                None,
                "parallel path at z={z} must not intersect",
            );
        }
    }

    #[test]
    fn test_backface_rejected() {
        let level = square_level();
        // Re-entering through walls[0] from outside: displacement projects
        // non-negatively onto the interior-facing normal, so no hit even
        // though the raw segment math crosses.
        assert_eq!(intersect_wall(&level, &path(5, -5, 5, 5), &level.walls[0]), None);

        // Moving exactly along the wall is also "away or along".
        assert_eq!(intersect_wall(&level, &path(0, 0, 10, 0), &level.walls[0]), None);
    }

    #[test]
    fn test_interval_rejection() {
        let level = square_level();
        // Disjoint X ranges
        assert_eq!(intersect_wall(&level, &path(20, 5, 30, -5), &level.walls[0]), None);
        // Disjoint Z ranges
        assert_eq!(intersect_wall(&level, &path(5, 5, 5, 2), &level.walls[0]), None);
    }

    #[test]
    fn test_endpoint_touch() {
        let level = square_level();
        // Path ending exactly on the wall still hits at s = 1
        let s = intersect_wall(&level, &path(5, 5, 5, 0), &level.walls[0]).unwrap();
        assert_eq!(s, Fixed::ONE);

        // Path starting exactly on the wall: hit at s = 0 stands (the
        // backface rule is only applied beyond the start point)
        let s = intersect_wall(&level, &path(5, 0, 5, -5), &level.walls[0]).unwrap();
        assert_eq!(s, Fixed::ZERO);
    }

    #[test]
    fn test_miss_beyond_extent() {
        let level = square_level();
        // Crosses the wall's infinite line but outside the segment
        assert_eq!(intersect_wall(&level, &path(11, 5, 12, -5), &level.walls[0]), None);
    }
}
