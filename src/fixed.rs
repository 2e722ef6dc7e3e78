//! Fixed-point math kernel.
//!
//! All simulation-critical arithmetic uses Q16.16 signed fixed-point
//! (16 integer / 16 fractional bits) so that results are bit-identical on
//! every platform. The few float computations that remain (angle
//! construction and angle-to-vector trig) go through software polynomial
//! approximations rather than libm, because hardware trig results differ
//! between architectures (x86 vs ARM vs WASM). Bare float appears only in
//! conversions out to renderers, where determinism does not matter.
//!
//! The approximate distance ([`dist_approx`]) is intentionally *not* a true
//! Euclidean distance. Traversal uses it to order candidate wall hits, so
//! its exact bit pattern is part of observable behavior.

use std::f32::consts::{PI, TAU};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Q16.16 signed fixed-point scalar.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Fixed(pub i32);

impl Fixed {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(1 << 16);
    pub const HALF: Self = Self(1 << 15);

    /// Build from a whole number of world units.
    #[inline]
    pub const fn from_int(v: i32) -> Self {
        Self(v << 16)
    }

    /// Truncate to a whole number of world units.
    #[inline]
    pub const fn int(self) -> i32 {
        self.0 >> 16
    }

    #[inline]
    pub fn from_f32(v: f32) -> Self {
        Self((v * 65536.0) as i32)
    }

    #[inline]
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / 65536.0
    }

    #[inline]
    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }

    #[inline]
    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }

    #[inline]
    pub fn max(self, other: Self) -> Self {
        Self(self.0.max(other.0))
    }

    /// Fixed-point square root.
    ///
    /// Computes the integer square root of the raw value shifted up 16
    /// bits, which yields the Q16.16 root exactly. Negative inputs clamp
    /// to zero.
    pub fn sqrt(self) -> Self {
        if self.0 <= 0 {
            return Self::ZERO;
        }
        Self(isqrt64((self.0 as u64) << 16) as i32)
    }
}

impl Add for Fixed {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Fixed {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Fixed {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Fixed {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Fixed {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Mul for Fixed {
    type Output = Self;

    /// Rounded Q16.16 multiply: the half-unit bias before the shift keeps
    /// results symmetric around zero for the magnitudes a level uses.
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self(((self.0 as i64 * rhs.0 as i64 + 0x8000) >> 16) as i32)
    }
}

impl Div for Fixed {
    type Output = Self;

    /// Truncating Q16.16 divide. The divisor must be non-zero; callers in
    /// this crate check before dividing.
    #[inline]
    fn div(self, rhs: Self) -> Self {
        Self((((self.0 as i64) << 16) / rhs.0 as i64) as i32)
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f32())
    }
}

/// Integer square root on u64 (binary digit-by-digit method).
fn isqrt64(n: u64) -> u64 {
    let mut x = n;
    let mut result = 0u64;
    let mut bit = 1u64 << 62;
    while bit > n {
        bit >>= 2;
    }
    while bit != 0 {
        if x >= result + bit {
            x -= result + bit;
            result = (result >> 1) + bit;
        } else {
            result >>= 1;
        }
        bit >>= 2;
    }
    result
}

/// Software arctangent for |x| handled via the reciprocal identity.
///
/// Odd Chebyshev-fitted polynomial over [-1, 1], accurate to about
/// 0.0005 rad. Basic IEEE arithmetic only, so the result is identical on
/// every platform.
fn atan_det(x: f32) -> f32 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let (z, flip) = if x > 1.0 { (1.0 / x, true) } else { (x, false) };

    const C: [f32; 7] = [
        -0.333_331_35,
        0.199_900_89,
        -0.142_006_84,
        0.106_347_48,
        -0.074_890_33,
        0.042_972_115,
        -0.016_045_005,
    ];
    let z2 = z * z;
    let mut acc = C[6];
    for &c in C[..6].iter().rev() {
        acc = c + z2 * acc;
    }
    let r = z * (1.0 + z2 * acc);

    let angle = if flip { PI / 2.0 - r } else { r };
    sign * angle
}

/// Software `atan2` for a vector (x, z), in [-PI, PI].
///
/// Axis-aligned inputs return exact axis angles so the cardinal
/// directions quantize without error.
fn atan2_det(z: f32, x: f32) -> f32 {
    if x == 0.0 {
        return if z == 0.0 {
            0.0
        } else if z > 0.0 {
            PI / 2.0
        } else {
            -PI / 2.0
        };
    }
    if z == 0.0 {
        return if x > 0.0 { 0.0 } else { PI };
    }

    let a = atan_det(z / x);
    if x > 0.0 {
        a
    } else if z >= 0.0 {
        a + PI
    } else {
        a - PI
    }
}

/// Software sine (Bhaskara I's approximation), error under 2e-3.
fn sin_det(x: f32) -> f32 {
    let mut x = x;
    while x < 0.0 {
        x += TAU;
    }
    while x >= TAU {
        x -= TAU;
    }
    let (x, sign) = if x > PI { (x - PI, -1.0f32) } else { (x, 1.0) };

    let p = x * (PI - x);
    sign * (16.0 * p) / (5.0 * PI * PI - 4.0 * p)
}

/// Software cosine via the phase-shifted sine.
fn cos_det(x: f32) -> f32 {
    sin_det(x + PI / 2.0)
}

/// Approximate 2D distance: `|dx| + |dz| - min(|dx|, |dz|)/2`.
///
/// Cheaper than a true length and bit-exact by construction; the halving is
/// an arithmetic shift. Traversal orders candidate wall hits with this
/// value, so it must never be replaced with a true Euclidean distance.
#[inline]
pub fn dist_approx(dx: Fixed, dz: Fixed) -> Fixed {
    let dx = dx.abs();
    let dz = dz.abs();
    Fixed(dx.0 + dz.0 - (dx.0.min(dz.0) >> 1))
}

/// 2D fixed-point vector in the horizontal (X, Z) plane.
///
/// The vertical axis points *down*: larger Y is lower in the world, so a
/// sector's floor height is numerically greater than its ceiling height.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub struct Vec2Fixed {
    pub x: Fixed,
    pub z: Fixed,
}

impl Vec2Fixed {
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        z: Fixed::ZERO,
    };

    #[inline]
    pub const fn new(x: Fixed, z: Fixed) -> Self {
        Self { x, z }
    }

    #[inline]
    pub const fn from_int(x: i32, z: i32) -> Self {
        Self {
            x: Fixed::from_int(x),
            z: Fixed::from_int(z),
        }
    }

    /// Convert out to float space for rendering/audio consumers.
    #[inline]
    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x.to_f32(), self.z.to_f32())
    }

    /// Split into a unit direction and a length.
    ///
    /// The length is the fixed square root of the 64-bit sum of squares;
    /// the zero vector decomposes to (zero, zero).
    pub fn decompose(self) -> (Self, Fixed) {
        let sq = ((self.x.0 as i64 * self.x.0 as i64) + (self.z.0 as i64 * self.z.0 as i64)) >> 16;
        if sq == 0 {
            return (Self::ZERO, Fixed::ZERO);
        }
        let len = Fixed(isqrt64((sq as u64) << 16) as i32);
        (Self::new(self.x / len, self.z / len), len)
    }
}

impl Add for Vec2Fixed {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.z + rhs.z)
    }
}

impl Sub for Vec2Fixed {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.z - rhs.z)
    }
}

/// 3D fixed-point position (X, Z horizontal; Y vertical, pointing down).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub struct Vec3Fixed {
    pub x: Fixed,
    pub y: Fixed,
    pub z: Fixed,
}

impl Vec3Fixed {
    #[inline]
    pub const fn new(x: Fixed, y: Fixed, z: Fixed) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub const fn from_int(x: i32, y: i32, z: i32) -> Self {
        Self {
            x: Fixed::from_int(x),
            y: Fixed::from_int(y),
            z: Fixed::from_int(z),
        }
    }

    /// The horizontal footprint of this position.
    #[inline]
    pub const fn xz(self) -> Vec2Fixed {
        Vec2Fixed {
            x: self.x,
            z: self.z,
        }
    }

    /// Convert out to float space (Y negated so up is positive for
    /// conventional renderers).
    #[inline]
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x.to_f32(), -self.y.to_f32(), self.z.to_f32())
    }
}

/// 14-bit circular angle: 16384 units per full revolution.
///
/// Wrapping is implicit in the representation; all arithmetic masks back
/// into range.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub struct Angle(pub u16);

impl Angle {
    /// Units in a full revolution.
    pub const UNITS: u32 = 16384;
    const MASK: u16 = 0x3fff;

    #[inline]
    pub const fn new(units: u16) -> Self {
        Self(units & Self::MASK)
    }

    /// Angle of a vector in the horizontal plane.
    ///
    /// Software arctangent quantized to 14 bits. The polynomial error is
    /// well under one angle unit, and the same bits come back on every
    /// platform; libm `atan2` would not guarantee that.
    pub fn from_vector(dx: Fixed, dz: Fixed) -> Self {
        if dx == Fixed::ZERO && dz == Fixed::ZERO {
            return Self(0);
        }
        let rad = atan2_det(dz.to_f32(), dx.to_f32());
        let units = (rad * (Self::UNITS as f32 / TAU)).round() as i32;
        Self((units.rem_euclid(Self::UNITS as i32)) as u16)
    }

    #[inline]
    pub fn to_radians(self) -> f32 {
        self.0 as f32 * (TAU / Self::UNITS as f32)
    }

    /// Unit direction vector for this angle, in fixed point.
    pub fn unit_vector(self) -> Vec2Fixed {
        let rad = self.to_radians();
        Vec2Fixed::new(Fixed::from_f32(cos_det(rad)), Fixed::from_f32(sin_det(rad)))
    }

    #[inline]
    pub const fn wrapping_add(self, rhs: Self) -> Self {
        Self((self.0 + rhs.0) & Self::MASK)
    }

    #[inline]
    pub const fn wrapping_sub(self, rhs: Self) -> Self {
        Self(self.0.wrapping_sub(rhs.0) & Self::MASK)
    }
}
