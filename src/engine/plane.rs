use glam::{DVec2, DVec3};

use crate::world::SlopeDef;

/// Infinite plane `normal · p + offset = 0`.
///
/// Sector planes face *into* the sector: a floor points up, a ceiling points
/// down, so `distance > 0` always means "inside".
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub normal: DVec3,
    pub offset: f64,
}

impl Plane {
    pub fn new(normal: DVec3, offset: f64) -> Self {
        let len = normal.length();
        Self {
            normal: normal / len,
            offset: offset / len,
        }
    }

    /// Horizontal plane at `h`, facing up.
    pub fn floor(h: f64) -> Self {
        Self {
            normal: DVec3::Z,
            offset: -h,
        }
    }

    /// Horizontal plane at `h`, facing down.
    pub fn ceiling(h: f64) -> Self {
        Self {
            normal: DVec3::NEG_Z,
            offset: h,
        }
    }

    /// Plane through three points, oriented up (`up`) or down.
    pub fn from_points(p1: DVec3, p2: DVec3, p3: DVec3, up: bool) -> Self {
        let mut normal = (p2 - p1).cross(p3 - p1).normalize();
        if (normal.z < 0.0) == up {
            normal = -normal;
        }
        Self {
            normal,
            offset: -normal.dot(p1),
        }
    }

    /// Sloped sector plane; flipped if needed so it faces up (floor) or down.
    pub fn from_slope(slope: SlopeDef, up: bool) -> Self {
        let p = Self::new(DVec3::new(slope.a, slope.b, slope.c), slope.d);
        if (p.normal.z < 0.0) == up {
            p.inverted()
        } else {
            p
        }
    }

    pub fn inverted(&self) -> Self {
        Self {
            normal: -self.normal,
            offset: -self.offset,
        }
    }

    /// Signed distance; positive on the side the normal points to.
    #[inline]
    pub fn distance(&self, p: DVec3) -> f64 {
        self.normal.dot(p) + self.offset
    }

    /// Height of the plane above map position `p`.
    #[inline]
    pub fn get_z(&self, p: DVec2) -> f64 {
        -(self.offset + self.normal.x * p.x + self.normal.y * p.y) / self.normal.z
    }

    /// Fraction along `from → to` where the segment meets the plane.
    pub fn intersection(&self, from: DVec3, to: DVec3) -> Option<f64> {
        let denom = self.normal.dot(to - from);
        if denom == 0.0 {
            return None;
        }
        Some(-self.distance(from) / denom)
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
