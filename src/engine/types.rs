use std::ops::Range;

use glam::{Vec2, Vec3};
use smallvec::SmallVec;

use super::plane::Plane;
use crate::world::TextureId;

/// 8-bit ARGB color as the renderer consumes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelColor {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl PixelColor {
    pub const WHITE: PixelColor = PixelColor::new(255, 255, 255, 255);

    pub const fn new(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { a, r, g, b }
    }

    /// Opaque grey of the given intensity.
    pub const fn grey(level: u8) -> Self {
        Self::new(255, level, level, level)
    }

    /// From 0xAARRGGBB.
    pub const fn from_int(c: u32) -> Self {
        Self::new((c >> 24) as u8, (c >> 16) as u8, (c >> 8) as u8, c as u8)
    }

    /// From 0xRRGGBB, fully opaque.
    pub const fn from_rgb(c: u32) -> Self {
        Self::from_int(c | 0xFF00_0000)
    }

    pub const fn to_int(self) -> u32 {
        (self.a as u32) << 24 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Channel-wise multiply, 255 acting as 1.0.
    pub fn modulate(self, other: PixelColor) -> Self {
        #[inline]
        fn mul(x: u8, y: u8) -> u8 {
            ((u16::from(x) * u16::from(y) + 127) / 255) as u8
        }
        Self::new(
            mul(self.a, other.a),
            mul(self.r, other.r),
            mul(self.g, other.g),
            mul(self.b, other.b),
        )
    }
}

impl Default for PixelColor {
    fn default() -> Self {
        Self::WHITE
    }
}

/// One emitted wall vertex.  Never modified after lowering.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WorldVertex {
    pub pos: Vec3,
    pub uv: Vec2,
    pub color: PixelColor,
    pub fog: f32,
}

/// Renderable result of a successful wall-part setup.
#[derive(Clone, Debug, PartialEq)]
pub struct WallGeometry {
    /// All polygons back to back, winding order preserved.
    pub vertices: Vec<WorldVertex>,
    /// Index range of each polygon inside `vertices`.
    pub polygons: SmallVec<[Range<usize>; 4]>,
    pub texture: TextureId,
    /// Bounding planes used for picking.
    pub top: Plane,
    pub bottom: Plane,
    pub fog_factor: f32,
    pub render_as_sky: bool,
    /// `x`: lowest U among the vertices, `y`: V change per unit of U.
    pub skew: Vec2,
}

impl WallGeometry {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Fan-triangulate every polygon range.
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.polygons.iter().flat_map(|r| {
            let first = r.start;
            (r.start + 1..r.end.saturating_sub(1)).map(move |i| [first, i, i + 1])
        })
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
