use glam::{DVec2, DVec3};

use crate::{config::VisualConfig, world::Texture};

/// Stand-in for a vertical sample gap that would make `v` singular.
const MIN_Z_SPAN: f64 = 0.001;

/// Inputs for projecting one wall part's texture, all in texture pixels
/// except the world-space corners.
#[derive(Clone, Copy, Debug)]
pub struct TextureProjection {
    /// Effective texture size, see [`scaled_texture_size`].
    pub size: DVec2,
    /// Accumulated offset, see [`scaled_offsets`].
    pub offset: DVec2,
    /// Pixel row bound to `z_top`, before offsetting.
    pub anchor_y: f64,
    /// Pixel rows between `z_top` and `z_bottom`.
    pub span_y: f64,
    pub line_length: f64,
    pub left: DVec2,
    pub right: DVec2,
    pub z_top: f64,
    pub z_bottom: f64,
}

/// Maps positions on a wall to UV.  Corners are stored already divided by
/// the texture size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TexturePlane {
    pub tlt: DVec2,
    pub trb: DVec2,
    pub trt: DVec2,
    pub vlt: DVec3,
    pub vrb: DVec3,
    pub vrt: DVec3,
}

impl TexturePlane {
    pub fn project(p: &TextureProjection) -> Self {
        let mut tlt = DVec2::new(0.0, p.anchor_y);
        // integral length, ties to even like the game
        let mut trb = DVec2::new(
            tlt.x + p.line_length.round_ties_even(),
            tlt.y + p.span_y,
        );

        tlt += p.offset;
        trb += p.offset;
        tlt /= p.size;
        trb /= p.size;

        let vlt = p.left.extend(p.z_top);
        let vrb = p.right.extend(p.z_bottom);

        Self {
            tlt,
            trb,
            trt: DVec2::new(trb.x, tlt.y),
            vlt,
            vrb,
            vrt: vrb.truncate().extend(vlt.z),
        }
    }

    /// UV at a point lying on the wall.
    pub fn uv_at(&self, pos: DVec3) -> DVec2 {
        let axis = (self.vrt - self.vlt).truncate();
        let len_sq = axis.length_squared();
        let u = if len_sq > 0.0 {
            (pos.truncate() - self.vlt.truncate()).dot(axis) / len_sq
        } else {
            0.0
        };

        let mut dz = self.vlt.z - self.vrb.z;
        if dz.abs() < MIN_Z_SPAN {
            dz = MIN_Z_SPAN.copysign(dz);
        }
        let v = (self.vlt.z - pos.z) / dz;

        DVec2::new(
            self.tlt.x + (self.trb.x - self.tlt.x) * u,
            self.tlt.y + (self.trb.y - self.tlt.y) * v,
        )
    }
}

/// Pixel size of `tex` under a part scale.  Always rounded up.
pub fn scaled_texture_size(tex: &Texture, scale: DVec2) -> DVec2 {
    let sx = if scale.x == 0.0 { 1.0 } else { scale.x };
    let sy = if scale.y == 0.0 { 1.0 } else { scale.y };
    DVec2::new(
        (tex.scaled_w() / sx).ceil(),
        (tex.scaled_h() / sy).ceil(),
    )
}

/// Sidedef offset plus part offset, converted into texture pixels unless the
/// texture pans in world units.
pub fn scaled_offsets(
    config: &VisualConfig,
    tex: &Texture,
    base: DVec2,
    part: DVec2,
    scale: DVec2,
) -> DVec2 {
    let mut tof = base + part;
    if config.scaled_texture_offsets && !tex.world_panning && !config.force_world_panning {
        let abs = scale.abs();
        let abs = DVec2::new(
            if abs.x == 0.0 { 1.0 } else { abs.x },
            if abs.y == 0.0 { 1.0 } else { abs.y },
        );
        tof /= abs;
        tof *= tex.scale;
        if tex.hires {
            tof *= abs;
        }
        tof = tof.ceil();
    }
    tof
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
