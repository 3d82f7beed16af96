use super::{PartInput, SetupContext, Shape, WallRole, clip_extra_floors, sector_quad, single};
use crate::engine::texture_plane::{TextureProjection, TexturePlane};

/// Wall between our ceiling and the lower ceiling of the sector behind.
pub(super) fn build(ctx: &mut SetupContext<'_>, input: &PartInput<'_>) -> Option<Shape> {
    let level = ctx.level;
    let sd = input.sd;
    let side = &level.sidedefs[sd as usize];
    let other_id = level.other_sector(sd)?;
    let own = &input.own;
    let other = ctx.sector_data(other_id);

    let (vl, vr) = level.sidedef_endpoints(sd);
    let (cl, cr) = (own.ceiling.plane.get_z(vl), own.ceiling.plane.get_z(vr));
    let (ocl, ocr) = (other.ceiling.plane.get_z(vl), other.ceiling.plane.get_z(vr));
    if !(cl > ocl || cr > ocr) {
        return None;
    }

    let own_s = &level.sectors[side.sector as usize];
    let other_s = &level.sectors[other_id as usize];
    let line = &level.linedefs[side.linedef as usize];
    let (tsz, tof) = super::texture_metrics(ctx, sd, WallRole::Upper, input.tex);

    let bias = if own_s.ceil_h == other_s.ceil_h { 1.0 } else { 0.0 };
    // pegged uppers hang from the lower ceiling
    let anchor_y = if line.flags.intersects(ctx.config.upper_unpegged_flag) {
        0.0
    } else {
        tsz.y - (own_s.ceil_h - other_s.ceil_h)
    };
    let tex_plane = TexturePlane::project(&TextureProjection {
        size: tsz,
        offset: tof,
        anchor_y,
        span_y: own_s.ceil_h - (other_s.ceil_h + bias),
        line_length: level.line_length(side.linedef),
        left: vl,
        right: vr,
        z_top: own_s.ceil_h,
        z_bottom: other_s.ceil_h + bias,
    });

    let mut poly = sector_quad(level, input).crop(&other.ceiling.plane, false);

    // other sector's ceiling dips below its floor
    let (ofl, ofr) = (other.floor.plane.get_z(vl), other.floor.plane.get_z(vr));
    if ocl < ofl || ocr < ofr {
        poly = poly.crop(&other.floor.plane, true);
    }

    let polygons = clip_extra_floors(single(poly), &own.extra_floors, |ef| ef.clip_sidedefs);
    if polygons.is_empty() {
        return None;
    }

    let center = level.line_center(side.linedef);
    let bottom = if other.ceiling.plane.get_z(center) > own.floor.plane.get_z(center) {
        other.ceiling.plane
    } else {
        own.floor.plane
    };
    let sky = &ctx.config.sky_flat_name;

    Some(Shape {
        polygons,
        tex_plane,
        top: own.ceiling.plane,
        bottom,
        render_as_sky: own_s.has_sky_ceiling(sky) && other_s.has_sky_ceiling(sky),
        z_limits: None,
    })
}
