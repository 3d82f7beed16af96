use super::{PartInput, SetupContext, Shape, WallRole, clip_extra_floors, sector_quad, single};
use crate::{
    engine::texture_plane::{TextureProjection, TexturePlane},
    world::NO_TEXTURE_NAME,
};

/// Wall between our floor and the higher floor of the sector behind.
pub(super) fn build(ctx: &mut SetupContext<'_>, input: &PartInput<'_>) -> Option<Shape> {
    let level = ctx.level;
    let sd = input.sd;
    let side = &level.sidedefs[sd as usize];
    let other_id = level.other_sector(sd)?;
    let own = &input.own;
    let other = ctx.sector_data(other_id);

    let (vl, vr) = level.sidedef_endpoints(sd);
    let (fl, fr) = (own.floor.plane.get_z(vl), own.floor.plane.get_z(vr));
    let (ofl, ofr) = (other.floor.plane.get_z(vl), other.floor.plane.get_z(vr));
    if !(fl < ofl || fr < ofr) {
        return None;
    }

    let own_s = &level.sectors[side.sector as usize];
    let other_s = &level.sectors[other_id as usize];
    let line = &level.linedefs[side.linedef as usize];
    let sky = &ctx.config.sky_flat_name;
    let (tsz, tof) = super::texture_metrics(ctx, sd, WallRole::Lower, input.tex);

    let bias = if other_s.floor_h == own_s.floor_h { 1.0 } else { 0.0 };
    let anchor_y = if !line.flags.intersects(ctx.config.lower_unpegged_flag) {
        0.0
    } else if own_s.has_sky_ceiling(sky) && other_s.has_sky_ceiling(sky) {
        // both skies: the game offsets from the other sector's ceiling
        other_s.ceil_h - other_s.floor_h
    } else {
        own_s.ceil_h - other_s.floor_h
    };
    let tex_plane = TexturePlane::project(&TextureProjection {
        size: tsz,
        offset: tof,
        anchor_y,
        span_y: other_s.floor_h - (own_s.floor_h + bias),
        line_length: level.line_length(side.linedef),
        left: vl,
        right: vr,
        z_top: other_s.floor_h,
        z_bottom: own_s.floor_h + bias,
    });

    let mut poly = sector_quad(level, input).crop(&other.floor.plane, false);

    // other sector's floor pokes through its ceiling
    if ofl > other.ceiling.plane.get_z(vl) || ofr > other.ceiling.plane.get_z(vr) {
        poly = poly.crop(&other.ceiling.plane, true);
    }

    let polygons = clip_extra_floors(single(poly), &own.extra_floors, |ef| ef.clip_sidedefs);
    if polygons.is_empty() {
        return None;
    }

    // our ceiling can sit below the other floor
    let center = level.line_center(side.linedef);
    let top = if other.floor.plane.get_z(center) < own.ceiling.plane.get_z(center) {
        other.floor.plane
    } else {
        own.ceiling.plane
    };

    Some(Shape {
        polygons,
        tex_plane,
        top,
        bottom: own.floor.plane,
        render_as_sky: other_s.has_sky_floor(sky) && side.lower == NO_TEXTURE_NAME,
        z_limits: None,
    })
}
