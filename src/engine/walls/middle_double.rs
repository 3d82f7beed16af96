use super::{PartInput, SetupContext, Shape, WallRole, clip_extra_floors, sector_quad, single};
use crate::{
    engine::{
        plane::Plane,
        texture_plane::{TextureProjection, TexturePlane},
    },
    world::{LinedefFlags, NO_TEXTURE_NAME},
};

/// Middle texture of a two-sided line, hanging in the opening between the
/// two sectors.
pub(super) fn build(ctx: &mut SetupContext<'_>, input: &PartInput<'_>) -> Option<Shape> {
    let level = ctx.level;
    let sd = input.sd;
    let side = &level.sidedefs[sd as usize];
    if side.middle.is_empty() || side.middle == NO_TEXTURE_NAME {
        return None;
    }
    let other_id = level.other_sector(sd)?;
    let own = &input.own;
    let other = ctx.sector_data(other_id);

    let own_s = &level.sectors[side.sector as usize];
    let other_s = &level.sectors[other_id as usize];
    let line = &level.linedefs[side.linedef as usize];
    let (vl, vr) = level.sidedef_endpoints(sd);
    let (tsz, tof) = super::texture_metrics(ctx, sd, WallRole::MiddleDouble, input.tex);

    let geotop = own_s.ceil_h.min(other_s.ceil_h);
    let geobottom = own_s.floor_h.max(other_s.floor_h);
    let zoffset = own_s.ceil_h - other_s.ceil_h;
    let lower_unpegged = line.flags.intersects(ctx.config.lower_unpegged_flag);

    let bias = if own_s.ceil_h == own_s.floor_h { 1.0 } else { 0.0 };
    let mut anchor_y = if lower_unpegged {
        tsz.y - (geotop - geobottom)
    } else {
        0.0
    };
    if zoffset > 0.0 {
        anchor_y -= zoffset;
    }
    let tex_plane = TexturePlane::project(&TextureProjection {
        size: tsz,
        offset: tof,
        anchor_y,
        span_y: own_s.ceil_h - (own_s.floor_h + bias),
        line_length: level.line_length(side.linedef),
        left: vl,
        right: vr,
        z_top: own_s.ceil_h,
        z_bottom: own_s.floor_h + bias,
    });

    let mut poly = sector_quad(level, input)
        .crop(&other.ceiling.plane, true)
        .crop(&other.floor.plane, true);

    let wrapped =
        line.flags.contains(LinedefFlags::WRAP_MIDTEX) || side.fields.flag("wrapmidtex");
    let z_limits = if wrapped {
        None
    } else {
        let textop = if lower_unpegged {
            geobottom + tof.y + tsz.y.abs()
        } else {
            geotop + tof.y
        };
        let texbottom = textop - tsz.y.abs();
        poly = poly
            .crop(&Plane::ceiling(textop), true)
            .crop(&Plane::floor(texbottom), true);
        Some((texbottom, textop))
    };
    let polygons = clip_extra_floors(single(poly), &own.extra_floors, |ef| ef.clip_sidedefs);
    if polygons.is_empty() {
        return None;
    }

    let center = level.line_center(side.linedef);
    let top = if other.ceiling.plane.get_z(center) < own.ceiling.plane.get_z(center) {
        other.ceiling.plane
    } else {
        own.ceiling.plane
    };
    let bottom = if other.floor.plane.get_z(center) > own.floor.plane.get_z(center) {
        other.floor.plane
    } else {
        own.floor.plane
    };

    Some(Shape {
        polygons,
        tex_plane,
        top,
        bottom,
        render_as_sky: false,
        z_limits,
    })
}
