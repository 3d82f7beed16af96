use std::rc::Rc;

use super::{PartInput, SetupContext, Shape, WallRole, clip_extra_floors, sector_quad, single};
use crate::engine::texture_plane::{TextureProjection, TexturePlane};

/// Side of a 3D floor slab.  `Middle3D` looks at a slab in the sector
/// behind the line, `MiddleBack` at the inside of a render-inside slab in
/// our own sector.
pub(super) fn build(
    ctx: &mut SetupContext<'_>,
    input: &PartInput<'_>,
    role: WallRole,
) -> Option<Shape> {
    let control = role.control_sector()?;
    let inside = matches!(role, WallRole::MiddleBack { .. });

    let level = ctx.level;
    let sd = input.sd;
    let side = &level.sidedefs[sd as usize];
    let other_id = level.other_sector(sd)?;
    let own = &input.own;
    let other = ctx.sector_data(other_id);

    let (host, facing) = if inside {
        (Rc::clone(own), Rc::clone(&other))
    } else {
        (Rc::clone(&other), Rc::clone(own))
    };
    let ef = *host
        .extra_floors
        .iter()
        .find(|ef| ef.control_sector == control)?;
    // the same slab on both sides of the line has no visible side here
    if facing
        .extra_floors
        .iter()
        .any(|e| e.control_sector == control)
    {
        return None;
    }
    if inside && !ef.render_inside() {
        return None;
    }

    let control_s = level.sectors.get(control as usize)?;
    let control_line = level.linedefs.get(ef.control_linedef as usize)?;
    let (vl, vr) = level.sidedef_endpoints(sd);
    let (tsz, tof) = super::texture_metrics(ctx, sd, role, input.tex);

    let (slab_top, slab_bottom) = (control_s.ceil_h, control_s.floor_h);
    let bias = if slab_top == slab_bottom { 1.0 } else { 0.0 };
    let anchor_y = if control_line
        .flags
        .intersects(ctx.config.lower_unpegged_flag)
    {
        tsz.y - (slab_top - slab_bottom)
    } else {
        0.0
    };
    let tex_plane = TexturePlane::project(&TextureProjection {
        size: tsz,
        offset: tof,
        anchor_y,
        span_y: slab_top - (slab_bottom + bias),
        line_length: level.line_length(side.linedef),
        left: vl,
        right: vr,
        z_top: slab_top,
        z_bottom: slab_bottom + bias,
    });

    let mut poly = sector_quad(level, input)
        .crop(&ef.top, false)
        .crop(&ef.bottom, false);
    if !inside {
        poly = poly
            .crop(&other.ceiling.plane, true)
            .crop(&other.floor.plane, true);
    }

    // solid slabs cut everything, translucent ones only other translucent sides
    let polygons = clip_extra_floors(single(poly), &own.extra_floors, |e| {
        e.control_sector != control && (e.clip_sidedefs || !ef.clip_sidedefs)
    });
    if polygons.is_empty() {
        return None;
    }

    Some(Shape {
        polygons,
        tex_plane,
        top: ef.top,
        bottom: ef.bottom,
        render_as_sky: false,
        z_limits: None,
    })
}
