use super::{PartInput, SetupContext, Shape, WallRole, clip_extra_floors, sector_quad, single};
use crate::engine::texture_plane::{TextureProjection, TexturePlane};

/// Below this floor-to-ceiling gap a one-sided wall is not drawn.
const MIN_GAP: f64 = 0.01;

pub(super) fn build(ctx: &mut SetupContext<'_>, input: &PartInput<'_>) -> Option<Shape> {
    let level = ctx.level;
    let sd = input.sd;
    let side = &level.sidedefs[sd as usize];
    let own = &input.own;
    let sector = &level.sectors[side.sector as usize];
    let line = &level.linedefs[side.linedef as usize];

    let (vl, vr) = level.sidedef_endpoints(sd);
    let (fl, fr) = (own.floor.plane.get_z(vl), own.floor.plane.get_z(vr));
    let (cl, cr) = (own.ceiling.plane.get_z(vl), own.ceiling.plane.get_z(vr));
    if !((cl - fl) > MIN_GAP || (cr - fr) > MIN_GAP) {
        return None;
    }

    let (tsz, tof) = super::texture_metrics(ctx, sd, WallRole::MiddleSingle, input.tex);
    let bias = if sector.ceil_h == sector.floor_h { 1.0 } else { 0.0 };
    let anchor_y = if line.flags.intersects(ctx.config.lower_unpegged_flag) {
        tsz.y - (sector.ceil_h - sector.floor_h)
    } else {
        0.0
    };
    let tex_plane = TexturePlane::project(&TextureProjection {
        size: tsz,
        offset: tof,
        anchor_y,
        span_y: sector.ceil_h - (sector.floor_h + bias),
        line_length: level.line_length(side.linedef),
        left: vl,
        right: vr,
        z_top: sector.ceil_h,
        z_bottom: sector.floor_h + bias,
    });

    let polygons = clip_extra_floors(
        single(sector_quad(level, input)),
        &own.extra_floors,
        |ef| ef.clip_sidedefs,
    );
    if polygons.is_empty() {
        return None;
    }

    Some(Shape {
        polygons,
        tex_plane,
        top: own.ceiling.plane,
        bottom: own.floor.plane,
        render_as_sky: false,
        z_limits: None,
    })
}
