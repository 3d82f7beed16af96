//! Wall parts: the visible pieces of one sidedef.
//!
//! Each [`WallRole`] has its own module that decides which planes bound the
//! part, builds the initial quad and clips it.  Everything else (texture
//! lookup, lighting, lowering to vertices, skew, offsets) is shared and
//! lives here.

mod lower;
mod middle_3d;
mod middle_double;
mod middle_single;
mod upper;

use std::{ops::Range, rc::Rc};

use glam::{DVec2, DVec3, IVec2, Vec2, Vec3};
use log::{trace, warn};
use smallvec::{SmallVec, smallvec};

use super::{
    lighting::{WallLight, fog_factor, wall_color, wall_light},
    plane::Plane,
    polygon::WallPolygon,
    sector_data::{ExtraFloor, SectorCache, SectorData},
    texture_plane::{TexturePlane, scaled_offsets, scaled_texture_size},
    types::{PixelColor, WallGeometry, WorldVertex},
};
use crate::{
    config::VisualConfig,
    world::{
        ExtraFloorDef, ExtraFloorFlags, Level, MISSING_TEXTURE, SectorId, SidedefId, Texture, TextureBank,
        TextureId, TextureLookup, UNKNOWN_TEXTURE,
    },
};

pub(crate) type Polygons = SmallVec<[WallPolygon; 4]>;

/// Structural role of a wall part.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WallRole {
    Upper,
    Lower,
    MiddleSingle,
    MiddleDouble,
    /// Side of a 3D floor in the neighbouring sector, seen from this one.
    Middle3D { control_sector: SectorId },
    /// Inner face of a render-inside 3D floor in this sector.
    MiddleBack { control_sector: SectorId },
}

impl WallRole {
    /// UDMF suffix used by `offsetx_*`, `scalex_*`, `light_*`.
    pub fn part_key(self) -> &'static str {
        match self {
            WallRole::Upper => "top",
            WallRole::Lower => "bottom",
            _ => "mid",
        }
    }

    fn skew_key(self) -> Option<&'static str> {
        match self {
            WallRole::Upper => Some("skew_top_type"),
            WallRole::Lower => Some("skew_bottom_type"),
            WallRole::MiddleSingle | WallRole::MiddleDouble => Some("skew_middle_type"),
            WallRole::Middle3D { .. } | WallRole::MiddleBack { .. } => None,
        }
    }

    /// A texture change on this role can change how 3D floors cut the rest
    /// of the sector.
    pub fn texture_change_affects_sector(self) -> bool {
        matches!(
            self,
            WallRole::Lower | WallRole::MiddleSingle | WallRole::MiddleDouble
        )
    }

    pub fn control_sector(self) -> Option<SectorId> {
        match self {
            WallRole::Middle3D { control_sector } | WallRole::MiddleBack { control_sector } => {
                Some(control_sector)
            }
            _ => None,
        }
    }
}

/// Everything a setup reads.  The cache is the only thing it writes.
pub struct SetupContext<'a> {
    pub level: &'a Level,
    pub textures: &'a TextureBank,
    pub config: &'a VisualConfig,
    pub cache: &'a mut SectorCache,
}

impl SetupContext<'_> {
    fn sector_data(&mut self, id: SectorId) -> Rc<SectorData> {
        self.cache.get_refreshed(self.level, self.config, id)
    }
}

/// What a role module hands back before lowering.
pub(crate) struct Shape {
    pub polygons: Polygons,
    pub tex_plane: TexturePlane,
    pub top: Plane,
    pub bottom: Plane,
    pub render_as_sky: bool,
    /// Extra vertical bounds for picking (cropped double-sided middles).
    pub z_limits: Option<(f64, f64)>,
}

/// Inputs shared by the role modules.
pub(crate) struct PartInput<'t> {
    pub sd: SidedefId,
    pub tex: &'t Texture,
    pub own: Rc<SectorData>,
    pub color: PixelColor,
}

#[derive(Clone, Debug)]
pub struct WallPart {
    pub sidedef: SidedefId,
    pub role: WallRole,
    pub texture: TextureId,
    /// Texture name to set up again for once it has loaded.
    pub pending_texture: Option<String>,
    pub geometry: Option<WallGeometry>,
    z_limits: Option<(f64, f64)>,
}

impl WallPart {
    pub fn new(sidedef: SidedefId, role: WallRole) -> Self {
        Self {
            sidedef,
            role,
            texture: MISSING_TEXTURE,
            pending_texture: None,
            geometry: None,
            z_limits: None,
        }
    }

    pub fn has_geometry(&self) -> bool {
        self.geometry.is_some()
    }

    /// Rebuild this part from the current map state.  Returns whether any
    /// geometry was produced.
    pub fn setup(&mut self, ctx: &mut SetupContext<'_>) -> bool {
        self.geometry = None;
        self.z_limits = None;

        let level = ctx.level;
        let sd = self.sidedef;
        let Some(side) = level.sidedefs.get(sd as usize) else {
            warn!("wall part refers to missing sidedef {sd}");
            return false;
        };

        let textures = ctx.textures;
        let (texture, pending) = resolve_texture(textures, self.texture_name(level));
        self.texture = texture;
        self.pending_texture = pending;
        let tex = textures.get_or_unknown(texture);

        let own = ctx.sector_data(side.sector);
        let light = wall_light(level, sd, self.role.part_key(), own.fogged);
        let light_level = light.level(own.ceiling.brightness_below);
        let color = wall_color(ctx.config, level, sd, light_level, own.ceiling.color_below);
        let fog = fog_factor(ctx.config, light_level);

        let input = PartInput {
            sd,
            tex,
            own: Rc::clone(&own),
            color,
        };
        let shape = match self.role {
            WallRole::Upper => upper::build(ctx, &input),
            WallRole::Lower => lower::build(ctx, &input),
            WallRole::MiddleSingle => middle_single::build(ctx, &input),
            WallRole::MiddleDouble => middle_double::build(ctx, &input),
            WallRole::Middle3D { .. } | WallRole::MiddleBack { .. } => {
                middle_3d::build(ctx, &input, self.role)
            }
        };
        let Some(shape) = shape else {
            trace!("sidedef {sd} {:?}: no geometry", self.role);
            return false;
        };

        let (vertices, polygons) =
            lower_polygons(ctx.config, level, sd, shape.polygons, &shape.tex_plane, &own, light, fog);
        if vertices.len() < 3 {
            trace!("sidedef {sd} {:?}: clipped away", self.role);
            return false;
        }

        trace!(
            "sidedef {sd} {:?}: {} vertices in {} polygons",
            self.role,
            vertices.len(),
            polygons.len()
        );
        self.z_limits = shape.z_limits;
        self.geometry = Some(WallGeometry {
            vertices,
            polygons,
            texture,
            top: shape.top,
            bottom: shape.bottom,
            fog_factor: fog,
            render_as_sky: shape.render_as_sky,
            skew: Vec2::ZERO,
        });
        self.update_skew(ctx, tex);
        true
    }

    /// Recompute the V skew from the configured reference plane.  Needs the
    /// final texture and vertices.
    pub fn update_skew(&mut self, ctx: &mut SetupContext<'_>, tex: &Texture) {
        let Some(plane) = self.skew_plane(ctx) else {
            if let Some(g) = self.geometry.as_mut() {
                g.skew = Vec2::ZERO;
            }
            return;
        };
        let Some(g) = self.geometry.as_mut() else {
            return;
        };
        g.skew = Vec2::ZERO;

        let level = ctx.level;
        let ld = level.sidedefs[self.sidedef as usize].linedef;
        let length = level.line_length(ld);
        if length <= 0.0 || tex.h == 0 {
            return;
        }
        let (vl, vr) = level.sidedef_endpoints(self.sidedef);
        let (leftz, rightz) = (plane.get_z(vl), plane.get_z(vr));
        let min_u = g.vertices.iter().map(|v| v.uv.x).fold(f32::INFINITY, f32::min);
        let aspect = f64::from(tex.w) / f64::from(tex.h);
        g.skew = Vec2::new(min_u, ((rightz - leftz) / length * aspect) as f32);
    }

    fn skew_plane(&self, ctx: &mut SetupContext<'_>) -> Option<Plane> {
        if !ctx.config.sidedef_texture_skewing {
            return None;
        }
        let level = ctx.level;
        let key = self.role.skew_key()?;
        let side = &level.sidedefs[self.sidedef as usize];
        let line = &level.linedefs[side.linedef as usize];

        let (front, floor) = match (self.role, side.fields.string(key, "none")) {
            (WallRole::Lower, "front") => (true, true),
            (WallRole::Lower, "back") => (false, true),
            (WallRole::Upper, "front") => (true, false),
            (WallRole::Upper, "back") => (false, false),
            (WallRole::MiddleSingle | WallRole::MiddleDouble, "front_floor") => (true, true),
            (WallRole::MiddleSingle | WallRole::MiddleDouble, "front_ceiling") => (true, false),
            (WallRole::MiddleDouble, "back_floor") => (false, true),
            (WallRole::MiddleDouble, "back_ceiling") => (false, false),
            _ => return None,
        };

        let ref_side = if front { line.front } else { line.back }?;
        let data = ctx.sector_data(level.sidedefs[ref_side as usize].sector);
        Some(if floor {
            data.floor.plane
        } else {
            data.ceiling.plane
        })
    }

    /// Ray test against the sidedef line, limited to the part's vertical
    /// extent.  Returns the fraction along `from → to`.
    pub fn pick_accurate(&self, level: &Level, from: DVec3, to: DVec3) -> Option<f64> {
        let g = self.geometry.as_ref()?;
        let ld = level.sidedefs[self.sidedef as usize].linedef;
        let u = segment_intersection(
            from.truncate(),
            to.truncate(),
            level.line_start(ld),
            level.line_end(ld),
        )?;

        let hit = from + (to - from) * u;
        let p = hit.truncate();
        if hit.z < g.bottom.get_z(p) || hit.z > g.top.get_z(p) {
            return None;
        }
        if let Some((lo, hi)) = self.z_limits {
            if hit.z < lo || hit.z > hi {
                return None;
            }
        }
        Some(u)
    }

    /*----------------------- texture accessors ----------------------*/

    /// Sidedef carrying the part's scale fields.
    fn scale_side(&self, level: &Level) -> SidedefId {
        self.role
            .control_sector()
            .and_then(|c| control_side(level, self.sidedef, c))
            .unwrap_or(self.sidedef)
    }

    pub fn texture_name<'a>(&self, level: &'a Level) -> &'a str {
        let side = &level.sidedefs[self.sidedef as usize];
        match self.role {
            WallRole::Upper => &side.upper,
            WallRole::Lower => &side.lower,
            WallRole::MiddleSingle | WallRole::MiddleDouble => &side.middle,
            WallRole::Middle3D { control_sector } | WallRole::MiddleBack { control_sector } => {
                let Some(ef) = find_extra_floor_def(level, self.sidedef, control_sector) else {
                    return "-";
                };
                if ef.flags.contains(ExtraFloorFlags::USE_UPPER_TEXTURE) {
                    &side.upper
                } else if ef.flags.contains(ExtraFloorFlags::USE_LOWER_TEXTURE) {
                    &side.lower
                } else {
                    control_side(level, self.sidedef, control_sector)
                        .map(|cs| level.sidedefs[cs as usize].middle.as_str())
                        .unwrap_or("-")
                }
            }
        }
    }

    /// Store a new texture name.  The caller sets the part up again.
    pub fn set_texture(&self, level: &mut Level, name: &str) {
        let name = name.to_ascii_uppercase();
        let sd = self.sidedef as usize;
        match self.role {
            WallRole::Upper => level.sidedefs[sd].upper = name,
            WallRole::Lower => level.sidedefs[sd].lower = name,
            WallRole::MiddleSingle | WallRole::MiddleDouble => level.sidedefs[sd].middle = name,
            WallRole::Middle3D { control_sector } | WallRole::MiddleBack { control_sector } => {
                let flags = find_extra_floor_def(level, self.sidedef, control_sector)
                    .map(|ef| ef.flags)
                    .unwrap_or_default();
                if flags.contains(ExtraFloorFlags::USE_UPPER_TEXTURE) {
                    level.sidedefs[sd].upper = name;
                } else if flags.contains(ExtraFloorFlags::USE_LOWER_TEXTURE) {
                    level.sidedefs[sd].lower = name;
                } else if let Some(cs) = control_side(level, self.sidedef, control_sector) {
                    level.sidedefs[cs as usize].middle = name;
                }
            }
        }
    }

    fn offset_keys(&self) -> (String, String) {
        let p = self.role.part_key();
        (format!("offsetx_{p}"), format!("offsety_{p}"))
    }

    fn scale_keys(&self) -> (String, String) {
        let p = self.role.part_key();
        (format!("scalex_{p}"), format!("scaley_{p}"))
    }

    /// Part offsets, truncated to whole pixels.
    pub fn texture_offset(&self, level: &Level) -> IVec2 {
        let (kx, ky) = self.offset_keys();
        let fields = &level.sidedefs[self.sidedef as usize].fields;
        IVec2::new(fields.float(&kx, 0.0) as i32, fields.float(&ky, 0.0) as i32)
    }

    pub fn set_texture_offset_x(&self, level: &mut Level, x: i32) {
        let (kx, _) = self.offset_keys();
        level.sidedefs[self.sidedef as usize]
            .fields
            .set_float_or_remove(&kx, f64::from(x), 0.0);
    }

    pub fn set_texture_offset_y(&self, level: &mut Level, y: i32) {
        let (_, ky) = self.offset_keys();
        level.sidedefs[self.sidedef as usize]
            .fields
            .set_float_or_remove(&ky, f64::from(y), 0.0);
    }

    /// Shift the part offsets and wrap them into one texture period.
    pub fn move_texture_offset(
        &self,
        level: &mut Level,
        textures: &TextureBank,
        config: &VisualConfig,
        dx: i32,
        dy: i32,
    ) {
        let (kx, ky) = self.offset_keys();
        let (sx, sy) = self.scale_keys();
        let scale_side = self.scale_side(level);
        let scale = {
            let f = &level.sidedefs[scale_side as usize].fields;
            DVec2::new(f.float(&sx, 1.0), f.float(&sy, 1.0))
        };

        let tex = textures.get_or_unknown(self.texture);
        let loaded = tex.loaded && self.pending_texture.is_none();
        let world_panning = tex.world_panning || config.force_world_panning;
        let size = if !loaded {
            DVec2::splat(-1.0)
        } else if world_panning {
            DVec2::new(tex.scaled_w() / scale.x, tex.scaled_h() / scale.y)
        } else {
            DVec2::new(f64::from(tex.w), f64::from(tex.h))
        };

        let fields = &mut level.sidedefs[self.sidedef as usize].fields;
        let x = new_texture_offset(fields.float(&kx, 0.0), f64::from(dx), size.x);
        let y = new_texture_offset(fields.float(&ky, 0.0), f64::from(dy), size.y);
        fields.set_float_or_remove(&kx, x, 0.0);
        fields.set_float_or_remove(&ky, y, 0.0);
    }

    pub fn reset_texture_scale(&self, level: &mut Level) {
        let (sx, sy) = self.scale_keys();
        let side = self.scale_side(level);
        let fields = &mut level.sidedefs[side as usize].fields;
        fields.remove(&sx);
        fields.remove(&sy);
    }
}

/// `old + delta`, wrapped into `0..size` (sign kept) when the size is known
/// and rounded to three decimals.
pub fn new_texture_offset(old: f64, delta: f64, size: f64) -> f64 {
    let mut result = old + delta;
    if size >= 1.0 {
        result %= size;
    }
    (result * 1000.0).round_ties_even() / 1000.0
}

fn resolve_texture(textures: &TextureBank, name: &str) -> (TextureId, Option<String>) {
    match textures.resolve(name) {
        TextureLookup::Missing => (MISSING_TEXTURE, None),
        TextureLookup::Unknown => {
            warn!("texture `{name}` not found, using placeholder");
            (UNKNOWN_TEXTURE, Some(name.to_string()))
        }
        TextureLookup::Loading(_) => (UNKNOWN_TEXTURE, Some(name.to_string())),
        TextureLookup::Ready(id) => (id, None),
    }
}

/// Effective texture size and pixel offset for a part.
pub(crate) fn texture_metrics(
    ctx: &SetupContext<'_>,
    sd: SidedefId,
    role: WallRole,
    tex: &Texture,
) -> (DVec2, DVec2) {
    let level = ctx.level;
    let side = &level.sidedefs[sd as usize];
    let p = role.part_key();
    let own_offset = DVec2::new(
        side.fields.float(&format!("offsetx_{p}"), 0.0),
        side.fields.float(&format!("offsety_{p}"), 0.0),
    );
    let mut base = DVec2::new(side.offset_x, side.offset_y);
    let mut part = own_offset;
    let mut scale_fields = &side.fields;

    // 3D floor sides add the control side's offsets and use its scale
    if let Some(cs) = role
        .control_sector()
        .and_then(|c| control_side(level, sd, c))
    {
        let control = &level.sidedefs[cs as usize];
        base += DVec2::new(control.offset_x, control.offset_y);
        part += DVec2::new(
            control.fields.float("offsetx_mid", 0.0),
            control.fields.float("offsety_mid", 0.0),
        );
        scale_fields = &control.fields;
    }

    let scale = DVec2::new(
        scale_fields.float(&format!("scalex_{p}"), 1.0),
        scale_fields.float(&format!("scaley_{p}"), 1.0),
    );
    (
        scaled_texture_size(tex, scale),
        scaled_offsets(ctx.config, tex, base, part, scale),
    )
}

/// The initial floor-to-ceiling quad of a sidedef in its own sector.
pub(crate) fn sector_quad(level: &Level, input: &PartInput<'_>) -> WallPolygon {
    let (vl, vr) = level.sidedef_endpoints(input.sd);
    let own = &input.own;
    WallPolygon::quad(
        (
            vl.extend(own.floor.plane.get_z(vl)),
            vl.extend(own.ceiling.plane.get_z(vl)),
        ),
        (
            vr.extend(own.floor.plane.get_z(vr)),
            vr.extend(own.ceiling.plane.get_z(vr)),
        ),
        input.color,
    )
}

/// Cut the slab of every matching 3D floor out of `polys`.  Pieces below
/// and above a slab survive as separate polygons.
pub(crate) fn clip_extra_floors<F>(polys: Polygons, floors: &[ExtraFloor], clips: F) -> Polygons
where
    F: Fn(&ExtraFloor) -> bool,
{
    let mut polys = polys;
    for ef in floors.iter().filter(|ef| clips(ef)) {
        let mut next = Polygons::new();
        for p in polys {
            let (below, above) = p.split(&ef.bottom, true);
            let above = above.crop(&ef.top, true);
            if !below.is_empty() {
                next.push(below);
            }
            if !above.is_empty() {
                next.push(above);
            }
        }
        polys = next;
    }
    polys
}

/// Split by the sector's light levels and emit vertices.  Each piece takes
/// the light of the nearest level above it.
fn lower_polygons(
    config: &VisualConfig,
    level: &Level,
    sd: SidedefId,
    polys: Polygons,
    tp: &TexturePlane,
    own: &SectorData,
    light: WallLight,
    fog: f32,
) -> (Vec<WorldVertex>, SmallVec<[Range<usize>; 4]>) {
    let mut vertices = Vec::with_capacity(polys.iter().map(WallPolygon::len).sum());
    let mut ranges = SmallVec::new();

    let mut emit = |poly: &WallPolygon| {
        let start = vertices.len();
        for &p in &poly.points {
            vertices.push(WorldVertex {
                // plane math yields -0.0 for a floor at height 0
                pos: p.as_vec3() + Vec3::ZERO,
                uv: tp.uv_at(p).as_vec2(),
                color: poly.color,
                fog,
            });
        }
        ranges.push(start..vertices.len());
    };

    for poly in polys {
        let mut current = poly;
        for lvl in own
            .inner_light_levels()
            .iter()
            .rev()
            .filter(|l| !l.disable_lighting)
        {
            if current.is_empty() {
                break;
            }
            // level planes face down: front is below
            let (above, mut below) = current.split(&lvl.plane, false);
            if !above.is_empty() {
                emit(&above);
            }
            below.color = wall_color(
                config,
                level,
                sd,
                light.level(lvl.brightness_below),
                lvl.color_below,
            );
            current = below;
        }
        if !current.is_empty() {
            emit(&current);
        }
    }

    (vertices, ranges)
}

fn segment_intersection(p1: DVec2, p2: DVec2, q1: DVec2, q2: DVec2) -> Option<f64> {
    let r = p2 - p1;
    let s = q2 - q1;
    let denom = r.perp_dot(s);
    if denom == 0.0 {
        return None;
    }
    let d = q1 - p1;
    let t = d.perp_dot(s) / denom;
    let u = d.perp_dot(r) / denom;
    ((0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)).then_some(t)
}

/// The extra-floor definition a 3D role refers to: in the other sector for
/// `Middle3D`, in the own sector for `MiddleBack`.
fn find_extra_floor_def(
    level: &Level,
    sd: SidedefId,
    control: SectorId,
) -> Option<ExtraFloorDef> {
    let own = level.sidedefs[sd as usize].sector;
    let other = level.other_sector(sd);
    [Some(own), other]
        .into_iter()
        .flatten()
        .flat_map(|s| level.sectors[s as usize].extra_floors.iter())
        .find(|ef| ef.control_sector == control)
        .copied()
}

/// Front sidedef of a 3D floor's control linedef.
fn control_side(level: &Level, sd: SidedefId, control: SectorId) -> Option<SidedefId> {
    let ef = find_extra_floor_def(level, sd, control)?;
    level.linedefs.get(ef.control_linedef as usize)?.front
}

pub(crate) fn single(poly: WallPolygon) -> Polygons {
    if poly.is_empty() {
        Polygons::new()
    } else {
        smallvec![poly]
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{LevelBuilder, LinedefFlags, SlopeDef};
    use glam::{dvec2, dvec3};

    fn bank() -> TextureBank {
        let mut bank = TextureBank::with_sentinels();
        bank.insert("STARTAN3", Texture::new("STARTAN3", 64, 128))
            .unwrap();
        bank.insert("BIGDOOR", Texture::new("BIGDOOR", 128, 128))
            .unwrap();
        bank
    }

    /// Room A (0..64) next to room B (64..128); returns the shared line's
    /// sides as (A, B).
    fn two_rooms(a: (f64, f64), b: (f64, f64)) -> (LevelBuilder, SidedefId, SidedefId) {
        let mut lb = LevelBuilder::new("T");
        lb.box_sector(dvec2(0.0, 0.0), dvec2(64.0, 64.0), a.0, a.1);
        lb.box_sector(dvec2(64.0, 0.0), dvec2(128.0, 64.0), b.0, b.1);
        let line = lb
            .level()
            .linedefs
            .iter()
            .find(|l| l.back.is_some())
            .unwrap()
            .clone();
        (lb, line.front.unwrap(), line.back.unwrap())
    }

    fn built(level: &Level, cfg: &VisualConfig, sd: SidedefId, role: WallRole) -> WallPart {
        let textures = bank();
        let mut cache = SectorCache::new();
        let mut ctx = SetupContext {
            level,
            textures: &textures,
            config: cfg,
            cache: &mut cache,
        };
        let mut part = WallPart::new(sd, role);
        part.setup(&mut ctx);
        part
    }

    fn z_span(g: &WallGeometry, r: Range<usize>) -> (f32, f32) {
        g.vertices[r]
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), v| (lo.min(v.pos.z), hi.max(v.pos.z)))
    }

    #[test]
    fn step_between_two_rooms() {
        let (lb, a, _) = two_rooms((0.0, 128.0), (32.0, 96.0));
        let level = lb.finish();
        let cfg = VisualConfig::default();

        let lower = built(&level, &cfg, a, WallRole::Lower);
        let g = lower.geometry.as_ref().expect("lower wall visible");
        assert_eq!(g.vertex_count(), 4);
        assert_eq!(z_span(g, 0..4), (0.0, 32.0));
        // pegged lower: top of the step is the top of the texture
        assert_eq!(g.vertices[0].uv, Vec2::new(0.0, 0.25));
        assert_eq!(g.vertices[1].uv, Vec2::new(0.0, 0.0));
        assert_eq!(g.vertices[3].uv, Vec2::new(1.0, 0.25));

        let upper = built(&level, &cfg, a, WallRole::Upper);
        let g = upper.geometry.as_ref().expect("upper wall visible");
        assert_eq!(z_span(g, 0..g.vertex_count()), (96.0, 128.0));
        // pegged upper hangs from the lower ceiling
        assert_eq!(g.vertices[1].uv.y, 0.75);

        assert!(!built(&level, &cfg, a, WallRole::MiddleDouble).has_geometry());
    }

    #[test]
    fn back_side_of_a_step_has_no_lower_or_upper() {
        let (lb, _, b) = two_rooms((0.0, 128.0), (32.0, 96.0));
        let level = lb.finish();
        let cfg = VisualConfig::default();
        assert!(!built(&level, &cfg, b, WallRole::Lower).has_geometry());
        assert!(!built(&level, &cfg, b, WallRole::Upper).has_geometry());
    }

    #[test]
    fn lower_visible_iff_own_floor_is_below() {
        let cfg = VisualConfig::default();
        for (own, other) in [(0.0, 32.0), (32.0, 0.0), (16.0, 16.0), (-8.0, 8.0), (40.0, 39.0)] {
            let (lb, a, _) = two_rooms((own, 128.0), (other, 128.0));
            let level = lb.finish();
            let part = built(&level, &cfg, a, WallRole::Lower);
            assert_eq!(part.has_geometry(), own < other, "floors {own} / {other}");
        }
    }

    #[test]
    fn lower_visible_when_sloped_floor_rises_at_one_end() {
        let (mut lb, a, b) = two_rooms((0.0, 128.0), (0.0, 128.0));
        let b_sector = lb.level().sidedefs[b as usize].sector;
        // z = y - 32 along the shared line: +32 at one end, -32 at the other
        lb.sector_mut(b_sector).floor_slope = Some(SlopeDef {
            a: 0.0,
            b: 1.0,
            c: -1.0,
            d: -32.0,
        });
        let level = lb.finish();
        let cfg = VisualConfig::default();
        let part = built(&level, &cfg, a, WallRole::Lower);
        assert!(part.has_geometry());

        let mut skewed = level.clone();
        skewed.sidedefs[a as usize]
            .fields
            .set("skew_bottom_type", "back");
        let part = built(&skewed, &cfg, a, WallRole::Lower);
        let skew = part.geometry.unwrap().skew;
        assert_eq!(skew.y, -0.5);

        let no_skew = VisualConfig {
            sidedef_texture_skewing: false,
            ..cfg
        };
        let part = built(&skewed, &no_skew, a, WallRole::Lower);
        assert_eq!(part.geometry.unwrap().skew, Vec2::ZERO);
    }

    #[test]
    fn zero_height_room_has_no_middle() {
        let mut lb = LevelBuilder::new("Z");
        lb.box_sector(dvec2(0.0, 0.0), dvec2(64.0, 64.0), 64.0, 64.0);
        let level = lb.finish();
        let part = built(&level, &VisualConfig::default(), 0, WallRole::MiddleSingle);
        assert!(!part.has_geometry());
    }

    #[test]
    fn setup_is_idempotent() {
        let (mut lb, a, _) = two_rooms((0.0, 128.0), (32.0, 96.0));
        let s = lb.level().sidedefs[a as usize].sector;
        lb.extra_floor(s, 8.0, 16.0, ExtraFloorFlags::empty());
        let level = lb.finish();
        let cfg = VisualConfig::default();
        let textures = bank();
        let mut cache = SectorCache::new();
        let mut ctx = SetupContext {
            level: &level,
            textures: &textures,
            config: &cfg,
            cache: &mut cache,
        };
        let mut part = WallPart::new(a, WallRole::Lower);
        assert!(part.setup(&mut ctx));
        let first = part.geometry.clone();
        assert!(part.setup(&mut ctx));
        assert_eq!(part.geometry, first);
    }

    #[test]
    fn extra_floor_cuts_a_slab_out() {
        let mut lb = LevelBuilder::new("EF");
        let s = lb.box_sector(dvec2(0.0, 0.0), dvec2(64.0, 64.0), 0.0, 256.0);
        let ctl = lb.extra_floor(s, 64.0, 96.0, ExtraFloorFlags::empty());
        lb.sector_mut(ctl).brightness = 96;
        let level = lb.finish();

        let part = built(&level, &VisualConfig::default(), 0, WallRole::MiddleSingle);
        let g = part.geometry.unwrap();
        assert_eq!(g.polygons.len(), 2);
        for r in &g.polygons {
            assert!(r.len() >= 3 && r.len() <= 4 + 1);
        }
        assert_eq!(z_span(&g, g.polygons[0].clone()), (0.0, 64.0));
        assert_eq!(z_span(&g, g.polygons[1].clone()), (96.0, 256.0));
        // below the slab the control sector's light applies
        assert_eq!(g.vertices[0].color, PixelColor::grey(72));
        assert_eq!(g.vertices[4].color, PixelColor::grey(208));
        assert_eq!(g.triangles().count(), 4);
    }

    #[test]
    fn stacked_extra_floors_leave_three_pieces() {
        let mut lb = LevelBuilder::new("EF2");
        let s = lb.box_sector(dvec2(0.0, 0.0), dvec2(64.0, 64.0), 0.0, 256.0);
        let low = lb.extra_floor(s, 32.0, 48.0, ExtraFloorFlags::empty());
        let high = lb.extra_floor(s, 128.0, 160.0, ExtraFloorFlags::empty());
        lb.sector_mut(low).brightness = 96;
        lb.sector_mut(high).brightness = 128;
        let level = lb.finish();

        let part = built(&level, &VisualConfig::default(), 0, WallRole::MiddleSingle);
        let g = part.geometry.unwrap();
        let spans: Vec<_> = g.polygons.iter().map(|r| z_span(&g, r.clone())).collect();
        assert_eq!(spans, vec![(0.0, 32.0), (48.0, 128.0), (160.0, 256.0)]);
        for r in &g.polygons {
            assert!((3..=4 + 2).contains(&r.len()));
        }
        let colors: Vec<_> = g.polygons.iter().map(|r| g.vertices[r.start].color).collect();
        assert_eq!(
            colors,
            vec![PixelColor::grey(72), PixelColor::grey(120), PixelColor::grey(208)]
        );
    }

    #[test]
    fn sloped_slab_and_light_level_cut_diagonally() {
        let mut lb = LevelBuilder::new("EF3");
        let s = lb.box_sector(dvec2(0.0, 0.0), dvec2(64.0, 64.0), 0.0, 256.0);
        // slab bottom rises from 16 to 80 along the west wall (z = y + 16)
        let slab = lb.extra_floor(s, 16.0, 96.0, ExtraFloorFlags::empty());
        lb.sector_mut(slab).floor_slope = Some(SlopeDef {
            a: 0.0,
            b: -1.0,
            c: 1.0,
            d: -16.0,
        });
        lb.sector_mut(slab).brightness = 96;
        // see-through slab: no cut, but its bottom still splits the light
        let glass = lb.extra_floor(s, 64.0, 72.0, ExtraFloorFlags::empty());
        lb.sector_mut(glass).brightness = 128;
        lb.sector_mut(s).extra_floors[1].alpha = 100;
        let level = lb.finish();
        assert_eq!(level.sidedef_endpoints(0), (dvec2(0.0, 0.0), dvec2(0.0, 64.0)));

        let part = built(&level, &VisualConfig::default(), 0, WallRole::MiddleSingle);
        let g = part.geometry.unwrap();
        let lens: Vec<_> = g.polygons.iter().map(|r| r.len()).collect();
        // triangle above the light level, pentagon under the slope, top quad
        assert_eq!(lens, vec![3, 5, 4]);
        let spans: Vec<_> = g.polygons.iter().map(|r| z_span(&g, r.clone())).collect();
        assert_eq!(spans, vec![(64.0, 80.0), (0.0, 64.0), (96.0, 256.0)]);
        let colors: Vec<_> = g.polygons.iter().map(|r| g.vertices[r.start].color).collect();
        assert_eq!(
            colors,
            vec![PixelColor::grey(208), PixelColor::grey(72), PixelColor::grey(208)]
        );
        assert_eq!(g.triangles().count(), 1 + 3 + 2);
    }

    #[test]
    fn double_middle_is_cut_by_solid_slab() {
        let (mut lb, a, _) = two_rooms((0.0, 256.0), (0.0, 256.0));
        lb.sidedef_mut(a).middle = "STARTAN3".into();
        let ld = lb.level().sidedefs[a as usize].linedef;
        lb.linedef_mut(ld).flags.insert(LinedefFlags::WRAP_MIDTEX);
        let s = lb.level().sidedefs[a as usize].sector;
        lb.extra_floor(s, 64.0, 96.0, ExtraFloorFlags::empty());
        let level = lb.finish();

        let part = built(&level, &VisualConfig::default(), a, WallRole::MiddleDouble);
        let g = part.geometry.expect("middle visible around the slab");
        let spans: Vec<_> = g.polygons.iter().map(|r| z_span(&g, r.clone())).collect();
        assert_eq!(spans, vec![(0.0, 64.0), (96.0, 256.0)]);
        assert!(g.vertices.iter().all(|v| v.pos.z <= 64.0 || v.pos.z >= 96.0));
    }

    #[test]
    fn floor_at_zero_has_no_negative_zero() {
        let mut lb = LevelBuilder::new("N");
        lb.box_sector(dvec2(0.0, 0.0), dvec2(64.0, 64.0), 0.0, 128.0);
        let level = lb.finish();
        let part = built(&level, &VisualConfig::default(), 0, WallRole::MiddleSingle);
        let g = part.geometry.unwrap();
        let on_floor: Vec<_> = g.vertices.iter().filter(|v| v.pos.z == 0.0).collect();
        assert_eq!(on_floor.len(), 2);
        assert!(on_floor.iter().all(|v| v.pos.z.is_sign_positive()));
    }

    #[test]
    fn translucent_extra_floor_does_not_cut() {
        let mut lb = LevelBuilder::new("EF");
        let s = lb.box_sector(dvec2(0.0, 0.0), dvec2(64.0, 64.0), 0.0, 256.0);
        lb.extra_floor(s, 64.0, 96.0, ExtraFloorFlags::DISABLE_LIGHTING);
        lb.sector_mut(s).extra_floors[0].alpha = 100;
        let level = lb.finish();
        let part = built(&level, &VisualConfig::default(), 0, WallRole::MiddleSingle);
        assert_eq!(part.geometry.unwrap().polygons.len(), 1);
    }

    #[test]
    fn side_of_neighbouring_slab() {
        let (mut lb, a, b) = two_rooms((0.0, 128.0), (0.0, 128.0));
        let b_sector = lb.level().sidedefs[b as usize].sector;
        let ctl = lb.extra_floor(b_sector, 32.0, 64.0, ExtraFloorFlags::empty());
        let level = lb.finish();
        let cfg = VisualConfig::default();

        let part = built(&level, &cfg, a, WallRole::Middle3D { control_sector: ctl });
        assert_eq!(part.texture_name(&level), "STARTAN3");
        let g = part.geometry.expect("slab side visible");
        assert_eq!(z_span(&g, 0..g.vertex_count()), (32.0, 64.0));

        // from inside sector B the slab is not render-inside
        let back = built(&level, &cfg, b, WallRole::MiddleBack { control_sector: ctl });
        assert!(!back.has_geometry());
    }

    #[test]
    fn double_middle_is_cropped_to_texture_unless_wrapped() {
        let (mut lb, a, _) = two_rooms((0.0, 256.0), (0.0, 256.0));
        lb.sidedef_mut(a).middle = "STARTAN3".into();
        let level = lb.finish();
        let cfg = VisualConfig::default();

        let part = built(&level, &cfg, a, WallRole::MiddleDouble);
        let g = part.geometry.as_ref().unwrap();
        assert_eq!(z_span(g, 0..g.vertex_count()), (128.0, 256.0));

        // ray through the texture hits, ray below it misses
        let hit = part.pick_accurate(&level, dvec3(32.0, 32.0, 200.0), dvec3(96.0, 32.0, 200.0));
        assert_eq!(hit, Some(0.5));
        let miss = part.pick_accurate(&level, dvec3(32.0, 32.0, 50.0), dvec3(96.0, 32.0, 50.0));
        assert_eq!(miss, None);

        let mut wrapped = level.clone();
        wrapped.linedefs[wrapped.sidedefs[a as usize].linedef as usize]
            .flags
            .insert(LinedefFlags::WRAP_MIDTEX);
        let part = built(&wrapped, &cfg, a, WallRole::MiddleDouble);
        let g = part.geometry.as_ref().unwrap();
        assert_eq!(z_span(g, 0..g.vertex_count()), (0.0, 256.0));
    }

    #[test]
    fn unpegged_upper_starts_at_texture_top() {
        let (lb, a, _) = two_rooms((0.0, 128.0), (32.0, 96.0));
        let mut level = lb.finish();
        let ld = level.sidedefs[a as usize].linedef;
        level.linedefs[ld as usize]
            .flags
            .insert(LinedefFlags::UPPER_UNPEGGED);
        let part = built(&level, &VisualConfig::default(), a, WallRole::Upper);
        assert_eq!(part.geometry.unwrap().vertices[1].uv.y, 0.0);
    }

    #[test]
    fn sky_hack_flags() {
        let (mut lb, a, b) = two_rooms((0.0, 128.0), (32.0, 96.0));
        for sd in [a, b] {
            let s = lb.level().sidedefs[sd as usize].sector;
            lb.sector_mut(s).ceil_tex = "F_SKY1".into();
        }
        let level = lb.finish();
        let part = built(&level, &VisualConfig::default(), a, WallRole::Upper);
        assert!(part.geometry.unwrap().render_as_sky);
        let part = built(&level, &VisualConfig::default(), a, WallRole::Lower);
        assert!(!part.geometry.unwrap().render_as_sky);
    }

    #[test]
    fn unknown_texture_falls_back_and_is_remembered() {
        let mut lb = LevelBuilder::new("U");
        lb.box_sector(dvec2(0.0, 0.0), dvec2(64.0, 64.0), 0.0, 128.0);
        lb.sidedef_mut(0).middle = "NOSUCH".into();
        let level = lb.finish();
        let part = built(&level, &VisualConfig::default(), 0, WallRole::MiddleSingle);
        assert_eq!(part.texture, UNKNOWN_TEXTURE);
        assert_eq!(part.pending_texture.as_deref(), Some("NOSUCH"));
        assert!(part.has_geometry());
    }

    #[test]
    fn offset_wrap_rules() {
        assert_eq!(new_texture_offset(60.0, 10.0, 64.0), 6.0);
        assert_eq!(new_texture_offset(-60.0, -10.0, 64.0), -6.0);
        assert_eq!(new_texture_offset(60.0, 10.0, -1.0), 70.0);
        assert_eq!(new_texture_offset(0.1234, 0.0, -1.0), 0.123);
    }

    #[test]
    fn offset_accessors_write_part_fields() {
        let mut lb = LevelBuilder::new("O");
        lb.box_sector(dvec2(0.0, 0.0), dvec2(64.0, 64.0), 0.0, 128.0);
        let mut level = lb.finish();
        let textures = bank();
        let cfg = VisualConfig::default();
        let part = built(&level, &cfg, 0, WallRole::MiddleSingle);

        part.set_texture_offset_x(&mut level, 12);
        part.set_texture_offset_y(&mut level, -3);
        assert_eq!(part.texture_offset(&level), IVec2::new(12, -3));

        part.move_texture_offset(&mut level, &textures, &cfg, 100, 0);
        // 112 wrapped by the 64 pixel width
        assert_eq!(part.texture_offset(&level).x, 48);

        level.sidedefs[0].fields.set("offsety_mid", -3.9);
        assert_eq!(part.texture_offset(&level).y, -3);

        level.sidedefs[0].fields.set("scalex_mid", 2.0);
        part.reset_texture_scale(&mut level);
        assert!(!level.sidedefs[0].fields.contains("scalex_mid"));

        part.set_texture(&mut level, "bigdoor");
        assert_eq!(level.sidedefs[0].middle, "BIGDOOR");
    }

    #[test]
    fn world_panning_wraps_by_scaled_size() {
        let mut lb = LevelBuilder::new("W");
        lb.box_sector(dvec2(0.0, 0.0), dvec2(64.0, 64.0), 0.0, 128.0);
        let mut level = lb.finish();
        let mut textures = bank();
        let id = textures.id("STARTAN3").unwrap();
        let tex = textures.texture_mut(id).unwrap();
        tex.scale = dvec2(0.5, 0.5);
        tex.world_panning = true;
        let cfg = VisualConfig::default();

        let mut part = WallPart::new(0, WallRole::MiddleSingle);
        part.texture = id;
        part.move_texture_offset(&mut level, &textures, &cfg, 100, 0);
        // 64 * 0.5 = 32 wide in world units
        assert_eq!(part.texture_offset(&level).x, 4);
    }
}
