//! Per-sector derived data for the visual preview.
//!
//! Everything here is recomputed from the [`Level`] on demand.  The only way
//! to read a [`SectorData`] is [`SectorCache::get_refreshed`], which rebuilds
//! stale entries before handing them out, so a wall part can never observe a
//! neighbour whose heights changed since the last build.

use std::rc::Rc;

use glam::DVec2;
use log::trace;

use super::{plane::Plane, types::PixelColor};
use crate::{
    config::VisualConfig,
    world::{ExtraFloorFlags, Level, LinedefId, Sector, SectorId},
};

/// Sector `lightcolor` when the field is absent.
const DEFAULT_LIGHT_COLOR: i32 = 0xFF_FFFF;

/// A height boundary together with the light found below it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SectorLevel {
    pub plane: Plane,
    pub brightness_below: i32,
    pub color_below: PixelColor,
    /// Boundary of a 3D floor that casts no light; lowering skips it.
    pub disable_lighting: bool,
}

/// A 3D floor stacked inside a sector, with planes taken from its control
/// sector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExtraFloor {
    pub control_sector: SectorId,
    pub control_linedef: LinedefId,
    /// Upper surface, facing up.
    pub top: Plane,
    /// Lower surface, facing down.
    pub bottom: Plane,
    pub flags: ExtraFloorFlags,
    pub alpha: u8,
    pub brightness: i32,
    /// Solid enough that walls behind it are cut away.
    pub clip_sidedefs: bool,
}

impl ExtraFloor {
    pub fn render_inside(&self) -> bool {
        self.flags.contains(ExtraFloorFlags::RENDER_INSIDE)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SectorData {
    pub sector: SectorId,
    pub floor: SectorLevel,
    pub ceiling: SectorLevel,
    /// Sorted bottom to top.
    pub extra_floors: Vec<ExtraFloor>,
    /// Floor first, ceiling last, extra-floor boundaries in between.
    pub light_levels: Vec<SectorLevel>,
    /// Fog applies to this sector (MAPINFO fade, outside fog under sky or
    /// a sector `fadecolor`).
    pub fogged: bool,
}

impl SectorData {
    pub fn build(level: &Level, config: &VisualConfig, id: SectorId) -> Self {
        let sector = &level.sectors[id as usize];
        let refp = reference_point(level, id);
        let color = light_color(sector);

        let floor = SectorLevel {
            plane: floor_plane(sector),
            brightness_below: sector.brightness,
            color_below: color,
            disable_lighting: false,
        };
        let ceiling = SectorLevel {
            plane: ceiling_plane(sector),
            brightness_below: sector.brightness,
            color_below: color,
            disable_lighting: false,
        };

        let mut extra_floors = Vec::with_capacity(sector.extra_floors.len());
        let mut inner_levels = Vec::new();

        for def in &sector.extra_floors {
            if def.flags.contains(ExtraFloorFlags::VAVOOM) {
                continue;
            }
            let Some(control) = level.sectors.get(def.control_sector as usize) else {
                continue;
            };

            // control ceiling is the slab top, control floor its bottom
            let top = ceiling_plane(control).inverted();
            let bottom = floor_plane(control).inverted();

            let clip_sidedefs = !def.flags.intersects(
                ExtraFloorFlags::RENDER_INSIDE
                    | ExtraFloorFlags::ADDITIVE
                    | ExtraFloorFlags::IGNORE_BOTTOM_HEIGHT,
            ) && def.alpha == 255;

            extra_floors.push(ExtraFloor {
                control_sector: def.control_sector,
                control_linedef: def.control_linedef,
                top,
                bottom,
                flags: def.flags,
                alpha: def.alpha,
                brightness: control.brightness,
                clip_sidedefs,
            });

            let disable_lighting = def.flags.contains(ExtraFloorFlags::DISABLE_LIGHTING);
            let control_color = light_color(control);
            if def.flags.contains(ExtraFloorFlags::RESTRICT_LIGHTING) {
                inner_levels.push(SectorLevel {
                    plane: ceiling_plane(control),
                    brightness_below: control.brightness,
                    color_below: control_color,
                    disable_lighting,
                });
                inner_levels.push(SectorLevel {
                    plane: bottom,
                    brightness_below: sector.brightness,
                    color_below: color,
                    disable_lighting,
                });
            } else {
                inner_levels.push(SectorLevel {
                    plane: bottom,
                    brightness_below: control.brightness,
                    color_below: control_color,
                    disable_lighting,
                });
            }
        }

        extra_floors.sort_by(|a, b| a.top.get_z(refp).total_cmp(&b.top.get_z(refp)));
        inner_levels.sort_by(|a, b| a.plane.get_z(refp).total_cmp(&b.plane.get_z(refp)));

        let mut light_levels = Vec::with_capacity(inner_levels.len() + 2);
        light_levels.push(floor);
        light_levels.extend(inner_levels);
        light_levels.push(ceiling);

        let fogged = sector_fogged(config, sector);

        SectorData {
            sector: id,
            floor,
            ceiling,
            extra_floors,
            light_levels,
            fogged,
        }
    }

    /// Light levels strictly between floor and ceiling, bottom to top.
    pub fn inner_light_levels(&self) -> &[SectorLevel] {
        let n = self.light_levels.len();
        if n <= 2 {
            &[]
        } else {
            &self.light_levels[1..n - 1]
        }
    }
}

pub fn floor_plane(sector: &Sector) -> Plane {
    match sector.floor_slope {
        Some(s) => Plane::from_slope(s, true),
        None => Plane::floor(sector.floor_h),
    }
}

pub fn ceiling_plane(sector: &Sector) -> Plane {
    match sector.ceil_slope {
        Some(s) => Plane::from_slope(s, false),
        None => Plane::ceiling(sector.ceil_h),
    }
}

/// Fog applies: MAPINFO fade, outside fog under a sky, or a sector
/// `fadecolor`.
pub fn sector_fogged(config: &VisualConfig, sector: &Sector) -> bool {
    config.fade_color.is_some()
        || (sector.has_sky_ceiling(&config.sky_flat_name) && config.outside_fog_color.is_some())
        || sector.fields.contains("fadecolor")
}

fn light_color(sector: &Sector) -> PixelColor {
    PixelColor::from_rgb(sector.fields.int("lightcolor", DEFAULT_LIGHT_COLOR) as u32)
}

/// Average of the sector's line starts; used to order sloped planes.
fn reference_point(level: &Level, id: SectorId) -> DVec2 {
    let sides = level.sides_of_sector(id);
    if sides.is_empty() {
        return DVec2::ZERO;
    }
    let sum: DVec2 = sides
        .iter()
        .map(|&sd| level.line_start(level.sidedefs[sd as usize].linedef))
        .sum();
    sum / sides.len() as f64
}

/// Memo of [`SectorData`] for the lifetime of one preview session.
#[derive(Default)]
pub struct SectorCache {
    entries: Vec<Option<Rc<SectorData>>>,
}

impl SectorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current data for `id`, rebuilt first if it was invalidated or never
    /// computed.
    pub fn get_refreshed(
        &mut self,
        level: &Level,
        config: &VisualConfig,
        id: SectorId,
    ) -> Rc<SectorData> {
        let idx = id as usize;
        if idx >= self.entries.len() {
            self.entries.resize(idx + 1, None);
        }
        if let Some(data) = &self.entries[idx] {
            return Rc::clone(data);
        }

        let data = Rc::new(SectorData::build(level, config, id));
        trace!(
            "sector {id}: refreshed ({} extra floors, {} light levels)",
            data.extra_floors.len(),
            data.light_levels.len()
        );
        self.entries[idx] = Some(Rc::clone(&data));
        data
    }

    pub fn is_fresh(&self, id: SectorId) -> bool {
        matches!(self.entries.get(id as usize), Some(Some(_)))
    }

    /// Mark `id` stale along with every sector that uses it as a 3D floor
    /// control.  Returns all sectors that were marked.
    pub fn invalidate(&mut self, level: &Level, id: SectorId) -> Vec<SectorId> {
        let mut marked = vec![id];
        marked.extend(level.sectors_controlled_by(id));
        for &s in &marked {
            if let Some(slot) = self.entries.get_mut(s as usize) {
                *slot = None;
            }
        }
        marked
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::LevelBuilder;
    use glam::dvec2;

    fn room_with_floor() -> (Level, SectorId, SectorId) {
        let mut b = LevelBuilder::new("EF");
        let s = b.box_sector(dvec2(0.0, 0.0), dvec2(256.0, 256.0), 0.0, 256.0);
        let ctl = b.extra_floor(s, 64.0, 96.0, ExtraFloorFlags::empty());
        b.sector_mut(ctl).brightness = 96;
        (b.finish(), s, ctl)
    }

    #[test]
    fn planes_follow_sector_heights() {
        let mut b = LevelBuilder::new("T");
        let s = b.box_sector(dvec2(0.0, 0.0), dvec2(64.0, 64.0), 16.0, 120.0);
        let lvl = b.finish();
        let d = SectorData::build(&lvl, &VisualConfig::default(), s);
        assert_eq!(d.floor.plane.get_z(dvec2(5.0, 5.0)), 16.0);
        assert_eq!(d.ceiling.plane.get_z(dvec2(5.0, 5.0)), 120.0);
        assert_eq!(d.ceiling.brightness_below, 192);
        assert_eq!(d.ceiling.color_below, PixelColor::WHITE);
        assert!(d.extra_floors.is_empty());
        assert_eq!(d.light_levels.len(), 2);
        assert!(!d.fogged);
    }

    #[test]
    fn extra_floor_planes_and_light_level() {
        let (lvl, s, ctl) = room_with_floor();
        let d = SectorData::build(&lvl, &VisualConfig::default(), s);
        assert_eq!(d.extra_floors.len(), 1);
        let ef = &d.extra_floors[0];
        assert_eq!(ef.control_sector, ctl);
        assert!(ef.clip_sidedefs);
        assert!(ef.top.normal.z > 0.0);
        assert!(ef.bottom.normal.z < 0.0);
        assert_eq!(ef.top.get_z(DVec2::ZERO), 96.0);
        assert_eq!(ef.bottom.get_z(DVec2::ZERO), 64.0);

        let inner = d.inner_light_levels();
        assert_eq!(inner.len(), 1);
        assert_eq!(inner[0].brightness_below, 96);
        assert_eq!(inner[0].plane.get_z(DVec2::ZERO), 64.0);
    }

    #[test]
    fn restricted_lighting_adds_two_levels() {
        let mut b = LevelBuilder::new("EF");
        let s = b.box_sector(dvec2(0.0, 0.0), dvec2(256.0, 256.0), 0.0, 256.0);
        b.extra_floor(s, 64.0, 96.0, ExtraFloorFlags::RESTRICT_LIGHTING);
        let lvl = b.finish();
        let d = SectorData::build(&lvl, &VisualConfig::default(), s);
        let inner = d.inner_light_levels();
        assert_eq!(inner.len(), 2);
        assert_eq!(inner[0].plane.get_z(DVec2::ZERO), 64.0);
        assert_eq!(inner[0].brightness_below, 192);
        assert_eq!(inner[1].plane.get_z(DVec2::ZERO), 96.0);
    }

    #[test]
    fn translucent_and_vavoom_floors() {
        let mut b = LevelBuilder::new("EF");
        let s = b.box_sector(dvec2(0.0, 0.0), dvec2(256.0, 256.0), 0.0, 256.0);
        b.extra_floor(s, 150.0, 180.0, ExtraFloorFlags::empty());
        b.extra_floor(s, 10.0, 20.0, ExtraFloorFlags::VAVOOM);
        b.extra_floor(s, 40.0, 60.0, ExtraFloorFlags::empty());
        b.sector_mut(s).extra_floors[0].alpha = 128;
        let lvl = b.finish();
        let d = SectorData::build(&lvl, &VisualConfig::default(), s);
        assert_eq!(d.extra_floors.len(), 2);
        // sorted bottom to top
        assert_eq!(d.extra_floors[0].top.get_z(DVec2::ZERO), 60.0);
        assert!(d.extra_floors[0].clip_sidedefs);
        assert!(!d.extra_floors[1].clip_sidedefs);
    }

    #[test]
    fn fog_sources() {
        let mut b = LevelBuilder::new("F");
        let s = b.box_sector(dvec2(0.0, 0.0), dvec2(64.0, 64.0), 0.0, 128.0);
        b.sector_mut(s).ceil_tex = "F_SKY1".into();
        let lvl = b.finish();

        let mut cfg = VisualConfig::default();
        assert!(!SectorData::build(&lvl, &cfg, s).fogged);
        cfg.outside_fog_color = Some(0x404040);
        assert!(SectorData::build(&lvl, &cfg, s).fogged);
    }

    #[test]
    fn cache_refreshes_after_invalidate() {
        let (mut lvl, s, ctl) = room_with_floor();
        let cfg = VisualConfig::default();
        let mut cache = SectorCache::new();

        let a = cache.get_refreshed(&lvl, &cfg, s);
        let again = cache.get_refreshed(&lvl, &cfg, s);
        assert!(Rc::ptr_eq(&a, &again));

        // editing the control sector must reach the sector it sits in
        lvl.sectors[ctl as usize].ceil_h = 128.0;
        let marked = cache.invalidate(&lvl, ctl);
        assert!(marked.contains(&s));
        assert!(!cache.is_fresh(s));

        let b = cache.get_refreshed(&lvl, &cfg, s);
        assert_eq!(b.extra_floors[0].top.get_z(DVec2::ZERO), 128.0);
        assert!(cache.is_fresh(s));

        cache.clear();
        assert!(!cache.is_fresh(s));
    }
}
