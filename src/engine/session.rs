//! One 3D preview session: the sector cache plus every wall part of the map,
//! kept in step with edits.

use std::collections::BTreeSet;

use glam::{DVec3, IVec2};
use log::debug;
use smallvec::SmallVec;

use super::{
    sector_data::SectorCache,
    walls::{SetupContext, WallPart, WallRole},
};
use crate::{
    config::VisualConfig,
    renderer::{GeometrySink, GeometrySinkExt},
    world::{ExtraFloorDef, ExtraFloorFlags, Level, SectorId, SidedefId, TextureBank},
};

/// Addresses one wall part across rebuilds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PartKey {
    pub sidedef: SidedefId,
    pub role: WallRole,
}

type SideParts = SmallVec<[WallPart; 4]>;

pub struct VisualSession {
    config: VisualConfig,
    cache: SectorCache,
    /// Indexed by sidedef id.
    parts: Vec<SideParts>,
}

impl VisualSession {
    pub fn new(config: VisualConfig) -> Self {
        Self {
            config,
            cache: SectorCache::new(),
            parts: Vec::new(),
        }
    }

    pub fn config(&self) -> &VisualConfig {
        &self.config
    }

    /// Create and set up the parts of every sidedef.  Returns the number of
    /// parts with geometry.
    pub fn build(&mut self, level: &Level, textures: &TextureBank) -> usize {
        self.cache.clear();
        self.parts.clear();
        self.parts
            .resize_with(level.sidedefs.len(), SmallVec::new);

        let sides: Vec<SidedefId> = (0..level.sidedefs.len() as SidedefId).collect();
        let visible = self.sync_sides(level, textures, &sides);
        debug!(
            "{}: built {} wall parts for {} sidedefs, {} visible",
            level.name,
            self.part_count(),
            level.sidedefs.len(),
            visible
        );
        visible
    }

    /// Sectors changed height, light or 3D floors.  Re-derives their data and
    /// sets up every part that can see them.  Returns the number of parts set
    /// up again.
    pub fn on_sectors_changed(
        &mut self,
        level: &Level,
        textures: &TextureBank,
        ids: &[SectorId],
    ) -> usize {
        if self.parts.len() != level.sidedefs.len() {
            self.parts
                .resize_with(level.sidedefs.len(), SmallVec::new);
        }

        let mut sectors = BTreeSet::new();
        for &id in ids {
            sectors.extend(self.cache.invalidate(level, id));
        }

        let mut sides = BTreeSet::new();
        for &s in &sectors {
            for sd in level.sides_of_sector(s) {
                sides.insert(sd);
                // the far side's upper/lower/3D sides look at this sector
                sides.extend(level.other_side(sd));
            }
        }

        let sides: Vec<SidedefId> = sides.into_iter().collect();
        self.sync_sides(level, textures, &sides);
        let touched: usize = sides.iter().map(|&sd| self.parts[sd as usize].len()).sum();
        debug!(
            "sectors {:?} changed: {} sectors stale, {} parts set up again",
            ids,
            sectors.len(),
            touched
        );
        touched
    }

    /// A texture finished loading: set up the parts that were waiting for it.
    pub fn on_texture_loaded(&mut self, level: &Level, textures: &TextureBank, name: &str) -> usize {
        let mut ctx = SetupContext {
            level,
            textures,
            config: &self.config,
            cache: &mut self.cache,
        };
        let mut count = 0;
        for part in self.parts.iter_mut().flatten() {
            let waiting = part
                .pending_texture
                .as_deref()
                .is_some_and(|p| p.eq_ignore_ascii_case(name));
            if waiting {
                part.setup(&mut ctx);
                count += 1;
            }
        }
        debug!("texture `{name}` loaded, {count} parts set up again");
        count
    }

    /// Set up all parts of `sector`'s sides again after dropping its cached
    /// data.
    pub fn rebuild_sector(&mut self, level: &Level, textures: &TextureBank, sector: SectorId) {
        self.cache.invalidate(level, sector);
        let sides = level.sides_of_sector(sector);
        self.sync_sides(level, textures, &sides);
        debug!("sector {sector}: rebuilt {} sides", sides.len());
    }

    /*------------------------ part edits --------------------------*/

    /// Change a part's texture.  Returns false when the part does not exist.
    pub fn set_part_texture(
        &mut self,
        level: &mut Level,
        textures: &TextureBank,
        key: PartKey,
        name: &str,
    ) -> bool {
        let Some(part) = self.part(key) else {
            return false;
        };
        part.set_texture(level, name);

        let sector = level.sidedefs[key.sidedef as usize].sector;
        if let Some(control) = key.role.control_sector() {
            // every side showing this slab uses the control side's texture
            self.on_sectors_changed(level, textures, &[control]);
        } else if key.role.texture_change_affects_sector()
            && !level.sectors[sector as usize].extra_floors.is_empty()
        {
            self.rebuild_sector(level, textures, sector);
        } else {
            self.setup_part(level, textures, key);
        }
        true
    }

    /// Shift a part's texture offsets, wrapped into one texture period.
    pub fn move_part_offset(
        &mut self,
        level: &mut Level,
        textures: &TextureBank,
        key: PartKey,
        dx: i32,
        dy: i32,
    ) -> bool {
        let Some(part) = self.part(key) else {
            return false;
        };
        part.move_texture_offset(level, textures, &self.config, dx, dy);
        self.setup_part(level, textures, key)
    }

    pub fn set_part_offset(
        &mut self,
        level: &mut Level,
        textures: &TextureBank,
        key: PartKey,
        offset: IVec2,
    ) -> bool {
        let Some(part) = self.part(key) else {
            return false;
        };
        part.set_texture_offset_x(level, offset.x);
        part.set_texture_offset_y(level, offset.y);
        self.setup_part(level, textures, key)
    }

    pub fn reset_part_scale(&mut self, level: &mut Level, textures: &TextureBank, key: PartKey) -> bool {
        let Some(part) = self.part(key) else {
            return false;
        };
        part.reset_texture_scale(level);
        self.setup_part(level, textures, key)
    }

    /*------------------------ queries -----------------------------*/

    pub fn part(&self, key: PartKey) -> Option<&WallPart> {
        self.parts
            .get(key.sidedef as usize)?
            .iter()
            .find(|p| p.role == key.role)
    }

    /// Parts of one sidedef, in creation order.
    pub fn parts_of(&self, sd: SidedefId) -> &[WallPart] {
        self.parts.get(sd as usize).map_or(&[][..], |p| p.as_slice())
    }

    pub fn parts(&self) -> impl Iterator<Item = &WallPart> {
        self.parts.iter().flatten()
    }

    pub fn part_count(&self) -> usize {
        self.parts.iter().map(SmallVec::len).sum()
    }

    /// Closest part hit by the segment `from → to`.
    pub fn pick(&self, level: &Level, from: DVec3, to: DVec3) -> Option<(PartKey, f64)> {
        self.parts()
            .filter_map(|p| {
                let u = p.pick_accurate(level, from, to)?;
                Some((
                    PartKey {
                        sidedef: p.sidedef,
                        role: p.role,
                    },
                    u,
                ))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Send every visible part to `sink`.  Returns how many were sent.
    pub fn publish<S: GeometrySink + ?Sized>(&self, sink: &mut S) -> usize {
        sink.publish(self.parts())
    }

    /// Drop all parts and cached sector data.
    pub fn end(&mut self) {
        debug!("visual session ended, {} parts dropped", self.part_count());
        self.parts.clear();
        self.cache.clear();
    }

    /*------------------------ internals ---------------------------*/

    fn setup_part(&mut self, level: &Level, textures: &TextureBank, key: PartKey) -> bool {
        let mut ctx = SetupContext {
            level,
            textures,
            config: &self.config,
            cache: &mut self.cache,
        };
        self.parts
            .get_mut(key.sidedef as usize)
            .and_then(|ps| ps.iter_mut().find(|p| p.role == key.role))
            .is_some_and(|p| p.setup(&mut ctx))
    }

    /// Bring each side's part list in line with the roles it currently
    /// needs, then set every part up.  Returns parts with geometry.
    fn sync_sides(&mut self, level: &Level, textures: &TextureBank, sides: &[SidedefId]) -> usize {
        let mut ctx = SetupContext {
            level,
            textures,
            config: &self.config,
            cache: &mut self.cache,
        };
        let mut visible = 0;
        for &sd in sides {
            let Some(parts) = self.parts.get_mut(sd as usize) else {
                continue;
            };
            let roles = part_roles(level, sd);
            parts.retain(|p| roles.contains(&p.role));
            for &role in &roles {
                if !parts.iter().any(|p| p.role == role) {
                    parts.push(WallPart::new(sd, role));
                }
            }
            for part in parts.iter_mut() {
                if part.setup(&mut ctx) {
                    visible += 1;
                }
            }
        }
        visible
    }
}

/// Roles a sidedef can show.  One-sided lines only have a middle; two-sided
/// lines get upper, lower, middle and one part per 3D floor side.
pub fn part_roles(level: &Level, sd: SidedefId) -> SmallVec<[WallRole; 6]> {
    let mut roles = SmallVec::new();
    let Some(side) = level.sidedefs.get(sd as usize) else {
        return roles;
    };
    let Some(other) = level.other_sector(sd) else {
        roles.push(WallRole::MiddleSingle);
        return roles;
    };
    roles.extend([WallRole::Upper, WallRole::Lower, WallRole::MiddleDouble]);

    let own_floors = &level.sectors[side.sector as usize].extra_floors;
    let other_floors = &level.sectors[other as usize].extra_floors;
    let shares = |floors: &[ExtraFloorDef], control: SectorId| {
        floors.iter().any(|e| e.control_sector == control)
    };

    for ef in other_floors {
        if !ef.flags.contains(ExtraFloorFlags::VAVOOM) && !shares(own_floors, ef.control_sector) {
            roles.push(WallRole::Middle3D {
                control_sector: ef.control_sector,
            });
        }
    }
    for ef in own_floors {
        if ef.flags.contains(ExtraFloorFlags::RENDER_INSIDE)
            && !ef.flags.contains(ExtraFloorFlags::VAVOOM)
            && !shares(other_floors, ef.control_sector)
        {
            roles.push(WallRole::MiddleBack {
                control_sector: ef.control_sector,
            });
        }
    }
    roles
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
