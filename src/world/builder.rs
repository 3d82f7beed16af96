//! Programmatic map construction.
//!
//! Boxes are traced clockwise so the front side of every new linedef faces
//! into the sector being built.  A box edge that retraces an existing
//! linedef in the opposite direction becomes that line's back side, which
//! is how two rooms end up sharing a two-sided wall.

use glam::{DVec2, dvec2};

use super::{
    ExtraFloorDef, ExtraFloorFlags, Level, Linedef, LinedefFlags, LinedefId, NO_TEXTURE_NAME,
    Sector, SectorId, Sidedef, SidedefId, Vertex, VertexId, fields::UniFields,
};

/// Default wall texture for freshly created sides.
pub const DEFAULT_WALL: &str = "STARTAN3";

const CONTROL_ORIGIN: DVec2 = DVec2::new(-4096.0, -4096.0);
const CONTROL_SIZE: f64 = 64.0;
/// `Sector_Set3dFloor`.
const CONTROL_SPECIAL: u16 = 160;

pub struct LevelBuilder {
    level: Level,
    controls: usize,
}

impl LevelBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            level: Level {
                name: name.to_string(),
                ..Level::default()
            },
            controls: 0,
        }
    }

    /// Continue editing an existing map.
    pub fn from_level(level: Level) -> Self {
        let controls = level
            .linedefs
            .iter()
            .filter(|l| l.special == CONTROL_SPECIAL)
            .count();
        Self { level, controls }
    }

    /// Reuse a vertex at exactly the same position.
    pub fn vertex(&mut self, pos: DVec2) -> VertexId {
        if let Some(i) = self.level.vertices.iter().position(|v| v.pos == pos) {
            return i as VertexId;
        }
        self.level.vertices.push(Vertex { pos });
        (self.level.vertices.len() - 1) as VertexId
    }

    pub fn sector(&mut self, sector: Sector) -> SectorId {
        self.level.sectors.push(sector);
        (self.level.sectors.len() - 1) as SectorId
    }

    /// Axis-aligned room from `min` to `max`.
    pub fn box_sector(&mut self, min: DVec2, max: DVec2, floor_h: f64, ceil_h: f64) -> SectorId {
        let outline = [
            dvec2(min.x, min.y),
            dvec2(min.x, max.y),
            dvec2(max.x, max.y),
            dvec2(max.x, min.y),
        ];
        self.polygon_sector(&outline, floor_h, ceil_h)
    }

    /// Room bounded by `outline`, which must be given clockwise.
    pub fn polygon_sector(&mut self, outline: &[DVec2], floor_h: f64, ceil_h: f64) -> SectorId {
        let sector = self.sector(Sector {
            floor_h,
            ceil_h,
            ..Sector::default()
        });
        for (i, &a) in outline.iter().enumerate() {
            let b = outline[(i + 1) % outline.len()];
            self.edge(a, b, sector);
        }
        sector
    }

    fn edge(&mut self, a: DVec2, b: DVec2, sector: SectorId) -> LinedefId {
        let va = self.vertex(a);
        let vb = self.vertex(b);

        let reversed = self
            .level
            .linedefs
            .iter()
            .position(|l| l.start == vb && l.end == va && l.back.is_none());

        if let Some(ld) = reversed {
            let back = self.side(ld as LinedefId, sector);
            let line = &mut self.level.linedefs[ld];
            line.back = Some(back);
            line.flags.insert(LinedefFlags::TWO_SIDED);
            line.flags.remove(LinedefFlags::IMPASSABLE);
            let front = line.front;
            for sd in front.into_iter().chain(Some(back)) {
                let side = &mut self.level.sidedefs[sd as usize];
                side.middle = NO_TEXTURE_NAME.into();
                side.upper = DEFAULT_WALL.into();
                side.lower = DEFAULT_WALL.into();
            }
            return ld as LinedefId;
        }

        let ld = self.level.linedefs.len() as LinedefId;
        self.level.linedefs.push(Linedef {
            start: va,
            end: vb,
            flags: LinedefFlags::IMPASSABLE,
            special: 0,
            tag: 0,
            front: None,
            back: None,
        });
        let front = self.side(ld, sector);
        self.level.linedefs[ld as usize].front = Some(front);
        ld
    }

    fn side(&mut self, linedef: LinedefId, sector: SectorId) -> SidedefId {
        self.level.sidedefs.push(Sidedef {
            linedef,
            sector,
            offset_x: 0.0,
            offset_y: 0.0,
            upper: NO_TEXTURE_NAME.into(),
            middle: DEFAULT_WALL.into(),
            lower: NO_TEXTURE_NAME.into(),
            fields: UniFields::default(),
        });
        (self.level.sidedefs.len() - 1) as SidedefId
    }

    /// Stack a 3D floor spanning `bottom..top` inside `target`.  A dummy
    /// control room is created far outside the playable area.
    pub fn extra_floor(
        &mut self,
        target: SectorId,
        bottom: f64,
        top: f64,
        flags: ExtraFloorFlags,
    ) -> SectorId {
        let min = CONTROL_ORIGIN + dvec2(self.controls as f64 * CONTROL_SIZE * 2.0, 0.0);
        self.controls += 1;
        let first_line = self.level.linedefs.len() as LinedefId;
        let control = self.box_sector(min, min + DVec2::splat(CONTROL_SIZE), bottom, top);
        self.level.linedefs[first_line as usize].special = CONTROL_SPECIAL;
        self.level.sectors[target as usize]
            .extra_floors
            .push(ExtraFloorDef {
                control_sector: control,
                control_linedef: first_line,
                flags,
                alpha: 255,
            });
        control
    }

    pub fn sector_mut(&mut self, id: SectorId) -> &mut Sector {
        &mut self.level.sectors[id as usize]
    }

    pub fn sidedef_mut(&mut self, id: SidedefId) -> &mut Sidedef {
        &mut self.level.sidedefs[id as usize]
    }

    pub fn linedef_mut(&mut self, id: LinedefId) -> &mut Linedef {
        &mut self.level.linedefs[id as usize]
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn finish(self) -> Level {
        self.level
    }
}
