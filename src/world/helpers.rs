use glam::DVec2;

use super::{Level, LinedefId, NO_TEXTURE_NAME, SectorId, SidedefId};

// ──────────────────────────────────────────────────────────────────────────
//                       Level – line helpers
// ──────────────────────────────────────────────────────────────────────────
impl Level {
    #[inline]
    pub fn line_start(&self, ld: LinedefId) -> DVec2 {
        self.vertices[self.linedefs[ld as usize].start as usize].pos
    }

    #[inline]
    pub fn line_end(&self, ld: LinedefId) -> DVec2 {
        self.vertices[self.linedefs[ld as usize].end as usize].pos
    }

    pub fn line_length(&self, ld: LinedefId) -> f64 {
        (self.line_end(ld) - self.line_start(ld)).length()
    }

    pub fn line_center(&self, ld: LinedefId) -> DVec2 {
        (self.line_start(ld) + self.line_end(ld)) * 0.5
    }

    /// Two-sided means both sidedefs exist; the flag alone is not trusted.
    pub fn is_two_sided(&self, ld: LinedefId) -> bool {
        let line = &self.linedefs[ld as usize];
        line.front.is_some() && line.back.is_some()
    }
}

// ──────────────────────────────────────────────────────────────────────────
//                       Level – sidedef helpers
// ──────────────────────────────────────────────────────────────────────────
impl Level {
    pub fn is_front(&self, sd: SidedefId) -> bool {
        let ld = self.sidedefs[sd as usize].linedef;
        self.linedefs[ld as usize].front == Some(sd)
    }

    /// Sidedef on the opposite face of the same linedef.
    pub fn other_side(&self, sd: SidedefId) -> Option<SidedefId> {
        let line = &self.linedefs[self.sidedefs[sd as usize].linedef as usize];
        if line.front == Some(sd) {
            line.back
        } else {
            line.front
        }
    }

    pub fn other_sector(&self, sd: SidedefId) -> Option<SectorId> {
        self.other_side(sd)
            .map(|o| self.sidedefs[o as usize].sector)
    }

    /// Left and right wall endpoints as seen from the sidedef's own sector.
    pub fn sidedef_endpoints(&self, sd: SidedefId) -> (DVec2, DVec2) {
        let ld = self.sidedefs[sd as usize].linedef;
        let (start, end) = (self.line_start(ld), self.line_end(ld));
        if self.is_front(sd) {
            (start, end)
        } else {
            (end, start)
        }
    }

    /// Every sidedef that faces into `sector`.
    pub fn sides_of_sector(&self, sector: SectorId) -> Vec<SidedefId> {
        self.sidedefs
            .iter()
            .enumerate()
            .filter(|(_, s)| s.sector == sector)
            .map(|(i, _)| i as SidedefId)
            .collect()
    }

    /// Sectors whose extra floors are driven by `control`.
    pub fn sectors_controlled_by(&self, control: SectorId) -> Vec<SectorId> {
        self.sectors
            .iter()
            .enumerate()
            .filter(|(_, s)| s.extra_floors.iter().any(|ef| ef.control_sector == control))
            .map(|(i, _)| i as SectorId)
            .collect()
    }
}

// ──────────────────────────────────────────────────────────────────────────
//                  Level – which wall parts a side needs
// ──────────────────────────────────────────────────────────────────────────
impl Level {
    pub fn upper_required(&self, sd: SidedefId) -> bool {
        let own = &self.sectors[self.sidedefs[sd as usize].sector as usize];
        self.other_sector(sd)
            .map(|o| self.sectors[o as usize].ceil_h < own.ceil_h)
            .unwrap_or(false)
    }

    pub fn lower_required(&self, sd: SidedefId) -> bool {
        let own = &self.sectors[self.sidedefs[sd as usize].sector as usize];
        self.other_sector(sd)
            .map(|o| self.sectors[o as usize].floor_h > own.floor_h)
            .unwrap_or(false)
    }

    pub fn middle_required(&self, sd: SidedefId) -> bool {
        self.other_side(sd).is_none()
    }

    /// True if anything of this side would be drawn in the 3D preview.
    pub fn sidedef_has_visible_parts(&self, sd: Option<SidedefId>) -> bool {
        let Some(sd) = sd else {
            return false;
        };
        let side = &self.sidedefs[sd as usize];
        if side.sector as usize >= self.sectors.len() {
            return false;
        }
        self.upper_required(sd)
            || self.lower_required(sd)
            || self.middle_required(sd)
            || (self.other_side(sd).is_some() && side.middle != NO_TEXTURE_NAME)
    }
}
