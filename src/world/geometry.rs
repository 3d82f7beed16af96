use bitflags::bitflags;
use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::world::fields::UniFields;

pub type LinedefId = u16;
pub type VertexId = u16;
pub type SidedefId = u16;
pub type SectorId = u16;

/// Texture name meaning "nothing set" on a sidedef part.
pub const NO_TEXTURE_NAME: &str = "-";

/// Editable map snapshot.  The visual engine only reads it, except for the
/// texture / offset entry points of a wall part.
#[derive(Debug, Default, Clone)]
pub struct Level {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub linedefs: Vec<Linedef>,
    pub sidedefs: Vec<Sidedef>,
    pub sectors: Vec<Sector>,
}

/*----------------------- simple primitives --------------------------*/

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub pos: DVec2,
}

/*--------------------------- linedefs -------------------------------*/

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct LinedefFlags: u16 {
        const IMPASSABLE      = 0x0001;
        const BLOCK_MONSTERS  = 0x0002;
        const TWO_SIDED       = 0x0004;
        const UPPER_UNPEGGED  = 0x0008;
        const LOWER_UNPEGGED  = 0x0010;
        const SECRET          = 0x0020;
        const BLOCK_SOUND     = 0x0040;
        const NOT_ON_MAP      = 0x0080;
        const ALREADY_ON_MAP  = 0x0100;
        const WRAP_MIDTEX     = 0x0400; // UDMF `wrapmidtex`
    }
}

#[derive(Clone, Debug)]
pub struct Linedef {
    pub start: VertexId,
    pub end: VertexId,
    pub flags: LinedefFlags,
    pub special: u16,
    pub tag: u16,
    pub front: Option<SidedefId>,
    pub back: Option<SidedefId>,
}

/*--------------------------- sidedefs -------------------------------*/

#[derive(Clone, Debug)]
pub struct Sidedef {
    pub linedef: LinedefId,
    pub sector: SectorId,
    pub offset_x: f64,
    pub offset_y: f64,
    pub upper: String,
    pub middle: String,
    pub lower: String,
    pub fields: UniFields,
}

/*---------------------------- sectors -------------------------------*/

/// Plane equation `a*x + b*y + c*z + d = 0` for a sloped floor or ceiling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlopeDef {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

bitflags! {
    /// `Sector_Set3dFloor` type and flag bits, folded into one set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ExtraFloorFlags: u16 {
        const VAVOOM               = 0x0001;
        const DISABLE_LIGHTING     = 0x0002;
        const RESTRICT_LIGHTING    = 0x0004;
        const FOG                  = 0x0008;
        const IGNORE_BOTTOM_HEIGHT = 0x0010;
        const USE_UPPER_TEXTURE    = 0x0020;
        const USE_LOWER_TEXTURE    = 0x0040;
        const ADDITIVE             = 0x0080;
        const RENDER_INSIDE        = 0x0100;
    }
}

/// A 3D floor stacked inside the owning sector.  Its body spans the control
/// sector's floor..ceiling; the control linedef's front side supplies the
/// side texture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExtraFloorDef {
    pub control_sector: SectorId,
    pub control_linedef: LinedefId,
    pub flags: ExtraFloorFlags,
    pub alpha: u8,
}

#[derive(Clone, Debug)]
pub struct Sector {
    pub floor_h: f64,
    pub ceil_h: f64,
    pub floor_tex: String,
    pub ceil_tex: String,
    pub brightness: i32,
    pub special: i16,
    pub tag: i16,
    pub floor_slope: Option<SlopeDef>,
    pub ceil_slope: Option<SlopeDef>,
    pub extra_floors: Vec<ExtraFloorDef>,
    pub fields: UniFields,
}

impl Sector {
    pub fn has_sky_ceiling(&self, sky_flat: &str) -> bool {
        self.ceil_tex.eq_ignore_ascii_case(sky_flat)
    }

    pub fn has_sky_floor(&self, sky_flat: &str) -> bool {
        self.floor_tex.eq_ignore_ascii_case(sky_flat)
    }
}

impl Default for Sector {
    fn default() -> Self {
        Sector {
            floor_h: 0.0,
            ceil_h: 128.0,
            floor_tex: "FLOOR0_1".into(),
            ceil_tex: "CEIL1_1".into(),
            brightness: 192,
            special: 0,
            tag: 0,
            floor_slope: None,
            ceil_slope: None,
            extra_floors: Vec::new(),
            fields: UniFields::default(),
        }
    }
}
