mod builder;
pub mod fields;
mod geometry;
mod helpers;
mod texture;

pub use geometry::{
    ExtraFloorDef, ExtraFloorFlags, Level, Linedef, LinedefFlags, LinedefId, NO_TEXTURE_NAME,
    Sector, SectorId, Sidedef, SidedefId, SlopeDef, Vertex, VertexId,
};

pub use builder::{DEFAULT_WALL, LevelBuilder};

pub use fields::{UniFields, UniValue};

pub use texture::{
    MISSING_TEXTURE, Texture, TextureBank, TextureError, TextureId, TextureLookup, UNKNOWN_TEXTURE,
};
