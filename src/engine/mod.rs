pub mod lighting;
pub mod plane;
pub mod polygon;
pub mod sector_data;
pub mod session;
pub mod texture_plane;
pub mod types;
pub mod walls;

pub use lighting::{GradientError, InterpolationMode, gradient_brightness};

pub use plane::Plane;

pub use sector_data::{ExtraFloor, SectorCache, SectorData, SectorLevel};

pub use session::{PartKey, VisualSession, part_roles};

pub use types::{PixelColor, WallGeometry, WorldVertex};

pub use walls::{WallPart, WallRole, new_texture_offset};
