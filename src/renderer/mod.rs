//! Hand-off layer between the visual engine and whatever draws its output.
//!
//! *The engine never touches a vertex buffer directly.*
//! After a (re)build it walks its wall parts and hands each visible one to a
//! type implementing [`GeometrySink`].
//!
//! * A GPU back-end uploads the vertices, a debugging tool prints them, a test
//!   collects them with [`RetainedGeometry`].
//! * A helper blanket-impl [`GeometrySinkExt`] adds `publish` so call-sites
//!   stay short.
//!
//! **Current limitation**: walls only.  Flats and things will get their own
//! callbacks once the engine produces them.

use crate::{
    engine::{
        types::WallGeometry,
        walls::{WallPart, WallRole},
    },
    world::SidedefId,
};

mod retained;

pub use retained::{RetainedGeometry, RetainedPart};

/// Receiver of finished wall geometry.
///
/// A batch is always bracketed by `begin` and `end`; anything received in an
/// earlier batch is stale once `begin` runs again.
pub trait GeometrySink {
    /// Start a new batch.
    fn begin(&mut self);

    /// One visible wall part.  Parts without geometry are never sent.
    fn wall_part(&mut self, sidedef: SidedefId, role: WallRole, geometry: &WallGeometry);

    /// Batch complete.
    fn end(&mut self);
}

/// Convenience blanket-impl with a one-liner `publish` adaptor.
pub trait GeometrySinkExt: GeometrySink {
    /// Send every part that has geometry as one batch.  Returns how many
    /// parts were sent.
    fn publish<'a, I>(&mut self, parts: I) -> usize
    where
        I: IntoIterator<Item = &'a WallPart>,
    {
        self.begin();
        let mut sent = 0;
        for part in parts {
            if let Some(g) = &part.geometry {
                self.wall_part(part.sidedef, part.role, g);
                sent += 1;
            }
        }
        self.end();
        sent
    }
}
impl<T: GeometrySink + ?Sized> GeometrySinkExt for T {}
