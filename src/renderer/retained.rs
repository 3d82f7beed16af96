//! ---------------------------------------------------------------------------
//! Retained geometry collector
//!
//! * Keeps a copy of every wall part of the last batch, in submission order.
//! * Used by tools that inspect the output after the fact and by tests.
//! ---------------------------------------------------------------------------

use crate::{
    engine::{types::WallGeometry, walls::WallRole},
    renderer::GeometrySink,
    world::SidedefId,
};

/// One received part.
#[derive(Clone, Debug)]
pub struct RetainedPart {
    pub sidedef: SidedefId,
    pub role: WallRole,
    pub geometry: WallGeometry,
}

/*───────────────────────────────────────────────────────────────────────*/
/*                              Collector                               */
/*───────────────────────────────────────────────────────────────────────*/

#[derive(Default)]
pub struct RetainedGeometry {
    parts: Vec<RetainedPart>,
    batches: usize,
    open: bool,
}

impl RetainedGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parts(&self) -> &[RetainedPart] {
        &self.parts
    }

    /// Completed batches so far.
    pub fn batches(&self) -> usize {
        self.batches
    }

    pub fn find(&self, sidedef: SidedefId, role: WallRole) -> Option<&RetainedPart> {
        self.parts
            .iter()
            .find(|p| p.sidedef == sidedef && p.role == role)
    }

    pub fn vertex_count(&self) -> usize {
        self.parts.iter().map(|p| p.geometry.vertex_count()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.parts.iter().map(|p| p.geometry.triangles().count()).sum()
    }
}

/*──────────────────────── GeometrySink trait impl ────────────────────*/
impl GeometrySink for RetainedGeometry {
    fn begin(&mut self) {
        self.parts.clear();
        self.open = true;
    }

    fn wall_part(&mut self, sidedef: SidedefId, role: WallRole, geometry: &WallGeometry) {
        debug_assert!(self.open, "wall_part outside begin/end");
        self.parts.push(RetainedPart {
            sidedef,
            role,
            geometry: geometry.clone(),
        });
    }

    fn end(&mut self) {
        self.open = false;
        self.batches += 1;
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
