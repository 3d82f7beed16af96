//! Visual-mode wall geometry for a Doom map editor: sector derived data,
//! wall part clipping, texture projection and lighting.

pub mod config;
pub mod engine;
pub mod renderer;
pub mod world;
