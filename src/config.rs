//! Editor / game configuration consumed by the visual engine.
//!
//! Passed by reference into every wall-part setup; nothing in the engine
//! reads global state.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::world::LinedefFlags;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("could not write config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualConfig {
    /// Scale texture offsets by texture/part scale (non world-panning textures).
    pub scaled_texture_offsets: bool,
    /// MAPINFO `ForceWorldPanning`.
    pub force_world_panning: bool,
    /// Honour `skew_*_type` sidedef fields.
    pub sidedef_texture_skewing: bool,
    pub lower_unpegged_flag: LinedefFlags,
    pub upper_unpegged_flag: LinedefFlags,
    pub sky_flat_name: String,
    /// Simulate the darker Doom light curve below 192.
    pub doom_light_levels: bool,
    /// MAPINFO `EvenLighting`: no fake contrast.
    pub even_lighting: bool,
    /// MAPINFO `SmoothLighting`: angle based fake contrast.
    pub smooth_lighting: bool,
    /// MAPINFO `FadeColor` (0xRRGGBB).
    pub fade_color: Option<u32>,
    /// MAPINFO `OutsideFog` (0xRRGGBB).
    pub outside_fog_color: Option<u32>,
    pub fog_density: f32,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            scaled_texture_offsets: true,
            force_world_panning: false,
            sidedef_texture_skewing: true,
            lower_unpegged_flag: LinedefFlags::LOWER_UNPEGGED,
            upper_unpegged_flag: LinedefFlags::UPPER_UNPEGGED,
            sky_flat_name: "F_SKY1".into(),
            doom_light_levels: true,
            even_lighting: false,
            smooth_lighting: false,
            fade_color: None,
            outside_fog_color: None,
            fog_density: 1.0,
        }
    }
}

impl VisualConfig {
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(src)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let src = fs::read_to_string(path)?;
        Self::from_toml_str(&src)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = VisualConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, VisualConfig::default());
    }

    #[test]
    fn partial_document_overrides_fields() {
        let cfg = VisualConfig::from_toml_str(
            r#"
            force_world_panning = true
            sidedef_texture_skewing = false
            sky_flat_name = "F_SKY2"
            lower_unpegged_flag = "LOWER_UNPEGGED | WRAP_MIDTEX"
            "#,
        )
        .unwrap();
        assert!(cfg.force_world_panning);
        assert!(!cfg.sidedef_texture_skewing);
        assert_eq!(cfg.sky_flat_name, "F_SKY2");
        assert!(cfg.lower_unpegged_flag.contains(LinedefFlags::WRAP_MIDTEX));
        assert!(cfg.scaled_texture_offsets);
    }

    #[test]
    fn bad_document_is_a_parse_error() {
        let err = VisualConfig::from_toml_str("fog_density = \"thick\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn serializer_failure_is_reported() {
        let err: ConfigError = <toml::ser::Error as serde::ser::Error>::custom("no table").into();
        assert!(matches!(err, ConfigError::Serialize(_)));
        assert!(err.to_string().starts_with("could not write config"));
    }

    #[test]
    fn round_trips_through_toml() {
        let mut cfg = VisualConfig::default();
        cfg.fade_color = Some(0x102030);
        let text = cfg.to_toml_string().unwrap();
        assert!(text.contains("sky_flat_name = \"F_SKY1\""));
        let back = VisualConfig::from_toml_str(&text).unwrap();
        assert_eq!(back, cfg);
    }
}
