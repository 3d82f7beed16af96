//! Wall light resolution, Doom-style fake contrast and fog, plus the
//! linedef gradient-brightness tool.

use std::f64::consts::{FRAC_PI_2, PI};

use log::debug;
use thiserror::Error;

use super::{sector_data::sector_fogged, types::PixelColor};
use crate::{
    config::VisualConfig,
    world::{Level, LinedefId, SidedefId},
};

/// Light change on walls running along the x axis.
const WALL_HORIZ_LIGHT: i32 = -16;
/// Light change on walls running along the y axis.
const WALL_VERT_LIGHT: i32 = 16;
/// Minimum fog, even at full brightness.
const MIN_FOG: f32 = 30.0;

/// A sidedef light value as written in its fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WallLight {
    pub value: i32,
    pub absolute: bool,
}

impl WallLight {
    /// Effective level under a sector light of `brightness_below`.  Not
    /// clamped.
    pub fn level(&self, brightness_below: i32) -> i32 {
        if self.absolute {
            self.value
        } else {
            brightness_below + self.value
        }
    }
}

/// Combine the sidedef-wide and the per-part (`light_<part>`) light fields.
///
/// In a fogged sector a relative sidedef light only counts when `lightfog`
/// is set.
pub fn wall_light(level: &Level, sd: SidedefId, part: &str, fogged: bool) -> WallLight {
    let fields = &level.sidedefs[sd as usize].fields;
    let mut light = WallLight::default();

    if fields.flag("lightabsolute") {
        light.value = fields.int("light", 0);
        light.absolute = true;
    } else if !fogged || fields.flag("lightfog") {
        light.value = fields.int("light", 0);
    }

    let part_value = fields.int(&format!("light_{part}"), 0);
    if fields.flag(&format!("lightabsolute_{part}")) {
        light.value = part_value;
        light.absolute = true;
    } else {
        light.value += part_value;
    }
    light
}

/// Grey shade for a wall at light `level`, including fake contrast.
pub fn calculate_brightness(
    config: &VisualConfig,
    level: &Level,
    sd: Option<SidedefId>,
    light: i32,
) -> PixelColor {
    let mut light = light;

    if let Some(sd) = sd {
        let fields = &level.sidedefs[sd as usize].fields;
        if !config.even_lighting && !fields.flag("nofakecontrast") {
            let ld = level.sidedefs[sd as usize].linedef;
            let delta = level.line_end(ld) - level.line_start(ld);
            light += if config.smooth_lighting || fields.flag("smoothlighting") {
                let slope = if delta.x == 0.0 {
                    FRAC_PI_2
                } else {
                    (delta.y / delta.x).atan().abs()
                };
                let span = f64::from(WALL_VERT_LIGHT - WALL_HORIZ_LIGHT);
                (f64::from(WALL_HORIZ_LIGHT) + slope / FRAC_PI_2 * span).round() as i32
            } else if delta.y == 0.0 {
                WALL_HORIZ_LIGHT
            } else if delta.x == 0.0 {
                WALL_VERT_LIGHT
            } else {
                0
            };
        }
    }

    if config.doom_light_levels && light < 192 {
        light = (192.0 - f64::from(192 - light) * 1.5) as i32;
    }
    PixelColor::grey(light.clamp(0, 255) as u8)
}

/// Wall color: fake-contrast grey modulated by the sector light color.
pub fn wall_color(
    config: &VisualConfig,
    level: &Level,
    sd: SidedefId,
    light: i32,
    color_below: PixelColor,
) -> PixelColor {
    color_below
        .modulate(calculate_brightness(config, level, Some(sd), light))
        .with_alpha(255)
}

/// Fog amount for a light level; darker means foggier.
pub fn fog_factor(config: &VisualConfig, light: i32) -> f32 {
    let dark = (255 - light.clamp(0, 255)) as f32;
    dark.clamp(MIN_FOG, 255.0) / 255.0 * config.fog_density
}

/*------------------------- gradient brightness ----------------------*/

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GradientError {
    #[error("need at least 3 linedefs, got {0}")]
    TooFewLines(usize),

    #[error("linedef {0} has no visible sides")]
    NoVisibleParts(LinedefId),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InterpolationMode {
    #[default]
    Linear,
    EaseInSine,
    EaseOutSine,
    EaseInOutSine,
}

impl InterpolationMode {
    pub fn interpolate(self, start: f64, end: f64, u: f64) -> f64 {
        let delta = end - start;
        match self {
            InterpolationMode::Linear => start + delta * u,
            InterpolationMode::EaseInSine => -delta * (u * FRAC_PI_2).cos() + delta + start,
            InterpolationMode::EaseOutSine => delta * (u * FRAC_PI_2).sin() + start,
            InterpolationMode::EaseInOutSine => -delta / 2.0 * ((PI * u).cos() - 1.0) + start,
        }
    }
}

fn sidedef_brightness(level: &Level, sd: SidedefId) -> f64 {
    let side = &level.sidedefs[sd as usize];
    let light = side.fields.int("light", 0);
    if side.fields.flag("lightabsolute") {
        return f64::from(light);
    }
    let brightness = level.sectors[side.sector as usize].brightness;
    f64::from((brightness + light).clamp(0, 255))
}

fn linedef_brightness(level: &Level, ld: LinedefId) -> Option<f64> {
    let line = &level.linedefs[ld as usize];
    let visible = |sd: Option<SidedefId>| {
        sd.filter(|&s| level.sidedef_has_visible_parts(Some(s)))
            .map(|s| sidedef_brightness(level, s))
    };
    match (visible(line.front), visible(line.back)) {
        (Some(f), Some(b)) => Some((f + b) / 2.0),
        (f, b) => f.or(b),
    }
}

fn apply_sidedef_brightness(config: &VisualConfig, level: &mut Level, sd: SidedefId, b: i32) {
    let sector = level.sidedefs[sd as usize].sector;
    let (brightness, fogged) = {
        let s = &level.sectors[sector as usize];
        (s.brightness, sector_fogged(config, s))
    };

    let fields = &mut level.sidedefs[sd as usize].fields;
    let absolute = fields.flag("lightabsolute");
    if absolute {
        fields.set("light", b);
    } else {
        fields.set_int_or_remove("light", b - brightness, 0);
    }

    // relative light in fog needs `lightfog` to show up
    if fogged && !absolute && fields.int("light", 0) != 0 {
        fields.set("lightfog", true);
    } else {
        fields.remove("lightfog");
    }
}

/// Spread brightness across `lines` (in order) from the first line's
/// brightness to the last one's.  Returns the number of sidedefs written.
pub fn gradient_brightness(
    config: &VisualConfig,
    level: &mut Level,
    lines: &[LinedefId],
    mode: InterpolationMode,
) -> Result<usize, GradientError> {
    let (Some(&first), Some(&last)) = (lines.first(), lines.last()) else {
        return Err(GradientError::TooFewLines(0));
    };
    if lines.len() < 3 {
        return Err(GradientError::TooFewLines(lines.len()));
    }

    let start = linedef_brightness(level, first).ok_or(GradientError::NoVisibleParts(first))?;
    let end = linedef_brightness(level, last).ok_or(GradientError::NoVisibleParts(last))?;

    let steps = (lines.len() - 1) as f64;
    let mut written = 0;
    for (i, &ld) in lines.iter().enumerate() {
        let b = mode.interpolate(start, end, i as f64 / steps).round_ties_even() as i32;
        let line = &level.linedefs[ld as usize];
        let sides: Vec<SidedefId> = line
            .front
            .into_iter()
            .chain(line.back)
            .filter(|&s| level.sidedef_has_visible_parts(Some(s)))
            .collect();
        for sd in sides {
            apply_sidedef_brightness(config, level, sd, b);
            written += 1;
        }
    }

    debug!(
        "gradient brightness {start}..{end} over {} lines ({written} sides)",
        lines.len()
    );
    Ok(written)
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
