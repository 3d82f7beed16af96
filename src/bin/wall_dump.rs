//! wall_dump.rs - build a small map, run a visual session over it and print
//! every wall part the engine produces.
//!
//! USAGE:
//! ```bash
//! cargo run --bin wall_dump -- --scenario step -vv
//! cargo run --bin wall_dump -- --config visual.toml --gradient ease-in-out
//! ```

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use glam::{DVec2, dvec2};
use log::{LevelFilter, info, warn};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

use yadoom_edit::{
    config::VisualConfig,
    engine::{InterpolationMode, VisualSession, WallGeometry, WallRole, gradient_brightness},
    renderer::GeometrySink,
    world::{
        ExtraFloorFlags, Level, LevelBuilder, LinedefFlags, LinedefId, SidedefId, SlopeDef,
        Texture, TextureBank,
    },
};

/// CLI options handled via `clap` derive.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Opts {
    /// Visual settings (TOML); defaults when omitted
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Map to build
    #[arg(long, value_enum, default_value_t = Scenario::Demo)]
    scenario: Scenario,

    /// Blend the light along the south wall before building
    #[arg(long, value_enum, value_name = "MODE")]
    gradient: Option<Gradient>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    dump_config: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Scenario {
    /// Two rooms with a step between them
    Step,
    /// Step, sky, 3D floor and a ramp
    Demo,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Gradient {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
}

impl From<Gradient> for InterpolationMode {
    fn from(g: Gradient) -> Self {
        match g {
            Gradient::Linear => InterpolationMode::Linear,
            Gradient::EaseIn => InterpolationMode::EaseInSine,
            Gradient::EaseOut => InterpolationMode::EaseOutSine,
            Gradient::EaseInOut => InterpolationMode::EaseInOutSine,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();

    let level_filter = match opts.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    TermLogger::init(
        level_filter,
        ConfigBuilder::default()
            .set_time_level(LevelFilter::Trace)
            .build(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    let config = match &opts.config {
        Some(path) => {
            info!("loading visual config from {}", path.display());
            VisualConfig::load(path)?
        }
        None => VisualConfig::default(),
    };
    if opts.dump_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let textures = texture_bank()?;
    let mut level = match opts.scenario {
        Scenario::Step => step_map(),
        Scenario::Demo => demo_map(),
    };

    if let Some(g) = opts.gradient {
        let lines = south_wall_lines(&level);
        match gradient_brightness(&config, &mut level, &lines, g.into()) {
            Ok(n) => info!("gradient applied to {n} sidedefs"),
            Err(e) => warn!("gradient skipped: {e}"),
        }
    }

    let mut session = VisualSession::new(config);
    let visible = session.build(&level, &textures);
    info!(
        "{}: {} sidedefs, {} wall parts, {} visible",
        level.name,
        level.sidedefs.len(),
        session.part_count(),
        visible
    );

    let mut printer = Printer::default();
    session.publish(&mut printer);
    println!(
        "{} parts, {} vertices, {} triangles",
        printer.parts, printer.vertices, printer.triangles
    );

    session.end();
    Ok(())
}

/*───────────────────────────────────────────────────────────────────────*/
/*                              Output                                  */
/*───────────────────────────────────────────────────────────────────────*/

/// Writes one line per wall part to stdout.
#[derive(Default)]
struct Printer {
    parts: usize,
    vertices: usize,
    triangles: usize,
}

impl GeometrySink for Printer {
    fn begin(&mut self) {
        *self = Self::default();
        println!(
            "{:>5}  {:<34} {:>5} {:>5} {:>8} {:>8}  flags",
            "side", "role", "verts", "polys", "bottom", "top"
        );
    }

    fn wall_part(&mut self, sidedef: SidedefId, role: WallRole, g: &WallGeometry) {
        self.parts += 1;
        self.vertices += g.vertex_count();
        self.triangles += g.triangles().count();

        let n = g.vertex_count().max(1) as f64;
        let center = g
            .vertices
            .iter()
            .fold(DVec2::ZERO, |acc, v| acc + v.pos.truncate().as_dvec2())
            / n;
        let mut flags = String::new();
        if g.render_as_sky {
            flags.push_str("sky ");
        }
        if g.skew.y != 0.0 {
            flags.push_str(&format!("skew {:.3}", g.skew.y));
        }
        println!(
            "{:>5}  {:<34} {:>5} {:>5} {:>8.2} {:>8.2}  {}",
            sidedef,
            format!("{role:?}"),
            g.vertex_count(),
            g.polygons.len(),
            g.bottom.get_z(center),
            g.top.get_z(center),
            flags.trim_end()
        );
    }

    fn end(&mut self) {}
}

/*───────────────────────────────────────────────────────────────────────*/
/*                              Maps                                    */
/*───────────────────────────────────────────────────────────────────────*/

fn texture_bank() -> anyhow::Result<TextureBank> {
    let mut bank = TextureBank::with_sentinels();
    for (name, w, h) in [
        ("STARTAN3", 128, 128),
        ("STARTAN2", 128, 128),
        ("BROWN1", 128, 128),
        ("STEP1", 32, 8),
        ("SUPPORT2", 64, 128),
    ] {
        bank.insert(name, Texture::new(name, w, h))?;
    }
    Ok(bank)
}

/// Floor 0 / ceiling 128 next to floor 32 / ceiling 96.
fn step_map() -> Level {
    let mut lb = LevelBuilder::new("STEP");
    lb.box_sector(dvec2(0.0, 0.0), dvec2(64.0, 64.0), 0.0, 128.0);
    lb.box_sector(dvec2(64.0, 0.0), dvec2(128.0, 64.0), 32.0, 96.0);
    lb.finish()
}

fn demo_map() -> Level {
    let mut lb = LevelBuilder::new("DEMO");

    let hall = lb.box_sector(dvec2(0.0, 0.0), dvec2(256.0, 256.0), 0.0, 192.0);
    let stage = lb.box_sector(dvec2(256.0, 0.0), dvec2(384.0, 256.0), 24.0, 160.0);
    let vault = lb.box_sector(dvec2(384.0, 0.0), dvec2(512.0, 256.0), 0.0, 192.0);
    let ramp = lb.box_sector(dvec2(0.0, 256.0), dvec2(256.0, 384.0), 0.0, 192.0);

    for s in [hall, stage] {
        lb.sector_mut(s).ceil_tex = "F_SKY1".into();
    }
    lb.sector_mut(stage).brightness = 160;
    lb.sector_mut(vault).brightness = 144;

    // a bridge floating in the vault
    let bridge = lb.extra_floor(vault, 64.0, 80.0, ExtraFloorFlags::empty());
    lb.sector_mut(bridge).brightness = 96;

    // ramp rises 1 unit per 4 away from the hall
    lb.sector_mut(ramp).floor_slope = Some(SlopeDef {
        a: 0.0,
        b: 0.25,
        c: -1.0,
        d: -64.0,
    });

    let mut level = lb.finish();
    for side in &mut level.sidedefs {
        if side.sector == stage {
            side.lower = "STEP1".into();
        }
    }
    let stage_sides = level.sides_of_sector(stage);
    for sd in stage_sides {
        let ld = level.sidedefs[sd as usize].linedef;
        if level.is_two_sided(ld) {
            level.linedefs[ld as usize]
                .flags
                .insert(LinedefFlags::LOWER_UNPEGGED);
        }
    }
    level
}

/// One-sided walls lying on y = 0, west to east.
fn south_wall_lines(level: &Level) -> Vec<LinedefId> {
    let mut lines: Vec<LinedefId> = (0..level.linedefs.len() as LinedefId)
        .filter(|&ld| {
            !level.is_two_sided(ld) && level.line_start(ld).y == 0.0 && level.line_end(ld).y == 0.0
        })
        .collect();
    lines.sort_by(|&a, &b| {
        let ax = level.line_start(a).x.min(level.line_end(a).x);
        let bx = level.line_start(b).x.min(level.line_end(b).x);
        ax.total_cmp(&bx)
    });
    lines
}
