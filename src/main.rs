use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use cosmorph::prelude::*;
use rand::{rngs::SmallRng, SeedableRng};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cosmorph", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the field headless through every wizard step.
    Run(RunArgs),
    /// Sample one shape and write its positions.
    Sample(SampleArgs),
    /// Write the default configuration as JSON.
    InitConfig {
        /// Output path.
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Parser, Debug)]
struct CommonArgs {
    /// Field configuration JSON. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the particle count.
    #[arg(long)]
    particles: Option<usize>,

    /// Override the RNG seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Directory that font URLs are resolved against.
    #[arg(long)]
    font_root: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RunArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Name entered on the name step.
    #[arg(long, default_value = "Cosmos")]
    name: String,

    /// Theme picked on the colors step.
    #[arg(long, default_value = "nebula_purple")]
    theme: String,

    /// Symbol picked on the symbol step.
    #[arg(long, default_value = "explorer")]
    symbol: String,

    /// Simulated frames per second.
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// Simulated seconds spent on each step.
    #[arg(long, default_value_t = 3.0)]
    step_seconds: f64,

    /// Write the final positions as raw native-endian f32 triples.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct SampleArgs {
    #[command(flatten)]
    common: CommonArgs,

    #[arg(long, value_enum)]
    shape: ShapeChoice,

    /// Radius for sphere-like shapes, spread for stars.
    #[arg(long, default_value_t = 6.0)]
    size: f32,

    /// Content for `--shape text`.
    #[arg(long, default_value = "HELLO")]
    text: String,

    /// Output path for raw native-endian f32 triples.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ShapeChoice {
    Sphere,
    Text,
    Torus,
    Crystal,
    Ring,
    Spaceship,
    Stars,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Sample(args) => cmd_sample(args),
        Command::InitConfig { out } => {
            FieldConfig::default()
                .save(&out)
                .with_context(|| format!("write config '{}'", out.display()))?;
            info!(path = %out.display(), "wrote default config");
            Ok(())
        }
    }
}

fn load_config(args: &CommonArgs) -> anyhow::Result<FieldConfig> {
    let mut config = match &args.config {
        Some(path) => FieldConfig::load(path).with_context(|| format!("load config '{}'", path.display()))?,
        None => FieldConfig::default(),
    };
    if let Some(n) = args.particles {
        config.particle_count = n;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate()?;
    Ok(config)
}

fn font_library(args: &CommonArgs) -> FontLibrary {
    match &args.font_root {
        Some(root) => FontLibrary::new(Arc::new(FsFetcher::with_root(root))),
        None => FontLibrary::default(),
    }
}

fn write_positions(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    fs::write(path, bytes).with_context(|| format!("write positions '{}'", path.display()))?;
    info!(path = %path.display(), bytes = bytes.len(), "wrote positions");
    Ok(())
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let config = load_config(&args.common)?;
    let theme = args
        .theme
        .parse::<ThemePreset>()
        .map_err(anyhow::Error::msg)?
        .theme();
    let symbol = args.symbol.parse::<CosmicSymbol>().map_err(anyhow::Error::msg)?;
    anyhow::ensure!(args.fps > 0.0, "--fps must be positive");

    let mut driver = AnimationDriver::with_font_library(config, font_library(&args.common))?;
    let mut clock = FrameClock::stepped(1.0 / args.fps);
    let frames_per_step = (args.step_seconds * args.fps).ceil().max(1.0) as u64;

    let mut input = ProfileInput::default();
    for step in WizardStep::ALL {
        input.current_step = step;
        match step {
            WizardStep::Name => input.name = Some(args.name.clone()),
            WizardStep::Colors => input.color_theme = Some(theme.clone()),
            WizardStep::Symbol => input.symbol = Some(symbol),
            WizardStep::Welcome | WizardStep::Final => {}
        }
        driver.observe(&input, clock.elapsed());

        for _ in 0..frames_per_step {
            let now = clock.tick();
            if driver.has_pending() {
                driver.wait_for_pending(now);
            }
            driver.tick(now);
        }

        let positions = driver.field().positions();
        let (lo, hi) = positions.bounds().unwrap_or((Vec3::ZERO, Vec3::ZERO));
        info!(
            step = ?step,
            phase = ?driver.morph().phase(),
            request = %driver.latest_request(),
            max_radius = positions.max_radius(),
            extent = ?(hi - lo),
            "step finished"
        );
    }

    if let Some(out) = &args.out {
        write_positions(out, driver.field().positions().as_bytes())?;
    }
    Ok(())
}

fn cmd_sample(args: SampleArgs) -> anyhow::Result<()> {
    let config = load_config(&args.common)?;
    let sampler = ShapeSampler::new(config.sampler_settings(), font_library(&args.common));
    let size = args.size;

    let request = match args.shape {
        ShapeChoice::Sphere => ShapeRequest::Sphere { radius: size },
        ShapeChoice::Text => ShapeRequest::Text {
            content: args.text.clone(),
        },
        ShapeChoice::Torus => ShapeRequest::Solid(Solid::Torus {
            radius: size,
            tube: size / 3.0,
        }),
        ShapeChoice::Crystal => ShapeRequest::Solid(Solid::Octahedron { radius: size }),
        ShapeChoice::Ring => ShapeRequest::Solid(Solid::Ring {
            radius: size,
            tube: 0.6,
        }),
        ShapeChoice::Spaceship => ShapeRequest::Solid(Solid::Spaceship {
            height: size,
            width: size / 2.0,
        }),
        ShapeChoice::Stars => ShapeRequest::Cluster { spread: size },
    };

    let mut rng = match config.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };
    let positions = sampler
        .sample(&request, config.particle_count, &mut rng)
        .with_context(|| format!("sample {}", request.kind()))?;

    info!(
        shape = request.kind(),
        count = positions.count(),
        max_radius = positions.max_radius(),
        "sampled"
    );
    write_positions(&args.out, positions.as_bytes())
}
