mod config;

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use wrldgen_core::{GeneratorConfig, Placement};
use wrldgen_mesh::{GridMesh, LandscapeGenerator, MeshSummary, WorldGenerator, WorldScene};
use wrldgen_testkit::{GenerationKind, GenerationMetric, JsonlSink};
use wrldgen_world::{HeightField, HeightSampler, MarkerInstance, StackModel, WorldParser};

#[derive(Parser, Debug)]
#[command(author, version, about = "Terrain and stacked-structure generator for WRLD worlds", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a landscape mesh from a grayscale height image (flat without one)
    Landscape {
        /// Height image (PNG/JPEG); darker pixels are higher
        #[arg(long, conflicts_with = "world")]
        image: Option<PathBuf>,

        /// Use a WRLD layer's height levels as the height source instead of an image
        #[arg(long)]
        world: Option<PathBuf>,

        /// Layer of `--world` to sample
        #[arg(long, default_value_t = 0, requires = "world")]
        layer: usize,

        /// Generator config (TOML); defaults to config/wrldgen.toml when present
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output JSON path (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write every vertex buffer instead of a summary
        #[arg(long)]
        full: bool,

        /// Append a metrics record to this JSONL file
        #[arg(long)]
        metrics: Option<PathBuf>,
    },
    /// Parse a WRLD file and build its terrain and structure markers
    World {
        /// WRLD document
        file: PathBuf,

        /// Generator config (TOML); defaults to config/wrldgen.toml when present
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output JSON path (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write every vertex buffer instead of a summary
        #[arg(long)]
        full: bool,

        /// Append a metrics record to this JSONL file
        #[arg(long)]
        metrics: Option<PathBuf>,
    },
    /// Print per-layer statistics of a WRLD file
    Inspect {
        /// WRLD document
        file: PathBuf,

        /// Generator config (TOML); defaults to config/wrldgen.toml when present
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Write the resolved generator config as TOML
    Config {
        /// Destination TOML file
        #[arg(long)]
        write: PathBuf,

        /// Start from this config instead of config/wrldgen.toml
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Serialize)]
struct LandscapeReport<'a> {
    source: String,
    placement: Placement,
    #[serde(flatten)]
    mesh: MeshOutput<'a>,
}

#[derive(Debug, Serialize)]
struct WorldReport<'a> {
    world_name: Option<&'a str>,
    layers: usize,
    terrain_placement: Placement,
    terrain: MeshOutput<'a>,
    standing_markers: usize,
    markers: Vec<NamedMarker<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MeshOutput<'a> {
    Summary { summary: MeshSummary },
    Full { mesh: &'a GridMesh },
}

impl<'a> MeshOutput<'a> {
    fn new(mesh: &'a GridMesh, full: bool) -> Self {
        if full {
            MeshOutput::Full { mesh }
        } else {
            MeshOutput::Summary {
                summary: mesh.summary(),
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct NamedMarker<'a> {
    name: String,
    #[serde(flatten)]
    marker: &'a MarkerInstance,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Landscape {
            image,
            world,
            layer,
            config,
            output,
            full,
            metrics,
        } => {
            let config = config::resolve(config.as_deref())?;
            run_landscape(
                &config,
                HeightInput::from_args(image, world, layer),
                output.as_deref(),
                full,
                metrics.as_deref(),
            )
        }
        Command::World {
            file,
            config,
            output,
            full,
            metrics,
        } => {
            let config = config::resolve(config.as_deref())?;
            run_world(&config, &file, output.as_deref(), full, metrics.as_deref())
        }
        Command::Inspect { file, config } => {
            let config = config::resolve(config.as_deref())?;
            run_inspect(&config, &file)
        }
        Command::Config { write, config } => {
            let config = config::resolve(config.as_deref())?;
            config::save_to_path(&config, &write)
                .with_context(|| format!("Failed to write config {}", write.display()))?;
            info!("Wrote {}", write.display());
            Ok(())
        }
    }
}

enum HeightInput {
    Flat,
    Image(PathBuf),
    Layer { world: PathBuf, layer: usize },
}

impl HeightInput {
    fn from_args(image: Option<PathBuf>, world: Option<PathBuf>, layer: usize) -> Self {
        match (image, world) {
            (Some(image), _) => HeightInput::Image(image),
            (None, Some(world)) => HeightInput::Layer { world, layer },
            (None, None) => HeightInput::Flat,
        }
    }

    fn describe(&self) -> String {
        match self {
            HeightInput::Flat => "flat".to_owned(),
            HeightInput::Image(path) => path.display().to_string(),
            HeightInput::Layer { world, layer } => format!("{}#{layer}", world.display()),
        }
    }
}

fn run_landscape(
    config: &GeneratorConfig,
    input: HeightInput,
    output: Option<&Path>,
    full: bool,
    metrics: Option<&Path>,
) -> Result<()> {
    let mut generator = LandscapeGenerator::new(config)?;
    let placement = generator.placement();
    let started = Instant::now();

    let mesh = match &input {
        HeightInput::Flat => generator.regenerate(&HeightSampler::flat())?,
        HeightInput::Image(path) => {
            let field = HeightField::open(path)?;
            generator.regenerate(&HeightSampler::new(&field))?
        }
        HeightInput::Layer { world, layer } => {
            let model = load_model(config, world)?;
            let heights = model.layer_heights(*layer)?;
            generator.regenerate(&HeightSampler::new(&heights))?
        }
    };
    let elapsed = started.elapsed();
    let source = input.describe();
    info!(source = %source, vertices = mesh.vertex_count(), "Landscape generated");

    if let Some(path) = metrics {
        let record = GenerationMetric::new(GenerationKind::Landscape, source.clone())
            .mesh(mesh.vertex_count(), mesh.triangle_count(), mesh.hash.to_hex())
            .elapsed_us(elapsed.as_micros());
        append_metric(path, &record)?;
    }

    let report = LandscapeReport {
        source,
        placement,
        mesh: MeshOutput::new(mesh, full),
    };
    write_json(output, &report)
}

fn run_world(
    config: &GeneratorConfig,
    file: &Path,
    output: Option<&Path>,
    full: bool,
    metrics: Option<&Path>,
) -> Result<()> {
    let text = read_world(file)?;
    let mut generator = WorldGenerator::new(config.clone())?;
    let started = Instant::now();
    let scene = generator
        .regenerate(&text)
        .with_context(|| format!("Failed to generate world from {}", file.display()))?;
    let elapsed = started.elapsed();

    let standing = scene.standing_markers().count();
    info!(
        file = %file.display(),
        markers = scene.markers.len(),
        standing,
        "World generated"
    );

    if let Some(path) = metrics {
        let record = GenerationMetric::new(GenerationKind::World, file.display().to_string())
            .mesh(
                scene.terrain.vertex_count(),
                scene.terrain.triangle_count(),
                scene.terrain.hash.to_hex(),
            )
            .markers(scene.markers.len(), standing)
            .elapsed_us(elapsed.as_micros());
        append_metric(path, &record)?;
    }

    write_json(output, &world_report(scene, full))
}

fn world_report(scene: &WorldScene, full: bool) -> WorldReport<'_> {
    WorldReport {
        world_name: scene.world_name.as_deref(),
        layers: scene.model.layer_count(),
        terrain_placement: scene.terrain_placement,
        terrain: MeshOutput::new(&scene.terrain, full),
        standing_markers: scene.standing_markers().count(),
        markers: scene
            .markers
            .iter()
            .map(|marker| NamedMarker {
                name: marker.name(),
                marker,
            })
            .collect(),
    }
}

fn run_inspect(config: &GeneratorConfig, file: &Path) -> Result<()> {
    let model = load_model(config, file)?;
    let settings = &config.structures;
    let mut out = io::stdout().lock();

    writeln!(
        out,
        "{}: {} x {} grid, {} layer(s)",
        file.display(),
        model.cols(),
        model.rows(),
        model.layer_count()
    )?;
    writeln!(out, "layer  stack_height  current_height  offset    standing")?;
    for layer in 0..model.layer_count() {
        let mut standing = 0;
        for row in 0..model.rows() {
            for col in 0..model.cols() {
                if !model.is_floored(layer, row, col, settings)? {
                    standing += 1;
                }
            }
        }
        writeln!(
            out,
            "{:<5}  {:>12.3}  {:>14.4}  {:>8.4}  {:>4}/{}",
            layer,
            model.stack_height(layer)?,
            model.current_height(layer, settings)?,
            model.cumulative_offset(layer, settings)?,
            standing,
            model.cols() * model.rows()
        )?;
    }
    out.flush()?;
    Ok(())
}

fn read_world(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read WRLD file {}", path.display()))
}

fn load_model(config: &GeneratorConfig, path: &Path) -> Result<StackModel> {
    let text = read_world(path)?;
    let document = WorldParser::new(config.parser)
        .parse(&text)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    if document.layers.is_empty() {
        bail!("{} has no layers", path.display());
    }
    Ok(document.to_stack_model()?)
}

fn append_metric(path: &Path, record: &GenerationMetric) -> Result<()> {
    let mut sink = JsonlSink::append(path)
        .with_context(|| format!("Failed to open metrics file {}", path.display()))?;
    sink.write(record)
}

fn write_json<T: Serialize>(output: Option<&Path>, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => {
            let mut out = io::stdout().lock();
            writeln!(out, "{json}")?;
            out.flush()?;
        }
    }
    Ok(())
}
