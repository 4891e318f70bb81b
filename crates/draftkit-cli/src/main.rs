//! draftkit CLI - technical drawings from triangle meshes
//!
//! Loads an STL (or a built-in sample solid), runs the drawing pipeline and
//! writes the views, circles and dimensions as JSON.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use draftkit_drafting::{
    generate_drawing, Dimension, Drawing, DraftingConfig, DraftingError, Outcome, ProgressSink,
    ProjectedView, ViewOrientation,
};
use draftkit_mesh::{primitives, Mesh, MeshTopology};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod stl;

#[derive(Parser)]
#[command(name = "draftkit")]
#[command(about = "Multi-view technical drawings from triangle meshes", long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a drawing from an STL file
    Draw {
        /// Input .stl file (ASCII or binary)
        input: PathBuf,
        #[command(flatten)]
        output: DrawArgs,
    },
    /// Generate a drawing of a built-in solid
    Sample {
        /// Which solid
        #[arg(value_enum)]
        shape: Sample,
        #[command(flatten)]
        output: DrawArgs,
    },
    /// Display mesh statistics for an STL file
    Info {
        /// Input .stl file
        input: PathBuf,
    },
}

#[derive(Args)]
struct DrawArgs {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Output JSON file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Only emit this view (front, back, top, bottom, left, right, isometric)
    #[arg(long)]
    view: Option<ViewOrientation>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Sample {
    /// 50 mm cube
    Cube,
    /// 20 mm radius, 40 mm tall, 64 segments
    Cylinder,
    /// 40 x 43 x 30 L-bracket
    Bracket,
}

impl Sample {
    fn mesh(self) -> Mesh {
        match self {
            Sample::Cube => primitives::cube(50.0),
            Sample::Cylinder => primitives::cylinder(20.0, 40.0, 64),
            Sample::Bracket => primitives::l_bracket(),
        }
    }
}

/// Logs pipeline checkpoints.
struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&self, current: u32, total: u32, message: &str) {
        info!(current, total, "{message}");
    }
}

/// One view with its dimensions and formatted labels.
#[derive(Serialize)]
struct ViewOutput<'a> {
    view: &'a ProjectedView,
    dimensions: &'a [Dimension],
    labels: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Draw { input, output } => {
            let mesh = stl::load_stl(&input)
                .with_context(|| format!("failed to load {}", input.display()))?;
            draw(&mesh, &output)?;
        }
        Commands::Sample { shape, output } => {
            draw(&shape.mesh(), &output)?;
        }
        Commands::Info { input } => {
            let mesh = stl::load_stl(&input)
                .with_context(|| format!("failed to load {}", input.display()))?;
            show_info(&input, &mesh)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn draw(mesh: &Mesh, args: &DrawArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => DraftingConfig::from_toml_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => DraftingConfig::default(),
    };

    let outcome = generate_drawing(mesh, &config, &LogProgress).map_err(stage_context)?;
    let drawing = match outcome {
        Outcome::Completed(drawing) => drawing,
        Outcome::Cancelled => anyhow::bail!("drawing was cancelled"),
    };

    let json = match args.view {
        Some(orientation) => view_json(&drawing, orientation)?,
        None => serde_json::to_string_pretty(&drawing)?,
    };
    write_output(args.output.as_deref(), &json)?;

    let s = drawing.stats;
    eprintln!(
        "{} faces, {} feature edges, {} circles, {} dimensions",
        s.simplified_faces, s.feature_edges, s.circles, s.dimensions
    );
    Ok(())
}

fn stage_context(err: DraftingError) -> anyhow::Error {
    match err.stage() {
        Some(_) => anyhow::Error::new(err).context("input mesh rejected"),
        None => err.into(),
    }
}

fn view_json(drawing: &Drawing, orientation: ViewOrientation) -> Result<String> {
    let (view, dimensions) = drawing
        .view(orientation)
        .ok_or_else(|| anyhow::anyhow!("view {orientation} missing from drawing"))?;
    let out = ViewOutput {
        view,
        dimensions,
        labels: dimensions.iter().map(Dimension::label).collect(),
    };
    Ok(serde_json::to_string_pretty(&out)?)
}

fn write_output(path: Option<&Path>, json: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote drawing to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn show_info(path: &Path, mesh: &Mesh) -> Result<()> {
    let topo = MeshTopology::build(mesh)?;
    let ext = mesh.extents();

    println!("File: {}", path.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Faces: {}", mesh.num_faces());
    println!("Edges: {}", topo.num_edges());
    println!("  Boundary: {}", topo.num_boundary_edges());
    println!("  Non-manifold: {}", topo.num_non_manifold_edges());
    println!("Watertight: {}", if topo.is_watertight() { "yes" } else { "no" });
    println!("Surface area: {:.3}", topo.surface_area());
    println!(
        "Extents: {:.3} x {:.3} x {:.3} (width x height x depth)",
        ext.width, ext.height, ext.depth
    );
    Ok(())
}
