//! SnapStudio command-line interface.
//!
//! Renders an annotated map snapshot to a PNG file: the fast preview is
//! produced synchronously, then the process waits (bounded) for the address
//! upgrade before writing the best available image.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use snapstudio::coord::Coordinate;
use snapstudio::geocode::{FallbackGeocoder, NominatimGeocoder};
use snapstudio::pipeline::PipelineConfig;
use snapstudio::provider::{PlaceholderTileRenderer, StaticmapTileRenderer};
use snapstudio::snapshot::TileRenderer;
use snapstudio::text::{ParleyTextEngine, TextEngine};
use snapstudio::{MapStyle, OverlayFlags, RenderParams, RenderPipeline, UpgradeEvent};

#[derive(Parser)]
#[command(name = "snapstudio", version, about = "Annotated map snapshots")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render an annotated snapshot to a PNG file.
    Render(RenderArgs),
}

#[derive(Args)]
struct RenderArgs {
    /// Latitude of the snapshot center, in degrees.
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    /// Longitude of the snapshot center, in degrees.
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,

    /// Ground coverage in meters (150-6000, snapped to 50 m steps).
    #[arg(long, default_value_t = 800)]
    extent: u32,

    /// Imagery style: standard, satellite, or hybrid.
    #[arg(long, default_value = "hybrid")]
    style: String,

    /// Clockwise rotation in degrees (0-360).
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    rotation: f32,

    /// Output edge length in pixels.
    #[arg(long, default_value_t = 1024)]
    width: u32,

    /// Output PNG path.
    #[arg(long, default_value = "snapshot.png")]
    out: PathBuf,

    /// Skip the grid overlay.
    #[arg(long)]
    no_grid: bool,

    /// Grid divisions per axis (2-5).
    #[arg(long, default_value_t = 4)]
    grid_divisions: u8,

    /// Skip the center crosshair.
    #[arg(long)]
    no_crosshair: bool,

    /// Skip the caption box.
    #[arg(long)]
    no_caption: bool,

    /// Use flat placeholder tiles and skip geocoding (no network).
    #[arg(long)]
    offline: bool,

    /// Seconds to wait for the address upgrade before writing.
    #[arg(long, default_value_t = 8)]
    wait: u64,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    if let Err(e) = snapstudio::logging::init_logging() {
        eprintln!("Warning: logging init failed: {e}");
    }
    match cli.command {
        Commands::Render(args) => render(args),
    }
}

fn render(args: RenderArgs) -> Result<(), Box<dyn Error>> {
    let coord = Coordinate::new(args.lat, args.lon)?;
    let style: MapStyle = args.style.parse()?;
    let params = RenderParams::new(coord, args.extent, style, args.rotation, args.width);
    let flags = OverlayFlags {
        grid: !args.no_grid,
        grid_divisions: args.grid_divisions,
        crosshair: !args.no_crosshair,
        caption: !args.no_caption,
    };

    let tiles: Arc<dyn TileRenderer> = if args.offline {
        Arc::new(PlaceholderTileRenderer)
    } else {
        Arc::new(StaticmapTileRenderer::new())
    };
    let fallback: Option<Arc<dyn FallbackGeocoder>> = if args.offline {
        None
    } else {
        match NominatimGeocoder::new() {
            Ok(geocoder) => Some(Arc::new(geocoder)),
            Err(e) => {
                warn!(error = %e, "Geocoder unavailable; rendering without address");
                None
            }
        }
    };
    let text: Arc<dyn TextEngine> = Arc::new(ParleyTextEngine::new());

    let (pipeline, mut upgrades) =
        RenderPipeline::new(PipelineConfig::default(), tiles, text, None, fallback);

    let preview = pipeline.render_preview(params, flags)?;
    info!(request = %preview.request, "Preview ready");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let upgraded = runtime.block_on(async {
        match tokio::time::timeout(Duration::from_secs(args.wait), upgrades.recv()).await {
            Ok(Some(UpgradeEvent::Upgraded { image, .. })) => Some(image),
            Ok(Some(UpgradeEvent::Unavailable { .. })) => {
                info!("Address lookup unavailable; keeping the preview");
                None
            }
            Ok(None) => None,
            Err(_) => {
                warn!(wait = args.wait, "Timed out waiting for the address upgrade");
                None
            }
        }
    });

    let image = upgraded.unwrap_or(preview.image);
    image.save_png(&args.out)?;
    println!("Wrote {}", args.out.display());
    Ok(())
}
