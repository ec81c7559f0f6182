use clap::Parser;
use maplocate::image::io::load_rgba_image;
use maplocate::locator::{crop_minimap_roi, scan::scan_zone_dir};
use maplocate::{LocatorParams, MapLocator, MapPosition};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Minimap locator over a zone directory")]
struct Cli {
    /// Map root directory, one region subdirectory per zone set.
    #[arg(short, long, value_name = "DIR")]
    maps: PathBuf,
    /// Minimap frames to locate, processed in order.
    #[arg(short, long, value_name = "FILE", required = true, num_args = 1..)]
    input: Vec<PathBuf>,
    /// Treat inputs as full-screen captures and crop the minimap ROI.
    #[arg(long)]
    full_frame: bool,
    /// JSON file with locator parameter overrides.
    #[arg(long, value_name = "FILE")]
    params: Option<PathBuf>,
    /// Write a debug context image per hit into this directory.
    #[arg(long, value_name = "DIR")]
    debug_dir: Option<PathBuf>,
    /// Print an example parameter file and exit.
    #[arg(long)]
    print_example_params: bool,
    /// Enable tracing output.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Serialize)]
struct FrameRecord {
    input: String,
    position: Option<MapPosition>,
    lost_tracking: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("maplocate=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_example_params {
        println!("{}", serde_json::to_string_pretty(&LocatorParams::default())?);
        return Ok(());
    }

    let zones = scan_zone_dir(&cli.maps)?;
    if zones.is_empty() {
        return Err(format!("no zone images found under {}", cli.maps.display()).into());
    }

    let mut locator = MapLocator::from_zone_files(zones)?;
    if let Some(path) = &cli.params {
        let text = fs::read_to_string(path)?;
        let params: LocatorParams = serde_json::from_str(&text)?;
        locator = locator.with_params(params);
    }

    for input in &cli.input {
        let frame = load_rgba_image(input)?;
        let view = if cli.full_frame {
            crop_minimap_roi(frame.view())?
        } else {
            frame.view()
        };

        let position = locator.locate(view)?;
        if let (Some(pos), Some(dir)) = (&position, &cli.debug_dir) {
            locator.save_match_context(pos, view.width(), view.height(), dir)?;
        }

        let record = FrameRecord {
            input: input.display().to_string(),
            position,
            lost_tracking: locator.lost_tracking_count(),
        };
        println!("{}", serde_json::to_string(&record)?);
    }

    Ok(())
}
