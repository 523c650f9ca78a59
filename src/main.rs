use std::path::PathBuf;

use anyhow::Context;
use blank_solar_map::{BlankMapConfig, BlankMapScene};
use clap::Parser;
use tracing::info;

mod log_setup;

use crate::log_setup::setup_logging;

/// Plot positions on a blank solar map.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Where to write the PNG.
    #[arg(short, long, default_value = "blank_map.png")]
    output: PathBuf,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    setup_logging(&args.log_level).context("failed to initialise logging")?;

    let config = BlankMapConfig::default();
    let scene = BlankMapScene::build(&config).context("failed to build blank map")?;

    for (mark, pixel) in scene.marks().iter().zip(scene.marked_pixels()) {
        match pixel {
            Some((x, y)) => info!(tx = mark.tx(), ty = mark.ty(), x, y, "marked"),
            None => info!(tx = mark.tx(), ty = mark.ty(), "outside the map"),
        }
    }

    scene
        .save_png(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    Ok(())
}
