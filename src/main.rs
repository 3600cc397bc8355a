use clap::Parser;
use lightfield_viewer::app::{CliOptions, run_cli};
use lightfield_viewer::io::config::Config;
use log::{error, info};
use std::path::PathBuf;

/// Light-field viewer: loads an OBJ/MTL model and captures it from a grid of cameras.
#[derive(Parser, Debug)]
#[command(name = "lightfield-viewer")]
#[command(version, about)]
struct Cli {
    /// Configuration file (TOML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Model to load, overriding `[scene] obj`.
    #[arg(long, value_name = "FILE")]
    obj: Option<PathBuf>,

    /// Grid rows, overriding `[grid] rows`.
    #[arg(long)]
    rows: Option<usize>,

    /// Grid columns, overriding `[grid] cols`.
    #[arg(long)]
    cols: Option<usize>,

    /// Click the main view at pixel X,Y to select a grid camera.
    #[arg(long, value_name = "X,Y", value_parser = parse_pixel)]
    pick: Option<(usize, usize)>,

    /// Capture every grid camera into a timestamped directory.
    #[arg(long)]
    export: bool,

    /// Save the main view here (the selected view goes next to it).
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Log debug output.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_pixel(value: &str) -> Result<(usize, usize), String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{value}'"))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<usize>()
            .map_err(|e| format!("invalid coordinate '{s}': {e}"))
    };
    Ok((parse(x)?, parse(y)?))
}

fn main() -> Result<(), String> {
    let cli = Cli::parse();

    // RUST_LOG still overrides the level picked here.
    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .parse_default_env()
        .format_timestamp(None)
        .init();

    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from '{}'", path.display());
            Config::load(path).map_err(|e| {
                error!("{}", e);
                e.to_string()
            })?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };

    if let Some(obj) = cli.obj {
        config.scene.obj = Some(obj);
    }
    if let Some(rows) = cli.rows {
        config.grid.rows = rows;
    }
    if let Some(cols) = cli.cols {
        config.grid.cols = cols;
    }

    let options = CliOptions {
        pick: cli.pick,
        export: cli.export,
        output: cli.output,
    };
    run_cli(config, &options).map_err(|e| {
        error!("{}", e);
        e.to_string()
    })
}
