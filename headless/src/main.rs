use std::path::PathBuf;

use clap::Parser;
use headless::config_file::{load_config, write_default_config};
use sim::constants::TARGET_FRAMES_PER_SECOND;
use sim::SaltSource;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "shoal.ron")]
    config: PathBuf,

    /// Stop after this many frames; runs until interrupted otherwise.
    #[arg(short, long)]
    frames: Option<u64>,

    #[arg(long, default_value_t = TARGET_FRAMES_PER_SECOND)]
    fps: f64,

    /// Override the configured swimmer count.
    #[arg(short, long)]
    swimmers: Option<usize>,

    /// Use a fixed per-frame salt instead of the wall clock.
    #[arg(long)]
    seed_salt: Option<u32>,

    /// Write the default configuration to `--config` and exit.
    #[arg(long)]
    write_default_config: bool,
}

fn main() {
    let args = Args::parse();

    if args.write_default_config {
        if let Err(err) = write_default_config(&args.config) {
            eprintln!("Could not write {}: {err}", args.config.display());
            std::process::exit(1);
        }
        return;
    }

    if !(args.fps.is_finite() && args.fps > 0.0) {
        eprintln!("Error: fps must be a positive number.");
        eprintln!("Got: {}", args.fps);
        std::process::exit(1);
    }

    let mut config = match load_config(&args.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Could not load {}: {err}", args.config.display());
            std::process::exit(1);
        }
    };

    if let Some(swimmers) = args.swimmers {
        config.school.swimmer_count = swimmers;
    }
    if let Some(salt) = args.seed_salt {
        config.salt = SaltSource::Fixed(salt);
    }

    if headless::init::init(config, args.frames, args.fps).is_error() {
        std::process::exit(1);
    }
}
