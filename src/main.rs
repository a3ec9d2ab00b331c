//! pantilt - Pan/Tilt Gimbal Gesture & Tracking Control
//!
//! Main entry point for the CLI application. Runs one operation against a
//! simulated gimbal, or replays a recorded detection stream through the
//! tracking controller.

use clap::{Parser, Subcommand};
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pantilt::{
    config::Config,
    servo::{CancelToken, Gimbal, SimulatedServo},
    tracking::{Detection, TrackingController},
    Gesture, GestureEngine,
};

/// pantilt - Gesture and tracking control for a pan/tilt servo gimbal
#[derive(Parser, Debug)]
#[command(name = "pantilt", version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Return to the home position
    Home,
    /// Nod the tilt axis
    Nod {
        /// Number of up-down cycles (overrides config)
        #[arg(long)]
        repeats: Option<u32>,
    },
    /// Sweep the pan axis at a fixed tilt
    Scan {
        /// Number of left-right-left cycles (overrides config)
        #[arg(long)]
        sweeps: Option<u32>,
    },
    /// Full search pattern across the tilt stations
    Search,
    /// Move to a specific pan/tilt angle
    #[command(allow_negative_numbers = true)]
    Move {
        pan: f64,
        tilt: f64,
        /// Duration of the move in milliseconds
        #[arg(long, default_value_t = 500)]
        duration_ms: u64,
    },
    /// Replay detections ("none", "x y" or "x y w h" per line) through the controller
    Track {
        /// Detection file; reads stdin when omitted
        input: Option<PathBuf>,
        /// Pause between frames in milliseconds
        #[arg(long, default_value_t = 100)]
        frame_ms: u64,
    },
    /// Print the current pan/tilt position
    Position,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    info!("Starting {} v{}", pantilt::NAME, pantilt::VERSION);

    let mut config = if let Some(ref path) = args.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    match &args.command {
        Command::Nod { repeats: Some(repeats) } => config.gestures.nod.repeats = *repeats,
        Command::Scan { sweeps: Some(sweeps) } => config.gestures.scan.sweeps = *sweeps,
        _ => {}
    }

    config.validate()?;

    let gimbal = Arc::new(Gimbal::new(
        &config.gimbal,
        Box::new(SimulatedServo::new("pan")),
        Box::new(SimulatedServo::new("tilt")),
    ));
    let engine = Arc::new(GestureEngine::new(Arc::clone(&gimbal), config.gestures.clone()));

    let completed = match args.command {
        Command::Home => engine.run(Gesture::Home),
        Command::Nod { .. } => engine.run(engine.nod()),
        Command::Scan { .. } => engine.run(engine.scan()),
        Command::Search => engine.run(engine.search()),
        Command::Move {
            pan,
            tilt,
            duration_ms,
        } => {
            info!("Moving to pan {} tilt {}", pan, tilt);
            gimbal.move_for(pan, tilt, Duration::from_millis(duration_ms), &CancelToken::new())
        }
        Command::Track { input, frame_ms } => {
            let mut controller = TrackingController::new(Arc::clone(&engine), config.tracking.clone());
            let result = replay(&mut controller, input, Duration::from_millis(frame_ms));
            controller.shutdown();
            result?;
            true
        }
        Command::Position => true,
    };

    if !completed {
        warn!("Operation was interrupted");
    }

    let position = gimbal.position();
    info!("Position: pan {:.2} tilt {:.2}", position.pan, position.tilt);
    Ok(())
}

/// Feed every detection line through the controller at the given frame rate
fn replay(
    controller: &mut TrackingController,
    input: Option<PathBuf>,
    frame: Duration,
) -> anyhow::Result<()> {
    let reader: Box<dyn BufRead> = match input {
        Some(path) => Box::new(BufReader::new(std::fs::File::open(&path).map_err(|e| {
            anyhow::anyhow!("Failed to open {}: {}", path.display(), e)
        })?)),
        None => Box::new(BufReader::new(std::io::stdin())),
    };

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let Some(detection) = Detection::parse_line(index + 1, &line)? else {
            continue;
        };

        let action = controller.on_observation(detection.target());
        info!("Frame {}: {:?} -> {:?}", index + 1, detection, action);
        std::thread::sleep(frame);
    }

    Ok(())
}
