use std::path::{Path, PathBuf};

use beamlight_core::{
    AppConfig, FixedStepClock, FrameOrchestrator, HeadlessDisplay, LightError, LogRenderer,
    ScriptedInput, Size,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

fn main() -> beamlight_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            config,
            script,
            fps,
            duration,
        } => run_simulate(config.as_deref(), script.as_deref(), fps, duration),
        Commands::Bindings { config } => print_bindings(config.as_deref()),
    }
}

fn run_simulate(
    config: Option<&Path>,
    script: Option<&Path>,
    fps: f64,
    duration: f64,
) -> beamlight_core::Result<()> {
    if !(fps.is_finite() && fps > 0.0) {
        return Err(LightError::invalid_config(format!(
            "fps must be positive, got {fps}"
        )));
    }

    let config = load_config(config)?;
    tracing::info!(?script, fps, duration, "starting headless show");

    let mut input = match script {
        Some(path) => ScriptedInput::from_json(&std::fs::read_to_string(path)?, duration)?,
        None => ScriptedInput::new(Vec::new(), duration),
    };
    let mut time = FixedStepClock::from_fps(fps);
    let display = HeadlessDisplay::new(Size::new(1920, 1080));

    let mut show = FrameOrchestrator::new(&config, display, LogRenderer::new());
    show.run(&mut input, &mut time)?;

    let selection = show.selection();
    tracing::info!(
        frames = show.frames(),
        presented = show.display().presented(),
        period = show.beat().estimate_period(),
        pattern = ?selection.active_pattern(),
        mood = ?selection.active_mood(),
        unbound_keys = selection.unrecognized().len(),
        "show finished"
    );
    Ok(())
}

fn print_bindings(config: Option<&Path>) -> beamlight_core::Result<()> {
    let config = load_config(config)?;
    println!("{}", serde_json::to_string_pretty(&config.keys)?);
    Ok(())
}

fn load_config(path: Option<&Path>) -> beamlight_core::Result<AppConfig> {
    match path {
        Some(path) => {
            tracing::info!(?path, "loading configuration");
            AppConfig::load(path)
        }
        None => Ok(AppConfig::default()),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Beat-synced light show driven by tapped tempo",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the show against a headless display on a fixed-step clock.
    Simulate {
        /// JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// JSON input script with timed key presses and holds.
        #[arg(short, long)]
        script: Option<PathBuf>,
        /// Simulated frames per second.
        #[arg(long, default_value_t = 60.0)]
        fps: f64,
        /// Seconds of show time before quitting.
        #[arg(short, long, default_value_t = 10.0)]
        duration: f64,
    },
    /// Print the resolved key table as JSON.
    Bindings {
        /// JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
