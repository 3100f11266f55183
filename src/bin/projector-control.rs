//! Projector control CLI
//!
//! Switches a projector named in the registry on or off.

use std::{path::PathBuf, process::ExitCode, time::Duration};

use clap::{Parser, Subcommand, ValueEnum};
use ents_projector_control::{power, ConnectOptions, PowerOutcome, PowerTarget, ProjectorRegistry, DEFAULT_PORT};
use tracing_subscriber::{fmt, EnvFilter};

/// Projector control
#[derive(Parser, Debug)]
#[command(name = "projector-control")]
#[command(about = "Control projectors listed in the projector registry")]
#[command(version)]
struct Args {
    /// Registry file to use instead of searching the default locations
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Projector control port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Connect, send and receive timeout in seconds (0 waits forever)
    #[arg(short, long, default_value = "5")]
    timeout: u64,

    /// Projector name, as written in the registry (case sensitive)
    projector: String,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Switch the projector on or off
    Power {
        /// Requested state
        state: State,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum State {
    On,
    Off,
}

impl From<State> for PowerTarget {
    fn from(state: State) -> Self {
        match state {
            State::On => PowerTarget::On,
            State::Off => PowerTarget::Off,
        }
    }
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), ents_projector_control::Error> {
    let registry = match &args.config {
        Some(path) => ProjectorRegistry::load(path)?,
        None => ProjectorRegistry::discover(&ProjectorRegistry::default_locations())?,
    };
    let address = registry.address_of(&args.projector)?;

    let timeout = (args.timeout > 0).then(|| Duration::from_secs(args.timeout));
    let options = ConnectOptions::builder()
        .port(args.port)
        .timeout(timeout)
        .build();

    match args.action {
        Action::Power { state } => {
            let target = PowerTarget::from(state);
            tracing::debug!("Switching '{}' ({}) {}", args.projector, address, target);

            match power::switch(address, target, options)? {
                PowerOutcome::AlreadyInState => {
                    tracing::warn!("Projector '{}' is already {}, doing nothing", args.projector, target);
                }
                PowerOutcome::CommandIssued => {
                    tracing::info!("Projector '{}' switched {}", args.projector, target);
                }
            }
        }
    }

    Ok(())
}
