//! Command line interface.
//!
//! The in-tree backend is the simulated controller with a file-fed camera;
//! vendor transports integrate by providing their own `ChannelProvider` and
//! `FrameSource` to the runtime.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use blockpick_config::{load_config, ExecutionConfig};
use blockpick_core::Program;
use blockpick_driver::probe_endpoint;
use blockpick_driver::sim::SimProvider;
use blockpick_runtime::{ExecutionRequest, ProgramExecutor};
use blockpick_stores::InMemoryLibrary;
use blockpick_vision::StaticFrameSource;

#[derive(Debug, Parser)]
#[command(
    name = "blockpick",
    about = "Execute block programs against a pick-and-place cobot",
    version
)]
pub struct Cli {
    /// Execution config YAML. The calibrated defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a program against the simulated backend.
    Run(RunArgs),
    /// Validate a program tree without touching hardware.
    Validate {
        /// Program tree JSON file.
        #[arg(long)]
        program: PathBuf,
    },
    /// Probe controller reachability.
    Probe,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Program tree JSON file.
    #[arg(long)]
    program: PathBuf,

    /// Library fixture JSON file.
    #[arg(long)]
    library: PathBuf,

    /// Acknowledge Sensor/Human conditions for this run.
    #[arg(long)]
    acknowledge: bool,

    /// Directory of camera frames the simulated camera plays in name order.
    #[arg(long)]
    frames: Option<PathBuf>,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        init_tracing();

        let config = match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => ExecutionConfig::default(),
        };

        match self.command {
            Command::Run(args) => run_program(args, config).await,
            Command::Validate { program } => validate_program(&program),
            Command::Probe => probe(&config).await,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run_program(args: RunArgs, config: ExecutionConfig) -> anyhow::Result<()> {
    let program = load_program(&args.program)?;
    let library = InMemoryLibrary::from_file(&args.library)
        .with_context(|| format!("loading library from {}", args.library.display()))?;
    let frames = load_frames(args.frames.as_deref(), &config)?;

    let mut executor = ProgramExecutor::new(SimProvider::new(), frames, library, config);
    let request = ExecutionRequest::new(program).with_acknowledge(args.acknowledge);
    match executor.execute(&request).await {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(err) => {
            // Internal faults stay out of the report surface.
            tracing::error!(error = %err, "execution fault");
            anyhow::bail!("execution failed");
        }
    }
}

fn validate_program(path: &Path) -> anyhow::Result<()> {
    let program = load_program(path)?;
    program
        .validate()
        .map_err(|reason| anyhow::anyhow!("program is malformed: {reason}"))?;
    println!("program '{}' is valid", program.task_id);
    Ok(())
}

async fn probe(config: &ExecutionConfig) -> anyhow::Result<()> {
    let endpoint = config.robot.endpoint();
    probe_endpoint(&endpoint)
        .await
        .map_err(|_| anyhow::anyhow!("robot not reachable at {}", endpoint.authority()))?;
    println!("robot reachable at {}", endpoint.authority());
    Ok(())
}

fn load_program(path: &Path) -> anyhow::Result<Program> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading program from {}", path.display()))?;
    serde_json::from_str(&content).context("parsing program tree")
}

/// Load the simulated camera roll: every image in the directory, played in
/// name order. Exhausted frames fall back to black, which never matches.
fn load_frames(dir: Option<&Path>, config: &ExecutionConfig) -> anyhow::Result<StaticFrameSource> {
    let fallback = (
        config.calibration.frame_width,
        config.calibration.frame_height,
    );
    let Some(dir) = dir else {
        return Ok(StaticFrameSource::new(Vec::new(), fallback));
    };

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("reading frames from {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            matches!(
                path.extension().and_then(|ext| ext.to_str()),
                Some("png" | "jpg" | "jpeg")
            )
        })
        .collect();
    paths.sort();

    let mut frames = Vec::with_capacity(paths.len());
    for path in paths {
        let frame = image::open(&path)
            .with_context(|| format!("decoding frame {}", path.display()))?
            .to_luma8();
        frames.push(frame);
    }
    Ok(StaticFrameSource::new(frames, fallback))
}
