// Pipeline orchestrator: dispatches a command to its stage handlers
//
// Stages run strictly in sequence and the first fatal error stops the run.
// The hardware class is detected once by the caller and passed in.

use crate::cli::{Args, Command};
use crate::hardware::Accelerator;
use crate::pipeline::stages::{self, ModelReport};
use crate::run_context::{ReconstructionEngine, RunConfig};
use crate::tools::ToolRunner;
use anyhow::Result;
use tracing::info;

fn log_banner(config: &RunConfig, accelerator: Accelerator) {
    info!("=== Scene reconstruction pipeline ===");
    info!("Workspace:      {:?}", config.workspace());
    info!("Input video:    {:?}", config.video_path());
    info!("Frame rate:     {} fps", config.fps());
    info!("Engine:         {}", config.engine().label());
    info!("Hardware:       {}", accelerator);
}

/// Runs every stage in order, then checks the model files.
/// A missing model only produces a warning in the returned report.
pub fn run_full_pipeline(
    config: &RunConfig,
    accelerator: Accelerator,
    runner: &mut dyn ToolRunner,
) -> Result<ModelReport> {
    log_banner(config, accelerator);

    info!("[1/4] Frame extraction");
    let frames = stages::extract_frames(config, accelerator, runner)?;

    info!("[2/4] Feature extraction");
    stages::extract_features(config, runner)?;

    info!("[3/4] Feature matching");
    stages::match_features(config, runner)?;

    info!("[4/4] Reconstruction");
    stages::reconstruct(config, config.engine(), runner)?;

    let report = stages::verify_model(config);
    info!("Pipeline finished ({} frames)", frames.frame_count());
    Ok(report)
}

/// Executes one command against an already resolved configuration.
pub fn run_command(
    command: Command,
    config: &RunConfig,
    accelerator: Accelerator,
    runner: &mut dyn ToolRunner,
) -> Result<()> {
    match command {
        Command::ExtractFrames => {
            info!("Hardware: {}", accelerator);
            stages::extract_frames(config, accelerator, runner)?;
        }
        Command::ExtractFeatures => stages::extract_features(config, runner)?,
        Command::MatchFeatures => stages::match_features(config, runner)?,
        Command::ReconstructIncremental => {
            stages::reconstruct(config, ReconstructionEngine::Incremental, runner)?;
            stages::verify_model(config);
        }
        Command::ReconstructGlobal => {
            stages::reconstruct(config, ReconstructionEngine::Global, runner)?;
            stages::verify_model(config);
        }
        Command::FullPipeline => {
            run_full_pipeline(config, accelerator, runner)?;
        }
        Command::Help => Args::print_help(),
    }
    Ok(())
}
