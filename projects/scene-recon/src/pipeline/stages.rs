// Stage handlers
//
// Each handler checks its prerequisites against the workspace, then hands a
// typed invocation to the runner. Any non-zero exit is fatal, except for a
// failed accelerated decode during frame extraction, which falls back to the
// next decode strategy.

use crate::hardware::{decode_strategies, Accelerator, DecodeStrategy};
use crate::pipeline::error::PipelineError;
use crate::run_context::{
    has_images, list_images, remove_images, ReconstructionEngine, RunConfig, MODEL_FILES,
};
use crate::tools::{ToolInvocation, ToolRunner};
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameExtraction {
    /// images/ was already populated and `--force` was not given.
    Skipped { existing: usize },
    Extracted {
        frames: usize,
        decode: DecodeStrategy,
    },
}

impl FrameExtraction {
    /// Frames available in images/ after the stage.
    pub fn frame_count(&self) -> usize {
        match *self {
            FrameExtraction::Skipped { existing } => existing,
            FrameExtraction::Extracted { frames, .. } => frames,
        }
    }
}

/// Whether frame extraction has already produced its output.
pub fn frames_already_extracted(config: &RunConfig) -> bool {
    has_images(config.images_dir())
}

pub fn require_video(config: &RunConfig) -> Result<(), PipelineError> {
    if config.video_path().is_file() {
        Ok(())
    } else {
        Err(PipelineError::MissingVideo(config.video_path().to_path_buf()))
    }
}

pub fn require_images(config: &RunConfig) -> Result<(), PipelineError> {
    if has_images(config.images_dir()) {
        Ok(())
    } else {
        Err(PipelineError::NoImages(config.images_dir().to_path_buf()))
    }
}

pub fn require_database(config: &RunConfig) -> Result<(), PipelineError> {
    if config.database_path().is_file() {
        Ok(())
    } else {
        Err(PipelineError::MissingDatabase(
            config.database_path().to_path_buf(),
        ))
    }
}

pub fn extract_frames(
    config: &RunConfig,
    accelerator: Accelerator,
    runner: &mut dyn ToolRunner,
) -> Result<FrameExtraction> {
    require_video(config)?;

    let images_dir = config.images_dir();
    if frames_already_extracted(config) {
        if !config.force() {
            let existing = list_images(images_dir).len();
            info!(
                "Frames already extracted ({} images in {:?}), skipping. Use --force to re-extract",
                existing, images_dir
            );
            return Ok(FrameExtraction::Skipped { existing });
        }
        let removed = remove_images(images_dir)?;
        info!("Removed {} previously extracted frames", removed);
    }

    fs::create_dir_all(images_dir)
        .with_context(|| format!("Failed to create images directory {:?}", images_dir))?;

    info!(
        "Extracting frames from {:?} at {} fps",
        config.video_path(),
        config.fps()
    );

    let mut last_failure = None;
    for decode in decode_strategies(accelerator) {
        let invocation = ToolInvocation::ExtractFrames {
            video: config.video_path().to_path_buf(),
            images_dir: images_dir.to_path_buf(),
            fps: config.fps(),
            decode,
        };
        let outcome = runner.run(&invocation)?;

        if outcome.is_success() {
            let frames = list_images(images_dir).len();
            info!("Extracted {} frames ({} decode)", frames, decode);
            return Ok(FrameExtraction::Extracted { frames, decode });
        }

        if decode.is_accelerated() {
            warn!(
                "{} decoding failed (exit code {:?}), falling back to CPU",
                decode, outcome.code
            );
            // A failed attempt may have written some frames already.
            remove_images(images_dir)?;
        }
        last_failure = Some(outcome.failure(&invocation));
    }

    match last_failure {
        Some(err) => Err(err.into()),
        None => anyhow::bail!("No decode strategy available"),
    }
}

pub fn extract_features(config: &RunConfig, runner: &mut dyn ToolRunner) -> Result<()> {
    require_images(config)?;

    info!(
        "Extracting features for {} images into {:?}",
        list_images(config.images_dir()).len(),
        config.database_path()
    );
    let invocation = ToolInvocation::ExtractFeatures {
        database: config.database_path().to_path_buf(),
        images_dir: config.images_dir().to_path_buf(),
    };
    runner.run(&invocation)?.require_success(&invocation)?;
    Ok(())
}

pub fn match_features(config: &RunConfig, runner: &mut dyn ToolRunner) -> Result<()> {
    require_database(config)?;

    info!("Matching features exhaustively");
    let invocation = ToolInvocation::MatchFeatures {
        database: config.database_path().to_path_buf(),
    };
    runner.run(&invocation)?.require_success(&invocation)?;
    Ok(())
}

pub fn reconstruct(
    config: &RunConfig,
    engine: ReconstructionEngine,
    runner: &mut dyn ToolRunner,
) -> Result<()> {
    let output_dir = config.sparse_dir();
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;

    info!("Reconstructing with the {} engine", engine.label());
    let invocation = match engine {
        ReconstructionEngine::Incremental => ToolInvocation::MapIncremental {
            database: config.database_path().to_path_buf(),
            images_dir: config.images_dir().to_path_buf(),
            output_dir: output_dir.to_path_buf(),
        },
        ReconstructionEngine::Global => ToolInvocation::MapGlobal {
            database: config.database_path().to_path_buf(),
            output_dir: output_dir.to_path_buf(),
        },
    };
    runner.run(&invocation)?.require_success(&invocation)?;
    Ok(())
}

/// Presence check of the first reconstructed model's files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReport {
    pub model_dir: PathBuf,
    pub missing: Vec<&'static str>,
}

impl ModelReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

pub fn inspect_model(config: &RunConfig) -> ModelReport {
    let model_dir = config.model_dir(0);
    let missing = MODEL_FILES
        .into_iter()
        .filter(|name| !model_dir.join(name).is_file())
        .collect();
    ModelReport { model_dir, missing }
}

/// Logs whether the mapper left a complete model behind. Never fails.
pub fn verify_model(config: &RunConfig) -> ModelReport {
    let report = inspect_model(config);
    if report.is_complete() {
        info!("Reconstruction written to {:?}", report.model_dir);
    } else {
        warn!(
            "Reconstruction finished but {:?} is missing {}",
            report.model_dir,
            report.missing.join(", ")
        );
    }
    report
}
