// External tool invocations
//
// Every stage describes the work it needs as a typed `ToolInvocation` and hands
// it to a `ToolRunner`. `SystemTools` turns invocations into processes; tests
// substitute a recording runner.

pub mod colmap;
pub mod ffmpeg;
pub mod glomap;

use crate::hardware::DecodeStrategy;
use crate::pipeline::error::PipelineError;
use crate::run_context::ToolPaths;
use anyhow::Result;
use std::path::PathBuf;
use std::process::Command;

pub use colmap::Colmap;
pub use ffmpeg::Ffmpeg;
pub use glomap::Glomap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolInvocation {
    ExtractFrames {
        video: PathBuf,
        images_dir: PathBuf,
        fps: u32,
        decode: DecodeStrategy,
    },
    ExtractFeatures {
        database: PathBuf,
        images_dir: PathBuf,
    },
    MatchFeatures {
        database: PathBuf,
    },
    MapIncremental {
        database: PathBuf,
        images_dir: PathBuf,
        output_dir: PathBuf,
    },
    MapGlobal {
        database: PathBuf,
        output_dir: PathBuf,
    },
}

impl ToolInvocation {
    /// Short name of the external program that serves this invocation.
    pub fn tool(&self) -> &'static str {
        match self {
            ToolInvocation::ExtractFrames { .. } => "ffmpeg",
            ToolInvocation::ExtractFeatures { .. }
            | ToolInvocation::MatchFeatures { .. }
            | ToolInvocation::MapIncremental { .. } => "colmap",
            ToolInvocation::MapGlobal { .. } => "glomap",
        }
    }

    /// Pipeline step name used in logs and errors.
    pub fn step(&self) -> &'static str {
        match self {
            ToolInvocation::ExtractFrames { .. } => "frame extraction",
            ToolInvocation::ExtractFeatures { .. } => "feature extraction",
            ToolInvocation::MatchFeatures { .. } => "feature matching",
            ToolInvocation::MapIncremental { .. } => "incremental reconstruction",
            ToolInvocation::MapGlobal { .. } => "global reconstruction",
        }
    }
}

/// Result of one external tool run. Output goes straight to the console,
/// so only the exit status is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolOutcome {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
}

#[cfg(test)]
impl ToolOutcome {
    pub fn success() -> Self {
        Self { code: Some(0) }
    }

    pub fn failed(code: i32) -> Self {
        Self { code: Some(code) }
    }
}

impl ToolOutcome {
    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn failure(&self, invocation: &ToolInvocation) -> PipelineError {
        PipelineError::ToolFailed {
            tool: invocation.tool(),
            step: invocation.step(),
            code: self.code,
        }
    }

    /// Turns a non-zero exit into a fatal `ToolFailed` error.
    pub fn require_success(self, invocation: &ToolInvocation) -> Result<(), PipelineError> {
        if self.is_success() {
            Ok(())
        } else {
            Err(self.failure(invocation))
        }
    }
}

/// Runs external tool invocations, blocking until each finishes.
pub trait ToolRunner {
    fn run(&mut self, invocation: &ToolInvocation) -> Result<ToolOutcome>;
}

/// Process-backed runner for the real ffmpeg, colmap and glomap binaries.
pub struct SystemTools {
    ffmpeg: Ffmpeg,
    colmap: Colmap,
    glomap: Glomap,
}

impl SystemTools {
    pub fn new(paths: &ToolPaths) -> Self {
        Self {
            ffmpeg: Ffmpeg::new(&paths.ffmpeg),
            colmap: Colmap::new(&paths.colmap),
            glomap: Glomap::new(&paths.glomap),
        }
    }

    fn command(&self, invocation: &ToolInvocation) -> Command {
        match invocation {
            ToolInvocation::ExtractFrames {
                video,
                images_dir,
                fps,
                decode,
            } => self.ffmpeg.extract_frames(video, images_dir, *fps, *decode),
            ToolInvocation::ExtractFeatures {
                database,
                images_dir,
            } => self.colmap.feature_extractor(database, images_dir),
            ToolInvocation::MatchFeatures { database } => self.colmap.exhaustive_matcher(database),
            ToolInvocation::MapIncremental {
                database,
                images_dir,
                output_dir,
            } => self.colmap.mapper(database, images_dir, output_dir),
            ToolInvocation::MapGlobal {
                database,
                output_dir,
            } => self.glomap.mapper(database, output_dir),
        }
    }
}

impl ToolRunner for SystemTools {
    fn run(&mut self, invocation: &ToolInvocation) -> Result<ToolOutcome> {
        let mut cmd = self.command(invocation);
        tracing::info!("Running {}: {}", invocation.step(), describe(&cmd));

        let status = cmd.status().map_err(|source| PipelineError::ToolSpawn {
            tool: invocation.tool(),
            program: cmd.get_program().to_string_lossy().to_string(),
            source,
        })?;

        Ok(ToolOutcome {
            code: status.code(),
        })
    }
}

/// Renders a command as a single shell-like line for logging.
pub fn describe(cmd: &Command) -> String {
    let mut line = cmd.get_program().to_string_lossy().to_string();
    for arg in cmd.get_args() {
        line.push(' ');
        line.push_str(&arg.to_string_lossy());
    }
    line
}

/// Collects a command's arguments, for assertions.
#[cfg(test)]
pub(crate) fn args_of(cmd: &Command) -> Vec<String> {
    cmd.get_args()
        .map(|a| a.to_string_lossy().to_string())
        .collect()
}
