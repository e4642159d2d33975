use std::path::PathBuf;
use thiserror::Error;

/// Fatal pipeline conditions.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Input video not found at {0:?}. Place the video there or pass --input <file>")]
    MissingVideo(PathBuf),

    #[error("No images found in {0:?}. Run `extract-frames` first")]
    NoImages(PathBuf),

    #[error("Database not found at {0:?}. Run `extract-features` first")]
    MissingDatabase(PathBuf),

    #[error("{tool} failed during {step} ({})", describe_code(.code))]
    ToolFailed {
        tool: &'static str,
        step: &'static str,
        code: Option<i32>,
    },

    #[error("Failed to launch {tool} ({program}): {source}")]
    ToolSpawn {
        tool: &'static str,
        program: String,
        #[source]
        source: std::io::Error,
    },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {}", c),
        None => "terminated by signal".to_string(),
    }
}

impl PipelineError {
    /// Process exit status for this failure. Tool failures pass the tool's
    /// own code through.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::ToolFailed {
                code: Some(c), ..
            } if *c != 0 => *c,
            _ => 1,
        }
    }
}

/// Exit status for any error bubbling out of the pipeline.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<PipelineError>()
        .map(PipelineError::exit_code)
        .unwrap_or(1)
}
