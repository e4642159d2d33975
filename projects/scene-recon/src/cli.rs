use clap::{CommandFactory, Parser, ValueEnum};
use std::path::PathBuf;

/// Pipeline step to run. Each step can be invoked on its own.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Command {
    /// Sample still frames from the input video into images/
    ExtractFrames,
    /// Detect features for every image into database.db
    ExtractFeatures,
    /// Exhaustively match features across all image pairs
    MatchFeatures,
    /// Sparse reconstruction with the incremental engine (colmap)
    ReconstructIncremental,
    /// Sparse reconstruction with the global engine (glomap)
    ReconstructGlobal,
    /// Run every step in order
    #[default]
    FullPipeline,
    /// Print this help
    Help,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Reconstruct a sparse 3D scene from a video", long_about = None)]
pub struct Args {
    /// Step to run
    #[arg(value_enum, default_value_t = Command::FullPipeline)]
    pub command: Command,

    /// Frames per second to sample from the video
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..))]
    pub fps: u32,

    /// Input video, relative to the workspace unless absolute
    #[arg(long, default_value = "input.mp4")]
    pub input: PathBuf,

    /// Use the incremental colmap mapper instead of the global glomap mapper
    #[arg(long)]
    pub use_colmap: bool,

    /// Re-extract frames even if images/ is already populated
    #[arg(long)]
    pub force: bool,

    /// Root directory holding the video and all pipeline outputs
    #[arg(long, env = "SCENE_RECON_WORKSPACE", default_value = ".")]
    pub workspace: PathBuf,

    /// ffmpeg executable
    #[arg(long, env = "SCENE_RECON_FFMPEG", default_value = "ffmpeg")]
    pub ffmpeg_bin: PathBuf,

    /// colmap executable
    #[arg(long, env = "SCENE_RECON_COLMAP", default_value = "colmap")]
    pub colmap_bin: PathBuf,

    /// glomap executable
    #[arg(long, env = "SCENE_RECON_GLOMAP", default_value = "glomap")]
    pub glomap_bin: PathBuf,
}

impl Args {
    /// Parses the process arguments. Usage errors exit with status 1,
    /// `--help`/`--version` print to stdout and exit 0.
    pub fn parse_args() -> Self {
        match Self::try_parse() {
            Ok(args) => args,
            Err(e) => {
                // Nothing useful to do if the terminal is gone.
                let _ = e.print();
                if !e.use_stderr() {
                    std::process::exit(0);
                }
                // Invalid values are reported without a usage line.
                if !e.render().to_string().contains("Usage:") {
                    eprintln!("\n{}", Self::command().render_usage());
                }
                std::process::exit(1);
            }
        }
    }

    pub fn print_help() {
        let _ = Self::command().print_long_help();
        println!();
    }
}
