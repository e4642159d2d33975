use crate::cli::Args;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const DATABASE_NAME: &str = "database.db";
pub const IMAGES_DIR_NAME: &str = "images";
pub const SPARSE_DIR_NAME: &str = "sparse";

/// Files a finished sparse model must contain.
pub const MODEL_FILES: [&str; 3] = ["cameras.bin", "images.bin", "points3D.bin"];

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconstructionEngine {
    /// colmap mapper, image by image
    Incremental,
    /// glomap mapper, all images at once
    Global,
}

impl ReconstructionEngine {
    pub fn label(self) -> &'static str {
        match self {
            ReconstructionEngine::Incremental => "incremental (colmap)",
            ReconstructionEngine::Global => "global (glomap)",
        }
    }
}

/// Executables for the wrapped tools.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub colmap: PathBuf,
    pub glomap: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            colmap: PathBuf::from("colmap"),
            glomap: PathBuf::from("glomap"),
        }
    }
}

/// Fully resolved settings for one invocation. Built once, read-only afterwards.
#[derive(Debug, Clone)]
pub struct RunConfig {
    workspace: PathBuf,
    video_path: PathBuf,
    database_path: PathBuf,
    images_dir: PathBuf,
    sparse_dir: PathBuf,
    fps: u32,
    engine: ReconstructionEngine,
    force: bool,
    tools: ToolPaths,
}

impl RunConfig {
    pub fn new(
        workspace: impl Into<PathBuf>,
        input: &Path,
        fps: u32,
        engine: ReconstructionEngine,
        force: bool,
        tools: ToolPaths,
    ) -> Self {
        let workspace = workspace.into();
        Self {
            video_path: workspace.join(input),
            database_path: workspace.join(DATABASE_NAME),
            images_dir: workspace.join(IMAGES_DIR_NAME),
            sparse_dir: workspace.join(SPARSE_DIR_NAME),
            workspace,
            fps,
            engine,
            force,
            tools,
        }
    }

    pub fn from_args(args: &Args) -> Self {
        let engine = if args.use_colmap {
            ReconstructionEngine::Incremental
        } else {
            ReconstructionEngine::Global
        };
        let tools = ToolPaths {
            ffmpeg: args.ffmpeg_bin.clone(),
            colmap: args.colmap_bin.clone(),
            glomap: args.glomap_bin.clone(),
        };
        Self::new(
            args.workspace.clone(),
            &args.input,
            args.fps,
            engine,
            args.force,
            tools,
        )
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn video_path(&self) -> &Path {
        &self.video_path
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    pub fn sparse_dir(&self) -> &Path {
        &self.sparse_dir
    }

    /// Numbered model directory the mappers write into, e.g. `sparse/0`.
    pub fn model_dir(&self, index: usize) -> PathBuf {
        self.sparse_dir.join(index.to_string())
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn engine(&self) -> ReconstructionEngine {
        self.engine
    }

    pub fn force(&self) -> bool {
        self.force
    }

    pub fn tools(&self) -> &ToolPaths {
        &self.tools
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| {
            let ext = s.to_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Image files directly inside `dir`, sorted. A missing directory has none.
pub fn list_images(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }

    let mut images: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| is_image(e.path()))
        .map(|e| e.path().to_path_buf())
        .collect();
    images.sort();
    images
}

pub fn has_images(dir: &Path) -> bool {
    !list_images(dir).is_empty()
}

/// Deletes every image file in `dir`, leaving anything else alone.
/// Returns how many files were removed.
pub fn remove_images(dir: &Path) -> Result<usize> {
    let images = list_images(dir);
    for path in &images {
        fs::remove_file(path).with_context(|| format!("Failed to remove {:?}", path))?;
    }
    Ok(images.len())
}
