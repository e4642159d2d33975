use std::path::{Path, PathBuf};
use std::process::Command;

/// Every frame comes from the same physical camera.
const CAMERA_MODEL: &str = "SIMPLE_RADIAL";

/// Forces Qt onto its offscreen platform. colmap otherwise tries to open an
/// OpenGL context for SIFT, which crashes on headless hosts; CUDA builds still
/// pick the GPU on their own.
const HEADLESS_ENV: (&str, &str) = ("QT_QPA_PLATFORM", "offscreen");

pub struct Colmap {
    program: PathBuf,
}

impl Colmap {
    pub fn new(program: &Path) -> Self {
        Self {
            program: program.to_path_buf(),
        }
    }

    fn headless(&self, subcommand: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(subcommand).env(HEADLESS_ENV.0, HEADLESS_ENV.1);
        cmd
    }

    pub fn feature_extractor(&self, database: &Path, images_dir: &Path) -> Command {
        let mut cmd = self.headless("feature_extractor");
        cmd.arg("--database_path")
            .arg(database)
            .arg("--image_path")
            .arg(images_dir)
            .arg("--ImageReader.camera_model")
            .arg(CAMERA_MODEL)
            .arg("--ImageReader.single_camera")
            .arg("1");
        cmd
    }

    pub fn exhaustive_matcher(&self, database: &Path) -> Command {
        let mut cmd = self.headless("exhaustive_matcher");
        cmd.arg("--database_path").arg(database);
        cmd
    }

    /// Incremental mapper.
    pub fn mapper(&self, database: &Path, images_dir: &Path, output_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("mapper")
            .arg("--database_path")
            .arg(database)
            .arg("--image_path")
            .arg(images_dir)
            .arg("--output_path")
            .arg(output_dir);
        cmd
    }
}
