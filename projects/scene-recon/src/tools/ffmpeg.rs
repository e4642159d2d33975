use crate::hardware::{DecodeStrategy, VAAPI_RENDER_NODE};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Output naming shared by every decode path.
pub const FRAME_PATTERN: &str = "frame_%06d.jpg";

/// JPEG quality scale passed to `-q:v` (2 is near-lossless).
pub const JPEG_QUALITY: u32 = 2;

pub struct Ffmpeg {
    program: PathBuf,
}

impl Ffmpeg {
    pub fn new(program: &Path) -> Self {
        Self {
            program: program.to_path_buf(),
        }
    }

    /// Samples `fps` frames per second from `video` into numbered JPEGs.
    /// Only the decode arguments differ between strategies.
    pub fn extract_frames(
        &self,
        video: &Path,
        images_dir: &Path,
        fps: u32,
        decode: DecodeStrategy,
    ) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-hide_banner").arg("-y");

        match decode {
            DecodeStrategy::Cuda => {
                cmd.arg("-hwaccel").arg("cuda");
            }
            DecodeStrategy::Vaapi => {
                cmd.arg("-hwaccel")
                    .arg("vaapi")
                    .arg("-hwaccel_device")
                    .arg(VAAPI_RENDER_NODE);
            }
            DecodeStrategy::Cpu => {}
        }

        cmd.arg("-i")
            .arg(video)
            .arg("-vf")
            .arg(format!("fps={}", fps))
            .arg("-q:v")
            .arg(JPEG_QUALITY.to_string())
            .arg(images_dir.join(FRAME_PATTERN));
        cmd
    }
}
