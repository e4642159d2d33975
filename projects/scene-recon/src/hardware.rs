// Hardware capability probe
//
// Classifies the host by looking for the NVIDIA management utility on PATH,
// then for the AMD kernel fusion driver node. Only used to choose how ffmpeg
// decodes; colmap and glomap pick their own acceleration.

use std::ffi::OsStr;
use std::fmt;
use std::path::Path;

const NVIDIA_SMI: &str = "nvidia-smi";
const AMD_DEVICE_NODE: &str = "/dev/kfd";

/// Render node handed to ffmpeg for VAAPI decoding.
pub const VAAPI_RENDER_NODE: &str = "/dev/dri/renderD128";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accelerator {
    Nvidia,
    Amd,
    Cpu,
}

impl fmt::Display for Accelerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Accelerator::Nvidia => "NVIDIA GPU (CUDA)",
            Accelerator::Amd => "AMD GPU (VAAPI)",
            Accelerator::Cpu => "no GPU, CPU only",
        };
        f.write_str(s)
    }
}

/// How ffmpeg should decode the input video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStrategy {
    Cuda,
    Vaapi,
    Cpu,
}

impl DecodeStrategy {
    pub fn is_accelerated(self) -> bool {
        !matches!(self, DecodeStrategy::Cpu)
    }
}

impl fmt::Display for DecodeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DecodeStrategy::Cuda => "CUDA",
            DecodeStrategy::Vaapi => "VAAPI",
            DecodeStrategy::Cpu => "CPU",
        };
        f.write_str(s)
    }
}

/// Probes the current host.
pub fn detect() -> Accelerator {
    let path_var = std::env::var_os("PATH");
    detect_with(path_var.as_deref(), Path::new(AMD_DEVICE_NODE))
}

/// Probes against an explicit `PATH` value and AMD device node.
pub fn detect_with(path_var: Option<&OsStr>, amd_node: &Path) -> Accelerator {
    if path_var.is_some_and(|p| find_in_path(p, NVIDIA_SMI)) {
        Accelerator::Nvidia
    } else if amd_node.exists() {
        Accelerator::Amd
    } else {
        Accelerator::Cpu
    }
}

fn find_in_path(path_var: &OsStr, program: &str) -> bool {
    std::env::split_paths(path_var).any(|dir| dir.join(program).is_file())
}

/// Decode attempts in priority order. Always ends with the CPU path.
pub fn decode_strategies(accelerator: Accelerator) -> Vec<DecodeStrategy> {
    match accelerator {
        Accelerator::Nvidia => vec![DecodeStrategy::Cuda, DecodeStrategy::Cpu],
        Accelerator::Amd => vec![DecodeStrategy::Vaapi, DecodeStrategy::Cpu],
        Accelerator::Cpu => vec![DecodeStrategy::Cpu],
    }
}
