use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "scene_recon_cli_{label}_{}_{}",
        std::process::id(),
        nanos
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

/// Runs the binary against `workspace` with tool binaries that do not exist,
/// so any attempt to launch an external tool fails loudly.
fn scene_recon(workspace: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_scene-recon"))
        .args(args)
        .env("SCENE_RECON_WORKSPACE", workspace)
        .env("SCENE_RECON_FFMPEG", "/nonexistent/scene-recon/ffmpeg")
        .env("SCENE_RECON_COLMAP", "/nonexistent/scene-recon/colmap")
        .env("SCENE_RECON_GLOMAP", "/nonexistent/scene-recon/glomap")
        .env("RUST_LOG", "info")
        .env("NO_COLOR", "1")
        .output()
        .expect("run scene-recon")
}

fn combined(output: &Output) -> String {
    format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

#[test]
fn help_lists_commands() {
    let ws = unique_temp_dir("help");
    for args in [&["help"][..], &["--help"][..]] {
        let output = scene_recon(&ws, args);
        assert!(
            output.status.success(),
            "{:?} failed: {}",
            args,
            combined(&output)
        );
        let stdout = String::from_utf8_lossy(&output.stdout);
        for command in [
            "extract-frames",
            "extract-features",
            "match-features",
            "reconstruct-incremental",
            "reconstruct-global",
            "full-pipeline",
        ] {
            assert!(stdout.contains(command), "missing {command} in help");
        }
        assert!(stdout.contains("--use-colmap"), "missing --use-colmap");
    }
    fs::remove_dir_all(&ws).ok();
}

#[test]
fn unknown_option_is_a_usage_error() {
    let ws = unique_temp_dir("unknown_option");
    let output = scene_recon(&ws, &["extract-frames", "--turbo"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"), "no usage in stderr: {stderr}");
    assert!(!ws.join("images").exists());
    fs::remove_dir_all(&ws).ok();
}

#[test]
fn unknown_command_is_a_usage_error() {
    let ws = unique_temp_dir("unknown_command");
    let output = scene_recon(&ws, &["dense-reconstruct"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("dense-reconstruct"), "{stderr}");
    assert!(stderr.contains("Usage"), "no usage in stderr: {stderr}");
    assert!(!ws.join("images").exists());
    fs::remove_dir_all(&ws).ok();
}

#[test]
fn zero_fps_is_rejected_at_parse_time() {
    let ws = unique_temp_dir("zero_fps");
    let output = scene_recon(&ws, &["extract-frames", "--fps", "0"]);

    assert_eq!(output.status.code(), Some(1));
    fs::remove_dir_all(&ws).ok();
}

#[test]
fn extract_frames_without_video_fails_cleanly() {
    let ws = unique_temp_dir("no_video");
    let output = scene_recon(&ws, &["extract-frames"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(
        combined(&output).contains("Input video not found"),
        "unexpected output: {}",
        combined(&output)
    );
    assert!(!ws.join("images").exists());
    fs::remove_dir_all(&ws).ok();
}

#[test]
fn extract_frames_skips_populated_images_dir() {
    let ws = unique_temp_dir("skip");
    fs::write(ws.join("input.mp4"), b"video").unwrap();
    fs::create_dir_all(ws.join("images")).unwrap();
    fs::write(ws.join("images").join("frame_000001.jpg"), b"kept").unwrap();

    let output = scene_recon(&ws, &["extract-frames"]);

    assert!(output.status.success(), "{}", combined(&output));
    assert_eq!(
        fs::read(ws.join("images").join("frame_000001.jpg")).unwrap(),
        b"kept"
    );
    assert_eq!(fs::read_dir(ws.join("images")).unwrap().count(), 1);
    fs::remove_dir_all(&ws).ok();
}

#[test]
fn extract_features_without_images_leaves_no_database() {
    let ws = unique_temp_dir("no_images");
    fs::create_dir_all(ws.join("images")).unwrap();

    let output = scene_recon(&ws, &["extract-features"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(combined(&output).contains("extract-frames"));
    assert!(!ws.join("database.db").exists());
    fs::remove_dir_all(&ws).ok();
}

#[test]
fn match_features_without_database_fails() {
    let ws = unique_temp_dir("no_db");
    let output = scene_recon(&ws, &["match-features"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(combined(&output).contains("extract-features"));
    fs::remove_dir_all(&ws).ok();
}

#[test]
fn missing_tool_binary_is_fatal() {
    let ws = unique_temp_dir("no_colmap");
    fs::write(ws.join("database.db"), b"db").unwrap();

    let output = scene_recon(&ws, &["match-features"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(combined(&output).contains("Failed to launch colmap"));
    fs::remove_dir_all(&ws).ok();
}

#[cfg(unix)]
mod fake_tools {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn write_script(path: &Path, body: &str) {
        fs::write(path, format!("#!/bin/sh\n{body}")).unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    /// Shell stand-ins for the external tools. Each appends its name and
    /// subcommand to `calls.log` and writes the files the next stage needs.
    fn install(bin: &Path, log: &Path, colmap_exit: u8) {
        let log = log.display();
        write_script(
            &bin.join("ffmpeg"),
            &format!(
                "echo \"ffmpeg\" >> {log}\n\
                 for last; do :; done\n\
                 dir=$(dirname \"$last\")\n\
                 touch \"$dir/frame_000001.jpg\" \"$dir/frame_000002.jpg\"\n"
            ),
        );
        write_script(
            &bin.join("colmap"),
            &format!(
                "echo \"colmap $1\" >> {log}\n\
                 case \"$1\" in\n\
                 feature_extractor) touch \"$3\" ;;\n\
                 mapper) mkdir -p \"$7/0\" && touch \"$7/0/cameras.bin\" \"$7/0/images.bin\" \"$7/0/points3D.bin\" ;;\n\
                 esac\n\
                 exit {colmap_exit}\n"
            ),
        );
        write_script(
            &bin.join("glomap"),
            &format!(
                "echo \"glomap $1\" >> {log}\n\
                 mkdir -p \"$5/0\" && touch \"$5/0/cameras.bin\" \"$5/0/images.bin\" \"$5/0/points3D.bin\"\n"
            ),
        );
    }

    fn run_with_fakes(ws: &Path, bin: &Path, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_scene-recon"))
            .args(args)
            .env("SCENE_RECON_WORKSPACE", ws)
            .env("SCENE_RECON_FFMPEG", bin.join("ffmpeg"))
            .env("SCENE_RECON_COLMAP", bin.join("colmap"))
            .env("SCENE_RECON_GLOMAP", bin.join("glomap"))
            .output()
            .expect("run scene-recon")
    }

    fn calls(log: &Path) -> Vec<String> {
        fs::read_to_string(log)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn full_pipeline_defaults_to_global_mapper() {
        let ws = unique_temp_dir("fake_global");
        let bin = unique_temp_dir("fake_global_bin");
        let log = ws.join("calls.log");
        install(&bin, &log, 0);
        fs::write(ws.join("input.mp4"), b"video").unwrap();

        let output = run_with_fakes(&ws, &bin, &[]);

        assert!(output.status.success(), "{}", combined(&output));
        assert_eq!(
            calls(&log),
            [
                "ffmpeg",
                "colmap feature_extractor",
                "colmap exhaustive_matcher",
                "glomap mapper"
            ]
        );
        assert!(ws.join("sparse/0/points3D.bin").is_file());
        fs::remove_dir_all(&ws).ok();
        fs::remove_dir_all(&bin).ok();
    }

    #[test]
    fn full_pipeline_use_colmap_runs_incremental_mapper() {
        let ws = unique_temp_dir("fake_incremental");
        let bin = unique_temp_dir("fake_incremental_bin");
        let log = ws.join("calls.log");
        install(&bin, &log, 0);
        fs::write(ws.join("input.mp4"), b"video").unwrap();

        let output = run_with_fakes(&ws, &bin, &["full-pipeline", "--use-colmap"]);

        assert!(output.status.success(), "{}", combined(&output));
        assert_eq!(
            calls(&log),
            [
                "ffmpeg",
                "colmap feature_extractor",
                "colmap exhaustive_matcher",
                "colmap mapper"
            ]
        );
        fs::remove_dir_all(&ws).ok();
        fs::remove_dir_all(&bin).ok();
    }

    #[test]
    fn failing_tool_exit_code_is_propagated() {
        let ws = unique_temp_dir("fake_fail");
        let bin = unique_temp_dir("fake_fail_bin");
        let log = ws.join("calls.log");
        install(&bin, &log, 3);
        fs::write(ws.join("input.mp4"), b"video").unwrap();

        let output = run_with_fakes(&ws, &bin, &["full-pipeline"]);

        assert_eq!(output.status.code(), Some(3), "{}", combined(&output));
        assert_eq!(calls(&log), ["ffmpeg", "colmap feature_extractor"]);
        assert!(!ws.join("sparse").exists());
        fs::remove_dir_all(&ws).ok();
        fs::remove_dir_all(&bin).ok();
    }
}
