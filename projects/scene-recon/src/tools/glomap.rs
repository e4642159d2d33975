use std::path::{Path, PathBuf};
use std::process::Command;

pub struct Glomap {
    program: PathBuf,
}

impl Glomap {
    pub fn new(program: &Path) -> Self {
        Self {
            program: program.to_path_buf(),
        }
    }

    /// Global mapper. Works from the matched database alone.
    pub fn mapper(&self, database: &Path, output_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("mapper")
            .arg("--database_path")
            .arg(database)
            .arg("--output_path")
            .arg(output_dir);
        cmd
    }
}
