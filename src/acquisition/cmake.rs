//! CMake firmware build.

use std::{path::Path, process::Command};

use sysinfo::{CpuRefreshKind, RefreshKind, System, SystemExt};
use tracing::debug;

use super::FirmwareBuilder;
use crate::error::{AcquisitionStage, Result, StatError};

/// Runs `cmake --build <dir> --parallel <jobs>` on an already configured
/// build tree.
pub struct CmakeBuilder {
    jobs: usize,
}

fn cpu_count() -> usize {
    let system = System::new_with_specifics(RefreshKind::new().with_cpu(CpuRefreshKind::new()));

    system.cpus().len().max(1)
}

impl CmakeBuilder {
    pub fn new() -> Self {
        Self::with_jobs(cpu_count())
    }

    pub fn with_jobs(jobs: usize) -> Self {
        Self { jobs: jobs.max(1) }
    }

    fn command(&self, project_dir: &Path) -> Command {
        let mut command = Command::new("cmake");

        command
            .arg("--build")
            .arg(project_dir)
            .arg("--parallel")
            .arg(self.jobs.to_string());

        command
    }
}

impl Default for CmakeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FirmwareBuilder for CmakeBuilder {
    fn build(&self, project_dir: &Path) -> Result<()> {
        if !project_dir.is_dir() {
            return Err(StatError::acquisition(
                AcquisitionStage::Build,
                format!("{} is not a directory", project_dir.display()),
            ));
        }

        let mut command = self.command(project_dir);
        debug!("running {:?}", command);

        let status = command.status().map_err(|e| {
            StatError::acquisition(AcquisitionStage::Build, format!("cannot run cmake: {}", e))
        })?;

        if !status.success() {
            return Err(StatError::acquisition(
                AcquisitionStage::Build,
                format!("cmake {}", status),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::CmakeBuilder;
    use crate::acquisition::FirmwareBuilder;

    #[test]
    fn test_command_line() {
        let command = CmakeBuilder::with_jobs(8).command(Path::new("build"));

        let args: Vec<String> = command
            .get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect();

        assert_eq!(command.get_program(), "cmake");
        assert_eq!(args, vec!["--build", "build", "--parallel", "8"]);
    }

    #[test]
    fn test_missing_build_dir() {
        let dir = tempfile::tempdir().unwrap();

        assert!(CmakeBuilder::with_jobs(1)
            .build(&dir.path().join("missing"))
            .is_err());
    }

    #[test]
    fn test_at_least_one_job() {
        assert!(CmakeBuilder::new().jobs >= 1);
        assert_eq!(CmakeBuilder::with_jobs(0).jobs, 1);
    }
}
