//! UF2 mass-storage flashing.

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use super::DeviceFlasher;
use crate::error::{AcquisitionStage, Result, StatError};

fn flash_error<R: std::fmt::Display>(reason: R) -> StatError {
    StatError::acquisition(AcquisitionStage::Flash, reason)
}

/// Finds the single firmware image matching `pattern` in `build_dir`.
pub fn resolve_artifact(build_dir: &Path, pattern: &str) -> Result<PathBuf> {
    let base = glob::Pattern::escape(&build_dir.to_string_lossy());
    let full = format!("{}/{}", base, pattern);

    let mut matches: Vec<PathBuf> = glob::glob(&full)
        .map_err(|e| flash_error(format!("invalid artifact pattern {:?}: {}", pattern, e)))?
        .filter_map(|p| p.ok())
        .filter(|p| p.is_file())
        .collect();

    match matches.len() {
        0 => Err(flash_error(format!(
            "no artifact matching {:?} in {}",
            pattern,
            build_dir.display()
        ))),
        1 => Ok(matches.remove(0)),
        n => Err(flash_error(format!(
            "{} artifacts match {:?} in {}",
            n,
            pattern,
            build_dir.display()
        ))),
    }
}

/// Copies the image onto the volume exposed by the boot ROM. The board
/// reboots into the new firmware once the copy completes.
#[derive(Default)]
pub struct MassStorageFlasher;

impl DeviceFlasher for MassStorageFlasher {
    fn flash(&self, artifact: &Path, mount_dir: &Path) -> Result<()> {
        if !mount_dir.is_dir() {
            return Err(flash_error(format!(
                "device is not mounted at {}",
                mount_dir.display()
            )));
        }

        let name = artifact
            .file_name()
            .ok_or_else(|| flash_error(format!("{} is not a file", artifact.display())))?;
        let target = mount_dir.join(name);

        std::fs::copy(artifact, &target)
            .and_then(|_| File::open(&target)?.sync_all())
            .map_err(|e| flash_error(format!("cannot copy to {}: {}", target.display(), e)))?;

        Ok(())
    }
}
