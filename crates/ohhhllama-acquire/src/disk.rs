//! Disk usage through `sysinfo`.

use std::path::Path;

use ohhhllama_core::{DiskError, DiskProbe};
use sysinfo::Disks;

/// Mounted disk summary used for the usage calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountUsage {
    pub mount_point: std::path::PathBuf,
    pub total: u64,
    pub available: u64,
}

/// Pick the mount that holds `path`: the longest mount point that prefixes it.
pub fn usage_for_path(mounts: &[MountUsage], path: &Path) -> Result<f64, DiskError> {
    let mount = mounts
        .iter()
        .filter(|m| path.starts_with(&m.mount_point))
        .max_by_key(|m| m.mount_point.components().count())
        .ok_or_else(|| DiskError::NoDisk(path.display().to_string()))?;

    if mount.total == 0 {
        return Err(DiskError::ZeroCapacity(mount.mount_point.display().to_string()));
    }
    let used = mount.total.saturating_sub(mount.available);
    #[allow(clippy::cast_precision_loss)] // percentages do not need full u64 precision
    let percent = used as f64 / mount.total as f64 * 100.0;
    Ok(percent)
}

/// Reads the live mount table on every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct SysinfoDiskProbe;

impl DiskProbe for SysinfoDiskProbe {
    fn usage_percent(&self, path: &Path) -> Result<f64, DiskError> {
        // The holding dir may not exist yet; walk up to an existing ancestor.
        let resolved = path
            .ancestors()
            .find_map(|p| p.canonicalize().ok())
            .unwrap_or_else(|| path.to_path_buf());

        let disks = Disks::new_with_refreshed_list();
        let mounts: Vec<MountUsage> = disks
            .list()
            .iter()
            .map(|d| MountUsage {
                mount_point: d.mount_point().to_path_buf(),
                total: d.total_space(),
                available: d.available_space(),
            })
            .collect();
        usage_for_path(&mounts, &resolved)
    }
}
