use std::ffi::OsStr;
use std::fs::{self, Permissions};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::{symlink, PermissionsExt};
use std::path::PathBuf;

use plfar_core::{EntryHeader, FsRecord};
use tracing::{debug, warn};

use crate::kernel::gunzip;
use crate::{check_path, Error, ExtractReport};

/// Reconstructs the packed filesystem tree under `<out>/filesystem`.
///
/// Directories and files are materialized as their records arrive;
/// symlink records are collected and only applied once the rest of the
/// tree exists, since their targets may be created by later records.
pub(crate) struct FilesystemTree {
    root: PathBuf,
    symlinks: Vec<(PathBuf, PathBuf)>,
}

impl FilesystemTree {
    pub(crate) fn new(root: PathBuf) -> FilesystemTree {
        FilesystemTree {
            root,
            symlinks: Vec::new(),
        }
    }

    /// Decode the single record carried by one Filesystem entry. A
    /// nonzero uncompressed-size on the entry means the whole record is
    /// one gzip stream.
    pub(crate) fn extract_record(
        &mut self,
        entry: &EntryHeader,
        payload: &[u8],
        report: &mut ExtractReport,
    ) -> Result<(), Error> {
        if entry.is_compressed() {
            let inflated = match gunzip(payload) {
                Ok(inflated) => inflated,
                Err(err) => {
                    warn!(%err, "Undecodable compressed filesystem record, skipping");
                    return Ok(());
                }
            };
            if inflated.len() != entry.uncompressed_size() as usize {
                // Not fatal: whatever was produced is still materialized
                warn!(
                    actual = inflated.len(),
                    declared = entry.uncompressed_size(),
                    "Inflated record length disagrees with declared size"
                );
            }
            self.materialize(FsRecord::parse(&inflated)?, report)
        } else {
            self.materialize(FsRecord::parse(payload)?, report)
        }
    }

    fn materialize(&mut self, record: FsRecord<'_>, report: &mut ExtractReport) -> Result<(), Error> {
        match record {
            FsRecord::Directory { name, mode } => {
                let path = self.root.join(check_path(name)?);
                fs::create_dir_all(&path).map_err(|e| Error::Io {
                    reason: "Create directory".to_string(),
                    file: path.clone(),
                    source: e,
                })?;
                fs::set_permissions(&path, Permissions::from_mode(mode.perm())).map_err(|e| {
                    Error::Io {
                        reason: "Set directory permissions".to_string(),
                        file: path.clone(),
                        source: e,
                    }
                })?;
                report.directories += 1;
                debug!(dir = %path.display(), mode = %format!("{:o}", mode.perm()), "Directory created");
            }
            FsRecord::File { name, mode, data } => {
                let path = self.root.join(check_path(name)?);
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).map_err(|e| Error::Io {
                        reason: "Create parent directory".to_string(),
                        file: parent.to_path_buf(),
                        source: e,
                    })?;
                }
                fs::write(&path, data).map_err(|e| Error::Io {
                    reason: "Write file".to_string(),
                    file: path.clone(),
                    source: e,
                })?;
                // chmod after the write so the umask cannot strip bits
                fs::set_permissions(&path, Permissions::from_mode(mode.perm())).map_err(|e| {
                    Error::Io {
                        reason: "Set file permissions".to_string(),
                        file: path.clone(),
                        source: e,
                    }
                })?;
                report.files += 1;
                debug!(file = %path.display(), mode = %format!("{:o}", mode.perm()), bytes = data.len(), "File created");
            }
            FsRecord::Symlink { name, target } => {
                let link = self.root.join(check_path(name)?);
                let target = PathBuf::from(OsStr::from_bytes(target));
                debug!(link = %link.display(), target = %target.display(), "Symbol link recorded");
                self.symlinks.push((link, target));
                report.symlinks += 1;
            }
            FsRecord::Unknown { name, mode, data } => {
                report.unknown_records += 1;
                debug!(
                    name = %String::from_utf8_lossy(name),
                    kind = ?mode.kind(),
                    bytes = data.len(),
                    "Record of unknown type consumed"
                );
            }
        }
        Ok(())
    }

    /// Second pass: create every recorded symlink. Targets are written
    /// verbatim; a dangling link mirrors the source firmware and is not
    /// an error.
    pub(crate) fn apply_symlinks(&mut self) -> Result<(), Error> {
        for (link, target) in self.symlinks.drain(..) {
            if let Some(parent) = link.parent() {
                fs::create_dir_all(parent).map_err(|e| Error::Io {
                    reason: "Create parent directory".to_string(),
                    file: parent.to_path_buf(),
                    source: e,
                })?;
            }
            symlink(&target, &link).map_err(|e| Error::Io {
                reason: "Create symbol link".to_string(),
                file: link.clone(),
                source: e,
            })?;
            debug!(link = %link.display(), target = %target.display(), "Symbol link created");
        }
        Ok(())
    }
}
