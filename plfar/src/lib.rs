//! Extraction engine for PLF firmware containers.
//!
//! [`extract_file`] splits one container into its artifacts under a
//! per-firmware output root: a partition-table manifest, installer and
//! bootloader blobs, the kernel mini-container (with the embedded
//! compressed kernel delimited by trial decompression), and the packed
//! filesystem tree with files, directories, symlinks and permission bits.

mod extract;
mod filesystem;
mod kernel;

pub use extract::{extract_file, Extractor};

use std::ffi::OsStr;
use std::fmt;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{reason}: {}", file.display())]
    Io {
        reason: String,
        file: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Format: {0}")]
    Core(#[from] plfar_core::Error),

    #[error("Invalid path component: {} (in {})", component.display(), entry.display())]
    InvalidPath { entry: PathBuf, component: PathBuf },
}

/// Iterate the components of an embedded path and ensure that there are
/// no non-normal components. Firmware is not a trusted input; names that
/// would escape the output root are rejected outright.
pub(crate) fn check_path(bytes: &[u8]) -> Result<&Path, Error> {
    let path = Path::new(OsStr::from_bytes(bytes));
    for component in path.components() {
        match component {
            Component::Normal(_) => {}
            invalid => {
                let bad_component: &Path = invalid.as_ref();
                return Err(Error::InvalidPath {
                    entry: path.to_path_buf(),
                    component: bad_component.to_path_buf(),
                });
            }
        }
    }
    Ok(path)
}

/// Counters accumulated over one extraction. Scoped to the extraction so
/// that parallel runs over different firmware files stay independent.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractReport {
    pub files: u64,
    pub directories: u64,
    pub symlinks: u64,
    /// Filesystem records with an unrecognized type nibble (device nodes
    /// and the like); consumed but not materialized
    pub unknown_records: u64,
    /// Container entries with an unrecognized type code; skipped whole
    pub unknown_entries: u64,
}

impl fmt::Display for ExtractReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Filesystem: created {} file(s), {} directory(s) and {} symbol link(s); \
             skipped {} record(s) and {} entry(s) of unknown type",
            self.files, self.directories, self.symlinks, self.unknown_records, self.unknown_entries,
        )
    }
}
