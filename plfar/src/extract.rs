use std::fs;
use std::path::{Path, PathBuf};

use plfar_core::{ByteCursor, EntryHeader, EntryKind, Header, PartitionTable};
use tracing::{debug, info, warn};

use crate::filesystem::FilesystemTree;
use crate::kernel;
use crate::{Error, ExtractReport};

pub(crate) const VOLUME_CONFIG_FILE: &str = "volume_config.txt";
pub(crate) const INSTALLER_FILE: &str = "installer.plf";
pub(crate) const BOOTLOADER_FILE: &str = "bootloader.bin";
pub(crate) const MAIN_BOOT_FILE: &str = "main_boot.plf";
pub(crate) const ZIMAGE_FILE: &str = "zImage";
pub(crate) const KERNEL_GZIP_FILE: &str = "kernel.gz";
pub(crate) const KERNEL_LZMA_FILE: &str = "kernel.xz";
pub(crate) const BOOTPARAM_FILE: &str = "bootparams.txt";
pub(crate) const FILESYSTEM_DIR: &str = "filesystem";

/// Read one firmware file and extract its artifacts under `out_dir`.
///
/// The output root is only created once the container header has been
/// validated, so a non-PLF input produces no artifacts at all.
pub fn extract_file(firmware: impl AsRef<Path>, out_dir: impl AsRef<Path>) -> Result<ExtractReport, Error> {
    let firmware = firmware.as_ref();
    let data = fs::read(firmware).map_err(|e| Error::Io {
        reason: "Read firmware".to_string(),
        file: firmware.to_path_buf(),
        source: e,
    })?;
    debug!(file = %firmware.display(), bytes = data.len(), "Processing firmware");
    Extractor::new(out_dir).extract(&data)
}

/// Writes `data` as an artifact directly under the output root
pub(crate) fn write_artifact(out_dir: &Path, name: &str, data: &[u8]) -> Result<(), Error> {
    let path = out_dir.join(name);
    fs::write(&path, data).map_err(|e| Error::Io {
        reason: "Write artifact".to_string(),
        file: path.clone(),
        source: e,
    })?;
    debug!(file = %path.display(), bytes = data.len(), "Artifact written");
    Ok(())
}

/// One container's extraction: owns the output root, the statistics, and
/// the deferred symlink list for the duration of the decode.
pub struct Extractor {
    out_dir: PathBuf,
    tree: FilesystemTree,
    report: ExtractReport,
}

impl Extractor {
    pub fn new(out_dir: impl AsRef<Path>) -> Extractor {
        let out_dir = out_dir.as_ref().to_path_buf();
        Extractor {
            tree: FilesystemTree::new(out_dir.join(FILESYSTEM_DIR)),
            out_dir,
            report: ExtractReport::default(),
        }
    }

    /// Decode a whole container from memory, writing artifacts as a side
    /// effect and returning the accumulated statistics.
    pub fn extract(mut self, data: &[u8]) -> Result<ExtractReport, Error> {
        let mut cursor = ByteCursor::new(data);
        let header = Header::parse(&mut cursor)?;
        let (major, minor, bugfix) = header.firmware_version();
        debug!(version = header.version(), firmware = %format!("{}.{}.{}", major, minor, bugfix), "Container header parsed");

        fs::create_dir_all(&self.out_dir).map_err(|e| Error::Io {
            reason: "Create output directory".to_string(),
            file: self.out_dir.clone(),
            source: e,
        })?;

        // The header's declared total size terminates the entry scan
        let total = header.file_size() as usize;
        while cursor.position() < total {
            let entry = EntryHeader::parse(&mut cursor)?;
            // Slicing the payload up front keeps the cursor in sync no
            // matter what the entry turns out to be
            let payload = cursor.read_exact(entry.size() as usize)?;

            match entry.kind() {
                EntryKind::VolumeConfig => self.volume_config(payload)?,
                EntryKind::Installer => {
                    write_artifact(&self.out_dir, INSTALLER_FILE, payload)?;
                    info!(bytes = payload.len(), "Installer found");
                }
                EntryKind::Bootloader => {
                    write_artifact(&self.out_dir, BOOTLOADER_FILE, payload)?;
                    info!(bytes = payload.len(), "Bootloader found");
                }
                EntryKind::MainBoot => kernel::extract_main_boot(&self.out_dir, payload)?,
                EntryKind::Filesystem => {
                    self.tree.extract_record(entry, payload, &mut self.report)?;
                }
                EntryKind::Unknown(kind) => {
                    self.report.unknown_entries += 1;
                    warn!(kind, size = entry.size(), "Skipping entry of unknown type");
                }
            }

            // The final entry of a container may end at EOF without its
            // alignment padding
            cursor.skip(entry.padding().min(cursor.remaining()))?;
        }

        // Symlinks may point forward at paths materialized later in the
        // record stream, so they are applied only now
        self.tree.apply_symlinks()?;
        Ok(self.report)
    }

    fn volume_config(&self, payload: &[u8]) -> Result<(), Error> {
        let table = PartitionTable::parse(payload)?;

        let mut manifest = String::from("[volume_config]\n");
        for partition in &table.partitions {
            manifest.push_str(&partition.to_string());
            manifest.push('\n');
        }
        write_artifact(&self.out_dir, VOLUME_CONFIG_FILE, manifest.as_bytes())?;
        info!(partitions = table.partitions.len(), "Partition table found");
        Ok(())
    }
}
