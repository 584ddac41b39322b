//! The packed structs represent the on-disk format of PLF containers

use bytemuck::{Pod, Zeroable};

use crate::{ByteCursor, Error, ENTRY_HEADER_SIZE};

/// The closed set of entry types this format carries. Codes outside the
/// set are preserved so the dispatcher can skip their payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Partition table (0x0B)
    VolumeConfig,
    /// Installer blob (0x0C)
    Installer,
    /// Bootloader image (0x07)
    Bootloader,
    /// Kernel mini-container (0x03)
    MainBoot,
    /// One packed filesystem record (0x09)
    Filesystem,
    Unknown(u32),
}

/// The 20-byte prefix of every container entry
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C, packed)]
pub struct EntryHeader {
    pub kind: u32,
    /// Payload size in bytes, excluding this prefix
    pub size: u32,
    /// Stored CRC32 of the payload; carried but not verified
    pub crc32: u32,
    pub load_addr: u32,
    /// Nonzero when the whole payload is one gzip stream of this many bytes
    pub uncompressed_size: u32,
}

impl EntryHeader {
    pub fn parse<'a>(cursor: &mut ByteCursor<'a>) -> Result<&'a EntryHeader, Error> {
        Ok(bytemuck::try_from_bytes(
            cursor.read_exact(ENTRY_HEADER_SIZE)?,
        )?)
    }

    pub fn kind(&self) -> EntryKind {
        match u32::from_le(self.kind) {
            0x0B => EntryKind::VolumeConfig,
            0x0C => EntryKind::Installer,
            0x07 => EntryKind::Bootloader,
            0x03 => EntryKind::MainBoot,
            0x09 => EntryKind::Filesystem,
            v => EntryKind::Unknown(v),
        }
    }

    pub fn size(&self) -> u32 {
        u32::from_le(self.size)
    }

    pub fn crc32(&self) -> u32 {
        u32::from_le(self.crc32)
    }

    pub fn load_addr(&self) -> u32 {
        u32::from_le(self.load_addr)
    }

    pub fn uncompressed_size(&self) -> u32 {
        u32::from_le(self.uncompressed_size)
    }

    pub fn is_compressed(&self) -> bool {
        self.uncompressed_size() > 0
    }

    /// Bytes of padding that follow this entry's payload. Only Filesystem
    /// entries are padded back to 4-byte alignment.
    pub fn padding(&self) -> usize {
        match self.kind() {
            EntryKind::Filesystem => (4 - self.size() as usize % 4) % 4,
            _ => 0,
        }
    }
}
