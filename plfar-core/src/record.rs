use bitflags::bitflags;

use crate::{ByteCursor, Error};

bitflags! {
    /// The 4-byte flags field of a filesystem record: a type nibble in the
    /// top bits and POSIX permission bits in the bottom twelve.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Mode: u32 {
        const PERM = 0x0FFF;
        const KIND = 0xF000;
    }
}

/// The closed set of filesystem record types. Device nodes and other
/// specials (e.g. type nibble 0x2) decode as `Unknown` and are consumed
/// without being materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// Type nibble 0x4
    Directory,
    /// Type nibble 0x8
    File,
    /// Type nibble 0xA
    Symlink,
    Unknown(u8),
}

impl Mode {
    pub fn kind(self) -> RecordKind {
        match (self.bits() & Mode::KIND.bits()) >> 12 {
            0x4 => RecordKind::Directory,
            0x8 => RecordKind::File,
            0xA => RecordKind::Symlink,
            v => RecordKind::Unknown(v as u8),
        }
    }

    /// Permission bits, suitable for chmod
    pub fn perm(self) -> u32 {
        self.bits() & Mode::PERM.bits()
    }
}

/// One parsed filesystem record, borrowing from the record buffer.
///
/// Layout: NUL-terminated name, 4-byte flags, two reserved words, then
/// either payload bytes (files), a NUL-terminated target path (symlinks),
/// or nothing (directories).
#[derive(Debug, PartialEq, Eq)]
pub enum FsRecord<'a> {
    Directory { name: &'a [u8], mode: Mode },
    File { name: &'a [u8], mode: Mode, data: &'a [u8] },
    Symlink { name: &'a [u8], target: &'a [u8] },
    Unknown { name: &'a [u8], mode: Mode, data: &'a [u8] },
}

impl<'a> FsRecord<'a> {
    /// Parse one record from exactly its payload bytes (the owning
    /// entry's declared size, or the inflated stream for compressed
    /// records).
    pub fn parse(record: &'a [u8]) -> Result<FsRecord<'a>, Error> {
        let mut cursor = ByteCursor::new(record);
        let name = cursor.read_cstr()?;
        let mode = Mode::from_bits_retain(cursor.read_u32()?);
        cursor.skip(8)?;

        Ok(match mode.kind() {
            RecordKind::Directory => FsRecord::Directory { name, mode },
            RecordKind::File => FsRecord::File {
                name,
                mode,
                data: cursor.rest(),
            },
            RecordKind::Symlink => FsRecord::Symlink {
                name,
                target: cursor.read_cstr()?,
            },
            RecordKind::Unknown(_) => FsRecord::Unknown {
                name,
                mode,
                data: cursor.rest(),
            },
        })
    }

    pub fn name(&self) -> &'a [u8] {
        match self {
            FsRecord::Directory { name, .. }
            | FsRecord::File { name, .. }
            | FsRecord::Symlink { name, .. }
            | FsRecord::Unknown { name, .. } => name,
        }
    }
}
