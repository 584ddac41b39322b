//! Core data types for the PLF firmware container format.
//!
//! A container starts with a 56-byte [`Header`] (magic `PLF!`) followed by
//! typed, length-prefixed entries ([`EntryHeader`]) up to the total file
//! size the header declares. This crate models the on-disk layout and does
//! the pure parsing; all I/O and decompression live in the `plfar` crate.
#![no_std]
extern crate alloc;

use core::mem;

pub use crate::cursor::ByteCursor;
pub use crate::entry::{EntryHeader, EntryKind};
pub use crate::error::Error;
pub use crate::header::Header;
pub use crate::partition::{PartitionDescriptor, PartitionTable};
pub use crate::record::{FsRecord, Mode, RecordKind};

mod cursor;
mod entry;
mod error;
mod header;
mod partition;
mod record;

pub const HEADER_SIZE: usize = mem::size_of::<Header>();
pub const ENTRY_HEADER_SIZE: usize = mem::size_of::<EntryHeader>();
pub const PARTITION_SIZE: usize = mem::size_of::<PartitionDescriptor>();

#[cfg(test)]
mod tests {
    use core::mem;

    use crate::{EntryHeader, Header, PartitionDescriptor};
    use crate::{ENTRY_HEADER_SIZE, HEADER_SIZE, PARTITION_SIZE};

    #[test]
    fn header_size() {
        assert_eq!(mem::size_of::<Header>(), 56);
        assert_eq!(HEADER_SIZE, 56);
    }

    #[test]
    fn entry_header_size() {
        assert_eq!(mem::size_of::<EntryHeader>(), 20);
        assert_eq!(ENTRY_HEADER_SIZE, 20);
    }

    #[test]
    fn partition_size() {
        assert_eq!(mem::size_of::<PartitionDescriptor>(), 80);
        assert_eq!(PARTITION_SIZE, 80);
    }
}
