//! The packed structs represent the on-disk format of PLF containers

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::{self, Display};

use bytemuck::{Pod, Zeroable};

use crate::{ByteCursor, Error, PARTITION_SIZE};

/// Reserved words between the VolumeConfig entry prefix and the
/// descriptor count
const RESERVED_WORDS: usize = 9;

/// One 80-byte partition descriptor from the VolumeConfig entry
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C, packed)]
pub struct PartitionDescriptor {
    pub device: u16,
    pub volume_kind: u16,
    pub volume: u16,
    pub reserved: u16,
    pub size: u32,
    pub action: u32,
    /// NUL-padded volume name
    pub name: [u8; 32],
    /// NUL-padded mount point name
    pub mount: [u8; 32],
}

fn trim_nul(field: &[u8]) -> &[u8] {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    &field[..end]
}

impl PartitionDescriptor {
    pub fn parse<'a>(cursor: &mut ByteCursor<'a>) -> Result<&'a PartitionDescriptor, Error> {
        Ok(bytemuck::try_from_bytes(cursor.read_exact(PARTITION_SIZE)?)?)
    }

    /// Retrieve the volume name, ending at the first NUL
    pub fn name_bytes(&self) -> &[u8] {
        trim_nul(&self.name)
    }

    /// Retrieve the mount name, ending at the first NUL
    pub fn mount_bytes(&self) -> &[u8] {
        trim_nul(&self.mount)
    }

    pub fn size(&self) -> u32 {
        u32::from_le(self.size)
    }

    pub fn action(&self) -> u32 {
        u32::from_le(self.action)
    }
}

impl Display for PartitionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Mount: {}, Device: 0x{:04x}, Volume: [Name: {}, Type: {:04x}, ID: {:04x}, Size: {}, Action: {:08x}]",
            String::from_utf8_lossy(self.mount_bytes()),
            u16::from_le(self.device),
            String::from_utf8_lossy(self.name_bytes()),
            u16::from_le(self.volume_kind),
            u16::from_le(self.volume),
            self.size(),
            self.action(),
        )
    }
}

/// The ordered partition table decoded from a VolumeConfig entry payload
pub struct PartitionTable {
    pub partitions: Vec<PartitionDescriptor>,
}

impl PartitionTable {
    pub fn parse(payload: &[u8]) -> Result<PartitionTable, Error> {
        let mut cursor = ByteCursor::new(payload);
        cursor.skip(RESERVED_WORDS * 4)?;
        let count = cursor.read_u32()? as usize;

        let mut partitions = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            partitions.push(*PartitionDescriptor::parse(&mut cursor)?);
        }
        Ok(PartitionTable { partitions })
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;
    use alloc::vec::Vec;

    use super::PartitionTable;

    fn descriptor(name: &[u8], mount: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1u16.to_le_bytes()); // device
        bytes.extend_from_slice(&2u16.to_le_bytes()); // kind
        bytes.extend_from_slice(&3u16.to_le_bytes()); // volume
        bytes.extend_from_slice(&0u16.to_le_bytes()); // reserved
        bytes.extend_from_slice(&0x800u32.to_le_bytes()); // size
        bytes.extend_from_slice(&0xdeadbeefu32.to_le_bytes()); // action
        let mut field = [0u8; 32];
        field[..name.len()].copy_from_slice(name);
        bytes.extend_from_slice(&field);
        let mut field = [0u8; 32];
        field[..mount.len()].copy_from_slice(mount);
        bytes.extend_from_slice(&field);
        bytes
    }

    fn table_payload(descriptors: &[Vec<u8>]) -> Vec<u8> {
        let mut payload = alloc::vec![0u8; 9 * 4];
        payload.extend_from_slice(&(descriptors.len() as u32).to_le_bytes());
        for d in descriptors {
            payload.extend_from_slice(d);
        }
        payload
    }

    #[test]
    fn parse_preserves_table_order() {
        let payload = table_payload(&[
            descriptor(b"system", b"/"),
            descriptor(b"data", b"/data"),
        ]);
        let table = PartitionTable::parse(&payload).unwrap();
        assert_eq!(table.partitions.len(), 2);
        assert_eq!(table.partitions[0].name_bytes(), b"system");
        assert_eq!(table.partitions[1].mount_bytes(), b"/data");
    }

    #[test]
    fn manifest_line_format() {
        let payload = table_payload(&[descriptor(b"system", b"/")]);
        let table = PartitionTable::parse(&payload).unwrap();
        assert_eq!(
            format!("{}", table.partitions[0]),
            "Mount: /, Device: 0x0001, Volume: [Name: system, Type: 0002, ID: 0003, Size: 2048, Action: deadbeef]"
        );
    }

    #[test]
    fn truncated_table_is_an_error() {
        let mut payload = table_payload(&[descriptor(b"system", b"/")]);
        payload[36] = 2; // claim two descriptors, provide one
        assert!(PartitionTable::parse(&payload).is_err());
    }
}
