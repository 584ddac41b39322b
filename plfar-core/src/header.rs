//! The packed structs represent the on-disk format of PLF containers

use bytemuck::{Pod, Zeroable};

use crate::{ByteCursor, Error, HEADER_SIZE};

pub const MAGIC: [u8; 4] = *b"PLF!";

/// The 56-byte fixed container header. All integer fields are
/// little-endian; use the accessor methods on non-LE hosts.
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C, packed)]
pub struct Header {
    /// Must equal `PLF!`
    pub magic: [u8; 4],
    pub version: u32,
    pub header_size: u32,
    pub entry_header_size: u32,
    pub file_type: u32,
    pub entry_point: u32,
    pub target_platform: u32,
    pub target_application: u32,
    pub hardware_compat: u32,
    pub version_major: u32,
    pub version_minor: u32,
    pub version_bugfix: u32,
    pub language_zone: u32,
    /// Total container size in bytes; the entry scan stops here
    pub file_size: u32,
}

impl Header {
    /// Parse and validate a header from the front of a container.
    ///
    /// Only the magic is validated; firmware in the wild carries
    /// vendor-specific values in the remaining fields and they are passed
    /// through as-is.
    pub fn parse<'a>(cursor: &mut ByteCursor<'a>) -> Result<&'a Header, Error> {
        let header: &Header = bytemuck::try_from_bytes(cursor.read_exact(HEADER_SIZE)?)?;
        if header.magic != MAGIC {
            return Err(Error::InvalidMagic(header.magic));
        }
        Ok(header)
    }

    pub fn file_size(&self) -> u32 {
        u32::from_le(self.file_size)
    }

    pub fn version(&self) -> u32 {
        u32::from_le(self.version)
    }

    pub fn file_type(&self) -> u32 {
        u32::from_le(self.file_type)
    }

    /// Firmware version as (major, minor, bugfix)
    pub fn firmware_version(&self) -> (u32, u32, u32) {
        (
            u32::from_le(self.version_major),
            u32::from_le(self.version_minor),
            u32::from_le(self.version_bugfix),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Header;
    use crate::{ByteCursor, Error, HEADER_SIZE};

    fn header_bytes(magic: &[u8; 4], file_size: u32) -> [u8; HEADER_SIZE] {
        let mut bytes = [0; HEADER_SIZE];
        bytes[..4].copy_from_slice(magic);
        bytes[52..].copy_from_slice(&file_size.to_le_bytes());
        bytes
    }

    #[test]
    fn parse_valid_header() {
        let bytes = header_bytes(b"PLF!", 0x1000);
        let mut cursor = ByteCursor::new(&bytes);
        let header = Header::parse(&mut cursor).unwrap();
        assert_eq!(header.file_size(), 0x1000);
        assert_eq!(cursor.position(), HEADER_SIZE);
    }

    #[test]
    fn reject_bad_magic() {
        let bytes = header_bytes(b"XXXX", 0x1000);
        let mut cursor = ByteCursor::new(&bytes);
        assert!(matches!(
            Header::parse(&mut cursor),
            Err(Error::InvalidMagic(m)) if &m == b"XXXX"
        ));
    }

    #[test]
    fn reject_short_buffer() {
        let mut cursor = ByteCursor::new(b"PLF!");
        assert!(matches!(
            Header::parse(&mut cursor),
            Err(Error::UnexpectedEof { .. })
        ));
    }
}
