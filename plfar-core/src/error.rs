use alloc::format;
use alloc::string::ToString;
use core::error;
use core::fmt::{Display, Formatter, Result};

use bytemuck::PodCastError;

#[derive(Debug)]
pub enum Error {
    /// The first four bytes of the container were not `PLF!`
    InvalidMagic([u8; 4]),
    /// A read ran past the end of the buffer
    UnexpectedEof { offset: usize, needed: usize },
    /// A NUL-terminated string field had no terminator
    MissingNul { offset: usize },
    Cast(PodCastError),
    Overflow,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> Result {
        use Error::*;

        let msg = match self {
            InvalidMagic(magic) => format!("Invalid magic: {:02x?}", magic),
            UnexpectedEof { offset, needed } => {
                format!("Unexpected end of data: needed {} bytes at offset {}", needed, offset)
            }
            MissingNul { offset } => {
                format!("Unterminated string at offset {}", offset)
            }
            Cast(err) => format!("Cast: {}", err),
            Overflow => "Overflow".to_string(),
        };
        write!(f, "{}", msg)
    }
}

impl error::Error for Error {}

impl From<PodCastError> for Error {
    fn from(err: PodCastError) -> Error {
        Error::Cast(err)
    }
}
