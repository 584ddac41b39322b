//! The MainBoot entry is a nested mini-container: a 56-byte sub-header,
//! then sub-entries framed `[4-byte tag][4-byte LE length][12 reserved
//! bytes][payload]`. Sub-entry 0 is the zImage, sub-entry 1 the
//! boot-parameter blob. Somewhere inside the zImage sits a gzip- or
//! LZMA-compressed raw kernel with no explicit end marker; its end is
//! found by trial decompression against the 4-byte size field the
//! firmware places right after the stream.

use std::io::{self, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use plfar_core::ByteCursor;
use tracing::{debug, info};
use xz2::read::XzDecoder;
use xz2::stream::Stream;

use crate::extract::{
    write_artifact, BOOTPARAM_FILE, KERNEL_GZIP_FILE, KERNEL_LZMA_FILE, MAIN_BOOT_FILE, ZIMAGE_FILE,
};
use crate::Error;

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b, 0x08];
const LZMA_MAGIC: &[u8] = &[0x5d, 0x00, 0x00];

const SUB_HEADER_SIZE: usize = 56;
const SUB_ENTRY_RESERVED: usize = 12;

pub(crate) fn extract_main_boot(out_dir: &Path, payload: &[u8]) -> Result<(), Error> {
    write_artifact(out_dir, MAIN_BOOT_FILE, payload)?;
    info!(bytes = payload.len(), "Kernel container found");

    let mut cursor = ByteCursor::new(payload);
    cursor.skip(SUB_HEADER_SIZE)?;

    let zimage = read_sub_entry(&mut cursor)?;
    write_artifact(out_dir, ZIMAGE_FILE, zimage)?;

    match find_kernel_stream(zimage) {
        Some((artifact, blob)) => {
            write_artifact(out_dir, artifact, blob)?;
            info!(file = artifact, bytes = blob.len(), "Compressed kernel delimited");
        }
        None => debug!("No compressed kernel stream delimited inside zImage"),
    }

    let bootparams = read_sub_entry(&mut cursor)?;
    write_artifact(out_dir, BOOTPARAM_FILE, bootparams)?;
    Ok(())
}

fn read_sub_entry<'a>(cursor: &mut ByteCursor<'a>) -> Result<&'a [u8], Error> {
    cursor.skip(4)?; // tag, uninterpreted
    let len = cursor.read_u32()? as usize;
    cursor.skip(SUB_ENTRY_RESERVED)?;
    Ok(cursor.read_exact(len)?)
}

/// Locate the embedded compressed kernel. Gzip is preferred; LZMA is only
/// attempted when no gzip stream could be delimited. At most one artifact
/// is produced.
fn find_kernel_stream(data: &[u8]) -> Option<(&'static str, &[u8])> {
    if let Some(start) = find(data, GZIP_MAGIC) {
        if let Some(end) = find_gzip_end(data, start) {
            return Some((KERNEL_GZIP_FILE, &data[start..end]));
        }
    }
    if let Some(start) = find(data, LZMA_MAGIC) {
        if let Some(end) = find_lzma_end(data, start) {
            return Some((KERNEL_LZMA_FILE, &data[start..end]));
        }
    }
    None
}

fn find(data: &[u8], needle: &[u8]) -> Option<usize> {
    data.windows(needle.len()).position(|w| w == needle)
}

/// Scan candidate end offsets from the far end of the buffer down to the
/// stream start; the first candidate whose trial decompression matches
/// the size field at that offset wins. Descending order finds the longest
/// valid region first, which avoids false positives on spuriously
/// decompressible prefixes. The gzip slice keeps the size-field bytes
/// (the gzip framing consumes its own trailer).
fn find_gzip_end(data: &[u8], start: usize) -> Option<usize> {
    for end in (start..=data.len().checked_sub(4)?).rev() {
        let expected = read_le32(&data[end..end + 4]) as usize;
        if let Ok(inflated) = gunzip(&data[start..end + 4]) {
            if inflated.len() == expected {
                return Some(end + 4);
            }
        }
    }
    None
}

/// As [`find_gzip_end`], but the raw LZMA stream carries no
/// self-terminating trailer, so the candidate slice and the returned end
/// offset both exclude the size field.
fn find_lzma_end(data: &[u8], start: usize) -> Option<usize> {
    for end in (start..=data.len().checked_sub(4)?).rev() {
        let expected = read_le32(&data[end..end + 4]) as usize;
        if let Ok(inflated) = unlzma(&data[start..end]) {
            if inflated.len() == expected {
                return Some(end);
            }
        }
    }
    None
}

fn read_le32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

pub(crate) fn gunzip(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut inflated = Vec::new();
    GzDecoder::new(data).read_to_end(&mut inflated)?;
    Ok(inflated)
}

fn unlzma(data: &[u8]) -> io::Result<Vec<u8>> {
    let lzma = Stream::new_lzma_decoder(u64::MAX)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    let mut inflated = Vec::new();
    XzDecoder::new_stream(data, lzma).read_to_end(&mut inflated)?;
    Ok(inflated)
}
