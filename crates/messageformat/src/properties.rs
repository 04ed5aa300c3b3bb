//! Blob properties payload serde.
//!
//! The property block that describes a blob (ownership, TTL, content type
//! and so on) is defined by the layer above the record format. Down here it
//! is an opaque, length-prefixed byte payload: `size(4, i32) | bytes`. The
//! blob properties record codec wraps this payload with a version prefix
//! and CRC trailer but never interprets it.

use byteorder::{BigEndian, WriteBytesExt};
use checksum::CrcReader;
use std::io::{self, Read};

/// An opaque blob property block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobProperties {
    content: Vec<u8>,
}

impl BlobProperties {
    /// Wraps an already-encoded property payload.
    pub fn new(content: Vec<u8>) -> Self {
        Self { content }
    }

    /// The encoded payload bytes.
    #[must_use]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Consumes the properties, returning the payload bytes.
    pub fn into_content(self) -> Vec<u8> {
        self.content
    }
}

/// Serialized size of the property payload: a 4-byte length prefix plus the
/// payload bytes.
#[must_use]
pub fn blob_properties_size(properties: &BlobProperties) -> usize {
    4 + properties.content.len()
}

/// Appends the property payload to `output`.
pub fn put_blob_properties(output: &mut Vec<u8>, properties: &BlobProperties) -> io::Result<()> {
    let len = i32::try_from(properties.content.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "blob properties payload of {} bytes exceeds the maximum of {}",
                properties.content.len(),
                i32::MAX
            ),
        )
    })?;
    output.write_i32::<BigEndian>(len)?;
    output.extend_from_slice(&properties.content);
    Ok(())
}

/// Reads a property payload from `reader`.
///
/// The bytes pass through the reader's CRC accumulator like any other
/// record payload. A negative declared size is rejected before any content
/// is read.
pub fn get_blob_properties<R: Read>(reader: &mut CrcReader<R>) -> io::Result<BlobProperties> {
    let len = reader.read_i32_be()?;
    if len < 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("blob properties payload declares a negative size {}", len),
        ));
    }
    let content = reader.read_bytes(len as usize)?;
    Ok(BlobProperties { content })
}
