//! Version dispatch for every deserialization entry point.
//!
//! Records open with a 2-byte version tag. Each public entry point here
//! wraps the source in a fresh [`CrcReader`], reads the tag through it (so
//! the accumulator sees it), and routes to the codec registered for that
//! generation; an unrecognized tag fails with
//! [`MessageFormatError::UnknownFormatVersion`].
//!
//! This module is the single registration point for format generations:
//! shipping a V2 of any record means adding the codec and one arm to the
//! matching route below — nothing else in the crate changes. Heterogeneous
//! return types (and the blob's reader-carrying output) rule out one shared
//! runtime table, so the per-kind routes are the table.

use byteorder::{BigEndian, ByteOrder};
use checksum::CrcReader;
use std::io::{self, Read};

use crate::header::MessageHeaderV1;
use crate::records::{
    BlobOutput, BlobPropertiesRecordV1, BlobRecordV1, DeleteRecordV1, UserMetadataRecordV1,
};
use crate::{
    BlobProperties, MessageFormatError, RecordKind, Result, BLOB_PROPERTIES_VERSION_V1,
    BLOB_VERSION_V1, DELETE_VERSION_V1, MESSAGE_HEADER_VERSION_V1, USER_METADATA_VERSION_V1,
    VERSION_FIELD_SIZE_BYTES,
};

/// Parses a message header from a byte slice, routing on the leading
/// version tag.
///
/// The returned view is not yet validated — call
/// [`verify`](MessageHeaderV1::verify) before trusting it. A consumer can
/// parse the header alone to discover offsets and sizes without paying for
/// the blob read.
pub fn parse_header(buffer: &[u8]) -> Result<MessageHeaderV1<'_>> {
    if buffer.len() < VERSION_FIELD_SIZE_BYTES {
        return Err(MessageFormatError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!(
                "message header version tag requires {} bytes, got {}",
                VERSION_FIELD_SIZE_BYTES,
                buffer.len()
            ),
        )));
    }
    let version = BigEndian::read_u16(buffer);
    match version {
        MESSAGE_HEADER_VERSION_V1 => MessageHeaderV1::new(buffer),
        _ => Err(MessageFormatError::UnknownFormatVersion {
            kind: RecordKind::MessageHeader,
            version,
        }),
    }
}

/// Deserializes a blob properties record from `stream`.
pub fn deserialize_blob_properties<R: Read>(stream: R) -> Result<BlobProperties> {
    let mut reader = CrcReader::new(stream);
    let version = reader.read_u16_be()?;
    match version {
        BLOB_PROPERTIES_VERSION_V1 => BlobPropertiesRecordV1::deserialize(&mut reader),
        _ => Err(MessageFormatError::UnknownFormatVersion {
            kind: RecordKind::BlobProperties,
            version,
        }),
    }
}

/// Deserializes a user metadata record from `stream`, returning the content
/// bytes.
pub fn deserialize_user_metadata<R: Read>(stream: R) -> Result<Vec<u8>> {
    let mut reader = CrcReader::new(stream);
    let version = reader.read_u16_be()?;
    match version {
        USER_METADATA_VERSION_V1 => UserMetadataRecordV1::deserialize(&mut reader),
        _ => Err(MessageFormatError::UnknownFormatVersion {
            kind: RecordKind::UserMetadata,
            version,
        }),
    }
}

/// Deserializes a blob record from `stream`, returning a lazy
/// [`BlobOutput`] over the content.
///
/// Passing `&mut stream` leaves the caller in control of the underlying
/// source once the output is verified or dropped.
pub fn deserialize_blob<R: Read>(stream: R) -> Result<BlobOutput<R>> {
    let mut reader = CrcReader::new(stream);
    let version = reader.read_u16_be()?;
    match version {
        BLOB_VERSION_V1 => BlobRecordV1::deserialize(reader),
        _ => Err(MessageFormatError::UnknownFormatVersion {
            kind: RecordKind::Blob,
            version,
        }),
    }
}

/// Deserializes a delete record from `stream`, returning the delete flag.
pub fn deserialize_delete<R: Read>(stream: R) -> Result<bool> {
    let mut reader = CrcReader::new(stream);
    let version = reader.read_u16_be()?;
    match version {
        DELETE_VERSION_V1 => DeleteRecordV1::deserialize(&mut reader),
        _ => Err(MessageFormatError::UnknownFormatVersion {
            kind: RecordKind::Delete,
            version,
        }),
    }
}
