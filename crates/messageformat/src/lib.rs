//! # MessageFormat — on-disk record format for the Rookery blob store
//!
//! Every object stored by Rookery is written to the append-only log as one
//! self-describing **message**: a fixed-width header followed by one or more
//! versioned, CRC-delimited sub-records. This crate owns the framing,
//! versioning, constraint checking, and integrity validation of those
//! records; the log that concatenates them and the transport that moves them
//! between nodes are consumers of the byte sequences defined here.
//!
//! ## Message shapes
//!
//! A message is exactly one of:
//!
//! - **Put**: `header | blob properties record | user metadata record | blob record`
//! - **Delete**: `header | delete record`
//!
//! The header carries four relative offsets linking the sub-records of one
//! logical message. Which offsets are valid (greater than zero) versus
//! `INVALID` (`-1`) is what distinguishes the two shapes, and the header
//! codec enforces that exclusivity on both write and read.
//!
//! ## Header layout (V1, 38 bytes, all integers big-endian)
//!
//! ```text
//! [version: u16][total_size: i64][blob props rel off: i32][delete rel off: i32]
//! [user metadata rel off: i32][blob rel off: i32][crc: u64]
//! ```
//!
//! `crc` is a CRC-32 over the preceding 30 bytes, stored in an 8-byte field.
//!
//! ## Sub-record layouts (V1)
//!
//! ```text
//! BlobProperties: [version: u16][properties payload ...][crc: u64]
//! UserMetadata:   [version: u16][size: i32][content ...][crc: u64]
//! Blob:           [version: u16][size: i64][content ...][crc: u64]
//! Delete:         [version: u16][flag: u8][crc: u64]
//! ```
//!
//! Every CRC covers the preceding bytes of that record only — checksums are
//! never cumulative across sub-records. On read, each record's version tag
//! is routed through the [`dispatch`] module, the payload is consumed
//! through a [`checksum::CrcReader`], and the accumulated CRC is compared
//! against the stored trailer before any value is returned.
//!
//! ## Module responsibilities
//!
//! | Module         | Purpose                                             |
//! |----------------|-----------------------------------------------------|
//! | [`header`]     | Header codec: serialize, parse view, verify         |
//! | [`records`]    | The four sub-record codecs                          |
//! | [`properties`] | Opaque blob-properties payload serde                |
//! | [`dispatch`]   | Version routing for all deserialization entry points|
//! | [`message`]    | Put/delete message assembly from the primitives     |
//!
//! ## Example
//!
//! ```rust,no_run
//! use messageformat::{deserialize_delete, serialize_delete_message, parse_header};
//!
//! let message = serialize_delete_message().unwrap();
//! let header = parse_header(&message).unwrap();
//! header.verify().unwrap();
//!
//! let offset = header.delete_relative_offset() as usize;
//! let deleted = deserialize_delete(&message[offset..]).unwrap();
//! assert!(deleted);
//! ```

use std::fmt;
use std::io;
use thiserror::Error;

pub mod dispatch;
pub mod header;
pub mod message;
pub mod properties;
pub mod records;

pub use dispatch::{
    deserialize_blob, deserialize_blob_properties, deserialize_delete, deserialize_user_metadata,
    parse_header,
};
pub use header::MessageHeaderV1;
pub use message::{serialize_delete_message, serialize_put_message};
pub use properties::BlobProperties;
pub use records::{
    BlobOutput, BlobPropertiesRecordV1, BlobRecordV1, DeleteRecordV1, UserMetadataRecordV1,
};

/// Width of the leading version tag on every record.
pub const VERSION_FIELD_SIZE_BYTES: usize = 2;
/// Width of the trailing CRC field on every record. The CRC itself is 32
/// bits; the field keeps the 8-byte on-disk width as a hard format contract.
pub const CRC_SIZE_BYTES: usize = 8;

/// Message header format generation 1.
pub const MESSAGE_HEADER_VERSION_V1: u16 = 1;
/// Blob properties record format generation 1.
pub const BLOB_PROPERTIES_VERSION_V1: u16 = 1;
/// Delete record format generation 1.
pub const DELETE_VERSION_V1: u16 = 1;
/// User metadata record format generation 1.
pub const USER_METADATA_VERSION_V1: u16 = 1;
/// Blob record format generation 1.
pub const BLOB_VERSION_V1: u16 = 1;

/// Sentinel marking a header relative-offset field as "not present".
pub const INVALID_RELATIVE_OFFSET: i32 = -1;

/// The record kinds that make up a message, named in error and log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    MessageHeader,
    BlobProperties,
    UserMetadata,
    Blob,
    Delete,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordKind::MessageHeader => "message header",
            RecordKind::BlobProperties => "blob properties",
            RecordKind::UserMetadata => "user metadata",
            RecordKind::Blob => "blob",
            RecordKind::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by the record codecs.
///
/// No codec retries, recovers, or substitutes a default; every error is
/// propagated to the immediate caller, which decides whether to skip past
/// the corrupt region (seeking by the header's total size) or abort.
#[derive(Debug, Error)]
pub enum MessageFormatError {
    /// Underlying stream failure, truncation, or an out-of-range declared
    /// size.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A CRC comparison failed.
    #[error("{kind} record is corrupt: expected crc {expected:#010x}, actual crc {actual:#010x}")]
    DataCorrupt {
        kind: RecordKind,
        expected: u64,
        actual: u64,
    },

    /// The leading version tag does not match any registered generation.
    #[error("{kind} record version {version} is not supported")]
    UnknownFormatVersion { kind: RecordKind, version: u16 },

    /// The header's cross-field invariants are violated, either at serialize
    /// time (caller bug) or at verify time (corrupt or forged record).
    #[error("header constraint violated: {0}")]
    HeaderConstraint(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MessageFormatError>;

#[cfg(test)]
mod tests;
