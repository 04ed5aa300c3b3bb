//! Message header codec.
//!
//! The header is the fixed-width prologue of every message. It names the
//! payload size and the relative positions of the sub-records, and its
//! cross-field constraints are what make the two message shapes mutually
//! exclusive: a put message points at blob properties, user metadata, and
//! blob records; a delete message points at a delete record and nothing
//! else. Offsets are measured from the start of the message, including the
//! header itself, so the first sub-record of either shape sits at byte 38.

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use checksum::Crc32;
use std::io;

use crate::{
    MessageFormatError, RecordKind, Result, CRC_SIZE_BYTES, INVALID_RELATIVE_OFFSET,
    MESSAGE_HEADER_VERSION_V1, VERSION_FIELD_SIZE_BYTES,
};

// Field layout, V1. Each offset is the byte position of the field within
// the serialized header.
const TOTAL_SIZE_FIELD_OFFSET: usize = VERSION_FIELD_SIZE_BYTES;
const TOTAL_SIZE_FIELD_SIZE: usize = 8;

const RELATIVE_OFFSET_FIELD_SIZE: usize = 4;
const BLOB_PROPERTIES_RELATIVE_OFFSET_FIELD_OFFSET: usize =
    TOTAL_SIZE_FIELD_OFFSET + TOTAL_SIZE_FIELD_SIZE;
const DELETE_RELATIVE_OFFSET_FIELD_OFFSET: usize =
    BLOB_PROPERTIES_RELATIVE_OFFSET_FIELD_OFFSET + RELATIVE_OFFSET_FIELD_SIZE;
const USER_METADATA_RELATIVE_OFFSET_FIELD_OFFSET: usize =
    DELETE_RELATIVE_OFFSET_FIELD_OFFSET + RELATIVE_OFFSET_FIELD_SIZE;
const BLOB_RELATIVE_OFFSET_FIELD_OFFSET: usize =
    USER_METADATA_RELATIVE_OFFSET_FIELD_OFFSET + RELATIVE_OFFSET_FIELD_SIZE;

const CRC_FIELD_OFFSET: usize = BLOB_RELATIVE_OFFSET_FIELD_OFFSET + RELATIVE_OFFSET_FIELD_SIZE;

/// Non-copying view over a serialized V1 message header.
///
/// Constructed by [`crate::parse_header`], which routes on the leading
/// version tag. The view offers typed getters for every field; callers that
/// need integrity and shape guarantees follow up with [`verify`].
///
/// [`verify`]: MessageHeaderV1::verify
#[derive(Debug, Clone, Copy)]
pub struct MessageHeaderV1<'a> {
    buffer: &'a [u8],
}

impl<'a> MessageHeaderV1<'a> {
    /// Serialized size of a V1 header: 38 bytes.
    #[must_use]
    pub const fn header_size() -> usize {
        VERSION_FIELD_SIZE_BYTES
            + TOTAL_SIZE_FIELD_SIZE
            + 4 * RELATIVE_OFFSET_FIELD_SIZE
            + CRC_SIZE_BYTES
    }

    /// Serializes a header into `output`, appending exactly
    /// [`header_size`](Self::header_size) bytes.
    ///
    /// The cross-field constraints are checked before anything is written:
    /// `total_size` must be positive, and the four offsets must form either
    /// a put message (`blob_properties_relative_offset`,
    /// `user_metadata_relative_offset`, and `blob_relative_offset` positive,
    /// `delete_relative_offset` invalid) or a delete message
    /// (`delete_relative_offset` positive, the rest invalid). The CRC is
    /// computed over the 30 bytes written and appended as the 8-byte
    /// trailer.
    ///
    /// # Errors
    ///
    /// [`MessageFormatError::HeaderConstraint`] if the fields match neither
    /// message shape.
    pub fn serialize_header(
        output: &mut Vec<u8>,
        total_size: i64,
        blob_properties_relative_offset: i32,
        delete_relative_offset: i32,
        user_metadata_relative_offset: i32,
        blob_relative_offset: i32,
    ) -> Result<()> {
        check_header_constraints(
            total_size,
            blob_properties_relative_offset,
            delete_relative_offset,
            user_metadata_relative_offset,
            blob_relative_offset,
        )?;

        let start = output.len();
        output.write_u16::<BigEndian>(MESSAGE_HEADER_VERSION_V1)?;
        output.write_i64::<BigEndian>(total_size)?;
        output.write_i32::<BigEndian>(blob_properties_relative_offset)?;
        output.write_i32::<BigEndian>(delete_relative_offset)?;
        output.write_i32::<BigEndian>(user_metadata_relative_offset)?;
        output.write_i32::<BigEndian>(blob_relative_offset)?;

        let mut crc = Crc32::new();
        crc.update(&output[start..]);
        let crc_value = crc.value();
        output.write_u64::<BigEndian>(crc_value)?;

        tracing::trace!(
            version = MESSAGE_HEADER_VERSION_V1,
            total_size,
            blob_properties_relative_offset,
            delete_relative_offset,
            user_metadata_relative_offset,
            blob_relative_offset,
            crc = crc_value,
            "serializing message header"
        );
        Ok(())
    }

    /// Creates a view over `buffer`, which must hold at least
    /// [`header_size`](Self::header_size) bytes. A longer slice (for
    /// instance a whole message) is fine; only the header prefix is viewed.
    ///
    /// No validation beyond the length check happens here — call
    /// [`verify`](Self::verify) before trusting the fields.
    pub fn new(buffer: &'a [u8]) -> Result<Self> {
        if buffer.len() < Self::header_size() {
            return Err(MessageFormatError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "message header requires {} bytes, got {}",
                    Self::header_size(),
                    buffer.len()
                ),
            )));
        }
        Ok(Self {
            buffer: &buffer[..Self::header_size()],
        })
    }

    /// The header format generation.
    #[must_use]
    pub fn version(&self) -> u16 {
        BigEndian::read_u16(&self.buffer[..VERSION_FIELD_SIZE_BYTES])
    }

    /// Size of the message payload following the header.
    #[must_use]
    pub fn total_size(&self) -> i64 {
        BigEndian::read_i64(&self.buffer[TOTAL_SIZE_FIELD_OFFSET..])
    }

    /// Offset of the blob properties record, or
    /// [`INVALID_RELATIVE_OFFSET`](crate::INVALID_RELATIVE_OFFSET).
    #[must_use]
    pub fn blob_properties_relative_offset(&self) -> i32 {
        BigEndian::read_i32(&self.buffer[BLOB_PROPERTIES_RELATIVE_OFFSET_FIELD_OFFSET..])
    }

    /// Offset of the delete record, or
    /// [`INVALID_RELATIVE_OFFSET`](crate::INVALID_RELATIVE_OFFSET).
    #[must_use]
    pub fn delete_relative_offset(&self) -> i32 {
        BigEndian::read_i32(&self.buffer[DELETE_RELATIVE_OFFSET_FIELD_OFFSET..])
    }

    /// Offset of the user metadata record, or
    /// [`INVALID_RELATIVE_OFFSET`](crate::INVALID_RELATIVE_OFFSET).
    #[must_use]
    pub fn user_metadata_relative_offset(&self) -> i32 {
        BigEndian::read_i32(&self.buffer[USER_METADATA_RELATIVE_OFFSET_FIELD_OFFSET..])
    }

    /// Offset of the blob record, or
    /// [`INVALID_RELATIVE_OFFSET`](crate::INVALID_RELATIVE_OFFSET).
    #[must_use]
    pub fn blob_relative_offset(&self) -> i32 {
        BigEndian::read_i32(&self.buffer[BLOB_RELATIVE_OFFSET_FIELD_OFFSET..])
    }

    /// The stored CRC trailer.
    #[must_use]
    pub fn crc(&self) -> u64 {
        BigEndian::read_u64(&self.buffer[CRC_FIELD_OFFSET..])
    }

    /// Validates integrity and structure: recomputes the CRC over the first
    /// 30 bytes and compares against the trailer, then re-checks the
    /// cross-field constraints.
    ///
    /// # Errors
    ///
    /// [`MessageFormatError::DataCorrupt`] on CRC mismatch,
    /// [`MessageFormatError::HeaderConstraint`] on a shape violation.
    pub fn verify(&self) -> Result<()> {
        self.verify_crc()?;
        check_header_constraints(
            self.total_size(),
            self.blob_properties_relative_offset(),
            self.delete_relative_offset(),
            self.user_metadata_relative_offset(),
            self.blob_relative_offset(),
        )
    }

    fn verify_crc(&self) -> Result<()> {
        let mut crc = Crc32::new();
        crc.update(&self.buffer[..CRC_FIELD_OFFSET]);
        let actual = crc.value();
        let expected = self.crc();
        if actual != expected {
            tracing::error!(
                kind = %RecordKind::MessageHeader,
                expected_crc = expected,
                actual_crc = actual,
                "corrupt data while verifying message header"
            );
            return Err(MessageFormatError::DataCorrupt {
                kind: RecordKind::MessageHeader,
                expected,
                actual,
            });
        }
        Ok(())
    }
}

/// Enforces the header cross-field invariants, in fixed order: total size
/// first, then the put shape, then the delete shape. A header matching
/// neither shape is rejected — zero is not a legal offset for any field.
fn check_header_constraints(
    total_size: i64,
    blob_properties_relative_offset: i32,
    delete_relative_offset: i32,
    user_metadata_relative_offset: i32,
    blob_relative_offset: i32,
) -> Result<()> {
    if total_size <= 0 {
        return constraint_violation(format!(
            "total size {} must be greater than 0",
            total_size
        ));
    }

    if blob_properties_relative_offset > 0 {
        if delete_relative_offset != INVALID_RELATIVE_OFFSET
            || user_metadata_relative_offset <= 0
            || blob_relative_offset <= 0
        {
            return constraint_violation(format!(
                "blob properties relative offset {} is positive but the other offsets do not \
                 form a put message (delete {}, user metadata {}, blob {})",
                blob_properties_relative_offset,
                delete_relative_offset,
                user_metadata_relative_offset,
                blob_relative_offset
            ));
        }
        return Ok(());
    }

    if delete_relative_offset > 0 {
        if blob_properties_relative_offset != INVALID_RELATIVE_OFFSET
            || user_metadata_relative_offset != INVALID_RELATIVE_OFFSET
            || blob_relative_offset != INVALID_RELATIVE_OFFSET
        {
            return constraint_violation(format!(
                "delete relative offset {} is positive but the other offsets are not all \
                 invalid (blob properties {}, user metadata {}, blob {})",
                delete_relative_offset,
                blob_properties_relative_offset,
                user_metadata_relative_offset,
                blob_relative_offset
            ));
        }
        return Ok(());
    }

    constraint_violation(format!(
        "offsets match neither a put nor a delete message (blob properties {}, delete {}, \
         user metadata {}, blob {})",
        blob_properties_relative_offset,
        delete_relative_offset,
        user_metadata_relative_offset,
        blob_relative_offset
    ))
}

fn constraint_violation(reason: String) -> Result<()> {
    tracing::error!(
        kind = %RecordKind::MessageHeader,
        constraint = %reason,
        "message header constraint violated"
    );
    Err(MessageFormatError::HeaderConstraint(reason))
}
