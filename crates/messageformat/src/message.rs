//! Message assembly.
//!
//! Composes the header and sub-record primitives into the two legal message
//! shapes. A message is built once, serialized into a pre-sized buffer of
//! exactly `header_size + total_size` bytes, and immutable thereafter — a
//! deletion is expressed as a separate delete message, never as an edit.

use std::io;

use crate::header::MessageHeaderV1;
use crate::records::{BlobPropertiesRecordV1, BlobRecordV1, DeleteRecordV1, UserMetadataRecordV1};
use crate::{BlobProperties, MessageFormatError, Result, INVALID_RELATIVE_OFFSET};

fn offset_to_i32(offset: usize) -> Result<i32> {
    i32::try_from(offset).map_err(|_| {
        MessageFormatError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "record offset {} does not fit the header's 4-byte offset field",
                offset
            ),
        ))
    })
}

/// Serializes a complete put message: header, blob properties record, user
/// metadata record, blob record, in that order.
///
/// Relative offsets are measured from the start of the message including
/// the header, so the blob properties record sits at offset 38. The
/// returned buffer is pre-sized to `header_size + total_size` and exactly
/// filled.
///
/// # Errors
///
/// `Io` if any record offset does not fit the header's 4-byte offset
/// fields or a record payload overflows its size field.
pub fn serialize_put_message(
    properties: &BlobProperties,
    user_metadata: &[u8],
    blob_content: &[u8],
) -> Result<Vec<u8>> {
    let header_size = MessageHeaderV1::header_size();
    let properties_record_size = BlobPropertiesRecordV1::record_size(properties);
    let user_metadata_record_size = UserMetadataRecordV1::record_size(user_metadata);
    let blob_record_size = BlobRecordV1::record_size(blob_content.len() as i64);

    let total_size =
        properties_record_size as i64 + user_metadata_record_size as i64 + blob_record_size;

    let blob_properties_offset = offset_to_i32(header_size)?;
    let user_metadata_offset = offset_to_i32(header_size + properties_record_size)?;
    let blob_offset =
        offset_to_i32(header_size + properties_record_size + user_metadata_record_size)?;

    let mut output = Vec::with_capacity(header_size + total_size as usize);
    MessageHeaderV1::serialize_header(
        &mut output,
        total_size,
        blob_properties_offset,
        INVALID_RELATIVE_OFFSET,
        user_metadata_offset,
        blob_offset,
    )?;
    BlobPropertiesRecordV1::serialize(&mut output, properties)?;
    UserMetadataRecordV1::serialize(&mut output, user_metadata)?;
    BlobRecordV1::serialize(&mut output, blob_content)?;

    debug_assert_eq!(output.len(), header_size + total_size as usize);
    Ok(output)
}

/// Serializes a complete delete message: header plus a delete record with
/// the flag set.
pub fn serialize_delete_message() -> Result<Vec<u8>> {
    let header_size = MessageHeaderV1::header_size();
    let delete_record_size = DeleteRecordV1::record_size();
    let total_size = delete_record_size as i64;
    let delete_offset = offset_to_i32(header_size)?;

    let mut output = Vec::with_capacity(header_size + delete_record_size);
    MessageHeaderV1::serialize_header(
        &mut output,
        total_size,
        INVALID_RELATIVE_OFFSET,
        delete_offset,
        INVALID_RELATIVE_OFFSET,
        INVALID_RELATIVE_OFFSET,
    )?;
    DeleteRecordV1::serialize(&mut output, true)?;

    debug_assert_eq!(output.len(), header_size + delete_record_size);
    Ok(output)
}
