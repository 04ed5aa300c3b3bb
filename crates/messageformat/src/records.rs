//! Sub-record codecs.
//!
//! One unit struct per (record kind, format generation). Each codec exposes
//! the same surface — `record_size`, `serialize`, `deserialize` — and owns
//! one fixed layout. Serialization appends to the caller's buffer and
//! finishes with a CRC-32 over every byte the codec wrote; deserialization
//! assumes the version tag was already consumed by the [`crate::dispatch`]
//! entry point and consumes payload plus trailer through a [`CrcReader`].
//!
//! The blob codec is the one asymmetric member: its record can be far too
//! large to buffer, so reading yields a [`BlobOutput`] whose content is a
//! lazy stream, and writing offers [`BlobRecordV1::serialize_partial`] for
//! producers that stream content bytes directly.

use byteorder::{BigEndian, WriteBytesExt};
use checksum::{Crc32, CrcReader};
use std::io::{self, Read};

use crate::properties::{blob_properties_size, get_blob_properties, put_blob_properties};
use crate::{
    BlobProperties, MessageFormatError, RecordKind, Result, BLOB_PROPERTIES_VERSION_V1,
    BLOB_VERSION_V1, CRC_SIZE_BYTES, DELETE_VERSION_V1, USER_METADATA_VERSION_V1,
    VERSION_FIELD_SIZE_BYTES,
};

/// Samples the accumulated CRC, reads the 8-byte trailer, and compares.
fn read_and_validate_crc<R: Read>(reader: &mut CrcReader<R>, kind: RecordKind) -> Result<()> {
    let actual = reader.crc_value();
    let expected = reader.read_u64_be()?;
    if actual != expected {
        tracing::error!(
            kind = %kind,
            expected_crc = expected,
            actual_crc = actual,
            "corrupt data while parsing record"
        );
        return Err(MessageFormatError::DataCorrupt {
            kind,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Blob properties record, generation 1.
///
/// ```text
/// [version: u16][properties payload ...][crc: u64]
/// ```
///
/// The payload layout belongs to the properties serde
/// ([`crate::properties`]); this codec contributes the version prefix and
/// the CRC trailer.
pub struct BlobPropertiesRecordV1;

impl BlobPropertiesRecordV1 {
    /// Serialized record size for the given properties.
    #[must_use]
    pub fn record_size(properties: &BlobProperties) -> usize {
        VERSION_FIELD_SIZE_BYTES + blob_properties_size(properties) + CRC_SIZE_BYTES
    }

    /// Appends the full record to `output`.
    pub fn serialize(output: &mut Vec<u8>, properties: &BlobProperties) -> Result<()> {
        let start = output.len();
        output.write_u16::<BigEndian>(BLOB_PROPERTIES_VERSION_V1)?;
        put_blob_properties(output, properties)?;
        let mut crc = Crc32::new();
        crc.update(&output[start..]);
        output.write_u64::<BigEndian>(crc.value())?;
        Ok(())
    }

    pub(crate) fn deserialize<R: Read>(reader: &mut CrcReader<R>) -> Result<BlobProperties> {
        let properties = get_blob_properties(reader)?;
        read_and_validate_crc(reader, RecordKind::BlobProperties)?;
        Ok(properties)
    }
}

/// User metadata record, generation 1.
///
/// ```text
/// [version: u16][size: i32][content ...][crc: u64]
/// ```
pub struct UserMetadataRecordV1;

impl UserMetadataRecordV1 {
    const SIZE_FIELD_SIZE: usize = 4;

    /// Serialized record size for `n` content bytes: `14 + n`.
    #[must_use]
    pub fn record_size(user_metadata: &[u8]) -> usize {
        VERSION_FIELD_SIZE_BYTES + Self::SIZE_FIELD_SIZE + user_metadata.len() + CRC_SIZE_BYTES
    }

    /// Appends the full record to `output`.
    ///
    /// # Errors
    ///
    /// `Io` if the content length does not fit the 4-byte size field.
    pub fn serialize(output: &mut Vec<u8>, user_metadata: &[u8]) -> Result<()> {
        let size = i32::try_from(user_metadata.len()).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "user metadata of {} bytes exceeds the maximum of {}",
                    user_metadata.len(),
                    i32::MAX
                ),
            )
        })?;

        let start = output.len();
        output.write_u16::<BigEndian>(USER_METADATA_VERSION_V1)?;
        output.write_i32::<BigEndian>(size)?;
        output.extend_from_slice(user_metadata);
        let mut crc = Crc32::new();
        crc.update(&output[start..]);
        output.write_u64::<BigEndian>(crc.value())?;
        Ok(())
    }

    /// Reads the declared size, allocates exactly that many bytes, fills
    /// them from the stream, and validates the CRC before returning.
    pub(crate) fn deserialize<R: Read>(reader: &mut CrcReader<R>) -> Result<Vec<u8>> {
        let size = reader.read_i32_be()?;
        if size < 0 {
            return Err(MessageFormatError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("user metadata record declares a negative size {}", size),
            )));
        }
        let content = reader.read_bytes(size as usize)?;
        read_and_validate_crc(reader, RecordKind::UserMetadata)?;
        Ok(content)
    }
}

/// Blob record, generation 1.
///
/// ```text
/// [version: u16][size: i64][content ...][crc: u64]
/// ```
///
/// The size field is 8 bytes wide on disk, but the deserializer rejects
/// declared sizes above `i32::MAX` — the in-memory delivery type is bounded
/// at 32 bits.
pub struct BlobRecordV1;

impl BlobRecordV1 {
    const SIZE_FIELD_SIZE: usize = 8;

    /// Serialized record size for `blob_size` content bytes: `18 + n`.
    #[must_use]
    pub fn record_size(blob_size: i64) -> i64 {
        (VERSION_FIELD_SIZE_BYTES + Self::SIZE_FIELD_SIZE + CRC_SIZE_BYTES) as i64 + blob_size
    }

    /// Appends the full record to `output` from in-memory content.
    pub fn serialize(output: &mut Vec<u8>, content: &[u8]) -> Result<()> {
        let start = output.len();
        output.write_u16::<BigEndian>(BLOB_VERSION_V1)?;
        output.write_i64::<BigEndian>(content.len() as i64)?;
        output.extend_from_slice(content);
        let mut crc = Crc32::new();
        crc.update(&output[start..]);
        output.write_u64::<BigEndian>(crc.value())?;
        Ok(())
    }

    /// Appends only the version and size prefix, leaving the caller to
    /// stream the content bytes and append the CRC trailer itself.
    ///
    /// This is the zero-copy path for blobs too large to buffer: the caller
    /// owns a [`Crc32`], feeds it the prefix bytes written here plus every
    /// content byte it streams, and finishes the record with the 8-byte
    /// big-endian CRC value.
    pub fn serialize_partial(output: &mut Vec<u8>, blob_size: i64) -> Result<()> {
        output.write_u16::<BigEndian>(BLOB_VERSION_V1)?;
        output.write_i64::<BigEndian>(blob_size)?;
        Ok(())
    }

    /// Reads the declared size and hands back a lazy [`BlobOutput`] without
    /// touching the content bytes.
    ///
    /// # Errors
    ///
    /// `Io` if the declared size is negative or above `i32::MAX`, before
    /// any content byte is read.
    pub(crate) fn deserialize<R: Read>(mut reader: CrcReader<R>) -> Result<BlobOutput<R>> {
        let size = reader.read_i64_be()?;
        if size < 0 || size > i64::from(i32::MAX) {
            return Err(MessageFormatError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "blob record declares size {} outside the supported range [0, {}]",
                    size,
                    i32::MAX
                ),
            )));
        }
        Ok(BlobOutput {
            size,
            remaining: size as u64,
            reader,
        })
    }
}

/// The result of deserializing a blob record: the declared size plus a lazy
/// stream over the content.
///
/// The content is **not** buffered. Read up to `size` bytes through the
/// `Read` implementation, then call [`verify`](Self::verify) to validate
/// the CRC trailer (any unconsumed content is drained first), or use
/// [`into_bytes`](Self::into_bytes) to do both in one step. The underlying
/// stream must not be used for anything else until one of those completes.
pub struct BlobOutput<R: Read> {
    size: i64,
    remaining: u64,
    reader: CrcReader<R>,
}

impl<R: Read> BlobOutput<R> {
    /// The declared content size in bytes.
    #[must_use]
    pub fn size(&self) -> i64 {
        self.size
    }

    /// Drains any unconsumed content, then validates the CRC trailer.
    ///
    /// On success the underlying stream is returned, positioned just past
    /// the record, so a consumer can continue reading subsequent records.
    ///
    /// # Errors
    ///
    /// `Io(UnexpectedEof)` if the stream ends before the declared content
    /// size, [`MessageFormatError::DataCorrupt`] on CRC mismatch.
    pub fn verify(mut self) -> Result<R> {
        if self.remaining > 0 {
            let drained = io::copy(
                &mut (&mut self.reader).take(self.remaining),
                &mut io::sink(),
            )?;
            if drained < self.remaining {
                return Err(MessageFormatError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "blob content truncated: {} of {} bytes missing",
                        self.remaining - drained,
                        self.size
                    ),
                )));
            }
        }
        read_and_validate_crc(&mut self.reader, RecordKind::Blob)?;
        Ok(self.reader.into_inner())
    }

    /// Buffered convenience: reads all remaining content, validates the
    /// CRC, and returns the content bytes.
    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        let mut content = vec![0u8; self.remaining as usize];
        self.reader.read_exact(&mut content)?;
        self.remaining = 0;
        self.verify()?;
        Ok(content)
    }
}

impl<R: Read> Read for BlobOutput<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Ok(0);
        }
        let cap = buf.len().min(self.remaining as usize);
        let n = self.reader.read(&mut buf[..cap])?;
        self.remaining -= n as u64;
        Ok(n)
    }
}

/// Delete record, generation 1.
///
/// ```text
/// [version: u16][flag: u8][crc: u64]
/// ```
///
/// The flag is a full byte rather than a bit to leave room for a future
/// undelete or state encoding; 1 means deleted.
pub struct DeleteRecordV1;

impl DeleteRecordV1 {
    const FLAG_FIELD_SIZE: usize = 1;

    /// Serialized record size: always 11 bytes.
    #[must_use]
    pub fn record_size() -> usize {
        VERSION_FIELD_SIZE_BYTES + Self::FLAG_FIELD_SIZE + CRC_SIZE_BYTES
    }

    /// Appends the full record to `output`.
    pub fn serialize(output: &mut Vec<u8>, delete_flag: bool) -> Result<()> {
        let start = output.len();
        output.write_u16::<BigEndian>(DELETE_VERSION_V1)?;
        output.write_u8(u8::from(delete_flag))?;
        let mut crc = Crc32::new();
        crc.update(&output[start..]);
        output.write_u64::<BigEndian>(crc.value())?;
        Ok(())
    }

    /// Reads the flag byte and validates the CRC; returns `flag == 1`.
    pub(crate) fn deserialize<R: Read>(reader: &mut CrcReader<R>) -> Result<bool> {
        let is_deleted = reader.read_u8()? == 1;
        read_and_validate_crc(reader, RecordKind::Delete)?;
        Ok(is_deleted)
    }
}
