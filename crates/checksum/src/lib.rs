//! # Checksum — CRC-32 accumulator and CRC-framed reader
//!
//! Integrity primitives shared by every record codec in the Rookery blob
//! store. Each on-disk record carries a trailing CRC-32 over all of its
//! preceding bytes, so both sides of the format need the same two tools:
//!
//! - [`Crc32`] — a streaming checksum that can be fed bytes in arbitrary
//!   chunks and sampled at any point.
//! - [`CrcReader`] — a `Read` adapter that transparently feeds every byte it
//!   delivers into an internal [`Crc32`], so a deserializer can consume a
//!   record's payload and then compare the accumulated value against the
//!   stored trailer without buffering the record.
//!
//! The polynomial is the IEEE 802.3 CRC-32 (the one `crc32fast` implements).
//! On disk the CRC occupies an 8-byte big-endian field, so the value is
//! carried as a `u64` with the upper 32 bits zero.
//!
//! ## Example
//!
//! ```rust
//! use checksum::{Crc32, CrcReader};
//! use std::io::Cursor;
//!
//! let mut crc = Crc32::new();
//! crc.update(b"123456789");
//! assert_eq!(crc.value(), 0xCBF4_3926);
//!
//! let mut reader = CrcReader::new(Cursor::new(vec![0x00, 0x01, 0xAB]));
//! assert_eq!(reader.read_u16_be().unwrap(), 1);
//! assert_eq!(reader.read_u8().unwrap(), 0xAB);
//! let _running = reader.crc_value();
//! ```

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{self, Read};

/// Streaming CRC-32 accumulator.
///
/// Deterministic and chunking-independent: feeding one large slice or an
/// equivalent sequence of smaller slices produces the same value. Not
/// thread-safe; codecs create a fresh instance per record.
#[derive(Clone, Default)]
pub struct Crc32 {
    hasher: crc32fast::Hasher,
}

impl Crc32 {
    /// Creates an accumulator with no bytes observed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hasher: crc32fast::Hasher::new(),
        }
    }

    /// Feeds `bytes` into the accumulator.
    pub fn update(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Returns the CRC over all bytes observed so far.
    ///
    /// The low 32 bits carry the CRC-32; the upper 32 bits are zero to match
    /// the 8-byte on-disk field width. Sampling does not reset or consume
    /// the accumulator.
    #[must_use]
    pub fn value(&self) -> u64 {
        u64::from(self.hasher.clone().finalize())
    }
}

impl std::fmt::Debug for Crc32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crc32").field("value", &self.value()).finish()
    }
}

/// A byte source that feeds every delivered byte through a [`Crc32`].
///
/// Wraps any `Read` implementor. The deserialization contract: consume a
/// record's payload through this reader, sample [`crc_value`], then read the
/// 8-byte trailer and compare. The trailer bytes pass through the
/// accumulator too, which is harmless because the value was sampled first.
///
/// A truncated source surfaces as `io::ErrorKind::UnexpectedEof` from the
/// typed reads.
///
/// [`crc_value`]: CrcReader::crc_value
pub struct CrcReader<R> {
    inner: R,
    crc: Crc32,
}

impl<R: Read> CrcReader<R> {
    /// Wraps `inner` with a fresh accumulator.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            crc: Crc32::new(),
        }
    }

    /// Returns the CRC over every byte read so far, without consuming input.
    #[must_use]
    pub fn crc_value(&self) -> u64 {
        self.crc.value()
    }

    /// Consumes the reader, returning the underlying source.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Reads one byte.
    pub fn read_u8(&mut self) -> io::Result<u8> {
        ReadBytesExt::read_u8(self)
    }

    /// Reads a big-endian `u16`.
    pub fn read_u16_be(&mut self) -> io::Result<u16> {
        ReadBytesExt::read_u16::<BigEndian>(self)
    }

    /// Reads a big-endian `i32`.
    pub fn read_i32_be(&mut self) -> io::Result<i32> {
        ReadBytesExt::read_i32::<BigEndian>(self)
    }

    /// Reads a big-endian `i64`.
    pub fn read_i64_be(&mut self) -> io::Result<i64> {
        ReadBytesExt::read_i64::<BigEndian>(self)
    }

    /// Reads a big-endian `u64` (the width of the on-disk CRC trailer).
    pub fn read_u64_be(&mut self) -> io::Result<u64> {
        ReadBytesExt::read_u64::<BigEndian>(self)
    }

    /// Reads exactly `len` bytes into a freshly allocated buffer.
    pub fn read_bytes(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }
}

impl<R: Read> Read for CrcReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.crc.update(&buf[..n]);
        Ok(n)
    }
}
