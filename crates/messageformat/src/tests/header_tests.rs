use crate::{
    parse_header, MessageFormatError, MessageHeaderV1, INVALID_RELATIVE_OFFSET,
    MESSAGE_HEADER_VERSION_V1,
};
use checksum::Crc32;

const INVALID: i32 = INVALID_RELATIVE_OFFSET;

fn serialize(total: i64, bp: i32, del: i32, um: i32, blob: i32) -> crate::Result<Vec<u8>> {
    let mut buf = Vec::new();
    MessageHeaderV1::serialize_header(&mut buf, total, bp, del, um, blob)?;
    Ok(buf)
}

// -------------------- Size and layout --------------------

#[test]
fn header_size_is_38() {
    assert_eq!(MessageHeaderV1::header_size(), 38);
}

#[test]
fn put_header_serialized_bytes() {
    // total = 100, props at 38, delete invalid, metadata at 58, blob at 72.
    let buf = serialize(100, 38, INVALID, 58, 72).unwrap();
    assert_eq!(buf.len(), 38);

    let expected_prefix: [u8; 26] = [
        0x00, 0x01, // version
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x64, // total_size = 100
        0x00, 0x00, 0x00, 0x26, // blob properties offset = 38
        0xFF, 0xFF, 0xFF, 0xFF, // delete offset = -1
        0x00, 0x00, 0x00, 0x3A, // user metadata offset = 58
        0x00, 0x00, 0x00, 0x48, // blob offset = 72
    ];
    assert_eq!(&buf[..26], &expected_prefix);

    let mut crc = Crc32::new();
    crc.update(&expected_prefix);
    assert_eq!(&buf[26..], &crc.value().to_be_bytes());
}

// -------------------- Round trips --------------------

#[test]
fn put_header_roundtrip() {
    let buf = serialize(100, 38, INVALID, 58, 72).unwrap();

    let header = parse_header(&buf).unwrap();
    assert_eq!(header.version(), MESSAGE_HEADER_VERSION_V1);
    assert_eq!(header.total_size(), 100);
    assert_eq!(header.blob_properties_relative_offset(), 38);
    assert_eq!(header.delete_relative_offset(), INVALID);
    assert_eq!(header.user_metadata_relative_offset(), 58);
    assert_eq!(header.blob_relative_offset(), 72);
    header.verify().unwrap();
}

#[test]
fn delete_header_roundtrip() {
    let buf = serialize(11, INVALID, 38, INVALID, INVALID).unwrap();

    let header = parse_header(&buf).unwrap();
    assert_eq!(header.total_size(), 11);
    assert_eq!(header.blob_properties_relative_offset(), INVALID);
    assert_eq!(header.delete_relative_offset(), 38);
    assert_eq!(header.user_metadata_relative_offset(), INVALID);
    assert_eq!(header.blob_relative_offset(), INVALID);
    header.verify().unwrap();
}

#[test]
fn parse_accepts_longer_buffer() {
    // A view over a whole message only looks at the header prefix.
    let mut buf = serialize(100, 38, INVALID, 58, 72).unwrap();
    buf.extend_from_slice(&[0xAB; 100]);

    let header = parse_header(&buf).unwrap();
    header.verify().unwrap();
    assert_eq!(header.total_size(), 100);
}

// -------------------- Shape exclusivity --------------------

#[test]
fn mixed_put_and_delete_offsets_rejected() {
    let result = serialize(100, 38, 50, 58, 72);
    assert!(matches!(result, Err(MessageFormatError::HeaderConstraint(_))));
}

#[test]
fn zero_is_not_a_legal_offset() {
    // Zero in any field breaks the shape it would otherwise match.
    for (bp, del, um, blob) in [
        (0, INVALID, 58, 72),
        (38, INVALID, 0, 72),
        (38, INVALID, 58, 0),
        (0, 0, 0, 0),
    ] {
        let result = serialize(100, bp, del, um, blob);
        assert!(
            matches!(result, Err(MessageFormatError::HeaderConstraint(_))),
            "offsets ({}, {}, {}, {}) should be rejected",
            bp,
            del,
            um,
            blob
        );
    }
}

#[test]
fn all_invalid_offsets_rejected() {
    let result = serialize(100, INVALID, INVALID, INVALID, INVALID);
    assert!(matches!(result, Err(MessageFormatError::HeaderConstraint(_))));
}

#[test]
fn delete_shape_with_stray_offset_rejected() {
    for (bp, um, blob) in [(38, INVALID, INVALID), (INVALID, 58, INVALID), (INVALID, INVALID, 72)]
    {
        let result = serialize(11, bp, 38, um, blob);
        assert!(
            matches!(result, Err(MessageFormatError::HeaderConstraint(_))),
            "delete header with stray offset ({}, {}, {}) should be rejected",
            bp,
            um,
            blob
        );
    }
}

#[test]
fn total_size_must_be_positive() {
    for total in [0, -1, i64::MIN] {
        let result = serialize(total, 38, INVALID, 58, 72);
        assert!(matches!(result, Err(MessageFormatError::HeaderConstraint(_))));
    }
}

#[test]
fn valid_shapes_accepted() {
    serialize(1, 38, INVALID, 58, 72).unwrap();
    serialize(1, INVALID, 38, INVALID, INVALID).unwrap();
}

// -------------------- Corruption detection --------------------

#[test]
fn corrupt_header_crc_mismatch() {
    let mut buf = serialize(100, 38, INVALID, 58, 72).unwrap();
    buf[5] ^= 0x01; // flip a bit in total_size

    let header = parse_header(&buf).unwrap();
    let result = header.verify();
    assert!(matches!(result, Err(MessageFormatError::DataCorrupt { .. })));
}

#[test]
fn corrupt_crc_trailer_detected() {
    let mut buf = serialize(100, 38, INVALID, 58, 72).unwrap();
    buf[37] ^= 0x80;

    let header = parse_header(&buf).unwrap();
    let result = header.verify();
    assert!(matches!(result, Err(MessageFormatError::DataCorrupt { .. })));
}

#[test]
fn forged_header_with_valid_crc_fails_constraints() {
    // Hand-craft a header whose CRC is correct but whose offsets match
    // neither shape: CRC verification must pass, constraints must fail.
    let mut buf = Vec::new();
    buf.extend_from_slice(&1u16.to_be_bytes());
    buf.extend_from_slice(&100i64.to_be_bytes());
    buf.extend_from_slice(&38i32.to_be_bytes()); // blob properties offset
    buf.extend_from_slice(&50i32.to_be_bytes()); // delete offset (conflict)
    buf.extend_from_slice(&58i32.to_be_bytes());
    buf.extend_from_slice(&72i32.to_be_bytes());
    let mut crc = Crc32::new();
    crc.update(&buf);
    let value = crc.value();
    buf.extend_from_slice(&value.to_be_bytes());

    let header = parse_header(&buf).unwrap();
    let result = header.verify();
    assert!(matches!(result, Err(MessageFormatError::HeaderConstraint(_))));
}

// -------------------- Version gate and truncation --------------------

#[test]
fn unknown_header_version_rejected() {
    let buf = serialize(100, 38, INVALID, 58, 72).unwrap();
    for version in [0u16, 2, 0xFFFF] {
        let forged = super::helpers::with_version(&buf, version);
        let result = parse_header(&forged);
        assert!(matches!(
            result,
            Err(MessageFormatError::UnknownFormatVersion { version: v, .. }) if v == version
        ));
    }
}

#[test]
fn truncated_header_rejected() {
    let buf = serialize(100, 38, INVALID, 58, 72).unwrap();
    for len in [0, 1, 2, 20, 37] {
        let result = parse_header(&buf[..len]);
        assert!(matches!(result, Err(MessageFormatError::Io(_))), "len {}", len);
    }
}
