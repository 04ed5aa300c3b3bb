use super::helpers::sample_properties;
use crate::{
    deserialize_blob, deserialize_blob_properties, deserialize_delete, deserialize_user_metadata,
    parse_header, serialize_delete_message, serialize_put_message, BlobPropertiesRecordV1,
    BlobRecordV1, DeleteRecordV1, MessageHeaderV1, UserMetadataRecordV1, INVALID_RELATIVE_OFFSET,
};
use anyhow::Result;
use std::fs::File;
use std::io::{Cursor, Read, Write};
use tempfile::tempdir;

// -------------------- Put message --------------------

#[test]
fn put_message_layout() {
    let properties = sample_properties();
    let user_metadata = [0xDE, 0xAD, 0xBE, 0xEF];
    let blob = b"hello world";

    let message = serialize_put_message(&properties, &user_metadata, blob).unwrap();

    let header = parse_header(&message).unwrap();
    header.verify().unwrap();

    let header_size = MessageHeaderV1::header_size();
    let properties_size = BlobPropertiesRecordV1::record_size(&properties);
    let metadata_size = UserMetadataRecordV1::record_size(&user_metadata);
    let blob_size = BlobRecordV1::record_size(blob.len() as i64);

    assert_eq!(
        header.total_size(),
        properties_size as i64 + metadata_size as i64 + blob_size
    );
    assert_eq!(message.len() as i64, header_size as i64 + header.total_size());

    assert_eq!(header.blob_properties_relative_offset(), header_size as i32);
    assert_eq!(header.delete_relative_offset(), INVALID_RELATIVE_OFFSET);
    assert_eq!(
        header.user_metadata_relative_offset(),
        (header_size + properties_size) as i32
    );
    assert_eq!(
        header.blob_relative_offset(),
        (header_size + properties_size + metadata_size) as i32
    );
}

#[test]
fn put_message_records_deserialize_at_offsets() {
    let properties = sample_properties();
    let user_metadata = [0xDE, 0xAD, 0xBE, 0xEF];
    let blob = b"hello world";

    let message = serialize_put_message(&properties, &user_metadata, blob).unwrap();
    let header = parse_header(&message).unwrap();
    header.verify().unwrap();

    let properties_offset = header.blob_properties_relative_offset() as usize;
    let metadata_offset = header.user_metadata_relative_offset() as usize;
    let blob_offset = header.blob_relative_offset() as usize;

    let read_properties = deserialize_blob_properties(&message[properties_offset..]).unwrap();
    assert_eq!(read_properties, properties);

    let read_metadata = deserialize_user_metadata(&message[metadata_offset..]).unwrap();
    assert_eq!(read_metadata, user_metadata);

    let output = deserialize_blob(&message[blob_offset..]).unwrap();
    assert_eq!(output.size(), blob.len() as i64);
    assert_eq!(output.into_bytes().unwrap(), blob);
}

#[test]
fn put_message_sequential_stream_consumption() {
    // A log scanner reads the header, then each sub-record, from one
    // stream in on-disk order.
    let properties = sample_properties();
    let user_metadata = [9u8, 8, 7];
    let blob = b"sequentially streamed blob";

    let message = serialize_put_message(&properties, &user_metadata, blob).unwrap();
    let mut stream = Cursor::new(message);

    let mut header_bytes = [0u8; 38];
    stream.read_exact(&mut header_bytes).unwrap();
    let header = parse_header(&header_bytes).unwrap();
    header.verify().unwrap();

    assert_eq!(
        deserialize_blob_properties(&mut stream).unwrap(),
        properties
    );
    assert_eq!(deserialize_user_metadata(&mut stream).unwrap(), user_metadata);

    let output = deserialize_blob(&mut stream).unwrap();
    assert_eq!(output.into_bytes().unwrap(), blob);

    // The whole message was consumed.
    let mut rest = Vec::new();
    stream.read_to_end(&mut rest).unwrap();
    assert!(rest.is_empty());
}

#[test]
fn put_message_with_empty_payloads() {
    let message = serialize_put_message(&crate::BlobProperties::default(), &[], &[]).unwrap();
    let header = parse_header(&message).unwrap();
    header.verify().unwrap();

    let metadata_offset = header.user_metadata_relative_offset() as usize;
    assert!(deserialize_user_metadata(&message[metadata_offset..])
        .unwrap()
        .is_empty());

    let blob_offset = header.blob_relative_offset() as usize;
    let output = deserialize_blob(&message[blob_offset..]).unwrap();
    assert_eq!(output.size(), 0);
    assert!(output.into_bytes().unwrap().is_empty());
}

// -------------------- Delete message --------------------

#[test]
fn delete_message_layout() {
    let message = serialize_delete_message().unwrap();

    let header = parse_header(&message).unwrap();
    header.verify().unwrap();

    assert_eq!(header.total_size(), DeleteRecordV1::record_size() as i64);
    assert_eq!(message.len(), 38 + DeleteRecordV1::record_size());
    assert_eq!(header.delete_relative_offset(), 38);
    assert_eq!(
        header.blob_properties_relative_offset(),
        INVALID_RELATIVE_OFFSET
    );
    assert_eq!(
        header.user_metadata_relative_offset(),
        INVALID_RELATIVE_OFFSET
    );
    assert_eq!(header.blob_relative_offset(), INVALID_RELATIVE_OFFSET);
}

#[test]
fn delete_message_roundtrip() {
    let message = serialize_delete_message().unwrap();
    let header = parse_header(&message).unwrap();
    header.verify().unwrap();

    let offset = header.delete_relative_offset() as usize;
    assert!(deserialize_delete(&message[offset..]).unwrap());
}

// -------------------- File round trips --------------------

#[test]
fn put_message_file_roundtrip() -> Result<()> {
    let properties = sample_properties();
    let user_metadata = [0x11u8, 0x22, 0x33];
    let blob: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();

    let dir = tempdir()?;
    let path = dir.path().join("message.log");

    let message = serialize_put_message(&properties, &user_metadata, &blob)?;
    File::create(&path)?.write_all(&message)?;

    let mut file = File::open(&path)?;
    let mut header_bytes = [0u8; 38];
    file.read_exact(&mut header_bytes)?;
    let header = parse_header(&header_bytes)?;
    header.verify()?;

    assert_eq!(deserialize_blob_properties(&mut file)?, properties);
    assert_eq!(deserialize_user_metadata(&mut file)?, user_metadata);

    let mut output = deserialize_blob(&mut file)?;
    let mut streamed = Vec::new();
    output.read_to_end(&mut streamed)?;
    assert_eq!(streamed, blob);
    output.verify()?;

    Ok(())
}

#[test]
fn concatenated_messages_scan() -> Result<()> {
    // Two messages back to back, the way the append-only log stores them:
    // a put followed by its delete tombstone.
    let put = serialize_put_message(&sample_properties(), &[0xAA], b"doomed blob")?;
    let delete = serialize_delete_message()?;

    let dir = tempdir()?;
    let path = dir.path().join("store.log");
    let mut writer = File::create(&path)?;
    writer.write_all(&put)?;
    writer.write_all(&delete)?;
    drop(writer);

    let mut file = File::open(&path)?;

    // First message: header says put; skip past it using total_size.
    let mut header_bytes = [0u8; 38];
    file.read_exact(&mut header_bytes)?;
    let header = parse_header(&header_bytes)?;
    header.verify()?;
    assert!(header.blob_properties_relative_offset() > 0);
    let payload_size = header.total_size() as usize;
    let mut payload = vec![0u8; payload_size];
    file.read_exact(&mut payload)?;

    // Second message: delete.
    file.read_exact(&mut header_bytes)?;
    let header = parse_header(&header_bytes)?;
    header.verify()?;
    assert!(header.delete_relative_offset() > 0);
    assert!(deserialize_delete(&mut file)?);

    Ok(())
}

#[test]
fn header_only_parse_skips_blob_cost() {
    // A consumer discovering offsets and sizes never touches the payload.
    let blob = vec![0x77u8; 50_000];
    let message = serialize_put_message(&sample_properties(), &[], &blob).unwrap();

    let header = parse_header(&message[..38]).unwrap();
    header.verify().unwrap();
    assert_eq!(header.total_size() + 38, message.len() as i64);
}
