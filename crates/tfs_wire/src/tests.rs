use std::io::Cursor;

use tfs_types::{Handle, OpenFlags, Opcode, SessionId};

use crate::{encode_fixed_string, read_body, read_fixed_string, write_read_reply, write_status, Request};

#[test]
fn fixed_string_round_trips() {
    let encoded = encode_fixed_string("/hello").unwrap();
    let mut cursor = Cursor::new(encoded.to_vec());
    let decoded = read_fixed_string(&mut cursor).unwrap();
    assert_eq!(decoded, "/hello");
}

#[test]
fn fixed_string_rejects_overlong_names() {
    let too_long = "x".repeat(64);
    assert!(encode_fixed_string(&too_long).is_err());
}

#[test]
fn open_request_decodes_name_and_flags() {
    let name = encode_fixed_string("/a").unwrap();
    let mut body = Vec::new();
    body.extend_from_slice(&name);
    body.extend_from_slice(&OpenFlags::CREAT.bits().to_ne_bytes());
    let mut cursor = Cursor::new(body);

    let req = read_body(&mut cursor, Opcode::Open, Some(SessionId::new(3))).unwrap();
    match req {
        Request::Open { session_id, name, flags } => {
            assert_eq!(session_id, SessionId::new(3));
            assert_eq!(name, "/a");
            assert_eq!(flags, OpenFlags::CREAT);
        }
        other => panic!("unexpected request: {other:?}"),
    }
}

#[test]
fn write_request_decodes_length_prefixed_payload() {
    let mut body = Vec::new();
    body.extend_from_slice(&7i32.to_ne_bytes()); // handle
    body.extend_from_slice(&3u64.to_ne_bytes()); // len
    body.extend_from_slice(b"xyz");
    let mut cursor = Cursor::new(body);

    let req = read_body(&mut cursor, Opcode::Write, Some(SessionId::new(0))).unwrap();
    match req {
        Request::Write { handle, data, .. } => {
            assert_eq!(handle, Handle::new(7));
            assert_eq!(data, b"xyz");
        }
        other => panic!("unexpected request: {other:?}"),
    }
}

#[test]
fn write_request_rejects_oversized_length_without_reading_the_stream() {
    let mut body = Vec::new();
    body.extend_from_slice(&0i32.to_ne_bytes());
    body.extend_from_slice(&(usize::MAX as u64).to_ne_bytes());
    let mut cursor = Cursor::new(body);

    assert!(read_body(&mut cursor, Opcode::Write, Some(SessionId::new(0))).is_err());
}

#[test]
fn status_reply_is_four_bytes() {
    let mut out = Vec::new();
    write_status(&mut out, -1).unwrap();
    assert_eq!(out, (-1i32).to_ne_bytes());
}

#[test]
fn read_reply_omits_payload_on_non_positive_count() {
    let mut out = Vec::new();
    write_read_reply(&mut out, &[]).unwrap();
    assert_eq!(out, 0i32.to_ne_bytes());
}

#[test]
fn read_reply_includes_payload_when_nonempty() {
    let mut out = Vec::new();
    write_read_reply(&mut out, b"ab").unwrap();
    let mut expected = 2i32.to_ne_bytes().to_vec();
    expected.extend_from_slice(b"ab");
    assert_eq!(out, expected);
}
