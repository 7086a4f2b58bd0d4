//! Body framing with and without the `content-length` header.

use bytes::BytesMut;
use stomp_core::codec::{StompCodec, StompItem};
use stomp_core::{StompParser, Version};
use tokio_util::codec::Decoder;

fn decode_one(raw: &[u8]) -> StompItem {
    let mut codec = StompCodec::new(Version::V1_2);
    let mut buf = BytesMut::from(raw);
    codec
        .decode(&mut buf)
        .expect("decode failed")
        .expect("no item")
}

#[test]
fn body_with_nul_bytes() {
    let item = decode_one(b"MESSAGE\ndestination:/q\nmessage-id:m\nsubscription:s\ncontent-length:5\n\na\0b\0c\0");
    match item {
        StompItem::Frame(frame) => assert_eq!(frame.body, b"a\0b\0c"),
        other => panic!("expected frame, got {:?}", other),
    }
}

#[test]
fn empty_body_with_explicit_zero_length() {
    let item = decode_one(b"SEND\ndestination:/q\ncontent-length:0\n\n\0");
    match item {
        StompItem::Frame(frame) => {
            assert!(frame.body.is_empty());
            assert_eq!(frame.get_header("content-length"), Some("0"));
        }
        other => panic!("expected frame, got {:?}", other),
    }
}

#[test]
fn empty_body_without_length_header() {
    let item = decode_one(b"SEND\ndestination:/q\n\n\0");
    match item {
        StompItem::Frame(frame) => assert!(frame.body.is_empty()),
        other => panic!("expected frame, got {:?}", other),
    }
}

#[test]
fn byte_after_declared_body_must_be_nul() {
    let mut parser = StompParser::new(Version::V1_2);
    let err = parser
        .feed(b"SEND\ndestination:/q\ncontent-length:4\n\nabcdX\0")
        .unwrap_err();
    assert_eq!(err.kind(), "missing-null");
}

#[test]
fn invalid_length_value_rejected() {
    let mut parser = StompParser::new(Version::V1_2);
    let err = parser
        .feed(b"SEND\ndestination:/q\ncontent-length:four\n\nabcd\0")
        .unwrap_err();
    assert_eq!(err.kind(), "bad-header-line");
}

#[test]
fn frame_after_length_framed_body_parses() {
    let mut parser = StompParser::new(Version::V1_2);
    parser
        .feed(b"SEND\ndestination:/q\ncontent-length:3\n\nx\0y\0RECEIPT\nreceipt-id:r-1\n\n\0")
        .expect("feed failed");
    let items = parser.drain();
    assert_eq!(items.len(), 2);
    assert!(matches!(&items[0], StompItem::Frame(f) if f.body == b"x\0y"));
    assert!(matches!(&items[1], StompItem::Frame(f) if f.command == "RECEIPT"));
}

#[test]
fn first_content_length_occurrence_wins() {
    let mut parser = StompParser::new(Version::V1_2);
    parser
        .feed(b"SEND\ndestination:/q\ncontent-length:2\ncontent-length:9\n\nab\0")
        .expect("feed failed");
    let items = parser.drain();
    match &items[0] {
        StompItem::Frame(frame) => {
            assert_eq!(frame.body, b"ab");
            // both occurrences survive in the header list
            assert_eq!(
                frame
                    .headers
                    .iter()
                    .filter(|(name, _)| name == "content-length")
                    .count(),
                2
            );
        }
        other => panic!("expected frame, got {:?}", other),
    }
}
