use std::io::Read;

use beacon::http::encoding::{negotiate, ContentCoding};
use flate2::read::GzDecoder;

#[test]
fn test_negotiate_gzip() {
    assert_eq!(negotiate(Some("gzip")), Some(ContentCoding::Gzip));
}

#[test]
fn test_negotiate_skips_unapplied_codings() {
    assert_eq!(negotiate(Some("deflate, gzip")), Some(ContentCoding::Gzip));
    assert_eq!(negotiate(Some("br ,  gzip , deflate")), Some(ContentCoding::Gzip));
}

#[test]
fn test_negotiate_no_overlap() {
    assert_eq!(negotiate(Some("deflate")), None);
    assert_eq!(negotiate(Some("br, identity")), None);
    assert_eq!(negotiate(Some("invalid-encoding")), None);
    assert_eq!(negotiate(Some("")), None);
    assert_eq!(negotiate(None), None);
}

#[test]
fn test_negotiate_ignores_case_and_parameters() {
    assert_eq!(negotiate(Some("GZIP")), Some(ContentCoding::Gzip));
    assert_eq!(negotiate(Some("gzip;q=0.8")), Some(ContentCoding::Gzip));
}

#[test]
fn test_negotiate_zero_quality_refuses() {
    assert_eq!(negotiate(Some("gzip;q=0")), None);
}

#[test]
fn test_recognized_tokens() {
    assert_eq!(ContentCoding::from_token("deflate"), Some(ContentCoding::Deflate));
    assert_eq!(ContentCoding::from_token("br"), Some(ContentCoding::Brotli));
    assert_eq!(ContentCoding::from_token("zstd"), None);
    assert!(ContentCoding::Gzip.is_applied());
    assert!(!ContentCoding::Deflate.is_applied());
    assert!(!ContentCoding::Brotli.is_applied());
}

#[test]
fn test_gzip_encode_decodes_back() {
    let encoded = ContentCoding::Gzip.encode(b"abc").unwrap();
    assert_eq!(&encoded[..2], &[0x1f, 0x8b]);

    let mut decoded = String::new();
    GzDecoder::new(&encoded[..]).read_to_string(&mut decoded).unwrap();
    assert_eq!(decoded, "abc");
}
