//! Tests for the marker file codec

use super::*;
use crate::error::Error;
use crate::types::{MarkerMap, PositionToken, LAST_MARKER};
use pretty_assertions::assert_eq;
use std::io::Cursor;
use tempfile::tempdir;
use test_case::test_case;

fn table(entries: &[(&str, Vec<u8>)]) -> MarkerMap {
    entries
        .iter()
        .map(|(name, bytes)| ((*name).to_string(), PositionToken::new(bytes.clone())))
        .collect()
}

// ============================================================================
// Encode Tests
// ============================================================================

#[test]
fn test_encode_skips_last_and_sorts() {
    let markers = table(&[
        ("zeta", vec![0xff]),
        (LAST_MARKER, vec![0x00]),
        ("alpha", vec![0x00, 0x10]),
    ]);

    let mut out = Vec::new();
    let count = encode(&markers, &mut out).unwrap();

    assert_eq!(count, 2);
    assert_eq!(String::from_utf8(out).unwrap(), "alpha\n0010\nzeta\nff\n");
}

#[test]
fn test_encode_empty() {
    let mut out = Vec::new();
    assert_eq!(encode(&MarkerMap::new(), &mut out).unwrap(), 0);
    assert!(out.is_empty());
}

// ============================================================================
// Decode Tests
// ============================================================================

#[test]
fn test_decode() {
    let decoded = decode(Cursor::new("line2\n0000000000000004\nEnd\nABCD\n")).unwrap();

    assert_eq!(
        decoded,
        table(&[("line2", vec![0, 0, 0, 0, 0, 0, 0, 4]), ("End", vec![0xab, 0xcd])])
    );
}

#[test]
fn test_decode_tolerates_crlf_and_missing_final_newline() {
    let decoded = decode(Cursor::new("a\r\n01\r\nb\n02")).unwrap();
    assert_eq!(decoded, table(&[("a", vec![1]), ("b", vec![2])]));
}

#[test]
fn test_decode_later_duplicate_wins() {
    let decoded = decode(Cursor::new("a\n01\na\n02\n")).unwrap();
    assert_eq!(decoded, table(&[("a", vec![2])]));
}

#[test]
fn test_decode_empty_token() {
    let decoded = decode(Cursor::new("a\n\n")).unwrap();
    assert_eq!(decoded, table(&[("a", vec![])]));
}

#[test_case("a\n01\nb\n", 3 ; "odd record count")]
#[test_case("a\nzz\n", 2 ; "invalid hex digit")]
#[test_case("a\n012\n", 2 ; "odd hex length")]
#[test_case("\n01\n", 1 ; "empty name")]
#[test_case("a\n01\nLAST\n02\n", 3 ; "reserved name")]
fn test_decode_format_errors(input: &str, expected_line: usize) {
    match decode(Cursor::new(input)).unwrap_err() {
        Error::Format { line, .. } => assert_eq!(line, expected_line),
        other => panic!("expected format error, got {other:?}"),
    }
}

#[test_case(&b"name\xff\n01\n"[..], 1 ; "name not utf8")]
#[test_case(&b"a\n01\nb\n\xfe\n"[..], 4 ; "token not utf8")]
fn test_decode_rejects_invalid_utf8(input: &[u8], expected_line: usize) {
    match decode(Cursor::new(input)).unwrap_err() {
        Error::Format { line, .. } => assert_eq!(line, expected_line),
        other => panic!("expected format error, got {other:?}"),
    }
}

// ============================================================================
// File Tests
// ============================================================================

#[test]
fn test_save_and_load_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.marks");
    let markers = table(&[
        ("line2", 4u64.to_be_bytes().to_vec()),
        ("binary", vec![0x00, 0x0a, 0x0d, 0xff]),
        (LAST_MARKER, vec![0x01]),
    ]);

    assert_eq!(save(&markers, &path).unwrap(), 2);

    let mut restored = MarkerMap::new();
    assert_eq!(load(&mut restored, &path).unwrap(), 2);

    let mut expected = markers.clone();
    expected.remove(LAST_MARKER);
    assert_eq!(restored, expected);
}

#[test]
fn test_save_replaces_existing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.marks");
    std::fs::write(&path, "old\n00\n").unwrap();

    save(&table(&[("new", vec![1])]), &path).unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "new\n01\n");
    assert!(!dir.path().join("data.marks.tmp").exists());
}

#[test]
fn test_save_refuses_read_only_target() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.marks");
    std::fs::write(&path, "old\n00\n").unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_readonly(true);
    std::fs::set_permissions(&path, perms).unwrap();

    let err = save(&table(&[("new", vec![1])]), &path).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "old\n00\n");
    assert!(!dir.path().join("data.marks.tmp").exists());
}

#[test]
fn test_merge_overwrites_matching_names() {
    let mut markers = table(&[("a", vec![1]), ("b", vec![2])]);
    let count = merge(&mut markers, table(&[("b", vec![3]), ("c", vec![4])]));

    assert_eq!(count, 2);
    assert_eq!(markers, table(&[("a", vec![1]), ("b", vec![3]), ("c", vec![4])]));
}

#[test]
fn test_save_to_missing_directory() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing").join("data.marks");

    let err = save(&table(&[("a", vec![1])]), &path).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_load_missing_file() {
    let dir = tempdir().unwrap();
    let mut markers = MarkerMap::new();

    let err = load(&mut markers, dir.path().join("nope.marks")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_load_overwrites_and_keeps_others() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.marks");
    std::fs::write(&path, "shared\n02\n").unwrap();

    let mut markers = table(&[("shared", vec![1]), ("local", vec![9]), (LAST_MARKER, vec![0])]);
    load(&mut markers, &path).unwrap();

    assert_eq!(
        markers,
        table(&[("shared", vec![2]), ("local", vec![9]), (LAST_MARKER, vec![0])])
    );
}

#[test]
fn test_malformed_load_leaves_table_unchanged() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.marks");
    std::fs::write(&path, "good\n01\nbad\nxyz\n").unwrap();

    let mut markers = table(&[("existing", vec![7])]);
    let before = markers.clone();

    let err = load(&mut markers, &path).unwrap_err();
    assert!(matches!(err, Error::Format { line: 4, .. }));
    assert_eq!(markers, before);
}

#[test]
fn test_read_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.marks");
    std::fs::write(&path, "a\n01\n").unwrap();

    assert_eq!(read(&path).unwrap(), table(&[("a", vec![1])]));
}
