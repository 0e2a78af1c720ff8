use std::path::PathBuf;

use ios_config_core::{diff_with_options, parse, parse_file, write, write_file, DiffOptions};
use pretty_assertions::assert_eq;

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(path)
}

#[test]
fn parse_write_parse_round_trip_preserves_commands() {
    let first = parse_file(&fixture("fixtures/configs/r1-typed.txt")).expect("parse");

    let written = write(&first);
    let second = parse(&written).expect("re-parse");

    assert!(diff_with_options(&first, &second, &DiffOptions::default()).is_empty());
    assert_eq!(written, write(&second));
}

#[test]
fn canonical_text_expands_keywords_and_indents_blocks() {
    let root = parse("int Gi0/0\nip add 10.0.0.1 255.255.255.0\nno shut\nhostn R1\n").expect("parse");

    assert_eq!(
        write(&root),
        "interface Gi0/0\n ip address 10.0.0.1 255.255.255.0\n no shutdown\n!\nhostname R1\n"
    );
}

#[test]
fn write_file_round_trip() {
    let node = parse_file(&fixture("fixtures/configs/r1-ospf.txt")).expect("parse");
    let out_dir = tempfile::tempdir().expect("tempdir should be created");
    let out_path = out_dir.path().join("roundtrip.txt");

    write_file(&node, &out_path).expect("write_file should succeed");
    let reparsed = parse_file(&out_path).expect("re-parse");

    assert!(diff_with_options(&node, &reparsed, &DiffOptions::default()).is_empty());
}
