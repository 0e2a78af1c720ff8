use std::path::PathBuf;

use ios_config_core::{
    diff, diff_with_options, format_json, format_summary, format_text, parse, parse_file,
    DiffEntry, DiffOptions,
};

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(path)
}

#[test]
fn reordered_and_abbreviated_config_only_differs_in_missing_lines() {
    let running = parse_file(&fixture("fixtures/configs/r1-running.txt")).expect("running");
    let typed = parse_file(&fixture("fixtures/configs/r1-typed.txt")).expect("typed");

    let entries = diff_with_options(&running, &typed, &DiffOptions::ios());

    assert_eq!(entries.len(), 2, "{}", format_text(&entries));
    assert!(entries.iter().all(|e| matches!(e, DiffEntry::OnlyLeft { .. })));
    assert!(entries.iter().any(|e| e.path() == "no service password-encryption"));
    assert!(entries
        .iter()
        .any(|e| e.path() == "service timestamps debug datetime msec"));
}

#[test]
fn keyed_commands_are_reported_as_modified() {
    let left = parse("interface Gi0/0\n ip address 10.0.0.1 255.255.255.0\nhostname R1\n")
        .expect("left");
    let right = parse("hostname R2\ninterface Gi0/0\n ip address 10.0.0.2 255.255.255.0\n")
        .expect("right");

    let entries = diff_with_options(&left, &right, &DiffOptions::ios());

    assert_eq!(
        entries,
        vec![
            DiffEntry::Modified {
                path: "hostname".to_string(),
                left: "hostname R1".to_string(),
                right: "hostname R2".to_string(),
            },
            DiffEntry::Modified {
                path: "interface Gi0/0 > ip address".to_string(),
                left: "ip address 10.0.0.1 255.255.255.0".to_string(),
                right: "ip address 10.0.0.2 255.255.255.0".to_string(),
            },
        ]
    );

    let summary = format_summary(&entries);
    assert!(summary.contains("modified=2"));
    assert!(format_json(&entries).contains("\"type\": \"Modified\""));
}

#[test]
fn default_options_identify_commands_by_full_text() {
    let left = parse("hostname R1\n").expect("left");
    let right = parse("hostname R2\n").expect("right");

    let entries = diff(&left, &right);

    assert_eq!(entries.len(), 2);
    assert!(matches!(entries[0], DiffEntry::OnlyLeft { .. }));
    assert!(matches!(entries[1], DiffEntry::OnlyRight { .. }));
}

#[test]
fn include_identical_reports_matching_blocks() {
    let left = parse("interface Lo0\n ip address 1.1.1.1 255.255.255.255\n").expect("left");
    let opts = DiffOptions {
        include_identical: true,
        ..DiffOptions::ios()
    };

    let entries = diff_with_options(&left, &left, &opts);

    assert!(entries
        .iter()
        .any(|e| matches!(e, DiffEntry::Identical { path } if path == "interface Lo0")));
}
