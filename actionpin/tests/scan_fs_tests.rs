//! Integration tests for `actionpin::scan_fs`.

use std::fs;
use std::path::PathBuf;

use actionpin::{FileErrorKind, FsSourceConfig, scan_fs};
use tempfile::TempDir;

const SHA: &str = "1af3b93b6815bc44a9784bd300feb67ff0d1eeb3";

fn fs_config(paths: Vec<PathBuf>) -> FsSourceConfig {
    let mut cfg = FsSourceConfig::default();
    cfg.paths = paths;
    cfg
}

fn workflow(uses: &[&str]) -> String {
    let mut text = String::from("on: [push]\njobs:\n  build:\n    runs-on: ubuntu-latest\n    steps:\n");
    for u in uses {
        text.push_str("      - uses: ");
        text.push_str(u);
        text.push('\n');
    }
    text
}

#[test]
fn test_scan_fs_empty_paths_errors() {
    let result = scan_fs(&fs_config(vec![]));
    let msg = result.unwrap_err().to_string();
    assert!(msg.contains("No paths provided"), "got: {msg}");
}

#[test]
fn test_scan_fs_nonexistent_path_errors() {
    let tmp = TempDir::new().unwrap();
    let result = scan_fs(&fs_config(vec![tmp.path().join("does_not_exist")]));
    let msg = result.unwrap_err().to_string();
    assert!(msg.contains("does not exist"), "got: {msg}");
}

#[test]
fn test_scan_fs_empty_directory() {
    let tmp = TempDir::new().unwrap();
    let report = scan_fs(&fs_config(vec![tmp.path().to_path_buf()])).unwrap();
    assert_eq!(report.scanned_files, 0);
    assert!(report.is_complete());
    assert_eq!(report.references_count(), 0);
}

#[test]
fn test_scan_fs_reports_files_in_sorted_order() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join(".github/workflows");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("z-release.yml"), workflow(&["actions/setup-go@v5"])).unwrap();
    fs::write(
        dir.join("a-ci.yaml"),
        workflow(&[&format!("actions/checkout@{SHA}"), "actions/cache@v4"]),
    )
    .unwrap();

    let report = scan_fs(&fs_config(vec![tmp.path().to_path_buf()])).unwrap();
    assert_eq!(report.scanned_files, 2);
    assert!(report.files[0].file.ends_with("a-ci.yaml"));
    assert!(report.files[1].file.ends_with("z-release.yml"));
    assert_eq!(report.references_count(), 3);
    assert_eq!(report.unpinned_count(), 2);
}

#[test]
fn test_scan_fs_counts_templated_values() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("ci.yml"),
        workflow(&["${{ matrix.action }}", "actions/checkout@v4"]),
    )
    .unwrap();

    let report = scan_fs(&fs_config(vec![tmp.path().to_path_buf()])).unwrap();
    assert_eq!(report.files[0].references.len(), 1);
    assert_eq!(report.files[0].templated, 1);
}

#[test]
fn test_scan_fs_malformed_file_is_reported_not_dropped() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("broken.yml"), "jobs: [").unwrap();
    fs::write(tmp.path().join("good.yml"), workflow(&["actions/checkout@v4"])).unwrap();

    let report = scan_fs(&fs_config(vec![tmp.path().to_path_buf()])).unwrap();
    assert_eq!(report.scanned_files, 1);
    assert_eq!(report.failed_files, 1);
    assert!(!report.is_complete());
    assert_eq!(report.errors[0].kind, FileErrorKind::MalformedDocument);
    assert!(report.errors[0].file.ends_with("broken.yml"));
    assert_eq!(report.references_count(), 1);
}

#[test]
fn test_scan_fs_invalid_utf8_is_malformed() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("binary.yml"), [0xff_u8, 0xfe, 0x00]).unwrap();

    let report = scan_fs(&fs_config(vec![tmp.path().to_path_buf()])).unwrap();
    assert_eq!(report.failed_files, 1);
    assert_eq!(report.errors[0].kind, FileErrorKind::MalformedDocument);
}

#[test]
fn test_scan_fs_file_too_large() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("ci.yml"), workflow(&["actions/checkout@v4"])).unwrap();

    let mut cfg = fs_config(vec![tmp.path().to_path_buf()]);
    cfg.max_file_size = 8;
    let report = scan_fs(&cfg).unwrap();
    assert_eq!(report.scanned_files, 0);
    assert_eq!(report.errors[0].kind, FileErrorKind::FileTooLarge);
}

#[test]
fn test_scan_fs_max_files_limit() {
    let tmp = TempDir::new().unwrap();
    for name in ["a.yml", "b.yml", "c.yml"] {
        fs::write(tmp.path().join(name), workflow(&["actions/checkout@v4"])).unwrap();
    }

    let mut cfg = fs_config(vec![tmp.path().to_path_buf()]);
    cfg.max_files = 2;
    let report = scan_fs(&cfg).unwrap();
    assert_eq!(report.scanned_files, 2);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].kind, FileErrorKind::LimitExceeded);
}

#[test]
fn test_scan_fs_max_total_bytes_limit() {
    let tmp = TempDir::new().unwrap();
    let content = workflow(&["actions/checkout@v4"]);
    fs::write(tmp.path().join("a.yml"), &content).unwrap();
    fs::write(tmp.path().join("b.yml"), &content).unwrap();

    let mut cfg = fs_config(vec![tmp.path().to_path_buf()]);
    cfg.max_total_bytes = content.len() as u64 + 1;
    let report = scan_fs(&cfg).unwrap();
    assert_eq!(report.scanned_files, 1);
    assert_eq!(report.errors[0].kind, FileErrorKind::LimitExceeded);
}

/// Each level aliases the previous one ten times: tiny on disk, ~10^7 nodes
/// once expanded.
fn alias_blowup() -> String {
    let mut lines = vec!["s0: &s0 {uses: actions/checkout@v4}".to_owned()];
    for level in 1..8 {
        let aliases = vec![format!("*s{}", level - 1); 10].join(", ");
        lines.push(format!("s{level}: &s{level} [{aliases}]"));
    }
    lines.join("\n") + "\n"
}

#[test]
fn test_scan_fs_alias_blowup_is_limit_exceeded() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("bomb.yml"), alias_blowup()).unwrap();
    fs::write(tmp.path().join("good.yml"), workflow(&["actions/checkout@v4"])).unwrap();

    let report = scan_fs(&fs_config(vec![tmp.path().to_path_buf()])).unwrap();
    assert_eq!(report.scanned_files, 1);
    assert_eq!(report.failed_files, 1);
    assert_eq!(report.errors[0].kind, FileErrorKind::LimitExceeded);
    assert!(report.errors[0].file.ends_with("bomb.yml"));
    assert_eq!(report.references_count(), 1);
}

#[test]
fn test_scan_fs_expansion_limit_is_configurable() {
    let tmp = TempDir::new().unwrap();
    let content = "a: &a {uses: actions/checkout@v4}\nb: [*a, *a, *a]\n";
    fs::write(tmp.path().join("ci.yml"), content).unwrap();

    let mut cfg = fs_config(vec![tmp.path().to_path_buf()]);
    let report = scan_fs(&cfg).unwrap();
    assert_eq!(report.references_count(), 4);

    cfg.max_expanded_nodes = 5;
    let report = scan_fs(&cfg).unwrap();
    assert_eq!(report.errors[0].kind, FileErrorKind::LimitExceeded);
}

#[test]
fn test_scan_fs_same_content_same_references_in_parallel() {
    let tmp = TempDir::new().unwrap();
    let content = workflow(&["actions/checkout@v4", "actions/cache@v4"]);
    for i in 0..32 {
        fs::write(tmp.path().join(format!("wf{i:02}.yml")), &content).unwrap();
    }

    let report = scan_fs(&fs_config(vec![tmp.path().to_path_buf()])).unwrap();
    assert_eq!(report.scanned_files, 32);
    let first = &report.files[0].references;
    assert!(report.files.iter().all(|f| &f.references == first));
    assert!(report.files.windows(2).all(|w| w[0].file < w[1].file));
}
