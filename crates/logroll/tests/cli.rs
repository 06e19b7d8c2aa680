use assert_cmd::Command;
use flate2::read::GzDecoder;
use predicates::prelude::*;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use tempfile::TempDir;

fn logroll() -> Command {
    Command::cargo_bin("logroll").unwrap()
}

fn lines(count: usize, len: usize) -> String {
    let mut out = String::new();
    for i in 0..count {
        let body = format!("{:0width$}", i, width = len - 1);
        out.push_str(&body);
        out.push('\n');
    }
    out
}

fn gunzip(path: &Path) -> String {
    let mut out = String::new();
    GzDecoder::new(File::open(path).unwrap())
        .read_to_string(&mut out)
        .unwrap();
    out
}

#[test]
fn test_help() {
    logroll()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--keep"))
        .stdout(predicate::str::contains("--compress"));
}

#[test]
fn test_writes_stdin_to_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.log");

    logroll()
        .arg(&path)
        .write_stdin("hello\nworld\n")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert_eq!(fs::read_to_string(&path).unwrap(), "hello\nworld\n");
}

#[test]
fn test_rotates_without_compression() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.log");
    let input = lines(3, 500);

    logroll()
        .args(["--size", "1", "--compress", "none"])
        .arg(&path)
        .write_stdin(input.clone())
        .assert()
        .success();

    assert_eq!(fs::read_to_string(dir.path().join("app.log.1")).unwrap(), input[..1000]);
    assert_eq!(fs::read_to_string(&path).unwrap(), input[1000..]);
}

#[test]
fn test_compresses_backups_before_exit() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.log");
    let input = lines(2, 500);

    logroll()
        .args(["-s", "1"])
        .arg(&path)
        .write_stdin(input.clone())
        .assert()
        .success();

    assert!(!dir.path().join("app.log.1").exists());
    assert_eq!(gunzip(&dir.path().join("app.log.1.gz")), input);
}

#[test]
fn test_keep_limits_backups() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.log");

    logroll()
        .args(["-s", "1", "-k", "1", "-c", "none"])
        .arg(&path)
        .write_stdin(lines(3, 1000))
        .assert()
        .success();

    assert!(!dir.path().join("app.log.1").exists());
    assert!(!dir.path().join("app.log.2").exists());
    assert!(dir.path().join("app.log.3").exists());
}

#[test]
fn test_tee_copies_to_stdout() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.log");

    logroll()
        .args(["--tee", "-c", "none"])
        .arg(&path)
        .write_stdin("mirrored line\n")
        .assert()
        .success()
        .stdout("mirrored line\n");

    assert_eq!(fs::read_to_string(&path).unwrap(), "mirrored line\n");
}

#[test]
fn test_rejects_unknown_compression() {
    let dir = TempDir::new().unwrap();

    logroll()
        .args(["-c", "brotli"])
        .arg(dir.path().join("app.log"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown compression"));
}

#[test]
fn test_rejects_zero_size() {
    let dir = TempDir::new().unwrap();

    logroll()
        .args(["-s", "0"])
        .arg(dir.path().join("app.log"))
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("size threshold must be positive"));
}
