use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn input(data: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(data).unwrap();
    file.flush().unwrap();
    file
}

fn station_stats() -> Command {
    Command::cargo_bin("station-stats").unwrap()
}

#[test]
fn prints_one_summary_line() {
    let input = input(b"Paris,12.5\nParis,-3.0\nLondon,8.2\n");

    station_stats()
        .arg(input.path())
        .args(["--workers", "3"])
        .assert()
        .success()
        .stdout("{London=8.2/8.2/8.2, Paris=-3.0/4.8/12.5}\n");
}

#[test]
fn accepts_strategy_flags() {
    let input = input(b"id;value\nOslo;-1.5\nOslo;-2.5\n");

    station_stats()
        .arg(input.path())
        .args(["-d", ";", "--read", "mapped", "--dispatch", "pool", "--skip-header"])
        .assert()
        .success()
        .stdout("{Oslo=-2.5/-2.0/-1.5}\n");
}

#[test]
fn missing_file_exits_non_zero() {
    station_stats()
        .arg("/no/such/file.csv")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to summarize"));
}

#[test]
fn zero_workers_exits_non_zero() {
    let input = input(b"Paris,1.0\n");

    station_stats()
        .arg(input.path())
        .args(["--workers", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("worker count must be positive"));
}

#[test]
fn rejects_multi_character_delimiter() {
    let input = input(b"Paris,1.0\n");

    station_stats()
        .arg(input.path())
        .args(["--delimiter", ";;"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid delimiter"));
}
