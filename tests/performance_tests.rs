use assert_cmd::cargo_bin;
use std::process::Command;

mod common;

#[test]
fn test_large_file_streaming() {
    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("large_test.csv");
    common::generate_large_csv(&output_path, 5).expect("Failed to generate large CSV");

    let status = Command::new(cargo_bin!("cashledger"))
        .arg(&output_path)
        .arg("--log-level")
        .arg("warn")
        .status()
        .expect("Failed to execute command");
    assert!(status.success(), "Binary failed to process 5MB file");
}

#[test]
fn test_transfer_cycle_conserves_total() {
    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("cycle_test.csv");
    common::generate_csv(&output_path, 10, 10_000).expect("Failed to generate CSV");

    let output = Command::new(cargo_bin!("cashledger"))
        .arg(&output_path)
        .arg("--log-level")
        .arg("warn")
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());

    let mut reader = csv::Reader::from_reader(output.stdout.as_slice());
    let total: i64 = reader
        .records()
        .map(|r| r.unwrap()[1].parse::<i64>().unwrap())
        .sum();
    assert_eq!(total, 10 * 1000);
}
