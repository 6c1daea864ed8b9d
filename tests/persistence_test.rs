#![cfg(feature = "storage-rocksdb")]

use assert_cmd::cargo_bin;
use std::io::Write;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn test_rocksdb_persistence_recovery() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    // 1. First run: create, fund and pay
    let mut csv1 = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv1, "op, timestamp, account, target, amount").unwrap();
    writeln!(csv1, "create, 0, alice, , ").unwrap();
    writeln!(csv1, "deposit, 1, alice, , 1000").unwrap();
    writeln!(csv1, "pay, 2, alice, , 500").unwrap();

    let mut cmd1 = Command::new(cargo_bin!("cashledger"));
    cmd1.arg(csv1.path()).arg("--db-path").arg(&db_path);

    let output1 = cmd1.output().expect("Failed to execute command");
    assert!(output1.status.success());
    let stdout1 = String::from_utf8_lossy(&output1.stdout);
    assert!(stdout1.contains("alice,500,0"));

    // 2. Second run: the pending cashback was persisted and settles now
    let mut csv2 = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv2, "op, timestamp, account, target, amount").unwrap();
    writeln!(csv2, "create, 5, alice, , ").unwrap();
    writeln!(csv2, "deposit, 86400002, alice, , 1").unwrap();

    let mut cmd2 = Command::new(cargo_bin!("cashledger"));
    cmd2.arg(csv2.path()).arg("--db-path").arg(&db_path);

    let output2 = cmd2.output().expect("Failed to execute command");
    assert!(output2.status.success());
    let stdout2 = String::from_utf8_lossy(&output2.stdout);
    let stderr2 = String::from_utf8_lossy(&output2.stderr);

    // The id stays taken across restarts
    assert!(stderr2.contains("already exists"));
    // 500 + 10 cashback + 1
    assert!(stdout2.contains("alice,511,0"));
}

#[test]
fn test_payment_ids_continue_after_restart() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    let mut csv1 = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv1, "op, timestamp, account, target, amount").unwrap();
    writeln!(csv1, "create, 0, alice, , ").unwrap();
    writeln!(csv1, "deposit, 1, alice, , 100").unwrap();
    writeln!(csv1, "pay, 2, alice, , 10").unwrap();
    let status = Command::new(cargo_bin!("cashledger"))
        .arg(csv1.path())
        .arg("--db-path")
        .arg(&db_path)
        .status()
        .unwrap();
    assert!(status.success());

    let mut csv2 = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv2, "op, timestamp, account, target, amount").unwrap();
    writeln!(csv2, "pay, 3, alice, , 10").unwrap();
    let output = Command::new(cargo_bin!("cashledger"))
        .arg(csv2.path())
        .arg("--db-path")
        .arg(&db_path)
        .arg("--history")
        .arg("alice")
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"payment1\""));
    assert!(stdout.contains("\"payment2\""));
}
