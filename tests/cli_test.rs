use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_cli_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!("cashledger"));
    cmd.arg("tests/fixtures/scenario.csv");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("account,balance,created_at"))
        // 100 - 40 - 10 + 0 cashback + 1
        .stdout(predicate::str::contains("alice,51,0"))
        .stdout(predicate::str::contains("bob,40,0"));

    Ok(())
}

#[test]
fn test_cli_history_json() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!("cashledger"));
    cmd.arg("tests/fixtures/scenario.csv")
        .arg("--history")
        .arg("alice")
        .arg("--since")
        .arg("3");

    let output = cmd.output()?;
    assert!(output.status.success());

    let entries: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    let ops: Vec<&str> = entries
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["operation"].as_str().unwrap())
        .collect();
    assert_eq!(ops, vec!["payment1", "cashback", "deposited"]);
    assert_eq!(entries[1]["deposited"], true);
    assert_eq!(entries[1]["payment_ref"], "payment1");

    Ok(())
}

#[test]
fn test_cli_history_unknown_account_fails() {
    let mut cmd = Command::new(cargo_bin!("cashledger"));
    cmd.arg("tests/fixtures/scenario.csv")
        .arg("--history")
        .arg("mallory");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Account mallory not found"));
}

#[test]
fn test_cli_config_changes_cashback() {
    let mut config = tempfile::NamedTempFile::new().unwrap();
    std::io::Write::write_all(
        &mut config,
        br#"{ "cashback_rate": "0.5", "cashback_delay_ms": 1 }"#,
    )
    .unwrap();

    let mut cmd = Command::new(cargo_bin!("cashledger"));
    cmd.arg("tests/fixtures/scenario.csv")
        .arg("--config")
        .arg(config.path());

    // 100 - 40 - 10 + 5 cashback + 1
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("alice,56,0"));
}
