use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

mod common;

#[test]
fn test_cli_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!("loan-registry"));
    cmd.arg("tests/fixtures/lifecycle.csv");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "id,borrower,lender,collateral,loan_amount,interest_rate,due_date,active,funded,repaid",
        ))
        // Repaid before the due date
        .stdout(predicate::str::contains(
            "0,alice,bob,1,1,500,2592000,false,true,true",
        ))
        // Claimed after default
        .stdout(predicate::str::contains(
            "1,carol,dave,2.5,2.5,1000,864100,false,true,false",
        ));

    Ok(())
}

#[test]
fn test_cli_writes_balances_and_events() {
    let dir = tempfile::tempdir().unwrap();
    let balances = dir.path().join("balances.csv");
    let events = dir.path().join("events.jsonl");

    let mut cmd = Command::new(cargo_bin!("loan-registry"));
    cmd.arg("tests/fixtures/lifecycle.csv")
        .arg("--balances")
        .arg(&balances)
        .arg("--events")
        .arg(&events);
    cmd.assert().success();

    let balances = std::fs::read_to_string(balances).unwrap();
    assert_eq!(
        balances,
        "account,received\nalice,2\nbob,1.05\ncarol,2.5\ndave,2.5\n"
    );

    let events = std::fs::read_to_string(events).unwrap();
    let kinds: Vec<String> = events
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            value["event"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            "loan_requested",
            "loan_requested",
            "loan_funded",
            "loan_funded",
            "loan_repaid",
            "collateral_returned",
            "collateral_claimed",
        ]
    );
}

#[test]
fn test_cli_rejected_recipient_rolls_back_funding() {
    let file = common::commands_file(&[
        "request, alice, , 1.0, 500, 30, 0",
        "fund, bob, 0, 1.0, , , 10",
    ])
    .unwrap();

    let mut cmd = Command::new(cargo_bin!("loan-registry"));
    cmd.arg(file.path()).arg("--reject").arg("alice");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error processing command: transfer of"))
        .stdout(predicate::str::contains(
            "0,alice,,1,1,500,2592000,true,false,false",
        ));
}

#[test]
fn test_cli_full_precision_amounts() {
    let file = common::commands_file(&[
        "request, alice, , 0.000000000000000001, 1, 1, 0",
        "request, alice, , 123456789.123456789, 1, 1, 0",
    ])
    .unwrap();

    let mut cmd = Command::new(cargo_bin!("loan-registry"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "0,alice,,0.000000000000000001,0.000000000000000001,1,86400,true,false,false",
        ))
        .stdout(predicate::str::contains(
            "1,alice,,123456789.123456789,123456789.123456789,1,86400,true,false,false",
        ));
}
