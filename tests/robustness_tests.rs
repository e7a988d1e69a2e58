use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

mod common;

#[test]
fn test_malformed_csv_handling() {
    let file = common::commands_file(&[
        "request, alice, , 1.0, 500, 30, 0",
        // Invalid type
        "borrow, alice, , 1.0, 500, 30, 0",
        // Missing rate
        "request, carol, , 1.0, , 30, 0",
        // Text in amount field
        "request, carol, , lots, 500, 30, 0",
        "request, carol, , 2.0, 500, 30, 0",
    ])
    .unwrap();

    let mut cmd = Command::new(cargo_bin!("loan-registry"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error reading command"))
        .stdout(predicate::str::contains("0,alice,,1,1,500,2592000,true,false,false"))
        .stdout(predicate::str::contains("1,carol,,2,2,500,2592000,true,false,false"))
        .stdout(predicate::str::is_match("(?m)^2,").unwrap().not());
}

#[test]
fn test_time_going_backwards_is_skipped() {
    let file = common::commands_file(&[
        "request, alice, , 1.0, 500, 1, 1000",
        // Would be a valid claim timeline only if time could rewind
        "fund, bob, 0, 1.0, , , 500",
    ])
    .unwrap();

    let mut cmd = Command::new(cargo_bin!("loan-registry"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("time went backwards"))
        .stdout(predicate::str::contains("0,alice,,1,1,500,87400,true,false,false"));
}

#[test]
fn test_rejected_operations_do_not_stop_processing() {
    let file = common::commands_file(&[
        "request, alice, , 1.0, 500, 1, 0",
        // Wrong amount
        "fund, bob, 0, 0.9, , , 10",
        // Unknown loan
        "fund, bob, 7, 1.0, , , 10",
        "fund, bob, 0, 1.0, , , 20",
        // Not yet in default
        "claim, bob, 0, , , , 86400",
        // Only the lender may claim
        "claim, mallory, 0, , , , 86401",
        "claim, bob, 0, , , , 86401",
        // Repaying after a claim
        "repay, alice, 0, 1.05, , , 86401",
    ])
    .unwrap();

    let mut cmd = Command::new(cargo_bin!("loan-registry"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("invalid amount"))
        .stderr(predicate::str::contains("loan 7 does not exist"))
        .stderr(predicate::str::contains("is not due until"))
        .stderr(predicate::str::contains("is not the lender"))
        .stderr(predicate::str::contains("no longer active"))
        .stdout(predicate::str::contains("0,alice,bob,1,1,500,86400,false,true,false"));
}
