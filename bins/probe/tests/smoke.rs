use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn plan_lists_every_screen() {
    Command::cargo_bin("probe").unwrap()
        .arg("plan")
        .assert()
        .success()
        .stdout(contains("dashboard"))
        .stdout(contains("monitor"))
        .stdout(contains("every 3s"))
        .stdout(contains("once"));
}
