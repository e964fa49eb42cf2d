use assert_cmd::Command;
use predicates::prelude::*;

fn bin() -> Command {
    Command::cargo_bin("shell_capture").expect("binary is built")
}

#[test]
#[cfg(unix)]
fn prints_captured_output() {
    bin()
        .arg("echo integration")
        .assert()
        .success()
        .stdout("Output:\nintegration\n\n");
}

#[test]
#[cfg(unix)]
fn quoted_words_stay_together() {
    bin()
        .arg(r#"printf "[%s]" "two words""#)
        .assert()
        .success()
        .stdout(predicate::str::contains("[two words]"));
}

#[test]
fn blank_command_fails() {
    bin()
        .arg("   ")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Failed to execute command."));
}

#[test]
#[cfg(unix)]
fn missing_program_reports_on_stderr_only() {
    bin()
        .arg("shell-capture-no-such-program")
        .assert()
        .success()
        .stdout("Output:\n\n")
        .stderr(predicate::str::contains("shell-capture-no-such-program"));
}

#[test]
#[cfg(unix)]
fn default_command_lists_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("marker.txt"), "x").expect("write marker");

    bin()
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("marker.txt"));
}

#[test]
fn interactive_mode_exits_on_eof() {
    bin().arg("--interactive").write_stdin("").assert().success();
}

#[test]
fn help_mentions_options() {
    bin()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--interactive"));
}
