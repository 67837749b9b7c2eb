#![allow(missing_docs)]

use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

#[test]
fn script_on_stdin_runs_to_completion() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("cli.db");
    let script = format!(
        "N {} 4\nA 1 1 2 3\nA 2 4 5 6\nG 2\nU 2 7 8 9\nG 2\nR 2\nG 2\nOOPS\nPD\nS\n",
        path.display()
    );
    let output = cargo_bin_cmd!("exhash")
        .write_stdin(script)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    let first = format!("[{:032b}] 2 => 4 5 6", 2);
    let second = format!("[{:032b}] 2 => 7 8 9", 2);
    assert_eq!(
        lines,
        vec![
            first.as_str(),
            second.as_str(),
            "record with key 2 not found",
            "Bad command, try again!",
            "--------------",
            "#D0#",
            "0 | 0",
            "--------------",
            "R: 9, W: 5",
        ]
    );
    assert!(path.exists());
}

#[test]
fn script_file_and_hash_override() {
    let tmp = TempDir::new().unwrap();
    let script = tmp.path().join("ops.txt");
    let store = tmp.path().join("cli.db");
    let mut body = format!("N {} 2\n", store.display());
    for key in 0..20 {
        body.push_str(&format!("A {key}\n"));
    }
    body.push_str("A 3\nG 19\n");
    std::fs::write(&script, body).unwrap();

    let output = cargo_bin_cmd!("exhash")
        .args(["--hash", "jenkins", "--seed", "42"])
        .arg(&script)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Record already added!");
    assert!(lines[1].starts_with('['));
    assert!(lines[1].contains("] 19 => "));
}

#[test]
fn reserved_key_is_reported_and_script_continues() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("cli.db");
    let script = format!(
        "N {} 4\nA 2147483647 1 2 3\nA 7 1 1 1\nG 7\n",
        path.display()
    );
    let output = cargo_bin_cmd!("exhash")
        .write_stdin(script)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();
    let shown = format!("[{:032b}] 7 => 1 1 1", 7);
    assert_eq!(
        text.lines().collect::<Vec<_>>(),
        vec!["invalid argument: key 2147483647 is reserved", shown.as_str()]
    );
}

#[test]
fn missing_config_file_fails() {
    let tmp = TempDir::new().unwrap();
    cargo_bin_cmd!("exhash")
        .arg("--config")
        .arg(tmp.path().join("absent.toml"))
        .write_stdin("")
        .assert()
        .failure();
}
