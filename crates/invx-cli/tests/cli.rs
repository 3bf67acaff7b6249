use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn invx(config_home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("invx").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env("HOME", config_home)
        .env_remove("INVX_MOCK")
        .env_remove("INVX_CONCURRENCY")
        .env_remove("UPLOAD_DIR")
        .current_dir(config_home);
    cmd
}

#[test]
fn config_show_prints_defaults() {
    let dir = tempfile::tempdir().unwrap();

    invx(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No config file found"))
        .stdout(predicate::str::contains("\"concurrency\": 3"))
        .stdout(predicate::str::contains("api_key\"").not());
}

#[test]
fn config_init_then_set_and_get() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("invx.json");
    let path_arg = path.to_str().unwrap();

    invx(dir.path())
        .args(["--config", path_arg, "config", "init"])
        .assert()
        .success();
    assert!(path.exists());

    invx(dir.path())
        .args(["--config", path_arg, "config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    invx(dir.path())
        .args(["--config", path_arg, "config", "set", "batch.concurrency", "5"])
        .assert()
        .success();

    invx(dir.path())
        .args(["--config", path_arg, "config", "get", "batch.concurrency"])
        .assert()
        .success()
        .stdout(predicate::str::diff("5\n"));
}

#[test]
fn process_mock_prints_csv() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("receipt.jpg");
    fs::write(&image, b"not really a jpeg").unwrap();

    invx(dir.path())
        .args(["process", image.to_str().unwrap(), "--mock", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Date,ABN,Amount (inc. GST),GST,Description,Category"))
        .stdout(predicate::str::contains("$110.00,$10.00"));
}

#[test]
fn process_missing_input_fails() {
    let dir = tempfile::tempdir().unwrap();

    invx(dir.path())
        .args(["process", "nope.jpg", "--mock"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn process_without_key_fails_before_network() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("receipt.png");
    fs::write(&image, b"png").unwrap();

    invx(dir.path())
        .env_remove("ANTHROPIC_API_KEY")
        .env("INVX_BASE_URL", "http://127.0.0.1:9")
        .args(["process", image.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "ANTHROPIC_API_KEY not found in environment",
        ));
}

#[test]
fn batch_mock_writes_csv() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = dir.path().join("inputs");
    fs::create_dir_all(&inputs).unwrap();
    for name in ["a.jpg", "b.png", "c.webp", "notes.txt"] {
        fs::write(inputs.join(name), name.as_bytes()).unwrap();
    }
    let output = dir.path().join("out.csv");
    let pattern = format!("{}/*", inputs.display());

    invx(dir.path())
        .args([
            "batch",
            &pattern,
            "--mock",
            "--jobs",
            "2",
            "--upload-dir",
            dir.path().join("uploads").to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 3 files to process"));

    let csv = fs::read_to_string(&output).unwrap();
    assert_eq!(csv.lines().count(), 4);
    assert!(csv.starts_with("Date,ABN,Amount (inc. GST),GST,Description,Category"));
    assert_eq!(fs::read_dir(dir.path().join("uploads")).unwrap().count(), 3);
}

#[test]
fn batch_without_matches_fails() {
    let dir = tempfile::tempdir().unwrap();
    let pattern = format!("{}/*.jpg", dir.path().display());

    invx(dir.path())
        .args(["batch", &pattern, "--mock"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files found"));
}
