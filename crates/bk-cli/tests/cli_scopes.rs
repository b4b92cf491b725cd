use std::path::PathBuf;
use std::process::{Command, Output};

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_bumpkit"))
}

fn run(args: &[&str]) -> Output {
    Command::new(bin_path())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run {:?} {:?}: {}", bin_path(), args, e))
}

fn draws(out: &Output) -> Vec<i64> {
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("stdout should be JSON");
    v["draws"].as_array().unwrap().iter().map(|d| d.as_i64().unwrap()).collect()
}

#[test]
fn draw_is_reproducible_for_a_seed() {
    let a = draws(&run(&["draw", "--seed", "24", "-n", "5"]));
    let b = draws(&run(&["draw", "--seed", "24", "-n", "5"]));
    assert_eq!(a.len(), 5);
    assert_eq!(a, b);
    assert!(a.iter().all(|&d| (0..1_000_000).contains(&d)));
}

#[test]
fn draw_rejects_empty_range() {
    let out = run(&["draw", "--seed", "1", "--lo", "5", "--hi", "5"]);
    assert!(!out.status.success());
}

#[cfg(unix)]
#[test]
fn exec_runs_in_directory_with_redirected_output() {
    let workdir = tempfile::tempdir().unwrap();
    let logdir = tempfile::tempdir().unwrap();
    let log = logdir.path().join("run.log");

    let out = run(&[
        "exec",
        "--chdir",
        workdir.path().to_string_lossy().as_ref(),
        "--log",
        log.to_string_lossy().as_ref(),
        "--",
        "sh",
        "-c",
        "pwd; echo problem >&2",
    ]);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    assert!(out.stdout.is_empty(), "child output should go to the log");

    let text = std::fs::read_to_string(&log).unwrap();
    let mut lines = text.lines();
    let pwd = PathBuf::from(lines.next().unwrap());
    assert_eq!(pwd.canonicalize().unwrap(), workdir.path().canonicalize().unwrap());
    assert_eq!(lines.next(), Some("problem"));
}

#[cfg(unix)]
#[test]
fn exec_splits_streams_and_propagates_exit_code() {
    let logdir = tempfile::tempdir().unwrap();
    let out_log = logdir.path().join("out.log");
    let err_log = logdir.path().join("err.log");

    let out = run(&[
        "exec",
        "--log",
        out_log.to_string_lossy().as_ref(),
        "--err-log",
        err_log.to_string_lossy().as_ref(),
        "--",
        "sh",
        "-c",
        "echo fine; echo broken >&2; exit 3",
    ]);
    assert_eq!(out.status.code(), Some(3));
    assert_eq!(std::fs::read_to_string(&out_log).unwrap(), "fine\n");
    assert_eq!(std::fs::read_to_string(&err_log).unwrap(), "broken\n");
}

#[test]
fn exec_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");
    let out = run(&["exec", "--chdir", missing.to_string_lossy().as_ref(), "--", "true"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Directory unavailable"), "stderr={stderr}");
}
