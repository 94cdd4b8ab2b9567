use std::process::Command;

#[test]
fn cli_compiles_without_warnings() {
    let status = Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(["check", "--quiet", "--bin", "maze-descent"])
        .status()
        .expect("failed to invoke cargo check for maze-descent CLI binary");

    assert!(status.success(), "cargo check --bin maze-descent should succeed");
}

#[test]
fn cli_prints_the_banner_and_inset_map() {
    let output = Command::new(env!("CARGO_BIN_EXE_maze-descent"))
        .args(["--seed", "7", "--levels", "2", "--steps", "3"])
        .output()
        .expect("failed to run the maze-descent binary");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf-8 output");
    let mut lines = stdout.lines();
    assert_eq!(lines.next(), Some("Welcome to Maze Descent."));
    assert_eq!(lines.next(), Some("seed 0x7"));
    assert!(stdout.contains("items: "));
}

#[test]
fn cli_rejects_invalid_configurations() {
    let output = Command::new(env!("CARGO_BIN_EXE_maze-descent"))
        .args(["--levels", "0"])
        .output()
        .expect("failed to run the maze-descent binary");

    assert!(!output.status.success());
}

#[test]
fn cli_refuses_unbounded_level_counts() {
    let output = Command::new(env!("CARGO_BIN_EXE_maze-descent"))
        .args(["--levels", "50000000"])
        .output()
        .expect("failed to run the maze-descent binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("at most 64 are supported"), "{stderr}");
}
