use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use pretty_assertions::assert_eq;

fn write_script(name: &str, source: &str) -> Result<PathBuf> {
    let mut dir = std::env::temp_dir();
    dir.push("loxwalk-cli");
    fs::create_dir_all(&dir).context("create script dir")?;

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("clock")?
        .as_nanos();
    let path = dir.join(format!("{name}_{}_{nanos}.lox", std::process::id()));
    fs::write(&path, source).with_context(|| format!("Writing {}", path.display()))?;
    Ok(path)
}

fn run_script(name: &str, source: &str, args: &[&str]) -> Result<Output> {
    let path = write_script(name, source)?;
    let output = Command::new(env!("CARGO_BIN_EXE_loxwalk"))
        .args(args)
        .arg(&path)
        // Default filter level, so any warn-level event would reach stderr.
        .env("LOXWALK_LOG", "warn")
        .env_remove("RUST_LOG")
        .output()
        .context("Running loxwalk")?;
    fs::remove_file(&path).ok();
    Ok(output)
}

#[test]
fn unused_local_warning_is_reported_once() -> Result<()> {
    let output = run_script("unused", "{ var unused = 1; print \"body\"; }\n", &[])?;

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "body\n");
    assert_eq!(
        String::from_utf8_lossy(&output.stderr),
        "[line 1] Warning at 'unused': Variable is never used.\n"
    );
    Ok(())
}

#[test]
fn strict_unused_exits_with_static_error() -> Result<()> {
    let output = run_script(
        "strict",
        "{ var unused = 1; print \"body\"; }\n",
        &["--strict-unused"],
    )?;

    assert_eq!(output.status.code(), Some(65));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "");
    assert_eq!(
        String::from_utf8_lossy(&output.stderr),
        "[line 1] Error at 'unused': Variable is never used.\n"
    );
    Ok(())
}

#[test]
fn runtime_error_exit_code_and_message() -> Result<()> {
    let output = run_script("runtime", "print \"start\";\nprint 1 / 0;\n", &[])?;

    assert_eq!(output.status.code(), Some(70));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "start\n");
    assert_eq!(
        String::from_utf8_lossy(&output.stderr),
        "Division by zero.\n[line 2]\n"
    );
    Ok(())
}

#[test]
fn missing_script_exits_with_io_error() -> Result<()> {
    let output = Command::new(env!("CARGO_BIN_EXE_loxwalk"))
        .arg("does/not/exist.lox")
        .output()
        .context("Running loxwalk")?;

    assert_eq!(output.status.code(), Some(74));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Reading does/not/exist.lox"));
    Ok(())
}
