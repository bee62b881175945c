use crate::common::file::{FileSpec, write_file};
use assert_cmd::Command;
use assert_fs::TempDir;
use rstest::fixture;
use std::path::Path;

pub const AUTHOR_NAME: &str = "fake_user";
pub const AUTHOR_EMAIL: &str = "fake_email@email.com";
pub const AUTHOR_DATE: &str = "2023-01-01 12:00:00 +0000";

#[fixture]
pub fn repository_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// Repository with one commit holding `1.txt`, `a/2.txt` and `a/b/3.txt`.
#[fixture]
pub fn init_repository_dir(repository_dir: TempDir) -> TempDir {
    run_vcs_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    write_file(FileSpec::new(
        repository_dir.path().join("1.txt"),
        "one".to_string(),
    ));
    write_file(FileSpec::new(
        repository_dir.path().join("a").join("2.txt"),
        "two".to_string(),
    ));
    write_file(FileSpec::new(
        repository_dir.path().join("a").join("b").join("3.txt"),
        "three".to_string(),
    ));

    run_vcs_command(repository_dir.path(), &["add", "."])
        .assert()
        .success();
    vcs_commit(repository_dir.path(), "Initial commit")
        .assert()
        .success();

    repository_dir
}

pub fn run_vcs_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("vcs").expect("Failed to find vcs binary");
    cmd.current_dir(dir);
    cmd.env_remove("VCS_LOG");
    cmd.envs(vec![
        ("VCS_AUTHOR_NAME", AUTHOR_NAME),
        ("VCS_AUTHOR_EMAIL", AUTHOR_EMAIL),
        ("NO_COLOR", "1"),
    ]);
    for arg in args {
        cmd.arg(arg);
    }
    cmd
}

pub fn vcs_commit(dir: &Path, message: &str) -> Command {
    vcs_commit_at(dir, message, AUTHOR_DATE)
}

pub fn vcs_commit_at(dir: &Path, message: &str, date: &str) -> Command {
    let mut cmd = run_vcs_command(dir, &["commit", "-m", message]);
    cmd.env("VCS_AUTHOR_DATE", date);
    cmd
}

/// Commit id HEAD resolves to, read straight from the ref files.
pub fn head_oid(dir: &Path) -> String {
    let repository = dir.join(".vcs");
    let head = std::fs::read_to_string(repository.join("HEAD")).expect("HEAD is missing");

    match head.trim().strip_prefix("ref: ") {
        Some(branch_ref) => std::fs::read_to_string(repository.join(branch_ref))
            .expect("branch ref is missing")
            .trim()
            .to_string(),
        None => head.trim().to_string(),
    }
}
