use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;
use rstest::rstest;

mod common;

use common::command::{head_oid, repository_dir, run_vcs_command};

fn initialized(repository_dir: TempDir) -> TempDir {
    run_vcs_command(repository_dir.path(), &["init"])
        .assert()
        .success();
    repository_dir
}

#[rstest]
fn set_get_and_list(repository_dir: TempDir) {
    let dir = initialized(repository_dir);

    run_vcs_command(dir.path(), &["config", "user.name", "Jane Doe"])
        .assert()
        .success()
        .stdout("");
    run_vcs_command(dir.path(), &["config", "user.email", "jane@example.com"])
        .assert()
        .success();

    run_vcs_command(dir.path(), &["config", "user.name"])
        .assert()
        .success()
        .stdout("Jane Doe\n");
    run_vcs_command(dir.path(), &["config", "--list"])
        .assert()
        .success()
        .stdout("user.email=jane@example.com\nuser.name=Jane Doe\n");
    dir.child(".vcs/config")
        .assert(predicate::str::contains("[user]"));
}

#[rstest]
fn unset_and_malformed_keys_fail(repository_dir: TempDir) {
    let dir = initialized(repository_dir);

    run_vcs_command(dir.path(), &["config", "core.editor"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'core.editor' is not set"));
    run_vcs_command(dir.path(), &["config", "nodot", "value"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid config key 'nodot'"));
}

#[rstest]
fn configured_identity_signs_commits(repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    let dir = initialized(repository_dir);
    run_vcs_command(dir.path(), &["config", "user.name", "Jane Doe"])
        .assert()
        .success();
    run_vcs_command(dir.path(), &["config", "user.email", "jane@example.com"])
        .assert()
        .success();
    dir.child("1.txt").write_str("one")?;
    run_vcs_command(dir.path(), &["add", "1.txt"]).assert().success();

    let mut commit = run_vcs_command(dir.path(), &["commit", "-m", "Configured"]);
    commit
        .env_remove("VCS_AUTHOR_NAME")
        .env_remove("VCS_AUTHOR_EMAIL")
        .env("VCS_AUTHOR_DATE", "2023-01-01 12:00:00 +0000");
    commit.assert().success();

    run_vcs_command(dir.path(), &["cat-file", "-p", &head_oid(dir.path())])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "author Jane Doe <jane@example.com> 1672574400 +0000\n",
        ));

    Ok(())
}
