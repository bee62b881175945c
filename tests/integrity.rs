use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use rstest::rstest;

mod common;

use common::command::{head_oid, init_repository_dir, run_vcs_command, vcs_commit};

const ONE: &str = "43dd47ea691c90a5fa7827892c70241913351963";

#[rstest]
fn corrupt_object_is_reported(init_repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    let object = init_repository_dir.path().join(format!(".vcs/objects/{}/{}", &ONE[..2], &ONE[2..]));
    std::fs::write(&object, b"definitely not zlib")?;

    run_vcs_command(init_repository_dir.path(), &["cat-file", "-p", ONE])
        .assert()
        .failure()
        .stderr(predicate::str::contains(format!("object {ONE} is corrupt")));

    Ok(())
}

#[rstest]
fn corrupt_index_is_reported(init_repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    let index = init_repository_dir.path().join(".vcs/index");
    let mut bytes = std::fs::read(&index)?;
    let middle = bytes.len() / 2;
    bytes[middle] ^= 0xff;
    std::fs::write(&index, bytes)?;

    run_vcs_command(init_repository_dir.path(), &["ls-files"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is corrupt"));
    run_vcs_command(init_repository_dir.path(), &["status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is corrupt"));

    Ok(())
}

#[rstest]
fn held_index_lock_blocks_add(init_repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    init_repository_dir.child(".vcs/index.lock").touch()?;
    init_repository_dir.child("new.txt").write_str("new")?;

    run_vcs_command(init_repository_dir.path(), &["add", "new.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unable to lock"));

    // the foreign lock is left for its owner
    init_repository_dir
        .child(".vcs/index.lock")
        .assert(predicate::path::is_file());
    run_vcs_command(init_repository_dir.path(), &["ls-files"])
        .assert()
        .success()
        .stdout("1.txt\na/2.txt\na/b/3.txt\n");

    Ok(())
}

#[rstest]
fn held_branch_lock_blocks_commit(init_repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    let before = head_oid(init_repository_dir.path());
    init_repository_dir.child("1.txt").write_str("one, edited")?;
    run_vcs_command(init_repository_dir.path(), &["add", "1.txt"])
        .assert()
        .success();
    init_repository_dir.child(".vcs/refs/heads/main.lock").touch()?;

    vcs_commit(init_repository_dir.path(), "Blocked")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unable to lock"));

    assert_eq!(head_oid(init_repository_dir.path()), before);

    Ok(())
}
