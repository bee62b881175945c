use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;
use rstest::rstest;

mod common;

use common::command::{init_repository_dir, repository_dir, run_vcs_command};

const HELLO: &str = "b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0";
const ONE: &str = "43dd47ea691c90a5fa7827892c70241913351963";
const TWO: &str = "64c5e5885a4b06010b3a0c20edb7900dd0311025";
const THREE: &str = "1d19714ffbc272ba0da6eb419d66123c20527174";
const TREE_A: &str = "202bc192d34beb85d0301ec8c8940cd0252cc48a";
const TREE_A_B: &str = "d864f7793fd2952c217c27d3780442f8943c8663";

fn object_path(oid: &str) -> String {
    format!(".vcs/objects/{}/{}", &oid[..2], &oid[2..])
}

#[rstest]
fn hash_object_only_stores_with_write(repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    run_vcs_command(repository_dir.path(), &["init"])
        .assert()
        .success();
    repository_dir.child("hello.txt").write_str("hello")?;

    run_vcs_command(repository_dir.path(), &["hash-object", "hello.txt"])
        .assert()
        .success()
        .stdout(format!("{HELLO}\n"));
    repository_dir
        .child(object_path(HELLO))
        .assert(predicate::path::missing());

    run_vcs_command(repository_dir.path(), &["hash-object", "-w", "hello.txt"])
        .assert()
        .success()
        .stdout(format!("{HELLO}\n"));
    repository_dir
        .child(object_path(HELLO))
        .assert(predicate::path::is_file());

    run_vcs_command(repository_dir.path(), &["cat-file", "-p", HELLO])
        .assert()
        .success()
        .stdout("hello");

    Ok(())
}

#[rstest]
fn cat_file_reports_type_and_size(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();

    run_vcs_command(dir, &["cat-file", "-t", ONE])
        .assert()
        .success()
        .stdout("blob\n");
    run_vcs_command(dir, &["cat-file", "-s", THREE])
        .assert()
        .success()
        .stdout("5\n");
    run_vcs_command(dir, &["cat-file", "-t", TREE_A])
        .assert()
        .success()
        .stdout("tree\n");
    run_vcs_command(dir, &["cat-file", "-t", "HEAD"])
        .assert()
        .success()
        .stdout("commit\n");
}

#[rstest]
fn cat_file_accepts_a_short_id(init_repository_dir: TempDir) {
    run_vcs_command(init_repository_dir.path(), &["cat-file", "-p", &TWO[..7]])
        .assert()
        .success()
        .stdout("two");
}

#[rstest]
fn cat_file_pretty_prints_a_tree(init_repository_dir: TempDir) {
    run_vcs_command(init_repository_dir.path(), &["cat-file", "-p", TREE_A])
        .assert()
        .success()
        .stdout(format!(
            "100644 blob {TWO}\t2.txt\n040000 tree {TREE_A_B}\tb\n"
        ));
}

#[rstest]
fn cat_file_needs_exactly_one_mode(init_repository_dir: TempDir) {
    run_vcs_command(init_repository_dir.path(), &["cat-file", ONE])
        .assert()
        .failure();
    run_vcs_command(init_repository_dir.path(), &["cat-file", "-t", "-s", ONE])
        .assert()
        .failure();
}

#[rstest]
fn cat_file_of_an_unknown_object_fails(init_repository_dir: TempDir) {
    run_vcs_command(
        init_repository_dir.path(),
        &["cat-file", "-p", "0000000000000000000000000000000000000000"],
    )
    .assert()
    .failure()
    .stderr(predicate::str::contains("not found"));
}

#[rstest]
fn ls_tree_lists_one_level(init_repository_dir: TempDir) {
    run_vcs_command(init_repository_dir.path(), &["ls-tree", "HEAD"])
        .assert()
        .success()
        .stdout(format!(
            "100644 blob {ONE}\t1.txt\n040000 tree {TREE_A}\ta\n"
        ));
}

#[rstest]
fn ls_tree_recursive_lists_files_only(init_repository_dir: TempDir) {
    run_vcs_command(init_repository_dir.path(), &["ls-tree", "-r", "main"])
        .assert()
        .success()
        .stdout(format!(
            "100644 blob {ONE}\t1.txt\n100644 blob {TWO}\ta/2.txt\n100644 blob {THREE}\ta/b/3.txt\n"
        ));
}

#[rstest]
fn ls_tree_accepts_a_tree_id(init_repository_dir: TempDir) {
    run_vcs_command(init_repository_dir.path(), &["ls-tree", TREE_A_B])
        .assert()
        .success()
        .stdout(format!("100644 blob {THREE}\t3.txt\n"));
}
