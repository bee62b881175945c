use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use rstest::rstest;

mod common;

use common::command::{
    AUTHOR_EMAIL, AUTHOR_NAME, head_oid, init_repository_dir, repository_dir, run_vcs_command,
    vcs_commit, vcs_commit_at,
};
use common::stdout_of;

const ROOT_TREE: &str = "88484bd9e7919fa9b7dfeb008fb8f6c85743d171";

fn short(oid: &str) -> &str {
    &oid[..7]
}

#[rstest]
fn first_commit_is_reported_as_root(repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    run_vcs_command(repository_dir.path(), &["init"])
        .assert()
        .success();
    repository_dir.child("1.txt").write_str("one")?;
    run_vcs_command(repository_dir.path(), &["add", "1.txt"])
        .assert()
        .success();

    vcs_commit(repository_dir.path(), "Initial commit")
        .assert()
        .success()
        .stdout(predicate::str::is_match(
            r"^\[main \(root-commit\) [0-9a-f]{7}\] Initial commit\n$",
        )?);

    let oid = head_oid(repository_dir.path());
    assert_eq!(oid.len(), 40);
    repository_dir
        .child(format!(".vcs/objects/{}/{}", &oid[..2], &oid[2..]))
        .assert(predicate::path::is_file());

    Ok(())
}

#[rstest]
fn write_tree_matches_the_committed_tree(init_repository_dir: TempDir) {
    run_vcs_command(init_repository_dir.path(), &["write-tree"])
        .assert()
        .success()
        .stdout(format!("{ROOT_TREE}\n"));

    run_vcs_command(init_repository_dir.path(), &["cat-file", "-p", "HEAD"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(format!("tree {ROOT_TREE}\n")));
}

#[rstest]
fn commit_without_changes_is_refused(init_repository_dir: TempDir) {
    let before = head_oid(init_repository_dir.path());

    vcs_commit(init_repository_dir.path(), "Again")
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing to commit"));

    assert_eq!(head_oid(init_repository_dir.path()), before);
}

#[rstest]
fn allow_empty_records_an_unchanged_tree(init_repository_dir: TempDir) {
    let parent = head_oid(init_repository_dir.path());

    run_vcs_command(
        init_repository_dir.path(),
        &["commit", "-m", "Checkpoint", "--allow-empty"],
    )
    .assert()
    .success()
    .stdout(predicate::str::is_match(r"^\[main [0-9a-f]{7}\] Checkpoint\n$").unwrap());

    let head = head_oid(init_repository_dir.path());
    assert_ne!(head, parent);
    run_vcs_command(init_repository_dir.path(), &["cat-file", "-p", &head])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("parent {parent}\n")));
}

#[rstest]
fn empty_index_has_nothing_to_commit(repository_dir: TempDir) {
    run_vcs_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    vcs_commit(repository_dir.path(), "Nothing")
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing to commit"));
    repository_dir
        .child(".vcs/refs/heads/main")
        .assert(predicate::path::missing());
}

#[rstest]
fn author_override_keeps_the_committer(init_repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    init_repository_dir.child("1.txt").write_str("one, again")?;
    run_vcs_command(init_repository_dir.path(), &["add", "1.txt"])
        .assert()
        .success();

    let mut command = run_vcs_command(
        init_repository_dir.path(),
        &["commit", "-m", "Edit", "--author", "Someone Else <someone@example.com>"],
    );
    command.env("VCS_AUTHOR_DATE", "2023-01-02 12:00:00 +0000");
    command.assert().success();

    let head = head_oid(init_repository_dir.path());
    run_vcs_command(init_repository_dir.path(), &["cat-file", "-p", &head])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "author Someone Else <someone@example.com> 1672660800 +0000\n",
        ))
        .stdout(predicate::str::contains(format!(
            "committer {AUTHOR_NAME} <{AUTHOR_EMAIL}> 1672660800 +0000\n"
        )));

    Ok(())
}

#[rstest]
fn log_prints_the_medium_format(init_repository_dir: TempDir) {
    let oid = head_oid(init_repository_dir.path());

    run_vcs_command(init_repository_dir.path(), &["log"])
        .assert()
        .success()
        .stdout(format!(
            "commit {oid}\n\
             Author: {AUTHOR_NAME} <{AUTHOR_EMAIL}>\n\
             Date:   Sun Jan 1 12:00:00 2023 +0000\n\
             \n    Initial commit\n"
        ));
}

#[rstest]
fn log_lists_newest_first(init_repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_repository_dir.path();
    let first = head_oid(dir);

    init_repository_dir.child("1.txt").write_str("one, edited")?;
    run_vcs_command(dir, &["add", "1.txt"]).assert().success();
    vcs_commit_at(dir, "Edit one\n\nWith a body", "2023-01-02 12:00:00 +0000")
        .assert()
        .success();
    let second = head_oid(dir);

    run_vcs_command(dir, &["log", "--oneline"])
        .assert()
        .success()
        .stdout(format!(
            "{} Edit one\n{} Initial commit\n",
            short(&second),
            short(&first)
        ));

    run_vcs_command(dir, &["log", "-n", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("    Edit one\n    \n    With a body\n"))
        .stdout(predicate::str::contains("Initial commit").not());

    run_vcs_command(dir, &["log", "--oneline", &first])
        .assert()
        .success()
        .stdout(format!("{} Initial commit\n", short(&first)));

    Ok(())
}

#[rstest]
fn log_of_an_unborn_branch_is_empty(repository_dir: TempDir) {
    run_vcs_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    run_vcs_command(repository_dir.path(), &["log"])
        .assert()
        .success()
        .stdout("");
}

#[rstest]
fn first_parent_follows_the_mainline(init_repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_repository_dir.path();
    let base = head_oid(dir);

    run_vcs_command(dir, &["branch", "topic"]).assert().success();
    run_vcs_command(dir, &["checkout", "topic"]).assert().success();
    init_repository_dir.child("a/2.txt").write_str("two on topic")?;
    run_vcs_command(dir, &["add", "a"]).assert().success();
    vcs_commit_at(dir, "Topic work", "2023-01-02 12:00:00 +0000")
        .assert()
        .success();
    let topic = head_oid(dir);

    run_vcs_command(dir, &["checkout", "main"]).assert().success();
    init_repository_dir.child("1.txt").write_str("one on main")?;
    run_vcs_command(dir, &["add", "1.txt"]).assert().success();
    vcs_commit_at(dir, "Main work", "2023-01-03 12:00:00 +0000")
        .assert()
        .success();
    let main = head_oid(dir);

    let tree = stdout_of(&run_vcs_command(dir, &["write-tree"]).assert().success());
    let mut merge = run_vcs_command(
        dir,
        &["commit-tree", tree.trim(), "-p", &main, "-p", &topic, "-m", "Merge topic"],
    );
    merge.env("VCS_AUTHOR_DATE", "2023-01-04 12:00:00 +0000");
    let merge = stdout_of(&merge.assert().success()).trim().to_string();

    run_vcs_command(dir, &["log", "--oneline", &merge])
        .assert()
        .success()
        .stdout(format!(
            "{} Merge topic\n{} Main work\n{} Topic work\n{} Initial commit\n",
            short(&merge),
            short(&main),
            short(&topic),
            short(&base)
        ));

    run_vcs_command(dir, &["log", "--oneline", "--first-parent", &merge])
        .assert()
        .success()
        .stdout(format!(
            "{} Merge topic\n{} Main work\n{} Initial commit\n",
            short(&merge),
            short(&main),
            short(&base)
        ));

    run_vcs_command(dir, &["log", "-n", "1", &merge])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "Merge: {} {}\n",
            short(&main),
            short(&topic)
        )));

    // commit-tree leaves every ref alone
    assert_eq!(head_oid(dir), main);

    Ok(())
}

#[rstest]
fn show_lists_the_paths_a_commit_changed(init_repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_repository_dir.path();

    run_vcs_command(dir, &["show"])
        .assert()
        .success()
        .stdout(predicate::str::ends_with(
            "    Initial commit\n\nA\t1.txt\nA\ta/2.txt\nA\ta/b/3.txt\n",
        ));

    init_repository_dir.child("a/2.txt").write_str("two, edited")?;
    init_repository_dir.child("c.txt").write_str("c")?;
    run_vcs_command(dir, &["add", "."]).assert().success();
    vcs_commit_at(dir, "Second", "2023-01-02 12:00:00 +0000")
        .assert()
        .success();

    run_vcs_command(dir, &["show", "HEAD"])
        .assert()
        .success()
        .stdout(predicate::str::ends_with("    Second\n\nM\ta/2.txt\nA\tc.txt\n"));

    Ok(())
}
