//! Builtin commands exercised through the shell binary

#[path = "common/mod.rs"]
mod common;
use common::{run_script, sdn_in};
use predicates::prelude::*;
use std::fs;

#[test]
fn test_cd_switches_local_aliases() {
    let home = tempfile::tempdir().unwrap();
    let project = home.path().join("proj");
    fs::create_dir(&project).unwrap();
    fs::write(
        project.join(".sdn_aliases"),
        "b='echo local build'\nt=echo local test\n",
    )
    .unwrap();

    run_script(
        home.path(),
        "alias b='echo global build'\nb\ncd proj\nb\nalias\ncd ..\nb\nalias\n",
    )
    .success()
    .stdout(concat!(
        "global build\n",
        "local build\n",
        "b='echo global build'  (shadowed)\n",
        "# local (.sdn_aliases)\n",
        "b='echo local build'\n",
        "t='echo local test'\n",
        "global build\n",
        "b='echo global build'\n",
    ));
}

#[test]
fn test_local_aliases_load_at_startup() {
    let home = tempfile::tempdir().unwrap();
    fs::write(home.path().join(".sdn_aliases"), "hi=echo hello\nbad line\n").unwrap();

    run_script(home.path(), "hi world\n")
        .success()
        .stdout("hello world\n")
        .stderr(predicate::str::contains(".sdn_aliases line 2"));
}

#[test]
fn test_unalias_refuses_local_alias() {
    let home = tempfile::tempdir().unwrap();
    fs::write(home.path().join(".sdn_aliases"), "hi=echo hello\n").unwrap();

    run_script(home.path(), "unalias hi\nhi\n")
        .success()
        .stdout("hello\n")
        .stderr(predicate::str::contains("unalias: hi: local alias"));
}

#[test]
fn test_unalias_removes_global() {
    let home = tempfile::tempdir().unwrap();
    run_script(home.path(), "alias e=echo\nunalias e\ne gone\necho still here\n")
        .success()
        .stdout("still here\n")
        .stderr(predicate::str::contains("e: command not found"));
}

#[test]
fn test_cd_home_and_tilde() {
    let home = tempfile::tempdir().unwrap();
    fs::create_dir(home.path().join("sub")).unwrap();
    let canonical = home.path().canonicalize().unwrap();
    let expected = format!("{}\n", canonical.display());

    run_script(home.path(), "cd sub\ncd\npwd -P\ncd sub\ncd ~\npwd -P\n")
        .success()
        .stdout(format!("{}{}", expected, expected));
}

#[test]
fn test_cd_tilde_subdirectory() {
    let home = tempfile::tempdir().unwrap();
    fs::create_dir(home.path().join("sub")).unwrap();
    let expected = format!("{}\n", home.path().join("sub").canonicalize().unwrap().display());

    run_script(home.path(), "cd /\ncd ~/sub\npwd -P\n")
        .success()
        .stdout(expected);
}

#[test]
fn test_cd_failure_keeps_directory() {
    let home = tempfile::tempdir().unwrap();
    let expected = format!("{}\n", home.path().canonicalize().unwrap().display());

    run_script(home.path(), "cd no_such_dir\npwd -P\n")
        .success()
        .stdout(expected)
        .stderr(predicate::str::contains("cd: no_such_dir:"));
}

#[test]
fn test_history_listing() {
    let home = tempfile::tempdir().unwrap();
    run_script(home.path(), "echo a\nhistory\n")
        .success()
        .stdout(predicate::str::starts_with("a\n\nCommand History:\n----------------\n"))
        .stdout(predicate::str::is_match(r"\n  1  \[[^\]]+\] echo a\n").unwrap())
        .stdout(predicate::str::is_match(r"\n  2  \[[^\]]+\] history\n----------------\n$").unwrap());
}

#[test]
fn test_history_without_log() {
    let home = tempfile::tempdir().unwrap();
    let unwritable = home.path().join("missing_dir").join("log");
    sdn_in(home.path())
        .env("SDN_HISTFILE", &unwritable)
        .write_stdin("history\n")
        .assert()
        .success()
        .stdout("No command history found.\n");
}

#[test]
fn test_history_persists_across_sessions() {
    let home = tempfile::tempdir().unwrap();
    run_script(home.path(), "echo one\n").success();
    run_script(home.path(), "echo two\nhistory\n")
        .success()
        .stdout(predicate::str::contains("] echo one\n"))
        .stdout(predicate::str::contains("] echo two\n"));
}

#[test]
fn test_export_listing() {
    let home = tempfile::tempdir().unwrap();
    run_script(home.path(), "SDN_BT_A=1\nexport SDN_BT_B=2\nexport\n")
        .success()
        .stdout("SDN_BT_A=1\nSDN_BT_B=2 (exported)\n");
}

#[test]
fn test_invalid_variable_name() {
    let home = tempfile::tempdir().unwrap();
    run_script(home.path(), "export 1BAD=x\necho ok\n")
        .success()
        .stdout("ok\n")
        .stderr(predicate::str::contains("export:"));
}

#[test]
fn test_builtin_output_redirect() {
    let home = tempfile::tempdir().unwrap();
    run_script(home.path(), "alias g=git\nalias > aliases.txt\nalias >> aliases.txt\n")
        .success()
        .stdout("");
    assert_eq!(
        fs::read_to_string(home.path().join("aliases.txt")).unwrap(),
        "g='git'\ng='git'\n"
    );
}
