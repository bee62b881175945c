#![allow(dead_code)]

pub mod command;
pub mod file;

/// Captured stdout of a finished command.
pub fn stdout_of(assert: &assert_cmd::assert::Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stdout).into_owned()
}
