#![allow(dead_code)]

use assert_cmd::Command;
use std::io::Write;

/// The binary with the caller's bfscan environment and config file masked out.
pub fn cargo_bin() -> Command {
    let mut cmd = Command::cargo_bin("bfscan").unwrap();
    cmd.env("BFSCAN_CONFIG", "/nonexistent/bfscan.toml")
        .env_remove("BFSCAN_EOF")
        .env_remove("BFSCAN_CELLS")
        .env_remove("BFSCAN_LOG");
    cmd
}

pub fn source_file(content: &str) -> tempfile::NamedTempFile {
    let mut tf = tempfile::NamedTempFile::new().expect("tempfile");
    write!(tf, "{}", content).unwrap();
    tf
}
