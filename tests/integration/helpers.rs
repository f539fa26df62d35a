//! Shared test helpers.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use tempfile::TempDir;

/// Config used by CLI tests: no pacing, quiet logging.
pub const FAST_CONFIG: &str = r#"
[narration]
words_per_minute = 0

[logging]
level = "error"
"#;

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

pub fn fixture(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

pub fn read_fixture(name: &str) -> String {
    fs::read_to_string(fixture(name)).expect("fixture should exist")
}

/// Temp directory holding a config file with `config` as its content.
pub fn temp_config(config: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("config.toml");
    fs::write(&path, config).expect("write config");
    (dir, path)
}

/// `zvox` command reading its config from `config_path`.
pub fn zvox(config_path: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("zvox").expect("zvox binary");
    cmd.env("ZVOX_CONFIG", config_path).env_remove("RUST_LOG");
    cmd
}
