// tests/config_loading.rs

use std::path::{Path, PathBuf};

use compose_watcher::compose::ComposeLogLevel;
use compose_watcher::config::{Overrides, load_and_validate};
use compose_watcher::errors::ComposeWatchError;

fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("compose-watcher.toml");
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}

#[test]
fn full_config_is_parsed() {
    let (_dir, path) = write_config(
        r#"
[watch]
throttle_ms = 250

[compose]
executable = "/usr/local/bin/docker-compose"
project_name = "demo"
log_level = "WARNING"
files = ["base.yml", "override.yml"]

[build]
no_cache = true
build_args = { VERSION = "1.2" }

[up]
remove_orphans = true
timeout = 5
scale = { worker = 2 }
"#,
    );

    let cfg = load_and_validate(Some(path.as_path()), Overrides::default()).unwrap();
    assert_eq!(cfg.watch.throttle_ms, 250);
    assert_eq!(cfg.compose.executable, "/usr/local/bin/docker-compose");
    assert_eq!(cfg.compose.options.project_name.as_deref(), Some("demo"));
    assert_eq!(cfg.compose.options.log_level, Some(ComposeLogLevel::Warning));
    assert_eq!(
        cfg.compose_files(),
        &[PathBuf::from("base.yml"), PathBuf::from("override.yml")]
    );
    assert!(cfg.build.no_cache);
    assert_eq!(cfg.build.build_args["VERSION"], "1.2");
    assert!(cfg.up.remove_orphans);
    assert_eq!(cfg.up.timeout, Some(5));
    assert_eq!(cfg.up.scale["worker"], 2);
}

#[test]
fn cli_overrides_win() {
    let (_dir, path) = write_config("[watch]\nthrottle_ms = 250\n[compose]\nfiles = [\"a.yml\"]\n");
    let cfg = load_and_validate(
        Some(path.as_path()),
        Overrides {
            files: vec![PathBuf::from("b.yml")],
            throttle_ms: Some(1000),
            executable: Some("podman-compose".into()),
        },
    )
    .unwrap();

    assert_eq!(cfg.watch.throttle_ms, 1000);
    assert_eq!(cfg.compose.executable, "podman-compose");
    assert_eq!(cfg.compose_files(), &[PathBuf::from("b.yml")]);
}

#[test]
fn no_config_file_uses_defaults() {
    let cfg = load_and_validate(None, Overrides::default()).unwrap();
    assert_eq!(cfg.watch.throttle_ms, 500);
    assert_eq!(cfg.compose.executable, "docker-compose");
    assert_eq!(cfg.compose_files(), &[PathBuf::from("docker-compose.yml")]);
    assert!(cfg.compose.options.project_name.is_none());
}

#[test]
fn invalid_toml_is_a_toml_error() {
    let (_dir, path) = write_config("[watch\nthrottle_ms = ");
    let err = load_and_validate(Some(path.as_path()), Overrides::default()).unwrap_err();
    assert!(matches!(err, ComposeWatchError::TomlError(_)));
}

#[test]
fn missing_config_file_is_a_config_error() {
    let err = load_and_validate(Some(Path::new("/definitely/not/here.toml")), Overrides::default())
        .unwrap_err();
    assert!(matches!(err, ComposeWatchError::ConfigError(_)));
}

#[test]
fn zero_throttle_is_rejected() {
    let (_dir, path) = write_config("[watch]\nthrottle_ms = 0\n");
    let err = load_and_validate(Some(path.as_path()), Overrides::default()).unwrap_err();
    assert!(matches!(err, ComposeWatchError::ConfigError(msg) if msg.contains("throttle_ms")));
}
