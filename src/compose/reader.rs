// src/compose/reader.rs

//! Reads Docker Compose files into service records.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use serde_yaml::Value;
use tracing::debug;

use crate::errors::{ComposeWatchError, Result};
use crate::fs::FileSystem;
use crate::provider::Reader;

/// A service as declared in one compose file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeService {
    pub name: String,
    /// Directory of the compose file the service came from.
    pub directory: PathBuf,
    /// `build` (short form) or `build.context`; `None` for image-only services.
    pub build_path: Option<String>,
    pub labels: BTreeMap<String, String>,
}

/// All services across every registered compose file, keyed by name.
pub type ComposeServices = BTreeMap<String, ComposeService>;

#[derive(Debug, Deserialize)]
struct RawCompose {
    #[serde(default)]
    version: Option<Value>,
    #[serde(default)]
    services: Option<BTreeMap<String, Option<RawService>>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawService {
    #[serde(default)]
    build: Option<Value>,
    #[serde(default)]
    labels: Option<RawLabels>,
}

/// Compose accepts labels as a map or as a list of `key=value` strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawLabels {
    Map(BTreeMap<String, Value>),
    List(Vec<String>),
}

/// Reader over a growing list of compose files.
#[derive(Debug)]
pub struct ComposeReader {
    fs: Arc<dyn FileSystem>,
    files: Vec<PathBuf>,
}

impl ComposeReader {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            files: Vec::new(),
        }
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Read every registered file and merge the services.
    ///
    /// A service name declared in more than one file fails the whole read.
    pub fn read_services(&self) -> Result<ComposeServices> {
        let mut services = ComposeServices::new();
        for file in &self.files {
            let contents = self.fs.read_to_string(file)?;
            let directory = match file.parent() {
                Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                _ => PathBuf::from("."),
            };

            for service in parse_compose(&contents, &directory)? {
                if services.contains_key(&service.name) {
                    return Err(ComposeWatchError::DuplicateService(service.name));
                }
                services.insert(service.name.clone(), service);
            }
        }
        debug!(count = services.len(), "compose services read");
        Ok(services)
    }
}

impl Reader for ComposeReader {
    type Value = ComposeServices;

    fn add(&mut self, path: &Path) -> Result<()> {
        if !self.files.iter().any(|f| f == path) {
            self.files.push(path.to_path_buf());
        }
        Ok(())
    }

    fn read(&mut self) -> Result<ComposeServices> {
        self.read_services()
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Parse one compose document. `directory` is recorded on every service.
pub fn parse_compose(contents: &str, directory: &Path) -> Result<Vec<ComposeService>> {
    let raw: RawCompose = serde_yaml::from_str(contents)?;
    if let Some(version) = &raw.version {
        validate_version(version)?;
    }

    let mut services = Vec::new();
    for (name, service) in raw.services.unwrap_or_default() {
        let service = service.unwrap_or_default();
        let build_path = match &service.build {
            Some(build) => Some(build_path(&name, build)?),
            None => None,
        };
        let labels = match service.labels {
            Some(labels) => flatten_labels(labels),
            None => BTreeMap::new(),
        };
        services.push(ComposeService {
            name,
            directory: directory.to_path_buf(),
            build_path,
            labels,
        });
    }
    Ok(services)
}

/// Accept legacy file formats 1.x to 3.x; the version key may be absent.
fn validate_version(version: &Value) -> Result<()> {
    let text = match version {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => return Err(ComposeWatchError::UnsupportedVersion(format!("{other:?}"))),
    };
    let major = text
        .trim()
        .split('.')
        .next()
        .and_then(|m| m.parse::<u32>().ok())
        .ok_or_else(|| ComposeWatchError::UnsupportedVersion(text.clone()))?;
    if !(1..=3).contains(&major) {
        return Err(ComposeWatchError::UnsupportedVersion(text));
    }
    Ok(())
}

fn build_path(service: &str, build: &Value) -> Result<String> {
    let invalid = |reason: &str| ComposeWatchError::InvalidBuild {
        service: service.to_string(),
        reason: reason.to_string(),
    };
    match build {
        Value::String(path) => Ok(path.clone()),
        Value::Mapping(map) => match map.get("context") {
            Some(Value::String(ctx)) => Ok(ctx.clone()),
            _ => Err(invalid("build.context was not of type string")),
        },
        _ => Err(invalid("build was of invalid type")),
    }
}

fn flatten_labels(labels: RawLabels) -> BTreeMap<String, String> {
    match labels {
        RawLabels::Map(map) => map
            .into_iter()
            .map(|(k, v)| (k, scalar_to_string(&v)))
            .collect(),
        RawLabels::List(items) => items
            .into_iter()
            .map(|item| match item.split_once('=') {
                Some((k, v)) => (k.to_string(), v.to_string()),
                None => (item, String::new()),
            })
            .collect(),
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn reader(fs: &MockFileSystem, files: &[&str]) -> ComposeReader {
        let mut r = ComposeReader::new(Arc::new(fs.clone()));
        for f in files {
            r.add(Path::new(f)).unwrap();
        }
        r
    }

    #[test]
    fn reads_short_and_long_build_forms() {
        let fs = MockFileSystem::new();
        fs.add_file(
            "/mnt/x/foo.yaml",
            r#"
version: "3.0"
services:
  one:
    build: ./foo1
  two:
    build:
      context: ./foo2
"#,
        );
        fs.add_file(
            "/mnt/x/bar.yaml",
            r#"
version: 2.6
services:
  three:
    build: ./bar1
  db:
    image: postgres
"#,
        );

        let services = reader(&fs, &["/mnt/x/foo.yaml", "/mnt/x/bar.yaml"])
            .read_services()
            .unwrap();

        assert_eq!(services.len(), 4);
        assert_eq!(services["one"].build_path.as_deref(), Some("./foo1"));
        assert_eq!(services["two"].build_path.as_deref(), Some("./foo2"));
        assert_eq!(services["three"].build_path.as_deref(), Some("./bar1"));
        assert_eq!(services["db"].build_path, None);
        assert_eq!(services["one"].directory, PathBuf::from("/mnt/x"));
    }

    #[test]
    fn duplicate_service_across_files_fails() {
        let fs = MockFileSystem::new();
        fs.add_file("/mnt/x/foo.yaml", "services:\n  a:\n    build: ./a\n");
        fs.add_file("bar.yaml", "services:\n  a:\n    build: ./other\n");

        let err = reader(&fs, &["/mnt/x/foo.yaml", "bar.yaml"])
            .read_services()
            .unwrap_err();
        assert!(matches!(err, ComposeWatchError::DuplicateService(name) if name == "a"));
    }

    #[test]
    fn file_without_services_is_empty() {
        let fs = MockFileSystem::new();
        fs.add_file("/mnt/x/foo.yaml", "version: '3.0'\n");
        assert!(reader(&fs, &["/mnt/x/foo.yaml"]).read_services().unwrap().is_empty());
    }

    #[test]
    fn unsupported_version_fails() {
        let fs = MockFileSystem::new();
        fs.add_file("/mnt/x/foo.yaml", "version: '4.0'\nservices: {}\n");
        let err = reader(&fs, &["/mnt/x/foo.yaml"]).read_services().unwrap_err();
        assert!(matches!(err, ComposeWatchError::UnsupportedVersion(v) if v == "4.0"));
    }

    #[test]
    fn invalid_build_shape_fails() {
        let fs = MockFileSystem::new();
        fs.add_file("/c.yml", "services:\n  a:\n    build: [1, 2]\n");
        let err = reader(&fs, &["/c.yml"]).read_services().unwrap_err();
        assert!(matches!(err, ComposeWatchError::InvalidBuild { service, .. } if service == "a"));
    }

    #[test]
    fn missing_file_fails() {
        let fs = MockFileSystem::new();
        assert!(reader(&fs, &["/nope.yml"]).read_services().is_err());
    }

    #[test]
    fn labels_accept_map_and_list_forms() {
        let parsed = parse_compose(
            r#"
services:
  a:
    labels:
      docker-compose-watcher.path: ./src
      replicas: 2
  b:
    labels:
      - "docker-compose-watcher.path=./lib"
      - "flag"
"#,
            Path::new("."),
        )
        .unwrap();

        let a = parsed.iter().find(|s| s.name == "a").unwrap();
        assert_eq!(a.labels["docker-compose-watcher.path"], "./src");
        assert_eq!(a.labels["replicas"], "2");

        let b = parsed.iter().find(|s| s.name == "b").unwrap();
        assert_eq!(b.labels["docker-compose-watcher.path"], "./lib");
        assert_eq!(b.labels["flag"], "");
    }

    #[test]
    fn adding_same_file_twice_is_a_noop() {
        let fs = MockFileSystem::new();
        fs.add_file("/c.yml", "services:\n  a:\n    build: .\n");
        let r = reader(&fs, &["/c.yml", "/c.yml"]);
        assert_eq!(r.files().len(), 1);
        assert_eq!(r.read_services().unwrap().len(), 1);
    }
}
