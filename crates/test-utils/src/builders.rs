use std::fmt::Write;

/// Builder for docker-compose YAML to simplify test setup.
#[derive(Debug, Clone)]
pub struct ComposeFileBuilder {
    version: Option<String>,
    services: Vec<String>,
}

impl Default for ComposeFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ComposeFileBuilder {
    pub fn new() -> Self {
        Self {
            version: Some("3.0".to_string()),
            services: Vec::new(),
        }
    }

    pub fn without_version(mut self) -> Self {
        self.version = None;
        self
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    /// `build: <path>` short form.
    pub fn build_service(mut self, name: &str, path: &str) -> Self {
        self.services
            .push(format!("  {name}:\n    build: {path}\n"));
        self
    }

    /// `build: { context: <path> }` long form.
    pub fn context_service(mut self, name: &str, context: &str) -> Self {
        self.services.push(format!(
            "  {name}:\n    build:\n      context: {context}\n"
        ));
        self
    }

    pub fn image_service(mut self, name: &str, image: &str) -> Self {
        self.services
            .push(format!("  {name}:\n    image: {image}\n"));
        self
    }

    /// Image service carrying an explicit watch path label.
    pub fn labeled_service(mut self, name: &str, watch_path: &str) -> Self {
        self.services.push(format!(
            "  {name}:\n    image: {name}\n    labels:\n      docker-compose-watcher.path: {watch_path}\n"
        ));
        self
    }

    pub fn build(self) -> String {
        let mut out = String::new();
        if let Some(v) = &self.version {
            let _ = writeln!(out, "version: \"{v}\"");
        }
        out.push_str("services:\n");
        if self.services.is_empty() {
            out.truncate(out.len() - 1);
            out.push_str(" {}\n");
        }
        for service in &self.services {
            out.push_str(service);
        }
        out
    }
}
