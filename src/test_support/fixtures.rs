//! Fixture builders for Node-style project trees.

use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value};
use tempfile::TempDir;

use crate::core::PackageDescriptor;
use crate::util::config::CONFIG_NAME;

/// Default host license text written by fixtures.
pub const HOST_LICENSE_TEXT: &str = "Copyright (c) Example Corp\n\nAll rights reserved.\n";

/// Builder for a project directory with installed dependencies.
#[derive(Debug, Clone)]
pub struct NodeProjectBuilder {
    descriptor: Map<String, Value>,
    files: Vec<(PathBuf, String)>,
    config: Option<String>,
}

impl NodeProjectBuilder {
    /// Start a project with the given name and version.
    pub fn new(name: &str, version: &str) -> Self {
        let mut descriptor = Map::new();
        descriptor.insert("name".to_string(), json!(name));
        descriptor.insert("version".to_string(), json!(version));

        NodeProjectBuilder {
            descriptor,
            files: Vec::new(),
            config: None,
        }
    }

    /// Set a top-level descriptor field.
    pub fn field(mut self, key: &str, value: Value) -> Self {
        self.descriptor.insert(key.to_string(), value);
        self
    }

    fn declare(mut self, section: &str, name: &str, version: &str) -> Self {
        let deps = self
            .descriptor
            .entry(section.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(map) = deps {
            map.insert(name.to_string(), json!(version));
        }
        self
    }

    /// Declare a runtime dependency of the project.
    pub fn dependency(self, name: &str, version: &str) -> Self {
        self.declare("dependencies", name, version)
    }

    /// Declare a development dependency of the project.
    pub fn dev_dependency(self, name: &str, version: &str) -> Self {
        self.declare("devDependencies", name, version)
    }

    /// Declare an optional dependency of the project.
    pub fn optional_dependency(self, name: &str, version: &str) -> Self {
        self.declare("optionalDependencies", name, version)
    }

    /// Install a package at `node_modules/<name>`.
    pub fn package(self, name: &str, version: &str, license: &str, deps: &[(&str, &str)]) -> Self {
        let dir = PathBuf::from("node_modules").join(name);
        self.install_at(dir, name, version, license, deps)
    }

    /// Install a package at `node_modules/<parent>/node_modules/<name>`.
    pub fn nested_package(
        self,
        parent: &str,
        name: &str,
        version: &str,
        license: &str,
        deps: &[(&str, &str)],
    ) -> Self {
        let dir = PathBuf::from("node_modules")
            .join(parent)
            .join("node_modules")
            .join(name);
        self.install_at(dir, name, version, license, deps)
    }

    fn install_at(
        self,
        dir: PathBuf,
        name: &str,
        version: &str,
        license: &str,
        deps: &[(&str, &str)],
    ) -> Self {
        let dependencies: Map<String, Value> = deps
            .iter()
            .map(|(n, v)| (n.to_string(), json!(v)))
            .collect();
        let manifest = json!({
            "name": name,
            "version": version,
            "license": license,
            "repository": format!("github:example/{}", name.trim_start_matches('@')),
            "dependencies": dependencies,
        });
        self.file(dir.join("package.json"), &manifest.to_string())
    }

    /// Install a package with a hand-written `package.json`.
    pub fn raw_package(self, name: &str, package_json: &str) -> Self {
        let path = PathBuf::from("node_modules").join(name).join("package.json");
        self.file(path, package_json)
    }

    /// Write an arbitrary file relative to the project root.
    pub fn file(mut self, path: impl Into<PathBuf>, content: &str) -> Self {
        self.files.push((path.into(), content.to_string()));
        self
    }

    /// Write the host project's root `LICENSE`.
    pub fn host_license(self) -> Self {
        self.file("LICENSE", HOST_LICENSE_TEXT)
    }

    /// Write `Shipyard.toml`.
    pub fn config(mut self, content: &str) -> Self {
        self.config = Some(content.to_string());
        self
    }

    /// Materialize the project in a temporary directory.
    pub fn build(self) -> NodeProject {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();

        let descriptor = serde_json::to_string_pretty(&self.descriptor).unwrap();
        std::fs::write(root.join("package.json"), descriptor).unwrap();

        for (path, content) in &self.files {
            let full = root.join(path);
            std::fs::create_dir_all(full.parent().unwrap()).unwrap();
            std::fs::write(full, content).unwrap();
        }

        if let Some(config) = self.config {
            std::fs::write(root.join(CONFIG_NAME), config).unwrap();
        }

        NodeProject { tmp }
    }
}

/// A materialized fixture project. The directory is removed on drop.
#[derive(Debug)]
pub struct NodeProject {
    tmp: TempDir,
}

impl NodeProject {
    /// Project root directory.
    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    /// Path of `Shipyard.toml`.
    pub fn config_path(&self) -> PathBuf {
        self.root().join(CONFIG_NAME)
    }

    /// Parsed root `package.json`.
    pub fn descriptor(&self) -> PackageDescriptor {
        PackageDescriptor::load(&self.root().join("package.json")).unwrap()
    }
}
