//! Dependency tree scanning.
//!
//! Walks every package reachable from the project's declared dependencies
//! through `node_modules`, following Node's lookup rules, and reads each
//! package's license metadata. Reads within a discovery wave run in
//! parallel; a wave is fully joined before the next one starts.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use rayon::prelude::*;
use regex::Regex;
use serde_json::Value;
use url::Url;
use walkdir::WalkDir;

use crate::core::{PackageDescriptor, PackageKey};
use crate::license::classify::{sniff_license_text, UNKNOWN_LICENSE};
use crate::license::errors::LicenseError;

/// Directory holding installed packages.
pub const NODE_MODULES: &str = "node_modules";

/// Marker appended to licenses guessed from file text.
pub const GUESS_MARKER: char = '*';

static LICENSE_FILE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(licen[cs]e|copying)([.\-_].*)?$").expect("static license file pattern")
});

static GITHUB_SHORTHAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w.\-]+/[\w.\-]+$").expect("static repository pattern")
});

/// License metadata read from one installed package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedPackage {
    /// Package identity
    pub key: PackageKey,

    /// Install directory
    pub dir: PathBuf,

    /// Detected license: declared, guessed (`*` suffix) or `UNKNOWN`
    pub license: String,

    /// Normalized repository URL, if declared
    pub repository: Option<String>,

    /// License file found in the package root
    pub license_file: Option<PathBuf>,

    /// Contents of the license file
    pub license_text: Option<String>,
}

impl ScannedPackage {
    /// Repository URL, falling back to the package's registry page.
    pub fn repository_url(&self) -> String {
        self.repository.clone().unwrap_or_else(|| {
            format!(
                "https://www.npmjs.com/package/{}/v/{}",
                self.key.name(),
                self.key.version()
            )
        })
    }

    /// Where the license text can be read: the license file, else the repository.
    pub fn source_url(&self) -> String {
        match self.license_file {
            Some(ref path) => Url::from_file_path(path)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| path.display().to_string()),
            None => self.repository_url(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Request {
    from: PathBuf,
    name: String,
    optional: bool,
}

/// Scanner over a project's installed dependency tree.
#[derive(Debug, Clone)]
pub struct DependencyScanner {
    root: PathBuf,
    include_dev: bool,
}

impl DependencyScanner {
    /// Create a scanner rooted at the project directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DependencyScanner {
            root: root.into(),
            include_dev: false,
        }
    }

    /// Also follow the project's development dependencies.
    pub fn include_dev(mut self, include_dev: bool) -> Self {
        self.include_dev = include_dev;
        self
    }

    /// Get the project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scan every package reachable from the project descriptor.
    ///
    /// Each `name@version` appears once in the result, ordered by key.
    pub fn scan(&self, descriptor: &PackageDescriptor) -> Result<Vec<ScannedPackage>, LicenseError> {
        let project = descriptor.name().unwrap_or("<project>");
        let mut wave = self.requests_for(project, &self.root, descriptor, self.include_dev)?;
        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut found: BTreeMap<PackageKey, ScannedPackage> = BTreeMap::new();

        while !wave.is_empty() {
            wave.sort();

            let mut dirs = Vec::new();
            for request in wave.drain(..) {
                match self.locate(&request.from, &request.name) {
                    Some(dir) => {
                        if visited.insert(dir.clone()) {
                            dirs.push((request.name, dir));
                        }
                    }
                    None if request.optional => {
                        tracing::debug!(
                            "skipping optional dependency `{}`: not installed",
                            request.name
                        );
                    }
                    None => {
                        return Err(LicenseError::scan_failure(
                            &request.name,
                            request.from.join(NODE_MODULES).join(&request.name),
                            "dependency is not installed",
                        ));
                    }
                }
            }

            let read = dirs
                .par_iter()
                .map(|(name, dir)| self.read_package(name, dir))
                .collect::<Result<Vec<_>, _>>()?;

            for (package, children) in read {
                wave.extend(children);
                found.entry(package.key.clone()).or_insert(package);
            }
        }

        tracing::debug!("scanned {} packages under {}", found.len(), self.root.display());
        Ok(found.into_values().collect())
    }

    /// Resolve `name` as required from `from`, walking up to the project root.
    fn locate(&self, from: &Path, name: &str) -> Option<PathBuf> {
        let mut current = from;
        loop {
            let candidate = current.join(NODE_MODULES).join(name);
            if candidate.join("package.json").is_file() {
                return Some(candidate);
            }
            if current == self.root {
                return None;
            }
            current = current.parent().filter(|p| p.starts_with(&self.root))?;
        }
    }

    fn requests_for(
        &self,
        package: &str,
        dir: &Path,
        descriptor: &PackageDescriptor,
        include_dev: bool,
    ) -> Result<Vec<Request>, LicenseError> {
        let manifest_path = dir.join("package.json");
        let invalid = |e: anyhow::Error| {
            LicenseError::scan_failure(package, &manifest_path, format!("{:#}", e))
        };

        let optional = descriptor.optional_dependencies().map_err(invalid)?;
        let mut required: BTreeSet<String> = descriptor
            .dependencies()
            .map_err(invalid)?
            .iter()
            .map(|(name, _)| name.to_string())
            .collect();
        if include_dev {
            required.extend(
                descriptor
                    .dev_dependencies()
                    .map_err(invalid)?
                    .iter()
                    .map(|(name, _)| name.to_string()),
            );
        }

        let mut requests: Vec<Request> = required
            .into_iter()
            .filter(|name| !optional.contains(name))
            .map(|name| Request {
                from: dir.to_path_buf(),
                name,
                optional: false,
            })
            .collect();
        requests.extend(optional.iter().map(|(name, _)| Request {
            from: dir.to_path_buf(),
            name: name.to_string(),
            optional: true,
        }));
        Ok(requests)
    }

    fn read_package(
        &self,
        requested: &str,
        dir: &Path,
    ) -> Result<(ScannedPackage, Vec<Request>), LicenseError> {
        let manifest_path = dir.join("package.json");
        let content = std::fs::read_to_string(&manifest_path)
            .map_err(|e| LicenseError::scan_failure(requested, &manifest_path, e.to_string()))?;
        let descriptor = PackageDescriptor::parse(&content).map_err(|e| {
            LicenseError::scan_failure(requested, &manifest_path, format!("{:#}", e))
        })?;

        let name = descriptor.name().unwrap_or(requested);
        let version = descriptor
            .version()
            .ok_or_else(|| LicenseError::scan_failure(name, &manifest_path, "missing `version`"))?;
        let key = PackageKey::from_parts(name, version)
            .map_err(|e| LicenseError::scan_failure(name, &manifest_path, e.to_string()))?;

        let license_file = find_license_file(dir);
        let license_text = match license_file {
            // Non-UTF-8 license texts are common; keep them lossily.
            Some(ref path) => {
                let bytes = std::fs::read(path).map_err(|e| {
                    LicenseError::scan_failure(
                        name,
                        path,
                        format!("failed to read license file: {}", e),
                    )
                })?;
                Some(String::from_utf8_lossy(&bytes).into_owned())
            }
            None => None,
        };

        let license = declared_license(&descriptor)
            .or_else(|| {
                license_text
                    .as_deref()
                    .and_then(sniff_license_text)
                    .map(|id| format!("{}{}", id, GUESS_MARKER))
            })
            .unwrap_or_else(|| UNKNOWN_LICENSE.to_string());

        let repository = descriptor.field("repository").and_then(repository_url);

        tracing::debug!("{}: {}", key, license);

        let children = self.requests_for(name, dir, &descriptor, false)?;
        let package = ScannedPackage {
            key,
            dir: dir.to_path_buf(),
            license,
            repository,
            license_file,
            license_text,
        };
        Ok((package, children))
    }
}

/// Read the license a package declares in its descriptor.
///
/// Supports the `license` string, the `license: {type}` object and the
/// legacy `licenses` array (alternatives joined with `OR`).
pub fn declared_license(descriptor: &PackageDescriptor) -> Option<String> {
    let single = match descriptor.field("license") {
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(Value::Object(obj)) => obj
            .get("type")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string()),
        _ => None,
    };
    if let Some(license) = single.filter(|s| !s.is_empty()) {
        return Some(license);
    }

    let legacy: Vec<&str> = descriptor
        .field("licenses")
        .and_then(Value::as_array)?
        .iter()
        .filter_map(|l| l.get("type").and_then(Value::as_str).or_else(|| l.as_str()))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    match legacy.as_slice() {
        [] => None,
        [one] => Some(one.to_string()),
        many => Some(format!("({})", many.join(" OR "))),
    }
}

/// Extract a normalized repository URL from a descriptor's `repository` field.
pub fn repository_url(value: &Value) -> Option<String> {
    let raw = match value {
        Value::String(s) => s.as_str(),
        Value::Object(obj) => obj.get("url")?.as_str()?,
        _ => return None,
    };
    normalize_repository(raw)
}

/// Normalize the many ways npm packages spell their repository into an
/// `https://` URL.
pub fn normalize_repository(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let raw = raw.strip_prefix("git+").unwrap_or(raw);

    let hosts = [
        ("github:", "https://github.com/"),
        ("gitlab:", "https://gitlab.com/"),
        ("bitbucket:", "https://bitbucket.org/"),
    ];

    let mut url = if let Some((prefix, base)) = hosts.iter().find(|(p, _)| raw.starts_with(*p)) {
        format!("{}{}", base, &raw[prefix.len()..])
    } else if let Some(rest) = raw.strip_prefix("git://") {
        format!("https://{}", rest)
    } else if let Some(rest) = raw.strip_prefix("ssh://git@") {
        format!("https://{}", rest)
    } else if let Some(rest) = raw.strip_prefix("git@") {
        format!("https://{}", rest.replacen(':', "/", 1))
    } else if GITHUB_SHORTHAND.is_match(raw) {
        format!("https://github.com/{}", raw)
    } else {
        raw.to_string()
    };

    if let Some(stripped) = url.strip_suffix(".git") {
        url = stripped.to_string();
    }
    while url.ends_with('/') {
        url.pop();
    }

    Url::parse(&url).ok().map(|_| url)
}

/// Find the license file in a package directory.
fn find_license_file(dir: &Path) -> Option<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .find(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| LICENSE_FILE_NAME.is_match(name))
        })
        .map(|entry| entry.into_path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::NodeProjectBuilder;

    fn names(packages: &[ScannedPackage]) -> Vec<String> {
        packages.iter().map(|p| p.key.to_string()).collect()
    }

    #[test]
    fn test_scan_transitive_hoisted() {
        let project = NodeProjectBuilder::new("app", "1.0.0")
            .dependency("a", "^1.0.0")
            .package("a", "1.0.0", "MIT", &[("b", "^2.0.0")])
            .package("b", "2.0.0", "ISC", &[])
            .package("unrelated", "9.9.9", "GPL-3.0", &[])
            .build();

        let scanner = DependencyScanner::new(project.root());
        let packages = scanner.scan(&project.descriptor()).unwrap();

        assert_eq!(names(&packages), vec!["a@1.0.0", "b@2.0.0"]);
        assert_eq!(packages[1].license, "ISC");
    }

    #[test]
    fn test_nested_install_shadows_hoisted() {
        let project = NodeProjectBuilder::new("app", "1.0.0")
            .dependency("a", "^1.0.0")
            .dependency("b", "^2.0.0")
            .package("a", "1.0.0", "MIT", &[("b", "^1.0.0")])
            .package("b", "2.0.0", "MIT", &[])
            .nested_package("a", "b", "1.0.0", "BSD-3-Clause", &[])
            .build();

        let packages = DependencyScanner::new(project.root())
            .scan(&project.descriptor())
            .unwrap();

        assert_eq!(names(&packages), vec!["a@1.0.0", "b@1.0.0", "b@2.0.0"]);
    }

    #[test]
    fn test_cycles_terminate() {
        let project = NodeProjectBuilder::new("app", "1.0.0")
            .dependency("a", "*")
            .package("a", "1.0.0", "MIT", &[("b", "*")])
            .package("b", "1.0.0", "MIT", &[("a", "*")])
            .build();

        let packages = DependencyScanner::new(project.root())
            .scan(&project.descriptor())
            .unwrap();
        assert_eq!(packages.len(), 2);
    }

    #[test]
    fn test_missing_required_dependency_fails() {
        let project = NodeProjectBuilder::new("app", "1.0.0")
            .dependency("ghost", "^1.0.0")
            .build();

        let err = DependencyScanner::new(project.root())
            .scan(&project.descriptor())
            .unwrap_err();
        assert!(matches!(err, LicenseError::ScanFailure { ref package, .. } if package == "ghost"));
    }

    #[test]
    fn test_missing_optional_dependency_is_skipped() {
        let project = NodeProjectBuilder::new("app", "1.0.0")
            .optional_dependency("fsevents", "^2.0.0")
            .build();

        let packages = DependencyScanner::new(project.root())
            .scan(&project.descriptor())
            .unwrap();
        assert!(packages.is_empty());
    }

    #[test]
    fn test_dev_dependencies_only_when_requested() {
        let project = NodeProjectBuilder::new("app", "1.0.0")
            .dev_dependency("jest", "^29.0.0")
            .package("jest", "29.0.0", "MIT", &[])
            .build();

        let without = DependencyScanner::new(project.root())
            .scan(&project.descriptor())
            .unwrap();
        assert!(without.is_empty());

        let with = DependencyScanner::new(project.root())
            .include_dev(true)
            .scan(&project.descriptor())
            .unwrap();
        assert_eq!(names(&with), vec!["jest@29.0.0"]);
    }

    #[test]
    fn test_invalid_package_json_fails() {
        let project = NodeProjectBuilder::new("app", "1.0.0")
            .dependency("broken", "*")
            .raw_package("broken", "{ not json")
            .build();

        let err = DependencyScanner::new(project.root())
            .scan(&project.descriptor())
            .unwrap_err();
        assert!(matches!(err, LicenseError::ScanFailure { .. }));
    }

    #[test]
    fn test_license_guessed_from_file() {
        let project = NodeProjectBuilder::new("app", "1.0.0")
            .dependency("quiet", "*")
            .raw_package("quiet", r#"{"name": "quiet", "version": "0.2.0"}"#)
            .file(
                "node_modules/quiet/LICENSE.md",
                "Permission is hereby granted, free of charge, to any person",
            )
            .build();

        let packages = DependencyScanner::new(project.root())
            .scan(&project.descriptor())
            .unwrap();
        assert_eq!(packages[0].license, "MIT*");
        assert!(packages[0].license_text.is_some());
        assert!(packages[0].source_url().starts_with("file://"));
    }

    #[test]
    fn test_non_utf8_license_file() {
        let project = NodeProjectBuilder::new("app", "1.0.0")
            .dependency("a", "^1.0.0")
            .package("a", "1.0.0", "MIT", &[])
            .build();
        std::fs::write(
            project.root().join("node_modules/a/LICENSE"),
            b"Copyright (c) Fran\xe7ois Dupont\n",
        )
        .unwrap();

        let packages = DependencyScanner::new(project.root())
            .scan(&project.descriptor())
            .unwrap();

        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].license, "MIT");
        let text = packages[0].license_text.as_deref().unwrap();
        assert!(text.starts_with("Copyright (c) Fran"));
        assert!(text.contains('\u{FFFD}'));
    }

    #[test]
    fn test_unknown_license() {
        let project = NodeProjectBuilder::new("app", "1.0.0")
            .dependency("quiet", "*")
            .raw_package("quiet", r#"{"name": "quiet", "version": "0.2.0"}"#)
            .build();

        let packages = DependencyScanner::new(project.root())
            .scan(&project.descriptor())
            .unwrap();
        assert_eq!(packages[0].license, UNKNOWN_LICENSE);
        assert_eq!(
            packages[0].source_url(),
            "https://www.npmjs.com/package/quiet/v/0.2.0"
        );
    }

    #[test]
    fn test_declared_license_forms() {
        let parse = |s: &str| declared_license(&PackageDescriptor::parse(s).unwrap());

        assert_eq!(parse(r#"{"license": "MIT"}"#), Some("MIT".to_string()));
        assert_eq!(
            parse(r#"{"license": {"type": "ISC", "url": "x"}}"#),
            Some("ISC".to_string())
        );
        assert_eq!(
            parse(r#"{"licenses": [{"type": "MIT"}, {"type": "Apache-2.0"}]}"#),
            Some("(MIT OR Apache-2.0)".to_string())
        );
        assert_eq!(parse(r#"{"license": ""}"#), None);
        assert_eq!(parse(r#"{}"#), None);
    }

    #[test]
    fn test_normalize_repository() {
        assert_eq!(
            normalize_repository("git+https://github.com/expressjs/express.git").as_deref(),
            Some("https://github.com/expressjs/express")
        );
        assert_eq!(
            normalize_repository("github:lodash/lodash").as_deref(),
            Some("https://github.com/lodash/lodash")
        );
        assert_eq!(
            normalize_repository("sindresorhus/ms").as_deref(),
            Some("https://github.com/sindresorhus/ms")
        );
        assert_eq!(
            normalize_repository("git@github.com:owner/repo.git").as_deref(),
            Some("https://github.com/owner/repo")
        );
        assert_eq!(
            normalize_repository("git://github.com/owner/repo").as_deref(),
            Some("https://github.com/owner/repo")
        );
        assert_eq!(normalize_repository("not a url"), None);
        assert_eq!(normalize_repository(""), None);
    }

    #[test]
    fn test_repository_object_form() {
        let value = serde_json::json!({"type": "git", "url": "https://gitlab.com/group/proj.git"});
        assert_eq!(
            repository_url(&value).as_deref(),
            Some("https://gitlab.com/group/proj")
        );
    }
}
