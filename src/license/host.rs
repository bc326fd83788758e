//! The host project's own entry in the license summary.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use url::Url;

use crate::core::{PackageDescriptor, PackageKey};
use crate::license::errors::LicenseError;
use crate::license::scan::{declared_license, repository_url};
use crate::license::summary::LicenseRecord;
use crate::util::config::HostConfig;

/// Resolved identity and license details of the project being bundled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostProject {
    /// `name@version` of the release
    pub key: PackageKey,

    /// License identifier of the project
    pub license: String,

    /// Repository URL of the project
    pub repository: String,

    /// URL of the license text for this release
    pub source: String,

    /// Root license file, read when the summary is produced
    pub license_file: PathBuf,
}

impl HostProject {
    /// Resolve the host entry from `[host]`, falling back to package.json.
    pub fn resolve(config: &HostConfig, descriptor: &PackageDescriptor, root: &Path) -> Result<Self> {
        let name = config
            .name
            .as_deref()
            .or(descriptor.name())
            .context("host project has no name; set `name` under [host] or in package.json")?;
        let version = config
            .version
            .as_deref()
            .or(descriptor.version())
            .context("host project has no version; set `version` under [host] or in package.json")?;
        let key = PackageKey::from_parts(name, version)
            .with_context(|| format!("invalid host project identity `{}@{}`", name, version))?;

        let license = config
            .license
            .clone()
            .or_else(|| declared_license(descriptor))
            .context("host project has no license; set `license` under [host] or in package.json")?;

        let repository = config
            .repository
            .clone()
            .or_else(|| descriptor.field("repository").and_then(repository_url))
            .context(
                "host project has no repository; set `repository` under [host] or in package.json",
            )?;

        let source = render_source(&config.source_template, &key, &repository)?;

        Ok(HostProject {
            key,
            license,
            repository: repository.trim_end_matches('/').to_string(),
            source,
            license_file: root.join(&config.license_file),
        })
    }

    /// Build the summary record, reading the license file now.
    pub fn to_record(&self) -> Result<LicenseRecord, LicenseError> {
        let text = std::fs::read_to_string(&self.license_file).map_err(|source| {
            LicenseError::Io {
                path: self.license_file.clone(),
                source,
            }
        })?;

        Ok(LicenseRecord {
            repository: self.repository.clone(),
            license: self.license.clone(),
            source: self.source.clone(),
            source_text: Some(text),
        })
    }
}

/// Substitute `{repository}`, `{name}` and `{version}` into a source template.
pub fn render_source(template: &str, key: &PackageKey, repository: &str) -> Result<String> {
    let rendered = template
        .replace("{repository}", repository.trim_end_matches('/'))
        .replace("{name}", key.name())
        .replace("{version}", &key.version().to_string());

    Url::parse(&rendered)
        .with_context(|| format!("license source template renders to an invalid URL: {}", rendered))?;
    Ok(rendered)
}
