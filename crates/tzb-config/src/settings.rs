//! Run settings file (`tzb.toml`).
//!
//! Every field is optional; the CLI fills gaps from its own arguments and
//! defaults, and explicit arguments win over the file.

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RunSettings {
    /// `timezones.json`
    pub zones: Option<PathBuf>,
    pub zones_1970: Option<PathBuf>,
    pub zones_now: Option<PathBuf>,
    /// `osmBoundarySources.json`
    pub sources: Option<PathBuf>,
    /// `expectedZoneOverlaps.json`
    pub expected_overlaps: Option<PathBuf>,
    pub downloads_dir: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
    pub dist_dir: Option<PathBuf>,
    pub previous_release: Option<PathBuf>,
    pub included_zones: Vec<String>,
    pub excluded_zones: Vec<String>,
    pub skip_validation: Option<bool>,
    pub skip_oceans: Option<bool>,
    pub no_cache: Option<bool>,
    pub threads: Option<usize>,
}

impl RunSettings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text, path)
    }

    pub fn parse(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let mut settings: RunSettings = toml::from_str(text).map_err(|source| ConfigError::ParseToml {
            path: origin.display().to_string(),
            source,
        })?;
        // Relative paths in the file are relative to the file itself.
        if let Some(base) = origin.parent()
            && !base.as_os_str().is_empty()
        {
            settings.rebase(base);
        }
        Ok(settings)
    }

    fn rebase(&mut self, base: &Path) {
        for path in [
            &mut self.zones,
            &mut self.zones_1970,
            &mut self.zones_now,
            &mut self.sources,
            &mut self.expected_overlaps,
            &mut self.downloads_dir,
            &mut self.working_dir,
            &mut self.dist_dir,
            &mut self.previous_release,
        ]
        .into_iter()
        .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}
