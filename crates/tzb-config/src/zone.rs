//! Zone identifiers and dataset variants.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A timezone identifier such as `America/New_York`.
///
/// Ordered lexicographically; this ordering is the iteration order of every
/// per-zone loop in a build.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(pub String);

impl ZoneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File stem for the per-zone output file (`/` becomes `__`).
    pub fn file_stem(&self) -> String {
        self.0.replace('/', "__")
    }

    /// Stem used in diagnostic artifact names (`/` becomes `-`).
    pub fn diagnostic_stem(&self) -> String {
        self.0.replace('/', "-")
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ZoneId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Which dataset a zone result belongs to.
///
/// Base zones are built first; the cutoff datasets may derive from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum ZoneVariant {
    #[default]
    #[serde(rename = "base")]
    Base,
    /// Zones merged where their clocks agree since 1970.
    #[serde(rename = "1970")]
    Cutoff1970,
    /// Zones merged where their clocks agree from now on.
    #[serde(rename = "now")]
    Present,
}

impl ZoneVariant {
    pub const ALL: [ZoneVariant; 3] = [ZoneVariant::Base, ZoneVariant::Cutoff1970, ZoneVariant::Present];

    pub fn as_str(self) -> &'static str {
        match self {
            ZoneVariant::Base => "base",
            ZoneVariant::Cutoff1970 => "1970",
            ZoneVariant::Present => "now",
        }
    }

    /// Sub-directory of the working directory holding this variant's
    /// per-zone files. Base files live directly in the working directory.
    pub fn subdirectory(self) -> Option<&'static str> {
        match self {
            ZoneVariant::Base => None,
            other => Some(other.as_str()),
        }
    }
}

impl fmt::Display for ZoneVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZoneVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "base" => Ok(ZoneVariant::Base),
            "1970" => Ok(ZoneVariant::Cutoff1970),
            "now" | "present" => Ok(ZoneVariant::Present),
            other => Err(format!("unknown zone variant `{other}` (expected base, 1970, or now)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stems_replace_path_separators() {
        let zone = ZoneId::new("America/Argentina/Buenos_Aires");
        assert_eq!(zone.file_stem(), "America__Argentina__Buenos_Aires");
        assert_eq!(zone.diagnostic_stem(), "America-Argentina-Buenos_Aires");
    }

    #[test]
    fn variants_parse_from_config_strings() {
        assert_eq!("1970".parse::<ZoneVariant>(), Ok(ZoneVariant::Cutoff1970));
        assert_eq!("now".parse::<ZoneVariant>(), Ok(ZoneVariant::Present));
        assert!("2038".parse::<ZoneVariant>().is_err());
        assert_eq!(ZoneVariant::Base.subdirectory(), None);
        assert_eq!(ZoneVariant::Present.subdirectory(), Some("now"));
    }
}
