//! Crawled content listings and their natural keys.
//!
//! The crawler hands the sync engine a complete listing per repository and
//! content kind. Each item carries a natural key used for global deduplication:
//! the checksum for packages, the `(id, name)` pair for groups and environments.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three kinds of content indexed per repository.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentKind {
    Package,
    PackageGroup,
    Environment,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [Self::Package, Self::PackageGroup, Self::Environment];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Package => "package",
            Self::PackageGroup => "package_group",
            Self::Environment => "environment",
        }
    }

    /// Parse a kind from its config/CLI spelling. Accepts singular and plural forms.
    pub fn parse(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "package" | "packages" | "rpm" | "rpms" => Ok(Self::Package),
            "package_group" | "package_groups" => Ok(Self::PackageGroup),
            "environment" | "environments" => Ok(Self::Environment),
            other => Err(crate::Error::InvalidIdentifier(format!(
                "unknown content kind '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Business-meaning identifier of a content item.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NaturalKey {
    /// Package checksum.
    Checksum(String),
    /// Group or environment `(id, name)` pair.
    IdName { id: String, name: String },
}

impl NaturalKey {
    pub fn id_name(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::IdName {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checksum(checksum) => write!(f, "{checksum}"),
            Self::IdName { id, name } => write!(f, "{id}/{name}"),
        }
    }
}

/// A crawled item that can be deduplicated by natural key.
pub trait ContentItem: Send + Sync {
    const KIND: ContentKind;

    fn natural_key(&self) -> NaturalKey;
}

/// A binary package as parsed from `primary.xml`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub arch: String,
    pub version: String,
    #[serde(default)]
    pub release: String,
    #[serde(default)]
    pub epoch: i32,
    pub checksum: String,
    #[serde(default)]
    pub summary: String,
}

impl ContentItem for Package {
    const KIND: ContentKind = ContentKind::Package;

    fn natural_key(&self) -> NaturalKey {
        NaturalKey::Checksum(self.checksum.clone())
    }
}

/// A package group as parsed from `comps.xml`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "packagelist")]
    pub package_list: Vec<String>,
}

impl ContentItem for PackageGroup {
    const KIND: ContentKind = ContentKind::PackageGroup;

    fn natural_key(&self) -> NaturalKey {
        NaturalKey::id_name(&self.id, &self.name)
    }
}

/// An environment group as parsed from `comps.xml`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl ContentItem for Environment {
    const KIND: ContentKind = ContentKind::Environment;

    fn natural_key(&self) -> NaturalKey {
        NaturalKey::id_name(&self.id, &self.name)
    }
}
