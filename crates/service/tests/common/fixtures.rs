//! Test fixtures for generating listing items.

use reposync_core::{Environment, Package, PackageGroup, Sha256Digest};

/// Deterministic package checksum for a seed.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub fn checksum(seed: &str) -> String {
    Sha256Digest::compute(seed.as_bytes()).to_hex()
}

/// A package whose checksum derives from its name.
#[allow(dead_code)]
pub fn package(name: &str) -> Package {
    Package {
        name: name.to_string(),
        arch: "x86_64".to_string(),
        version: "1.0".to_string(),
        release: "1.el9".to_string(),
        epoch: 0,
        checksum: checksum(name),
        summary: format!("The {name} package"),
    }
}

/// `count` distinct packages named `<prefix>-<n>`.
#[allow(dead_code)]
pub fn packages(prefix: &str, count: usize) -> Vec<Package> {
    (0..count)
        .map(|n| package(&format!("{prefix}-{n}")))
        .collect()
}

#[allow(dead_code)]
pub fn package_group(id: &str, name: &str, members: &[&str]) -> PackageGroup {
    PackageGroup {
        id: id.to_string(),
        name: name.to_string(),
        description: format!("{name} group"),
        package_list: members.iter().map(|m| m.to_string()).collect(),
    }
}

#[allow(dead_code)]
pub fn environment(id: &str, name: &str) -> Environment {
    Environment {
        id: id.to_string(),
        name: name.to_string(),
        description: format!("{name} environment"),
    }
}
