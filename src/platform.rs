//! Host platform detection and mapping to release platform identifiers.
//!
//! Release archives are published per `{os}_{arch}` pair (e.g. `linux_amd64`).
//! The host reports its OS family and CPU architecture in the runner
//! convention (`linux`/`macos`, `x64`/`arm64`), which is mapped through a
//! static two-level table. Anything outside the table is fatal.

use std::fmt;
use crate::error::SetupError;

/// OS family -> (architecture -> platform id)
const PLATFORM_TABLE: &[(&str, &[(&str, &str)])] = &[
    ("macos", &[("x64", "darwin_amd64"), ("arm64", "darwin_arm64")]),
    ("linux", &[("x64", "linux_amd64"), ("arm64", "linux_arm64")]),
];

/// Host-reported (os family, architecture) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlatformKey {
    pub os: String,
    pub arch: String,
}

impl PlatformKey {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Reads the platform of the running host.
    pub fn host() -> Self {
        Self::new(host_os(), host_arch())
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

/// Platform identifier embedded in archive names, URLs and cache keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlatformId(String);

impl PlatformId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maps an OS family and architecture to a [`PlatformId`].
///
/// The OS family is lowercased before the lookup; the architecture is used
/// as-is.
///
/// # Errors
///
/// Returns [`SetupError::UnsupportedPlatform`] for any pair outside the table.
///
/// # Example
///
/// ```
/// use setup_tool::platform::resolve_platform;
///
/// let id = resolve_platform("Linux", "x64").unwrap();
/// assert_eq!(id.as_str(), "linux_amd64");
/// ```
pub fn resolve_platform(os_family: &str, arch: &str) -> Result<PlatformId, SetupError> {
    let os = os_family.to_lowercase();
    PLATFORM_TABLE
        .iter()
        .find(|(family, _)| *family == os)
        .and_then(|(_, arches)| arches.iter().find(|(a, _)| *a == arch))
        .map(|(_, id)| PlatformId(id.to_string()))
        .ok_or_else(|| SetupError::unsupported_platform(os, arch))
}

/// Every supported (os, arch, platform id) triple, in table order.
pub fn supported_platforms() -> impl Iterator<Item = (&'static str, &'static str, &'static str)> {
    PLATFORM_TABLE
        .iter()
        .flat_map(|(os, arches)| arches.iter().map(move |(arch, id)| (*os, *arch, *id)))
}

/// OS family of the running host, as the runner reports it.
pub fn host_os() -> String {
    std::env::consts::OS.to_string()
}

/// Architecture of the running host in the runner convention.
pub fn host_arch() -> String {
    match std::env::consts::ARCH {
        "x86_64" => "x64".to_string(),
        "aarch64" => "arm64".to_string(),
        "x86" => "ia32".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_supported_platforms() {
        assert_eq!(resolve_platform("macos", "x64").unwrap().as_str(), "darwin_amd64");
        assert_eq!(resolve_platform("macos", "arm64").unwrap().as_str(), "darwin_arm64");
        assert_eq!(resolve_platform("linux", "x64").unwrap().as_str(), "linux_amd64");
        assert_eq!(resolve_platform("linux", "arm64").unwrap().as_str(), "linux_arm64");
    }

    #[test]
    fn test_resolve_lowercases_os_only() {
        assert_eq!(resolve_platform("Linux", "x64").unwrap().as_str(), "linux_amd64");
        assert_eq!(resolve_platform("macOS", "arm64").unwrap().as_str(), "darwin_arm64");
        assert!(resolve_platform("linux", "X64").is_err());
    }

    #[test]
    fn test_resolve_unsupported() {
        for (os, arch) in [("windows", "x64"), ("linux", "ia32"), ("freebsd", "arm64"), ("", "")] {
            match resolve_platform(os, arch) {
                Err(SetupError::UnsupportedPlatform { os: got_os, arch: got_arch }) => {
                    assert_eq!(got_os, os.to_lowercase());
                    assert_eq!(got_arch, arch);
                }
                other => panic!("expected UnsupportedPlatform for {os}/{arch}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_resolve_is_deterministic() {
        for (os, arch, id) in supported_platforms() {
            for _ in 0..3 {
                assert_eq!(resolve_platform(os, arch).unwrap().as_str(), id);
            }
        }
        assert_eq!(supported_platforms().count(), 4);
    }

    #[test]
    fn test_host_platform_is_populated() {
        let key = PlatformKey::host();
        assert!(!key.os.is_empty());
        assert!(!key.arch.is_empty());
        assert_ne!(key.arch, "x86_64");
        assert_ne!(key.arch, "aarch64");
    }
}
