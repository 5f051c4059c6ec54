use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{bail, Context, Result};
use tracing::debug;
use crate::global::utils::get_default_tool_cache_dir;
use crate::util::copy_dir_all;

/// Store of installed tool directories keyed by (name, version, platform).
pub trait ToolCache {
    /// Returns the cached directory for the key, if a complete entry exists.
    fn find(&self, name: &str, version: &str, platform: &str) -> Option<PathBuf>;

    /// Copies `source_dir` into the cache under the key and returns the stable path.
    fn store(&self, source_dir: &Path, name: &str, version: &str, platform: &str) -> Result<PathBuf>;
}

/// Tool cache on disk, laid out like the runner tool cache:
///
/// ```text
/// <root>/
/// └── terraform/
///     └── 1.6.0/
///         ├── linux_amd64/
///         │   └── terraform
///         └── linux_amd64.complete
/// ```
///
/// An entry only counts once its `.complete` marker exists.
#[derive(Debug, Clone)]
pub struct DirToolCache {
    root: PathBuf,
}

impl DirToolCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Cache rooted at the user cache directory.
    pub fn from_default_dir() -> Result<Self> {
        Ok(Self::new(get_default_tool_cache_dir()?))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_dir(&self, name: &str, version: &str, platform: &str) -> PathBuf {
        self.root.join(name).join(version).join(platform)
    }

    fn marker_path(&self, name: &str, version: &str, platform: &str) -> PathBuf {
        self.root
            .join(name)
            .join(version)
            .join(format!("{}.complete", platform))
    }
}

impl ToolCache for DirToolCache {
    fn find(&self, name: &str, version: &str, platform: &str) -> Option<PathBuf> {
        if name.is_empty() || version.is_empty() || platform.is_empty() {
            return None;
        }
        let dir = self.entry_dir(name, version, platform);
        let marker = self.marker_path(name, version, platform);
        if dir.is_dir() && marker.is_file() {
            debug!(path = %dir.display(), "tool cache hit");
            Some(dir)
        }
        else {
            debug!(path = %dir.display(), "tool cache miss");
            None
        }
    }

    /// Stages a copy next to the destination and renames it into place, so
    /// concurrent runs never observe a half-written entry. Last writer wins.
    fn store(&self, source_dir: &Path, name: &str, version: &str, platform: &str) -> Result<PathBuf> {
        if !source_dir.is_dir() {
            bail!("Source {:?} is not a directory", source_dir);
        }
        let dest = self.entry_dir(name, version, platform);
        let marker = self.marker_path(name, version, platform);
        let version_dir = self.root.join(name).join(version);
        fs::create_dir_all(&version_dir)
            .with_context(|| format!("Could not create cache dir {:?}", version_dir))?;

        let staging = tempfile::Builder::new()
            .prefix(&format!(".{}.", platform))
            .tempdir_in(&version_dir)
            .with_context(|| format!("Could not create staging dir in {:?}", version_dir))?;
        copy_dir_all(source_dir, staging.path())?;

        if marker.exists() {
            fs::remove_file(&marker)?;
        }
        if dest.exists() {
            fs::remove_dir_all(&dest)
                .with_context(|| format!("Could not replace cache entry {:?}", dest))?;
        }
        fs::rename(staging.path(), &dest)
            .with_context(|| format!("Could not move staged entry to {:?}", dest))?;
        // the staging path no longer exists; dropping it is a no-op
        drop(staging);

        fs::write(&marker, "")
            .with_context(|| format!("Could not write cache marker {:?}", marker))?;
        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn source_tree(dir: &Path) -> PathBuf {
        let source = dir.join("extracted");
        fs::create_dir_all(source.join("docs")).unwrap();
        fs::write(source.join("terraform"), "binary").unwrap();
        fs::write(source.join("docs").join("LICENSE"), "license").unwrap();
        source
    }

    #[test]
    fn test_find_on_empty_cache() {
        let dir = tempdir().unwrap();
        let cache = DirToolCache::new(dir.path().join("cache"));
        assert!(cache.find("terraform", "1.6.0", "linux_amd64").is_none());
    }

    #[test]
    fn test_store_then_find() {
        let dir = tempdir().unwrap();
        let source = source_tree(dir.path());
        let cache = DirToolCache::new(dir.path().join("cache"));

        let stored = cache.store(&source, "terraform", "1.6.0", "linux_amd64").unwrap();
        assert_eq!(stored, cache.entry_dir("terraform", "1.6.0", "linux_amd64"));
        assert_eq!(fs::read_to_string(stored.join("terraform")).unwrap(), "binary");
        assert_eq!(fs::read_to_string(stored.join("docs").join("LICENSE")).unwrap(), "license");

        assert_eq!(cache.find("terraform", "1.6.0", "linux_amd64"), Some(stored));
        assert!(cache.find("terraform", "1.6.0", "darwin_arm64").is_none());
        assert!(cache.find("terraform", "1.5.7", "linux_amd64").is_none());
    }

    #[test]
    fn test_find_requires_marker() {
        let dir = tempdir().unwrap();
        let cache = DirToolCache::new(dir.path());
        fs::create_dir_all(cache.entry_dir("terraform", "1.6.0", "linux_amd64")).unwrap();
        assert!(cache.find("terraform", "1.6.0", "linux_amd64").is_none());
    }

    #[test]
    fn test_find_rejects_empty_key() {
        let dir = tempdir().unwrap();
        let cache = DirToolCache::new(dir.path());
        assert!(cache.find("", "1.6.0", "linux_amd64").is_none());
        assert!(cache.find("terraform", "", "linux_amd64").is_none());
    }

    #[test]
    fn test_store_replaces_existing_entry() {
        let dir = tempdir().unwrap();
        let source = source_tree(dir.path());
        let cache = DirToolCache::new(dir.path().join("cache"));
        let first = cache.store(&source, "terraform", "1.6.0", "linux_amd64").unwrap();
        fs::write(first.join("stale"), "old").unwrap();

        fs::write(source.join("terraform"), "binary-v2").unwrap();
        let second = cache.store(&source, "terraform", "1.6.0", "linux_amd64").unwrap();

        assert_eq!(first, second);
        assert!(!second.join("stale").exists());
        assert_eq!(fs::read_to_string(second.join("terraform")).unwrap(), "binary-v2");

        let leftovers: Vec<_> = fs::read_dir(second.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .filter(|n| n.starts_with('.'))
            .collect();
        assert!(leftovers.is_empty(), "staging dirs left behind: {:?}", leftovers);
    }

    #[test]
    fn test_store_missing_source() {
        let dir = tempdir().unwrap();
        let cache = DirToolCache::new(dir.path().join("cache"));
        assert!(cache.store(&dir.path().join("nope"), "terraform", "1.6.0", "linux_amd64").is_err());
        assert!(cache.find("terraform", "1.6.0", "linux_amd64").is_none());
    }
}
