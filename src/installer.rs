use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};
use crate::global::cache::ToolCache;
use crate::platform::PlatformId;
use crate::registry::ReleaseSource;
use crate::util::{extract_zip, make_executable};
use crate::version::ResolvedVersion;

/// Name of the release archive, e.g. `terraform_1.6.0_linux_amd64.zip`.
pub fn archive_file_name(tool_name: &str, version: &str, platform: &str) -> String {
    format!("{}_{}_{}.zip", tool_name, version, platform)
}

/// Download URL of a release archive under `base_url`.
pub fn download_url(base_url: &str, tool_name: &str, version: &str, platform: &str) -> String {
    format!(
        "{}/{}/{}/{}",
        base_url.trim_end_matches('/'),
        tool_name,
        version,
        archive_file_name(tool_name, version, platform)
    )
}

/// Downloads, extracts and caches a release, returning the cached directory.
///
/// The archive and its extracted tree live in a temporary directory under
/// `temp_root`, which is removed once the tree has been copied into `cache`
/// (and on every failure path).
///
/// # Arguments
///
/// * `source` – Where the archive is downloaded from.
/// * `cache` – Store receiving the extracted tree.
/// * `tool_name` – The tool, which must be at the root of the archive.
/// * `version` – Resolved version to fetch.
/// * `platform` – Platform of the archive.
/// * `temp_root` – Parent directory for transient files.
///
/// # Errors
///
/// Returns an error if the download, extraction, permission change or cache
/// store fails, or if the archive has no file named `tool_name` at its root.
pub fn acquire(
    source: &dyn ReleaseSource,
    cache: &dyn ToolCache,
    tool_name: &str,
    version: &ResolvedVersion,
    platform: &PlatformId,
    temp_root: &Path,
) -> Result<PathBuf> {
    let version = version.as_str();
    let platform = platform.as_str();
    let zip_name = archive_file_name(tool_name, version, platform);
    let url = download_url(source.base_url(), tool_name, version, platform);

    fs::create_dir_all(temp_root)
        .with_context(|| format!("Could not create temp dir {:?}", temp_root))?;
    let workspace = tempfile::Builder::new()
        .prefix("setup-tool-")
        .tempdir_in(temp_root)
        .with_context(|| format!("Could not create work dir in {:?}", temp_root))?;
    debug!(workspace = %workspace.path().display(), "created work dir");

    info!("Downloading {} version {} for {}", tool_name, version, platform);
    let archive_path = workspace.path().join(&zip_name);
    source.download(&url, &archive_path)?;

    info!("Extracting the downloaded archive");
    let extract_root = workspace.path().join("extracted");
    extract_zip(&archive_path, &extract_root)?;

    let binary = extract_root.join(tool_name);
    if !binary.is_file() {
        bail!("{} does not contain {} at its root", zip_name, tool_name);
    }

    info!("Making the tool executable");
    make_executable(&binary)?;

    info!("Caching the tool");
    let cached = cache.store(&extract_root, tool_name, version, platform)?;

    info!("Cleaning up residual files");
    let workspace_path = workspace.path().to_path_buf();
    if let Err(err) = workspace.close() {
        warn!("Could not remove {}: {}", workspace_path.display(), err);
    }
    Ok(cached)
}
