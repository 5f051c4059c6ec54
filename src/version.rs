//! Version requests and their resolution to concrete release versions.
//!
//! A request is either the symbolic `latest` (case-insensitive) or an explicit
//! version with an optional leading `v`. `latest` is resolved against the
//! remote [`ReleaseIndex`]: enterprise builds and non-semver keys are dropped
//! and the highest remaining version by semver precedence wins.

use std::fmt;
use anyhow::{anyhow, bail, Context, Result};
use semver::Version;
use tracing::{debug, info};
use crate::registry::{ReleaseIndex, ReleaseSource};

/// Substring marking enterprise builds in index keys (e.g. `1.6.0+ent`).
pub const ENTERPRISE_MARKER: &str = "+ent";

/// What the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VersionRequest {
    #[default]
    Latest,
    Explicit(String),
}

impl VersionRequest {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("latest") {
            VersionRequest::Latest
        } else {
            VersionRequest::Explicit(raw.to_string())
        }
    }
}

impl fmt::Display for VersionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionRequest::Latest => f.write_str("latest"),
            VersionRequest::Explicit(v) => f.write_str(v),
        }
    }
}

/// How strictly explicit versions are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Validation {
    /// Explicit versions are only stripped, so vendor tags pass through.
    #[default]
    Lenient,
    /// Explicit versions must be valid semver.
    Strict,
}

/// A concrete version without a leading `v`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedVersion(String);

impl ResolvedVersion {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parsed semver, if the version is well-formed.
    pub fn semver(&self) -> Option<Version> {
        Version::parse(&self.0).ok()
    }
}

impl fmt::Display for ResolvedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strips a single leading `v` and, under [`Validation::Strict`], checks semver syntax.
///
/// Both the explicit and the `latest` path go through this function.
///
/// # Errors
///
/// Returns an error for an empty version, or for a non-semver version when strict.
pub fn normalize_version(raw: &str, validation: Validation) -> Result<ResolvedVersion> {
    let stripped = raw.trim().strip_prefix('v').unwrap_or(raw.trim());
    if stripped.is_empty() {
        bail!("Empty version");
    }
    if validation == Validation::Strict {
        Version::parse(stripped)
            .with_context(|| format!("Invalid version: {}", raw))?;
    }
    Ok(ResolvedVersion(stripped.to_string()))
}

/// Whether an index key is an installable candidate for `latest`.
pub fn is_candidate(key: &str) -> bool {
    !key.contains(ENTERPRISE_MARKER) && normalize_version(key, Validation::Strict).is_ok()
}

/// Installable versions of an index, newest first.
pub fn sorted_candidates(index: &ReleaseIndex) -> Vec<(Version, ResolvedVersion)> {
    let mut candidates: Vec<_> = index
        .version_keys()
        .filter(|key| is_candidate(key))
        .filter_map(|key| normalize_version(key, Validation::Strict).ok())
        .filter_map(|v| v.semver().map(|semver| (semver, v)))
        .collect();
    candidates.sort_by(|(a, _), (b, _)| b.cmp(a));
    candidates
}

/// Picks the highest installable version of an index.
///
/// # Errors
///
/// Returns an error if no key survives the enterprise and semver filters.
pub fn select_latest(index: &ReleaseIndex) -> Result<ResolvedVersion> {
    sorted_candidates(index)
        .into_iter()
        .next()
        .map(|(_, version)| version)
        .ok_or_else(|| anyhow!("No installable version found in the release index"))
}

/// Resolves a version request for `tool_name`.
///
/// Explicit requests never touch the network. `latest` fetches the index
/// through `source`.
///
/// # Errors
///
/// Returns an error if the index cannot be fetched or parsed, if it has no
/// installable version, or if the explicit version is rejected by
/// [`normalize_version`].
pub fn resolve_version(
    source: &dyn ReleaseSource,
    tool_name: &str,
    request: &VersionRequest,
    validation: Validation,
) -> Result<ResolvedVersion> {
    match request {
        VersionRequest::Latest => {
            info!("Fetching latest version");
            let index = source.fetch_index(tool_name)?;
            let latest = select_latest(&index)?;
            debug!(version = %latest, candidates = index.versions.len(), "selected latest version");
            Ok(latest)
        }
        VersionRequest::Explicit(raw) => normalize_version(raw, validation),
    }
}
