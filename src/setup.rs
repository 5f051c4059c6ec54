//! The end-to-end setup run.
//!
//! Stages run strictly in order, each returning early on failure:
//! platform -> version -> cache lookup -> (acquire on miss) -> finalize.

use std::path::PathBuf;
use tracing::info;
use crate::error::SetupError;
use crate::finalize::{finalize, SearchPath, Verifier};
use crate::global::cache::ToolCache;
use crate::installer::acquire;
use crate::platform::{resolve_platform, PlatformId, PlatformKey};
use crate::registry::ReleaseSource;
use crate::version::{resolve_version, ResolvedVersion, Validation, VersionRequest};

/// What to install.
#[derive(Debug, Clone)]
pub struct SetupRequest {
    pub tool_name: String,
    pub version: VersionRequest,
    pub platform: PlatformKey,
    pub validation: Validation,
    /// Parent directory for transient download and extraction files.
    pub temp_root: PathBuf,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installed {
    pub tool_name: String,
    pub version: ResolvedVersion,
    pub platform: PlatformId,
    pub path: PathBuf,
    pub from_cache: bool,
}

/// Collaborators of a setup run.
pub struct Setup<'a> {
    pub source: &'a dyn ReleaseSource,
    pub cache: &'a dyn ToolCache,
    pub search_path: &'a mut dyn SearchPath,
    pub verifier: &'a dyn Verifier,
}

impl Setup<'_> {
    /// Runs the whole pipeline for `request`.
    ///
    /// # Errors
    ///
    /// Returns the [`SetupError`] of the first stage that fails. Nothing
    /// runs after a failed stage.
    pub fn run(&mut self, request: &SetupRequest) -> Result<Installed, SetupError> {
        let tool = request.tool_name.as_str();
        let platform = resolve_platform(&request.platform.os, &request.platform.arch)?;

        let version = resolve_requested_version(self.source, tool, &request.version, request.validation)?;

        let (path, from_cache) = match self.cache.find(tool, version.as_str(), platform.as_str()) {
            Some(path) => {
                info!("Using cached {} version {}", tool, version);
                (path, true)
            }
            None => {
                let path = acquire(self.source, self.cache, tool, &version, &platform, &request.temp_root)
                    .map_err(|source| SetupError::Acquisition {
                        tool: tool.to_string(),
                        version: version.to_string(),
                        platform: platform.to_string(),
                        source,
                    })?;
                (path, false)
            }
        };

        finalize(&mut *self.search_path, self.verifier, &path, tool, version.as_str())
            .map_err(|source| SetupError::Verification {
                tool: tool.to_string(),
                version: version.to_string(),
                source,
            })?;

        Ok(Installed {
            tool_name: tool.to_string(),
            version,
            platform,
            path,
            from_cache,
        })
    }
}

/// Version resolution stage, with failures reported as [`SetupError::VersionResolution`].
pub fn resolve_requested_version(
    source: &dyn ReleaseSource,
    tool: &str,
    request: &VersionRequest,
    validation: Validation,
) -> Result<ResolvedVersion, SetupError> {
    resolve_version(source, tool, request, validation)
        .map_err(|source| SetupError::VersionResolution {
            tool: tool.to_string(),
            requested: request.to_string(),
            source,
        })
}
