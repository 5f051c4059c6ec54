use thiserror::Error;

/// Terminal failure kinds of a setup run.
///
/// Every variant aborts the run. The stage that failed is kept as the
/// variant and the underlying cause as its `source`.
#[derive(Error, Debug)]
pub enum SetupError {
    /// The host (os, arch) pair is not in the platform table.
    #[error("{os} with architecture {arch} is not supported yet")]
    UnsupportedPlatform {
        os: String,
        arch: String,
    },

    /// Network failure, malformed index or no installable candidate.
    #[error("Failed to resolve version '{requested}' of {tool}")]
    VersionResolution {
        tool: String,
        requested: String,
        #[source]
        source: anyhow::Error,
    },

    /// Download, extraction, permission or cache-store failure.
    #[error("Failed to acquire {tool} {version} for {platform}")]
    Acquisition {
        tool: String,
        version: String,
        platform: String,
        #[source]
        source: anyhow::Error,
    },

    /// The installed binary did not answer the version query.
    #[error("Installed {tool} {version} failed verification")]
    Verification {
        tool: String,
        version: String,
        #[source]
        source: anyhow::Error,
    },
}

impl SetupError {
    pub fn unsupported_platform(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self::UnsupportedPlatform {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Short stable name of the failure kind, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedPlatform { .. } => "unsupported-platform",
            Self::VersionResolution { .. } => "version-resolution-failed",
            Self::Acquisition { .. } => "acquisition-failed",
            Self::Verification { .. } => "verification-failed",
        }
    }
}
