//! Registering the installed tool on the search path and smoke-testing it.

use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use anyhow::{bail, Context, Result};
use tracing::{debug, info};

/// Executable search path of the current run.
pub trait SearchPath {
    /// Puts `dir` in front of the search path.
    fn register(&mut self, dir: &Path) -> Result<()>;

    /// The effective search path, suitable for a child's `PATH`.
    fn value(&self) -> Result<OsString>;
}

/// Search path seeded from the process `PATH`.
///
/// The process environment is never modified; children get [`SearchPath::value`]
/// instead. When a `GITHUB_PATH` file is set, registered directories are
/// appended to it so later workflow steps see them too.
#[derive(Debug, Clone, Default)]
pub struct ProcessSearchPath {
    entries: Vec<PathBuf>,
    github_path: Option<PathBuf>,
}

impl ProcessSearchPath {
    pub fn new(path: Option<OsString>, github_path: Option<PathBuf>) -> Self {
        let entries = path
            .map(|p| std::env::split_paths(&p).collect())
            .unwrap_or_default();
        Self { entries, github_path }
    }

    /// Seeded from the `PATH` of this process.
    pub fn from_env(github_path: Option<PathBuf>) -> Self {
        Self::new(std::env::var_os("PATH"), github_path)
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }
}

impl SearchPath for ProcessSearchPath {
    fn register(&mut self, dir: &Path) -> Result<()> {
        if let Some(github_path) = &self.github_path {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(github_path)
                .with_context(|| format!("Could not open {:?}", github_path))?;
            writeln!(file, "{}", dir.display())
                .with_context(|| format!("Could not write {:?}", github_path))?;
            debug!(file = %github_path.display(), "registered directory for later steps");
        }
        self.entries.insert(0, dir.to_path_buf());
        Ok(())
    }

    fn value(&self) -> Result<OsString> {
        std::env::join_paths(&self.entries).context("Search path contains an invalid entry")
    }
}

/// Runs the installed binary as a smoke test.
pub trait Verifier {
    fn verify(&self, binary: &Path, search_path: &OsString) -> Result<()>;
}

/// Spawns `<binary> --version` with inherited stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessVerifier;

impl Verifier for ProcessVerifier {
    fn verify(&self, binary: &Path, search_path: &OsString) -> Result<()> {
        let status = Command::new(binary)
            .arg("--version")
            .env("PATH", search_path)
            .status()
            .with_context(|| format!("Could not run {}", binary.display()))?;
        if !status.success() {
            bail!("{} --version exited with {}", binary.display(), status);
        }
        Ok(())
    }
}

/// Adds `path` to the search path, then checks that `<path>/<tool_name>` runs.
///
/// # Errors
///
/// Returns an error if the directory cannot be registered, or if the binary
/// cannot be spawned or exits unsuccessfully.
pub fn finalize(
    search_path: &mut dyn SearchPath,
    verifier: &dyn Verifier,
    path: &Path,
    tool_name: &str,
    version: &str,
) -> Result<()> {
    info!("Adding the tool to PATH");
    search_path.register(path)?;

    info!("Checking installed version");
    let value = search_path.value()?;
    verifier.verify(&path.join(tool_name), &value)?;

    info!("{} v{} has been set up successfully", tool_name, version);
    Ok(())
}
