use std::path::PathBuf;
use anyhow::{anyhow, Result};
use directories::ProjectDirs;

pub fn get_global_cache_dir() -> Result<PathBuf> {
    let proj_dirs = get_project_dirs()?;
    Ok(proj_dirs.cache_dir().to_path_buf())
}

/// Default root of the tool cache when the runner does not provide one.
pub fn get_default_tool_cache_dir() -> Result<PathBuf> {
    Ok(get_global_cache_dir()?.join("tools"))
}

pub fn get_global_config_dir() -> Result<PathBuf> {
    let proj_dirs = get_project_dirs()?;
    Ok(proj_dirs.config_dir().to_path_buf())
}

fn get_project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("org", "setup-tool", "setup-tool")
        .ok_or_else(|| anyhow!("Could not get project directories"))
}
