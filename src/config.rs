use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use anyhow::{anyhow, bail, Context, Result};
use crate::global::cache::DirToolCache;
use crate::global::utils::get_global_config_dir;
use crate::platform::{host_arch, host_os, PlatformKey};
use crate::registry::DEFAULT_RELEASES_URL;
use crate::setup::SetupRequest;
use crate::util::validate_tool_name;
use crate::version::{Validation, VersionRequest};

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "setup-tool.toml";

/// Contents of a `setup-tool.toml` file.
///
/// Every key is optional; command-line flags and their environment
/// variables take precedence over it.
#[derive(Deserialize, Serialize, Debug, Default, PartialEq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigFile {
    /// Name of the tool to install (e.g. `"terraform"`).
    pub name: Option<String>,
    /// `"latest"` or an explicit version.
    pub version: Option<String>,
    /// Host serving release indexes and archives.
    pub releases_url: Option<String>,
    /// Root of the tool cache.
    pub cache_dir: Option<PathBuf>,
    /// Parent directory for transient files.
    pub temp_dir: Option<PathBuf>,
    /// Require explicit versions to be valid semver.
    pub strict_versions: Option<bool>,
}

impl ConfigFile {
    /// Loads a config file from a path.
    ///
    /// # Errors
    /// Returns an error if the file can't be read or deserialized.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<ConfigFile> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file {:?}", path))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid config file {:?}", path))
    }

    /// Saves the config in pretty TOML format.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Finds and loads the config file in effect.
    ///
    /// An explicit path must exist. Otherwise `setup-tool.toml` in `cwd` is
    /// used, then `config.toml` in the user config directory. No file at all
    /// yields the empty config.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<ConfigFile> {
        if let Some(path) = explicit {
            return ConfigFile::load(path);
        }
        let local = cwd.join(CONFIG_FILE_NAME);
        if local.is_file() {
            return ConfigFile::load(local);
        }
        if let Ok(global) = get_global_config_dir().map(|dir| dir.join("config.toml")) {
            if global.is_file() {
                return ConfigFile::load(global);
            }
        }
        Ok(ConfigFile::default())
    }
}

/// Values given on the command line or through the environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub name: Option<String>,
    pub version: Option<String>,
    pub os: Option<String>,
    pub arch: Option<String>,
    pub releases_url: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub temp_dir: Option<PathBuf>,
    pub github_path: Option<PathBuf>,
    pub strict_versions: bool,
}

/// Fully merged settings of one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub name: Option<String>,
    pub version: VersionRequest,
    pub platform: PlatformKey,
    pub releases_url: String,
    /// Explicit tool cache root; see [`Settings::tool_cache`].
    pub cache_dir: Option<PathBuf>,
    pub temp_dir: PathBuf,
    pub github_path: Option<PathBuf>,
    pub validation: Validation,
}

impl Settings {
    /// Merges overrides over the config file over defaults.
    ///
    /// Empty strings count as unset, since the runner exports unset inputs
    /// as empty variables.
    pub fn merge(overrides: Overrides, file: ConfigFile) -> Result<Settings> {
        let name = non_empty(overrides.name).or(non_empty(file.name));
        let version = non_empty(overrides.version)
            .or(non_empty(file.version))
            .map(|v| VersionRequest::parse(&v))
            .unwrap_or_default();
        let os = non_empty(overrides.os).unwrap_or_else(host_os);
        let arch = non_empty(overrides.arch).unwrap_or_else(host_arch);
        let releases_url = non_empty(overrides.releases_url)
            .or(non_empty(file.releases_url))
            .unwrap_or_else(|| DEFAULT_RELEASES_URL.to_string());
        let cache_dir = non_empty_path(overrides.cache_dir).or(non_empty_path(file.cache_dir));
        let temp_dir = non_empty_path(overrides.temp_dir)
            .or(non_empty_path(file.temp_dir))
            .unwrap_or_else(std::env::temp_dir);
        let strict = overrides.strict_versions || file.strict_versions.unwrap_or(false);

        if !releases_url.starts_with("http://") && !releases_url.starts_with("https://") {
            bail!("Invalid releases URL: {}", releases_url);
        }

        Ok(Settings {
            name,
            version,
            platform: PlatformKey::new(os, arch),
            releases_url,
            cache_dir,
            temp_dir,
            github_path: non_empty_path(overrides.github_path),
            validation: if strict { Validation::Strict } else { Validation::Lenient },
        })
    }

    /// The configured tool name.
    ///
    /// # Errors
    /// Returns an error if no name is configured or it is not usable in paths and URLs.
    pub fn tool_name(&self) -> Result<&str> {
        let name = self
            .name
            .as_deref()
            .ok_or_else(|| anyhow!("No tool name given. Use --name, INPUT_NAME or `name` in {}", CONFIG_FILE_NAME))?;
        validate_tool_name(name)?;
        Ok(name)
    }

    /// The tool cache, rooted at the configured directory or the user cache directory.
    pub fn tool_cache(&self) -> Result<DirToolCache> {
        match &self.cache_dir {
            Some(dir) => Ok(DirToolCache::new(dir)),
            None => DirToolCache::from_default_dir(),
        }
    }

    /// The setup request these settings describe.
    pub fn request(&self) -> Result<SetupRequest> {
        Ok(SetupRequest {
            tool_name: self.tool_name()?.to_string(),
            version: self.version.clone(),
            platform: self.platform.clone(),
            validation: self.validation,
            temp_root: self.temp_dir.clone(),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn non_empty_path(value: Option<PathBuf>) -> Option<PathBuf> {
    value.filter(|p| !p.as_os_str().is_empty())
}
