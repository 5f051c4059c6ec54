use std::path::PathBuf;
use clap::{Args, Parser, Subcommand};
use setup_tool::config::Overrides;

#[derive(Debug, Parser, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct CLI {
    #[command(subcommand)]
    pub(crate) command: Option<SetupCommand>,
    #[command(flatten)]
    pub(crate) tool: ToolArgs,
    /// Log debug details (RUST_LOG takes precedence)
    #[clap(short, long, global = true)]
    pub(crate) verbose: bool,
}

#[derive(Debug, Subcommand, Clone, PartialEq)]
pub enum SetupCommand {
    /// Resolve, download, cache and add the tool to PATH. The default
    Install,
    /// Print the version `--tool-version` resolves to
    Resolve,
    /// List installable versions, newest first
    Versions,
    /// Print the release platform id of this host
    Platform,
    /// Print the cached directory of the resolved version, if any
    Which,
}

#[derive(Debug, Args, Clone, Default)]
pub struct ToolArgs {
    /// Name of the tool, e.g. `terraform`
    #[clap(long, env = "INPUT_NAME", global = true)]
    pub(crate) name: Option<String>,
    /// `latest` or an explicit version (a leading `v` is ignored)
    #[clap(long = "tool-version", env = "INPUT_VERSION", global = true)]
    pub(crate) tool_version: Option<String>,
    /// Host OS family, e.g. `linux` or `macos`
    #[clap(long, env = "RUNNER_OS", global = true)]
    pub(crate) os: Option<String>,
    /// Host architecture, e.g. `x64` or `arm64`
    #[clap(long, global = true)]
    pub(crate) arch: Option<String>,
    /// Host serving `/<name>/index.json` and release archives
    #[clap(long, env = "SETUP_TOOL_RELEASES_URL", global = true)]
    pub(crate) releases_url: Option<String>,
    /// Root of the tool cache
    #[clap(long, env = "RUNNER_TOOL_CACHE", global = true)]
    pub(crate) cache_dir: Option<PathBuf>,
    /// Parent directory for downloads and extraction
    #[clap(long, env = "RUNNER_TEMP", global = true)]
    pub(crate) temp_dir: Option<PathBuf>,
    /// File that later workflow steps read PATH additions from
    #[clap(long, env = "GITHUB_PATH", global = true, hide = true)]
    pub(crate) github_path: Option<PathBuf>,
    /// Config file (defaults to `setup-tool.toml` in the working directory)
    #[clap(long, env = "SETUP_TOOL_CONFIG", global = true)]
    pub(crate) config: Option<PathBuf>,
    /// Reject explicit versions that are not valid semver
    #[clap(long, global = true)]
    pub(crate) strict_versions: bool,
}

impl From<ToolArgs> for Overrides {
    fn from(args: ToolArgs) -> Self {
        Overrides {
            name: args.name,
            version: args.tool_version,
            os: args.os,
            arch: args.arch,
            releases_url: args.releases_url,
            cache_dir: args.cache_dir,
            temp_dir: args.temp_dir,
            github_path: args.github_path,
            strict_versions: args.strict_versions,
        }
    }
}
