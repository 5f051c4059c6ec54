use anyhow::Result;
use tracing::debug;
use setup_tool::config::{ConfigFile, Settings};
use setup_tool::finalize::{ProcessSearchPath, ProcessVerifier};
use setup_tool::global::cache::ToolCache;
use setup_tool::platform::resolve_platform;
use setup_tool::registry::{ReleaseSource, ReleasesClient};
use setup_tool::setup::{resolve_requested_version, Setup};
use setup_tool::version::sorted_candidates;
use crate::cli::{SetupCommand, CLI};

pub fn execute(cli: CLI) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let file = ConfigFile::discover(cli.tool.config.as_deref(), &cwd)?;
    let settings = Settings::merge(cli.tool.into(), file)?;
    debug!(?settings, "settings");

    match cli.command.unwrap_or(SetupCommand::Install) {
        SetupCommand::Install => {
            execute_install(&settings)
        }
        SetupCommand::Resolve => {
            execute_resolve(&settings)
        }
        SetupCommand::Versions => {
            execute_versions(&settings)
        }
        SetupCommand::Platform => {
            execute_platform(&settings)
        }
        SetupCommand::Which => {
            execute_which(&settings)
        }
    }
}

pub fn execute_install(settings: &Settings) -> Result<()> {
    let request = settings.request()?;
    let source = ReleasesClient::new(settings.releases_url.as_str());
    let cache = settings.tool_cache()?;
    let mut search_path = ProcessSearchPath::from_env(settings.github_path.clone());
    let verifier = ProcessVerifier;

    let mut setup = Setup {
        source: &source,
        cache: &cache,
        search_path: &mut search_path,
        verifier: &verifier,
    };
    let installed = setup.run(&request)?;
    debug!(
        path = %installed.path.display(),
        from_cache = installed.from_cache,
        "installed"
    );
    Ok(())
}

pub fn execute_resolve(settings: &Settings) -> Result<()> {
    let tool = settings.tool_name()?;
    let source = ReleasesClient::new(settings.releases_url.as_str());
    let version = resolve_requested_version(&source, tool, &settings.version, settings.validation)?;
    println!("{}", version);
    Ok(())
}

pub fn execute_versions(settings: &Settings) -> Result<()> {
    let tool = settings.tool_name()?;
    let source = ReleasesClient::new(settings.releases_url.as_str());
    let index = source.fetch_index(tool)?;
    let candidates = sorted_candidates(&index);
    if candidates.is_empty() {
        println!("No installable versions");
        return Ok(());
    }
    for (_, version) in candidates {
        println!("{}", version);
    }
    Ok(())
}

pub fn execute_platform(settings: &Settings) -> Result<()> {
    let platform = resolve_platform(&settings.platform.os, &settings.platform.arch)?;
    println!("{}", platform);
    Ok(())
}

pub fn execute_which(settings: &Settings) -> Result<()> {
    let tool = settings.tool_name()?;
    let platform = resolve_platform(&settings.platform.os, &settings.platform.arch)?;
    let source = ReleasesClient::new(settings.releases_url.as_str());
    let version = resolve_requested_version(&source, tool, &settings.version, settings.validation)?;
    let cache = settings.tool_cache()?;
    match cache.find(tool, version.as_str(), platform.as_str()) {
        Some(path) => {
            println!("{}", path.display());
        }
        None => {
            println!("{} {} ({}) is not cached", tool, version, platform);
        }
    }
    Ok(())
}
