use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

/// Default host serving `/{tool}/index.json` and the release archives.
pub const DEFAULT_RELEASES_URL: &str = "https://releases.hashicorp.com";

/// The release index of a tool as published by the releases host.
///
/// Only the version keys are consumed; per-version metadata is kept opaque.
#[derive(Debug, Deserialize)]
pub struct ReleaseIndex {
    /// The name of the tool, if the host reports it.
    #[serde(default)]
    pub name: Option<String>,
    /// A map of version strings to their release metadata.
    pub versions: BTreeMap<String, serde_json::Value>,
}

impl ReleaseIndex {
    /// Builds an index from bare version strings.
    pub fn from_versions<I, S>(versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            versions: versions
                .into_iter()
                .map(|v| (v.into(), serde_json::Value::Object(Default::default())))
                .collect(),
        }
    }

    /// Iterates over the raw version keys.
    pub fn version_keys(&self) -> impl Iterator<Item = &str> {
        self.versions.keys().map(String::as_str)
    }
}

/// Remote capabilities the setup pipeline needs from a releases host.
pub trait ReleaseSource {
    /// Base URL that archive URLs are rooted at.
    fn base_url(&self) -> &str;

    /// Fetches the release index of `tool_name`.
    fn fetch_index(&self, tool_name: &str) -> Result<ReleaseIndex>;

    /// Downloads `url` into the file at `dest`.
    fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

/// [`ReleaseSource`] backed by a blocking HTTP client.
#[derive(Debug, Clone)]
pub struct ReleasesClient {
    base_url: String,
    client: Client,
}

impl ReleasesClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: Client::new(),
        }
    }
}

impl Default for ReleasesClient {
    fn default() -> Self {
        Self::new(DEFAULT_RELEASES_URL)
    }
}

impl ReleaseSource for ReleasesClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches `{base_url}/{tool}/index.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the host answers with a
    /// non-success status or the body has no `versions` object.
    fn fetch_index(&self, tool_name: &str) -> Result<ReleaseIndex> {
        let url = index_url(&self.base_url, tool_name);
        debug!(%url, "fetching release index");
        let response = self
            .client
            .get(&url)
            .header("User-Agent", "setup-tool")
            .send()
            .with_context(|| format!("Could not reach {}", url))?;

        if !response.status().is_success() {
            bail!("Failed to fetch release index of {} ({})", tool_name, response.status());
        }
        let body = response.text()?;
        let index: ReleaseIndex = serde_json::from_str(&body)
            .with_context(|| format!("Malformed release index at {}", url))?;
        Ok(index)
    }

    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        debug!(%url, dest = %dest.display(), "downloading");
        let mut response = self
            .client
            .get(url)
            .header("User-Agent", "setup-tool")
            .send()
            .with_context(|| format!("Could not reach {}", url))?;

        if !response.status().is_success() {
            bail!("Failed to download {} ({})", url, response.status());
        }
        let mut file = File::create(dest)
            .with_context(|| format!("Could not create {:?}", dest))?;
        response
            .copy_to(&mut file)
            .with_context(|| format!("Could not write {:?}", dest))?;
        Ok(())
    }
}

/// URL of the release index of `tool_name`.
pub fn index_url(base_url: &str, tool_name: &str) -> String {
    format!("{}/{}/index.json", base_url.trim_end_matches('/'), tool_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use tempfile::tempdir;

    #[test]
    fn test_index_url() {
        assert_eq!(
            index_url("https://releases.hashicorp.com/", "terraform"),
            "https://releases.hashicorp.com/terraform/index.json"
        );
    }

    #[test]
    fn test_fetch_index() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/terraform/index.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{
                "name": "terraform",
                "versions": {
                    "1.5.7": {"version": "1.5.7"},
                    "1.6.0": {"version": "1.6.0"}
                }
            }"#)
            .create();

        let client = ReleasesClient::new(server.url());
        let index = client.fetch_index("terraform").unwrap();
        mock.assert();

        assert_eq!(index.name.as_deref(), Some("terraform"));
        let keys: Vec<_> = index.version_keys().collect();
        assert_eq!(keys, vec!["1.5.7", "1.6.0"]);
    }

    #[test]
    fn test_fetch_index_not_found() {
        let mut server = Server::new();
        let _mock = server
            .mock("GET", "/nope/index.json")
            .with_status(404)
            .create();

        let client = ReleasesClient::new(server.url());
        let err = client.fetch_index("nope").unwrap_err();
        assert!(err.to_string().contains("Failed to fetch release index of nope"));
    }

    #[test]
    fn test_fetch_index_malformed() {
        let mut server = Server::new();
        let _mock = server
            .mock("GET", "/terraform/index.json")
            .with_status(200)
            .with_body(r#"{"name": "terraform"}"#)
            .create();

        let client = ReleasesClient::new(server.url());
        let err = client.fetch_index("terraform").unwrap_err();
        assert!(format!("{:#}", err).contains("Malformed release index"));
    }

    #[test]
    fn test_download_writes_file() {
        let mut server = Server::new();
        let _mock = server
            .mock("GET", "/terraform/1.6.0/terraform_1.6.0_linux_amd64.zip")
            .with_status(200)
            .with_body("archive-bytes")
            .create();

        let dir = tempdir().unwrap();
        let dest = dir.path().join("archive.zip");
        let client = ReleasesClient::new(format!("{}/", server.url()));
        let url = format!("{}/terraform/1.6.0/terraform_1.6.0_linux_amd64.zip", client.base_url());
        client.download(&url, &dest).unwrap();

        assert_eq!(std::fs::read_to_string(dest).unwrap(), "archive-bytes");
    }

    #[test]
    fn test_download_failure_status() {
        let mut server = Server::new();
        let _mock = server
            .mock("GET", "/missing.zip")
            .with_status(500)
            .create();

        let dir = tempdir().unwrap();
        let dest = dir.path().join("archive.zip");
        let client = ReleasesClient::new(server.url());
        let url = format!("{}/missing.zip", server.url());
        assert!(client.download(&url, &dest).is_err());
        assert!(!dest.exists());
    }
}
