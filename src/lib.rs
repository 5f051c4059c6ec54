//! # setup-tool Core Library
//!
//! This crate contains the core logic of `setup-tool`: installing one release
//! binary (e.g. `terraform`) for the current CI host in a single run.
//!
//! A run resolves the host platform, resolves the requested version (possibly
//! `latest` against the remote release index), looks the tool up in the local
//! tool cache and, on a miss, downloads, extracts and caches the release
//! archive. The cached directory is then put on the search path and the binary
//! is smoke-tested with `--version`.
//!
//! ## Modules Overview
//! - [`platform`] – Host (os, arch) to release platform id mapping
//! - [`version`] – Version requests, normalization and `latest` selection
//! - [`registry`] – Release index fetch and archive download over HTTP
//! - [`installer`] – Download, extract, chmod and cache-store of a release
//! - [`finalize`] – Search path registration and the post-install smoke test
//! - [`setup`] – The end-to-end pipeline and its failure kinds
//! - [`config`] – `setup-tool.toml` and merged run settings
//! - [`util`] – Zip extraction, permissions, directory copies
//! - [`global`] – User directories and the on-disk tool cache

pub mod error;
pub mod platform;
pub mod version;
pub mod registry;
pub mod installer;
pub mod finalize;
pub mod setup;
pub mod config;
pub mod util;
pub mod global;

pub use error::SetupError;
pub use setup::{Installed, Setup, SetupRequest};
pub use global::cache::*;
