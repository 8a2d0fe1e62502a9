//! Library interface for grip.
//!
//! grip installs, updates, and removes binaries published as GitHub release
//! assets, keeping a binary store, a directory of command symlinks, and a
//! metadata record per package consistent with each other.

pub mod asset;
pub mod audit;
pub mod commands;
pub mod config;
pub mod error;
pub mod github;
pub mod installer;
pub mod platform;
pub mod resolver;
pub mod store;

pub use config::Config;
pub use error::{GripError, Result};
pub use github::{GitHubClient, ReleaseSource};
pub use platform::Platform;
pub use store::PackageStore;
