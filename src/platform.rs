//! Platform detection for selecting the correct release asset.
//!
//! A platform is a normalized `os-arch` pair. Names are folded onto the
//! Go-style spellings most release assets use: `macos` becomes `darwin`,
//! `x86_64` becomes `amd64`, `x86` becomes `386`, `aarch64` becomes `arm64`.

use std::fmt;

/// A target platform as an (os, arch) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    /// Detect the platform this process is running on.
    pub fn current() -> Self {
        Self {
            os: normalize_os(std::env::consts::OS).to_string(),
            arch: normalize_arch(std::env::consts::ARCH).to_string(),
        }
    }

    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        let os = os.into();
        Self {
            os: normalize_os(&os).to_string(),
            arch: normalize_arch_owned(arch.into()),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

/// Fold OS aliases onto the names release assets use.
pub fn normalize_os(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

/// Fold architecture aliases onto the names release assets use.
pub fn normalize_arch(arch: &str) -> &str {
    match arch {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        other => other,
    }
}

fn normalize_arch_owned(arch: String) -> String {
    match arch.as_str() {
        "x86_64" => "amd64".to_string(),
        "x86" => "386".to_string(),
        "aarch64" => "arm64".to_string(),
        _ => arch,
    }
}
