//! Release asset selection.
//!
//! Maps a platform plus a list of release asset names onto the single asset
//! that should be downloaded. Pure: no I/O, no side effects, deterministic
//! for a given input.
//!
//! Selection runs in two phases:
//!
//! 1. **Pattern containment** — ordered name patterns built from the
//!    platform (`linux_amd64`, `linux-amd64`, `linux`, `linuxamd64`), first
//!    hit wins. Generic `arm` assets are preferred over versioned `armv7`
//!    style names; the versioned names are only accepted when nothing
//!    generic matches.
//! 2. **Fallback scoring** — a rule table of OS and architecture tokens with
//!    bonuses and penalties, applied when no pattern matched. The highest
//!    positive score wins, first-seen order breaks ties.

use crate::error::{GripError, Result};
use crate::github::Asset;
use crate::platform::Platform;

/// OS token rule: the first contained token yields its bonus.
struct OsRule {
    os: &'static str,
    tokens: &'static [(&'static str, i32)],
}

const OS_RULES: &[OsRule] = &[
    OsRule {
        os: "linux",
        tokens: &[("linux", 10), ("gnu", 5)],
    },
    OsRule {
        os: "darwin",
        tokens: &[("darwin", 10), ("macos", 10), ("osx", 10)],
    },
    OsRule {
        os: "windows",
        tokens: &[("windows", 10), ("win", 10)],
    },
];

/// Architecture token rule. A name scores `bonus` when it contains any
/// token but none of the `exclude` tokens; `penalty` applies on top when
/// its token is present.
struct ArchRule {
    arch: &'static str,
    tokens: &'static [&'static str],
    bonus: i32,
    exclude: &'static [&'static str],
    penalty: Option<(&'static str, i32)>,
}

const ARCH_RULES: &[ArchRule] = &[
    ArchRule {
        arch: "amd64",
        tokens: &["amd64", "x86_64", "64"],
        bonus: 5,
        exclude: &[],
        penalty: None,
    },
    ArchRule {
        arch: "386",
        tokens: &["386", "x86", "32"],
        bonus: 5,
        exclude: &[],
        penalty: None,
    },
    ArchRule {
        arch: "arm64",
        tokens: &["arm64", "aarch64"],
        bonus: 5,
        exclude: &[],
        penalty: None,
    },
    ArchRule {
        arch: "arm",
        tokens: &["arm"],
        bonus: 5,
        exclude: &["arm64"],
        penalty: Some(("armv", -2)),
    },
];

/// Source archives are never what we want to run.
const SOURCE_PENALTY: (&[&str], i32) = (&["src", "source"], -10);

/// Pick the best asset for `platform`, or fail with `NoSuitableAsset`.
pub fn select_asset<'a>(platform: &Platform, assets: &'a [Asset]) -> Result<&'a Asset> {
    if let Some(asset) = match_patterns(platform, assets, false) {
        return Ok(asset);
    }
    // Nothing generic for arm: accept versioned armv names after all.
    if platform.arch == "arm" {
        if let Some(asset) = match_patterns(platform, assets, true) {
            return Ok(asset);
        }
    }

    let mut best: Option<(&Asset, i32)> = None;
    for asset in assets {
        let score = match_score(&asset.name.to_lowercase(), platform);
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((asset, score));
        }
    }

    match best {
        Some((asset, score)) if score > 0 => Ok(asset),
        _ => Err(GripError::NoSuitableAsset(platform.to_string())),
    }
}

/// Phase 1: ordered containment patterns, first hit wins.
fn match_patterns<'a>(
    platform: &Platform,
    assets: &'a [Asset],
    allow_armv: bool,
) -> Option<&'a Asset> {
    let patterns = [
        format!("{}_{}", platform.os, platform.arch),
        format!("{}-{}", platform.os, platform.arch),
        platform.os.clone(),
        format!("{}{}", platform.os, platform.arch), // e.g. "darwin64"
    ];

    for pattern in &patterns {
        for asset in assets {
            let name = asset.name.to_lowercase();
            if !name.contains(pattern.as_str()) {
                continue;
            }
            if platform.arch == "arm" && !allow_armv && name.contains("armv") {
                continue;
            }
            return Some(asset);
        }
    }

    None
}

/// Phase 2: how well a (lowercased) asset name matches the platform.
fn match_score(name: &str, platform: &Platform) -> i32 {
    let mut score = 0;

    let mut os_matched = false;
    if let Some(rule) = OS_RULES.iter().find(|r| r.os == platform.os) {
        if let Some((_, bonus)) = rule.tokens.iter().find(|(t, _)| name.contains(t)) {
            score += bonus;
            os_matched = true;
        }
    }
    // Bare Windows binaries often carry no OS token at all.
    if platform.os == "windows" && !os_matched && name.ends_with(".exe") {
        score += 5;
    }

    if let Some(rule) = ARCH_RULES.iter().find(|r| r.arch == platform.arch) {
        let excluded = rule.exclude.iter().any(|t| name.contains(t));
        if !excluded && rule.tokens.iter().any(|t| name.contains(t)) {
            score += rule.bonus;
            if let Some((token, penalty)) = rule.penalty {
                if name.contains(token) {
                    score += penalty;
                }
            }
        }
    }

    let (tokens, penalty) = SOURCE_PENALTY;
    if tokens.iter().any(|t| name.contains(t)) {
        score += penalty;
    }

    score
}
