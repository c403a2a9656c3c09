//! Library version keys
//!
//! Version strings are normalised once, on the way into the store and on the
//! way into a lookup, so that `"1.0"`, `"v1.0.0"` and `"01.0.0"` all name the
//! same key. Normalisation rules:
//!
//! - a single leading `v`/`V` is dropped
//! - a missing minor or patch component is filled with `0`
//! - leading zeros in the numeric core are removed
//! - pre-release and build metadata are kept and must be valid semver
//!
//! Strings that still fail to parse become [`VersionKey::Opaque`]: they can be
//! looked up exactly, and sort below every semantic version.

use semver::{BuildMetadata, Prerelease, Version};
use std::cmp::Ordering;
use std::fmt;

/// A normalised library version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionKey {
    /// Unparseable version string, kept verbatim (trimmed)
    Opaque(String),
    /// Well-formed semantic version
    Semantic(Version),
}

impl VersionKey {
    /// Normalise a raw version string into a key
    pub fn parse(raw: &str) -> Self {
        match normalize(raw) {
            Some(version) => VersionKey::Semantic(version),
            None => VersionKey::Opaque(raw.trim().to_string()),
        }
    }

    /// Whether the raw string was a (normalisable) semantic version
    pub fn is_semantic(&self) -> bool {
        matches!(self, VersionKey::Semantic(_))
    }

    /// Compare by semantic-version precedence, ignoring build metadata
    pub fn cmp_precedence(&self, other: &Self) -> Ordering {
        match (self, other) {
            (VersionKey::Semantic(a), VersionKey::Semantic(b)) => precedence(a, b),
            (VersionKey::Semantic(_), VersionKey::Opaque(_)) => Ordering::Greater,
            (VersionKey::Opaque(_), VersionKey::Semantic(_)) => Ordering::Less,
            (VersionKey::Opaque(a), VersionKey::Opaque(b)) => a.cmp(b),
        }
    }
}

impl Ord for VersionKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_precedence(other).then_with(|| match (self, other) {
            // Equal precedence: fall back to full ordering (build metadata) so
            // that `Ord` agrees with `Eq`.
            (VersionKey::Semantic(a), VersionKey::Semantic(b)) => a.cmp(b),
            _ => Ordering::Equal,
        })
    }
}

impl PartialOrd for VersionKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for VersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionKey::Opaque(raw) => f.write_str(raw),
            VersionKey::Semantic(version) => write!(f, "{}", version),
        }
    }
}

impl From<&str> for VersionKey {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

/// Semver precedence: major, minor, patch, then pre-release.
/// An empty pre-release sorts above any non-empty one.
fn precedence(a: &Version, b: &Version) -> Ordering {
    a.major
        .cmp(&b.major)
        .then(a.minor.cmp(&b.minor))
        .then(a.patch.cmp(&b.patch))
        .then_with(|| a.pre.cmp(&b.pre))
}

fn normalize(raw: &str) -> Option<Version> {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);

    let (rest, build) = match trimmed.split_once('+') {
        Some((rest, build)) => (rest, Some(build)),
        None => (trimmed, None),
    };
    let (core, pre) = match rest.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (rest, None),
    };

    let mut numbers = [0u64; 3];
    let mut count = 0;
    for part in core.split('.') {
        if count == numbers.len() || part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        numbers[count] = part.parse().ok()?;
        count += 1;
    }

    let mut version = Version::new(numbers[0], numbers[1], numbers[2]);
    if let Some(pre) = pre {
        if pre.is_empty() {
            return None;
        }
        version.pre = Prerelease::new(pre).ok()?;
    }
    if let Some(build) = build {
        if build.is_empty() {
            return None;
        }
        version.build = BuildMetadata::new(build).ok()?;
    }
    Some(version)
}
