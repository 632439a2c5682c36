//! The icon catalog — the tag→filename table and the resolver that maps it
//! against an iconset directory.
//!
//! The table is ordered data, not code: block order in the packed container
//! equals table order, and callers can inject a replacement table (the CLI
//! does via `--catalog`).  Fallback filenames are declared per tag and tried
//! in order; a candidate that exists but is zero-length counts as absent.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

// ── IconTag ──────────────────────────────────────────────────────────────────

/// 4-byte block type identifier from the ICNS vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IconTag(pub [u8; 4]);

impl IconTag {
    pub const fn new(bytes: &[u8; 4]) -> Self {
        Self(*bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for IconTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) if self.0.iter().all(|b| b.is_ascii_graphic()) => f.write_str(s),
            _ => write!(f, "0x{}", hex::encode(self.0)),
        }
    }
}

// Tags travel as 4-character strings in JSON catalogs ("icp4"), not byte
// arrays.
impl Serialize for IconTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match std::str::from_utf8(&self.0) {
            Ok(s) => serializer.serialize_str(s),
            Err(_) => Err(serde::ser::Error::custom("icon tag is not ASCII")),
        }
    }
}

impl<'de> Deserialize<'de> for IconTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes: [u8; 4] = s.as_bytes().try_into().map_err(|_| {
            serde::de::Error::custom(format!("icon tag must be exactly 4 bytes: {s:?}"))
        })?;
        Ok(IconTag(bytes))
    }
}

// ── IconSpec ─────────────────────────────────────────────────────────────────

/// One row of the catalog: a tag, its canonical iconset filename, and the
/// fallback filenames tried when the canonical file is absent or empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IconSpec {
    pub tag: IconTag,
    pub canonical: String,
    #[serde(default)]
    pub fallbacks: Vec<String>,
}

impl IconSpec {
    fn new(tag: &[u8; 4], canonical: &str, fallbacks: &[&str]) -> Self {
        Self {
            tag: IconTag::new(tag),
            canonical: canonical.to_owned(),
            fallbacks: fallbacks.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    /// Candidate filenames in resolution order: canonical first, then the
    /// declared fallbacks.
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.canonical.as_str())
            .chain(self.fallbacks.iter().map(String::as_str))
    }
}

/// The built-in ICNS catalog.  Each base-resolution tag declares its `@2x`
/// iconset twin as a fallback.  Retina tags declare none: a fallback reusing
/// another tag's canonical file would pack the same payload twice whenever a
/// base-only iconset is supplied.
pub fn icns_catalog() -> Vec<IconSpec> {
    vec![
        IconSpec::new(b"icp4", "icon_16x16.png", &["icon_16x16@2x.png"]),
        IconSpec::new(b"icp5", "icon_32x32.png", &["icon_32x32@2x.png"]),
        IconSpec::new(b"icp6", "icon_64x64.png", &["icon_64x64@2x.png"]),
        IconSpec::new(b"ic07", "icon_128x128.png", &["icon_128x128@2x.png"]),
        IconSpec::new(b"ic08", "icon_256x256.png", &["icon_256x256@2x.png"]),
        IconSpec::new(b"ic09", "icon_512x512.png", &["icon_512x512@2x.png"]),
        IconSpec::new(b"ic10", "icon_1024x1024.png", &["icon_512x512@2x.png"]),
        IconSpec::new(b"ic11", "icon_16x16@2x.png", &[]),
        IconSpec::new(b"ic12", "icon_32x32@2x.png", &[]),
        IconSpec::new(b"ic13", "icon_128x128@2x.png", &[]),
        IconSpec::new(b"ic14", "icon_256x256@2x.png", &[]),
    ]
}

// ── Resolver ─────────────────────────────────────────────────────────────────

/// A catalog row matched to an on-disk file, payload already read.
#[derive(Debug, Clone)]
pub struct ResolvedEntry {
    pub tag: IconTag,
    pub path: PathBuf,
    pub payload: Vec<u8>,
}

/// Resolver output: entries in catalog order plus the tags that found no
/// usable source file.
#[derive(Debug, Default)]
pub struct Resolution {
    pub entries: Vec<ResolvedEntry>,
    pub missing: Vec<IconTag>,
}

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("source directory {path} is missing or unreadable: {source}")]
    Directory { path: PathBuf, source: io::Error },
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
}

/// Map the catalog against `dir`.
///
/// Per-tag resolution is independent; with the `parallel` feature the
/// payload reads fan out over rayon, but the returned entries are always in
/// catalog order.  Missing tags are reported, not raised — the caller
/// decides whether an incomplete iconset is acceptable.
pub fn resolve_iconset(dir: &Path, specs: &[IconSpec]) -> Result<Resolution, ResolveError> {
    // Readability check up front, before any per-tag work.
    fs::read_dir(dir).map_err(|source| ResolveError::Directory {
        path: dir.to_owned(),
        source,
    })?;

    #[cfg(feature = "parallel")]
    let resolved: Vec<Option<ResolvedEntry>> = specs
        .par_iter()
        .map(|spec| resolve_spec(dir, spec))
        .collect::<Result<_, _>>()?;

    #[cfg(not(feature = "parallel"))]
    let resolved: Vec<Option<ResolvedEntry>> = specs
        .iter()
        .map(|spec| resolve_spec(dir, spec))
        .collect::<Result<_, _>>()?;

    let mut resolution = Resolution::default();
    for (spec, entry) in specs.iter().zip(resolved) {
        match entry {
            Some(e) => resolution.entries.push(e),
            None => resolution.missing.push(spec.tag),
        }
    }
    Ok(resolution)
}

fn resolve_spec(dir: &Path, spec: &IconSpec) -> Result<Option<ResolvedEntry>, ResolveError> {
    for name in spec.candidates() {
        let path = dir.join(name);
        match fs::read(&path) {
            Ok(payload) if payload.is_empty() => {
                log::debug!("{}: {} is empty, trying next candidate", spec.tag, path.display());
            }
            Ok(payload) => {
                log::debug!("{}: resolved to {}", spec.tag, path.display());
                return Ok(Some(ResolvedEntry {
                    tag: spec.tag,
                    path,
                    payload,
                }));
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => return Err(ResolveError::Read { path, source }),
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_display_and_json() {
        let tag = IconTag::new(b"icp4");
        assert_eq!(tag.to_string(), "icp4");
        assert_eq!(serde_json::to_string(&tag).unwrap(), "\"icp4\"");
        let back: IconTag = serde_json::from_str("\"icp4\"").unwrap();
        assert_eq!(back, tag);
    }

    #[test]
    fn non_printable_tag_displays_as_hex() {
        assert_eq!(IconTag::new(&[0, 1, 2, 3]).to_string(), "0x00010203");
    }

    #[test]
    fn catalog_tags_are_unique_and_ordered() {
        let specs = icns_catalog();
        assert_eq!(specs[0].tag, IconTag::new(b"icp4"));
        for (i, a) in specs.iter().enumerate() {
            for b in &specs[i + 1..] {
                assert_ne!(a.tag, b.tag);
            }
        }
    }

    #[test]
    fn retina_fallback_declared_for_base_tags() {
        let specs = icns_catalog();
        let icp5 = specs.iter().find(|s| s.tag == IconTag::new(b"icp5")).unwrap();
        assert_eq!(icp5.fallbacks, vec!["icon_32x32@2x.png".to_string()]);
    }

    #[test]
    fn retina_tags_declare_no_fallbacks() {
        for spec in icns_catalog() {
            if spec.canonical.contains("@2x") {
                assert!(
                    spec.fallbacks.is_empty(),
                    "{}: retina tag must not fall back to a base file",
                    spec.tag
                );
            }
        }
    }
}
