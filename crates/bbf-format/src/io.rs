//! JSON/CBOR result and resume-vector I/O with extension-based
//! auto-detection, in the shape of `sezkp_core::io` (`SPEC_FULL.md` §1's
//! "Serialization" ambient stack item).

use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Tiny forward-compatible wrapper: every file this crate writes carries a
/// version tag alongside its payload, the same way `sezkp_core::io::Versioned`
/// does for proof artifacts.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Versioned<T> {
    /// Wire version tag.
    pub ver: u16,
    /// Wrapped payload.
    pub payload: T,
}

impl<T> Versioned<T> {
    #[must_use]
    pub const fn new(ver: u16, payload: T) -> Self {
        Self { ver, payload }
    }
}

/// Current on-disk schema version for [`crate::result::SearchResultRecord`]
/// and resume vectors.
pub const FORMAT_VERSION: u16 = 1;

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating parent directory {}", dir.display()))?;
        }
    }
    Ok(())
}

fn ext_lower(path: &Path) -> Option<String> {
    path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase)
}

/// Reads a `Versioned<T>` from JSON or CBOR, auto-detected by extension.
///
/// # Errors
/// Returns an error if the extension is unrecognized, the file can't be
/// opened, or deserialization fails.
pub fn read_versioned_auto<T: DeserializeOwned>(path: &Path) -> Result<Versioned<T>> {
    match ext_lower(path).as_deref() {
        Some("json") => {
            let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
            serde_json::from_reader(BufReader::new(f)).context("deserialize JSON payload")
        }
        Some("cbor") => {
            let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
            ciborium::de::from_reader(BufReader::new(f)).context("deserialize CBOR payload")
        }
        Some(other) => Err(anyhow!("unsupported extension: {other} (expected .json or .cbor)")),
        None => Err(anyhow!("path has no extension (expected .json or .cbor)")),
    }
}

/// Writes a `Versioned<T>` as JSON or CBOR, auto-detected by extension
/// (defaults to JSON for an unknown or missing extension).
///
/// # Errors
/// Returns an error if the parent directory can't be created, the file
/// can't be created, or serialization fails.
pub fn write_versioned_auto<T: Serialize>(path: &Path, value: &Versioned<T>) -> Result<()> {
    ensure_parent_dir(path)?;
    match ext_lower(path).as_deref() {
        Some("cbor") => {
            let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
            ciborium::ser::into_writer(value, BufWriter::new(f)).context("serialize CBOR payload")
        }
        _ => {
            let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
            serde_json::to_writer_pretty(BufWriter::new(f), value).context("serialize JSON payload")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versioned_round_trips_through_json() {
        let dir = std::env::temp_dir().join(format!("bbf-format-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("payload.json");
        let wrapped = Versioned::new(FORMAT_VERSION, vec![1u32, 2, 3]);
        write_versioned_auto(&path, &wrapped).unwrap();
        let back: Versioned<Vec<u32>> = read_versioned_auto(&path).unwrap();
        assert_eq!(wrapped, back);
        let _ = fs::remove_dir_all(&dir);
    }
}
