//! Typed model of Vite's `manifest.json`.
//!
//! The manifest is a JSON object keyed by module id (the source path as Vite
//! sees it, e.g. `src/main.ts` or `_shared-B2x9.js`). Each value describes the
//! emitted file and the static/dynamic imports and stylesheets it pulls in.
//!
//! Decoding is lenient: unknown fields are ignored and missing fields take
//! their zero value. No semantic checks are made here; dangling import
//! references surface later, during head resolution.

use std::io::Read;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One chunk or asset emitted by the build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManifestEntry {
    /// Emitted file, relative to the asset base
    pub file: String,

    /// Original source module
    #[serde(skip_serializing_if = "String::is_empty")]
    pub src: String,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_entry: bool,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_dynamic_entry: bool,

    /// Static imports, in the order the build listed them
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,

    /// Lazily loaded chunks; never part of the eager head list
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dynamic_imports: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub css: Vec<String>,

    /// Chunk name, when Vite assigned one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ManifestEntry {
    /// Whether the emitted file is a script the resolver emits a tag for.
    pub fn is_script(&self) -> bool {
        is_script(&self.file)
    }
}

pub(crate) fn is_script(path: &str) -> bool {
    path.ends_with(".js")
}

/// Decoded manifest, keyed by module id in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: IndexMap<String, ManifestEntry>,
}

impl Manifest {
    /// Decode a manifest from raw JSON bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Decode a manifest from a stream, reading it to the end first.
    pub fn decode_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::decode(&bytes)
    }

    /// Read and decode the manifest file at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::decode(&bytes)
    }

    /// Encode back to pretty JSON in the same shape Vite writes.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn get(&self, key: &str) -> Option<&ManifestEntry> {
        self.entries.get(key)
    }

    /// Insert or replace an entry, keeping the position of an existing key.
    pub fn insert(&mut self, key: impl Into<String>, entry: ManifestEntry) {
        self.entries.insert(key.into(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ManifestEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Entries flagged `isEntry`, in document order.
    pub fn entrypoints(&self) -> impl Iterator<Item = (&str, &ManifestEntry)> {
        self.iter().filter(|(_, entry)| entry.is_entry)
    }
}

impl FromIterator<(String, ManifestEntry)> for Manifest {
    fn from_iter<I: IntoIterator<Item = (String, ManifestEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
