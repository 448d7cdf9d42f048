//! Device-wide lookup from content hash and ASIN to book identity.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use regex_lite::RegexBuilder;

use crate::device::ScanConfig;
use crate::error::Result;
use crate::format::identify_file;
use crate::identity::BookIdentity;

/// A file found on the mounted device, with the path the Kindle knows it by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub host_path: PathBuf,
    pub device_path: String,
}

impl Candidate {
    pub fn new(host_path: impl Into<PathBuf>, device_path: impl Into<String>) -> Self {
        Self {
            host_path: host_path.into(),
            device_path: device_path.into(),
        }
    }
}

/// Identities of every indexed file, keyed by content hash and by ASIN.
///
/// An index is built in one go and never edited afterwards; a rescan builds a
/// new one that replaces the old.
#[derive(Debug, Clone, Default)]
pub struct DeviceFileIndex {
    by_hash: HashMap<String, BookIdentity>,
    by_asin: HashMap<String, BookIdentity>,
    collisions: Vec<String>,
}

impl DeviceFileIndex {
    /// Identify each accepted candidate and index the results.
    ///
    /// Candidates whose extension is not in `config.extensions` are skipped.
    pub fn build<I>(config: &ScanConfig, candidates: I) -> Self
    where
        I: IntoIterator<Item = Candidate>,
    {
        Self::from_identities(
            candidates
                .into_iter()
                .filter(|candidate| config.accepts(&candidate.host_path))
                .map(|candidate| identify_file(&candidate.host_path, &candidate.device_path)),
        )
    }

    /// Like [`DeviceFileIndex::build`], deriving device paths from host
    /// paths. Paths outside the content roots are skipped.
    pub fn build_from_host_paths<I, P>(config: &ScanConfig, host_paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let candidates = host_paths.into_iter().filter_map(|path| {
            let path = path.as_ref();
            match config.device_path(path) {
                Some(device_path) => Some(Candidate::new(path, device_path)),
                None => {
                    tracing::debug!(path = %path.display(), "outside content roots, skipped");
                    None
                }
            }
        });
        Self::build(config, candidates)
    }

    /// Like [`DeviceFileIndex::build`] for files found below the device
    /// mounted at `mount`. Paths outside its content roots are skipped.
    pub fn build_under<I, P>(config: &ScanConfig, mount: &Path, host_paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let candidates = host_paths.into_iter().filter_map(|path| {
            let path = path.as_ref();
            match config.device_path_under(mount, path) {
                Some(device_path) => Some(Candidate::new(path, device_path)),
                None => {
                    tracing::debug!(path = %path.display(), "outside content roots, skipped");
                    None
                }
            }
        });
        Self::build(config, candidates)
    }

    /// Index already-built identities.
    ///
    /// A later identity with the same content hash replaces the earlier one;
    /// the replaced hash is recorded in [`DeviceFileIndex::collisions`].
    pub fn from_identities<I>(identities: I) -> Self
    where
        I: IntoIterator<Item = BookIdentity>,
    {
        let mut index = Self::default();
        for identity in identities {
            tracing::debug!(
                path = %identity.path,
                hash = %identity.content_hash,
                asin = identity.asin(),
                "indexed"
            );
            if let Some(asin) = identity.asin() {
                index.by_asin.insert(asin.to_string(), identity.clone());
            }
            let hash = identity.content_hash.clone();
            if let Some(previous) = index.by_hash.insert(hash.clone(), identity) {
                tracing::warn!(hash = %hash, replaced = %previous.path, "content hash collision");
                index.collisions.push(hash);
            }
        }
        index
    }

    /// Look up by content hash.
    pub fn get(&self, content_hash: &str) -> Option<&BookIdentity> {
        self.by_hash.get(content_hash)
    }

    /// Look up by ASIN. With duplicate ASINs on the device, which one is
    /// returned is unspecified.
    pub fn resolve_asin(&self, asin: &str) -> Option<&BookIdentity> {
        self.by_asin.get(asin)
    }

    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }

    /// All identities, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &BookIdentity> {
        self.by_hash.values()
    }

    /// Hashes that were indexed more than once during the build.
    pub fn collisions(&self) -> &[String] {
        &self.collisions
    }

    /// Identities whose title or device path matches `pattern`
    /// (case-insensitive), sorted by path.
    pub fn search_title(&self, pattern: &str) -> Result<Vec<&BookIdentity>> {
        let re = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        let mut matches: Vec<&BookIdentity> = self
            .iter()
            .filter(|identity| {
                re.is_match(&identity.path)
                    || identity.title.as_deref().is_some_and(|title| re.is_match(title))
            })
            .collect();
        matches.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(matches)
    }
}
