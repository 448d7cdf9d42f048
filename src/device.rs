//! Kindle device layout: scan configuration and host → device path mapping.

use std::path::{Component, Path, PathBuf};

/// Where the Kindle mounts its user storage.
pub const DEFAULT_DEVICE_ROOT: &str = "/mnt/us";

/// Extensions the Kindle shows in its library, plus the Topaz, Kindlet and KF8 ones
/// the readers understand.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "pdf", "mobi", "prc", "txt", "tpz", "azw", "azw1", "azw2", "azw3", "manga",
];

/// Top-level directories that hold user content.
pub const DEFAULT_CONTENT_ROOTS: &[&str] = &["documents", "pictures"];

/// Settings for building a device file index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Mount point prefix used in on-device paths (and therefore in hashes).
    pub device_root: String,
    /// Lowercase extensions (no dot) that are indexed.
    pub extensions: Vec<String>,
    /// Directory names that anchor the device-relative part of a host path.
    pub content_roots: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            device_root: DEFAULT_DEVICE_ROOT.to_string(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            content_roots: DEFAULT_CONTENT_ROOTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ScanConfig {
    pub fn with_device_root(mut self, root: impl Into<String>) -> Self {
        self.device_root = root.into();
        self
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    pub fn with_content_roots<I, S>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.content_roots = roots.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `path` has an allowed extension (case-insensitive).
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .is_some_and(|ext| self.extensions.iter().any(|allowed| *allowed == ext))
    }

    /// Map a host path to the path the Kindle itself sees when the mount
    /// point is not known.
    ///
    /// Everything up to the last component named after a content root is
    /// replaced by `device_root`:
    /// `/media/KINDLE/documents/sub/book.mobi` → `/mnt/us/documents/sub/book.mobi`.
    /// A folder named like a content root inside another one is mistaken for
    /// the root; prefer [`ScanConfig::device_path_under`] when the mount is at
    /// hand. Returns `None` when no component is a content root.
    pub fn device_path(&self, host_path: &Path) -> Option<String> {
        let parts = normal_parts(host_path);
        let anchor = parts.iter().rposition(|part| self.is_content_root(part))?;
        Some(self.join_device_path(&parts[anchor..]))
    }

    /// Map a host path below the mounted device at `mount` to the path the
    /// Kindle sees: `mount` is stripped and the rest re-rooted at
    /// `device_root`.
    ///
    /// Returns `None` when `host_path` is not under `mount` or its first
    /// component below the mount is not a content root.
    pub fn device_path_under(&self, mount: &Path, host_path: &Path) -> Option<String> {
        let relative = host_path.strip_prefix(mount).ok()?;
        let parts = normal_parts(relative);
        if !self.is_content_root(parts.first()?) {
            return None;
        }
        Some(self.join_device_path(&parts))
    }

    fn is_content_root(&self, part: &str) -> bool {
        self.content_roots.iter().any(|root| root == part)
    }

    fn join_device_path(&self, parts: &[String]) -> String {
        let mut path = self.device_root.trim_end_matches('/').to_string();
        for part in parts {
            path.push('/');
            path.push_str(part);
        }
        path
    }
}

fn normal_parts(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

/// Whether `root` looks like a mounted Kindle: it has both `documents/` and
/// `system/`.
pub fn is_connected(root: &Path) -> bool {
    root.join("documents").is_dir() && root.join("system").is_dir()
}

/// Location of the collections database under a mounted Kindle.
pub fn collections_path(root: &Path) -> PathBuf {
    root.join("system").join("collections.json")
}
