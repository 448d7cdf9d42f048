//! # kindelabra
//!
//! Identify the books on a Kindle and edit its collections database.
//!
//! ## Features
//!
//! - Recover title, ASIN and content type from MOBI/PRC/AZW, Topaz and
//!   Kindlet files
//! - Index a device by path hash and by ASIN
//! - Load, edit and save `system/collections.json` without losing entries
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::fs::File;
//! use kindelabra::{CollectionStore, DeviceFileIndex, ScanConfig};
//!
//! let config = ScanConfig::default();
//! let index = DeviceFileIndex::build_from_host_paths(
//!     &config,
//!     ["/media/KINDLE/documents/True Names.azw"],
//! );
//!
//! let store = CollectionStore::load(File::open("/media/KINDLE/system/collections.json")?)?;
//! for name in store.names() {
//!     for row in store.resolve(name, &index)? {
//!         println!("{name}: {}{}", row.label(), if row.is_stale() { " (missing)" } else { "" });
//!     }
//! }
//! # Ok::<(), kindelabra::Error>(())
//! ```
//!
//! ## Identifying a single file
//!
//! ```
//! use kindelabra::{BookFormat, identify_source};
//! use kindelabra::io::MemorySource;
//!
//! let source = MemorySource::new(b"not really a book".to_vec());
//! let identity = identify_source(BookFormat::Mobi, "/mnt/us/documents/a.mobi", &source);
//!
//! // Unreadable files still get a path hash.
//! assert_eq!(identity.content_hash.len(), 40);
//! assert!(identity.title.is_none());
//! ```

pub mod collections;
pub mod device;
pub mod error;
pub mod format;
pub mod identity;
pub mod index;
pub mod io;
pub mod kindlet;
pub mod mobi;
pub mod topaz;
pub(crate) mod util;

pub use collections::{AddOutcome, Collection, CollectionStore, ItemRef, ResolvedItem};
pub use device::ScanConfig;
pub use error::{Error, Result};
pub use format::{BookFormat, identify_file, identify_source};
pub use identity::{BookIdentity, BookMetadata, MetadataReader, content_hash};
pub use index::{Candidate, DeviceFileIndex};
