//! Kindle collections: named lists of item references, stored as JSON.
//!
//! Item references address a book either by the SHA-1 of its on-device path
//! or by ASIN, and are resolved against a [`DeviceFileIndex`] for display.
//!
//! [`DeviceFileIndex`]: crate::index::DeviceFileIndex

mod item;
mod store;

pub use item::ItemRef;
pub use store::{
    AddOutcome, Collection, CollectionStore, DEFAULT_LOCALE, ResolvedItem, backup_file_name,
    backup_file_name_now,
};
