//! The Kindle collections database (`system/collections.json`).

use std::collections::BTreeMap;
use std::io::{self, Read, Write};

use chrono::NaiveDateTime;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use serde_json::ser::Formatter;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::identity::BookIdentity;
use crate::index::DeviceFileIndex;

use super::item::ItemRef;

/// Locale given to collections created from scratch.
pub const DEFAULT_LOCALE: &str = "en-US";

const BACKUP_SUFFIX: &str = "-collections.json.backup";

/// A named list of books.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    /// Taken from the `<name>@<locale>` key, not from the body.
    pub locale: String,
    pub last_access: i64,
    pub items: Vec<ItemRef>,
    /// Fields this crate does not interpret, written back unchanged.
    pub extra: Map<String, Value>,
}

impl Collection {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            last_access: 0,
            items: Vec::new(),
            extra: Map::new(),
        }
    }

    fn position_of_target(&self, item: &ItemRef) -> Option<usize> {
        self.items.iter().position(|existing| existing.same_target(item))
    }
}

/// Collection body as stored on the device.
#[derive(Deserialize)]
struct StoredCollection {
    /// Redundant with the key; ignored.
    #[serde(default, rename = "locale")]
    _locale: IgnoredAny,
    #[serde(default)]
    items: Vec<ItemRef>,
    #[serde(default, rename = "lastAccess")]
    last_access: i64,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Serialize)]
struct StoredCollectionRef<'a> {
    items: &'a [ItemRef],
    #[serde(rename = "lastAccess")]
    last_access: i64,
    #[serde(flatten)]
    extra: &'a Map<String, Value>,
}

/// Outcome of [`CollectionStore::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// An item naming the same book was already there; nothing changed.
    AlreadyPresent,
}

/// One row of a resolved collection.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedItem<'a> {
    pub item: &'a ItemRef,
    /// `None` when the referenced book is not on the device (stale entry).
    pub identity: Option<&'a BookIdentity>,
}

impl ResolvedItem<'_> {
    pub fn is_stale(&self) -> bool {
        self.identity.is_none()
    }

    /// Book title or file name; the raw item text for stale entries.
    pub fn label(&self) -> String {
        match self.identity {
            Some(identity) => identity.label().to_string(),
            None => self.item.to_string(),
        }
    }
}

/// All collections on a device, keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionStore {
    collections: BTreeMap<String, Collection>,
}

/// Split `"<name>@<locale>"` on the last `@`.
fn split_key(key: &str) -> (&str, &str) {
    key.rsplit_once('@').unwrap_or((key, ""))
}

impl CollectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse collections JSON from a reader.
    pub fn load<R: Read>(reader: R) -> Result<Self> {
        let raw: BTreeMap<String, StoredCollection> = serde_json::from_reader(reader)?;
        Ok(Self::from_stored(raw))
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let raw: BTreeMap<String, StoredCollection> = serde_json::from_slice(bytes)?;
        Ok(Self::from_stored(raw))
    }

    fn from_stored(raw: BTreeMap<String, StoredCollection>) -> Self {
        let mut collections = BTreeMap::new();
        for (key, stored) in raw {
            let (name, locale) = split_key(&key);
            let collection = Collection {
                locale: locale.to_string(),
                last_access: stored.last_access,
                items: stored.items,
                extra: stored.extra,
            };
            if collections.insert(name.to_string(), collection).is_some() {
                tracing::warn!(
                    collection = name,
                    key = %key,
                    "collection listed under two locales"
                );
            }
        }
        Self { collections }
    }

    /// Serialize as compact, ASCII-only JSON.
    pub fn save<W: Write>(&self, writer: W) -> Result<()> {
        let stored: BTreeMap<String, StoredCollectionRef<'_>> = self
            .collections
            .iter()
            .map(|(name, collection)| {
                (
                    format!("{name}@{}", collection.locale),
                    StoredCollectionRef {
                        items: &collection.items,
                        last_access: collection.last_access,
                        extra: &collection.extra,
                    },
                )
            })
            .collect();
        let mut serializer = serde_json::Serializer::with_formatter(writer, AsciiFormatter);
        stored.serialize(&mut serializer)?;
        Ok(())
    }

    pub fn to_vec(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.save(&mut out)?;
        Ok(out)
    }

    pub fn get(&self, name: &str) -> Option<&Collection> {
        self.collections.get(name)
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Collection> {
        self.collections
            .get_mut(name)
            .ok_or_else(|| Error::NotFound(format!("collection {name:?}")))
    }

    /// Collection names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Collection)> {
        self.collections.iter().map(|(name, c)| (name.as_str(), c))
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Resolve every item of `name` against `index`, in stored order.
    /// Items whose book is absent come back stale; nothing is dropped.
    pub fn resolve<'a>(
        &'a self,
        name: &str,
        index: &'a DeviceFileIndex,
    ) -> Result<Vec<ResolvedItem<'a>>> {
        let collection = self
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("collection {name:?}")))?;
        Ok(collection
            .items
            .iter()
            .map(|item| ResolvedItem {
                item,
                identity: match item {
                    ItemRef::Asin { asin, .. } => index.resolve_asin(asin),
                    ItemRef::Hash(hash) => index.get(hash),
                    ItemRef::Unrecognized(_) => None,
                },
            })
            .collect())
    }

    /// Append a reference to `identity`, by ASIN when it has one.
    pub fn add(&mut self, name: &str, identity: &BookIdentity) -> Result<AddOutcome> {
        let collection = self.get_mut(name)?;
        let item = ItemRef::for_identity(identity);
        if collection.position_of_target(&item).is_some() {
            return Ok(AddOutcome::AlreadyPresent);
        }
        collection.items.push(item);
        Ok(AddOutcome::Added)
    }

    /// Remove the first item equal to `item`.
    pub fn remove(&mut self, name: &str, item: &ItemRef) -> Result<ItemRef> {
        let collection = self.get_mut(name)?;
        let pos = collection
            .items
            .iter()
            .position(|existing| existing == item)
            .ok_or_else(|| Error::NotFound(format!("{item} in collection {name:?}")))?;
        Ok(collection.items.remove(pos))
    }

    /// Remove the first item that refers to `identity`.
    pub fn remove_identity(&mut self, name: &str, identity: &BookIdentity) -> Result<ItemRef> {
        let collection = self.get_mut(name)?;
        let pos = collection
            .items
            .iter()
            .position(|existing| existing.refers_to(identity))
            .ok_or_else(|| Error::NotFound(format!("{} in collection {name:?}", identity.path)))?;
        Ok(collection.items.remove(pos))
    }

    /// Move a collection to a new name, keeping all of its fields.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        if self.collections.contains_key(new) {
            return Err(Error::AlreadyExists(format!("collection {new:?}")));
        }
        let collection = self
            .collections
            .remove(old)
            .ok_or_else(|| Error::NotFound(format!("collection {old:?}")))?;
        self.collections.insert(new.to_string(), collection);
        Ok(())
    }

    /// Create an empty collection.
    pub fn create(&mut self, name: &str, locale: &str) -> Result<()> {
        if self.collections.contains_key(name) {
            return Err(Error::AlreadyExists(format!("collection {name:?}")));
        }
        self.collections.insert(name.to_string(), Collection::new(locale));
        Ok(())
    }

    pub fn delete(&mut self, name: &str) -> Result<Collection> {
        self.collections
            .remove(name)
            .ok_or_else(|| Error::NotFound(format!("collection {name:?}")))
    }

    /// Whether `name` holds an item naming the same book as `item`.
    pub fn contains(&self, name: &str, item: &ItemRef) -> Result<bool> {
        let collection = self
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("collection {name:?}")))?;
        Ok(collection.position_of_target(item).is_some())
    }

    /// Names of the collections that reference `identity`.
    pub fn collections_containing(&self, identity: &BookIdentity) -> Vec<&str> {
        self.collections
            .iter()
            .filter(|(_, collection)| collection.items.iter().any(|item| item.refers_to(identity)))
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Name the Kindle tooling uses for a backup taken at `timestamp`.
pub fn backup_file_name(timestamp: NaiveDateTime) -> String {
    format!("{}{BACKUP_SUFFIX}", timestamp.format("%Y%m%d%H%M%S"))
}

/// [`backup_file_name`] for the current local time.
pub fn backup_file_name_now() -> String {
    backup_file_name(chrono::Local::now().naive_local())
}

/// Compact formatter that escapes every non-ASCII character as `\uXXXX`,
/// using surrogate pairs outside the Basic Multilingual Plane.
struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(fragment[start..i].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
            start = i + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}
