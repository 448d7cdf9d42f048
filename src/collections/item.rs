//! Collection item references.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::identity::BookIdentity;

/// One entry of a collection's `items` list.
///
/// The Kindle writes these as strings: `*<sha1 of device path>` for sideloaded
/// files and `#<asin>^<type>` for books with an ASIN. Anything else is kept
/// verbatim so that saving never loses entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemRef {
    Hash(String),
    Asin { asin: String, book_type: String },
    Unrecognized(String),
}

impl ItemRef {
    /// Parse the textual form. Never fails.
    pub fn parse(text: &str) -> Self {
        if let Some(hash) = text.strip_prefix('*') {
            return ItemRef::Hash(hash.to_string());
        }
        if let Some((asin, book_type)) = text
            .strip_prefix('#')
            .and_then(|rest| rest.split_once('^'))
        {
            return ItemRef::Asin {
                asin: asin.to_string(),
                book_type: book_type.to_string(),
            };
        }
        ItemRef::Unrecognized(text.to_string())
    }

    /// The reference a collection should hold for `identity`: by ASIN when it
    /// has one, by content hash otherwise.
    pub fn for_identity(identity: &BookIdentity) -> Self {
        match identity.asin() {
            Some(asin) => ItemRef::Asin {
                asin: asin.to_string(),
                book_type: identity.book_type.clone().unwrap_or_default(),
            },
            None => ItemRef::Hash(identity.content_hash.clone()),
        }
    }

    /// Whether both references name the same book: same tag and same key
    /// (hash, or ASIN regardless of type code).
    pub fn same_target(&self, other: &ItemRef) -> bool {
        match (self, other) {
            (ItemRef::Hash(a), ItemRef::Hash(b)) => a == b,
            (ItemRef::Asin { asin: a, .. }, ItemRef::Asin { asin: b, .. }) => a == b,
            (ItemRef::Unrecognized(a), ItemRef::Unrecognized(b)) => a == b,
            _ => false,
        }
    }

    /// Whether this reference points at `identity`.
    pub fn refers_to(&self, identity: &BookIdentity) -> bool {
        match self {
            ItemRef::Hash(hash) => *hash == identity.content_hash,
            ItemRef::Asin { asin, .. } => identity.asin() == Some(asin.as_str()),
            ItemRef::Unrecognized(_) => false,
        }
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemRef::Hash(hash) => write!(f, "*{hash}"),
            ItemRef::Asin { asin, book_type } => write!(f, "#{asin}^{book_type}"),
            ItemRef::Unrecognized(text) => f.write_str(text),
        }
    }
}

impl FromStr for ItemRef {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Serialize for ItemRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ItemRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Self::parse(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::BookMetadata;
    use proptest::prelude::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!(
            ItemRef::parse("*0123abcd"),
            ItemRef::Hash("0123abcd".to_string())
        );
        assert_eq!(
            ItemRef::parse("#B0000ABCDE^EBOK"),
            ItemRef::Asin {
                asin: "B0000ABCDE".to_string(),
                book_type: "EBOK".to_string()
            }
        );
        assert_eq!(
            ItemRef::parse("#NOCARET"),
            ItemRef::Unrecognized("#NOCARET".to_string())
        );
        assert_eq!(
            ItemRef::parse("plain"),
            ItemRef::Unrecognized("plain".to_string())
        );
    }

    #[test]
    fn test_for_identity() {
        let plain = BookIdentity::new("/mnt/us/documents/a.pdf");
        assert_eq!(
            ItemRef::for_identity(&plain),
            ItemRef::Hash(plain.content_hash.clone())
        );
        assert!(ItemRef::for_identity(&plain).refers_to(&plain));

        let store_book = BookIdentity::new("/mnt/us/documents/b.azw").with_metadata(BookMetadata {
            title: None,
            asin: Some("B0000ABCDE".into()),
            book_type: Some("EBOK".into()),
        });
        let item = ItemRef::for_identity(&store_book);
        assert_eq!(item.to_string(), "#B0000ABCDE^EBOK");
        assert!(item.refers_to(&store_book));
        assert!(!item.refers_to(&plain));
    }

    #[test]
    fn test_same_target_ignores_type_code() {
        let a = ItemRef::parse("#B0000ABCDE^EBOK");
        assert!(a.same_target(&ItemRef::parse("#B0000ABCDE^")));
        assert!(!a.same_target(&ItemRef::parse("#B0000ABCDF^EBOK")));
        assert!(!a.same_target(&ItemRef::Hash("B0000ABCDE".into())));
    }

    #[test]
    fn test_serde_as_string() {
        let items: Vec<ItemRef> = serde_json::from_str(r##"["*ab","#X^Y","?"]"##).unwrap();
        assert_eq!(items[1], ItemRef::parse("#X^Y"));
        assert_eq!(serde_json::to_string(&items).unwrap(), r##"["*ab","#X^Y","?"]"##);
    }

    proptest! {
        #[test]
        fn prop_hash_ref_round_trips(hash in "[0-9a-f]{40}") {
            let text = format!("*{hash}");
            let item = ItemRef::parse(&text);
            prop_assert_eq!(&item, &ItemRef::Hash(hash));
            prop_assert_eq!(item.to_string(), text);
        }

        #[test]
        fn prop_asin_ref_round_trips(asin in "[A-Z0-9]{10}", book_type in "[A-Z]{2,4}") {
            let text = format!("#{asin}^{book_type}");
            let item = ItemRef::parse(&text);
            let is_asin = matches!(item, ItemRef::Asin { .. });
            prop_assert!(is_asin);
            prop_assert_eq!(item.to_string(), text);
        }

        #[test]
        fn prop_any_text_round_trips(text in ".*") {
            prop_assert_eq!(ItemRef::parse(&text).to_string(), text);
        }
    }
}
