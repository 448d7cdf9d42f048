//! Topaz containers: a VWI-encoded header table followed by tagged records.

mod header;
mod reader;
pub mod vwi;

pub use header::{TopazBlock, TopazHeader};
pub use reader::{KEY_ASIN, KEY_CDE_TYPE, KEY_TITLE, TopazMetadata, TopazReader, read_header};
