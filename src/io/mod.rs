//! Random-access byte sources for the metadata readers.

mod adapter;
mod byte_source;

pub use adapter::ByteSourceCursor;
pub use byte_source::{ByteSource, FileSource, MemorySource};
