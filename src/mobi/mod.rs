//! MOBI/PRC/AZW containers: PDB sections, the MOBI header and EXTH records.

mod exth;
mod pdb;
mod reader;

pub use exth::{EXTH_ASIN, EXTH_CDE_TYPE, EXTH_UPDATED_TITLE, ExthRecords};
pub use pdb::{PDB_HEADER_LEN, SECTION_SENTINEL, Sectionizer};
pub use reader::{MobiMetadata, MobiReader};
