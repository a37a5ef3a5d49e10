//! kakeibo-ingest: parsers for the semi-structured line-item listing the
//! oracle produces from receipt OCR text.

pub mod items;
pub mod types;

pub use items::parse_items;
pub use types::LineItemCandidate;
