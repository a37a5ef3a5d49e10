//! kakeibo-classify: the receipt interpretation engine — header resolution,
//! two-tier classification, and the per-receipt pipeline.

pub mod classify;
pub mod header;
pub mod items;
pub mod oracle;
pub mod persist;
pub mod pipeline;
pub mod rules;

pub use classify::Classifier;
pub use header::HeaderResolver;
pub use items::extract_items;
pub use oracle::{Oracle, OracleRequest};
pub use persist::{MemoryStore, ReceiptStore, upsert_receipt};
pub use pipeline::{Pipeline, ReceiptOutcome};
pub use rules::rule_classify;
