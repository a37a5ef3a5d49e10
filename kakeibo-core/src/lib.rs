//! kakeibo-core: value types, injected dictionaries, and pure extraction
//! routines for receipt interpretation.

pub mod chain;
pub mod config;
pub mod date;
pub mod identity;
pub mod price;
pub mod receipt;
pub mod salvage;
pub mod store;

pub use chain::{FallbackChain, Resolved};
pub use config::{CategorySet, Dictionaries, KeywordGroup, MerchantRule, StoreTokenGroup};
pub use date::extract_date;
pub use identity::build_identity;
pub use price::coerce_price;
pub use receipt::{Classification, ClassifiedItem, Provenance, ReceiptHeader};
pub use salvage::{Salvage, salvage_json};
pub use store::{apply_brand_hint, extract_store_name, heading_store_name, normalize_store_name};
