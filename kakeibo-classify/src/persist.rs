//! Persistence seam: query-then-create upsert for receipt headers,
//! unconditional create for items.
//!
//! Implementations live at the I/O edge; `MemoryStore` backs tests and dry
//! runs.

use std::sync::Mutex;

use anyhow::Result;

use kakeibo_core::{ClassifiedItem, ReceiptHeader};

pub trait ReceiptStore {
    /// Reference of an existing receipt record with this identity, if any.
    fn find_receipt(&self, identity: &str) -> Result<Option<String>>;

    /// Create a header record and return its reference.
    fn create_receipt(&self, header: &ReceiptHeader, identity: &str) -> Result<String>;

    /// Create one item record referencing the header record.
    fn create_item(
        &self,
        receipt_ref: &str,
        identity: &str,
        header: &ReceiptHeader,
        item: &ClassifiedItem,
    ) -> Result<String>;
}

/// Upsert by identity: reuse the stored reference when the receipt already
/// exists. This substitutes for transactional locking under at-least-once
/// delivery.
pub fn upsert_receipt(
    store: &dyn ReceiptStore,
    header: &ReceiptHeader,
    identity: &str,
) -> Result<String> {
    if let Some(existing) = store.find_receipt(identity)? {
        return Ok(existing);
    }
    store.create_receipt(header, identity)
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredReceipt {
    pub reference: String,
    pub identity: String,
    pub header: ReceiptHeader,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredItem {
    pub reference: String,
    pub receipt_ref: String,
    pub identity: String,
    pub item: ClassifiedItem,
}

/// In-memory store for tests and `--dry-run`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    receipts: Mutex<Vec<StoredReceipt>>,
    items: Mutex<Vec<StoredItem>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn receipts(&self) -> Vec<StoredReceipt> {
        self.receipts.lock().unwrap().clone()
    }

    pub fn items(&self) -> Vec<StoredItem> {
        self.items.lock().unwrap().clone()
    }
}

impl ReceiptStore for MemoryStore {
    fn find_receipt(&self, identity: &str) -> Result<Option<String>> {
        Ok(self
            .receipts
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.identity == identity)
            .map(|r| r.reference.clone()))
    }

    fn create_receipt(&self, header: &ReceiptHeader, identity: &str) -> Result<String> {
        let mut receipts = self.receipts.lock().unwrap();
        let reference = format!("mem-receipt-{}", receipts.len() + 1);
        receipts.push(StoredReceipt {
            reference: reference.clone(),
            identity: identity.to_string(),
            header: header.clone(),
        });
        Ok(reference)
    }

    fn create_item(
        &self,
        receipt_ref: &str,
        identity: &str,
        _header: &ReceiptHeader,
        item: &ClassifiedItem,
    ) -> Result<String> {
        let mut items = self.items.lock().unwrap();
        let reference = format!("mem-item-{}", items.len() + 1);
        items.push(StoredItem {
            reference: reference.clone(),
            receipt_ref: receipt_ref.to_string(),
            identity: identity.to_string(),
            item: item.clone(),
        });
        Ok(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn header() -> ReceiptHeader {
        ReceiptHeader::new("ローソン", NaiveDate::from_ymd_opt(2025, 9, 28).unwrap())
    }

    #[test]
    fn test_upsert_reuses_existing_reference() {
        let store = MemoryStore::new();
        let first = upsert_receipt(&store, &header(), "id-1").unwrap();
        let second = upsert_receipt(&store, &header(), "id-1").unwrap();
        assert_eq!(first, second);
        assert_eq!(store.receipts().len(), 1);
    }

    #[test]
    fn test_different_identities_create_distinct_records() {
        let store = MemoryStore::new();
        let a = upsert_receipt(&store, &header(), "id-1").unwrap();
        let b = upsert_receipt(&store, &header(), "id-2").unwrap();
        assert_ne!(a, b);
        assert_eq!(store.receipts().len(), 2);
    }
}
