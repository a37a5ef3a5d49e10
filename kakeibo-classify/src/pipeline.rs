//! End-to-end receipt processing: header → identity → upsert → items →
//! classify → persist.
//!
//! Strictly single-threaded per receipt event; no state is shared between
//! receipts. The header upsert is idempotent under redelivery, item
//! creation is not — a retried partial batch can duplicate item rows. The
//! per-item counters exist so callers can surface that instead of guessing.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::warn;

use kakeibo_core::{
    CategorySet, ClassifiedItem, Dictionaries, ReceiptHeader, build_identity, coerce_price,
};
use kakeibo_ingest::LineItemCandidate;

use crate::classify::Classifier;
use crate::header::HeaderResolver;
use crate::items::extract_items;
use crate::oracle::Oracle;
use crate::persist::{ReceiptStore, upsert_receipt};

/// One receipt event's collaborators and configuration, injected once.
pub struct Pipeline<'a> {
    pub dicts: &'a Dictionaries,
    pub categories: &'a CategorySet,
    pub oracle: &'a dyn Oracle,
    pub store: &'a dyn ReceiptStore,
    /// Processing date, used when no purchase date can be resolved.
    pub today: NaiveDate,
}

/// What one receipt event produced.
#[derive(Debug, Clone)]
pub struct ReceiptOutcome {
    pub header: ReceiptHeader,
    pub identity: String,
    pub receipt_ref: String,
    pub items: Vec<ClassifiedItem>,
    pub created: usize,
    pub low_confidence: usize,
    pub failed: usize,
}

impl ReceiptOutcome {
    /// No line items were extracted. Not an error: the sender should be
    /// told to resubmit a clearer image.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a> Pipeline<'a> {
    /// Process one receipt event start to finish.
    ///
    /// `brand_hint` comes from logo detection (may be empty), `message_id`
    /// from the upstream delivery; both feed the dedup identity directly or
    /// indirectly.
    pub fn process(
        &self,
        ocr_text: &str,
        brand_hint: &str,
        message_id: &str,
    ) -> Result<ReceiptOutcome> {
        let resolver = HeaderResolver::new(self.dicts, self.oracle);
        let header = resolver
            .resolve(ocr_text, brand_hint, self.today)
            .context("resolving receipt header")?;

        let identity = build_identity(header.purchase_date, &header.store_name, ocr_text, message_id);
        let receipt_ref =
            upsert_receipt(self.store, &header, &identity).context("upserting receipt header")?;

        let candidates = extract_items(ocr_text, self.oracle).context("extracting line items")?;
        let mut outcome = ReceiptOutcome {
            header,
            identity,
            receipt_ref,
            items: Vec::with_capacity(candidates.len()),
            created: 0,
            low_confidence: 0,
            failed: 0,
        };
        if candidates.is_empty() {
            return Ok(outcome);
        }

        let classifier = Classifier::new(self.dicts, self.categories, self.oracle);
        for LineItemCandidate {
            raw_name,
            raw_price_text,
        } in candidates
        {
            let price = coerce_price(&raw_price_text);
            let classification =
                classifier.classify(&outcome.header.store_name, &raw_name, price)?;
            let item = ClassifiedItem::new(&raw_name, price, classification);
            if item.is_low_confidence() {
                outcome.low_confidence += 1;
            }
            // One bad item must not block the rest of the batch.
            match self
                .store
                .create_item(&outcome.receipt_ref, &outcome.identity, &outcome.header, &item)
            {
                Ok(_) => outcome.created += 1,
                Err(err) => {
                    warn!("create_item failed for {}: {err:#}", item.name);
                    outcome.failed += 1;
                }
            }
            outcome.items.push(item);
        }

        Ok(outcome)
    }
}
