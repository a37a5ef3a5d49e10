//! Notion persistence client implementing the engine's ReceiptStore seam.
//!
//! Receipts and items live in two databases; the receipt database is keyed
//! by the レシートID rich-text property, which carries the dedup identity.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{Value, json};

use kakeibo_classify::ReceiptStore;
use kakeibo_core::{ClassifiedItem, ReceiptHeader};

use crate::config::NotionSection;
use crate::runtime;

pub struct NotionStore {
    api_key: String,
    receipts_db_id: String,
    items_db_id: String,
    base_url: String,
    version: String,
}

#[derive(Deserialize)]
struct QueryResponse {
    results: Option<Vec<PageRef>>,
}

#[derive(Deserialize)]
struct PageRef {
    id: String,
}

impl NotionStore {
    pub fn from_config(cfg: &NotionSection) -> Result<Self> {
        let missing = |what: &str| {
            anyhow::anyhow!("missing notion {what}; set the env var or the [notion] section in config")
        };
        Ok(Self {
            api_key: cfg.api_key.clone().ok_or_else(|| missing("api key"))?,
            receipts_db_id: cfg
                .receipts_db_id
                .clone()
                .ok_or_else(|| missing("receipts_db_id"))?,
            items_db_id: cfg.items_db_id.clone().ok_or_else(|| missing("items_db_id"))?,
            base_url: cfg.base_url.clone(),
            version: cfg.version.clone(),
        })
    }

    async fn post(&self, url: String, body: Value) -> Result<Value> {
        let client = reqwest::Client::new();
        let resp = client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header("Notion-Version", self.version.clone())
            .header(CONTENT_TYPE, "application/json")
            .timeout(Duration::from_secs(20))
            .json(&body)
            .send()
            .await
            .context("notion request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("notion error: {status} {txt}");
        }
        resp.json().await.context("parse notion response")
    }

    async fn query_by_identity(&self, identity: &str) -> Result<Option<String>> {
        let url = format!("{}/v1/databases/{}/query", self.base_url, self.receipts_db_id);
        let body = json!({
            "filter": {
                "property": "レシートID",
                "rich_text": { "equals": identity },
            }
        });
        let value = self.post(url, body).await?;
        let parsed: QueryResponse = serde_json::from_value(value).context("parse notion query")?;
        Ok(parsed
            .results
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(|page| page.id))
    }

    async fn create_page(&self, body: Value) -> Result<String> {
        let url = format!("{}/v1/pages", self.base_url);
        let value = self.post(url, body).await?;
        let page: PageRef = serde_json::from_value(value).context("parse notion page")?;
        Ok(page.id)
    }
}

impl ReceiptStore for NotionStore {
    fn find_receipt(&self, identity: &str) -> Result<Option<String>> {
        runtime::wait(self.query_by_identity(identity))
    }

    fn create_receipt(&self, header: &ReceiptHeader, identity: &str) -> Result<String> {
        let body = json!({
            "parent": { "database_id": self.receipts_db_id },
            "properties": {
                "レシート名": { "title": [{ "text": { "content": header.label() } }] },
                "購入日付": { "date": { "start": header.iso_date() } },
                "店名": { "rich_text": [{ "text": { "content": header.store_name } }] },
                "レシートID": { "rich_text": [{ "text": { "content": identity } }] },
            }
        });
        runtime::wait(self.create_page(body))
    }

    fn create_item(
        &self,
        receipt_ref: &str,
        identity: &str,
        header: &ReceiptHeader,
        item: &ClassifiedItem,
    ) -> Result<String> {
        let name = if item.name.is_empty() { "不明" } else { &item.name };
        let body = json!({
            "parent": { "database_id": self.items_db_id },
            "properties": {
                "商品名": { "title": [{ "text": { "content": name } }] },
                "金額": { "number": item.price },
                "購入日付": { "date": { "start": header.iso_date() } },
                "店名": { "rich_text": [{ "text": { "content": header.store_name } }] },
                "カテゴリ": { "select": { "name": item.category } },
                "信頼度": { "number": item.confidence },
                "分類元": { "select": { "name": item.provenance.as_str() } },
                "レシートID": { "rich_text": [{ "text": { "content": identity } }] },
                "レシート": { "relation": [{ "id": receipt_ref }] },
            }
        });
        runtime::wait(self.create_page(body))
    }
}
