//! Google Vision clients: document OCR and logo detection.
//!
//! OCR is load-bearing — a service-reported error is fatal for the receipt.
//! Logo detection only enriches the store name; every failure there is
//! swallowed into an empty hint.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use kakeibo_core::{Dictionaries, normalize_store_name};

use crate::config::VisionSection;
use crate::runtime;

pub struct VisionClient {
    api_key: String,
    base_url: String,
}

#[derive(Deserialize)]
struct AnnotateResponse {
    responses: Option<Vec<ImageResponse>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    error: Option<ServiceError>,
    full_text_annotation: Option<TextAnnotation>,
    logo_annotations: Option<Vec<LogoAnnotation>>,
}

#[derive(Deserialize)]
struct ServiceError {
    message: Option<String>,
}

#[derive(Deserialize)]
struct TextAnnotation {
    text: Option<String>,
}

#[derive(Deserialize)]
struct LogoAnnotation {
    description: Option<String>,
    score: Option<f64>,
}

impl VisionClient {
    pub fn from_config(cfg: &VisionSection) -> Result<Self> {
        let api_key = cfg.api_key.clone().ok_or_else(|| {
            anyhow::anyhow!("missing vision api key; set VISION_API_KEY or [vision] api_key in config")
        })?;
        Ok(Self {
            api_key,
            base_url: cfg.base_url.clone(),
        })
    }

    /// Full-document OCR. A service-reported error fails the receipt.
    pub fn ocr_text(&self, image: &[u8]) -> Result<String> {
        let response = runtime::wait(self.annotate(image, "DOCUMENT_TEXT_DETECTION"))?;
        if let Some(error) = response.error {
            bail!("vision ocr error: {}", error.message.unwrap_or_default());
        }
        Ok(response
            .full_text_annotation
            .and_then(|t| t.text)
            .unwrap_or_default()
            .trim()
            .to_string())
    }

    /// Best-effort brand hint from logo detection: the highest-scoring logo
    /// description, normalized like a store name. Empty on any failure.
    pub fn logo_hint(&self, image: &[u8], dicts: &Dictionaries) -> String {
        let response = match runtime::wait(self.annotate(image, "LOGO_DETECTION")) {
            Ok(r) => r,
            Err(err) => {
                debug!("logo detection failed, continuing without hint: {err:#}");
                return String::new();
            }
        };
        if response.error.is_some() {
            return String::new();
        }
        let best = response
            .logo_annotations
            .unwrap_or_default()
            .into_iter()
            .max_by(|a, b| {
                a.score
                    .unwrap_or(0.0)
                    .total_cmp(&b.score.unwrap_or(0.0))
            });
        best.and_then(|l| l.description)
            .map(|d| normalize_store_name(&d, dicts))
            .unwrap_or_default()
    }

    async fn annotate(&self, image: &[u8], feature: &str) -> Result<ImageResponse> {
        let url = format!("{}/v1/images:annotate?key={}", self.base_url, self.api_key);
        let body = json!({
            "requests": [{
                "image": { "content": STANDARD.encode(image) },
                "features": [{ "type": feature }],
            }]
        });

        let client = reqwest::Client::new();
        let resp = client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .timeout(Duration::from_secs(20))
            .json(&body)
            .send()
            .await
            .context("vision request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("vision error: {status} {txt}");
        }

        let out: AnnotateResponse = resp.json().await.context("parse vision response")?;
        out.responses
            .unwrap_or_default()
            .into_iter()
            .next()
            .context("empty vision response")
    }
}
