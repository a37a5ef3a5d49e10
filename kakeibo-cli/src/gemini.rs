//! Gemini generateContent client implementing the engine's Oracle seam.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};

use kakeibo_classify::{Oracle, OracleRequest};

use crate::config::GeminiSection;
use crate::runtime;

pub struct GeminiOracle {
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiOracle {
    pub fn from_config(cfg: &GeminiSection) -> Result<Self> {
        let api_key = cfg.api_key.clone().ok_or_else(|| {
            anyhow::anyhow!("missing gemini api key; set GEMINI_API_KEY or [gemini] api_key in config")
        })?;
        Ok(Self {
            api_key,
            model: cfg.model.clone(),
            base_url: cfg.base_url.clone(),
        })
    }

    async fn generate_async(&self, request: &OracleRequest) -> Result<String> {
        #[derive(Serialize)]
        struct Part {
            text: String,
        }

        #[derive(Serialize)]
        struct Content {
            parts: Vec<Part>,
        }

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct GenerationConfig {
            temperature: f32,
            max_output_tokens: u32,
        }

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Req {
            contents: Vec<Content>,
            generation_config: GenerationConfig,
        }

        #[derive(Deserialize)]
        struct Resp {
            candidates: Option<Vec<Candidate>>,
        }

        #[derive(Deserialize)]
        struct Candidate {
            content: Option<RespContent>,
        }

        #[derive(Deserialize)]
        struct RespContent {
            parts: Option<Vec<RespPart>>,
        }

        #[derive(Deserialize)]
        struct RespPart {
            text: Option<String>,
        }

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let body = Req {
            contents: vec![Content {
                parts: vec![Part {
                    text: request.prompt.clone(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
            },
        };

        let client = reqwest::Client::new();
        let resp = client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .timeout(timeout_for(request))
            .json(&body)
            .send()
            .await
            .context("gemini request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("gemini error: {status} {txt}");
        }

        // Safety blocks can drop candidates or parts; every field is optional.
        let out: Resp = resp.json().await.context("parse gemini response")?;
        let text = out
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|p| p.text)
            .unwrap_or_default();

        Ok(text.trim().to_string())
    }
}

impl Oracle for GeminiOracle {
    fn generate(&self, request: &OracleRequest) -> Result<String> {
        runtime::wait(self.generate_async(request))
    }
}

/// Item extraction returns long CSV bodies and gets the longer budget.
fn timeout_for(request: &OracleRequest) -> Duration {
    if request.max_output_tokens >= 1024 {
        Duration::from_secs(30)
    } else {
        Duration::from_secs(20)
    }
}
