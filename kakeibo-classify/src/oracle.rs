//! The generative-text oracle seam.
//!
//! Implementations live at the I/O edge (the CLI's Gemini client, fakes in
//! tests). The engine treats every response as untrusted text and decodes it
//! through the salvage utility.

use anyhow::Result;

/// One generation request. Temperature and token budget vary by caller:
/// header extraction and item listing run cold, classification slightly
/// warmer.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl OracleRequest {
    pub fn new(prompt: String, temperature: f32, max_output_tokens: u32) -> Self {
        Self {
            prompt,
            temperature,
            max_output_tokens,
        }
    }
}

/// Black-box generative-text service: prompt in, untrusted text out.
pub trait Oracle {
    fn generate(&self, request: &OracleRequest) -> Result<String>;
}
