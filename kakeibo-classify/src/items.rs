//! Oracle-driven line-item extraction.
//!
//! The oracle reads the raw OCR text and returns `商品名, 価格` rows; the
//! ingest parser turns that untrusted text into candidates. Zero rows is a
//! valid outcome (blurry photo), not an error.

use anyhow::Result;

use kakeibo_ingest::{LineItemCandidate, parse_items};

use crate::oracle::{Oracle, OracleRequest};

/// OCR text beyond this many characters is not shown to the oracle.
const PROMPT_TEXT_CAP: usize = 8000;

pub fn extract_items(ocr_text: &str, oracle: &dyn Oracle) -> Result<Vec<LineItemCandidate>> {
    let request = OracleRequest::new(items_prompt(ocr_text), 0.1, 2048);
    let text = oracle.generate(&request)?;
    Ok(parse_items(&text))
}

fn items_prompt(ocr_text: &str) -> String {
    let capped: String = ocr_text.chars().take(PROMPT_TEXT_CAP).collect();
    format!(
        "以下のレシートOCRテキストから商品明細を抽出し、CSVで出力してください。\n\
         列: 商品名, 価格\n\
         制約:\n\
         - CSVヘッダーは省略可。コードブロックや前後のコメントは付けないでください。\n\
         - 価格は整数で、カンマや円記号は除去してください。\n\
         例:\n\
         おにぎり, 128\n\
         牛乳, 198\n\n\
         OCR:\n{capped}\n"
    )
}
