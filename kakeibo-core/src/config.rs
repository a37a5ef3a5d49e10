//! Injected configuration: the closed category set and the merchant/keyword
//! dictionaries used by store-name extraction and classification.
//!
//! These are data, not code. Engine components take them by reference so
//! tests and deployments can substitute their own tables.

use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

/// Closed, ordered set of spending category labels.
///
/// The last label is the universal fallback: anything outside the set is
/// coerced onto it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySet {
    labels: Vec<String>,
}

impl CategorySet {
    pub fn new(labels: Vec<String>) -> Result<Self> {
        ensure!(!labels.is_empty(), "category set must not be empty");
        Ok(Self { labels })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn fallback(&self) -> &str {
        self.labels.last().map(String::as_str).unwrap_or_default()
    }

    /// Map a label onto the set: members pass through, everything else
    /// becomes the fallback.
    pub fn coerce<'a>(&'a self, raw: &'a str) -> &'a str {
        if self.contains(raw) { raw } else { self.fallback() }
    }

    /// The ten household categories of the reference deployment.
    pub fn default_ja() -> Self {
        Self {
            labels: words(&[
                "食費",
                "交通",
                "日用品（スーパー・ドラッグストア）",
                "医療",
                "犬関係",
                "趣味・娯楽",
                "教育・学習",
                "サブスク（Netflix, Spotify など）",
                "交際費（飲み会・プレゼント）",
                "その他",
            ]),
        }
    }
}

/// A known merchant name and the category it pins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantRule {
    pub name: String,
    pub category: String,
}

/// Tokens matched against the store name alone, with a per-group confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreTokenGroup {
    pub tokens: Vec<String>,
    pub category: String,
    pub confidence: f64,
}

/// Item keywords mapping to a category (matched case-insensitively against
/// store name + item name).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordGroup {
    pub words: Vec<String>,
    pub category: String,
}

/// All lookup tables consumed by extraction and classification.
///
/// Plain lists come first so the struct serializes to valid TOML (values
/// before arrays of tables).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dictionaries {
    /// Romanized chain names for OCR output that dropped the Japanese logo.
    pub latin_brands: Vec<String>,
    /// Corporate-entity noise stripped during store-name normalization.
    pub corporate_tokens: Vec<String>,
    /// Boilerplate words that disqualify a heading line as a store name.
    pub heading_ban_words: Vec<String>,
    /// Ordered merchant map; the first name contained in the text wins.
    pub merchants: Vec<MerchantRule>,
    pub store_groups: Vec<StoreTokenGroup>,
    pub keyword_groups: Vec<KeywordGroup>,
}

impl Dictionaries {
    /// The Japanese tables of the reference deployment.
    pub fn default_ja() -> Self {
        let daily = "日用品（スーパー・ドラッグストア）";
        Self {
            merchants: vec![
                merchant("セブン-イレブン", "食費"),
                merchant("ファミリーマート", "食費"),
                merchant("ローソン", "食費"),
                merchant("スーパー玉出", "食費"),
                merchant("阪急電鉄", "交通"),
                merchant("JR", "交通"),
                merchant("スギ薬局", daily),
                merchant("ココカラファイン", daily),
                merchant("カインズ", daily),
                merchant("スターバックス", "食費"),
                merchant("ドトール", "食費"),
                merchant("コーナン", "犬関係"),
                merchant("ペット", "犬関係"),
            ],
            store_groups: vec![
                StoreTokenGroup {
                    tokens: words(&["ドラッグ", "薬局", "ココカラ", "マツキヨ", "スギ薬局", "ウェルシア"]),
                    category: daily.to_string(),
                    confidence: 0.85,
                },
                StoreTokenGroup {
                    tokens: words(&["スーパー", "マート", "マーケット", "百貨店", "食品館", "生鮮", "フレッシュ"]),
                    category: "食費".to_string(),
                    confidence: 0.85,
                },
                StoreTokenGroup {
                    tokens: words(&["電鉄", "駅", "JR", "バス", "地下鉄", "メトロ", "IC", "切符"]),
                    category: "交通".to_string(),
                    confidence: 0.9,
                },
                StoreTokenGroup {
                    tokens: words(&["カフェ", "コーヒー", "ベーカリー", "パン", "スターバックス", "ドトール"]),
                    category: "食費".to_string(),
                    confidence: 0.85,
                },
            ],
            keyword_groups: vec![
                KeywordGroup {
                    words: words(&["切符", "乗車", "運賃", "ICチャージ", "改札"]),
                    category: "交通".to_string(),
                },
                KeywordGroup {
                    words: words(&[
                        "シャンプー", "洗剤", "トイレットペーパー", "日用品", "ティッシュ",
                        "キッチンペーパー", "スポンジ", "歯ブラシ", "歯磨き", "ボディソープ",
                        "ゴミ袋", "洗濯", "柔軟剤", "マスク", "除菌",
                    ]),
                    category: daily.to_string(),
                },
                KeywordGroup {
                    words: words(&["病院", "クリニック", "薬", "処方"]),
                    category: "医療".to_string(),
                },
                KeywordGroup {
                    words: words(&["犬", "ドッグ", "ペット", "フード", "トリミング", "おやつ"]),
                    category: "犬関係".to_string(),
                },
                KeywordGroup {
                    words: words(&[
                        "弁当", "おにぎり", "サンドイッチ", "パン", "牛乳", "卵", "肉", "野菜",
                        "米", "寿司", "刺身", "惣菜", "ビール", "酒", "飲料", "お茶", "コーヒー",
                        "紅茶", "カップ麺",
                    ]),
                    category: "食費".to_string(),
                },
                KeywordGroup {
                    words: words(&["Netflix", "Spotify", "Adobe", "サブスク", "定額"]),
                    category: "サブスク（Netflix, Spotify など）".to_string(),
                },
            ],
            latin_brands: words(&["FamilyMart", "LAWSON", "Seven", "Starbucks", "DOUTOR"]),
            corporate_tokens: words(&["株式会社", "合同会社", "有限会社", "(株)", "㈱"]),
            heading_ban_words: words(&[
                "領収", "領収書", "レシート", "明細", "控え", "ご利用", "合計", "小計",
                "税込", "税", "No", "TEL", "電話", "日時", "日付", "時間", "売上", "レジ",
                "お買上",
            ]),
        }
    }
}

fn merchant(name: &str, category: &str) -> MerchantRule {
    MerchantRule {
        name: name.to_string(),
        category: category.to_string(),
    }
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}
