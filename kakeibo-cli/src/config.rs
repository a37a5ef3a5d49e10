use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use kakeibo_core::{CategorySet, Dictionaries};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub gemini: GeminiSection,
    pub vision: VisionSection,
    pub notion: NotionSection,
    pub tables: TablesSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiSection {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionSection {
    pub api_key: Option<String>,
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionSection {
    pub api_key: Option<String>,
    pub receipts_db_id: Option<String>,
    pub items_db_id: Option<String>,
    pub base_url: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablesSection {
    /// Optional TOML file replacing the built-in Japanese dictionaries and
    /// category set.
    pub path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini: GeminiSection {
                api_key: None,
                model: "gemini-2.5-flash".to_string(),
                base_url: "https://generativelanguage.googleapis.com".to_string(),
            },
            vision: VisionSection {
                api_key: None,
                base_url: "https://vision.googleapis.com".to_string(),
            },
            notion: NotionSection {
                api_key: None,
                receipts_db_id: None,
                items_db_id: None,
                base_url: "https://api.notion.com".to_string(),
                version: "2022-06-28".to_string(),
            },
            tables: TablesSection { path: None },
        }
    }
}

pub fn ensure_kakeibo_home() -> Result<PathBuf> {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .context("HOME not set")?;
    let dir = home.join(".kakeibo");
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_kakeibo_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    let mut cfg = if p.exists() {
        let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
        toml::from_str(&s).context("parse config.toml")?
    } else {
        Config::default()
    };
    apply_env(&mut cfg);
    Ok(cfg)
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

/// Secrets come from the environment when present, overriding the file.
fn apply_env(cfg: &mut Config) {
    if let Ok(v) = std::env::var("GEMINI_API_KEY") {
        cfg.gemini.api_key = Some(v);
    }
    if let Ok(v) = std::env::var("VISION_API_KEY") {
        cfg.vision.api_key = Some(v);
    }
    if let Ok(v) = std::env::var("NOTION_API_KEY") {
        cfg.notion.api_key = Some(v);
    }
    if let Ok(v) = std::env::var("NOTION_RECEIPTS_DB_ID") {
        cfg.notion.receipts_db_id = Some(v);
    }
    if let Ok(v) = std::env::var("NOTION_ITEMS_DB_ID") {
        cfg.notion.items_db_id = Some(v);
    }
}

/// Override file for the lookup tables: the built-in dictionaries plus an
/// optional custom category list.
#[derive(Debug, Deserialize)]
struct TablesFile {
    categories: Option<Vec<String>>,
    #[serde(flatten)]
    dictionaries: Dictionaries,
}

/// Load the injected tables: built-in Japanese defaults, or the file named
/// in `[tables] path`.
pub fn load_tables(cfg: &Config) -> Result<(Dictionaries, CategorySet)> {
    let Some(path) = &cfg.tables.path else {
        return Ok((Dictionaries::default_ja(), CategorySet::default_ja()));
    };
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let file: TablesFile = toml::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
    let categories = match file.categories {
        Some(labels) => CategorySet::new(labels)?,
        None => CategorySet::default_ja(),
    };
    Ok((file.dictionaries, categories))
}
