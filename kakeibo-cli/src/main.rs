use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Parser, Subcommand};

use kakeibo_classify::{
    Classifier, HeaderResolver, MemoryStore, Oracle, OracleRequest, Pipeline, ReceiptOutcome,
    ReceiptStore, extract_items,
};

mod config;
mod gemini;
mod notion;
mod runtime;
mod vision;

#[derive(Parser, Debug)]
#[command(name = "kakeibo", version, about = "Receipt interpretation & classification CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process one receipt end to end: OCR → header → items → classify → store
    Process {
        /// Receipt image, sent to the Vision OCR collaborator
        #[arg(long, conflicts_with = "text")]
        image: Option<PathBuf>,

        /// Pre-extracted OCR text (skips the Vision call)
        #[arg(long)]
        text: Option<PathBuf>,

        /// Upstream message id; feeds the dedup identity
        #[arg(long, default_value = "local")]
        message_id: String,

        /// Keep records in memory instead of writing to Notion
        #[arg(long)]
        dry_run: bool,
    },

    /// Resolve and print the receipt header for an OCR text file
    Header {
        #[arg(long)]
        text: PathBuf,
    },

    /// Extract and print line items for an OCR text file
    Items {
        #[arg(long)]
        text: PathBuf,
    },

    /// Classify a single item
    Classify {
        #[arg(long, default_value = "")]
        store: String,

        #[arg(long)]
        item: String,

        #[arg(long)]
        price: Option<f64>,
    },

    /// Config management
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default ~/.kakeibo/config.toml
    Init,
}

/// Stand-in oracle when no API key is configured: rule-tier classification
/// and local extraction still work, anything needing the oracle fails with
/// a pointer to the config.
struct UnconfiguredOracle;

impl Oracle for UnconfiguredOracle {
    fn generate(&self, _request: &OracleRequest) -> Result<String> {
        bail!("gemini api key not configured; set GEMINI_API_KEY or run: kakeibo config init")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Command::Process {
            image,
            text,
            message_id,
            dry_run,
        } => {
            process(image, text, &message_id, dry_run)?;
        }

        Command::Header { text } => {
            let cfg = config::load_config()?;
            let (dicts, _categories) = config::load_tables(&cfg)?;
            let ocr_text = read_text(&text)?;
            let oracle = make_oracle(&cfg);
            let resolver = HeaderResolver::new(&dicts, oracle.as_ref());
            let header = resolver.resolve(&ocr_text, "", Local::now().date_naive())?;
            println!("{}", header.label());
        }

        Command::Items { text } => {
            let cfg = config::load_config()?;
            let ocr_text = read_text(&text)?;
            let oracle = make_oracle(&cfg);
            let items = extract_items(&ocr_text, oracle.as_ref())?;
            if items.is_empty() {
                println!("No line items extracted; retry with a clearer image.");
                return Ok(());
            }
            for item in &items {
                println!("{} | {}", item.raw_name, item.raw_price_text);
            }
        }

        Command::Classify { store, item, price } => {
            let cfg = config::load_config()?;
            let (dicts, categories) = config::load_tables(&cfg)?;
            let oracle = make_oracle(&cfg);
            let classifier = Classifier::new(&dicts, &categories, oracle.as_ref());
            let hit = classifier.classify(&store, &item, price)?;
            println!(
                "{} | confidence {:.2} | {}",
                hit.category,
                hit.confidence,
                hit.provenance.as_str()
            );
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
        },
    }

    Ok(())
}

fn process(
    image: Option<PathBuf>,
    text: Option<PathBuf>,
    message_id: &str,
    dry_run: bool,
) -> Result<()> {
    let cfg = config::load_config()?;
    let (dicts, categories) = config::load_tables(&cfg)?;

    let (ocr_text, brand_hint) = match (&image, &text) {
        (_, Some(path)) => (read_text(path)?, String::new()),
        (Some(path), None) => {
            let bytes =
                fs::read(path).with_context(|| format!("read image {}", path.display()))?;
            let client = vision::VisionClient::from_config(&cfg.vision)?;
            let ocr_text = client.ocr_text(&bytes).context("vision ocr")?;
            let brand_hint = client.logo_hint(&bytes, &dicts);
            (ocr_text, brand_hint)
        }
        (None, None) => bail!("pass --image <path> or --text <path>"),
    };

    let oracle = make_oracle(&cfg);
    let today = Local::now().date_naive();
    let pipeline = |store: &dyn ReceiptStore| -> Result<ReceiptOutcome> {
        Pipeline {
            dicts: &dicts,
            categories: &categories,
            oracle: oracle.as_ref(),
            store,
            today,
        }
        .process(&ocr_text, &brand_hint, message_id)
    };

    let outcome = if dry_run {
        pipeline(&MemoryStore::new())?
    } else {
        pipeline(&notion::NotionStore::from_config(&cfg.notion)?)?
    };

    print_outcome(&outcome, dry_run);
    Ok(())
}

fn print_outcome(outcome: &ReceiptOutcome, dry_run: bool) {
    println!("{}", outcome.header.label());
    println!("Identity: {}", outcome.identity);
    if dry_run {
        println!("(dry run: nothing written to Notion)");
    }

    if outcome.is_empty() {
        println!("\nNo line items extracted; retry with a clearer image.");
        return;
    }

    println!();
    for item in &outcome.items {
        let price = item
            .price
            .map(|p| format!("¥{p}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "- {} | {} | {} | confidence {:.2} | {}",
            item.name,
            price,
            item.category,
            item.confidence,
            item.provenance.as_str()
        );
    }

    println!(
        "\nCreated: {} (low confidence: {} / failed: {})",
        outcome.created, outcome.low_confidence, outcome.failed
    );
}

fn make_oracle(cfg: &config::Config) -> Box<dyn Oracle> {
    match gemini::GeminiOracle::from_config(&cfg.gemini) {
        Ok(oracle) => Box::new(oracle),
        Err(_) => Box::new(UnconfiguredOracle),
    }
}

fn read_text(path: &PathBuf) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}
