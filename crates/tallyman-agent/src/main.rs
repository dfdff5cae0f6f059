//! Tallyman Agent CLI
//!
//! Runs one ingestion pass: mailbox snapshot in, CSV table and labels out.

use std::env;
use std::process;
use tallyman_agent::{
    AgentConfig, AgentError, AgentSettings, ConsoleNotifier, Coordinator, JsonMailbox,
};
use tallyman_extractor::{ExtractorConfig, RecordExtractor};
use tallyman_llm::GeminiProvider;
use tallyman_pipeline::{IngestionPipeline, PipelineConfig};
use tallyman_store::CsvStore;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), AgentError> {
    let args: Vec<String> = env::args().collect();

    let mut settings_path = None;
    let mut mailbox_path = None;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--settings" if i + 1 < args.len() => {
                settings_path = Some(args[i + 1].clone());
                i += 2;
            }
            "--mailbox" if i + 1 < args.len() => {
                mailbox_path = Some(args[i + 1].clone());
                i += 2;
            }
            "--help" => {
                print_help();
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_help();
                process::exit(2);
            }
        }
    }

    let Some(mailbox_path) = mailbox_path else {
        eprintln!("A mailbox snapshot is required.");
        print_help();
        process::exit(2);
    };

    let settings = match settings_path {
        Some(path) => AgentSettings::from_file(path)?,
        None => AgentSettings::default(),
    };

    // Fail fast on missing secrets, before any candidate is fetched
    let config = AgentConfig::from_env_with_settings(settings)?;
    let rules = config.load_rules()?;

    let provider = GeminiProvider::with_endpoint(
        &config.settings.endpoint,
        &config.api_key,
        &config.settings.model,
    );
    let extractor = RecordExtractor::new(provider, rules, ExtractorConfig::default());

    let store = CsvStore::open(&config.sheet_id, &config.sheet_name)
        .map_err(|e| AgentError::Store(e.to_string()))?;
    let mailbox =
        JsonMailbox::from_file(&mailbox_path).map_err(|e| AgentError::Mailbox(e.to_string()))?;
    let pipeline = IngestionPipeline::new(PipelineConfig {
        throttle_secs: config.settings.throttle_secs,
    });

    let query = config.mailbox_query();
    let processed_label = config.processed_label.clone();
    let mut coordinator = Coordinator::new(
        mailbox,
        store,
        extractor,
        ConsoleNotifier,
        pipeline,
        query,
        processed_label,
    );

    let summary = coordinator.execute()?;
    println!(
        "Processed {} new transaction(s); {} thread(s) left for retry.",
        summary.processed_count, summary.failed_threads
    );

    Ok(())
}

fn print_help() {
    println!("Tallyman - bank-notification ingestion agent");
    println!();
    println!("USAGE:");
    println!("    tallyman --mailbox <snapshot.json> [--settings <settings.toml>]");
    println!();
    println!("OPTIONS:");
    println!("    --mailbox <file>     Mailbox snapshot to ingest from (labels are written back)");
    println!("    --settings <file>    Load tunables and the mailbox filter from TOML");
    println!("    --help               Print this help message");
    println!();
    println!("ENVIRONMENT (all required):");
    println!("    GEMINI_API_KEY       Classification service API key");
    println!("    SHEET_ID             Directory holding the expense table");
    println!("    SHEET_NAME           Table name (file stem of the CSV)");
    println!("    PROCESSED_LABEL      Label applied to fully ingested threads");
}
