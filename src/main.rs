use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use gemini_ocr::application::{ConnectionReport, GenerationResponse};
use gemini_ocr::settings::ConfigManager;
use gemini_ocr::{build_backend_response, build_environment, init_tracing, resolve_data_dir};

/// OCR and question answering through Gemini, plus local sentence embeddings.
///
/// # Environment Variables
///
/// - `GEMINI_API_KEY`: API key (required for `answer`, `ocr`, `embed`, `verify`)
/// - `GEMINI_MODEL` / `GEMINI_VERIFY_MODEL`: override the configured models
/// - `GEMINI_OCR_LOG`: logging level (trace, debug, info, warn, error)
/// - `GEMINI_OCR_DATA_DIR`: override the configuration directory
#[derive(Debug, Parser)]
#[command(name = "gemini-ocr", version, about)]
struct Cli {
    /// Print machine-readable JSON instead of plain text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Send a free-form prompt to the model.
    Answer {
        prompt: String,
        #[arg(long, default_value = "English")]
        language: String,
    },
    /// Transcribe the text in an image.
    Ocr {
        image: PathBuf,
        #[arg(long, default_value = "English")]
        language: String,
    },
    /// Embed one text (single vector) or several (list of vectors).
    Embed {
        #[arg(required = true)]
        texts: Vec<String>,
    },
    /// Check that the API is reachable with the configured key.
    Verify,
    /// List the embedding backends compiled into this binary.
    Backends,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("[gemini-ocr] {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let json = cli.json;
    match cli.command {
        Commands::Answer { prompt, language } => {
            let handles = build_environment()?;
            let outcome = handles.client.answer(&prompt, &language)?;
            let model = handles.client.config().model.clone();
            emit(json, &GenerationResponse::new(model, language, outcome), |r| {
                r.text.clone()
            })
        }
        Commands::Ocr { image, language } => {
            let handles = build_environment()?;
            let outcome = handles.client.extract_text(&image, &language)?;
            let model = handles.client.config().model.clone();
            emit(json, &GenerationResponse::new(model, language, outcome), |r| {
                r.text.clone()
            })
        }
        Commands::Embed { mut texts } => {
            let handles = build_environment()?;
            let embeddings = if texts.len() == 1 {
                handles.client.get_embeddings(texts.remove(0))
            } else {
                handles.client.get_embeddings(texts)
            };
            let rendered = serde_json::to_string(&embeddings)?;
            println!("{rendered}");
            Ok(())
        }
        Commands::Verify => {
            let handles = build_environment()?;
            let report = ConnectionReport {
                model: handles.client.config().verify_model.clone(),
                status: handles.client.verify_connection(),
            };
            emit(json, &report, |r| r.status.to_string())
        }
        Commands::Backends => {
            let config = load_config()?;
            let response = build_backend_response(&config.current().embedding, None);
            emit(json, &response, |r| {
                r.options
                    .iter()
                    .map(|opt| {
                        let marker = if opt.id == r.active { "*" } else { " " };
                        format!("{marker} {:<10} {:<40} {}", opt.id, opt.model, opt.label)
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
    }
}

fn load_config() -> Result<ConfigManager> {
    let data_dir = resolve_data_dir()?;
    ConfigManager::load(&data_dir).context("failed to load config file")
}

fn emit<T: Serialize>(json: bool, value: &T, plain: impl FnOnce(&T) -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", plain(value));
    }
    Ok(())
}
