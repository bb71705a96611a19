//! CLI binary for smartdocs.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig` / `AnalysisConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use smartdocs::{
    export_to_file, extract_document_async, process_document, write_json, AnalysisConfig,
    DocumentRecord, ExtractionConfig,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract reading-order text only (no API key needed)
  smartdocs --text-only oficio.pdf

  # Analyse a batch and write a spreadsheet
  smartdocs docs/*.pdf -o reporte.csv

  # JSON records on stdout
  smartdocs resolucion.pdf memorando.pdf

  # Scanned English documents, OCR mode 6
  smartdocs --lang eng --psm 6 --text-only scan.pdf

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (GOOGLE_API_KEY is accepted too)
  SMARTDOCS_LLM_PROVIDER  Provider override (gemini, openai, anthropic, ollama, ...)
  SMARTDOCS_MODEL         Model override
  PDFIUM_LIB_PATH         Directory or file of an existing libpdfium
  RUST_LOG                tracing filter, overrides --verbose/--quiet

A .env file in the working directory is loaded before flags are parsed.
"#;

/// Extract reading-order text and document metadata from PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "smartdocs",
    version,
    about = "Extract reading-order text and document metadata from PDFs",
    long_about = "Extract text from digital, scanned and mixed PDFs in reading order \
(tesseract OCR for embedded images), then ask an LLM for the document's type, number, \
institution, date, sender, recipient, reference and summary.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF files to process, in order.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Write records (.csv or .json) or text to this file instead of stdout.
    #[arg(short, long, env = "SMARTDOCS_OUTPUT")]
    output: Option<PathBuf>,

    /// Only extract text; do not call the LLM.
    #[arg(long)]
    text_only: bool,

    /// Tesseract language code(s), e.g. spa or spa+eng.
    #[arg(long, env = "SMARTDOCS_OCR_LANG", default_value = smartdocs::config::DEFAULT_OCR_LANGUAGE)]
    lang: String,

    /// Skip OCR of embedded images.
    #[arg(long, env = "SMARTDOCS_NO_OCR")]
    no_ocr: bool,

    /// Path to the tesseract executable.
    #[arg(long, env = "SMARTDOCS_TESSERACT")]
    tesseract: Option<PathBuf>,

    /// Tesseract page segmentation mode (0–13).
    #[arg(long, env = "SMARTDOCS_PSM",
          value_parser = clap::value_parser!(u32).range(0..=13))]
    psm: Option<u32>,

    /// Path to libpdfium (file or directory).
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "SMARTDOCS_PASSWORD")]
    password: Option<String>,

    /// LLM model ID.
    #[arg(long)]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama, ...
    #[arg(long)]
    provider: Option<String>,

    /// Model to try when the primary model keeps failing ("none" disables).
    #[arg(long, env = "SMARTDOCS_FALLBACK_MODEL")]
    fallback_model: Option<String>,

    /// Path to a text file containing a custom instruction prompt.
    #[arg(long, env = "SMARTDOCS_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Retries per document on LLM failure.
    #[arg(long, env = "SMARTDOCS_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// Per-call LLM timeout in seconds.
    #[arg(long, env = "SMARTDOCS_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SMARTDOCS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "SMARTDOCS_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Missing .env is fine.
    let _ = dotenvy::dotenv();
    if std::env::var_os("GEMINI_API_KEY").is_none() {
        if let Some(key) = std::env::var_os("GOOGLE_API_KEY") {
            std::env::set_var("GEMINI_API_KEY", key);
        }
    }

    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let extraction = build_extraction_config(&cli)?;

    let (ok, failed) = if cli.text_only {
        run_text_only(&cli, &extraction).await?
    } else {
        let analysis = build_analysis_config(&cli).await?;
        run_analysis(&cli, &extraction, &analysis).await?
    };

    if !cli.quiet {
        eprintln!(
            "{} {}/{} documents processed",
            if failed == 0 { green("✔") } else { red("⚠") },
            ok,
            ok + failed
        );
    }

    if ok == 0 {
        anyhow::bail!("All {} documents failed", failed);
    }
    Ok(())
}

/// Extract text from every file; print it or write it to `--output`.
async fn run_text_only(cli: &Cli, config: &ExtractionConfig) -> Result<(usize, usize)> {
    let multiple = cli.files.len() > 1;
    let mut combined = String::new();
    let mut failed = 0;

    for path in &cli.files {
        let name = display_name(path);
        let result = match tokio::fs::read(path).await {
            Ok(bytes) => extract_document_async(bytes, config.clone())
                .await
                .map_err(anyhow::Error::from),
            Err(e) => Err(anyhow::Error::from(e).context(format!("Failed to read {:?}", path))),
        };

        match result {
            Ok(output) => {
                if multiple {
                    combined.push_str(&format!("==> {name} <==\n"));
                }
                combined.push_str(&output.text);
                if !output.text.ends_with('\n') {
                    combined.push('\n');
                }
                if !cli.quiet {
                    eprintln!(
                        "  {} {}  {}",
                        green("✓"),
                        name,
                        dim(&format!(
                            "{} pages, {} OCR, {} failed blocks, {}ms",
                            output.stats.page_count,
                            output.stats.ocr_contributions,
                            output.stats.failed_blocks,
                            output.stats.duration_ms
                        ))
                    );
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("  {} {}  {}", red("✗"), name, red(&format!("{e:#}")));
            }
        }
    }

    if let Some(ref output_path) = cli.output {
        tokio::fs::write(output_path, &combined)
            .await
            .with_context(|| format!("Failed to write {:?}", output_path))?;
    } else {
        io::stdout()
            .lock()
            .write_all(combined.as_bytes())
            .context("Failed to write to stdout")?;
    }

    Ok((cli.files.len() - failed, failed))
}

/// Analyse every file; export the successful records.
async fn run_analysis(
    cli: &Cli,
    extraction: &ExtractionConfig,
    analysis: &AnalysisConfig,
) -> Result<(usize, usize)> {
    let mut records: Vec<DocumentRecord> = Vec::new();
    let mut failed = 0;

    for path in &cli.files {
        let name = display_name(path);
        let result = match tokio::fs::read(path).await {
            Ok(bytes) => process_document(&name, bytes, extraction, analysis)
                .await
                .map_err(anyhow::Error::from),
            Err(e) => Err(anyhow::Error::from(e).context(format!("Failed to read {:?}", path))),
        };

        match result {
            Ok(record) => {
                if !cli.quiet {
                    eprintln!(
                        "  {} {}  {}",
                        green("✓"),
                        name,
                        dim(&format!(
                            "{} {}",
                            record.fields.tipo_documento, record.fields.numero_documento
                        ))
                    );
                }
                records.push(record);
            }
            Err(e) => {
                failed += 1;
                eprintln!("  {} {}  {}", red("✗"), name, red(&format!("{e:#}")));
            }
        }
    }

    if let Some(ref output_path) = cli.output {
        export_to_file(&records, output_path).context("Export failed")?;
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        write_json(&records, &mut handle).context("Failed to serialise records")?;
        handle.write_all(b"\n").ok();
    }

    Ok((records.len(), failed))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Map CLI args to `ExtractionConfig`.
fn build_extraction_config(cli: &Cli) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .ocr_language(cli.lang.clone())
        .ocr_enabled(!cli.no_ocr);

    if let Some(ref path) = cli.tesseract {
        builder = builder.tesseract_path(path.clone());
    }
    if let Some(psm) = cli.psm {
        builder = builder.page_segmentation_mode(psm);
    }
    if let Some(ref path) = cli.pdfium_lib {
        builder = builder.pdfium_library_path(path.clone());
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }

    builder.build().context("Invalid extraction configuration")
}

/// Map CLI args to `AnalysisConfig`.
async fn build_analysis_config(cli: &Cli) -> Result<AnalysisConfig> {
    let mut builder = AnalysisConfig::builder()
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref fallback) = cli.fallback_model {
        let fallback = (!fallback.eq_ignore_ascii_case("none")).then(|| fallback.clone());
        builder = builder.fallback_model(fallback);
    }

    builder.build().context("Invalid analysis configuration")
}
