//! # smartdocs
//!
//! Reading-order text extraction for scanned and mixed-content PDFs, plus
//! LLM-driven metadata extraction into a fixed ten-field record.
//!
//! ## Why this crate?
//!
//! Administrative documents (oficios, resoluciones, memorandos) are often a
//! mix of digital text and embedded scans: a stamped header image above a
//! typed body, a signature block pasted in as a picture. Plain text
//! extraction drops the images; OCR of the rendered page loses the clean
//! digital text. This crate keeps both: text lines are read as-is, image
//! objects are OCR'd, and every contribution is placed in top-to-bottom,
//! left-to-right order before the pieces are joined.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF bytes
//!  │
//!  ├─ 1. Input     magic-byte check, no pdfium needed
//!  ├─ 2. Engine    bind pdfium, open from memory (optional password)
//!  ├─ 3. Layout    text lines + image objects (forms too), top-origin boxes
//!  ├─ 4. Sequence  stable sort by (y0, x0)
//!  ├─ 5. OCR       tesseract on each image block (failures contained)
//!  ├─ 6. Normalize collapse blank lines and horizontal whitespace
//!  └─ 7. Analyze   optional: LLM → DocumentFields → CSV / JSON
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use smartdocs::{extract_text, ExtractionConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bytes = std::fs::read("oficio.pdf")?;
//!     let text = extract_text(&bytes, &ExtractionConfig::default())?;
//!     println!("{text}");
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature   | Default | Description |
//! |-----------|---------|-------------|
//! | `cli`     | on      | Enables the `smartdocs` binary (clap + anyhow + tracing-subscriber + dotenvy) |
//! | `leptess` | off     | In-process Tesseract via `leptess` instead of the `tesseract` executable |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod pipeline;
pub mod prompts;
pub mod record;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze_text, process_document};
pub use config::{
    AnalysisConfig, AnalysisConfigBuilder, ExtractionConfig, ExtractionConfigBuilder, OcrBackend,
};
pub use error::{BlockError, SmartDocsError};
pub use export::{export_to_file, write_csv, write_json, ExportFormat};
pub use extract::{
    extract_document, extract_document_async, extract_document_with, extract_from_layouts,
    extract_text,
};
pub use pipeline::layout::{BoundingBox, ContentBlock, ImageRef, PageLayout, TextFragment};
pub use pipeline::materialize::ImageSource;
pub use pipeline::ocr::{OcrEngine, OcrError, TesseractCli};
pub use record::{DocumentFields, DocumentRecord, ExtractionOutput, ExtractionStats};
