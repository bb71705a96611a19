//! Pipeline stages for PDF text extraction and metadata analysis.
//!
//! Each submodule implements one step. Only [`engine`], [`layout`] and
//! [`materialize::PdfiumImageSource`] touch pdfium; the rest work on plain
//! data and are tested without any native library.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ engine ──▶ layout ──▶ sequence ──▶ materialize ──▶ normalize ──▶ llm
//! (magic)   (pdfium)   (blocks)   (y0, x0)     (text + OCR)    (whitespace)  (fields)
//! ```
//!
//! 1. [`input`]    reject empty and non-PDF buffers before pdfium is bound
//! 2. [`engine`]   bind the pdfium library and open a document from memory
//! 3. [`layout`]   turn a page into text and image blocks with top-origin boxes
//! 4. [`sequence`] stable reading-order sort
//! 5. [`ocr`]      the `OcrEngine` seam and its tesseract backends
//! 6. [`materialize`] produce one contribution per block; failures stay local
//! 7. [`normalize`] join contributions and clean up whitespace
//! 8. [`llm`]      send the text to a chat model and parse the record back

pub mod engine;
pub mod input;
pub mod layout;
pub mod llm;
pub mod materialize;
pub mod normalize;
pub mod ocr;
pub mod sequence;
