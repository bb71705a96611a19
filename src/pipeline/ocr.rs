//! OCR engines: turn a decoded image into recognised text.
//!
//! The pipeline depends only on the [`OcrEngine`] trait. Two Tesseract
//! backends are provided:
//!
//! * [`TesseractCli`] (default) spawns the `tesseract` executable, piping a
//!   PNG on stdin and reading UTF-8 text from stdout. Needs nothing at build
//!   time.
//! * `LepTessEngine` (feature `leptess`) calls libtesseract in-process.
//!
//! Both receive the image re-encoded as a lossless PNG.

use crate::config::{ExtractionConfig, OcrBackend};
use image::DynamicImage;
use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::debug;

/// Errors raised by an OCR backend for one image.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Failed to encode image for OCR: {0}")]
    EncodeFailed(String),

    #[error("Recognition failed: {0}")]
    RecognitionFailed(String),
}

/// A recognition engine configured for a fixed language.
///
/// Implementations must be safe to share across threads; the pipeline
/// itself calls them sequentially.
pub trait OcrEngine: Send + Sync {
    /// Recognise the text in `image`. Blank output is not an error.
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;

    /// The Tesseract language code(s) this engine was configured with.
    fn language(&self) -> &str;
}

/// Build the engine selected by `config.ocr_backend`.
pub fn engine_from_config(config: &ExtractionConfig) -> Box<dyn OcrEngine> {
    match config.ocr_backend {
        OcrBackend::TesseractCli => Box::new(TesseractCli::from_config(config)),
        #[cfg(feature = "leptess")]
        OcrBackend::LepTess => Box::new(LepTessEngine::from_config(config)),
    }
}

/// Encode an image as PNG bytes.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, OcrError> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| OcrError::EncodeFailed(e.to_string()))?;
    debug!(
        "Encoded {}x{} image → {} bytes PNG",
        image.width(),
        image.height(),
        buf.len()
    );
    Ok(buf)
}

// ── tesseract executable ─────────────────────────────────────────────────

/// Runs `tesseract stdin stdout -l <lang>` once per image.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    binary: PathBuf,
    language: String,
    psm: Option<u32>,
}

impl TesseractCli {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            language: language.into(),
            psm: None,
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            binary: config
                .tesseract_path
                .clone()
                .unwrap_or_else(|| PathBuf::from("tesseract")),
            language: config.ocr_language.clone(),
            psm: config.page_segmentation_mode,
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Arguments passed after the executable name.
    fn args(&self) -> Vec<String> {
        let mut args = vec![
            "stdin".to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            self.language.clone(),
        ];
        if let Some(psm) = self.psm {
            args.push("--psm".to_string());
            args.push(psm.to_string());
        }
        args
    }
}

impl OcrEngine for TesseractCli {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let png = encode_png(image)?;

        let mut child = Command::new(&self.binary)
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                OcrError::EngineUnavailable(format!(
                    "cannot run '{}': {}. Install tesseract-ocr with the '{}' language data",
                    self.binary.display(),
                    e,
                    self.language
                ))
            })?;

        // tesseract reads the whole image before writing anything, so
        // writing stdin to completion first cannot deadlock. The pipe is
        // closed at the end of the match arm.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(&png),
            None => Ok(()),
        };

        // Reap the child even when the write failed; a process that exited
        // early is the usual cause of a broken pipe.
        let output = child
            .wait_with_output()
            .map_err(|e| OcrError::RecognitionFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::RecognitionFailed(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        written.map_err(|e| OcrError::RecognitionFailed(format!("writing image: {e}")))?;

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn language(&self) -> &str {
        &self.language
    }
}

// ── libtesseract via leptess ─────────────────────────────────────────────

/// In-process Tesseract. A fresh `LepTess` handle is created per image
/// since the handle is neither `Send` nor `Sync`.
#[cfg(feature = "leptess")]
#[derive(Debug, Clone)]
pub struct LepTessEngine {
    language: String,
    psm: Option<u32>,
}

#[cfg(feature = "leptess")]
impl LepTessEngine {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            psm: None,
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            language: config.ocr_language.clone(),
            psm: config.page_segmentation_mode,
        }
    }
}

#[cfg(feature = "leptess")]
impl OcrEngine for LepTessEngine {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        use leptess::{LepTess, Variable};

        let mut lt = LepTess::new(None, &self.language).map_err(|e| {
            OcrError::EngineUnavailable(format!(
                "Failed to initialize Tesseract with language '{}': {}",
                self.language, e
            ))
        })?;

        if let Some(psm) = self.psm {
            lt.set_variable(Variable::TesseditPagesegMode, &psm.to_string())
                .map_err(|e| OcrError::EngineUnavailable(format!("Failed to set PSM: {}", e)))?;
        }

        let png = encode_png(image)?;
        lt.set_image_from_mem(&png)
            .map_err(|e| OcrError::RecognitionFailed(format!("Failed to set image: {}", e)))?;

        lt.get_utf8_text()
            .map_err(|e| OcrError::RecognitionFailed(e.to_string()))
    }

    fn language(&self) -> &str {
        &self.language
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn blank() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 255])))
    }

    #[test]
    fn encode_png_produces_png_signature() {
        let png = encode_png(&blank()).expect("encode should succeed");
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn cli_args_include_language_and_psm() {
        let config = ExtractionConfig::builder()
            .ocr_language("spa+eng")
            .page_segmentation_mode(6)
            .build()
            .unwrap();
        let engine = TesseractCli::from_config(&config);
        assert_eq!(
            engine.args(),
            ["stdin", "stdout", "-l", "spa+eng", "--psm", "6"]
        );
        assert_eq!(engine.language(), "spa+eng");
    }

    #[test]
    fn cli_args_without_psm() {
        assert_eq!(TesseractCli::new("spa").args(), ["stdin", "stdout", "-l", "spa"]);
    }

    #[test]
    fn missing_binary_is_engine_unavailable() {
        let engine = TesseractCli::new("spa").with_binary("/nonexistent/tesseract-xyz");
        let err = engine.recognize(&blank()).unwrap_err();
        assert!(matches!(err, OcrError::EngineUnavailable(_)), "got {err:?}");
    }

    #[cfg(unix)]
    #[test]
    fn early_exit_reports_status_and_stderr() {
        // `sh stdin stdout ...` fails to open a script named "stdin" and
        // exits without reading, so a large image hits a closed pipe.
        let noisy = DynamicImage::ImageRgba8(RgbaImage::from_fn(1024, 1024, |x, y| {
            Rgba([(x * 7 + y * 13) as u8, (x * y) as u8, (x ^ y) as u8, 255])
        }));
        let engine = TesseractCli::new("spa").with_binary("/bin/sh");

        let message = match engine.recognize(&noisy).unwrap_err() {
            OcrError::RecognitionFailed(message) => message,
            other => panic!("expected RecognitionFailed, got {other:?}"),
        };
        assert!(message.contains("exited with"), "got {message:?}");
        assert!(message.contains("stdin"), "stderr missing from {message:?}");
    }

    #[test]
    fn engine_from_default_config_uses_language() {
        let engine = engine_from_config(&ExtractionConfig::default());
        assert_eq!(engine.language(), "spa");
    }
}
