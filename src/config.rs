//! Configuration types for extraction and metadata analysis.
//!
//! Two structs, one per stage boundary:
//!
//! * [`ExtractionConfig`]: everything the hybrid text pipeline needs
//!   (OCR language and backend, pdfium location, document password).
//! * [`AnalysisConfig`]: everything the LLM metadata call needs (provider,
//!   model, fallback model, retries, timeout).
//!
//! Both are built through a builder so callers set only what they care about
//! and rely on documented defaults for the rest.

use crate::error::SmartDocsError;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default Tesseract recognition language (Spanish).
pub const DEFAULT_OCR_LANGUAGE: &str = "spa";

/// Default primary model for metadata extraction.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default model tried once the primary model has exhausted its retries.
pub const DEFAULT_FALLBACK_MODEL: &str = "gemini-1.5-flash";

// ── Extraction ───────────────────────────────────────────────────────────

/// Configuration for the hybrid (native text + OCR) extraction pipeline.
///
/// # Example
/// ```rust
/// use smartdocs::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .ocr_language("spa+eng")
///     .build()
///     .unwrap();
/// assert_eq!(config.ocr_language, "spa+eng");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Tesseract language code(s), e.g. `spa` or `spa+eng`. Default: `spa`.
    pub ocr_language: String,

    /// Run OCR on embedded images. Default: true.
    ///
    /// When false, image blocks are still scanned and ordered but contribute
    /// no text.
    pub ocr_enabled: bool,

    /// Which OCR engine to drive. Default: [`OcrBackend::TesseractCli`].
    pub ocr_backend: OcrBackend,

    /// Path to the `tesseract` executable. Default: `tesseract` on `PATH`.
    pub tesseract_path: Option<PathBuf>,

    /// Tesseract page segmentation mode (`--psm`). Default: engine default.
    pub page_segmentation_mode: Option<u32>,

    /// PDF user password for encrypted documents.
    #[serde(skip_serializing)]
    pub password: Option<String>,

    /// Explicit pdfium shared-library path. Falls back to `PDFIUM_LIB_PATH`,
    /// the working directory, then the system library search path.
    pub pdfium_library_path: Option<PathBuf>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            ocr_language: DEFAULT_OCR_LANGUAGE.to_string(),
            ocr_enabled: true,
            ocr_backend: OcrBackend::default(),
            tesseract_path: None,
            page_segmentation_mode: None,
            password: None,
            pdfium_library_path: None,
        }
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn ocr_enabled(mut self, v: bool) -> Self {
        self.config.ocr_enabled = v;
        self
    }

    pub fn ocr_backend(mut self, backend: OcrBackend) -> Self {
        self.config.ocr_backend = backend;
        self
    }

    pub fn tesseract_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tesseract_path = Some(path.into());
        self
    }

    pub fn page_segmentation_mode(mut self, psm: u32) -> Self {
        self.config.page_segmentation_mode = Some(psm);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, SmartDocsError> {
        let c = &self.config;
        validate_language(&c.ocr_language)?;
        if let Some(psm) = c.page_segmentation_mode {
            if psm > 13 {
                return Err(SmartDocsError::InvalidConfig(format!(
                    "Page segmentation mode must be 0–13, got {psm}"
                )));
            }
        }
        Ok(self.config)
    }
}

/// Check Tesseract language codes such as `spa` or `spa+eng`.
pub fn validate_language(lang: &str) -> Result<(), SmartDocsError> {
    if lang.is_empty() {
        return Err(SmartDocsError::InvalidConfig(
            "OCR language must not be empty".into(),
        ));
    }
    let valid = lang
        .split('+')
        .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    if !valid {
        return Err(SmartDocsError::InvalidConfig(format!(
            "Invalid OCR language '{lang}': expected codes like 'spa' or 'spa+eng'"
        )));
    }
    Ok(())
}

/// OCR engine used for image blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OcrBackend {
    /// Spawn the `tesseract` executable per image, piping a PNG on stdin. (default)
    #[default]
    TesseractCli,
    /// Call libtesseract in-process through `leptess`.
    #[cfg(feature = "leptess")]
    LepTess,
}

// ── Analysis ─────────────────────────────────────────────────────────────

/// Configuration for the LLM metadata-extraction call.
#[derive(Clone)]
pub struct AnalysisConfig {
    /// LLM provider name (e.g. "gemini", "openai", "ollama").
    /// If None (and no `provider`), resolved from the environment.
    pub provider_name: Option<String>,

    /// Primary model identifier. Default: `gemini-2.5-flash`.
    pub model: Option<String>,

    /// Model tried after the primary exhausts its retries. Default: `gemini-1.5-flash`.
    ///
    /// Ignored when a pre-built `provider` is injected.
    pub fallback_model: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.1.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate. Default: 2048.
    pub max_tokens: usize,

    /// Maximum retry attempts per model on a failed call. Default: 2.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Custom instruction template. If None, uses the built-in one.
    pub system_prompt: Option<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            provider_name: None,
            model: None,
            fallback_model: Some(DEFAULT_FALLBACK_MODEL.to_string()),
            provider: None,
            temperature: 0.1,
            max_tokens: 2048,
            max_retries: 2,
            retry_backoff_ms: 500,
            api_timeout_secs: 60,
            system_prompt: None,
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("provider_name", &self.provider_name)
            .field("model", &self.model)
            .field("fallback_model", &self.fallback_model)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .finish()
    }
}

impl AnalysisConfig {
    /// Create a new builder for `AnalysisConfig`.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }

    /// The primary model, falling back to [`DEFAULT_MODEL`].
    pub fn primary_model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`AnalysisConfig`].
#[derive(Debug)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn fallback_model(mut self, model: Option<String>) -> Self {
        self.config.fallback_model = model;
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, SmartDocsError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(SmartDocsError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(SmartDocsError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}
