//! Metadata extraction: extracted text → [`DocumentRecord`] via an LLM.
//!
//! The pipeline in [`crate::extract`] produces plain text; this module hands
//! that text to the configured provider and parses the fixed ten-field
//! record out of its answer. If the primary model keeps failing and a
//! fallback model is configured, the fallback gets one full retry cycle.

use crate::config::{AnalysisConfig, ExtractionConfig, DEFAULT_FALLBACK_MODEL};
use crate::error::SmartDocsError;
use crate::extract::extract_document_async;
use crate::pipeline::llm;
use crate::record::{DocumentFields, DocumentRecord};
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::sync::Arc;
use tracing::{info, warn};

/// Env var naming the provider (paired with [`MODEL_ENV`]).
pub const PROVIDER_ENV: &str = "SMARTDOCS_LLM_PROVIDER";
/// Env var naming the model (paired with [`PROVIDER_ENV`]).
pub const MODEL_ENV: &str = "SMARTDOCS_MODEL";

/// Extract the document fields from already-extracted text.
pub async fn analyze_text(
    text: &str,
    config: &AnalysisConfig,
) -> Result<DocumentFields, SmartDocsError> {
    let target = resolve_provider(config)?;
    let primary_err = match llm::request_fields(&target.provider, &target.label, text, config).await
    {
        Ok(fields) => return Ok(fields),
        Err(e @ SmartDocsError::InvalidLlmResponse { .. }) => return Err(e),
        Err(e) => e,
    };

    let Some((provider_name, model)) = target.fallback else {
        return Err(primary_err);
    };

    warn!(
        "{} failed ({}); falling back to {}/{}",
        target.label, primary_err, provider_name, model
    );
    let provider = create_provider(&provider_name, &model)?;
    llm::request_fields(&provider, &format!("{provider_name}/{model}"), text, config).await
}

/// Extract one document's text and analyse it into a record.
///
/// An extraction failure is returned as-is; the LLM is not called.
pub async fn process_document(
    name: &str,
    bytes: Vec<u8>,
    extraction: &ExtractionConfig,
    analysis: &AnalysisConfig,
) -> Result<DocumentRecord, SmartDocsError> {
    info!("Processing {}", name);
    let output = extract_document_async(bytes, extraction.clone()).await?;
    let fields = analyze_text(&output.text, analysis).await?;
    Ok(DocumentRecord::new(name, fields))
}

// ── Provider resolution ──────────────────────────────────────────────────

/// The provider to call first, and what to try if it fails.
struct ResolvedProvider {
    provider: Arc<dyn LLMProvider>,
    label: String,
    /// `(provider_name, model)` for the fallback attempt.
    fallback: Option<(String, String)>,
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. pre-built `config.provider` (no fallback: we cannot re-target it)
/// 2. `config.provider_name` + model
/// 3. [`PROVIDER_ENV`] + [`MODEL_ENV`] when both are set
/// 4. `gemini` when `GEMINI_API_KEY` or `GOOGLE_API_KEY` is set
/// 5. `ProviderFactory::from_env` auto-detection (no fallback)
fn resolve_provider(config: &AnalysisConfig) -> Result<ResolvedProvider, SmartDocsError> {
    if let Some(ref provider) = config.provider {
        return Ok(ResolvedProvider {
            provider: Arc::clone(provider),
            label: "injected provider".to_string(),
            fallback: None,
        });
    }

    let named = config
        .provider_name
        .as_ref()
        .map(|name| (name.clone(), config.primary_model().to_string()))
        .or_else(|| env_pair(PROVIDER_ENV, MODEL_ENV))
        .or_else(|| {
            non_empty_env("GEMINI_API_KEY")
                .or_else(|| non_empty_env("GOOGLE_API_KEY"))
                .map(|_| ("gemini".to_string(), config.primary_model().to_string()))
        });

    if let Some((provider_name, model)) = named {
        let provider = create_provider(&provider_name, &model)?;
        let fallback = config
            .fallback_model
            .as_ref()
            .filter(|fb| **fb != model)
            // The default fallback is a Gemini model; other providers need an explicit one.
            .filter(|fb| provider_name == "gemini" || fb.as_str() != DEFAULT_FALLBACK_MODEL)
            .map(|fb| (provider_name.clone(), fb.clone()));
        return Ok(ResolvedProvider {
            provider,
            label: format!("{provider_name}/{model}"),
            fallback,
        });
    }

    let (provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| SmartDocsError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY (or another provider key), or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(ResolvedProvider {
        provider,
        label: "auto-detected provider".to_string(),
        fallback: None,
    })
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, SmartDocsError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        SmartDocsError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_pair(provider_key: &str, model_key: &str) -> Option<(String, String)> {
    Some((non_empty_env(provider_key)?, non_empty_env(model_key)?))
}
