//! LLM interaction: send document text, parse the JSON record back.
//!
//! All prompt text lives in [`crate::prompts`]; this module only builds
//! the messages, drives the retry loop and cleans up the response.
//!
//! ## Retry Strategy
//!
//! Transport errors and timeouts are retried with exponential backoff
//! (`retry_backoff_ms * 2^attempt`). A response that arrives but does not
//! parse is returned immediately: asking the same model again for the same
//! text rarely changes its formatting.

use crate::config::AnalysisConfig;
use crate::error::SmartDocsError;
use crate::prompts::{document_message, DEFAULT_EXTRACTION_PROMPT};
use crate::record::DocumentFields;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// Ask `provider` for the document fields of `text`.
///
/// `label` names the provider/model in log lines.
pub async fn request_fields(
    provider: &Arc<dyn LLMProvider>,
    label: &str,
    text: &str,
    config: &AnalysisConfig,
) -> Result<DocumentFields, SmartDocsError> {
    let start = Instant::now();
    let system_prompt = config
        .system_prompt
        .as_deref()
        .unwrap_or(DEFAULT_EXTRACTION_PROMPT);

    let messages = vec![
        ChatMessage::system(system_prompt),
        ChatMessage::user(document_message(text)),
    ];
    let options = build_options(config);
    let call_timeout = Duration::from_secs(config.api_timeout_secs);

    let mut last_err = SmartDocsError::LlmApiError {
        attempts: 0,
        message: "no attempt made".to_string(),
    };

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config.retry_backoff_ms * 2u64.pow(attempt - 1);
            warn!(
                "{}: retry {}/{} after {}ms",
                label, attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        match timeout(call_timeout, provider.chat(&messages, Some(&options))).await {
            Ok(Ok(response)) => {
                debug!(
                    "{}: {} input tokens, {} output tokens, {:?}",
                    label,
                    response.prompt_tokens,
                    response.completion_tokens,
                    start.elapsed()
                );
                return parse_fields(&response.content);
            }
            Ok(Err(e)) => {
                warn!("{}: attempt {} failed: {}", label, attempt + 1, e);
                last_err = SmartDocsError::LlmApiError {
                    attempts: attempt + 1,
                    message: e.to_string(),
                };
            }
            Err(_) => {
                warn!(
                    "{}: attempt {} timed out after {}s",
                    label,
                    attempt + 1,
                    config.api_timeout_secs
                );
                last_err = SmartDocsError::ApiTimeout {
                    secs: config.api_timeout_secs,
                };
            }
        }
    }

    Err(last_err)
}

/// Build `CompletionOptions` from the analysis config.
fn build_options(config: &AnalysisConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// Parse a model response into [`DocumentFields`].
///
/// Accepts the object bare, wrapped in ```` ```json ```` fences, or with
/// prose around it.
pub fn parse_fields(raw: &str) -> Result<DocumentFields, SmartDocsError> {
    let cleaned = raw.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    let object = match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(open), Some(close)) if open < close => &cleaned[open..=close],
        _ => {
            return Err(SmartDocsError::InvalidLlmResponse {
                detail: format!("no JSON object in response: {:?}", truncate(cleaned, 120)),
            })
        }
    };

    serde_json::from_str(object).map_err(|e| SmartDocsError::InvalidLlmResponse {
        detail: e.to_string(),
    })
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_defaults() {
        let opts = build_options(&AnalysisConfig::default());
        assert_eq!(opts.temperature, Some(0.1));
        assert_eq!(opts.max_tokens, Some(2048));
    }

    #[test]
    fn parse_bare_object() {
        let f = parse_fields(r#"{"tipo_documento":"Oficio","numero_documento":"1"}"#).unwrap();
        assert_eq!(f.tipo_documento, "Oficio");
        assert_eq!(f.numero_documento, "1");
    }

    #[test]
    fn parse_fenced_object() {
        let raw = "```json\n{\"ciudad\": \"Lima\", \"fecha\": \"10/01/2024\"}\n```";
        let f = parse_fields(raw).unwrap();
        assert_eq!(f.ciudad, "Lima");
        assert_eq!(f.fecha, "10/01/2024");
    }

    #[test]
    fn parse_object_with_surrounding_prose() {
        let raw = "Aquí está el resultado:\n{\"referencia\": \"(15/08/2024)\"}\nSaludos.";
        assert_eq!(parse_fields(raw).unwrap().referencia, "(15/08/2024)");
    }

    #[test]
    fn reject_non_json() {
        let err = parse_fields("Lo siento, no puedo ayudar.").unwrap_err();
        assert!(matches!(err, SmartDocsError::InvalidLlmResponse { .. }));
    }

    #[test]
    fn reject_array() {
        assert!(parse_fields(r#"["Oficio", "1"]"#).is_err());
    }

    #[test]
    fn reject_wrong_field_type() {
        assert!(parse_fields(r#"{"numero_documento": 496}"#).is_err());
    }

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate("ñandú", 3), "ñan…");
        assert_eq!(truncate("abc", 5), "abc");
    }
}
