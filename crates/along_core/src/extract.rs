//! crates/along_core/src/extract.rs
//!
//! The structured-output extractor: one LLM call, one expected JSON shape.
//!
//! Models routinely wrap "return raw JSON" responses in markdown code fences,
//! so the raw text is sanitized before parsing. Parsing distinguishes two
//! failure classes: text that is not JSON at all (`Syntax`) and JSON that
//! does not match the declared shape (`Shape`). Both carry the raw text so
//! the caller can log it. No retries happen at this layer; that decision
//! belongs to the orchestrator.

use serde::de::DeserializeOwned;

use crate::ports::{LanguageModelService, PortError};

/// A failure to obtain a well-shaped structured response from the model.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Language model call failed: {0}")]
    Llm(#[from] PortError),
    #[error("Model response was not valid JSON")]
    Syntax { raw: String },
    #[error("Model response did not match the expected shape: {detail}")]
    Shape { raw: String, detail: String },
}

/// Strips a leading ```` ``` ````/```` ```json ```` fence and a trailing
/// ```` ``` ```` fence, if present. Text without fences passes through.
pub fn strip_code_fences(text: &str) -> &str {
    let mut s = text.trim();
    if let Some(rest) = s.strip_prefix("```") {
        // Drop an optional language tag ("json"); the payload may start on
        // the same line as the fence, with no newline after the tag.
        let tag_len = rest.chars().take_while(char::is_ascii_alphabetic).count();
        s = rest[tag_len..].trim_start();
    }
    s = s.trim_end();
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

/// Parses sanitized model output into `T`, classifying the failure mode.
pub fn parse_structured<T: DeserializeOwned>(raw: &str) -> Result<T, ExtractError> {
    let cleaned = strip_code_fences(raw);
    let value: serde_json::Value =
        serde_json::from_str(cleaned).map_err(|_| ExtractError::Syntax {
            raw: raw.to_string(),
        })?;
    serde_json::from_value(value).map_err(|e| ExtractError::Shape {
        raw: raw.to_string(),
        detail: e.to_string(),
    })
}

/// Submits `prompt` and parses the completion as `T`.
pub async fn extract<T: DeserializeOwned>(
    llm: &dyn LanguageModelService,
    prompt: &str,
    max_tokens: u32,
) -> Result<T, ExtractError> {
    let raw = llm.complete(prompt, max_tokens).await?;
    parse_structured(&raw)
}
