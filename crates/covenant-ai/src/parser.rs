//! Extract the structured analysis from a free-form model reply.
//!
//! Models often wrap the JSON object in prose or code fences, so decoding
//! works on the span from the first `{` to the last `}`. A reply that still
//! fails to decode yields the degraded result instead of an error.

use covenant_core::AnalysisResult;
use thiserror::Error;
use tracing::warn;

/// Why a reply fell back to the degraded result.
#[derive(Error, Debug)]
pub enum ParseDegraded {
    #[error("reply contains no JSON object")]
    NoJsonObject,
    #[error("reply JSON did not decode: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Strict variant: report why decoding failed.
pub fn try_parse_reply(text: &str) -> Result<AnalysisResult, ParseDegraded> {
    let start = text.find('{').ok_or(ParseDegraded::NoJsonObject)?;
    let end = text.rfind('}').ok_or(ParseDegraded::NoJsonObject)?;
    if end < start {
        return Err(ParseDegraded::NoJsonObject);
    }
    Ok(serde_json::from_str(&text[start..=end])?)
}

/// Decode a reply, substituting [`AnalysisResult::degraded`] on any failure.
pub fn parse_reply(text: &str) -> AnalysisResult {
    match try_parse_reply(text) {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, chars = text.len(), "model reply could not be parsed, recording degraded result");
            AnalysisResult::degraded()
        }
    }
}
