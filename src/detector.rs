//! Analysis-need detection.
//!
//! A secondary classification call that decides whether a user message
//! implies a need for file-based bioinformatics analysis. This path must
//! never interrupt the primary chat flow: transport and parse failures are
//! absorbed into a fixed safe default, and the `Detection` tag records which
//! branch was taken so tests can assert on it.

use serde::{Deserialize, Serialize};

use crate::logging;
use crate::prompts::ANALYSIS_DETECTION_PROMPT;
use crate::relay::{ChatMessage, ChatRelay, MAX_TOKENS, TEMPERATURE};

/// Reasoning reported when the model reply could not be parsed.
pub const FALLBACK_REASONING: &str = "Could not parse analysis detection response";

/// Analysis categories the detection prompt asks the model to choose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    Sequence,
    Expression,
    Variant,
    Pathway,
    Structural,
    Omics,
    Singlecell,
    Metagenomics,
    Other,
}

/// Result shape of one detection call. Transient; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisDetection {
    pub needs_analysis: bool,
    #[serde(default)]
    pub analysis_type: Option<AnalysisType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl Default for AnalysisDetection {
    /// The safe fallback: no analysis, type "other", fixed reasoning.
    fn default() -> Self {
        Self {
            needs_analysis: false,
            analysis_type: Some(AnalysisType::Other),
            reasoning: Some(FALLBACK_REASONING.to_string()),
        }
    }
}

/// Decoder outcome, tagged with the branch that produced the value.
#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    /// The model reply parsed cleanly.
    Parsed(AnalysisDetection),
    /// Transport failure or malformed reply; `value` is the fixed default
    /// and `reason` carries the underlying cause for logging and tests.
    Fallback {
        value: AnalysisDetection,
        reason: String,
    },
}

impl Detection {
    pub fn value(&self) -> &AnalysisDetection {
        match self {
            Detection::Parsed(value) => value,
            Detection::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> AnalysisDetection {
        match self {
            Detection::Parsed(value) => value,
            Detection::Fallback { value, .. } => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Detection::Fallback { .. })
    }
}

/// Parse a model reply into an `AnalysisDetection`, tolerating markdown code
/// fences around the JSON.
pub fn decode_detection(reply: &str) -> Detection {
    let cleaned = reply
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    match serde_json::from_str::<AnalysisDetection>(cleaned) {
        Ok(parsed) => Detection::Parsed(parsed),
        Err(e) => Detection::Fallback {
            value: AnalysisDetection::default(),
            reason: e.to_string(),
        },
    }
}

/// Run the classification call for one user message. Never returns an error;
/// any failure resolves to the fallback default.
pub async fn detect<R: ChatRelay + ?Sized>(
    relay: &R,
    session_id: Option<&str>,
    message: &str,
) -> Detection {
    let messages = vec![
        ChatMessage::system(ANALYSIS_DETECTION_PROMPT),
        ChatMessage::user(message),
    ];

    let detection = match relay.chat_completion(messages, TEMPERATURE, MAX_TOKENS).await {
        Ok(reply) => decode_detection(&reply),
        Err(e) => Detection::Fallback {
            value: AnalysisDetection::default(),
            reason: e.to_string(),
        },
    };

    match &detection {
        Detection::Parsed(value) => logging::log_detector(
            session_id,
            &format!(
                "needs_analysis={} type={:?}",
                value.needs_analysis, value.analysis_type
            ),
        ),
        Detection::Fallback { reason, .. } => logging::log_detector(
            session_id,
            &format!("Falling back to default: {}", reason),
        ),
    }

    detection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::RelayError;
    use async_trait::async_trait;

    struct FailingRelay;

    #[async_trait]
    impl ChatRelay for FailingRelay {
        async fn chat_completion(
            &self,
            _messages: Vec<ChatMessage>,
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<String, RelayError> {
            Err(RelayError::Status {
                status: 503,
                body: "unavailable".to_string(),
            })
        }
    }

    #[test]
    fn test_decode_valid_detection() {
        let reply = r#"{"needsAnalysis": true, "analysisType": "expression", "reasoning": "RNA-seq keywords detected."}"#;

        let detection = decode_detection(reply);
        assert!(!detection.is_fallback());

        let value = detection.into_value();
        assert!(value.needs_analysis);
        assert_eq!(value.analysis_type, Some(AnalysisType::Expression));
    }

    #[test]
    fn test_decode_null_analysis_type() {
        let reply = r#"{"needsAnalysis": false, "analysisType": null, "reasoning": "Small talk."}"#;

        let detection = decode_detection(reply);
        assert!(!detection.is_fallback());
        assert_eq!(detection.value().analysis_type, None);
    }

    #[test]
    fn test_decode_strips_code_fences() {
        let reply = "```json\n{\"needsAnalysis\": true, \"analysisType\": \"variant\"}\n```";

        let detection = decode_detection(reply);
        assert!(!detection.is_fallback());
        assert_eq!(detection.value().analysis_type, Some(AnalysisType::Variant));
    }

    #[test]
    fn test_decode_garbage_takes_fallback_branch() {
        let detection = decode_detection("I think you probably want an analysis.");

        assert!(detection.is_fallback());
        let value = detection.into_value();
        assert!(!value.needs_analysis);
        assert_eq!(value.analysis_type, Some(AnalysisType::Other));
        assert_eq!(value.reasoning.as_deref(), Some(FALLBACK_REASONING));
    }

    #[tokio::test]
    async fn test_transport_failure_resolves_to_fallback() {
        let detection = detect(&FailingRelay, None, "run differential expression").await;

        assert!(detection.is_fallback());
        let value = detection.into_value();
        assert!(!value.needs_analysis);
        assert_eq!(value.reasoning.as_deref(), Some(FALLBACK_REASONING));
    }
}
