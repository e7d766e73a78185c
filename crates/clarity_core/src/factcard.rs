//! Shareable fact-card summary of one verdict, for the response layer to
//! hand out as-is. Pure formatting, no I/O.

use crate::evidence::VerdictResult;
use serde::{Deserialize, Serialize};

/// Trail links quoted on a card.
const MAX_SOURCES: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactCard {
    pub title: String,
    pub claim: String,
    pub verdict: String,
    pub confidence: String,
    pub sources: Vec<String>,
}

impl FactCard {
    pub fn from_result(claim: &str, result: &VerdictResult) -> Self {
        let confidence = if result.confidence > 0.0 {
            format!("{:.1}%", result.confidence * 100.0)
        } else {
            "N/A".to_string()
        };

        let mut sources: Vec<String> = result
            .evidence_trail
            .iter()
            .filter(|e| !e.item.url.is_empty())
            .take(MAX_SOURCES)
            .map(|e| e.item.url.clone())
            .collect();
        if sources.is_empty() {
            sources.push("No evidence found".to_string());
        }

        Self {
            title: "FACT CHECK SUMMARY".to_string(),
            claim: claim.to_string(),
            verdict: result.verdict.to_string(),
            confidence,
            sources,
        }
    }

    /// Plain-text rendering for sharing.
    pub fn summary_text(&self) -> String {
        format!(
            "Claim: {}\nVerdict: {}\nConfidence: {}\nSources: {}",
            self.claim,
            self.verdict,
            self.confidence,
            self.sources.join(", ")
        )
    }
}
