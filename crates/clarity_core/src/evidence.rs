//! Evidence data model: raw collaborator records, the canonical item shape,
//! and the scored/aggregated result types.
//!
//! Raw records arrive from three collaborator families (scraped fact-checks,
//! news search, structured fact-check services) with loose schemas; every
//! field is optional so malformed records degrade instead of failing the
//! bundle. All downstream types are value objects built and consumed within
//! one aggregation call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Final verdict labels, strongest-signal first in aggregation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Fake,
    True,
    Misleading,
    Unverified,
    Unknown,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Verdict::Fake => "Fake",
            Verdict::True => "True",
            Verdict::Misleading => "Misleading",
            Verdict::Unverified => "Unverified",
            Verdict::Unknown => "Unknown",
        };
        write!(f, "{}", s)
    }
}

/// Provenance class of an evidence item, used for trust weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    FactCheck,
    News,
    #[serde(rename = "structured_factcheck")]
    StructuredFactCheck,
}

impl EvidenceKind {
    /// Fact-check family: scraped fact-check articles and structured
    /// fact-check API ratings, as opposed to plain news coverage.
    pub fn is_fact_check_family(&self) -> bool {
        matches!(self, EvidenceKind::FactCheck | EvidenceKind::StructuredFactCheck)
    }
}

impl std::fmt::Display for EvidenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EvidenceKind::FactCheck => "fact_check",
            EvidenceKind::News => "news",
            EvidenceKind::StructuredFactCheck => "structured_factcheck",
        };
        write!(f, "{}", s)
    }
}

/// Canonical evidence shape produced by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Publisher/feed/provider name; `None` when nothing identified the origin.
    pub source: Option<String>,
    /// Primary dedup key. Empty string is a valid-but-low-quality sentinel.
    pub url: String,
    pub title: String,
    pub snippet: String,
    /// Explicit rating derived from the record, when one exists.
    pub structured_verdict: Option<Verdict>,
    pub kind: EvidenceKind,
}

impl EvidenceItem {
    /// Text representation ranked/scored against the claim:
    /// `title — snippet`, empty parts omitted.
    pub fn candidate_text(&self) -> String {
        match (self.title.is_empty(), self.snippet.is_empty()) {
            (false, false) => format!("{} — {}", self.title, self.snippet),
            (false, true) => self.title.clone(),
            (true, false) => self.snippet.clone(),
            (true, true) => String::new(),
        }
    }

    /// True when the source name itself claims fact-checking (e.g.
    /// "FactCheck.org", "AFP Fact Check"), regardless of kind.
    pub fn source_mentions_fact(&self) -> bool {
        self.source
            .as_deref()
            .map(|s| s.to_lowercase().contains("fact"))
            .unwrap_or(false)
    }
}

/// Which similarity path produced a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMethod {
    /// Cosine similarity of sentence embeddings.
    Semantic,
    /// Edit-ratio / token-overlap fallback.
    Lexical,
}

impl std::fmt::Display for SimilarityMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SimilarityMethod::Semantic => "semantic",
            SimilarityMethod::Lexical => "lexical",
        };
        write!(f, "{}", s)
    }
}

/// One ranked candidate. Computed fresh per aggregation call, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub item: EvidenceItem,
    /// In [0,1]; absolute values are not comparable across methods.
    pub similarity: f32,
    pub method: SimilarityMethod,
}

/// Which stance path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StanceMethod {
    /// Calibrated NLI model probabilities.
    Nli,
    /// Similarity-derived approximation, lower confidence.
    SimilarityHeuristic,
    /// Safe default after a per-pair failure.
    Uninformative,
}

impl std::fmt::Display for StanceMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StanceMethod::Nli => "nli",
            StanceMethod::SimilarityHeuristic => "similarity_heuristic",
            StanceMethod::Uninformative => "uninformative",
        };
        write!(f, "{}", s)
    }
}

/// Entailment/contradiction/neutral estimate for one (claim, evidence) pair.
/// The three roughly sum to 1 (model-dependent, not enforced).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StanceResult {
    pub entailment: f32,
    pub contradiction: f32,
    pub neutral: f32,
    pub method: StanceMethod,
}

impl StanceResult {
    /// Safe default when scoring a pair fails: says nothing, biases nothing.
    pub fn uninformative() -> Self {
        Self {
            entailment: 0.0,
            contradiction: 0.0,
            neutral: 1.0,
            method: StanceMethod::Uninformative,
        }
    }

    /// Crude stance from similarity alone (degraded path).
    pub fn from_similarity(similarity: f32) -> Self {
        let sim = similarity.clamp(0.0, 1.0);
        Self {
            entailment: sim,
            contradiction: 1.0 - sim,
            neutral: 0.0,
            method: StanceMethod::SimilarityHeuristic,
        }
    }
}

/// Optional verdict from the upstream ML classifier, consulted only when
/// no evidence survives aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorVerdict {
    pub verdict: Verdict,
    pub confidence: f32,
}

/// One contributing item in the evidence trail, with whatever scores the
/// winning rule computed for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailEntry {
    pub item: EvidenceItem,
    pub similarity: Option<f32>,
    pub stance: Option<StanceResult>,
}

/// Output of one aggregation call. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictResult {
    pub verdict: Verdict,
    pub confidence: f32,
    pub evidence_trail: Vec<TrailEntry>,
}

impl VerdictResult {
    pub fn new(verdict: Verdict, confidence: f32, evidence_trail: Vec<TrailEntry>) -> Self {
        Self {
            verdict,
            confidence: confidence.clamp(0.0, 1.0),
            evidence_trail,
        }
    }

    /// The no-information result: empty claim or no evidence and no prior.
    pub fn unknown() -> Self {
        Self::new(Verdict::Unknown, 0.0, Vec::new())
    }
}

/// Raw record from fact-check scrapers/feeds. Scraper output is the least
/// disciplined of the three families, so the common field spellings are
/// accepted as aliases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFactCheck {
    #[serde(default, alias = "publisher", alias = "site")]
    pub source: Option<String>,
    #[serde(default, alias = "link")]
    pub url: Option<String>,
    #[serde(default, alias = "headline")]
    pub title: Option<String>,
    #[serde(default, alias = "text", alias = "description")]
    pub excerpt: Option<String>,
    /// Free-text rating as scraped ("False", "Partly true", ...).
    #[serde(default, alias = "rating", alias = "result")]
    pub verdict: Option<String>,
    /// Collaborator tag, source fallback when the record names none.
    #[serde(default)]
    pub provider: Option<String>,
}

/// Raw record from news search. News never carries a rating.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawNews {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "publishedAt")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub provider: Option<String>,
}

/// Raw record from structured fact-check services.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawStructured {
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,
}

/// Kind-tagged raw record, the unit Dedup/Merge operates on.
#[derive(Debug, Clone, PartialEq)]
pub enum RawEvidence {
    FactCheck(RawFactCheck),
    News(RawNews),
    Structured(RawStructured),
}

impl RawEvidence {
    pub fn url(&self) -> Option<&str> {
        match self {
            RawEvidence::FactCheck(r) => r.url.as_deref(),
            RawEvidence::News(r) => r.url.as_deref(),
            RawEvidence::Structured(r) => r.url.as_deref(),
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            RawEvidence::FactCheck(r) => r.title.as_deref(),
            RawEvidence::News(r) => r.title.as_deref(),
            RawEvidence::Structured(r) => r.title.as_deref(),
        }
    }

    pub fn kind(&self) -> EvidenceKind {
        match self {
            RawEvidence::FactCheck(_) => EvidenceKind::FactCheck,
            RawEvidence::News(_) => EvidenceKind::News,
            RawEvidence::Structured(_) => EvidenceKind::StructuredFactCheck,
        }
    }
}

/// Everything the retrieval collaborators handed over for one claim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceBundle {
    #[serde(default)]
    pub structured: Vec<RawStructured>,
    #[serde(default)]
    pub fact_checks: Vec<RawFactCheck>,
    #[serde(default)]
    pub news: Vec<RawNews>,
}

impl EvidenceBundle {
    pub fn is_empty(&self) -> bool {
        self.structured.is_empty() && self.fact_checks.is_empty() && self.news.is_empty()
    }

    pub fn len(&self) -> usize {
        self.structured.len() + self.fact_checks.len() + self.news.len()
    }

    /// Flatten in trust order (structured, then scraped fact-checks, then
    /// news) so first-seen-wins dedup keeps the highest-trust duplicate.
    pub fn into_ordered(self) -> Vec<RawEvidence> {
        let mut records = Vec::with_capacity(self.len());
        records.extend(self.structured.into_iter().map(RawEvidence::Structured));
        records.extend(self.fact_checks.into_iter().map(RawEvidence::FactCheck));
        records.extend(self.news.into_iter().map(RawEvidence::News));
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, snippet: &str) -> EvidenceItem {
        EvidenceItem {
            source: None,
            url: "https://example.com/a".to_string(),
            title: title.to_string(),
            snippet: snippet.to_string(),
            structured_verdict: None,
            kind: EvidenceKind::News,
        }
    }

    #[test]
    fn candidate_text_omits_empty_parts() {
        assert_eq!(item("Title", "Snippet").candidate_text(), "Title — Snippet");
        assert_eq!(item("Title", "").candidate_text(), "Title");
        assert_eq!(item("", "Snippet").candidate_text(), "Snippet");
        assert_eq!(item("", "").candidate_text(), "");
    }

    #[test]
    fn verdict_serializes_as_plain_label() {
        let json = serde_json::to_string(&Verdict::Fake).unwrap();
        assert_eq!(json, "\"Fake\"");
        let back: Verdict = serde_json::from_str("\"Misleading\"").unwrap();
        assert_eq!(back, Verdict::Misleading);
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&EvidenceKind::StructuredFactCheck).unwrap();
        assert_eq!(json, "\"structured_factcheck\"");
    }

    #[test]
    fn news_record_accepts_wire_shape() {
        let raw = r#"{
            "source": "Reuters",
            "url": "https://reuters.com/x",
            "title": "Story",
            "description": "Body",
            "publishedAt": "2025-06-01T12:00:00Z",
            "unknownField": 42
        }"#;
        let rec: RawNews = serde_json::from_str(raw).unwrap();
        assert_eq!(rec.source.as_deref(), Some("Reuters"));
        assert!(rec.published_at.is_some());
    }

    #[test]
    fn missing_fields_default_instead_of_failing() {
        let rec: RawFactCheck = serde_json::from_str("{}").unwrap();
        assert_eq!(rec, RawFactCheck::default());
    }

    #[test]
    fn fact_check_record_accepts_aliased_fields() {
        let raw = r#"{
            "site": "AltNews",
            "link": "https://altnews.test/check",
            "headline": "Claim debunked",
            "text": "The viral claim is fabricated",
            "rating": "False"
        }"#;
        let rec: RawFactCheck = serde_json::from_str(raw).unwrap();
        assert_eq!(rec.source.as_deref(), Some("AltNews"));
        assert_eq!(rec.url.as_deref(), Some("https://altnews.test/check"));
        assert_eq!(rec.title.as_deref(), Some("Claim debunked"));
        assert_eq!(rec.excerpt.as_deref(), Some("The viral claim is fabricated"));
        assert_eq!(rec.verdict.as_deref(), Some("False"));
    }

    #[test]
    fn bundle_flattens_in_trust_order() {
        let bundle = EvidenceBundle {
            structured: vec![RawStructured {
                url: Some("s".to_string()),
                ..Default::default()
            }],
            fact_checks: vec![RawFactCheck {
                url: Some("f".to_string()),
                ..Default::default()
            }],
            news: vec![RawNews {
                url: Some("n".to_string()),
                ..Default::default()
            }],
        };
        let ordered = bundle.into_ordered();
        let urls: Vec<_> = ordered.iter().filter_map(|r| r.url()).collect();
        assert_eq!(urls, vec!["s", "f", "n"]);
        assert_eq!(ordered[0].kind(), EvidenceKind::StructuredFactCheck);
    }

    #[test]
    fn source_mentions_fact_is_case_insensitive() {
        let mut it = item("t", "s");
        it.source = Some("AFP Fact Check".to_string());
        assert!(it.source_mentions_fact());
        it.source = Some("Reuters".to_string());
        assert!(!it.source_mentions_fact());
        it.source = None;
        assert!(!it.source_mentions_fact());
    }

    #[test]
    fn uninformative_stance_is_neutral_only() {
        let st = StanceResult::uninformative();
        assert_eq!(st.entailment, 0.0);
        assert_eq!(st.contradiction, 0.0);
        assert_eq!(st.neutral, 1.0);
        assert_eq!(st.method, StanceMethod::Uninformative);
    }

    #[test]
    fn similarity_stance_clamps_input() {
        let st = StanceResult::from_similarity(1.7);
        assert_eq!(st.entailment, 1.0);
        assert_eq!(st.contradiction, 0.0);
        assert_eq!(st.method, StanceMethod::SimilarityHeuristic);
    }

    #[test]
    fn verdict_result_clamps_confidence() {
        let r = VerdictResult::new(Verdict::True, 1.4, Vec::new());
        assert_eq!(r.confidence, 1.0);
        let r = VerdictResult::new(Verdict::True, -0.2, Vec::new());
        assert_eq!(r.confidence, 0.0);
    }
}
