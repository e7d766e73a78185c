//! Evidence Normalizer: total mapping from raw collaborator records to the
//! canonical `EvidenceItem` shape.
//!
//! Never errors. Unparseable input degrades to the safest default:
//! `Unverified` for fact-check kinds, no verdict for news. Scraped titles
//! and excerpts pass through HTML stripping since feeds routinely leak
//! markup and entities into them.

use crate::evidence::{
    EvidenceItem, EvidenceKind, RawEvidence, RawFactCheck, RawNews, RawStructured, Verdict,
};

/// Rating-text token sets. Matched case-insensitively as substrings,
/// Fake set first so "not true" never reads as true, Misleading before
/// True so "partly true" / "half true" land correctly.
const FAKE_TOKENS: &[&str] = &["false", "fake", "debunk", "not true", "fabricated"];
const MISLEADING_TOKENS: &[&str] = &["misleading", "partly true", "half true"];
const TRUE_TOKENS: &[&str] = &["true", "genuine", "confirmed", "verified", "authentic"];

/// Classify a publisher rating string. `None` when nothing recognizable.
pub fn classify_rating(text: &str) -> Option<Verdict> {
    let lowered = text.to_lowercase();
    if FAKE_TOKENS.iter().any(|t| lowered.contains(t)) {
        return Some(Verdict::Fake);
    }
    if MISLEADING_TOKENS.iter().any(|t| lowered.contains(t)) {
        return Some(Verdict::Misleading);
    }
    if TRUE_TOKENS.iter().any(|t| lowered.contains(t)) {
        return Some(Verdict::True);
    }
    None
}

/// Strip HTML tags/entities and collapse whitespace.
pub fn clean_text(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let fragment = scraper::Html::parse_fragment(trimmed);
    let text: String = fragment.root_element().text().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn normalize_fact_check(record: RawFactCheck) -> EvidenceItem {
    let verdict = record
        .verdict
        .as_deref()
        .and_then(classify_rating)
        .unwrap_or(Verdict::Unverified);
    EvidenceItem {
        source: non_empty(record.source).or_else(|| non_empty(record.provider)),
        url: record.url.map(|u| u.trim().to_string()).unwrap_or_default(),
        title: clean_text(record.title.as_deref().unwrap_or("")),
        snippet: clean_text(record.excerpt.as_deref().unwrap_or("")),
        structured_verdict: Some(verdict),
        kind: EvidenceKind::FactCheck,
    }
}

fn normalize_news(record: RawNews) -> EvidenceItem {
    EvidenceItem {
        source: non_empty(record.source).or_else(|| non_empty(record.provider)),
        url: record.url.map(|u| u.trim().to_string()).unwrap_or_default(),
        title: clean_text(record.title.as_deref().unwrap_or("")),
        snippet: clean_text(record.description.as_deref().unwrap_or("")),
        // News sources never assert a rating.
        structured_verdict: None,
        kind: EvidenceKind::News,
    }
}

fn normalize_structured(record: RawStructured) -> EvidenceItem {
    let verdict = record
        .rating
        .as_deref()
        .and_then(classify_rating)
        .unwrap_or(Verdict::Unverified);
    EvidenceItem {
        source: non_empty(record.publisher),
        url: record.url.map(|u| u.trim().to_string()).unwrap_or_default(),
        title: clean_text(record.title.as_deref().unwrap_or("")),
        snippet: clean_text(record.text.as_deref().unwrap_or("")),
        structured_verdict: Some(verdict),
        kind: EvidenceKind::StructuredFactCheck,
    }
}

/// Map one raw record. Total: any input yields a well-formed item.
pub fn normalize_record(record: RawEvidence) -> EvidenceItem {
    match record {
        RawEvidence::FactCheck(r) => normalize_fact_check(r),
        RawEvidence::News(r) => normalize_news(r),
        RawEvidence::Structured(r) => normalize_structured(r),
    }
}

/// Map a deduplicated batch, preserving order.
pub fn normalize_records(records: Vec<RawEvidence>) -> Vec<EvidenceItem> {
    records.into_iter().map(normalize_record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_tokens_win_over_true_substrings() {
        assert_eq!(classify_rating("Not True"), Some(Verdict::Fake));
        assert_eq!(classify_rating("FABRICATED claim"), Some(Verdict::Fake));
        assert_eq!(classify_rating("debunked by AFP"), Some(Verdict::Fake));
    }

    #[test]
    fn misleading_tokens_win_over_true_substrings() {
        assert_eq!(classify_rating("Partly True"), Some(Verdict::Misleading));
        assert_eq!(classify_rating("half true at best"), Some(Verdict::Misleading));
        assert_eq!(classify_rating("Misleading context"), Some(Verdict::Misleading));
    }

    #[test]
    fn true_tokens_classify_last() {
        assert_eq!(classify_rating("True"), Some(Verdict::True));
        assert_eq!(classify_rating("Confirmed genuine"), Some(Verdict::True));
        assert_eq!(classify_rating("verified footage"), Some(Verdict::True));
    }

    #[test]
    fn unrecognized_ratings_classify_as_none() {
        assert_eq!(classify_rating("pants on fire"), None);
        assert_eq!(classify_rating(""), None);
    }

    #[test]
    fn fact_check_without_rating_degrades_to_unverified() {
        let item = normalize_record(RawEvidence::FactCheck(RawFactCheck {
            url: Some("https://pib.test/check".to_string()),
            verdict: Some("pants on fire".to_string()),
            ..Default::default()
        }));
        assert_eq!(item.structured_verdict, Some(Verdict::Unverified));
        assert_eq!(item.kind, EvidenceKind::FactCheck);
    }

    #[test]
    fn empty_fact_check_record_still_normalizes() {
        let item = normalize_record(RawEvidence::FactCheck(RawFactCheck::default()));
        assert_eq!(item.url, "");
        assert_eq!(item.title, "");
        assert_eq!(item.structured_verdict, Some(Verdict::Unverified));
    }

    #[test]
    fn news_never_carries_a_verdict() {
        let item = normalize_record(RawEvidence::News(RawNews {
            url: Some("https://news.test/a".to_string()),
            title: Some("Electricity subsidy announced".to_string()),
            ..Default::default()
        }));
        assert_eq!(item.structured_verdict, None);
        assert_eq!(item.kind, EvidenceKind::News);
    }

    #[test]
    fn missing_source_falls_back_to_provider_tag() {
        let item = normalize_record(RawEvidence::News(RawNews {
            url: Some("https://news.test/a".to_string()),
            source: Some("   ".to_string()),
            provider: Some("NewsAPI".to_string()),
            ..Default::default()
        }));
        assert_eq!(item.source.as_deref(), Some("NewsAPI"));
    }

    #[test]
    fn structured_rating_maps_through_classifier() {
        let item = normalize_record(RawEvidence::Structured(RawStructured {
            publisher: Some("PIB Fact Check".to_string()),
            url: Some("https://pib.test/claim".to_string()),
            rating: Some("False".to_string()),
            ..Default::default()
        }));
        assert_eq!(item.structured_verdict, Some(Verdict::Fake));
        assert_eq!(item.kind, EvidenceKind::StructuredFactCheck);
        assert_eq!(item.source.as_deref(), Some("PIB Fact Check"));
    }

    #[test]
    fn clean_text_strips_markup_and_entities() {
        assert_eq!(
            clean_text("<b>Claim</b>: free &amp; fair power"),
            "Claim: free & fair power"
        );
        assert_eq!(clean_text("  spaced\n\n  out \t text "), "spaced out text");
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn urls_are_trimmed_but_otherwise_untouched() {
        let item = normalize_record(RawEvidence::News(RawNews {
            url: Some("  https://News.test/Path  ".to_string()),
            ..Default::default()
        }));
        assert_eq!(item.url, "https://News.test/Path");
    }
}
