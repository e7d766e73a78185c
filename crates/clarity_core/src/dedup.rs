//! Dedup/Merge: drop duplicate evidence records before normalization.
//!
//! First pass keys on the normalized URL, first seen wins; the engine feeds
//! records in trust order so the highest-trust copy of a cross-kind
//! duplicate survives. Second pass drops records whose titles are
//! near-identical to one already kept (syndicated stories under different
//! URLs). Records without a URL are never merged with each other.

use crate::evidence::RawEvidence;
use crate::similarity::edit_ratio;
use std::collections::BTreeSet;
use tracing::debug;

/// Titles at or above this edit ratio count as the same story.
const TITLE_DEDUP_THRESHOLD: f32 = 0.9;

/// Dedup key for a URL: parsed form when possible (scheme and host
/// lowercased by the parser, path case preserved), else the trimmed raw
/// string. Empty/whitespace URLs have no key.
pub fn url_key(url: &str) -> Option<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return None;
    }
    match url::Url::parse(trimmed) {
        Ok(parsed) => Some(parsed.to_string()),
        Err(_) => Some(trimmed.to_string()),
    }
}

fn collapse_title(title: &str) -> String {
    title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Remove duplicates, preserving input order. Idempotent.
pub fn dedup_records(records: Vec<RawEvidence>) -> Vec<RawEvidence> {
    let mut seen_urls: BTreeSet<String> = BTreeSet::new();
    let mut kept_titles: Vec<String> = Vec::new();
    let mut kept = Vec::with_capacity(records.len());

    for record in records {
        if let Some(key) = record.url().and_then(url_key) {
            if !seen_urls.insert(key) {
                debug!("dropping duplicate url: {:?}", record.url());
                continue;
            }
        }

        if let Some(title) = record.title() {
            let collapsed = collapse_title(title);
            if !collapsed.is_empty() {
                if kept_titles
                    .iter()
                    .any(|t| edit_ratio(t, &collapsed) >= TITLE_DEDUP_THRESHOLD)
                {
                    debug!("dropping near-duplicate title: {:?}", title);
                    continue;
                }
                kept_titles.push(collapsed);
            }
        }

        kept.push(record);
    }

    kept
}
