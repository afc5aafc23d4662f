//! Relevance scoring of templates against free-text requests.
//!
//! Scoring is additive and uncapped: each query token is scored independently against every
//! matching field entry, and repeated tokens are scored again. A best score of zero means
//! "no match", even though a real but weightless match is conceivable.

use n8n_mcp_types::TemplateMetadata;

use crate::catalog::TemplateCatalog;

const USE_CASE_WEIGHT: i64 = 6;
const KEYWORD_WEIGHT: i64 = 5;
const NAME_WEIGHT: i64 = 4;
const TAG_WEIGHT: i64 = 3;
const DESCRIPTION_WEIGHT: i64 = 2;

/// Per-field hit counts for one candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub use_cases: usize,
    pub keywords: usize,
    pub name: usize,
    pub tags: usize,
    pub description: usize,
}

impl ScoreBreakdown {
    /// Weighted sum of all hits.
    pub fn total(&self) -> i64 {
        self.use_cases as i64 * USE_CASE_WEIGHT
            + self.keywords as i64 * KEYWORD_WEIGHT
            + self.name as i64 * NAME_WEIGHT
            + self.tags as i64 * TAG_WEIGHT
            + self.description as i64 * DESCRIPTION_WEIGHT
    }
}

/// Lowercase the query and split it on whitespace. Duplicates are kept.
pub fn tokenize_query(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_lowercase).collect()
}

/// Score one candidate against a raw query.
pub fn score(query: &str, candidate: &TemplateMetadata) -> i64 {
    score_breakdown(query, candidate).total()
}

/// Per-field hit counts for a raw query, for diagnostics.
pub fn score_breakdown(query: &str, candidate: &TemplateMetadata) -> ScoreBreakdown {
    score_tokens(&tokenize_query(query), candidate)
}

/// Field-level hit counts for already tokenized input.
pub fn score_tokens(tokens: &[String], candidate: &TemplateMetadata) -> ScoreBreakdown {
    let use_cases = lowercase_entries(&candidate.use_cases);
    let keywords = lowercase_entries(&candidate.keywords);
    let tags = lowercase_entries(&candidate.tags);
    let name = candidate.name.to_lowercase();
    let description = candidate.description.to_lowercase();

    let mut breakdown = ScoreBreakdown::default();
    for token in tokens {
        breakdown.use_cases += count_overlapping(&use_cases, token);
        breakdown.keywords += count_overlapping(&keywords, token);
        breakdown.tags += count_overlapping(&tags, token);
        if name.contains(token.as_str()) {
            breakdown.name += 1;
        }
        if description.contains(token.as_str()) {
            breakdown.description += 1;
        }
    }
    breakdown
}

/// Pick the highest scoring template.
///
/// Ties go to the candidate seen first in catalog order. Returns `None` for an empty catalog,
/// an empty query, or a best score of zero.
pub fn rank<'a>(query: &str, catalog: &'a TemplateCatalog) -> Option<&'a TemplateMetadata> {
    let tokens = tokenize_query(query);
    if tokens.is_empty() || catalog.is_empty() {
        return None;
    }

    let mut best: Option<(&TemplateMetadata, i64)> = None;
    for candidate in catalog.iter() {
        let candidate_score = score_tokens(&tokens, candidate).total();
        if best.is_none_or(|(_, best_score)| candidate_score > best_score) {
            best = Some((candidate, candidate_score));
        }
    }

    best.filter(|(_, best_score)| *best_score > 0).map(|(template, _)| template)
}

fn lowercase_entries(entries: &[String]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| entry.to_lowercase())
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// Number of entries where the token is a substring of the entry or vice versa.
fn count_overlapping(entries: &[String], token: &str) -> usize {
    entries
        .iter()
        .filter(|entry| entry.contains(token) || token.contains(entry.as_str()))
        .count()
}
