use crate::corpus::CorpusSnapshot;
use crate::models::{NormalizedQuery, PipelineOptions, ScoredCandidate};
use crate::normalize::tokenize;
use std::collections::BTreeSet;

/// Scores every corpus document against the query and returns the top-K.
///
/// Score = title hits weighted high plus body hits weighted low, damped by
/// body length so long documents gain no free advantage. Documents matching
/// no query term are excluded outright rather than scored zero. Ordering is
/// score descending with ties broken by document id ascending; iteration
/// order of any intermediate collection is never allowed to leak into the
/// result. An empty corpus or a query with no matches yields an empty vec.
pub fn rank(
    query: &NormalizedQuery,
    snapshot: &CorpusSnapshot,
    options: &PipelineOptions,
) -> Vec<ScoredCandidate> {
    let query_terms: BTreeSet<&str> = query.token_set();
    if query_terms.is_empty() {
        return Vec::new();
    }

    let mut candidates = Vec::new();

    for document in snapshot.documents() {
        let title_tokens = tokenize(&document.title);
        let body_tokens = tokenize(&document.body);

        let mut matched_terms = BTreeSet::new();
        let mut title_hits = 0usize;
        let mut body_hits = 0usize;

        for term in query_terms.iter().copied() {
            let in_title = title_tokens.iter().filter(|token| token.as_str() == term).count();
            let in_body = body_tokens.iter().filter(|token| token.as_str() == term).count();

            if in_title + in_body > 0 {
                matched_terms.insert(term.to_string());
                title_hits += in_title;
                body_hits += in_body;
            }
        }

        if matched_terms.is_empty() {
            continue;
        }

        let raw = options.title_weight * title_hits as f64 + options.body_weight * body_hits as f64;
        let length_damp = 1.0 + (body_tokens.len() as f64).ln_1p();

        candidates.push(ScoredCandidate {
            document_id: document.document_id.clone(),
            score: raw / length_damp,
            matched_terms,
        });
    }

    candidates.sort_by(|left, right| {
        right
            .score
            .total_cmp(&left.score)
            .then_with(|| left.document_id.cmp(&right.document_id))
    });
    candidates.truncate(options.top_k);
    candidates
}
