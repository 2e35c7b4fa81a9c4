use crate::error::QueryError;
use crate::models::{Citation, NormalizedQuery, QueryResult, ScoredCandidate};
use async_trait::async_trait;

/// Pluggable answer generation. Implementations receive only the verified
/// citations as grounding context, never raw corpus text, so a downstream
/// model cannot cite material the extractor has not vetted.
#[async_trait]
pub trait GroundedGenerator {
    async fn compose(
        &self,
        query: &NormalizedQuery,
        grounding: &[Citation],
    ) -> Result<String, QueryError>;
}

/// Default generator: a template answer assembled from the citation
/// excerpts themselves. Mentions a document id only when that document is in
/// the citation list, which keeps prose and citations referentially intact
/// by construction.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtractiveComposer;

#[async_trait]
impl GroundedGenerator for ExtractiveComposer {
    async fn compose(
        &self,
        query: &NormalizedQuery,
        grounding: &[Citation],
    ) -> Result<String, QueryError> {
        let Some(top) = grounding.first() else {
            return Ok(format!(
                "I've analyzed your query: \"{}\". Matching documents were found, \
                 but no excerpt could be verified against the corpus.",
                query.original
            ));
        };

        let mut answer = format!(
            "I've analyzed your query: \"{}\".\n\nBased on the legal corpus, \
             relevant information appears in \"{}\" [{}]:\n\n{}",
            query.original, top.title, top.document_id, top.excerpt
        );

        if grounding.len() > 1 {
            let others = grounding[1..]
                .iter()
                .map(|citation| format!("\"{}\" [{}]", citation.title, citation.document_id))
                .collect::<Vec<_>>()
                .join(", ");
            answer.push_str(&format!("\n\nFurther supporting sources: {others}."));
        }

        Ok(answer)
    }
}

/// Composes the final result from the ranked candidates and their verified
/// citations.
///
/// No candidates is a normal outcome, not an error: the result carries an
/// explanatory answer, no citations, and confidence 0. Otherwise confidence
/// grows monotonically with the top score, saturating below 1.
pub async fn synthesize<G: GroundedGenerator>(
    query: &NormalizedQuery,
    ranked: &[ScoredCandidate],
    citations: Vec<Citation>,
    generator: &G,
) -> Result<QueryResult, QueryError> {
    let Some(top) = ranked.first() else {
        return Ok(QueryResult {
            query_id: query.query_id,
            answer: format!(
                "I've analyzed your query: \"{}\". I couldn't find documents in the \
                 legal corpus matching it. Try rephrasing, or load additional documents.",
                query.original
            ),
            citations: Vec::new(),
            confidence: 0.0,
        });
    };

    let answer = generator.compose(query, &citations).await?;

    Ok(QueryResult {
        query_id: query.query_id,
        answer,
        citations,
        confidence: confidence_from_score(top.score),
    })
}

/// Monotonic, saturating map from a non-negative relevance score into [0, 1).
pub fn confidence_from_score(score: f64) -> f64 {
    let score = score.max(0.0);
    score / (score + 1.0)
}
