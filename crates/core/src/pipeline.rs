use crate::citation;
use crate::corpus::CorpusHandle;
use crate::error::QueryError;
use crate::models::{PipelineOptions, QueryResult};
use crate::normalize::normalize;
use crate::ranker::rank;
use crate::synthesize::{synthesize, ExtractiveComposer, GroundedGenerator};
use tracing::{debug, error};

/// End-to-end query pipeline: normalize, rank against the current corpus
/// snapshot, extract and verify citations, synthesize the answer.
///
/// Stateless across queries; any number may run concurrently against the
/// shared [`CorpusHandle`]. Each query resolves its snapshot exactly once,
/// so a corpus reload mid-query is never observed as a mix of old and new
/// documents.
pub struct QueryPipeline<G: GroundedGenerator> {
    corpus: CorpusHandle,
    generator: G,
    options: PipelineOptions,
}

impl QueryPipeline<ExtractiveComposer> {
    /// Pipeline with the built-in extractive answer template.
    pub fn extractive(corpus: CorpusHandle, options: PipelineOptions) -> Self {
        Self::new(corpus, ExtractiveComposer, options)
    }
}

impl<G: GroundedGenerator> QueryPipeline<G> {
    pub fn new(corpus: CorpusHandle, generator: G, options: PipelineOptions) -> Self {
        Self {
            corpus,
            generator,
            options,
        }
    }

    pub async fn answer(&self, raw_query: &str) -> Result<QueryResult, QueryError> {
        let query = normalize(raw_query)?;
        let snapshot = self.corpus.snapshot()?;

        let ranked = rank(&query, &snapshot, &self.options);
        debug!(
            query_id = %query.query_id,
            candidates = ranked.len(),
            corpus_size = snapshot.len(),
            "ranked query against corpus"
        );

        let mut citations = Vec::with_capacity(ranked.len());
        for candidate in &ranked {
            let Some(document) = snapshot.lookup(&candidate.document_id) else {
                // The snapshot the candidate came from is the one we hold, so
                // a miss here is a defect, not a race.
                error!(
                    query_id = %query.query_id,
                    document_id = %candidate.document_id,
                    "ranked document missing from snapshot, dropping"
                );
                continue;
            };

            let extracted = citation::extract(document, candidate, &self.options);
            if citation::verify(&extracted, document) {
                citations.push(extracted);
            } else {
                error!(
                    query_id = %query.query_id,
                    document_id = %candidate.document_id,
                    "citation failed verification against source body, dropping"
                );
            }
        }

        synthesize(&query, &ranked, citations, &self.generator).await
    }
}

#[cfg(test)]
mod tests {
    use super::QueryPipeline;
    use crate::corpus::{CorpusHandle, CorpusSnapshot};
    use crate::error::QueryError;
    use crate::models::{Document, PipelineOptions};
    use chrono::Utc;

    fn document(id: &str, title: &str, body: &str) -> Document {
        Document {
            document_id: id.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            kind: None,
            source_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn pipeline_over(documents: Vec<Document>) -> QueryPipeline<crate::ExtractiveComposer> {
        let handle = CorpusHandle::with_snapshot(CorpusSnapshot::from_documents(documents));
        QueryPipeline::extractive(handle, PipelineOptions::default())
    }

    #[tokio::test]
    async fn licensing_query_surfaces_the_licensing_document() {
        let pipeline = pipeline_over(vec![
            document(
                "doc-lic",
                "Software License Agreements",
                "This guide covers software licensing terms, grant scope, and termination.",
            ),
            document(
                "doc-lease",
                "Commercial Lease Basics",
                "Rent, term, and renewal options for commercial leases.",
            ),
        ]);

        let result = pipeline.answer("software licensing").await.unwrap();

        assert_eq!(result.citations[0].document_id, "doc-lic");
        assert!(result.citations[0].excerpt.to_lowercase().contains("licens"));
        assert!(result.confidence > 0.0);
    }

    #[tokio::test]
    async fn blank_query_fails_before_ranking() {
        let pipeline = pipeline_over(vec![document("doc-a", "T", "body")]);
        assert!(matches!(
            pipeline.answer("   ").await,
            Err(QueryError::EmptyQuery)
        ));
    }

    #[tokio::test]
    async fn query_before_corpus_load_reports_unavailable() {
        let pipeline =
            QueryPipeline::extractive(CorpusHandle::new(), PipelineOptions::default());
        assert!(matches!(
            pipeline.answer("anything").await,
            Err(QueryError::CorpusUnavailable)
        ));
    }

    #[tokio::test]
    async fn empty_corpus_is_a_no_match_result_not_an_error() {
        let pipeline = pipeline_over(Vec::new());
        let result = pipeline.answer("anything at all").await.unwrap();

        assert!(result.citations.is_empty());
        assert_eq!(result.confidence, 0.0);
        assert!(result.answer.contains("couldn't find documents"));
    }

    #[tokio::test]
    async fn no_match_is_a_normal_outcome() {
        let pipeline = pipeline_over(vec![document(
            "doc-a",
            "Maritime Law",
            "Vessels, salvage, and admiralty jurisdiction.",
        )]);

        let result = pipeline.answer("zoning variance").await.unwrap();
        assert!(result.citations.is_empty());
        assert_eq!(result.confidence, 0.0);
    }

    #[tokio::test]
    async fn repeated_queries_are_deterministic() {
        let pipeline = pipeline_over(vec![
            document("doc-b", "Wage Orders", "industrial wage orders and overtime"),
            document("doc-a", "Wage Claims", "unpaid wage claims and overtime penalties"),
            document("doc-c", "Meal Breaks", "wage statements and meal breaks"),
        ]);

        let first = pipeline.answer("wage overtime").await.unwrap();
        let second = pipeline.answer("wage overtime").await.unwrap();

        assert_eq!(first.citations, second.citations);
        assert_eq!(first.answer, second.answer);
    }

    #[tokio::test]
    async fn every_citation_is_verifiable_against_its_source() {
        let documents = vec![
            document("doc-a", "Employment Law", "Employment contracts and at-will doctrine."),
            document("doc-b", "Contract Law", "Employment of consideration in contracts."),
        ];
        let handle = CorpusHandle::with_snapshot(CorpusSnapshot::from_documents(documents.clone()));
        let pipeline = QueryPipeline::extractive(handle.clone(), PipelineOptions::default());

        let result = pipeline.answer("employment contracts").await.unwrap();
        assert!(!result.citations.is_empty());

        let snapshot = handle.snapshot().unwrap();
        for citation in &result.citations {
            let source = snapshot.lookup(&citation.document_id).unwrap();
            assert_eq!(
                &source.body[citation.offset_start..citation.offset_end],
                citation.excerpt
            );
        }
    }

    #[tokio::test]
    async fn concurrent_queries_share_one_handle() {
        let pipeline = std::sync::Arc::new(pipeline_over(vec![
            document("doc-a", "Wage Claims", "unpaid wage claims and penalties"),
            document("doc-b", "Wage Orders", "industrial wage orders"),
        ]));

        let mut tasks = Vec::new();
        for _ in 0..10 {
            let shared = pipeline.clone();
            tasks.push(tokio::spawn(async move {
                shared.answer("wage claims").await.unwrap()
            }));
        }

        let mut answers = Vec::new();
        for task in tasks {
            answers.push(task.await.unwrap());
        }
        for result in &answers {
            assert_eq!(result.citations[0].document_id, "doc-a");
        }
    }
}
