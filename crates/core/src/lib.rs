pub mod citation;
pub mod corpus;
pub mod error;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod ranker;
pub mod synthesize;

pub use citation::{extract, verify};
pub use corpus::{
    discover_record_files, load_corpus, CorpusHandle, CorpusSnapshot, LoadReport, SkippedRecord,
};
pub use error::{CorpusLoadError, QueryError};
pub use models::{
    Citation, Document, DocumentKind, DocumentRecord, NormalizedQuery, PipelineOptions,
    QueryResult, ScoredCandidate,
};
pub use normalize::{normalize, tokenize};
pub use pipeline::QueryPipeline;
pub use ranker::rank;
pub use synthesize::{confidence_from_score, synthesize, ExtractiveComposer, GroundedGenerator};
