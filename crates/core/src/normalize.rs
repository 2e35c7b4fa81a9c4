use crate::error::QueryError;
use crate::models::NormalizedQuery;
use uuid::Uuid;

/// Canonicalizes raw query text into a comparable token sequence.
///
/// Lowercases, keeps hyphens inside compound terms ("work-related"), strips
/// other punctuation, and splits on whitespace. Blank input is the only
/// rejected input; anything else normalizes to something.
pub fn normalize(raw_text: &str) -> Result<NormalizedQuery, QueryError> {
    if raw_text.trim().is_empty() {
        return Err(QueryError::EmptyQuery);
    }

    Ok(NormalizedQuery {
        query_id: Uuid::new_v4(),
        original: raw_text.to_string(),
        tokens: tokenize(raw_text),
    })
}

/// Token rules shared by query normalization and document scoring so that
/// query terms and document terms compare in the same alphabet.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .filter_map(|word| {
            let token: String = word
                .chars()
                .filter(|ch| ch.is_alphanumeric() || *ch == '-')
                .collect();
            let token = token.trim_matches('-').to_string();
            if token.is_empty() {
                None
            } else {
                Some(token)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{normalize, tokenize};
    use crate::error::QueryError;

    #[test]
    fn blank_query_is_rejected() {
        assert!(matches!(normalize(""), Err(QueryError::EmptyQuery)));
        assert!(matches!(normalize("   "), Err(QueryError::EmptyQuery)));
        assert!(matches!(normalize("\t\n"), Err(QueryError::EmptyQuery)));
    }

    #[test]
    fn tokens_are_lowercased_and_stripped() {
        let query = normalize("What does the Software License Agreement say?").unwrap();
        assert_eq!(
            query.tokens,
            vec!["what", "does", "the", "software", "license", "agreement", "say"]
        );
        assert_eq!(query.original, "What does the Software License Agreement say?");
    }

    #[test]
    fn hyphenated_compounds_survive() {
        assert_eq!(
            tokenize("work-related injury (pre-existing)"),
            vec!["work-related", "injury", "pre-existing"]
        );
    }

    #[test]
    fn leading_and_trailing_hyphens_are_trimmed() {
        assert_eq!(tokenize("-dash- --"), vec!["dash"]);
    }

    #[test]
    fn punctuation_only_input_still_normalizes() {
        let query = normalize("???!!!").unwrap();
        assert!(query.tokens.is_empty());
    }

    #[test]
    fn normalization_is_stable_for_same_text() {
        let first = normalize("Statute of limitations").unwrap();
        let second = normalize("Statute of limitations").unwrap();
        assert_eq!(first.tokens, second.tokens);
    }
}
