use crate::models::{Citation, Document, PipelineOptions, ScoredCandidate};
use regex::RegexBuilder;

/// Derives a verifiable excerpt supporting a ranked candidate.
///
/// Picks the first bounded window of the body containing a matched term,
/// snapped to sentence boundaries where that keeps the match inside the
/// window. When no matched term occurs in the body (title-only matches),
/// falls back to the document's opening excerpt. Either way the excerpt is a
/// verbatim substring of the body at the recorded byte offsets; the text is
/// never paraphrased.
pub fn extract(
    document: &Document,
    candidate: &ScoredCandidate,
    options: &PipelineOptions,
) -> Citation {
    let body = document.body.as_str();
    let window = options.excerpt_window_chars.max(1);

    let (start, end) = match earliest_term_match(body, candidate) {
        Some(matched) => windowed_range(body, matched, window),
        None => opening_range(body, window),
    };

    Citation {
        document_id: document.document_id.clone(),
        title: document.title.clone(),
        excerpt: body[start..end].to_string(),
        offset_start: start,
        offset_end: end,
    }
}

/// Re-checks the citation integrity invariant: the excerpt must be locatable
/// in the source body at its recorded offsets.
pub fn verify(citation: &Citation, document: &Document) -> bool {
    document
        .body
        .get(citation.offset_start..citation.offset_end)
        .is_some_and(|slice| slice == citation.excerpt)
}

/// Byte range of the earliest case-insensitive occurrence of any matched
/// term. Terms are tried in their set order, so the result is deterministic.
fn earliest_term_match(body: &str, candidate: &ScoredCandidate) -> Option<(usize, usize)> {
    let mut earliest: Option<(usize, usize)> = None;

    for term in &candidate.matched_terms {
        let pattern = RegexBuilder::new(&regex::escape(term))
            .case_insensitive(true)
            .build();

        let Ok(pattern) = pattern else {
            continue;
        };

        if let Some(found) = pattern.find(body) {
            let range = (found.start(), found.end());
            earliest = match earliest {
                Some(best) if best.0 <= range.0 => Some(best),
                _ => Some(range),
            };
        }
    }

    earliest
}

fn windowed_range(body: &str, matched: (usize, usize), window_chars: usize) -> (usize, usize) {
    let chars: Vec<usize> = body.char_indices().map(|(offset, _)| offset).collect();
    let total = chars.len();

    let match_start_char = chars.partition_point(|offset| *offset < matched.0);
    let match_end_char = chars.partition_point(|offset| *offset < matched.1);

    let match_len = match_end_char.saturating_sub(match_start_char);
    let slack = window_chars.saturating_sub(match_len);

    // Lead with a third of the slack so the match sits early in the excerpt.
    let mut start_char = match_start_char.saturating_sub(slack / 3);
    let mut end_char = (start_char + window_chars).min(total);
    if end_char < match_end_char {
        end_char = match_end_char;
    }

    start_char = snap_start_to_sentence(body, &chars, start_char, match_start_char);
    end_char = snap_end_to_sentence(body, &chars, end_char, match_end_char, total);

    (
        chars[start_char],
        if end_char == total {
            body.len()
        } else {
            chars[end_char]
        },
    )
}

fn opening_range(body: &str, window_chars: usize) -> (usize, usize) {
    let end = body
        .char_indices()
        .map(|(offset, _)| offset)
        .nth(window_chars)
        .unwrap_or(body.len());
    (0, end)
}

/// Moves the window start forward to the first sentence start between the
/// tentative start and the match, trimming a leading sentence fragment.
fn snap_start_to_sentence(
    body: &str,
    chars: &[usize],
    start_char: usize,
    match_start_char: usize,
) -> usize {
    if start_char == 0 {
        return 0;
    }

    let mut cursor = start_char;
    while cursor < match_start_char {
        let here = char_at(body, chars, cursor);
        if is_sentence_end(here) {
            let mut next = cursor + 1;
            while next < match_start_char && char_at(body, chars, next).is_whitespace() {
                next += 1;
            }
            return next;
        }
        cursor += 1;
    }

    start_char
}

/// Pulls the window end back to just after the last sentence terminator that
/// still contains the match, dropping a trailing fragment.
fn snap_end_to_sentence(
    body: &str,
    chars: &[usize],
    end_char: usize,
    match_end_char: usize,
    total: usize,
) -> usize {
    if end_char >= total {
        return total;
    }

    let mut cursor = end_char;
    while cursor > match_end_char {
        let here = char_at(body, chars, cursor - 1);
        if is_sentence_end(here) {
            return cursor;
        }
        cursor -= 1;
    }

    end_char
}

fn char_at(body: &str, chars: &[usize], index: usize) -> char {
    body[chars[index]..].chars().next().unwrap_or(' ')
}

fn is_sentence_end(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?')
}
