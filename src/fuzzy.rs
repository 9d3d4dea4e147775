//! Fuzzy text matching.
//!
//! Term-level typo-tolerant matching used by the fuzzy search index: a query
//! term matches a description term when their Levenshtein edit distance is
//! within `max_edits` (optionally requiring an exact common prefix). Scores
//! reward closer matches, so an exact term outranks a one-edit typo.

/// Split text into lowercase alphanumeric terms.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Levenshtein distance between two strings, bounded by `max_edits`.
///
/// Returns `None` as soon as the distance is known to exceed the bound,
/// which lets candidate filtering skip most of the matrix.
pub fn levenshtein_within(a: &str, b: &str, max_edits: usize) -> Option<usize> {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let len_a = a_chars.len();
    let len_b = b_chars.len();

    // Length difference alone already exceeds the bound
    if len_a.abs_diff(len_b) > max_edits {
        return None;
    }

    if len_a == 0 {
        return Some(len_b);
    }
    if len_b == 0 {
        return Some(len_a);
    }

    // Two-row dynamic program
    let mut prev: Vec<usize> = (0..=len_b).collect();
    let mut curr = vec![0usize; len_b + 1];

    for i in 1..=len_a {
        curr[0] = i;
        let mut row_min = i;

        for j in 1..=len_b {
            let cost = if a_chars[i - 1] == b_chars[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
            row_min = row_min.min(curr[j]);
        }

        if row_min > max_edits {
            return None;
        }

        std::mem::swap(&mut prev, &mut curr);
    }

    let distance = prev[len_b];
    if distance <= max_edits {
        Some(distance)
    } else {
        None
    }
}

/// Best match score for one query term against a set of description terms.
///
/// A match scores `1 - distance / longer_term_length`, so exact matches
/// score 1.0 and distant ones approach 0. Returns `None` when no term is
/// within `max_edits`.
fn best_term_score(
    query_term: &str,
    terms: &[String],
    max_edits: usize,
    prefix_length: usize,
) -> Option<f64> {
    let mut best: Option<f64> = None;

    for term in terms {
        // Prefix constraint: the first `prefix_length` characters must
        // match exactly before fuzzy comparison applies.
        if prefix_length > 0 {
            let qp: String = query_term.chars().take(prefix_length).collect();
            let tp: String = term.chars().take(prefix_length).collect();
            if qp != tp {
                continue;
            }
        }

        if let Some(distance) = levenshtein_within(query_term, term, max_edits) {
            let longer = query_term.chars().count().max(term.chars().count());
            let score = if longer == 0 {
                0.0
            } else {
                1.0 - distance as f64 / longer as f64
            };
            if best.is_none_or(|b| score > b) {
                best = Some(score);
            }
        }
    }

    best
}

/// Relevance score of a description for a fuzzy query.
///
/// Each query term contributes its best per-term score (0 when nothing is
/// within `max_edits`); the result is the mean over query terms, in
/// `[0.0, 1.0]`. A score of 0.0 means no term matched.
pub fn score_text(query: &str, text: &str, max_edits: usize, prefix_length: usize) -> f64 {
    let query_terms = tokenize(query);
    if query_terms.is_empty() {
        return 0.0;
    }

    let terms = tokenize(text);
    if terms.is_empty() {
        return 0.0;
    }

    let total: f64 = query_terms
        .iter()
        .map(|qt| best_term_score(qt, &terms, max_edits, prefix_length).unwrap_or(0.0))
        .sum();

    total / query_terms.len() as f64
}
