// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout name normalization and fuzzy matching.
//!
//! Athletes type the same benchmark many ways ("Fran", "fran", "F-R-A-N").
//! The normalized form is the leaderboard join key; the similarity score
//! backs "did you mean" suggestions.

use serde::Serialize;
use std::collections::HashSet;

/// Characters dropped from names before comparison, besides whitespace.
const STRIPPED_CHARS: [char; 8] = ['-', '_', '\'', '"', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}'];

/// Canonical form of a workout name: lowercase with whitespace, hyphens,
/// underscores and quotes removed.
pub fn normalize_workout_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && !STRIPPED_CHARS.contains(c))
        .collect()
}

/// Edit distance (insert, delete, substitute) between two strings, by char.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Similarity in `[0, 1]` of the normalized names. Identical normalized
/// forms (including two empty names) score 1.0.
pub fn similarity_score(a: &str, b: &str) -> f64 {
    let a = normalize_workout_name(a);
    let b = normalize_workout_name(b);

    if a == b {
        return 1.0;
    }

    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }

    1.0 - levenshtein_distance(&a, &b) as f64 / max_len as f64
}

/// A candidate name close to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarName {
    pub name: String,
    pub normalized_name: String,
    pub score: f64,
}

/// Default minimum score for name suggestions.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;

/// Candidates scoring at least `threshold` against `query`, best first.
/// Candidates sharing a normalized form are reported once, under the first
/// spelling seen.
pub fn find_similar_names<'a>(
    query: &str,
    candidates: impl IntoIterator<Item = &'a str>,
    threshold: f64,
) -> Vec<SimilarName> {
    let mut seen = HashSet::new();
    let mut matches: Vec<SimilarName> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let normalized = normalize_workout_name(candidate);
            if !seen.insert(normalized.clone()) {
                return None;
            }
            let score = similarity_score(query, candidate);
            (score >= threshold).then(|| SimilarName {
                name: candidate.to_string(),
                normalized_name: normalized,
                score,
            })
        })
        .collect();

    matches.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.name.cmp(&b.name))
    });
    matches
}
