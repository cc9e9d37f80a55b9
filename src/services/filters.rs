use std::collections::HashSet;

use crate::types::{Id, ServiceError};

/// Case-insensitive containment. An empty needle matches everything.
pub fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    let needle = needle.trim();
    if needle.is_empty() {
        return true;
    }
    haystack.is_some_and(|text| text.to_lowercase().contains(&needle.to_lowercase()))
}

/// Parses `"1, 4,7"` into ids. Blank entries are skipped.
pub fn parse_id_list(raw: &str) -> Result<Vec<Id>, ServiceError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry.parse::<Id>().map_err(|_| {
                ServiceError::InvalidInput(format!("'{entry}' no es un identificador válido."))
            })
        })
        .collect()
}

/// Keys on the left side of every junction row whose right side is in `wanted`.
/// Several wanted ids are OR-ed, and each key is reported once in first-seen order.
pub fn keys_linked_to_any<J>(
    junction: &[J],
    wanted: &HashSet<Id>,
    left_of: impl Fn(&J) -> Id,
    right_of: impl Fn(&J) -> Id,
) -> Vec<Id> {
    let mut seen = HashSet::new();
    junction
        .iter()
        .filter(|link| wanted.contains(&right_of(link)))
        .map(left_of)
        .filter(|key| seen.insert(*key))
        .collect()
}

/// Rows of `table` whose key is in either of the two key sets, in table order.
/// Each row appears once even when both sets name it.
pub fn union_by_key<'a, R>(
    table: &'a [R],
    first: &HashSet<Id>,
    second: &HashSet<Id>,
    key_of: impl Fn(&R) -> Id,
) -> Vec<&'a R> {
    table
        .iter()
        .filter(|row| {
            let key = key_of(row);
            first.contains(&key) || second.contains(&key)
        })
        .collect()
}

pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Normalized edit-distance similarity in `0.0..=1.0`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

/// Best similarity of `query` against the whole `text` or any single word of it.
pub fn fuzzy_score(text: &str, query: &str) -> f64 {
    let text = text.trim().to_lowercase();
    let query = query.trim().to_lowercase();

    text.split_whitespace()
        .map(|word| similarity(word, &query))
        .fold(similarity(&text, &query), f64::max)
}

/// Approximate matches of `query` over `rows`, best first. Ties keep table order.
pub fn fuzzy_rank<'a, R>(
    rows: &'a [R],
    query: &str,
    threshold: f64,
    text_of: impl Fn(&R) -> Option<&str>,
) -> Vec<(&'a R, f64)> {
    if query.trim().is_empty() {
        return vec![];
    }

    let mut ranked: Vec<(&R, f64)> = rows
        .iter()
        .filter_map(|row| {
            let score = fuzzy_score(text_of(row)?, query);
            (score >= threshold).then_some((row, score))
        })
        .collect();

    // Stable sort, so equal scores stay in table order.
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}
