//! Foreign-key joins over loaded tables.
//!
//! Tables are plain slices in file order. Every join is a scan, so results keep
//! the order of the left table and, for junctions, the order of the junction
//! table.

use std::collections::HashMap;

use crate::types::Id;

/// First record of `right` whose key equals `key`.
pub fn lookup<'a, R>(right: &'a [R], key: Id, key_of: impl Fn(&R) -> Id) -> Option<&'a R> {
    right.iter().find(|row| key_of(row) == key)
}

/// Direct lookup-join: pairs every left record with the first matching right
/// record. A missing or unresolvable foreign key pairs with `None`.
pub fn lookup_join<'a, L, R>(
    left: &'a [L],
    right: &'a [R],
    foreign_key: impl Fn(&L) -> Option<Id>,
    key_of: impl Fn(&R) -> Id,
) -> Vec<(&'a L, Option<&'a R>)> {
    left.iter()
        .map(|row| {
            let matched = foreign_key(row).and_then(|fk| lookup(right, fk, &key_of));
            (row, matched)
        })
        .collect()
}

/// Junction join for one left key: every junction row pointing at `left_key`,
/// each paired with the right record it resolves to (if any).
pub fn junction_rows<'a, J, R>(
    left_key: Id,
    junction: &'a [J],
    junction_left: impl Fn(&J) -> Id,
    junction_right: impl Fn(&J) -> Id,
    right: &'a [R],
    key_of: impl Fn(&R) -> Id,
) -> Vec<(&'a J, Option<&'a R>)> {
    junction
        .iter()
        .filter(|link| junction_left(link) == left_key)
        .map(|link| (link, lookup(right, junction_right(link), &key_of)))
        .collect()
}

/// Junction join over a whole left table, summarizing each resolved pair.
pub fn junction_join<'a, L, J, R, S>(
    left: &'a [L],
    left_key: impl Fn(&L) -> Id,
    junction: &'a [J],
    junction_left: impl Fn(&J) -> Id,
    junction_right: impl Fn(&J) -> Id,
    right: &'a [R],
    key_of: impl Fn(&R) -> Id,
    summarize: impl Fn(&J, Option<&R>) -> S,
) -> Vec<(&'a L, Vec<S>)> {
    left.iter()
        .map(|row| {
            let summaries = junction_rows(
                left_key(row),
                junction,
                &junction_left,
                &junction_right,
                right,
                &key_of,
            )
            .into_iter()
            .map(|(link, matched)| summarize(link, matched))
            .collect();
            (row, summaries)
        })
        .collect()
}

/// Key → first record index, for requests that resolve the same table many
/// times. Matches [`lookup`]: the first row wins on duplicate keys.
pub fn index_by<R>(rows: &[R], key_of: impl Fn(&R) -> Id) -> HashMap<Id, &R> {
    let mut index = HashMap::with_capacity(rows.len());
    for row in rows {
        index.entry(key_of(row)).or_insert(row);
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Row(i64, &'static str);

    #[derive(Debug, PartialEq)]
    struct Link(i64, i64);

    fn key(row: &Row) -> Id {
        Id(row.0)
    }

    #[test]
    fn lookup_takes_first_match_in_table_order() {
        let right = [Row(1, "a"), Row(2, "b"), Row(1, "c")];
        assert_eq!(lookup(&right, Id(1), key), Some(&Row(1, "a")));
        assert_eq!(lookup(&right, Id(9), key), None);
    }

    #[test]
    fn lookup_join_leaves_unmatched_as_none() {
        let left = [Row(10, "x"), Row(11, "y"), Row(12, "z")];
        let right = [Row(1, "a")];
        let fks = [Some(Id(1)), Some(Id(5)), None];

        let joined = lookup_join(&left, &right, |row| fks[(row.0 - 10) as usize], key);
        let names: Vec<_> = joined.iter().map(|(_, r)| r.map(|r| r.1)).collect();
        assert_eq!(names, vec![Some("a"), None, None]);
    }

    #[test]
    fn junction_join_keeps_junction_order_and_dangling_links() {
        let left = [Row(1, "food"), Row(2, "other")];
        let junction = [Link(1, 20), Link(3, 10), Link(1, 10), Link(1, 99)];
        let right = [Row(10, "queso"), Row(20, "pan")];

        let joined = junction_join(
            &left,
            key,
            &junction,
            |l| Id(l.0),
            |l| Id(l.1),
            &right,
            key,
            |_, r| r.map(|r| r.1),
        );

        assert_eq!(joined[0].1, vec![Some("pan"), Some("queso"), None]);
        assert!(joined[1].1.is_empty());
    }

    #[test]
    fn index_agrees_with_lookup_on_duplicates() {
        let rows = [Row(1, "a"), Row(1, "b")];
        let index = index_by(&rows, key);
        assert_eq!(index.get(&Id(1)).map(|r| r.1), Some("a"));
    }
}
