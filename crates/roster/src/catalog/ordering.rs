//! Orderings shared by media discovery and the reconciled catalog.

use std::cmp::Ordering;

use super::domain::ModelRecord;

/// Numeric-aware, case-insensitive file name comparison: digit runs compare by
/// value so `image2` sorts before `image10`. Names that only differ in case or
/// leading zeros fall back to a byte comparison so the order stays total.
pub fn natural_cmp(left: &str, right: &str) -> Ordering {
    let mut a = Chunks::new(left);
    let mut b = Chunks::new(right);

    loop {
        match (a.next(), b.next()) {
            (None, None) => return left.cmp(right),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ordering = compare_chunks(x, y);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

/// Catalog order: ids that parse as integers ascend numerically and come
/// first; everything else follows in lexical order.
pub fn compare_ids(left: &str, right: &str) -> Ordering {
    match (parse_id(left), parse_id(right)) {
        (Some(a), Some(b)) => a.cmp(&b).then_with(|| left.cmp(right)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => left.cmp(right),
    }
}

/// Stable in-place sort of records by [`compare_ids`].
pub fn sort_by_id(records: &mut [ModelRecord]) {
    records.sort_by(|a, b| compare_ids(&a.id, &b.id));
}

fn parse_id(id: &str) -> Option<i64> {
    id.trim().parse::<i64>().ok()
}

#[derive(Debug, Clone, Copy)]
enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Chunks<'a> {
    fn new(value: &'a str) -> Self {
        Self { rest: value }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .char_indices()
            .find(|(_, ch)| ch.is_ascii_digit() != digits)
            .map(|(index, _)| index)
            .unwrap_or(self.rest.len());

        let (chunk, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(if digits {
            Chunk::Digits(chunk)
        } else {
            Chunk::Text(chunk)
        })
    }
}

fn compare_chunks(left: Chunk<'_>, right: Chunk<'_>) -> Ordering {
    match (left, right) {
        (Chunk::Digits(a), Chunk::Digits(b)) => {
            let a = a.trim_start_matches('0');
            let b = b.trim_start_matches('0');
            a.len().cmp(&b.len()).then_with(|| a.cmp(b))
        }
        (Chunk::Digits(_), Chunk::Text(_)) => Ordering::Less,
        (Chunk::Text(_), Chunk::Digits(_)) => Ordering::Greater,
        (Chunk::Text(a), Chunk::Text(b)) => a
            .chars()
            .flat_map(char::to_lowercase)
            .cmp(b.chars().flat_map(char::to_lowercase)),
    }
}
