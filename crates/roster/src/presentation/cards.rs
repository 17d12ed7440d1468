use serde::Serialize;

use crate::catalog::{ModelRecord, ModelStats};

/// Cards rendered above the fold load eagerly.
pub const PRIORITY_CARDS: usize = 4;

pub const SPOTLIGHT_SET_SIZE: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatLine {
    pub label: &'static str,
    pub value: String,
}

/// Height, hips and waist are always shown; the rest only when present.
pub(crate) fn stat_lines(stats: &ModelStats, shoe_label: &'static str) -> Vec<StatLine> {
    let mut lines = vec![
        StatLine {
            label: "Height",
            value: stats.height.clone(),
        },
        StatLine {
            label: "Hips",
            value: stats.hips.clone(),
        },
        StatLine {
            label: "Waist",
            value: stats.waist.clone(),
        },
    ];

    let optional = [
        ("Bust", &stats.bust),
        (shoe_label, &stats.shoe_size),
        ("Hair", &stats.hair_color),
        ("Eyes", &stats.eye_color),
    ];
    lines.extend(
        optional
            .into_iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(label, value)| StatLine {
                label,
                value: value.clone(),
            }),
    );
    lines
}

/// Grid tile for one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelCard {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub featured_image: String,
    pub href: String,
    pub stats: Vec<StatLine>,
    pub priority: bool,
}

impl ModelCard {
    pub fn new(record: &ModelRecord, index: usize) -> Self {
        Self {
            id: record.id.clone(),
            slug: record.slug.clone(),
            name: record.name.clone(),
            featured_image: record.featured_image.clone(),
            href: format!("/models/{}/", record.slug),
            stats: stat_lines(&record.stats, "Shoe"),
            priority: index < PRIORITY_CARDS,
        }
    }
}

pub fn cards(records: &[ModelRecord]) -> Vec<ModelCard> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| ModelCard::new(record, index))
        .collect()
}

/// Splits cards into rotating groups of `size`. The last group is filled up
/// with cards picked by its own position, wrapping around the full list, and
/// an empty input still yields one empty group.
pub fn spotlight_sets<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    if items.is_empty() || size == 0 {
        return vec![Vec::new()];
    }

    let mut sets: Vec<Vec<T>> = items.chunks(size).map(<[T]>::to_vec).collect();
    if let Some(last) = sets.last_mut() {
        while last.len() < size {
            let next = items[last.len() % items.len()].clone();
            last.push(next);
        }
    }
    sets
}
