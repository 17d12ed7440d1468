//! Source-level precedence between the static snapshot and the dynamic store.
//!
//! This is the one merge used both by the request-time catalog build and by
//! the refinement pass over a re-fetched payload, so both always agree.

use std::collections::{HashMap, HashSet};

use super::domain::ModelRecord;
use super::ordering::sort_by_id;

/// Which precedence rule produced a merged list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The dynamic source contributed nothing.
    StaticOnly,
    /// The dynamic source had at least as many records and replaced the snapshot.
    DynamicAuthoritative,
    /// The dynamic source was partial and overrode matching slugs only.
    MergedBySlug,
}

impl MergeOutcome {
    /// Value of the `x-catalog-merge` response header.
    pub fn header_value(self) -> &'static str {
        match self {
            MergeOutcome::StaticOnly => "static-only",
            MergeOutcome::DynamicAuthoritative => "dynamic-authoritative",
            MergeOutcome::MergedBySlug => "merged-by-slug",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedSources {
    pub records: Vec<ModelRecord>,
    pub outcome: MergeOutcome,
}

/// Combines the snapshot with whatever the dynamic source returned (empty
/// when it was unreachable) and orders the result by id.
///
/// * no dynamic records: the snapshot is used as-is;
/// * `dynamic.len() >= snapshot.len()`: the dynamic records replace the snapshot;
/// * otherwise each snapshot entry is swapped for the dynamic record with the
///   same slug, and dynamic records with unknown slugs are appended.
pub fn merge_sources(snapshot: &[ModelRecord], dynamic: Vec<ModelRecord>) -> MergedSources {
    let dynamic = dedupe_by_slug(dynamic);

    let (mut records, outcome) = if dynamic.is_empty() {
        (snapshot.to_vec(), MergeOutcome::StaticOnly)
    } else if dynamic.len() >= snapshot.len() {
        (dynamic, MergeOutcome::DynamicAuthoritative)
    } else {
        (merge_by_slug(snapshot, dynamic), MergeOutcome::MergedBySlug)
    };

    sort_by_id(&mut records);
    MergedSources { records, outcome }
}

/// Snapshot slugs that a [`MergeOutcome::DynamicAuthoritative`] merge would drop.
pub fn dropped_slugs<'a>(snapshot: &'a [ModelRecord], merged: &[ModelRecord]) -> Vec<&'a str> {
    let kept: HashSet<&str> = merged.iter().map(|record| record.slug.as_str()).collect();
    snapshot
        .iter()
        .map(|record| record.slug.as_str())
        .filter(|slug| !kept.contains(slug))
        .collect()
}

fn merge_by_slug(snapshot: &[ModelRecord], dynamic: Vec<ModelRecord>) -> Vec<ModelRecord> {
    let snapshot_slugs: HashSet<&str> = snapshot.iter().map(|record| record.slug.as_str()).collect();

    let mut appended = Vec::new();
    let mut by_slug: HashMap<String, ModelRecord> = HashMap::new();
    for record in dynamic {
        if snapshot_slugs.contains(record.slug.as_str()) {
            by_slug.insert(record.slug.clone(), record);
        } else {
            appended.push(record);
        }
    }

    let mut merged: Vec<ModelRecord> = snapshot
        .iter()
        .map(|record| {
            by_slug
                .remove(&record.slug)
                .unwrap_or_else(|| record.clone())
        })
        .collect();
    merged.extend(appended);
    merged
}

fn dedupe_by_slug(records: Vec<ModelRecord>) -> Vec<ModelRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| {
            let fresh = seen.insert(record.slug.clone());
            if !fresh {
                tracing::warn!(slug = %record.slug, "dynamic catalog returned a duplicate slug, keeping the first");
            }
            fresh
        })
        .collect()
}
