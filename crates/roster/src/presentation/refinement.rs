use std::fmt::Display;

use crate::catalog::{merge_sources, MergeOutcome, ModelRecord};

/// The list shown at first paint, refined once the dynamic payload arrives.
///
/// Refinement goes through [`merge_sources`], so a refined list is always
/// what the server would have built from the same two inputs.
#[derive(Debug, Clone)]
pub struct CatalogRefinement {
    rendered: Vec<ModelRecord>,
    current: Vec<ModelRecord>,
}

impl CatalogRefinement {
    pub fn new(rendered: Vec<ModelRecord>) -> Self {
        Self {
            current: rendered.clone(),
            rendered,
        }
    }

    /// Merges a fetched payload over the rendered list. Errors and empty
    /// payloads leave the current list untouched.
    pub fn apply<E: Display>(&mut self, fetched: Result<Vec<ModelRecord>, E>) -> MergeOutcome {
        let fetched = match fetched {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!(error = %err, "catalog refinement fetch failed, keeping rendered list");
                return MergeOutcome::StaticOnly;
            }
        };
        if fetched.is_empty() {
            return MergeOutcome::StaticOnly;
        }

        let merged = merge_sources(&self.rendered, fetched);
        self.current = merged.records;
        merged.outcome
    }

    pub fn records(&self) -> &[ModelRecord] {
        &self.current
    }
}
