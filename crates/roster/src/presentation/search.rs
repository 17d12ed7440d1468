use crate::catalog::ModelRecord;

/// Case-insensitive substring match on name or slug. A blank query matches nothing.
pub fn search<'a>(records: &'a [ModelRecord], query: &str) -> Vec<&'a ModelRecord> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    records
        .iter()
        .filter(|record| {
            record.name.to_lowercase().contains(&query) || record.slug.to_lowercase().contains(&query)
        })
        .collect()
}
