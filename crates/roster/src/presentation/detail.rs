use serde::Serialize;

use super::cards::{stat_lines, StatLine};
use crate::catalog::{MediaItem, MediaKind, ModelRecord};

/// Everything the model page renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDetail {
    pub slug: String,
    pub name: String,
    pub measurements: Vec<StatLine>,
    /// Carousel contents: featured image first, then the gallery.
    pub media: Vec<MediaItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
}

impl From<&ModelRecord> for ModelDetail {
    fn from(record: &ModelRecord) -> Self {
        let mut media = Vec::with_capacity(record.gallery.len() + 1);
        if !record.featured_image.is_empty() {
            media.push(MediaItem {
                kind: MediaKind::Image,
                src: record.featured_image.clone(),
                alt: format!("{} - Featured", record.name),
                thumbnail: None,
            });
        }
        media.extend(record.gallery.iter().cloned());

        Self {
            slug: record.slug.clone(),
            name: record.name.clone(),
            measurements: stat_lines(&record.stats, "Shoe Size"),
            media,
            instagram: record
                .instagram
                .as_ref()
                .filter(|handle| !handle.trim().is_empty())
                .cloned(),
        }
    }
}
