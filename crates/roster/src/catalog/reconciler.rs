use std::sync::Arc;

use super::discovery::{DiscoveredMedia, MediaDiscovery};
use super::domain::ModelRecord;
use super::merge::{dropped_slugs, merge_sources, MergeOutcome};
use super::snapshot::StaticCatalog;
use super::source::{CatalogSource, SourceStatus};

/// Reconciled catalog for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub records: Vec<ModelRecord>,
    pub outcome: MergeOutcome,
    pub source_status: SourceStatus,
}

/// Payload of the public catalog endpoint: only what the dynamic source
/// returned, media-reconciled, or nothing when it was unavailable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicCatalog {
    pub records: Vec<ModelRecord>,
    pub status: SourceStatus,
}

/// Merges the dynamic source, the bundled snapshot and discovered media into
/// one ordered catalog. Source failures never escape: an unreachable store
/// means the snapshot is served, an unreadable media directory means an
/// entity without discovered media.
#[derive(Debug)]
pub struct CatalogReconciler<S> {
    source: Arc<S>,
    snapshot: Arc<StaticCatalog>,
    discovery: MediaDiscovery,
}

impl<S> Clone for CatalogReconciler<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            snapshot: Arc::clone(&self.snapshot),
            discovery: self.discovery.clone(),
        }
    }
}

impl<S> CatalogReconciler<S>
where
    S: CatalogSource + 'static,
{
    pub fn new(source: Arc<S>, snapshot: Arc<StaticCatalog>, discovery: MediaDiscovery) -> Self {
        Self {
            source,
            snapshot,
            discovery,
        }
    }

    pub fn snapshot(&self) -> &StaticCatalog {
        &self.snapshot
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn build(&self) -> Catalog {
        let (dynamic, source_status) = self.fetch_dynamic().await;
        let merged = merge_sources(self.snapshot.records(), dynamic);

        match merged.outcome {
            MergeOutcome::DynamicAuthoritative => {
                let dropped = dropped_slugs(self.snapshot.records(), &merged.records);
                if !dropped.is_empty() {
                    tracing::warn!(
                        dropped = ?dropped,
                        "dynamic catalog replaced the snapshot without these slugs"
                    );
                }
            }
            MergeOutcome::MergedBySlug => {
                tracing::info!(
                    merged = merged.records.len(),
                    snapshot = self.snapshot.len(),
                    "dynamic catalog is partial, merged by slug"
                );
            }
            MergeOutcome::StaticOnly => {}
        }

        Catalog {
            records: self.attach_media(merged.records),
            outcome: merged.outcome,
            source_status,
        }
    }

    /// Builds the catalog and returns one entity.
    pub async fn model_by_slug(&self, slug: &str) -> Option<ModelRecord> {
        self.build()
            .await
            .records
            .into_iter()
            .find(|record| record.slug == slug)
    }

    pub async fn dynamic_catalog(&self) -> DynamicCatalog {
        let (records, status) = self.fetch_dynamic().await;
        DynamicCatalog {
            records: self.attach_media(records),
            status,
        }
    }

    /// Per-entity media reconciliation; order is preserved.
    pub fn attach_media(&self, records: Vec<ModelRecord>) -> Vec<ModelRecord> {
        records
            .into_iter()
            .map(|record| {
                let discovered = match self.discovery.discover(&record.slug) {
                    Ok(media) => media,
                    Err(err) => {
                        tracing::warn!(slug = %record.slug, error = %err, "media discovery failed");
                        DiscoveredMedia::default()
                    }
                };
                reconcile_media(record, discovered)
            })
            .collect()
    }

    async fn fetch_dynamic(&self) -> (Vec<ModelRecord>, SourceStatus) {
        match self.source.fetch_models().await {
            Ok(records) => {
                tracing::debug!(count = records.len(), "dynamic catalog fetched");
                (records, SourceStatus::Success)
            }
            Err(err) => {
                let status = SourceStatus::from(&err);
                if status == SourceStatus::NotConfigured {
                    tracing::debug!("catalog store not configured, serving snapshot");
                } else {
                    tracing::warn!(error = %err, "catalog store unavailable, serving snapshot");
                }
                (Vec::new(), status)
            }
        }
    }
}

/// Resolves the featured image and gallery of one record against what was
/// found on disk. The featured image never remains inside the gallery.
pub fn reconcile_media(mut record: ModelRecord, discovered: DiscoveredMedia) -> ModelRecord {
    let featured = discovered
        .featured_image
        .or_else(|| Some(record.featured_image.clone()).filter(|path| !path.is_empty()))
        .unwrap_or_default();

    let gallery = if record.gallery.is_empty() {
        discovered
            .gallery
            .iter()
            .filter(|file| file.path != featured)
            .map(|file| file.to_media_item(&record.slug))
            .collect()
    } else {
        std::mem::take(&mut record.gallery)
            .into_iter()
            .filter(|item| item.src != featured)
            .collect()
    };

    record.featured_image = featured;
    record.gallery = gallery;
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::discovery::DiscoveredFile;
    use crate::catalog::domain::{MediaItem, MediaKind, ModelStats};

    fn record(slug: &str, featured: &str, gallery: Vec<MediaItem>) -> ModelRecord {
        ModelRecord {
            id: "1".to_string(),
            slug: slug.to_string(),
            name: slug.to_string(),
            stats: ModelStats::default(),
            instagram: None,
            featured_image: featured.to_string(),
            gallery,
        }
    }

    fn file(slug: &str, name: &str, kind: MediaKind) -> DiscoveredFile {
        DiscoveredFile {
            path: format!("/models/{slug}/{name}"),
            kind,
            name: name.to_string(),
        }
    }

    fn item(src: &str) -> MediaItem {
        MediaItem {
            kind: MediaKind::Image,
            src: src.to_string(),
            alt: "declared".to_string(),
            thumbnail: None,
        }
    }

    #[test]
    fn discovered_featured_wins_and_leaves_gallery() {
        let discovered = DiscoveredMedia {
            slug: "ana".to_string(),
            featured_image: Some("/models/ana/image1.webp".to_string()),
            gallery: vec![
                file("ana", "image1.webp", MediaKind::Image),
                file("ana", "image2.webp", MediaKind::Image),
                file("ana", "reel.mp4", MediaKind::Video),
            ],
        };

        let reconciled = reconcile_media(record("ana", "/old.jpg", Vec::new()), discovered);
        assert_eq!(reconciled.featured_image, "/models/ana/image1.webp");
        let srcs: Vec<&str> = reconciled.gallery.iter().map(|m| m.src.as_str()).collect();
        assert_eq!(srcs, vec!["/models/ana/image2.webp", "/models/ana/reel.mp4"]);
        assert_eq!(reconciled.gallery[0].alt, "ana - image2");
        assert_eq!(reconciled.gallery[1].kind, MediaKind::Video);
    }

    #[test]
    fn declared_gallery_is_kept_without_featured() {
        let discovered = DiscoveredMedia {
            slug: "bo".to_string(),
            featured_image: Some("/models/bo/cover.jpg".to_string()),
            gallery: vec![file("bo", "cover.jpg", MediaKind::Image)],
        };
        let declared = vec![item("/models/bo/cover.jpg"), item("https://cdn/bo-2.jpg")];

        let reconciled = reconcile_media(record("bo", "", declared), discovered);
        assert_eq!(reconciled.featured_image, "/models/bo/cover.jpg");
        assert_eq!(reconciled.gallery.len(), 1);
        assert_eq!(reconciled.gallery[0].src, "https://cdn/bo-2.jpg");
        assert_eq!(reconciled.gallery[0].alt, "declared");
    }

    #[test]
    fn falls_back_to_declared_featured_then_empty() {
        let reconciled = reconcile_media(
            record("cy", "data:image/webp;base64,AAAA", Vec::new()),
            DiscoveredMedia::default(),
        );
        assert_eq!(reconciled.featured_image, "data:image/webp;base64,AAAA");
        assert!(reconciled.gallery.is_empty());

        let reconciled = reconcile_media(record("di", "", Vec::new()), DiscoveredMedia::default());
        assert_eq!(reconciled.featured_image, "");
    }
}
