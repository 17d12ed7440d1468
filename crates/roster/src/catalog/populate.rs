use std::collections::{HashMap, HashSet};

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::discovery::{DiscoveredMedia, MediaDiscovery};
use super::domain::{MediaKind, ModelRecord};
use super::postgres::{CatalogStore, ImageRow, ModelRow, NewImage, NewModel};

/// An image row the sync wants to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedImage {
    pub kind: MediaKind,
    pub src: String,
    pub alt: String,
    pub order: i32,
}

/// Row changes that bring one model's stored gallery in line with its media directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GallerySync {
    pub delete: Vec<Uuid>,
    pub insert: Vec<PlannedImage>,
    pub reorder: Vec<(Uuid, i32)>,
}

impl GallerySync {
    pub fn is_empty(&self) -> bool {
        self.delete.is_empty() && self.insert.is_empty() && self.reorder.is_empty()
    }
}

/// Compares stored images against the discovered gallery. The featured image
/// is excluded from the gallery; stored rows whose `src` vanished are deleted,
/// new files are inserted and surviving rows are renumbered.
pub fn plan_gallery_sync(
    slug: &str,
    existing: &[ImageRow],
    discovered: &DiscoveredMedia,
    featured: &str,
) -> GallerySync {
    let wanted: Vec<PlannedImage> = discovered
        .gallery
        .iter()
        .filter(|file| file.path != featured)
        .zip(0_i32..)
        .map(|(file, order)| {
            let item = file.to_media_item(slug);
            PlannedImage {
                kind: item.kind,
                src: item.src,
                alt: item.alt,
                order,
            }
        })
        .collect();

    let wanted_srcs: HashSet<&str> = wanted.iter().map(|image| image.src.as_str()).collect();
    let stored: HashMap<&str, &ImageRow> = existing.iter().map(|row| (row.src.as_str(), row)).collect();

    let mut sync = GallerySync {
        delete: existing
            .iter()
            .filter(|row| !wanted_srcs.contains(row.src.as_str()))
            .map(|row| row.id)
            .collect(),
        ..GallerySync::default()
    };

    for image in wanted {
        match stored.get(image.src.as_str()) {
            Some(row) if row.order != image.order => sync.reorder.push((row.id, image.order)),
            Some(_) => {}
            None => sync.insert.push(image),
        }
    }

    sync
}

/// Totals reported by `catalog populate`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulateReport {
    pub inserted_models: usize,
    pub synced_models: usize,
    pub inserted_images: usize,
    pub deleted_images: usize,
    pub reordered_images: usize,
    pub failed: Vec<String>,
}

/// Seeds the relational store from the snapshot and keeps each model's
/// gallery rows in step with the media directories.
#[derive(Debug)]
pub struct CatalogPopulator<'a> {
    pool: &'a PgPool,
    discovery: &'a MediaDiscovery,
}

impl<'a> CatalogPopulator<'a> {
    pub fn new(pool: &'a PgPool, discovery: &'a MediaDiscovery) -> Self {
        Self { pool, discovery }
    }

    pub async fn run(&self, snapshot: &[ModelRecord]) -> Result<PopulateReport, sqlx::Error> {
        let mut report = PopulateReport::default();

        let existing: HashSet<String> = CatalogStore::list_models(self.pool)
            .await?
            .into_iter()
            .map(|row| row.slug)
            .collect();
        let mut next_order = CatalogStore::max_display_order(self.pool)
            .await?
            .map_or(0, |max| max + 1);

        let mut conn = self.pool.acquire().await?;
        for record in snapshot.iter().filter(|record| !existing.contains(&record.slug)) {
            let discovered = self.discover(&record.slug);
            let featured = discovered
                .featured_image
                .as_deref()
                .or(Some(record.featured_image.as_str()).filter(|path| !path.is_empty()));

            let model = NewModel {
                slug: &record.slug,
                name: &record.name,
                stats: &record.stats,
                instagram: record.instagram.as_deref(),
                featured_image: featured,
                display_order: next_order,
            };
            match CatalogStore::insert_model(&mut conn, &model).await {
                Ok(true) => {
                    tracing::info!(slug = %record.slug, display_order = next_order, "inserted model");
                    report.inserted_models += 1;
                    next_order += 1;
                }
                Ok(false) => {}
                Err(err) => {
                    tracing::error!(slug = %record.slug, error = %err, "failed to insert model");
                    report.failed.push(record.slug.clone());
                }
            }
        }
        drop(conn);

        for model in CatalogStore::list_models(self.pool).await? {
            if let Err(err) = self.sync_model(&model, &mut report).await {
                tracing::error!(slug = %model.slug, error = %err, "failed to sync model media");
                report.failed.push(model.slug.clone());
            }
        }

        Ok(report)
    }

    async fn sync_model(&self, model: &ModelRow, report: &mut PopulateReport) -> Result<(), sqlx::Error> {
        let discovered = self.discover(&model.slug);
        let featured = discovered
            .featured_image
            .clone()
            .or_else(|| model.featured_image.clone())
            .unwrap_or_default();

        // Each model's gallery is rewritten atomically; an error drops the
        // transaction and leaves the stored rows untouched.
        let mut tx = self.pool.begin().await?;
        let existing = CatalogStore::images_for_model(&mut tx, model.id).await?;
        let sync = plan_gallery_sync(&model.slug, &existing, &discovered, &featured);
        apply_gallery_sync(&mut tx, model.id, &sync).await?;

        let featured = Some(featured).filter(|path| !path.is_empty());
        if featured != model.featured_image {
            CatalogStore::update_featured_image(&mut tx, model.id, featured.as_deref()).await?;
        }
        tx.commit().await?;

        if !sync.is_empty() {
            tracing::info!(
                slug = %model.slug,
                inserted = sync.insert.len(),
                deleted = sync.delete.len(),
                reordered = sync.reorder.len(),
                "synced gallery"
            );
        }
        report.synced_models += 1;
        report.inserted_images += sync.insert.len();
        report.deleted_images += sync.delete.len();
        report.reordered_images += sync.reorder.len();
        Ok(())
    }

    fn discover(&self, slug: &str) -> DiscoveredMedia {
        self.discovery.discover(slug).unwrap_or_else(|err| {
            tracing::warn!(slug, error = %err, "media discovery failed");
            DiscoveredMedia::default()
        })
    }
}

async fn apply_gallery_sync(
    conn: &mut PgConnection,
    model_id: i32,
    sync: &GallerySync,
) -> Result<(), sqlx::Error> {
    for id in &sync.delete {
        CatalogStore::delete_image(conn, *id).await?;
    }
    for image in &sync.insert {
        let row = NewImage {
            model_id,
            kind: image.kind,
            src: &image.src,
            alt: &image.alt,
            order: image.order,
        };
        CatalogStore::insert_image(conn, &row).await?;
    }
    for (id, order) in &sync.reorder {
        CatalogStore::update_image_order(conn, *id, *order).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::discovery::DiscoveredFile;

    fn file(name: &str, kind: MediaKind) -> DiscoveredFile {
        DiscoveredFile {
            path: format!("/models/ana/{name}"),
            kind,
            name: name.to_string(),
        }
    }

    fn row(src: &str, order: i32) -> ImageRow {
        ImageRow {
            id: Uuid::new_v4(),
            model_id: 1,
            src: src.to_string(),
            order,
        }
    }

    #[test]
    fn plans_inserts_deletes_and_reorders() {
        let discovered = DiscoveredMedia {
            slug: "ana".to_string(),
            featured_image: Some("/models/ana/image1.webp".to_string()),
            gallery: vec![
                file("image1.webp", MediaKind::Image),
                file("image2.webp", MediaKind::Image),
                file("image3.webp", MediaKind::Image),
                file("walk.mp4", MediaKind::Video),
            ],
        };
        let stale = row("/models/ana/old.webp", 0);
        let shifted = row("/models/ana/image3.webp", 0);
        let kept = row("/models/ana/image2.webp", 0);
        let existing = vec![stale.clone(), shifted.clone(), kept];

        let sync = plan_gallery_sync("ana", &existing, &discovered, "/models/ana/image1.webp");

        assert_eq!(sync.delete, vec![stale.id]);
        assert_eq!(sync.reorder, vec![(shifted.id, 1)]);
        assert_eq!(
            sync.insert,
            vec![PlannedImage {
                kind: MediaKind::Video,
                src: "/models/ana/walk.mp4".to_string(),
                alt: "ana - walk".to_string(),
                order: 2,
            }]
        );
    }

    #[test]
    fn in_sync_gallery_plans_nothing() {
        let discovered = DiscoveredMedia {
            slug: "ana".to_string(),
            featured_image: None,
            gallery: vec![file("a.jpg", MediaKind::Image)],
        };
        let existing = vec![row("/models/ana/a.jpg", 0)];
        assert!(plan_gallery_sync("ana", &existing, &discovered, "").is_empty());
    }
}
