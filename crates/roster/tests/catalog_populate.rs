//! Runs against the Postgres server in `DATABASE_URL`:
//! `cargo test -p roster --test catalog_populate -- --ignored`.

use roster::catalog::{CatalogPopulator, CatalogStore, MediaDiscovery, ModelRecord, ModelStats};
use sqlx::PgPool;

const REJECT_FLAGGED_INSERTS: &str = r#"
CREATE FUNCTION reject_flagged_image() RETURNS trigger AS $$
BEGIN
    IF NEW.src LIKE '%flagged%' THEN
        RAISE EXCEPTION 'image % rejected', NEW.src;
    END IF;
    RETURN NEW;
END
$$ LANGUAGE plpgsql;

CREATE TRIGGER reject_flagged_image BEFORE INSERT ON images
    FOR EACH ROW EXECUTE FUNCTION reject_flagged_image();
"#;

fn model(id: &str, slug: &str) -> ModelRecord {
    ModelRecord {
        id: id.to_string(),
        slug: slug.to_string(),
        name: slug.to_uppercase(),
        stats: ModelStats::default(),
        instagram: None,
        featured_image: String::new(),
        gallery: Vec::new(),
    }
}

async fn stored_sources(pool: &PgPool, slug: &str) -> Vec<String> {
    sqlx::query_scalar::<_, String>(
        r#"SELECT i.src FROM images i JOIN models m ON m.id = i.model_id
           WHERE m.slug = $1 ORDER BY i."order""#,
    )
    .bind(slug)
    .fetch_all(pool)
    .await
    .expect("images query")
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a Postgres server in DATABASE_URL"]
async fn populate_seeds_models_and_galleries(pool: PgPool) {
    let media = tempfile::tempdir().expect("tempdir");
    let dir = media.path().join("ana");
    std::fs::create_dir_all(&dir).expect("slug directory");
    for file in ["cover.jpg", "look2.webp", "look1.webp"] {
        std::fs::write(dir.join(file), b"media").expect("media file");
    }
    let discovery = MediaDiscovery::new(media.path(), "/models");

    let report = CatalogPopulator::new(&pool, &discovery)
        .run(&[model("1", "ana"), model("2", "bo")])
        .await
        .expect("populate");

    assert_eq!(report.inserted_models, 2);
    assert_eq!(report.inserted_images, 2);
    assert!(report.failed.is_empty());
    assert_eq!(
        stored_sources(&pool, "ana").await,
        vec!["/models/ana/look1.webp", "/models/ana/look2.webp"]
    );

    let rerun = CatalogPopulator::new(&pool, &discovery)
        .run(&[model("1", "ana"), model("2", "bo")])
        .await
        .expect("populate again");
    assert_eq!(rerun.inserted_models, 0);
    assert_eq!(rerun.inserted_images + rerun.deleted_images + rerun.reordered_images, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a Postgres server in DATABASE_URL"]
async fn failed_gallery_sync_leaves_stored_rows_untouched(pool: PgPool) {
    let media = tempfile::tempdir().expect("tempdir");
    let dir = media.path().join("ana");
    std::fs::create_dir_all(&dir).expect("slug directory");
    std::fs::write(dir.join("cover.jpg"), b"media").expect("media file");
    let discovery = MediaDiscovery::new(media.path(), "/models");

    CatalogPopulator::new(&pool, &discovery)
        .run(&[model("1", "ana")])
        .await
        .expect("seed");
    let model_id: i32 = sqlx::query_scalar("SELECT id FROM models WHERE slug = 'ana'")
        .fetch_one(&pool)
        .await
        .expect("model id");
    sqlx::query(r#"INSERT INTO images (id, model_id, type, src, alt, "order") VALUES ($1, $2, 'image', '/models/ana/old.webp', NULL, 0)"#)
        .bind(uuid::Uuid::new_v4())
        .bind(model_id)
        .execute(&pool)
        .await
        .expect("stale image");
    sqlx::raw_sql(REJECT_FLAGGED_INSERTS)
        .execute(&pool)
        .await
        .expect("trigger");

    // The sync deletes old.webp and inserts look1.webp before flagged.webp is rejected.
    for file in ["look1.webp", "look2-flagged.webp"] {
        std::fs::write(dir.join(file), b"media").expect("media file");
    }

    let report = CatalogPopulator::new(&pool, &discovery)
        .run(&[model("1", "ana")])
        .await
        .expect("populate");

    assert_eq!(report.failed, vec!["ana".to_string()]);
    assert_eq!(report.synced_models, 0);
    assert_eq!(stored_sources(&pool, "ana").await, vec!["/models/ana/old.webp"]);

    let mut conn = pool.acquire().await.expect("connection");
    let stored = CatalogStore::images_for_model(&mut conn, model_id)
        .await
        .expect("images");
    assert_eq!(stored.len(), 1);
}
