use crate::infra::{load_reconciler, media_discovery};
use clap::Args;
use roster::catalog::{
    audit_media, CatalogPopulator, CatalogSource, CatalogStore, MediaAudit, PgCatalogSource,
    PopulateReport, SnapshotWriter, StaticCatalog,
};
use roster::config::AppConfig;
use roster::error::AppError;
use roster::telemetry;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct BuildArgs {
    /// Pretty-print the JSON output
    #[arg(long)]
    pub(crate) pretty: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct SnapshotArgs {
    /// Destination file (defaults to CATALOG_SNAPSHOT_PATH)
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Inline local featured images as base64 data URIs
    #[arg(long)]
    pub(crate) embed_featured: bool,
}

fn prepare() -> Result<AppConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    Ok(config)
}

pub(crate) async fn run_build(args: BuildArgs) -> Result<(), AppError> {
    let config = prepare()?;
    let reconciler = load_reconciler(&config)?;
    let catalog = reconciler.build().await;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if args.pretty {
        serde_json::to_writer_pretty(&mut out, &catalog.records)?;
    } else {
        serde_json::to_writer(&mut out, &catalog.records)?;
    }
    writeln!(out)?;

    eprintln!(
        "{} models ({}, store {})",
        catalog.records.len(),
        catalog.outcome.header_value(),
        catalog.source_status.header_value()
    );
    Ok(())
}

pub(crate) async fn run_snapshot(args: SnapshotArgs) -> Result<(), AppError> {
    let config = prepare()?;
    let source = PgCatalogSource::new(config.database.clone());
    let records = source.fetch_models().await?;

    let discovery = media_discovery(&config);
    let output = args
        .output
        .unwrap_or_else(|| config.catalog.snapshot_path.clone());
    if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(&output)?);
    let summary = SnapshotWriter::new(&discovery, args.embed_featured).write(&records, &mut writer)?;
    writer.flush()?;

    println!("Wrote {} models to {}", summary.models, output.display());
    if args.embed_featured {
        println!(
            "Featured images embedded: {} (unresolved: {})",
            summary.embedded, summary.unresolved
        );
    }
    Ok(())
}

pub(crate) async fn run_populate() -> Result<(), AppError> {
    let config = prepare()?;
    let snapshot = StaticCatalog::from_path(&config.catalog.snapshot_path)?;
    let source = PgCatalogSource::new(config.database.clone());
    let pool = source.pool().await?;

    CatalogStore::migrate(&pool).await?;
    println!("Found {} models in the snapshot", snapshot.len());

    let discovery = media_discovery(&config);
    let report = CatalogPopulator::new(&pool, &discovery)
        .run(snapshot.records())
        .await?;
    render_populate_report(&report);
    Ok(())
}

fn render_populate_report(report: &PopulateReport) {
    println!("Catalog population complete");
    println!("  models inserted: {}", report.inserted_models);
    println!("  models synced:   {}", report.synced_models);
    println!(
        "  images: +{} / -{} / reordered {}",
        report.inserted_images, report.deleted_images, report.reordered_images
    );
    if !report.failed.is_empty() {
        println!("  failed: {}", report.failed.join(", "));
    }
}

pub(crate) fn run_audit() -> Result<(), AppError> {
    let config = prepare()?;
    let snapshot = StaticCatalog::from_path(&config.catalog.snapshot_path)?;
    let audit = audit_media(snapshot.records(), &media_discovery(&config))?;
    render_audit(&audit);
    Ok(())
}

fn render_audit(audit: &MediaAudit) {
    if audit.is_clean() {
        println!("Media directories and catalog records line up.");
        return;
    }

    let sections = [
        ("Directories without a record", &audit.orphan_directories),
        ("Records without a directory", &audit.missing_directories),
        ("Directories without a usable image", &audit.without_featured),
    ];
    for (title, slugs) in sections {
        if slugs.is_empty() {
            continue;
        }
        println!("{title} ({}):", slugs.len());
        for slug in slugs {
            println!("  - {slug}");
        }
    }
}
