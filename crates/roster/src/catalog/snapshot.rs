use std::collections::HashSet;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;

use super::discovery::MediaDiscovery;
use super::domain::{ModelRecord, ModelStats, RawModelRecord};

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to read catalog snapshot {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("catalog snapshot is not a valid JSON array of models: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog snapshot lists slug '{0}' more than once")]
    DuplicateSlug(String),
    #[error("failed to write catalog snapshot: {0}")]
    Write(#[source] std::io::Error),
}

/// The bundled, read-only catalog used for first paint and as the fallback
/// when the relational store is unavailable.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    records: Vec<ModelRecord>,
}

impl StaticCatalog {
    pub fn new(records: Vec<ModelRecord>) -> Result<Self, SnapshotError> {
        let mut seen = HashSet::new();
        for record in &records {
            if !seen.insert(record.slug.as_str()) {
                return Err(SnapshotError::DuplicateSlug(record.slug.clone()));
            }
        }
        Ok(Self { records })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| SnapshotError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SnapshotError> {
        let raw: Vec<RawModelRecord> = serde_json::from_reader(reader)?;
        let records = raw
            .into_iter()
            .filter_map(|record| {
                let slug = record.slug.clone();
                let normalized = record.normalize();
                if normalized.is_none() {
                    tracing::warn!(?slug, "skipping snapshot entry without a slug");
                }
                normalized
            })
            .collect();
        Self::new(records)
    }

    pub fn records(&self) -> &[ModelRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, slug: &str) -> Option<&ModelRecord> {
        self.records.iter().find(|record| record.slug == slug)
    }
}

/// Entry written to the snapshot file. Galleries are omitted: the site
/// rediscovers them from the media directories.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub stats: ModelStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    pub featured_image: String,
}

/// Counts reported after a snapshot is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotSummary {
    pub models: usize,
    pub embedded: usize,
    pub unresolved: usize,
}

/// Builds snapshot entries from store records, optionally inlining local
/// featured images as `data:` URIs so first paint needs no extra request.
#[derive(Debug)]
pub struct SnapshotWriter<'a> {
    discovery: &'a MediaDiscovery,
    embed_featured: bool,
}

impl<'a> SnapshotWriter<'a> {
    pub fn new(discovery: &'a MediaDiscovery, embed_featured: bool) -> Self {
        Self {
            discovery,
            embed_featured,
        }
    }

    pub fn entries(&self, records: &[ModelRecord]) -> (Vec<SnapshotEntry>, SnapshotSummary) {
        let mut summary = SnapshotSummary {
            models: records.len(),
            ..SnapshotSummary::default()
        };

        let entries = records
            .iter()
            .map(|record| {
                let featured_image = if self.embed_featured {
                    match self.embed(&record.featured_image) {
                        Embedded::Inlined(uri) => {
                            summary.embedded += 1;
                            uri
                        }
                        Embedded::Kept => record.featured_image.clone(),
                        Embedded::Unresolved => {
                            summary.unresolved += 1;
                            record.featured_image.clone()
                        }
                    }
                } else {
                    record.featured_image.clone()
                };

                SnapshotEntry {
                    id: record.id.clone(),
                    slug: record.slug.clone(),
                    name: record.name.clone(),
                    stats: record.stats.clone(),
                    instagram: record.instagram.clone(),
                    featured_image,
                }
            })
            .collect();

        (entries, summary)
    }

    pub fn write<W: Write>(
        &self,
        records: &[ModelRecord],
        mut writer: W,
    ) -> Result<SnapshotSummary, SnapshotError> {
        let (entries, summary) = self.entries(records);
        serde_json::to_writer_pretty(&mut writer, &entries)
            .map_err(|err| SnapshotError::Write(err.into()))?;
        writer.write_all(b"\n").map_err(SnapshotError::Write)?;
        Ok(summary)
    }

    fn embed(&self, featured_image: &str) -> Embedded {
        if featured_image.is_empty()
            || featured_image.starts_with("data:")
            || featured_image.contains("://")
        {
            return Embedded::Kept;
        }

        let Some(path) = self.discovery.local_path(featured_image) else {
            return Embedded::Unresolved;
        };

        match std::fs::read(&path) {
            Ok(bytes) => Embedded::Inlined(data_uri(&path, &bytes)),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "featured image not readable");
                Embedded::Unresolved
            }
        }
    }
}

enum Embedded {
    Inlined(String),
    Kept,
    Unresolved,
}

/// `data:<mime>;base64,<payload>` for a local file.
pub fn data_uri(path: &Path, bytes: &[u8]) -> String {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    format!("data:{};base64,{}", mime.essence_str(), STANDARD.encode(bytes))
}
