use std::collections::BTreeSet;

use super::discovery::{DiscoveryError, MediaDiscovery};
use super::domain::ModelRecord;

/// Mismatches between catalog records and media directories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaAudit {
    /// Directories under the media root with no record. These never reach the catalog.
    pub orphan_directories: Vec<String>,
    /// Records with no media directory; they render without discovered media.
    pub missing_directories: Vec<String>,
    /// Records whose directory holds no usable image.
    pub without_featured: Vec<String>,
}

impl MediaAudit {
    pub fn is_clean(&self) -> bool {
        self.orphan_directories.is_empty()
            && self.missing_directories.is_empty()
            && self.without_featured.is_empty()
    }
}

pub fn audit_media(records: &[ModelRecord], discovery: &MediaDiscovery) -> Result<MediaAudit, DiscoveryError> {
    let directories: BTreeSet<String> = discovery.discover_slugs()?.into_iter().collect();
    let slugs: BTreeSet<&str> = records.iter().map(|record| record.slug.as_str()).collect();

    let mut audit = MediaAudit {
        orphan_directories: directories
            .iter()
            .filter(|dir| !slugs.contains(dir.as_str()))
            .cloned()
            .collect(),
        ..MediaAudit::default()
    };

    for slug in slugs {
        if !directories.contains(slug) {
            audit.missing_directories.push(slug.to_string());
            continue;
        }
        match discovery.discover(slug) {
            Ok(media) if media.featured_image.is_none() => audit.without_featured.push(slug.to_string()),
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(slug, error = %err, "media discovery failed during audit");
                audit.without_featured.push(slug.to_string());
            }
        }
    }

    Ok(audit)
}
