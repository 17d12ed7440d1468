//! Catalog assembly: the bundled snapshot, the relational store and the
//! media directories reconciled into one ordered list of models.

pub mod audit;
pub mod discovery;
pub mod domain;
pub mod merge;
pub mod ordering;
pub mod populate;
pub mod postgres;
pub mod reconciler;
pub mod snapshot;
pub mod source;

pub use audit::{audit_media, MediaAudit};
pub use discovery::{DiscoveredFile, DiscoveredMedia, DiscoveryError, MediaDiscovery};
pub use domain::{MediaItem, MediaKind, ModelRecord, ModelStats, RawModelRecord};
pub use merge::{merge_sources, MergeOutcome, MergedSources};
pub use ordering::{compare_ids, sort_by_id};
pub use populate::{CatalogPopulator, PopulateReport};
pub use postgres::{CatalogStore, ConnectionHandle, PgCatalogSource};
pub use reconciler::{Catalog, CatalogReconciler, DynamicCatalog};
pub use snapshot::{SnapshotError, SnapshotSummary, SnapshotWriter, StaticCatalog};
pub use source::{CatalogSource, SourceError, SourceStatus};
