use std::future::Future;

use super::domain::ModelRecord;

/// Queryable, authoritative copy of the catalog.
pub trait CatalogSource: Send + Sync {
    /// Every model with its gallery, in display order.
    fn fetch_models(&self) -> impl Future<Output = Result<Vec<ModelRecord>, SourceError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("catalog store is not configured")]
    NotConfigured,
    #[error("catalog store connection failed: {0}")]
    Connect(String),
    #[error("catalog store query failed: {0}")]
    Query(String),
    #[error("catalog store did not answer within {0:?}")]
    Timeout(std::time::Duration),
}

/// Why the dynamic source did or did not contribute to a catalog build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    Success,
    NotConfigured,
    ConnectionFailed,
}

impl SourceStatus {
    /// Value of the `x-database-status` response header.
    pub fn header_value(self) -> &'static str {
        match self {
            SourceStatus::Success => "success",
            SourceStatus::NotConfigured => "not-configured",
            SourceStatus::ConnectionFailed => "connection-failed",
        }
    }
}

impl From<&SourceError> for SourceStatus {
    fn from(error: &SourceError) -> Self {
        match error {
            SourceError::NotConfigured => SourceStatus::NotConfigured,
            SourceError::Connect(_) | SourceError::Query(_) | SourceError::Timeout(_) => {
                SourceStatus::ConnectionFailed
            }
        }
    }
}

