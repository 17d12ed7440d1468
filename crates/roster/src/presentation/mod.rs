//! View models for the site pages built from a reconciled catalog.

pub mod cards;
pub mod detail;
pub mod refinement;
pub mod router;
pub mod search;

pub use cards::{cards, spotlight_sets, ModelCard, StatLine, SPOTLIGHT_SET_SIZE};
pub use detail::ModelDetail;
pub use refinement::CatalogRefinement;
pub use router::catalog_router;
pub use search::search;
