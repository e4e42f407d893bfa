//! Conjunction screening results
//!
//! Raw rows from a screening table are parsed into [`ConjunctionEvent`]s for a
//! primary satellite, classified by [`RiskThresholds`] and ordered by
//! [`priority_order`]. Nothing here depends on propagation; the catalog is
//! only used to resolve names.

mod analyzer;
mod record;
mod risk;
mod summary;

pub use analyzer::*;
pub use record::*;
pub use risk::*;
pub use summary::*;
