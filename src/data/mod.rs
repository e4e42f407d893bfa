//! Element sets, the owned catalog and catalog loading

mod catalog;
pub(crate) mod element_set;
mod loader;

pub use catalog::*;
pub use element_set::*;
pub use loader::*;
