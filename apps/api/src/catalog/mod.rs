// Catalog: loading, snapshot storage, browse and compare.
// The matching engine reads snapshots from here and never mutates them.

pub mod handlers;
pub mod loader;
pub mod store;

pub use loader::LoadError;
pub use store::{Catalog, CatalogStore};
