pub mod memory;
pub mod model;
pub mod traits;

pub use memory::InMemoryCatalog;
pub use model::{Country, Device, Product};
pub use traits::{CatalogError, CatalogStore};
