use trellis_core::catalog::Catalog;

use crate::model::{Country, Device, Product};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("product '{0}' already exists")]
    DuplicateProduct(String),
    #[error("country '{0}' already exists")]
    DuplicateCountry(String),
    #[error("device '{0}' already exists")]
    DuplicateDevice(String),
    #[error("invalid product '{id}': {reason}")]
    InvalidProduct { id: String, reason: String },
    #[error("invalid country '{id}': {reason}")]
    InvalidCountry { id: String, reason: String },
    #[error("invalid device '{id}': {reason}")]
    InvalidDevice { id: String, reason: String },
    #[error("product '{product}' references unknown country '{country}'")]
    UnknownCountry { product: String, country: String },
    #[error("product '{product}' references unknown device '{device}'")]
    UnknownDevice { product: String, device: String },
}

/// Write and lookup surface of the product catalog. Queries come from [`Catalog`].
pub trait CatalogStore: Catalog {
    fn insert_country(&self, country: Country) -> Result<(), CatalogError>;

    fn insert_device(&self, device: Device) -> Result<(), CatalogError>;

    fn insert_product(&self, product: Product) -> Result<(), CatalogError>;

    fn product(&self, id: &str) -> Option<Product>;

    fn country(&self, id: &str) -> Option<Country>;

    fn device(&self, id: &str) -> Option<Device>;

    fn products(&self) -> Vec<Product>;

    fn countries(&self) -> Vec<Country>;

    fn devices(&self) -> Vec<Device>;
}
