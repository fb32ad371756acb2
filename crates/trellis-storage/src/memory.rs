use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use trellis_core::catalog::{Catalog, CatalogItem};
use trellis_core::criteria::SearchCriteria;

use crate::model::{Country, Device, Product};
use crate::traits::{CatalogError, CatalogStore};

#[derive(Debug, Default)]
struct InnerState {
    products: Vec<Product>,
    product_index: HashMap<String, usize>,
    countries: Vec<Country>,
    devices: Vec<Device>,
}

impl InnerState {
    fn has_country(&self, id: &str) -> bool {
        self.countries.iter().any(|c| c.id == id)
    }

    fn has_device(&self, id: &str) -> bool {
        self.devices.iter().any(|d| d.id == id)
    }
}

/// Catalog held entirely in memory. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    state: Arc<Mutex<InnerState>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, InnerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Catalog for InMemoryCatalog {
    /// Matching products in insertion order.
    fn query(&self, criteria: &SearchCriteria) -> Vec<CatalogItem> {
        let state = self.lock();
        state
            .products
            .iter()
            .filter(|p| p.matches(criteria))
            .map(Product::item)
            .collect()
    }

    fn item(&self, id: &str) -> Option<CatalogItem> {
        self.product(id).map(|p| p.item())
    }
}

impl CatalogStore for InMemoryCatalog {
    fn insert_country(&self, country: Country) -> Result<(), CatalogError> {
        country.validate()?;
        let mut state = self.lock();
        if state.has_country(&country.id) {
            return Err(CatalogError::DuplicateCountry(country.id));
        }
        tracing::debug!(country_id = %country.id, "country stored");
        state.countries.push(country);
        Ok(())
    }

    fn insert_device(&self, device: Device) -> Result<(), CatalogError> {
        device.validate()?;
        let mut state = self.lock();
        if state.has_device(&device.id) {
            return Err(CatalogError::DuplicateDevice(device.id));
        }
        tracing::debug!(device_id = %device.id, "device stored");
        state.devices.push(device);
        Ok(())
    }

    fn insert_product(&self, product: Product) -> Result<(), CatalogError> {
        product.validate()?;
        let mut state = self.lock();
        if state.product_index.contains_key(&product.id) {
            return Err(CatalogError::DuplicateProduct(product.id));
        }
        if let Some(country) = product.countries.iter().find(|c| !state.has_country(c)) {
            return Err(CatalogError::UnknownCountry {
                product: product.id.clone(),
                country: country.clone(),
            });
        }
        if let Some(device) = product.devices.iter().find(|d| !state.has_device(d)) {
            return Err(CatalogError::UnknownDevice {
                product: product.id.clone(),
                device: device.clone(),
            });
        }

        tracing::debug!(product_id = %product.id, rating = product.rating, "product stored");
        let position = state.products.len();
        state.product_index.insert(product.id.clone(), position);
        state.products.push(product);
        Ok(())
    }

    fn product(&self, id: &str) -> Option<Product> {
        let state = self.lock();
        state
            .product_index
            .get(id)
            .and_then(|&idx| state.products.get(idx))
            .cloned()
    }

    fn country(&self, id: &str) -> Option<Country> {
        self.lock().countries.iter().find(|c| c.id == id).cloned()
    }

    fn device(&self, id: &str) -> Option<Device> {
        self.lock().devices.iter().find(|d| d.id == id).cloned()
    }

    fn products(&self) -> Vec<Product> {
        self.lock().products.clone()
    }

    fn countries(&self) -> Vec<Country> {
        self.lock().countries.clone()
    }

    fn devices(&self) -> Vec<Device> {
        self.lock().devices.clone()
    }
}
