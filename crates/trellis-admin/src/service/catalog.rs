use std::sync::Arc;

use trellis_core::access::TokenId;
use trellis_core::catalog::CatalogItem;
use trellis_core::criteria::SearchCriteria;
use trellis_storage::{CatalogStore, Country, Device, Product};

use crate::audit;
use crate::error::AdminError;
use crate::permissions;

use super::AccessService;

/// Gated write access to the product catalog.
pub struct CatalogService<S: CatalogStore> {
    access: Arc<AccessService>,
    store: Arc<S>,
}

impl<S: CatalogStore> CatalogService<S> {
    pub fn new(access: Arc<AccessService>, store: Arc<S>) -> Self {
        Self { access, store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn create_country(&self, token: &TokenId, country: Country) -> Result<(), AdminError> {
        let actor = self.access.authorize(token, permissions::CREATE_COUNTRY)?;
        let id = country.id.clone();
        self.store.insert_country(country)?;
        audit::audit_mutation(&actor, "create_country", &id);
        Ok(())
    }

    pub fn create_device(&self, token: &TokenId, device: Device) -> Result<(), AdminError> {
        let actor = self.access.authorize(token, permissions::CREATE_DEVICE)?;
        let id = device.id.clone();
        self.store.insert_device(device)?;
        audit::audit_mutation(&actor, "create_device", &id);
        Ok(())
    }

    pub fn create_product(&self, token: &TokenId, product: Product) -> Result<(), AdminError> {
        let actor = self.access.authorize(token, permissions::CREATE_PRODUCT)?;
        let id = product.id.clone();
        self.store.insert_product(product)?;
        audit::audit_mutation(&actor, "create_product", &id);
        Ok(())
    }

    pub fn product(&self, id: &str) -> Option<Product> {
        self.store.product(id.trim())
    }

    pub fn query(&self, criteria: &SearchCriteria) -> Result<Vec<CatalogItem>, AdminError> {
        criteria.validate()?;
        Ok(self.store.query(criteria))
    }
}
