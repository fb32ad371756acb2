use std::sync::Arc;

use serde::Serialize;

use crate::criteria::SearchCriteria;

/// Identity of a catalog product as seen by the collection graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl CatalogItem {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Query capability consumed by dynamic collections.
pub trait Catalog: Send + Sync {
    fn query(&self, criteria: &SearchCriteria) -> Vec<CatalogItem>;

    fn item(&self, id: &str) -> Option<CatalogItem>;
}

impl<C: Catalog + ?Sized> Catalog for &C {
    fn query(&self, criteria: &SearchCriteria) -> Vec<CatalogItem> {
        (**self).query(criteria)
    }

    fn item(&self, id: &str) -> Option<CatalogItem> {
        (**self).item(id)
    }
}

impl<C: Catalog + ?Sized> Catalog for Arc<C> {
    fn query(&self, criteria: &SearchCriteria) -> Vec<CatalogItem> {
        (**self).query(criteria)
    }

    fn item(&self, id: &str) -> Option<CatalogItem> {
        (**self).item(id)
    }
}
