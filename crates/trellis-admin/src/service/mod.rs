mod access;
mod catalog;
mod collection;

pub use access::{AccessInventory, AccessService, ServiceRecord};
pub use catalog::CatalogService;
pub use collection::{CollectionService, ContentKind, ROOT_COLLECTION};

use std::sync::Arc;

use trellis_core::access::Clock;
use trellis_storage::CatalogStore;

use crate::config::AppConfig;
use crate::error::AdminError;
use crate::metrics::Metrics;

/// Ids arrive from seed files and the command line with stray whitespace.
pub(crate) fn clean_id(id: &str) -> String {
    id.trim().to_string()
}

/// The three administrative services wired in dependency order.
pub struct AdminServices<S: CatalogStore> {
    pub access: Arc<AccessService>,
    pub catalog: Arc<CatalogService<S>>,
    pub collections: Arc<CollectionService<S>>,
    pub metrics: Arc<Metrics>,
}

impl<S: CatalogStore> AdminServices<S> {
    pub fn build(config: &AppConfig, clock: Arc<dyn Clock>, store: Arc<S>) -> Result<Self, AdminError> {
        let metrics = Arc::new(Metrics::new());
        let access = Arc::new(
            AccessService::new(config.to_session_policy(), clock, &config.bootstrap)?
                .with_metrics(Arc::clone(&metrics)),
        );
        let catalog = Arc::new(CatalogService::new(Arc::clone(&access), Arc::clone(&store)));
        let collections = Arc::new(CollectionService::new(Arc::clone(&access), store));

        Ok(Self {
            access,
            catalog,
            collections,
            metrics,
        })
    }
}
