use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use trellis_core::access::TokenId;
use trellis_core::criteria::SearchCriteria;
use trellis_core::describe::NodeRecord;
use trellis_core::graph::{GraphError, GraphStore, ResolvedGraph, Visit};
use trellis_core::node::{CollectionKind, Node};
use trellis_storage::CatalogStore;

use crate::audit;
use crate::error::AdminError;
use crate::permissions;

use super::{AccessService, clean_id};

pub const ROOT_COLLECTION: &str = "root_collection";

/// What an attach call refers to by its child id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Product,
    Collection,
}

impl FromStr for ContentKind {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "product" => Ok(ContentKind::Product),
            "collection" => Ok(ContentKind::Collection),
            other => Err(GraphError::TypeConstraint(format!(
                "unknown content kind '{other}'"
            ))),
        }
    }
}

pub struct CollectionService<S: CatalogStore> {
    access: Arc<AccessService>,
    catalog: Arc<S>,
    graph: Mutex<GraphStore<CollectionKind>>,
}

impl<S: CatalogStore> CollectionService<S> {
    pub fn new(access: Arc<AccessService>, catalog: Arc<S>) -> Self {
        let root = Node::new(
            CollectionKind::Static,
            ROOT_COLLECTION,
            "Root collection",
            "Holds every top-level collection",
        );
        Self {
            access,
            catalog,
            graph: Mutex::new(GraphStore::new(root)),
        }
    }

    fn graph(&self) -> MutexGuard<'_, GraphStore<CollectionKind>> {
        self.graph.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// New collections start out under the root collection.
    pub fn create_collection(
        &self,
        token: &TokenId,
        kind: CollectionKind,
        id: &str,
        name: &str,
        description: &str,
    ) -> Result<(), AdminError> {
        let actor = self
            .access
            .authorize(token, permissions::CREATE_COLLECTION)?;
        if kind == CollectionKind::Product {
            return Err(GraphError::TypeConstraint(
                "products enter collections through attach_content".to_string(),
            )
            .into());
        }
        let id = clean_id(id);

        self.graph()
            .create(Node::new(kind, id.as_str(), name, description))?;

        audit::audit_mutation(&actor, "create_collection", &id);
        Ok(())
    }

    /// Attaches a catalog product or an existing collection under `parent_id`.
    ///
    /// Attaching a collection moves it: it is removed from the root collection first. Products
    /// are never placed directly under the root collection.
    pub fn attach_content(
        &self,
        token: &TokenId,
        parent_id: &str,
        child_id: &str,
        kind: ContentKind,
    ) -> Result<(), AdminError> {
        let actor = self.access.authorize(token, permissions::ADD_CONTENT)?;
        let (parent_id, child_id) = (clean_id(parent_id), clean_id(child_id));

        match kind {
            ContentKind::Product => self.attach_product(&parent_id, &child_id)?,
            ContentKind::Collection => self.attach_collection(&parent_id, &child_id)?,
        }

        audit::audit_mutation(&actor, "attach_content", &format!("{parent_id}/{child_id}"));
        Ok(())
    }

    fn attach_product(&self, parent_id: &str, product_id: &str) -> Result<(), AdminError> {
        let item = self
            .catalog
            .item(product_id)
            .ok_or_else(|| AdminError::not_found("product", product_id))?;

        let mut graph = self.graph();
        if parent_id == graph.root_id() {
            return Err(GraphError::TypeConstraint(format!(
                "product '{product_id}' cannot be placed directly under '{parent_id}'"
            ))
            .into());
        }
        let parent = graph
            .get(parent_id)
            .ok_or_else(|| GraphError::NotFound(parent_id.to_string()))?;

        match graph.get(product_id) {
            Some(existing) if !existing.is_leaf() => {
                return Err(GraphError::TypeConstraint(format!(
                    "'{product_id}' names a collection, not a product"
                ))
                .into());
            }
            Some(existing) => parent.admit(existing)?,
            None => {
                let proxy = Node::new(
                    CollectionKind::Product,
                    item.id.as_str(),
                    item.name.as_str(),
                    item.description.as_str(),
                );
                parent.admit(&proxy)?;
                graph.register(proxy)?;
            }
        }

        graph.attach(parent_id, product_id)?;
        Ok(())
    }

    fn attach_collection(&self, parent_id: &str, child_id: &str) -> Result<(), AdminError> {
        let mut graph = self.graph();
        let child = graph
            .get(child_id)
            .ok_or_else(|| GraphError::NotFound(child_id.to_string()))?;
        if child.is_leaf() {
            return Err(GraphError::TypeConstraint(format!(
                "'{child_id}' is a product, not a collection"
            ))
            .into());
        }

        let root_id = graph.root_id().to_string();
        if parent_id == root_id {
            graph.attach(parent_id, child_id)?;
            return Ok(());
        }

        graph.check_attach(parent_id, child_id)?;
        graph.detach(&root_id, child_id)?;
        graph.attach(parent_id, child_id)?;
        Ok(())
    }

    pub fn set_dynamic_criteria(
        &self,
        token: &TokenId,
        collection_id: &str,
        criteria: SearchCriteria,
    ) -> Result<(), AdminError> {
        let actor = self.access.authorize(token, permissions::ADD_CONTENT)?;
        let collection_id = clean_id(collection_id);

        let mut graph = self.graph();
        let node = graph
            .get_mut(&collection_id)
            .ok_or_else(|| GraphError::NotFound(collection_id.clone()))?;
        node.set_criteria(Some(criteria))?;
        drop(graph);

        audit::audit_mutation(&actor, "set_dynamic_criteria", &collection_id);
        Ok(())
    }

    /// Collections reachable from the root whose name or description contains `text`.
    /// Matching is case-sensitive; blank text matches every collection.
    pub fn search(&self, text: &str) -> Vec<NodeRecord> {
        let graph = self.graph();
        let view = ResolvedGraph::new(&*graph, &*self.catalog);
        let Some(traversal) = view.traverse(graph.root_id()) else {
            return Vec::new();
        };

        let text = text.trim();
        let hits: Vec<NodeRecord> = traversal
            .walk(&view)
            .filter_map(|visit| match visit {
                Visit::Node(node) if !node.is_leaf() => Some(node),
                _ => None,
            })
            .filter(|node| {
                text.is_empty() || node.name().contains(text) || node.description().contains(text)
            })
            .map(Node::describe)
            .collect();

        tracing::debug!(text, hits = hits.len(), "collection search");
        hits
    }

    /// Everything reachable below `collection_id`, or below the root when `None`.
    ///
    /// Returns `Ok(None)` for products and collections without effective contents.
    pub fn contents(&self, collection_id: Option<&str>) -> Result<Option<Vec<NodeRecord>>, AdminError> {
        let graph = self.graph();
        let start = collection_id
            .map(str::trim)
            .unwrap_or_else(|| graph.root_id())
            .to_string();
        if !graph.contains(&start) {
            return Err(GraphError::NotFound(start).into());
        }

        let view = ResolvedGraph::new(&*graph, &*self.catalog);
        Ok(view
            .traverse(&start)
            .map(|traversal| traversal.walk(&view).map(|v| v.describe()).collect()))
    }

    pub fn collection(&self, id: &str) -> Option<NodeRecord> {
        self.graph().get(id.trim()).map(Node::describe)
    }

    /// Root first, then every collection and product proxy in creation order.
    pub fn inventory(&self) -> Vec<NodeRecord> {
        self.graph().nodes().map(Node::describe).collect()
    }
}

#[cfg(test)]
mod tests {
    use trellis_core::access::{SessionPolicy, SystemClock};
    use trellis_core::criteria::ContentType;
    use trellis_storage::{Country, Device, InMemoryCatalog, Product};

    use super::*;
    use crate::config::BootstrapConfig;

    struct Fixture {
        svc: CollectionService<InMemoryCatalog>,
        catalog: Arc<InMemoryCatalog>,
        token: TokenId,
    }

    fn fixture() -> Fixture {
        let bootstrap = BootstrapConfig::default();
        let access = Arc::new(
            AccessService::new(SessionPolicy::default(), Arc::new(SystemClock), &bootstrap)
                .unwrap(),
        );
        let token = access
            .login(&bootstrap.login, &bootstrap.password)
            .unwrap();
        let catalog = Arc::new(InMemoryCatalog::new());
        catalog
            .insert_country(Country::new("US", "United States", true))
            .unwrap();
        catalog
            .insert_device(Device::new("iphone", "iPhone", "Apple"))
            .unwrap();
        let svc = CollectionService::new(access, Arc::clone(&catalog));
        Fixture {
            svc,
            catalog,
            token,
        }
    }

    fn add_product(catalog: &InMemoryCatalog, id: &str, rating: i32) {
        catalog
            .insert_product(Product {
                id: id.to_string(),
                name: format!("{id} name"),
                author: "Acme".to_string(),
                description: "desc".to_string(),
                content_type: ContentType::Application,
                categories: vec!["games".to_string()],
                rating,
                price: 1.0,
                languages: vec!["en_US".to_string()],
                countries: vec!["US".to_string()],
                devices: vec!["iphone".to_string()],
                image_url: "https://img.example/x.png".to_string(),
            })
            .unwrap();
    }

    fn ids(records: &[NodeRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn new_collections_land_under_root() {
        let fx = fixture();
        fx.svc
            .create_collection(&fx.token, CollectionKind::Static, "games", "Games", "")
            .unwrap();

        let root = fx.svc.collection(ROOT_COLLECTION).unwrap();

        assert_eq!(root.children, vec!["games"]);
    }

    #[test]
    fn product_kind_cannot_be_created_directly() {
        let fx = fixture();

        let err = fx
            .svc
            .create_collection(&fx.token, CollectionKind::Product, "p1", "", "")
            .unwrap_err();

        assert_eq!(err.kind(), "TypeConstraint");
    }

    #[test]
    fn attaching_collection_moves_it_off_root() {
        let fx = fixture();
        fx.svc
            .create_collection(&fx.token, CollectionKind::Static, "games", "Games", "")
            .unwrap();
        fx.svc
            .create_collection(&fx.token, CollectionKind::Static, "puzzles", "Puzzles", "")
            .unwrap();

        fx.svc
            .attach_content(&fx.token, "games", "puzzles", ContentKind::Collection)
            .unwrap();

        assert_eq!(fx.svc.collection(ROOT_COLLECTION).unwrap().children, vec!["games"]);
        assert_eq!(fx.svc.collection("games").unwrap().children, vec!["puzzles"]);
    }

    #[test]
    fn failed_move_leaves_collection_under_root() {
        let fx = fixture();
        add_product(&fx.catalog, "p1", 3);
        fx.svc
            .create_collection(&fx.token, CollectionKind::Static, "games", "Games", "")
            .unwrap();
        fx.svc
            .create_collection(&fx.token, CollectionKind::Static, "puzzles", "Puzzles", "")
            .unwrap();
        fx.svc
            .attach_content(&fx.token, "games", "p1", ContentKind::Product)
            .unwrap();

        let err = fx
            .svc
            .attach_content(&fx.token, "p1", "puzzles", ContentKind::Collection)
            .unwrap_err();

        assert_eq!(err.kind(), "UnsupportedOperation");
        assert_eq!(
            fx.svc.collection(ROOT_COLLECTION).unwrap().children,
            vec!["games", "puzzles"]
        );
    }

    #[test]
    fn product_attach_requires_catalog_entry() {
        let fx = fixture();
        fx.svc
            .create_collection(&fx.token, CollectionKind::Static, "games", "Games", "")
            .unwrap();

        let err = fx
            .svc
            .attach_content(&fx.token, "games", "ghost", ContentKind::Product)
            .unwrap_err();

        assert_eq!(err.kind(), "NotFound");
    }

    #[test]
    fn product_cannot_go_under_root() {
        let fx = fixture();
        add_product(&fx.catalog, "p1", 3);

        let err = fx
            .svc
            .attach_content(&fx.token, ROOT_COLLECTION, "p1", ContentKind::Product)
            .unwrap_err();

        assert_eq!(err.kind(), "TypeConstraint");
        assert!(fx.svc.collection("p1").is_none());
    }

    #[test]
    fn product_cannot_be_stored_under_dynamic_collection() {
        let fx = fixture();
        add_product(&fx.catalog, "p1", 3);
        fx.svc
            .create_collection(&fx.token, CollectionKind::Dynamic, "top", "Top", "")
            .unwrap();

        let err = fx
            .svc
            .attach_content(&fx.token, "top", "p1", ContentKind::Product)
            .unwrap_err();

        assert_eq!(err.kind(), "TypeConstraint");
        assert!(fx.svc.collection("p1").is_none());
    }

    #[test]
    fn same_product_under_two_collections_shares_proxy() {
        let fx = fixture();
        add_product(&fx.catalog, "p1", 3);
        for id in ["a", "b"] {
            fx.svc
                .create_collection(&fx.token, CollectionKind::Static, id, id, "")
                .unwrap();
            fx.svc
                .attach_content(&fx.token, id, "p1", ContentKind::Product)
                .unwrap();
        }

        let everything = fx.svc.contents(None).unwrap().unwrap();

        assert_eq!(ids(&everything), vec!["a", "p1", "b"]);
    }

    #[test]
    fn product_attach_rejects_id_naming_a_collection() {
        let fx = fixture();
        add_product(&fx.catalog, "games", 4);
        for id in ["games", "shelf"] {
            fx.svc
                .create_collection(&fx.token, CollectionKind::Static, id, id, "")
                .unwrap();
        }

        let err = fx
            .svc
            .attach_content(&fx.token, "shelf", "games", ContentKind::Product)
            .unwrap_err();

        assert_eq!(err.kind(), "TypeConstraint");
        assert!(fx.svc.collection("shelf").unwrap().children.is_empty());
        assert_eq!(
            fx.svc.collection(ROOT_COLLECTION).unwrap().children,
            vec!["games", "shelf"]
        );
    }

    #[test]
    fn computed_product_does_not_hide_collection_with_same_id() {
        let fx = fixture();
        add_product(&fx.catalog, "games", 5);
        fx.svc
            .create_collection(&fx.token, CollectionKind::Dynamic, "top", "Top", "")
            .unwrap();
        fx.svc
            .set_dynamic_criteria(&fx.token, "top", SearchCriteria::default())
            .unwrap();
        fx.svc
            .create_collection(&fx.token, CollectionKind::Static, "games", "Games", "")
            .unwrap();

        let found = fx.svc.search("");
        let everything = fx.svc.contents(None).unwrap().unwrap();

        assert_eq!(ids(&found), vec!["top", "games"]);
        assert_eq!(ids(&everything), vec!["top", "games", "games"]);
        assert!(everything[1].computed);
        assert!(!everything[2].computed);
    }

    #[test]
    fn dynamic_collection_resolves_against_catalog() {
        let fx = fixture();
        add_product(&fx.catalog, "p3", 3);
        add_product(&fx.catalog, "p5", 5);
        fx.svc
            .create_collection(&fx.token, CollectionKind::Dynamic, "top", "Top rated", "")
            .unwrap();
        fx.svc
            .set_dynamic_criteria(&fx.token, "top", SearchCriteria::default().with_min_rating(4))
            .unwrap();

        let contents = fx.svc.contents(Some("top")).unwrap().unwrap();

        assert_eq!(ids(&contents), vec!["p5"]);
        assert!(contents[0].computed);
    }

    #[test]
    fn criteria_rejected_on_static_collection_and_when_invalid() {
        let fx = fixture();
        fx.svc
            .create_collection(&fx.token, CollectionKind::Static, "games", "Games", "")
            .unwrap();
        fx.svc
            .create_collection(&fx.token, CollectionKind::Dynamic, "top", "Top", "")
            .unwrap();

        let on_static = fx
            .svc
            .set_dynamic_criteria(&fx.token, "games", SearchCriteria::default())
            .unwrap_err();
        let invalid = fx
            .svc
            .set_dynamic_criteria(&fx.token, "top", SearchCriteria::default().with_max_price(-1.0))
            .unwrap_err();

        assert_eq!(on_static.kind(), "TypeConstraint");
        assert_eq!(invalid.kind(), "ValidationFailed");
    }

    #[test]
    fn search_matches_name_or_description() {
        let fx = fixture();
        fx.svc
            .create_collection(&fx.token, CollectionKind::Static, "games", "Games", "fun stuff")
            .unwrap();
        fx.svc
            .create_collection(&fx.token, CollectionKind::Dynamic, "ringers", "Ringtones", "")
            .unwrap();

        assert_eq!(ids(&fx.svc.search("fun")), vec!["games"]);
        assert_eq!(ids(&fx.svc.search("Ring")), vec!["ringers"]);
        assert!(fx.svc.search("ring").is_empty());
        assert_eq!(ids(&fx.svc.search("  ")), vec!["games", "ringers"]);
    }

    #[test]
    fn contents_of_empty_collection_is_absent() {
        let fx = fixture();
        fx.svc
            .create_collection(&fx.token, CollectionKind::Static, "games", "Games", "")
            .unwrap();

        assert!(fx.svc.contents(Some("games")).unwrap().is_none());
        assert_eq!(fx.svc.contents(Some("ghost")).unwrap_err().kind(), "NotFound");
    }

    #[test]
    fn content_kind_parses() {
        assert_eq!("Product".parse::<ContentKind>().unwrap(), ContentKind::Product);
        assert_eq!(
            " collection ".parse::<ContentKind>().unwrap(),
            ContentKind::Collection
        );
        assert!("folder".parse::<ContentKind>().is_err());
    }
}
