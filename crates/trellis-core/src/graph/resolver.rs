use crate::catalog::Catalog;
use crate::node::{Node, NodeKind, Shape};

use super::store::GraphStore;
use super::traversal::{ChildRef, GraphView, Traversal};

/// A graph store whose computed nodes expand against a live catalog.
///
/// Catalog results are fetched on every expansion and never cached, so a traversal always
/// reflects the catalog as it is when the computed node is reached.
pub struct ResolvedGraph<'a, K: NodeKind, C: Catalog + ?Sized> {
    store: &'a GraphStore<K>,
    catalog: &'a C,
}

impl<'a, K: NodeKind, C: Catalog + ?Sized> ResolvedGraph<'a, K, C> {
    pub fn new(store: &'a GraphStore<K>, catalog: &'a C) -> Self {
        Self { store, catalog }
    }

    pub fn store(&self) -> &'a GraphStore<K> {
        self.store
    }

    pub fn traverse(&self, start_id: &str) -> Option<Traversal> {
        Traversal::new(self, start_id)
    }
}

impl<K: NodeKind, C: Catalog + ?Sized> GraphView for ResolvedGraph<'_, K, C> {
    type Kind = K;

    fn node(&self, id: &str) -> Option<&Node<K>> {
        self.store.get(id)
    }

    fn children_of(&self, node: &Node<K>) -> Vec<ChildRef> {
        let stored = self.store.children_of(node);
        if node.shape() != Shape::Computed {
            return stored;
        }
        let Some(criteria) = node.criteria() else {
            return stored;
        };

        let items = self.catalog.query(criteria);
        tracing::debug!(
            node_id = %node.id(),
            computed = items.len(),
            stored = stored.len(),
            "resolved computed children"
        );

        items
            .into_iter()
            .map(ChildRef::Computed)
            .chain(stored)
            .collect()
    }
}
