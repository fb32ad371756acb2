use std::collections::HashSet;

use crate::catalog::CatalogItem;
use crate::describe::NodeRecord;
use crate::node::{Node, NodeKind, Shape};

/// Read access to a graph plus the rule for expanding a node into its effective children.
pub trait GraphView {
    type Kind: NodeKind;

    fn node(&self, id: &str) -> Option<&Node<Self::Kind>>;

    fn children_of(&self, node: &Node<Self::Kind>) -> Vec<ChildRef>;
}

/// Frontier entry: a stored node referenced by id, or a leaf computed at expansion time.
#[derive(Debug, Clone, PartialEq)]
pub enum ChildRef {
    Stored(String),
    Computed(CatalogItem),
}

impl ChildRef {
    pub fn id(&self) -> &str {
        match self {
            ChildRef::Stored(id) => id,
            ChildRef::Computed(item) => &item.id,
        }
    }

    fn key(&self) -> VisitKey {
        match self {
            ChildRef::Stored(id) => VisitKey::Stored(id.clone()),
            ChildRef::Computed(item) => VisitKey::Computed(item.id.clone()),
        }
    }
}

/// Stored ids and catalog ids come from different namespaces and never shadow each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum VisitKey {
    Stored(String),
    Computed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Visit<'g, K: NodeKind> {
    Node(&'g Node<K>),
    Computed(CatalogItem),
}

impl<'g, K: NodeKind> Visit<'g, K> {
    pub fn id(&self) -> &str {
        match self {
            Visit::Node(node) => node.id(),
            Visit::Computed(item) => &item.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Visit::Node(node) => node.name(),
            Visit::Computed(item) => &item.name,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Visit::Node(node) => node.description(),
            Visit::Computed(item) => &item.description,
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            Visit::Node(node) => node.shape(),
            Visit::Computed(_) => Shape::Leaf,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.shape().is_leaf()
    }

    pub fn as_node(&self) -> Option<&'g Node<K>> {
        match self {
            Visit::Node(node) => Some(node),
            Visit::Computed(_) => None,
        }
    }

    pub fn describe(&self) -> NodeRecord {
        match self {
            Visit::Node(node) => node.describe(),
            Visit::Computed(item) => NodeRecord::computed_leaf(item),
        }
    }
}

/// Depth-first, pre-order walk below a start node. Holds no borrow of the graph between
/// calls, so the graph may change between `next` calls or before `reset`.
#[derive(Debug, Clone)]
pub struct Traversal {
    start: String,
    frontier: Vec<ChildRef>,
    visited: HashSet<VisitKey>,
}

impl Traversal {
    /// Returns `None` when the start node is missing, is a leaf, or has no effective children.
    pub fn new<V: GraphView>(view: &V, start: &str) -> Option<Self> {
        let node = view.node(start)?;
        if node.is_leaf() {
            return None;
        }

        let mut traversal = Self {
            start: start.to_string(),
            frontier: Vec::new(),
            visited: HashSet::new(),
        };
        traversal.seed(view.children_of(node));

        if traversal.has_next() {
            Some(traversal)
        } else {
            None
        }
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn has_next(&self) -> bool {
        !self.frontier.is_empty()
    }

    pub fn next<'g, V: GraphView>(&mut self, view: &'g V) -> Option<Visit<'g, V::Kind>> {
        while let Some(entry) = self.frontier.pop() {
            if !self.visited.insert(entry.key()) {
                continue;
            }

            let visit = match entry {
                ChildRef::Stored(id) => {
                    let Some(node) = view.node(&id) else {
                        tracing::warn!(node_id = %id, start = %self.start, "skipping dangling child reference");
                        continue;
                    };
                    self.push_children(view.children_of(node));
                    Visit::Node(node)
                }
                ChildRef::Computed(item) => Visit::Computed(item),
            };

            self.prune();
            return Some(visit);
        }
        None
    }

    /// Starts over from the start node's current children.
    pub fn reset<V: GraphView>(&mut self, view: &V) {
        self.frontier.clear();
        self.visited.clear();

        let children = match view.node(&self.start) {
            Some(node) if !node.is_leaf() => view.children_of(node),
            _ => Vec::new(),
        };
        self.seed(children);
    }

    pub fn walk<V: GraphView>(self, view: &V) -> Walk<'_, V> {
        Walk {
            view,
            traversal: self,
        }
    }

    fn seed(&mut self, children: Vec<ChildRef>) {
        self.visited.insert(VisitKey::Stored(self.start.clone()));
        self.push_children(children);
        self.prune();
    }

    fn push_children(&mut self, children: Vec<ChildRef>) {
        self.frontier.extend(children.into_iter().rev());
    }

    // Drops already-visited entries from the top so `has_next` implies another yield.
    fn prune(&mut self) {
        while self
            .frontier
            .last()
            .is_some_and(|top| self.visited.contains(&top.key()))
        {
            self.frontier.pop();
        }
    }
}

pub struct Walk<'g, V: GraphView> {
    view: &'g V,
    traversal: Traversal,
}

impl<'g, V: GraphView> Walk<'g, V> {
    pub fn traversal(&self) -> &Traversal {
        &self.traversal
    }
}

impl<'g, V: GraphView> Iterator for Walk<'g, V> {
    type Item = Visit<'g, V::Kind>;

    fn next(&mut self) -> Option<Self::Item> {
        self.traversal.next(self.view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphStore;
    use crate::node::EntitlementKind;

    fn store_with(roles: &[&str], permissions: &[&str]) -> GraphStore<EntitlementKind> {
        let mut store = GraphStore::new(Node::new(EntitlementKind::Role, "root_access", "", ""));
        for id in roles {
            store
                .create(Node::new(EntitlementKind::Role, *id, *id, ""))
                .unwrap();
        }
        for id in permissions {
            store
                .create(Node::new(EntitlementKind::Permission, *id, *id, ""))
                .unwrap();
        }
        store
    }

    fn ids<V: GraphView>(view: &V, start: &str) -> Vec<String> {
        Traversal::new(view, start)
            .map(|t| t.walk(view).map(|v| v.id().to_string()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn leaf_has_no_iterator() {
        let store = store_with(&[], &["publish"]);

        assert!(Traversal::new(&store, "publish").is_none());
    }

    #[test]
    fn empty_composite_has_no_iterator() {
        let store = store_with(&["editor"], &[]);

        assert!(Traversal::new(&store, "editor").is_none());
    }

    #[test]
    fn missing_start_has_no_iterator() {
        let store = store_with(&[], &[]);

        assert!(Traversal::new(&store, "ghost").is_none());
    }

    #[test]
    fn yields_depth_first_pre_order() {
        // a -> [b, e]; b -> [c, d]
        let mut store = store_with(&["a", "b"], &["c", "d", "e"]);
        store.attach("a", "b").unwrap();
        store.attach("a", "e").unwrap();
        store.attach("b", "c").unwrap();
        store.attach("b", "d").unwrap();

        assert_eq!(ids(&store, "a"), vec!["b", "c", "d", "e"]);
    }

    #[test]
    fn start_node_is_not_yielded() {
        let mut store = store_with(&["a"], &["b"]);
        store.attach("a", "b").unwrap();

        let visited = ids(&store, "a");

        assert!(!visited.contains(&"a".to_string()));
    }

    #[test]
    fn diamond_yields_shared_node_once() {
        // top -> [left, right]; left -> [shared]; right -> [shared]
        let mut store = store_with(&["top", "left", "right"], &["shared"]);
        store.attach("top", "left").unwrap();
        store.attach("top", "right").unwrap();
        store.attach("left", "shared").unwrap();
        store.attach("right", "shared").unwrap();

        assert_eq!(ids(&store, "top"), vec!["left", "shared", "right"]);
    }

    #[test]
    fn cycle_terminates() {
        // a -> b -> c -> a
        let mut store = store_with(&["a", "b", "c"], &[]);
        store.attach("a", "b").unwrap();
        store.attach("b", "c").unwrap();
        store.attach("c", "a").unwrap();

        assert_eq!(ids(&store, "a"), vec!["b", "c"]);
        assert_eq!(ids(&store, "b"), vec!["c", "a"]);
    }

    #[test]
    fn self_loop_only_has_no_iterator() {
        let mut store = store_with(&["a"], &[]);
        store.attach("a", "a").unwrap();

        assert!(Traversal::new(&store, "a").is_none());
    }

    #[test]
    fn has_next_is_false_once_only_visited_entries_remain() {
        let mut store = store_with(&["top", "left", "right"], &["shared"]);
        store.attach("top", "left").unwrap();
        store.attach("top", "right").unwrap();
        store.attach("left", "shared").unwrap();
        store.attach("right", "shared").unwrap();

        let mut traversal = Traversal::new(&store, "top").unwrap();
        let mut count = 0;
        while traversal.has_next() {
            assert!(traversal.next(&store).is_some());
            count += 1;
        }

        assert_eq!(count, 3);
        assert!(traversal.next(&store).is_none());
    }

    #[test]
    fn reset_reproduces_fresh_sequence() {
        let mut store = store_with(&["a", "b"], &["c", "d"]);
        store.attach("a", "b").unwrap();
        store.attach("a", "d").unwrap();
        store.attach("b", "c").unwrap();

        let mut traversal = Traversal::new(&store, "a").unwrap();
        let mut first = Vec::new();
        while let Some(v) = traversal.next(&store) {
            first.push(v.id().to_string());
        }

        traversal.reset(&store);
        let second: Vec<String> = traversal.walk(&store).map(|v| v.id().to_string()).collect();

        assert_eq!(first, vec!["b", "c", "d"]);
        assert_eq!(first, second);
    }

    #[test]
    fn reset_reflects_structural_changes() {
        let mut store = store_with(&["a"], &["b", "c"]);
        store.attach("a", "b").unwrap();

        let mut traversal = Traversal::new(&store, "a").unwrap();
        store.attach("a", "c").unwrap();
        traversal.reset(&store);

        let after: Vec<String> = traversal.walk(&store).map(|v| v.id().to_string()).collect();
        assert_eq!(after, vec!["b", "c"]);
    }

    #[test]
    fn dangling_child_is_skipped() {
        let mut store = store_with(&["a"], &["b"]);
        store.attach("a", "b").unwrap();
        store
            .get_mut("a")
            .unwrap()
            .push_child("vanished".to_string());

        assert_eq!(ids(&store, "a"), vec!["b"]);
    }
}
