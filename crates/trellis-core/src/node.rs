use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::criteria::SearchCriteria;
use crate::describe::NodeRecord;
use crate::graph::GraphError;

/// Structural variant of a node, independent of its domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Leaf,
    Composite,
    Computed,
}

impl Shape {
    pub fn is_leaf(self) -> bool {
        matches!(self, Shape::Leaf)
    }

    pub fn holds_children(self) -> bool {
        !self.is_leaf()
    }
}

/// Domain-specific node kind. Each kind maps onto exactly one [`Shape`].
pub trait NodeKind: Copy + fmt::Debug + PartialEq + Eq + Send + Sync + 'static {
    fn shape(&self) -> Shape;

    fn label(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntitlementKind {
    Permission,
    Role,
}

impl NodeKind for EntitlementKind {
    fn shape(&self) -> Shape {
        match self {
            EntitlementKind::Permission => Shape::Leaf,
            EntitlementKind::Role => Shape::Composite,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            EntitlementKind::Permission => "permission",
            EntitlementKind::Role => "role",
        }
    }
}

impl FromStr for EntitlementKind {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permission" => Ok(EntitlementKind::Permission),
            "role" => Ok(EntitlementKind::Role),
            other => Err(GraphError::TypeConstraint(format!(
                "unknown entitlement kind '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    Product,
    Static,
    Dynamic,
}

impl NodeKind for CollectionKind {
    fn shape(&self) -> Shape {
        match self {
            CollectionKind::Product => Shape::Leaf,
            CollectionKind::Static => Shape::Composite,
            CollectionKind::Dynamic => Shape::Computed,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            CollectionKind::Product => "product",
            CollectionKind::Static => "static_collection",
            CollectionKind::Dynamic => "dynamic_collection",
        }
    }
}

impl FromStr for CollectionKind {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "product" => Ok(CollectionKind::Product),
            "static" => Ok(CollectionKind::Static),
            "dynamic" => Ok(CollectionKind::Dynamic),
            other => Err(GraphError::TypeConstraint(format!(
                "unknown collection kind '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node<K: NodeKind> {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) kind: K,
    pub(crate) children: Vec<String>,
    pub(crate) criteria: Option<SearchCriteria>,
}

impl<K: NodeKind> Node<K> {
    pub fn new(
        kind: K,
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            kind,
            children: Vec::new(),
            criteria: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn kind(&self) -> K {
        self.kind
    }

    pub fn shape(&self) -> Shape {
        self.kind.shape()
    }

    pub fn is_leaf(&self) -> bool {
        self.shape().is_leaf()
    }

    /// Stored child ids in insertion order. Computed children are not included.
    pub fn children(&self) -> &[String] {
        &self.children
    }

    pub fn has_child(&self, id: &str) -> bool {
        self.children.iter().any(|c| c == id)
    }

    pub fn criteria(&self) -> Option<&SearchCriteria> {
        self.criteria.as_ref()
    }

    /// Checks whether `child` may be attached under this node without mutating anything.
    pub fn admit(&self, child: &Node<K>) -> Result<(), GraphError> {
        if self.is_leaf() {
            return Err(GraphError::UnsupportedOperation {
                id: self.id.clone(),
                kind: self.kind.label(),
            });
        }

        if self.has_child(&child.id) {
            return Err(GraphError::ChildConflict {
                parent: self.id.clone(),
                child: child.id.clone(),
            });
        }

        if self.shape() == Shape::Computed && child.is_leaf() {
            return Err(GraphError::TypeConstraint(format!(
                "{} '{}' only stores collections, not {} '{}'",
                self.kind.label(),
                self.id,
                child.kind.label(),
                child.id
            )));
        }

        Ok(())
    }

    pub fn add_child(&mut self, child: &Node<K>) -> Result<(), GraphError> {
        self.admit(child)?;
        self.children.push(child.id.clone());
        Ok(())
    }

    /// Removes the first direct child with `id`. Returns `Ok(None)` when no such child exists.
    pub fn remove_child(&mut self, id: &str) -> Result<Option<String>, GraphError> {
        if self.is_leaf() {
            return Err(GraphError::UnsupportedOperation {
                id: self.id.clone(),
                kind: self.kind.label(),
            });
        }

        let position = self.children.iter().position(|c| c == id);
        Ok(position.map(|idx| self.children.remove(idx)))
    }

    pub fn set_criteria(&mut self, criteria: Option<SearchCriteria>) -> Result<(), GraphError> {
        if self.shape() != Shape::Computed {
            return Err(GraphError::TypeConstraint(format!(
                "{} '{}' does not accept search criteria",
                self.kind.label(),
                self.id
            )));
        }

        if let Some(ref c) = criteria {
            c.validate()?;
        }
        self.criteria = criteria;
        Ok(())
    }

    pub fn describe(&self) -> NodeRecord {
        NodeRecord {
            kind: self.kind.label().to_string(),
            shape: self.shape(),
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            children: self.children.clone(),
            criteria: self.criteria.clone(),
            computed: false,
        }
    }

    pub(crate) fn push_child(&mut self, id: String) {
        self.children.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(id: &str) -> Node<EntitlementKind> {
        Node::new(EntitlementKind::Role, id, id, "")
    }

    fn permission(id: &str) -> Node<EntitlementKind> {
        Node::new(EntitlementKind::Permission, id, id, "")
    }

    #[test]
    fn kinds_map_to_shapes() {
        assert_eq!(EntitlementKind::Permission.shape(), Shape::Leaf);
        assert_eq!(EntitlementKind::Role.shape(), Shape::Composite);
        assert_eq!(CollectionKind::Product.shape(), Shape::Leaf);
        assert_eq!(CollectionKind::Static.shape(), Shape::Composite);
        assert_eq!(CollectionKind::Dynamic.shape(), Shape::Computed);
    }

    #[test]
    fn kinds_parse_case_insensitively() {
        assert_eq!(
            "Role".parse::<EntitlementKind>().unwrap(),
            EntitlementKind::Role
        );
        assert_eq!(
            " dynamic ".parse::<CollectionKind>().unwrap(),
            CollectionKind::Dynamic
        );
        assert!(matches!(
            "folder".parse::<CollectionKind>(),
            Err(GraphError::TypeConstraint(_))
        ));
    }

    #[test]
    fn add_child_appends_in_order() {
        let mut editor = role("editor");
        editor.add_child(&permission("publish")).unwrap();
        editor.add_child(&role("writer")).unwrap();

        assert_eq!(editor.children(), ["publish", "writer"]);
    }

    #[test]
    fn add_child_twice_conflicts_and_keeps_length() {
        let mut editor = role("editor");
        editor.add_child(&permission("publish")).unwrap();

        let err = editor.add_child(&permission("publish")).unwrap_err();

        assert!(
            matches!(err, GraphError::ChildConflict { ref parent, ref child } if parent == "editor" && child == "publish"),
            "expected ChildConflict, got: {err}"
        );
        assert_eq!(editor.children().len(), 1);
    }

    #[test]
    fn leaf_rejects_structural_mutation() {
        let mut leaf = permission("publish");

        let add = leaf.add_child(&permission("other")).unwrap_err();
        let remove = leaf.remove_child("other").unwrap_err();

        assert!(matches!(add, GraphError::UnsupportedOperation { .. }));
        assert!(matches!(remove, GraphError::UnsupportedOperation { .. }));
        assert!(leaf.children().is_empty());
    }

    #[test]
    fn remove_child_returns_removed_id() {
        let mut editor = role("editor");
        editor.add_child(&permission("publish")).unwrap();
        editor.add_child(&permission("review")).unwrap();

        let removed = editor.remove_child("publish").unwrap();

        assert_eq!(removed.as_deref(), Some("publish"));
        assert_eq!(editor.children(), ["review"]);
    }

    #[test]
    fn remove_missing_child_is_not_an_error() {
        let mut editor = role("editor");

        assert_eq!(editor.remove_child("ghost").unwrap(), None);
    }

    #[test]
    fn computed_node_rejects_stored_leaf() {
        let mut dynamic = Node::new(CollectionKind::Dynamic, "top", "Top", "");
        let product = Node::new(CollectionKind::Product, "p1", "Product", "");
        let nested = Node::new(CollectionKind::Static, "games", "Games", "");

        let err = dynamic.add_child(&product).unwrap_err();
        assert!(matches!(err, GraphError::TypeConstraint(_)));

        dynamic.add_child(&nested).unwrap();
        assert_eq!(dynamic.children(), ["games"]);
    }

    #[test]
    fn criteria_only_on_computed_nodes() {
        let mut fixed = Node::new(CollectionKind::Static, "games", "Games", "");
        let err = fixed
            .set_criteria(Some(SearchCriteria::default()))
            .unwrap_err();
        assert!(matches!(err, GraphError::TypeConstraint(_)));

        let mut dynamic = Node::new(CollectionKind::Dynamic, "top", "Top", "");
        dynamic
            .set_criteria(Some(SearchCriteria::default().with_min_rating(4)))
            .unwrap();
        assert_eq!(dynamic.criteria().and_then(|c| c.min_rating), Some(4));
    }

    #[test]
    fn invalid_criteria_is_rejected() {
        let mut dynamic = Node::new(CollectionKind::Dynamic, "top", "Top", "");

        let err = dynamic
            .set_criteria(Some(SearchCriteria::default().with_min_rating(6)))
            .unwrap_err();

        assert!(matches!(err, GraphError::InvalidCriteria(_)));
        assert!(dynamic.criteria().is_none());
    }

    #[test]
    fn describe_captures_identity_and_children() {
        let mut editor = Node::new(EntitlementKind::Role, "editor", "Editor", "edits things");
        editor.add_child(&permission("publish")).unwrap();

        let record = editor.describe();

        assert_eq!(record.kind, "role");
        assert_eq!(record.shape, Shape::Composite);
        assert_eq!(record.name, "Editor");
        assert_eq!(record.children, vec!["publish".to_string()]);
        assert!(!record.computed);
    }
}
