//! Body Registry
//!
//! Bidirectional index between simulated bodies and the scene nodes that
//! display them. A binding is made once, when the body is created, and is
//! never reassigned. Dynamic bodies are additionally kept in creation order
//! so the post-step sync visits them deterministically.

use std::fmt;

use ahash::AHashMap;
use indexmap::IndexSet;
use skyhop_core::NodeId;

/// Stable identifier for a body in a [`PhysicsWorld`](crate::PhysicsWorld)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub(crate) u32);

impl BodyHandle {
    pub fn index(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

/// Body ↔ node bindings
#[derive(Debug, Default)]
pub struct BodyRegistry {
    node_by_body: AHashMap<BodyHandle, NodeId>,
    body_by_node: AHashMap<NodeId, BodyHandle>,
    dynamic: IndexSet<BodyHandle>,
}

impl BodyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a body to its node.
    ///
    /// # Panics
    /// If either side is already bound.
    pub fn bind(&mut self, body: BodyHandle, node: NodeId, dynamic: bool) {
        assert!(
            !self.node_by_body.contains_key(&body),
            "{} is already bound to {}",
            body,
            self.node_by_body[&body]
        );
        assert!(
            !self.body_by_node.contains_key(&node),
            "{} is already bound to {}",
            node,
            self.body_by_node[&node]
        );

        self.node_by_body.insert(body, node);
        self.body_by_node.insert(node, body);
        if dynamic {
            self.dynamic.insert(body);
        }
    }

    /// Node displaying `body`
    pub fn node_of(&self, body: BodyHandle) -> Option<NodeId> {
        self.node_by_body.get(&body).copied()
    }

    /// Body bound to `node`
    pub fn body_of(&self, node: NodeId) -> Option<BodyHandle> {
        self.body_by_node.get(&node).copied()
    }

    pub fn is_dynamic(&self, body: BodyHandle) -> bool {
        self.dynamic.contains(&body)
    }

    /// Dynamic bodies in creation order
    pub fn dynamic_bodies(&self) -> impl Iterator<Item = BodyHandle> + '_ {
        self.dynamic.iter().copied()
    }

    pub fn dynamic_count(&self) -> usize {
        self.dynamic.len()
    }

    pub fn len(&self) -> usize {
        self.node_by_body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_by_body.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyhop_core::{NodeTag, SceneGraph};

    fn nodes(count: usize) -> Vec<NodeId> {
        let mut scene = SceneGraph::new();
        (0..count)
            .map(|i| scene.add_node(format!("n{}", i), NodeTag::Untagged).id())
            .collect()
    }

    #[test]
    fn test_bind_both_directions() {
        let n = nodes(2);
        let mut registry = BodyRegistry::new();
        registry.bind(BodyHandle(0), n[0], true);
        registry.bind(BodyHandle(1), n[1], false);

        assert_eq!(registry.node_of(BodyHandle(0)), Some(n[0]));
        assert_eq!(registry.body_of(n[1]), Some(BodyHandle(1)));
        assert!(registry.is_dynamic(BodyHandle(0)));
        assert!(!registry.is_dynamic(BodyHandle(1)));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.dynamic_count(), 1);
    }

    #[test]
    fn test_dynamic_bodies_keep_creation_order() {
        let n = nodes(3);
        let mut registry = BodyRegistry::new();
        registry.bind(BodyHandle(7), n[0], true);
        registry.bind(BodyHandle(2), n[1], true);
        registry.bind(BodyHandle(5), n[2], true);

        let order: Vec<_> = registry.dynamic_bodies().collect();
        assert_eq!(order, vec![BodyHandle(7), BodyHandle(2), BodyHandle(5)]);
    }

    #[test]
    #[should_panic(expected = "already bound")]
    fn test_rebinding_body_panics() {
        let n = nodes(2);
        let mut registry = BodyRegistry::new();
        registry.bind(BodyHandle(0), n[0], true);
        registry.bind(BodyHandle(0), n[1], true);
    }

    #[test]
    #[should_panic(expected = "already bound")]
    fn test_rebinding_node_panics() {
        let n = nodes(1);
        let mut registry = BodyRegistry::new();
        registry.bind(BodyHandle(0), n[0], false);
        registry.bind(BodyHandle(1), n[0], false);
    }
}
