//! Scene Graph
//!
//! Hierarchical representation of the visual world:
//! - Transform parenting with on-demand world transforms
//! - Tags used to classify ray hits ("platform", "wall", "floor", ...)
//! - Box geometry and a ray query sorted by distance

use std::fmt;

use ahash::AHashMap;
use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::math::{Aabb, Ray};
use crate::{SceneError, SceneResult};

/// Transform of a node relative to its parent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Local position
    pub position: Vec3,
    /// Local rotation
    pub rotation: Quat,
    /// Local scale
    pub scale: Vec3,
}

impl Transform {
    /// Identity transform
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Create a new transform with the given position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// Create a new transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            scale: Vec3::ONE,
        }
    }

    /// Create a new transform from all components
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Get the local transformation matrix
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Translate along a local axis, i.e. the axis rotated by this transform's rotation
    pub fn translate_on_axis(&mut self, axis: Vec3, distance: f32) {
        self.position += self.rotation * axis * distance;
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Stable identifier of a node inside a [`SceneGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Classification tag used by ray queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeTag {
    #[default]
    Untagged,
    Platform,
    Wall,
    Floor,
    Character,
}

impl NodeTag {
    /// Tag name as it appears in logs and config
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeTag::Untagged => "",
            NodeTag::Platform => "platform",
            NodeTag::Wall => "wall",
            NodeTag::Floor => "floor",
            NodeTag::Character => "character",
        }
    }
}

/// Pickable geometry attached to a node
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Geometry {
    /// Not hit by ray queries
    #[default]
    Empty,
    /// Box centered on the node origin
    Cuboid { half_extents: Vec3 },
}

impl Geometry {
    /// Box geometry from full width, height and depth
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        Geometry::Cuboid {
            half_extents: Vec3::new(width, height, depth) * 0.5,
        }
    }

    fn local_bounds(&self) -> Option<Aabb> {
        match self {
            Geometry::Empty => None,
            Geometry::Cuboid { half_extents } => {
                Some(Aabb::from_center_half_extents(Vec3::ZERO, *half_extents))
            }
        }
    }
}

/// Scene graph node containing hierarchy information
#[derive(Debug, Clone)]
pub struct VisualNode {
    /// Node identifier
    id: NodeId,
    /// Node name for identification
    pub name: String,
    /// Classification tag
    pub tag: NodeTag,
    /// Pickable geometry
    pub geometry: Geometry,
    /// Local transform
    pub local_transform: Transform,
    /// Parent node
    parent: Option<NodeId>,
    /// Child nodes
    children: SmallVec<[NodeId; 8]>,
    /// Whether this node is visible
    pub visible: bool,
}

impl VisualNode {
    fn new(id: NodeId, name: String, tag: NodeTag) -> Self {
        Self {
            id,
            name,
            tag,
            geometry: Geometry::Empty,
            local_transform: Transform::IDENTITY,
            parent: None,
            children: SmallVec::new(),
            visible: true,
        }
    }

    /// Get the node identifier
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Get the parent node
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Get the child nodes
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Builder-style geometry setter
    pub fn with_geometry(&mut self, geometry: Geometry) -> &mut Self {
        self.geometry = geometry;
        self
    }

    /// Builder-style pose setter
    pub fn with_pose(&mut self, position: Vec3, rotation: Quat) -> &mut Self {
        self.local_transform.position = position;
        self.local_transform.rotation = rotation;
        self
    }

    /// Builder-style scale setter
    pub fn with_scale(&mut self, scale: Vec3) -> &mut Self {
        self.local_transform.scale = scale;
        self
    }

    fn add_child(&mut self, child: NodeId) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    fn remove_child(&mut self, child: NodeId) {
        self.children.retain(|c| *c != child);
    }
}

/// Result of a ray query against the scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Node that was hit
    pub node: NodeId,
    /// Tag of the node that was hit
    pub tag: NodeTag,
    /// Distance from the ray origin, in world units
    pub distance: f32,
}

/// Scene graph managing the hierarchy of visual nodes
#[derive(Debug, Default)]
pub struct SceneGraph {
    /// All nodes in the scene
    nodes: AHashMap<NodeId, VisualNode>,
    /// Root nodes (no parent), in insertion order
    roots: Vec<NodeId>,
    /// Next identifier to hand out
    next_id: u32,
}

impl SceneGraph {
    /// Create a new empty scene graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new root node to the scene
    pub fn add_node(&mut self, name: impl Into<String>, tag: NodeTag) -> &mut VisualNode {
        let id = NodeId(self.next_id);
        self.next_id += 1;

        self.roots.push(id);
        self.nodes
            .entry(id)
            .or_insert_with(|| VisualNode::new(id, name.into(), tag))
    }

    /// Remove a node from the scene, orphaning its children
    pub fn remove_node(&mut self, id: NodeId) -> Option<VisualNode> {
        let node = self.nodes.remove(&id)?;

        if let Some(parent_id) = node.parent {
            if let Some(parent) = self.nodes.get_mut(&parent_id) {
                parent.remove_child(id);
            }
        }
        self.roots.retain(|&r| r != id);

        for child in &node.children {
            if let Some(child_node) = self.nodes.get_mut(child) {
                child_node.parent = None;
                self.roots.push(*child);
            }
        }

        Some(node)
    }

    /// Get a node
    pub fn get_node(&self, id: NodeId) -> Option<&VisualNode> {
        self.nodes.get(&id)
    }

    /// Get a mutable node
    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut VisualNode> {
        self.nodes.get_mut(&id)
    }

    /// Set the parent of a node.
    ///
    /// The child's local transform is kept as-is and is interpreted relative
    /// to the new parent from now on.
    pub fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) -> SceneResult<()> {
        if !self.nodes.contains_key(&child) {
            return Err(SceneError::NodeNotFound(child));
        }

        if let Some(parent_id) = parent {
            if !self.nodes.contains_key(&parent_id) {
                return Err(SceneError::NodeNotFound(parent_id));
            }
            if parent_id == child || self.is_ancestor(child, parent_id) {
                return Err(SceneError::ParentCycle { child, parent: parent_id });
            }
        }

        let old_parent = self.nodes.get(&child).and_then(|n| n.parent);
        if let Some(old) = old_parent {
            if let Some(old_node) = self.nodes.get_mut(&old) {
                old_node.remove_child(child);
            }
        }

        match parent {
            Some(parent_id) => {
                if let Some(parent_node) = self.nodes.get_mut(&parent_id) {
                    parent_node.add_child(child);
                }
                self.roots.retain(|&r| r != child);
            }
            None => {
                if !self.roots.contains(&child) {
                    self.roots.push(child);
                }
            }
        }

        if let Some(child_node) = self.nodes.get_mut(&child) {
            child_node.parent = parent;
        }
        Ok(())
    }

    fn is_ancestor(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        while let Some(parent) = self.nodes.get(&node).and_then(|n| n.parent) {
            if parent == ancestor {
                return true;
            }
            node = parent;
        }
        false
    }

    /// Get root nodes
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Compose the world matrix of a node by walking up its parents
    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        let mut node = self.nodes.get(&id)?;
        let mut matrix = node.local_transform.local_matrix();
        while let Some(parent) = node.parent.and_then(|p| self.nodes.get(&p)) {
            matrix = parent.local_transform.local_matrix() * matrix;
            node = parent;
        }
        Some(matrix)
    }

    /// Get the world transform of a node
    pub fn world_transform(&self, id: NodeId) -> Option<Transform> {
        let (scale, rotation, position) = self.world_matrix(id)?.to_scale_rotation_translation();
        Some(Transform::new(position, rotation, scale))
    }

    /// Iterate over nodes carrying a tag
    pub fn nodes_with_tag(&self, tag: NodeTag) -> impl Iterator<Item = &VisualNode> {
        self.nodes.values().filter(move |node| node.tag == tag)
    }

    /// Cast a ray against every visible node with geometry.
    ///
    /// Hits are sorted by ascending distance. Boxes that contain the ray origin
    /// are not reported: only surfaces the ray enters from outside count.
    pub fn raycast(&self, ray: &Ray) -> Vec<RayHit> {
        let mut hits: Vec<RayHit> = self.nodes.values()
            .filter(|node| node.visible)
            .filter_map(|node| {
                let bounds = node.geometry.local_bounds()?;
                let world = self.world_matrix(node.id)?;
                if world.determinant().abs() <= f32::EPSILON {
                    return None;
                }
                let local_ray = ray.transformed(world.inverse());
                let (t_enter, _) = local_ray.intersect_aabb(&bounds)?;
                (t_enter >= 0.0).then_some(RayHit {
                    node: node.id,
                    tag: node.tag,
                    distance: t_enter,
                })
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.node.cmp(&b.node)));
        hits
    }

    /// Get the number of nodes in the scene
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the scene is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
