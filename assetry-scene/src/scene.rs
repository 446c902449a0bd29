use std::collections::HashSet;

use crate::anim::Animation;
use crate::material::Material;
use crate::mesh::Mesh;

/// Scene-wide flag bitfield.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SceneFlags(pub u32);

impl SceneFlags {
    /// The importer could not produce a full scene; vertex and face data may be missing.
    pub const INCOMPLETE: u32 = 1 << 0;
    /// Set once the validator accepted the scene.
    pub const VALIDATED: u32 = 1 << 1;
    /// Set alongside `VALIDATED` when the validator emitted warnings.
    pub const VALIDATION_WARNING: u32 = 1 << 2;
    /// Vertices may be shared by more than one face.
    pub const NON_VERBOSE_FORMAT: u32 = 1 << 3;

    pub fn has(&self, flag: u32) -> bool {
        self.0 & flag != 0
    }

    pub fn set(&mut self, flag: u32) {
        self.0 |= flag;
    }

    pub fn clear(&mut self, flag: u32) {
        self.0 &= !flag;
    }
}

/// Index of a node inside [`Scene::nodes`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// Entry in the transform hierarchy.
///
/// Nodes live in the scene's node arena. `children` is the owning edge of the
/// tree; `parent` is a plain back-reference used for traversal and validation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Node {
    /// Need not be unique, may be empty.
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Indices into [`Scene::meshes`].
    pub meshes: Vec<u32>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }
}

/// Root aggregate of an import: node tree, meshes, materials and animations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    pub flags: SceneFlags,
    /// Node arena. Only nodes reachable from `root` are part of the hierarchy.
    pub nodes: Vec<Node>,
    pub root: Option<NodeId>,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub animations: Vec<Animation>,
}

impl Scene {
    /// Create an empty scene with a single root node.
    pub fn with_root(name: impl Into<String>) -> Self {
        Self {
            nodes: vec![Node::new(name)],
            root: Some(NodeId(0)),
            ..Default::default()
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn root_node(&self) -> Option<&Node> {
        self.root.and_then(|id| self.node(id))
    }

    pub fn root_node_mut(&mut self) -> Option<&mut Node> {
        let id = self.root?;
        self.node_mut(id)
    }

    /// Append a node under `parent`, wiring both the child edge and the back-reference.
    ///
    /// Returns `None` if `parent` does not name a node of this scene.
    pub fn add_child(&mut self, parent: NodeId, name: impl Into<String>) -> Option<NodeId> {
        if parent.0 >= self.nodes.len() {
            return None;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { name: name.into(), parent: Some(parent), ..Default::default() });
        self.nodes[parent.0].children.push(id);
        Some(id)
    }

    /// Whether vertices may be referenced by more than one face.
    pub fn is_non_verbose(&self) -> bool {
        self.flags.has(SceneFlags::NON_VERBOSE_FORMAT)
    }

    /// Node ids reachable from the root in pre-order.
    pub fn walk(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut seen = HashSet::new();
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else { continue };
            if !seen.insert(id) {
                continue;
            }
            order.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_flags() {
        let mut flags = SceneFlags::default();
        assert!(!flags.has(SceneFlags::INCOMPLETE));
        flags.set(SceneFlags::NON_VERBOSE_FORMAT);
        flags.set(SceneFlags::VALIDATED);
        assert!(flags.has(SceneFlags::NON_VERBOSE_FORMAT));
        assert!(flags.has(SceneFlags::VALIDATED));
        flags.clear(SceneFlags::VALIDATED);
        assert!(!flags.has(SceneFlags::VALIDATED));
        assert!(flags.has(SceneFlags::NON_VERBOSE_FORMAT));
    }

    #[test]
    fn test_add_child_links_parent() {
        let mut scene = Scene::with_root("root");
        let root = scene.root.unwrap();
        let arm = scene.add_child(root, "arm").unwrap();
        let hand = scene.add_child(arm, "hand").unwrap();

        assert_eq!(scene.node(arm).unwrap().parent, Some(root));
        assert_eq!(scene.node(hand).unwrap().parent, Some(arm));
        assert_eq!(scene.root_node().unwrap().children, vec![arm]);
        assert!(scene.add_child(NodeId(99), "ghost").is_none());
    }

    #[test]
    fn test_walk_is_pre_order() {
        let mut scene = Scene::with_root("root");
        let root = scene.root.unwrap();
        let a = scene.add_child(root, "a").unwrap();
        let b = scene.add_child(root, "b").unwrap();
        let a1 = scene.add_child(a, "a1").unwrap();

        assert_eq!(scene.walk(), vec![root, a, a1, b]);
    }
}
