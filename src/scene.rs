//! CPU side scene graph.
//!
//! Nodes live in an arena keyed by [`NodeId`]. Content is inserted as a
//! detached [`Subtree`] and removed recursively, so a placeholder and the
//! model that replaces it are handled the same way.

use std::sync::Arc;

use cgmath::{Matrix4, One, Quaternion, Rad, SquareMatrix, Vector3};
use slotmap::{new_key_type, SlotMap};

use crate::model::{Mesh, PointCloud};

new_key_type! {
    pub struct NodeId;
}

/// Interactive satellite part, attached to nodes at construction or replacement time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PickTag {
    Screen,
    Antenna,
    SolarPanel1,
    SolarPanel2,
}

impl PickTag {
    pub const ALL: [PickTag; 4] = [
        PickTag::Screen,
        PickTag::Antenna,
        PickTag::SolarPanel1,
        PickTag::SolarPanel2,
    ];

    /// Canonical identifier, also used as the node name
    pub fn name(self) -> &'static str {
        match self {
            PickTag::Screen => "screen",
            PickTag::Antenna => "antenna",
            PickTag::SolarPanel1 => "solarPanel1",
            PickTag::SolarPanel2 => "solarPanel2",
        }
    }
}

/// Local transform of a node.
///
/// `orientation` is the authored rotation (from a model file), `angles` the
/// animated Euler rotation in radians applied after it in X, Y, Z order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vector3<f32>,
    pub orientation: Quaternion<f32>,
    pub angles: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vector3::new(0.0, 0.0, 0.0),
            orientation: Quaternion::one(),
            angles: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn from_translation(translation: Vector3<f32>) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.translation)
            * Matrix4::from(self.orientation)
            * Matrix4::from_angle_x(Rad(self.angles.x))
            * Matrix4::from_angle_y(Rad(self.angles.y))
            * Matrix4::from_angle_z(Rad(self.angles.z))
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Group,
    Mesh(Vec<Arc<Mesh>>),
    Points(Arc<PointCloud>),
}

/// A detached tree of nodes, ready to be attached to a [`Scene`]
#[derive(Debug, Clone)]
pub struct Subtree {
    pub name: String,
    pub tag: Option<PickTag>,
    pub transform: Transform,
    pub kind: NodeKind,
    pub children: Vec<Subtree>,
}

impl Subtree {
    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn mesh(name: impl Into<String>, mesh: Mesh) -> Self {
        Self::new(name, NodeKind::Mesh(vec![Arc::new(mesh)]))
    }

    pub fn points(name: impl Into<String>, cloud: PointCloud) -> Self {
        Self::new(name, NodeKind::Points(Arc::new(cloud)))
    }

    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            tag: None,
            transform: Transform::default(),
            kind,
            children: Vec::new(),
        }
    }

    /// Tags the node and renames it to the canonical identifier
    pub fn with_tag(mut self, tag: PickTag) -> Self {
        self.set_tag(tag);
        self
    }

    pub fn with_translation(mut self, x: f32, y: f32, z: f32) -> Self {
        self.transform.translation = Vector3::new(x, y, z);
        self
    }

    pub fn with_child(mut self, child: Subtree) -> Self {
        self.children.push(child);
        self
    }

    pub fn set_tag(&mut self, tag: PickTag) {
        self.tag = Some(tag);
        self.name = tag.name().to_string();
    }

    /// First node named `name`, depth first, the node itself included
    pub fn find_by_name_mut(&mut self, name: &str) -> Option<&mut Subtree> {
        if self.name == name {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_by_name_mut(name))
    }

    /// Tags the nodes named in `parts`. Names that don't exist are skipped;
    /// returns how many parts were found.
    pub fn retag(&mut self, parts: &[(String, PickTag)]) -> usize {
        let mut found = 0;
        for (source, tag) in parts {
            match self.find_by_name_mut(source) {
                Some(node) => {
                    node.set_tag(*tag);
                    found += 1;
                }
                None => log::debug!("No node named {:?} for {}", source, tag.name()),
            }
        }
        found
    }

    /// Number of nodes in the tree
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(Subtree::len).sum::<usize>()
    }
}

#[derive(Debug)]
pub struct Node {
    pub name: String,
    pub tag: Option<PickTag>,
    pub transform: Transform,
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// A renderable node with its accumulated world transform
pub struct DrawItem<'a> {
    pub world: Matrix4<f32>,
    pub kind: &'a NodeKind,
}

pub struct Scene {
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node {
            name: "Scene".to_string(),
            tag: None,
            transform: Transform::default(),
            kind: NodeKind::Group,
            parent: None,
            children: Vec::new(),
        });
        Self { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Inserts `subtree` as the last child of `parent` and returns the id of its root
    pub fn attach(&mut self, parent: NodeId, subtree: Subtree) -> NodeId {
        let Subtree {
            name,
            tag,
            transform,
            kind,
            children,
        } = subtree;

        let id = self.nodes.insert(Node {
            name,
            tag,
            transform,
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.push(id);
        }

        for child in children {
            self.attach(id, child);
        }
        id
    }

    /// Removes `id` and everything below it. The root can't be removed.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if id == self.root {
            return false;
        }
        let Some(node) = self.nodes.remove(id) else {
            return false;
        };
        if let Some(parent) = node.parent.and_then(|p| self.nodes.get_mut(p)) {
            parent.children.retain(|&child| child != id);
        }

        let mut stack = node.children;
        while let Some(child) = stack.pop() {
            if let Some(removed) = self.nodes.remove(child) {
                stack.extend(removed.children);
            }
        }
        true
    }

    /// All nodes below `id` in depth first order, `id` itself excluded
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = match self.nodes.get(id) {
            Some(node) => node.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(next) = stack.pop() {
            out.push(next);
            if let Some(node) = self.nodes.get(next) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    pub fn world_matrix(&self, id: NodeId) -> Matrix4<f32> {
        let mut matrix = Matrix4::identity();
        let mut current = Some(id);
        while let Some(node) = current.and_then(|id| self.nodes.get(id)) {
            matrix = node.transform.matrix() * matrix;
            current = node.parent;
        }
        matrix
    }

    /// Nodes at or below `id` carrying `tag`
    pub fn find_tagged(&self, id: NodeId, tag: PickTag) -> Vec<NodeId> {
        std::iter::once(id)
            .chain(self.descendants(id))
            .filter(|&n| self.nodes.get(n).and_then(|node| node.tag) == Some(tag))
            .collect()
    }

    /// Every mesh and point node reachable from the root with its world matrix
    pub fn draw_list(&self) -> Vec<DrawItem<'_>> {
        let mut items = Vec::new();
        let mut stack = vec![(self.root, Matrix4::identity())];
        while let Some((id, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            let world = parent_world * node.transform.matrix();
            if !matches!(node.kind, NodeKind::Group) {
                items.push(DrawItem {
                    world,
                    kind: &node.kind,
                });
            }
            stack.extend(node.children.iter().rev().map(|&child| (child, world)));
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Point3, Transform as _};

    use super::*;
    use crate::model::Material;

    fn empty_mesh(name: &str) -> Mesh {
        Mesh::new(name, Vec::new(), Vec::new(), Material::default())
    }

    fn assembly() -> Subtree {
        Subtree::group("Satellite")
            .with_child(Subtree::mesh("Body", empty_mesh("body")))
            .with_child(
                Subtree::group("Wing")
                    .with_child(Subtree::mesh("Paneli1", empty_mesh("panel")))
                    .with_child(Subtree::mesh("Paneli1", empty_mesh("duplicate"))),
            )
            .with_child(Subtree::mesh("Button", empty_mesh("button")))
    }

    #[test]
    fn test_attach_and_remove_recursively() {
        let mut scene = Scene::new();
        let root = scene.root();
        let id = scene.attach(root, assembly());
        assert_eq!(scene.len(), 1 + 6);
        assert_eq!(scene.descendants(id).len(), 5);
        assert_eq!(scene.get(root).unwrap().children(), &[id]);

        assert!(scene.remove(id));
        assert_eq!(scene.len(), 1);
        assert!(!scene.contains(id));
        assert!(scene.get(root).unwrap().children().is_empty());
        // Second removal is a no-op
        assert!(!scene.remove(id));
    }

    #[test]
    fn test_root_cannot_be_removed() {
        let mut scene = Scene::new();
        assert!(!scene.remove(scene.root()));
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_descendants_are_depth_first() {
        let mut scene = Scene::new();
        let id = scene.attach(scene.root(), assembly());
        let names: Vec<_> = scene
            .descendants(id)
            .into_iter()
            .map(|n| scene.get(n).unwrap().name.clone())
            .collect();
        assert_eq!(names, ["Body", "Wing", "Paneli1", "Paneli1", "Button"]);
    }

    #[test]
    fn test_world_matrix_composes_parents() {
        let mut scene = Scene::new();
        let mut orbit = Subtree::group("Orbit");
        orbit.transform.angles.y = std::f32::consts::FRAC_PI_2;
        let orbit = orbit.with_child(Subtree::group("Satellite").with_translation(10.0, 0.0, 0.0));
        let orbit_id = scene.attach(scene.root(), orbit);
        let satellite = scene.get(orbit_id).unwrap().children()[0];

        // A quarter turn about +Y takes +X to -Z
        let p = scene
            .world_matrix(satellite)
            .transform_point(Point3::new(0.0, 0.0, 0.0));
        assert!(p.x.abs() < 1e-4);
        assert!((p.z + 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_retag_renames_first_match_and_skips_missing() {
        let mut tree = assembly();
        let parts = vec![
            ("Button".to_string(), PickTag::Screen),
            ("Antena".to_string(), PickTag::Antenna),
            ("Paneli1".to_string(), PickTag::SolarPanel1),
        ];
        assert_eq!(tree.retag(&parts), 2);

        let mut scene = Scene::new();
        let id = scene.attach(scene.root(), tree);
        assert_eq!(scene.find_tagged(id, PickTag::Screen).len(), 1);
        assert_eq!(scene.find_tagged(id, PickTag::SolarPanel1).len(), 1);
        assert!(scene.find_tagged(id, PickTag::Antenna).is_empty());

        let screen = scene.find_tagged(id, PickTag::Screen)[0];
        assert_eq!(scene.get(screen).unwrap().name, "screen");
        // The duplicate keeps its authored name
        let names: Vec<_> = scene
            .descendants(id)
            .into_iter()
            .map(|n| scene.get(n).unwrap().name.clone())
            .collect();
        assert_eq!(names, ["Body", "Wing", "solarPanel1", "Paneli1", "screen"]);
    }

    #[test]
    fn test_draw_list_skips_groups() {
        let mut scene = Scene::new();
        scene.attach(scene.root(), assembly());
        assert_eq!(scene.draw_list().len(), 4);
    }
}
