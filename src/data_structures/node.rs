//! The retained scene graph.
//!
//! The loaded asset becomes a tree of [`Node`]s. Child order is structurally
//! meaningful and fixed by the asset's authoring convention: the root's
//! child 0 is the light rig and child 1 is the container of goblet
//! instances, with each goblet's child 0 being its couvert (lid). The scene
//! assembler mutates flags, light parameters and material references on
//! this tree but never its structure.

use std::sync::Arc;

use crate::data_structures::{instance::Instance, light::LightConfig, material::Material};

/// Whether a node takes part in shadow casting and receiving.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShadowFlags {
    pub cast: bool,
    pub receive: bool,
}

#[derive(Clone, Debug)]
pub enum NodeKind {
    /// Pure transform, nothing drawn.
    Group,
    /// References geometry by index into the loaded mesh list.
    Mesh(usize),
    Light(LightConfig),
}

/// One node of the loaded hierarchy.
#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    pub transform: Instance,
    pub kind: NodeKind,
    pub shadow: ShadowFlags,
    /// Shared by reference across every node using the same material.
    pub material: Option<Arc<Material>>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(name: &str, kind: NodeKind) -> Self {
        Self {
            name: name.to_string(),
            transform: Instance::default(),
            kind,
            shadow: ShadowFlags::default(),
            material: None,
            children: Vec::new(),
        }
    }

    pub fn group(name: &str) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn mesh(name: &str, mesh: usize) -> Self {
        Self::new(name, NodeKind::Mesh(mesh))
    }

    pub fn child(&self, idx: usize) -> Option<&Node> {
        self.children.get(idx)
    }

    pub fn child_mut(&mut self, idx: usize) -> Option<&mut Node> {
        self.children.get_mut(idx)
    }

    /// Enables or disables both shadow flags at once.
    pub fn set_shadow(&mut self, cast: bool, receive: bool) {
        self.shadow = ShadowFlags { cast, receive };
    }

    /// The light parameters of this node, installing a default config when
    /// the loader could not type the node (e.g. the light was exported as a
    /// plain transform).
    pub fn light_config_mut(&mut self, default: LightConfig) -> &mut LightConfig {
        if !matches!(self.kind, NodeKind::Light(_)) {
            self.kind = NodeKind::Light(default);
        }
        match self.kind {
            NodeKind::Light(ref mut config) => config,
            _ => unreachable!(),
        }
    }

    /// Depth-first walk passing each node together with its world transform.
    pub fn visit(&self, f: &mut dyn FnMut(&Node, &Instance)) {
        self.visit_inner(&Instance::default(), f);
    }

    fn visit_inner(&self, parent: &Instance, f: &mut dyn FnMut(&Node, &Instance)) {
        let world = parent * &self.transform;
        f(self, &world);
        for child in &self.children {
            child.visit_inner(&world, f);
        }
    }
}
