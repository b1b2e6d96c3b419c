// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory mesh implementing [`MeshTopology`]
//!
//! Hosts that already hold their mesh in memory (and the tests of every
//! crate in this workspace) fill an [`InMemoryMesh`] through its builder
//! methods.

use crate::{
    ElementId, ElementKind, EntityId, Error, GroupId, MeshElement, MeshNode, MeshTopology, NodeId,
    PhysicalGroup, Result, ShapeType,
};
use rustc_hash::{FxHashMap, FxHashSet};

/// Mesh held in memory
#[derive(Clone, Debug, Default)]
pub struct InMemoryMesh {
    nodes: Vec<MeshNode>,
    node_index: FxHashMap<NodeId, usize>,
    elements: [Vec<MeshElement>; 4],
    groups: [Vec<PhysicalGroup>; 4],
}

impl InMemoryMesh {
    /// Create an empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node (replaces the coordinates of an existing ID)
    pub fn add_node(&mut self, id: impl Into<NodeId>, coords: [f64; 3]) -> &mut Self {
        let id = id.into();
        match self.node_index.get(&id) {
            Some(&index) => self.nodes[index].coords = coords,
            None => {
                self.node_index.insert(id, self.nodes.len());
                self.nodes.push(MeshNode { id, coords });
            }
        }
        self
    }

    /// Add an element
    ///
    /// Fails when the node count does not match the element kind or a node
    /// has not been added.
    pub fn add_element(
        &mut self,
        id: impl Into<ElementId>,
        kind: ElementKind,
        entity: impl Into<EntityId>,
        nodes: &[u64],
    ) -> Result<&mut Self> {
        let id = id.into();
        if nodes.len() != kind.node_count() {
            return Err(Error::format(format!(
                "element {} of kind {:?} needs {} nodes, got {}",
                id,
                kind,
                kind.node_count(),
                nodes.len()
            )));
        }
        let nodes: Vec<NodeId> = nodes.iter().map(|&n| NodeId(n)).collect();
        if let Some(missing) = nodes.iter().find(|n| !self.node_index.contains_key(n)) {
            return Err(Error::consistency(format!(
                "element {} references unknown node {}",
                id, missing
            )));
        }
        self.elements[kind.shape().dimension() as usize].push(MeshElement {
            id,
            kind,
            entity: entity.into(),
            nodes,
        });
        Ok(self)
    }

    /// Add a physical group
    pub fn add_group(
        &mut self,
        id: impl Into<GroupId>,
        shape: ShapeType,
        name: impl Into<String>,
        entities: &[u32],
    ) -> &mut Self {
        self.groups[shape.dimension() as usize].push(PhysicalGroup {
            id: id.into(),
            shape,
            name: name.into(),
            entities: entities.iter().map(|&e| EntityId(e)).collect(),
        });
        self
    }
}

impl MeshTopology for InMemoryMesh {
    fn nodes(&self) -> &[MeshNode] {
        &self.nodes
    }

    fn node(&self, id: NodeId) -> Option<&MeshNode> {
        self.node_index.get(&id).map(|&index| &self.nodes[index])
    }

    fn elements(&self, shape: ShapeType) -> &[MeshElement] {
        &self.elements[shape.dimension() as usize]
    }

    fn entities(&self, shape: ShapeType) -> Vec<EntityId> {
        let dim = shape.dimension() as usize;
        let mut seen = FxHashSet::default();
        self.elements[dim]
            .iter()
            .map(|element| element.entity)
            .chain(self.groups[dim].iter().flat_map(|g| g.entities.iter().copied()))
            .filter(|entity| seen.insert(*entity))
            .collect()
    }

    fn physical_groups(&self, shape: ShapeType) -> &[PhysicalGroup] {
        &self.groups[shape.dimension() as usize]
    }
}
