// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry and mesh provider interface
//!
//! The geometry kernel and mesher live outside this workspace. They are seen
//! through [`MeshTopology`], a read-only view borrowed for the duration of
//! one resolve/emit pass.

use crate::{ElementId, ElementKind, EntityId, Error, GroupId, NodeId, Result, ShapeType};
use serde::{Deserialize, Serialize};

/// A mesh node with coordinates
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshNode {
    /// Node ID
    pub id: NodeId,
    /// Cartesian coordinates
    pub coords: [f64; 3],
}

/// A mesh element owned by one geometric entity
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshElement {
    /// Element ID
    pub id: ElementId,
    /// Element type
    pub kind: ElementKind,
    /// Entity the element discretizes
    pub entity: EntityId,
    /// Ordered corner nodes
    pub nodes: Vec<NodeId>,
}

/// A named collection of same-dimension entities
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhysicalGroup {
    /// Group ID
    pub id: GroupId,
    /// Shape type of every member
    pub shape: ShapeType,
    /// Display name
    pub name: String,
    /// Member entities
    pub entities: Vec<EntityId>,
}

impl PhysicalGroup {
    /// Check whether an entity is a member
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains(&entity)
    }
}

/// Read-only access to entities, physical groups and the generated mesh
///
/// # Example
///
/// ```ignore
/// use fire_lite_model::{MeshTopology, MeshTopologyExt, ShapeType, EntityId};
///
/// fn describe(mesh: &dyn MeshTopology) {
///     for element in mesh.elements(ShapeType::Surface) {
///         let groups = mesh.groups_containing(ShapeType::Surface, element.entity);
///         println!("{} on {} ({} groups)", element.id, element.entity, groups.len());
///     }
/// }
/// ```
pub trait MeshTopology {
    /// All mesh nodes in provider order
    fn nodes(&self) -> &[MeshNode];

    /// Look up a node by ID
    fn node(&self, id: NodeId) -> Option<&MeshNode>;

    /// Elements discretizing entities of one shape type, in provider order
    fn elements(&self, shape: ShapeType) -> &[MeshElement];

    /// Entities of one shape type
    fn entities(&self, shape: ShapeType) -> Vec<EntityId>;

    /// Physical groups of one shape type
    fn physical_groups(&self, shape: ShapeType) -> &[PhysicalGroup];
}

/// Extension methods for MeshTopology
pub trait MeshTopologyExt: MeshTopology {
    /// Groups of a shape type containing an entity, in provider order
    fn groups_containing(&self, shape: ShapeType, entity: EntityId) -> Vec<&PhysicalGroup> {
        self.physical_groups(shape)
            .iter()
            .filter(|group| group.contains(entity))
            .collect()
    }

    /// Look up a group by ID
    fn group(&self, shape: ShapeType, id: GroupId) -> Option<&PhysicalGroup> {
        self.physical_groups(shape).iter().find(|g| g.id == id)
    }

    /// Elements owned by one entity, in provider order
    fn elements_of_entity(&self, shape: ShapeType, entity: EntityId) -> Vec<&MeshElement> {
        self.elements(shape)
            .iter()
            .filter(|element| element.entity == entity)
            .collect()
    }

    /// Get node or return error
    fn node_or_err(&self, id: NodeId) -> Result<&MeshNode> {
        self.node(id)
            .ok_or_else(|| Error::consistency(format!("mesh node {} does not exist", id)))
    }

    /// Total element count over all shape types
    fn element_count(&self) -> usize {
        ShapeType::ALL
            .iter()
            .map(|shape| self.elements(*shape).len())
            .sum()
    }
}

// Blanket implementation for all MeshTopology types
impl<T: MeshTopology + ?Sized> MeshTopologyExt for T {}
